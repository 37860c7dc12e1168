use crate::decoder::{DecodeError, TransferDecoder};
use crate::matcher::EventMatcher;
use crate::models::{LogRecord, TransferRecord};
use crate::sink::TransferSink;
use anyhow::Context;
use futures::{Stream, TryStreamExt, pin_mut};
use std::io;
use std::str::FromStr;
use thiserror::Error;
use tracing::{Span, debug, info, warn};

/// What to do with a message that cannot be parsed or decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log, count and move on to the next message.
    #[default]
    Skip,
    /// Stop the run and return the error.
    Halt,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(FailurePolicy::Skip),
            "halt" => Ok(FailurePolicy::Halt),
            other => Err(anyhow::anyhow!(
                "Unknown failure policy '{}', expected 'skip' or 'halt'",
                other
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to deserialize log record: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Failed to decode log {transaction_hash}:{log_index}: {source}")]
    Decode {
        transaction_hash: String,
        log_index: u64,
        #[source]
        source: DecodeError,
    },

    #[error("Sink failed: {0:#}")]
    Sink(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written(TransferRecord),
    /// The record is not one of the indexed events.
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub received: usize,
    pub matched: usize,
    pub written: usize,
    pub skipped: usize,
    pub malformed: usize,
    pub decode_failures: usize,
}

pub struct Pipeline<S> {
    matcher: EventMatcher,
    decoder: TransferDecoder,
    sink: S,
    policy: FailurePolicy,
    span: Span,
    stats: PipelineStats,
}

impl<S: TransferSink> Pipeline<S> {
    pub fn new(
        matcher: EventMatcher,
        decoder: TransferDecoder,
        sink: S,
        policy: FailurePolicy,
        span: Span,
    ) -> Self {
        Pipeline {
            matcher,
            decoder,
            sink,
            policy,
            span,
            stats: PipelineStats::default(),
        }
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs one raw message through matcher, decoder and sink.
    pub fn process(&mut self, message: &str) -> Result<Outcome, PipelineError> {
        self.stats.received += 1;

        let log = match LogRecord::from_json(message) {
            Ok(log) => log,
            Err(e) => {
                self.stats.malformed += 1;
                return Err(e.into());
            }
        };

        self.process_record(&log)
    }

    pub fn process_record(&mut self, log: &LogRecord) -> Result<Outcome, PipelineError> {
        if !self.matcher.matches(log) {
            self.stats.skipped += 1;
            return Ok(Outcome::Skipped);
        }
        self.stats.matched += 1;

        let transfer = match self.decoder.decode(log) {
            Ok(transfer) => transfer,
            Err(source) => {
                self.stats.decode_failures += 1;
                return Err(PipelineError::Decode {
                    transaction_hash: log.transaction_hash.clone(),
                    log_index: log.log_index,
                    source,
                });
            }
        };

        self.sink.write(&transfer).map_err(PipelineError::Sink)?;
        self.stats.written += 1;

        debug!(
            parent: &self.span,
            asset_index = transfer.asset_index,
            block_number = transfer.block_number,
            log_index = transfer.log_index,
            "Transfer written"
        );

        Ok(Outcome::Written(transfer))
    }

    /// Drains the message stream, applying the failure policy to bad messages.
    pub async fn run<St>(&mut self, messages: St) -> anyhow::Result<PipelineStats>
    where
        St: Stream<Item = io::Result<String>>,
    {
        pin_mut!(messages);

        info!(parent: &self.span, policy = ?self.policy, "Pipeline started");

        while let Some(message) = messages
            .try_next()
            .await
            .context("Failed to read from message source")?
        {
            match self.process(&message) {
                Ok(_) => {}
                Err(PipelineError::Sink(e)) => {
                    return Err(e.context("Sink failed, stopping pipeline"));
                }
                Err(e) if self.policy == FailurePolicy::Halt => {
                    return Err(anyhow::Error::new(e).context("Halting on bad message"));
                }
                Err(e) => {
                    warn!(parent: &self.span, error = %e, "Skipping bad message");
                }
            }
        }

        let stats = &self.stats;
        info!(
            parent: &self.span,
            received = stats.received,
            matched = stats.matched,
            written = stats.written,
            skipped = stats.skipped,
            malformed = stats.malformed,
            decode_failures = stats.decode_failures,
            "Pipeline finished"
        );

        Ok(self.stats.clone())
    }
}
