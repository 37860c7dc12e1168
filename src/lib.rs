pub mod config;
pub mod decoder;
pub mod events;
pub mod matcher;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod repository;
pub mod sink;
pub mod source;

pub use config::{Config, IndexerConfig};
pub use decoder::{DecodeError, TransferDecoder};
pub use events::EventKind;
pub use matcher::EventMatcher;
pub use models::{LogRecord, TransferRecord};
pub use pipeline::{FailurePolicy, Outcome, Pipeline, PipelineError, PipelineStats};
pub use sink::{LogSink, SqliteSink, TransferSink};
