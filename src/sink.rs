use crate::models::TransferRecord;
use crate::repository::{Database, TransferRepository};
use anyhow::{Context, Result};
use tracing::{Span, debug, info};

/// Downstream consumer of decoded transfers, fed one record at a time.
pub trait TransferSink {
    fn write(&mut self, record: &TransferRecord) -> Result<()>;
}

impl<S: TransferSink + ?Sized> TransferSink for Box<S> {
    fn write(&mut self, record: &TransferRecord) -> Result<()> {
        (**self).write(record)
    }
}

impl TransferSink for Vec<TransferRecord> {
    fn write(&mut self, record: &TransferRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Emits every transfer as a structured tracing event under the given span.
pub struct LogSink {
    span: Span,
}

impl LogSink {
    pub fn new(span: Span) -> Self {
        LogSink { span }
    }
}

impl TransferSink for LogSink {
    fn write(&mut self, record: &TransferRecord) -> Result<()> {
        info!(
            parent: &self.span,
            kind = %record.kind,
            asset_index = record.asset_index,
            from = ?record.from_address,
            to = ?record.to_address,
            block_number = record.block_number,
            transaction_index = record.transaction_index,
            log_index = record.log_index,
            transaction_hash = %record.transaction_hash,
            "Received transfer"
        );
        Ok(())
    }
}

pub struct SqliteSink {
    db: Database,
    span: Span,
    inserted: usize,
    duplicates: usize,
}

impl SqliteSink {
    pub fn new(db: Database, span: Span) -> Self {
        SqliteSink {
            db,
            span,
            inserted: 0,
            duplicates: 0,
        }
    }

    pub fn inserted(&self) -> usize {
        self.inserted
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl TransferSink for SqliteSink {
    fn write(&mut self, record: &TransferRecord) -> Result<()> {
        let repo = TransferRepository::new(&self.db.conn);
        let inserted = repo.insert(record).with_context(|| {
            format!(
                "Failed to store transfer {}:{}",
                record.transaction_hash, record.log_index
            )
        })?;

        if inserted {
            self.inserted += 1;
        } else {
            self.duplicates += 1;
            debug!(
                parent: &self.span,
                transaction_hash = %record.transaction_hash,
                log_index = record.log_index,
                "Transfer already stored, skipping"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use alloy_primitives::Address;

    fn record(asset_index: u64) -> TransferRecord {
        TransferRecord {
            kind: EventKind::Transfer,
            asset_index,
            from_address: Address::repeat_byte(0x01),
            to_address: Address::repeat_byte(0x02),
            block_number: 4_000_000,
            transaction_index: 1,
            log_index: asset_index,
            transaction_hash: "0xabc".to_string(),
        }
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<TransferRecord> = Vec::new();
        sink.write(&record(1)).unwrap();
        sink.write(&record(2)).unwrap();
        assert_eq!(sink, vec![record(1), record(2)]);
    }

    #[test]
    fn test_log_sink_accepts_records() {
        let mut sink = LogSink::new(Span::none());
        assert!(sink.write(&record(1)).is_ok());
    }

    #[test]
    fn test_sqlite_sink_counts_duplicates() {
        let mut sink = SqliteSink::new(Database::in_memory().unwrap(), Span::none());
        sink.write(&record(1)).unwrap();
        sink.write(&record(2)).unwrap();
        sink.write(&record(1)).unwrap();

        assert_eq!(sink.inserted(), 2);
        assert_eq!(sink.duplicates(), 1);

        let stored = TransferRepository::new(&sink.database().conn)
            .get_asset_history(2)
            .unwrap();
        assert_eq!(stored, vec![record(2)]);
    }

    #[test]
    fn test_boxed_sink_delegates() {
        let mut sink: Box<dyn TransferSink> = Box::new(Vec::<TransferRecord>::new());
        assert!(sink.write(&record(3)).is_ok());
    }
}
