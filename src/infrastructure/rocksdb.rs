use crate::domain::ports::Stash;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding stash entries.
pub const CF_STASH: &str = "stash";

/// A persistent stash backed by RocksDB.
///
/// Keys and values are stored as UTF-8 bytes in a dedicated column family.
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStash {
    db: Arc<DB>,
}

impl RocksDBStash {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_stash = ColumnFamilyDescriptor::new(CF_STASH, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_stash])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn column(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(CF_STASH)
            .ok_or_else(|| CheckoutError::Stash("stash column family not found".to_string()))
    }
}

#[async_trait]
impl Stash for RocksDBStash {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cf = self.column()?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| CheckoutError::Stash(format!("value of `{key}` is not UTF-8: {e}"))),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let cf = self.column()?;
        self.db.put_cf(cf, key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let cf = self.column()?;
        self.db.delete_cf(cf, key.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pending::{PendingTransaction, Slot};
    use crate::domain::subject::{SubjectType, TransactionKind};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let stash = RocksDBStash::open(dir.path()).expect("Failed to open RocksDB");
        assert!(stash.db.cf_handle(CF_STASH).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_stash_survives_reopen() {
        let dir = tempdir().unwrap();
        let record = PendingTransaction {
            kind: TransactionKind::Registration,
            subject: SubjectType::Agent,
            order_id: "AGENT_1".to_string(),
            temp_id: "T1".to_string(),
            document: None,
        };

        {
            let stash = RocksDBStash::open(dir.path()).unwrap();
            record.save(&stash).await.unwrap();
        }

        let stash = RocksDBStash::open(dir.path()).unwrap();
        let loaded = PendingTransaction::load(&stash, Slot::Registration(SubjectType::Agent))
            .await
            .unwrap();
        assert_eq!(loaded, Some(record));

        stash.delete("agentTempId").await.unwrap();
        assert!(stash.get("agentTempId").await.unwrap().is_none());
    }
}
