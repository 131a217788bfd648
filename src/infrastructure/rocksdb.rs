use crate::domain::ports::SessionStore;
use crate::error::{BookingError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding the session slot entries.
pub const CF_SESSION: &str = "session";

/// A persistent session slot backed by RocksDB.
///
/// Entries live in their own column family, keyed by slot name.
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbSessionStore {
    db: Arc<DB>,
}

impl RocksDbSessionStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_session = ColumnFamilyDescriptor::new(CF_SESSION, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_session])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn missing_cf() -> BookingError {
        BookingError::InternalError(Box::new(std::io::Error::other(
            "Session column family not found",
        )))
    }
}

#[async_trait]
impl SessionStore for RocksDbSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cf = self.db.cf_handle(CF_SESSION).ok_or_else(Self::missing_cf)?;

        match self.db.get_cf(&cf, key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                BookingError::InternalError(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Session entry is not UTF-8: {}", e),
                )))
            }),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let cf = self.db.cf_handle(CF_SESSION).ok_or_else(Self::missing_cf)?;
        self.db.put_cf(&cf, key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let cf = self.db.cf_handle(CF_SESSION).ok_or_else(Self::missing_cf)?;
        self.db.delete_cf(&cf, key.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDbSessionStore::open(dir.path()).expect("Failed to open RocksDB");
        assert!(store.db.cf_handle(CF_SESSION).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_session_store() {
        let dir = tempdir().unwrap();
        let store = RocksDbSessionStore::open(dir.path()).unwrap();

        store.put("token", "abc").await.unwrap();
        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("abc"));
        assert!(store.get("user").await.unwrap().is_none());

        store.remove("token").await.unwrap();
        assert!(store.get("token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDbSessionStore::open(dir.path()).unwrap();
            store.put("token", "abc").await.unwrap();
        }
        let store = RocksDbSessionStore::open(dir.path()).unwrap();
        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("abc"));
    }
}
