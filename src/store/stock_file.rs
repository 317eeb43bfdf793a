use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::models::StockRecord;

use super::errors::StoreError;

/// JSON array file holding every [`StockRecord`]
#[derive(Debug, Clone)]
pub struct StockStore {
    path: PathBuf,
}

impl StockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents, unparsed
    pub async fn read_raw(&self) -> Result<Vec<u8>, StoreError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })
    }

    /// Read and parse the whole file
    pub async fn load(&self) -> Result<Vec<StockRecord>, StoreError> {
        let bytes = self.read_raw().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Replace the file with `records`
    ///
    /// The new content is written next to the target and renamed over it, so
    /// the file is either the old array or the new one.
    pub async fn save(&self, records: &[StockRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(records)?;
        let tmp_path = self.tmp_path();

        tokio::fs::write(&tmp_path, &json)
            .await
            .map_err(|source| StoreError::Write {
                path: tmp_path.clone(),
                source,
            })?;

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!("Wrote {} stock records to {}", records.len(), self.path.display());
        Ok(())
    }

    /// True if the file parses and at least one record has a positive market cap
    ///
    /// Any read or parse failure counts as "no valid data".
    pub async fn has_valid_data(&self) -> bool {
        match self.load().await {
            Ok(records) => records.iter().any(StockRecord::has_valid_market_cap),
            Err(e) => {
                tracing::debug!("Stock data unavailable: {}", e);
                false
            }
        }
    }

    /// Time since the file was last modified, measured against `now`
    pub async fn age(&self, now: SystemTime) -> Result<Duration, StoreError> {
        let modified = tokio::fs::metadata(&self.path)
            .await
            .and_then(|meta| meta.modified())
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })?;

        // A modification time in the future counts as brand new
        Ok(now.duration_since(modified).unwrap_or(Duration::ZERO))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(symbol: &str, market_cap: Option<f64>) -> StockRecord {
        let mut record = StockRecord::new(symbol);
        record.market_cap = market_cap;
        record
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = StockStore::new(dir.path().join("stocks.json"));
        let records = vec![record("AAPL", Some(3.0e12)), record("MSFT", None)];

        store.save(&records).await.unwrap();

        assert_eq!(store.load().await.unwrap(), records);
        assert!(!dir.path().join("stocks.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let store = StockStore::new(dir.path().join("missing.json"));

        let err = store.load().await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.has_valid_data().await);
    }

    #[tokio::test]
    async fn test_load_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stocks.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = StockStore::new(&path);

        assert!(matches!(store.load().await, Err(StoreError::Parse(_))));
        assert!(!store.has_valid_data().await);
    }

    #[tokio::test]
    async fn test_has_valid_data() {
        let dir = tempdir().unwrap();
        let store = StockStore::new(dir.path().join("stocks.json"));

        store
            .save(&[record("AAPL", None), record("MSFT", Some(0.0))])
            .await
            .unwrap();
        assert!(!store.has_valid_data().await);

        store
            .save(&[record("AAPL", None), record("MSFT", Some(2.8e12))])
            .await
            .unwrap();
        assert!(store.has_valid_data().await);
    }

    #[tokio::test]
    async fn test_age_is_measured_from_mtime() {
        let dir = tempdir().unwrap();
        let store = StockStore::new(dir.path().join("stocks.json"));
        store.save(&[record("AAPL", Some(1.0))]).await.unwrap();

        let later = SystemTime::now() + Duration::from_secs(3600);
        let age = store.age(later).await.unwrap();
        assert!(age >= Duration::from_secs(3599));

        let earlier = SystemTime::now() - Duration::from_secs(3600);
        assert_eq!(store.age(earlier).await.unwrap(), Duration::ZERO);
    }
}
