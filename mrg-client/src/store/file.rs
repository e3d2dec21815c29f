use std::path::{Path, PathBuf};

use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

use super::{SnapshotStore, StoreError};
use crate::domain::MeasurementRecord;

/// Snapshot persisted as a pretty-printed JSON array.
///
/// Writers are serialized and each write lands in a sibling temp file that is
/// renamed over the target, so readers see either the old or the new
/// snapshot in full.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl SnapshotStore for JsonFileStore {
    async fn save(&self, records: &[MeasurementRecord]) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(records)?;

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&body).await?;
            file.flush().await?;
            file.sync_all().await?;
        }

        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn load(&self) -> Result<Vec<MeasurementRecord>, StoreError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn record(name: &str, km: Option<f64>) -> MeasurementRecord {
        MeasurementRecord {
            name: name.to_string(),
            connection_point: "КС Сохрановка".to_string(),
            mg: 0.0,
            km,
            period: "01/02/2023".to_string(),
            load_level: 0.81,
            actual_flow: 3.14,
            technical_flow: 4.0,
        }
    }

    #[tokio::test]
    async fn load_without_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));

        assert!(matches!(store.load().await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn save_then_load_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("data.json"));
        let records = vec![record("b", Some(12.5)), record("a", None)];

        store.save(&records).await.unwrap();

        assert_eq!(store.load().await.unwrap(), records);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn removed_file_reports_not_found_again() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));
        store.save(&[record("a", None)]).await.unwrap();

        std::fs::remove_file(store.path()).unwrap();

        assert!(matches!(store.load().await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"[{").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(store.load().await, Err(StoreError::Encoding(_))));
    }

    #[tokio::test]
    async fn concurrent_saves_leave_one_complete_generation() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("data.json")));

        let first: Vec<_> = (0..50).map(|i| record(&format!("a{i}"), None)).collect();
        let second: Vec<_> = (0..5).map(|i| record(&format!("b{i}"), Some(1.0))).collect();

        let (s1, s2) = (store.clone(), store.clone());
        let (f, s) = (first.clone(), second.clone());
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { s1.save(&f).await }),
            tokio::spawn(async move { s2.save(&s).await }),
        );
        r1.unwrap().unwrap();
        r2.unwrap().unwrap();

        let loaded = store.load().await.unwrap();
        assert!(loaded == first || loaded == second);
    }
}
