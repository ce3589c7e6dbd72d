//! Filesystem-backed [`SessionBackingStore`]: atomic writes via temp-file +
//! rename, keys sanitized per spec §6.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use trawl_types::error::TrawlError;
use trawl_types::ports::session::sanitize_filename;
use trawl_types::ports::SessionBackingStore;
use trawl_types::Result;

pub struct FilesystemSessionStore {
    base_dir: PathBuf,
}

impl FilesystemSessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(sanitize_filename(key))
    }

    async fn ensure_base_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| TrawlError::Session(format!("failed to create session dir: {e}")))
    }
}

#[async_trait]
impl SessionBackingStore for FilesystemSessionStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TrawlError::Session(format!("failed to read session: {e}"))),
        }
    }

    async fn save(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.ensure_base_dir().await?;
        let path = self.path_for(key);
        let tmp_path = tmp_path_for(&path);

        fs::write(&tmp_path, &value)
            .await
            .map_err(|e| TrawlError::Session(format!("failed to write session temp file: {e}")))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| TrawlError::Session(format!("failed to rename session temp file: {e}")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrawlError::Session(format!("failed to delete session: {e}"))),
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        self.ensure_base_dir().await?;
        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| TrawlError::Session(format!("failed to list session dir: {e}")))?;
        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TrawlError::Session(e.to_string()))?
        {
            if let Some(name) = entry.file_name().to_str() {
                keys.push(name.trim_end_matches(".json").to_string());
            }
        }
        Ok(keys)
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemSessionStore::new(dir.path());
        store.save("example.com", b"hello".to_vec()).await.unwrap();
        let loaded = store.load("example.com").await.unwrap();
        assert_eq!(loaded, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn load_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemSessionStore::new(dir.path());
        assert!(store.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemSessionStore::new(dir.path());
        store.save("k", b"v".to_vec()).await.unwrap();
        store.delete("k").await.unwrap();
        assert!(store.load("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_sanitizes_keys_with_path_separators() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemSessionStore::new(dir.path());
        store.save("example.com:user/1", b"v".to_vec()).await.unwrap();
        let keys = store.list_keys().await.unwrap();
        assert_eq!(keys, vec!["example.com_user_1".to_string()]);
    }
}
