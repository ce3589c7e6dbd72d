//! Session Store (spec §4.12): persists [`SessionData`] keyed by
//! `<domain>[:<identifier>]`, expiring entries on access and via a periodic
//! sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use trawl_types::error::TrawlError;
use trawl_types::ports::SessionBackingStore;
use trawl_types::session::SessionData;
use trawl_types::Result;

pub struct SessionStore {
    backend: Arc<dyn SessionBackingStore>,
}

/// `<domain>[:<identifier>]` (spec §4.12).
pub fn session_key(domain: &str, identifier: Option<&str>) -> String {
    match identifier {
        Some(id) if !id.is_empty() => format!("{domain}:{id}"),
        _ => domain.to_string(),
    }
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionBackingStore>) -> Self {
        Self { backend }
    }

    pub async fn save(&self, domain: &str, identifier: Option<&str>, data: &SessionData) -> Result<()> {
        let key = session_key(domain, identifier);
        let bytes = serde_json::to_vec(data).map_err(|e| TrawlError::Session(e.to_string()))?;
        self.backend.save(&key, bytes).await
    }

    /// Returns `None` on miss or on an expired session (which is deleted as
    /// a side effect, per spec §4.12).
    pub async fn load(&self, domain: &str, identifier: Option<&str>) -> Result<Option<SessionData>> {
        let key = session_key(domain, identifier);
        let Some(bytes) = self.backend.load(&key).await? else {
            return Ok(None);
        };
        let data: SessionData =
            serde_json::from_slice(&bytes).map_err(|e| TrawlError::Session(e.to_string()))?;
        if data.is_expired(Utc::now()) {
            self.backend.delete(&key).await?;
            return Ok(None);
        }
        Ok(Some(data))
    }

    pub async fn delete(&self, domain: &str, identifier: Option<&str>) -> Result<()> {
        let key = session_key(domain, identifier);
        self.backend.delete(&key).await
    }

    /// Enumerate every key and delete those whose session has expired.
    /// Returns the number of sessions removed.
    pub async fn clean_expired(&self) -> Result<usize> {
        let keys = self.backend.list_keys().await?;
        let now = Utc::now();
        let mut removed = 0;
        for key in keys {
            let Some(bytes) = self.backend.load(&key).await? else {
                continue;
            };
            match serde_json::from_slice::<SessionData>(&bytes) {
                Ok(data) if data.is_expired(now) => {
                    self.backend.delete(&key).await?;
                    removed += 1;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(key, error = %err, "dropping unreadable session entry during sweep");
                    self.backend.delete(&key).await?;
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Spawn a background task that calls [`Self::clean_expired`] every
    /// `interval` until the returned handle is dropped/aborted (spec §4.12:
    /// optional auto-cleanup).
    pub fn spawn_auto_cleanup(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(err) = store.clean_expired().await {
                    tracing::warn!(error = %err, "session auto-cleanup sweep failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::FilesystemSessionStore;

    fn sample(domain: &str, expires_in_secs: Option<i64>) -> SessionData {
        let now = Utc::now();
        let mut data = SessionData::new(domain, now);
        data.expires_at = expires_in_secs.map(|s| now + chrono::Duration::seconds(s));
        data
    }

    #[test]
    fn session_key_includes_identifier_when_present() {
        assert_eq!(session_key("example.com", Some("user-1")), "example.com:user-1");
        assert_eq!(session_key("example.com", None), "example.com");
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FilesystemSessionStore::new(dir.path()));
        let store = SessionStore::new(backend);

        let data = sample("example.com", Some(3600));
        store.save("example.com", None, &data).await.unwrap();
        let loaded = store.load("example.com", None).await.unwrap().unwrap();
        assert_eq!(loaded.domain, "example.com");
    }

    #[tokio::test]
    async fn load_deletes_and_returns_none_for_expired_session() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FilesystemSessionStore::new(dir.path()));
        let store = SessionStore::new(backend);

        let data = sample("example.com", Some(-10));
        store.save("example.com", None, &data).await.unwrap();
        assert!(store.load("example.com", None).await.unwrap().is_none());
        // Second load confirms the expired entry was actually deleted, not
        // just masked.
        assert!(store.load("example.com", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clean_expired_sweeps_all_expired_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FilesystemSessionStore::new(dir.path()));
        let store = SessionStore::new(backend);

        store
            .save("expired.com", None, &sample("expired.com", Some(-1)))
            .await
            .unwrap();
        store
            .save("fresh.com", None, &sample("fresh.com", Some(3600)))
            .await
            .unwrap();

        let removed = store.clean_expired().await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.load("fresh.com", None).await.unwrap().is_some());
    }
}
