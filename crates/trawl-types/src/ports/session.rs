//! Session backing-store contract (spec §6): key/value blobs with atomic
//! write semantics (temp-file + rename when the store is a filesystem).

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SessionBackingStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn save(&self, key: &str, value: Vec<u8>) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn list_keys(&self) -> Result<Vec<String>>;
}

/// Sanitize a session key for use as a filesystem path component (spec §6):
/// every character outside `[A-Za-z0-9._-]` becomes `_`, suffixed `.json`.
pub fn sanitize_filename(key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{sanitized}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!(sanitize_filename("example.com:user"), "example.com_user.json");
        assert_eq!(sanitize_filename("a/b"), "a_b.json");
    }

    #[test]
    fn sanitize_preserves_allowed_characters() {
        assert_eq!(sanitize_filename("a-b_c.d"), "a-b_c.d.json");
    }
}
