//! Cache key construction (spec §6, §9): scrape-result keys are exactly
//! `scrape:<url>:<scraper_tag>:<8-hex>`, the first 8 hex characters of
//! `SHA-256(task_description)`, or the literal `default` when the task
//! description is empty.

use sha2::{Digest, Sha256};

/// Build the cache key the Scrape Service uses for a scrape result.
pub fn scrape_key(url: &str, scraper_tag: &str, task_description: Option<&str>) -> String {
    let fingerprint = match task_description {
        Some(task) if !task.is_empty() => task_fingerprint(task),
        _ => "default".to_string(),
    };
    format!("scrape:{url}:{scraper_tag}:{fingerprint}")
}

/// First 8 hex characters of `SHA-256(bytes)`.
pub fn task_fingerprint(task_description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(task_description.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 8)
}

/// Fingerprint used to key cached [`trawl_types::extraction::ValidationOutcome`]
/// results, over `(text, task_description)` (spec §4.13).
pub fn validation_fingerprint(text: &str, task_description: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(task_description.unwrap_or("").as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 16)
}

fn hex_prefix(bytes: &[u8], hex_len: usize) -> String {
    let byte_len = (hex_len + 1) / 2;
    let hex: String = bytes[..byte_len.min(bytes.len())]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    hex[..hex_len.min(hex.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_task_uses_literal_default() {
        let key = scrape_key("https://example.com", "HTTP", None);
        assert_eq!(key, "scrape:https://example.com:HTTP:default");

        let key = scrape_key("https://example.com", "HTTP", Some(""));
        assert_eq!(key, "scrape:https://example.com:HTTP:default");
    }

    #[test]
    fn non_empty_task_fingerprints_to_eight_hex_chars() {
        let key = scrape_key("https://example.com", "HTTP", Some("extract prices"));
        let fingerprint = key.rsplit(':').next().unwrap();
        assert_eq!(fingerprint.len(), 8);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(task_fingerprint("same task"), task_fingerprint("same task"));
        assert_ne!(task_fingerprint("task a"), task_fingerprint("task b"));
    }
}
