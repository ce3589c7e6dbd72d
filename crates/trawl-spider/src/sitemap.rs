//! Sitemap-seeded crawl discovery (SPEC_FULL.md supplement, grounded in
//! `riptide-spider::sitemap`'s XML sitemap parsing — but scoped down since
//! fetching the sitemap itself is an external collaborator's job, not this
//! crate's: `parse_sitemap` takes already-fetched XML text, never a URL.

use regex::Regex;

use crate::url_normalizer::normalize;

/// A single `<url>` entry from a sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub url: String,
    pub priority: Option<String>,
}

/// Parse `<loc>` (and optional sibling `<priority>`) entries out of sitemap
/// XML, normalizing each URL against `base_url`. Malformed entries are
/// skipped rather than failing the whole parse — this mirrors the rest of
/// the crate's never-panic posture around hostile/partial markup.
pub fn parse_sitemap(xml: &str, base_url: &str) -> Vec<SitemapEntry> {
    let url_re = match Regex::new(r"(?s)<url>(.*?)</url>") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let loc_re = match Regex::new(r"<loc>\s*([^<]+)\s*</loc>") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let priority_re = match Regex::new(r"<priority>\s*([^<]+)\s*</priority>") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    // A bare sitemap (no <urlset>/<url> wrapper entries, flat <loc> list)
    // falls back to matching every <loc> in the document.
    let blocks: Vec<&str> = url_re.captures_iter(xml).map(|c| c.get(1).unwrap().as_str()).collect();
    let search_space: Vec<&str> = if blocks.is_empty() { vec![xml] } else { blocks };

    let mut entries = Vec::new();
    for block in search_space {
        let Some(loc_match) = loc_re.captures(block) else {
            continue;
        };
        let raw_url = loc_match.get(1).unwrap().as_str().trim();
        let normalized = normalize(raw_url, Some(base_url));
        if url::Url::parse(&normalized).is_err() {
            continue;
        }
        let priority = priority_re
            .captures(block)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string());
        entries.push(SitemapEntry { url: normalized, priority });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urlset_entries() {
        let xml = r#"<?xml version="1.0"?>
            <urlset>
                <url><loc>https://example.com/a</loc><priority>0.8</priority></url>
                <url><loc>https://example.com/b</loc></url>
            </urlset>"#;
        let entries = parse_sitemap(xml, "https://example.com/");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://example.com/a");
        assert_eq!(entries[0].priority.as_deref(), Some("0.8"));
        assert_eq!(entries[1].priority, None);
    }

    #[test]
    fn skips_malformed_url_blocks() {
        let xml = r#"<urlset><url><priority>0.5</priority></url></urlset>"#;
        let entries = parse_sitemap(xml, "https://example.com/");
        assert!(entries.is_empty());
    }

    #[test]
    fn falls_back_to_flat_loc_scan() {
        let xml = r#"<sitemapindex><loc>/sub-sitemap.xml</loc></sitemapindex>"#;
        let entries = parse_sitemap(xml, "https://example.com/");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://example.com/sub-sitemap.xml");
    }
}
