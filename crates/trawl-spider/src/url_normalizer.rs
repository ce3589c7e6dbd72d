//! URL canonicalization and follow-policy decisions (spec §4.1).

use regex::Regex;
use trawl_types::crawl::CrawlConfig;
use url::Url;

const BLOCKED_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".bmp", ".css",
    ".js", ".xml",
];

const BLOCKED_PATH_SUBSTRINGS: &[&str] = &["/api/", "/ajax/", "/json/", "/xml/", "/rss/", "/feed/"];

/// Canonicalize `url`, optionally resolved against `base`. Never panics: a
/// parse failure returns the input unchanged (spec §4.1).
///
/// Canonicalization: lowercase host, explicit scheme, no fragment, path with
/// no trailing slash (except root), query parameters sorted lexicographically
/// by `(key, value)` ascending.
pub fn normalize(input: &str, base: Option<&str>) -> String {
    let parsed = match base {
        Some(base_str) => match Url::parse(base_str).map(as_directory).and_then(|b| b.join(input)) {
            Ok(u) => u,
            Err(_) => match Url::parse(input) {
                Ok(u) => u,
                Err(_) => {
                    tracing::debug!(url = input, "failed to parse URL, returning verbatim");
                    return input.to_string();
                }
            },
        },
        None => match Url::parse(input) {
            Ok(u) => u,
            Err(_) => {
                tracing::debug!(url = input, "failed to parse URL, returning verbatim");
                return input.to_string();
            }
        },
    };

    canonicalize_parsed(parsed)
}

/// Relative resolution is always done against the base's last path segment
/// treated as a directory, even when a prior normalization pass already
/// stripped its trailing slash (spec §8 scenario 1: `…/Path?a=1&b=2` + `foo/bar/`
/// → `…/Path/foo/bar`, not `…/foo/bar/`).
fn as_directory(mut base: Url) -> Url {
    let path = base.path().to_string();
    if !path.ends_with('/') {
        base.set_path(&format!("{path}/"));
    }
    base
}

fn canonicalize_parsed(mut u: Url) -> String {
    u.set_fragment(None);

    if let Some(host) = u.host_str() {
        let lower_host = host.to_lowercase();
        let _ = u.set_host(Some(&lower_host));
    }

    let mut pairs: Vec<(String, String)> = u
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort_by(|a, b| a.cmp(b));

    if pairs.is_empty() {
        u.set_query(None);
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &pairs {
            serializer.append_pair(k, v);
        }
        u.set_query(Some(&serializer.finish()));
    }

    let path = u.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        u.set_path(trimmed);
    }

    u.to_string()
}

/// Compare two URLs' normalized registrable host, ignoring a leading `www.`.
pub fn same_domain(a: &str, b: &str) -> bool {
    let host_of = |s: &str| -> Option<String> {
        Url::parse(s).ok().and_then(|u| u.host_str().map(|h| {
            h.to_lowercase()
                .strip_prefix("www.")
                .map(str::to_string)
                .unwrap_or_else(|| h.to_lowercase())
        }))
    };
    match (host_of(a), host_of(b)) {
        (Some(ha), Some(hb)) => ha == hb,
        _ => false,
    }
}

/// Decide whether a discovered link should be followed, applying the ordered
/// checks in spec §4.1. Any failure along the way returns `false` (skip).
pub fn should_follow(url: &str, base: &str, config: &CrawlConfig) -> bool {
    // (1) blocked_patterns regex; an invalid pattern is ignored, not fatal.
    for pattern in &config.blocked_patterns {
        if let Ok(re) = Regex::new(pattern) {
            if re.is_match(url) {
                return false;
            }
        }
    }

    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return false,
    };
    let base_parsed = match Url::parse(base) {
        Ok(u) => u,
        Err(_) => return false,
    };

    // (2) external-link rule.
    let is_external = !same_domain(url, base);
    if is_external && !config.follow_external_links {
        return false;
    }

    // (3) allowed_domains whitelist (suffix match on ".domain"); empty means
    // "same as seed domain", already enforced by (2) when external links are
    // disallowed. When external links are allowed, an explicit whitelist
    // still constrains which external hosts qualify.
    if !config.allowed_domains.is_empty() {
        let host = match parsed.host_str() {
            Some(h) => h.to_lowercase(),
            None => return false,
        };
        let allowed = config.allowed_domains.iter().any(|d| {
            let d = d.to_lowercase();
            host == d || host.ends_with(&format!(".{d}"))
        });
        if !allowed {
            return false;
        }
    } else if is_external {
        return false;
    }

    let _ = base_parsed;

    // (4) blocked file-extension list, case-insensitive pathname suffix.
    let path_lower = parsed.path().to_lowercase();
    if BLOCKED_EXTENSIONS.iter().any(|ext| path_lower.ends_with(ext)) {
        return false;
    }

    // (5) blocked path substrings.
    if BLOCKED_PATH_SUBSTRINGS.iter().any(|s| path_lower.contains(s)) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("HTTPS://Example.COM/Path/?b=2&a=1#frag", None);
        let twice = normalize(&once, None);
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_canonicalization_example() {
        let n = normalize("HTTPS://Example.COM/Path/?b=2&a=1#frag", None);
        assert_eq!(n, "https://example.com/Path?a=1&b=2");
    }

    #[test]
    fn normalize_relative_against_base() {
        let base = "https://example.com/Path?a=1&b=2";
        let n = normalize("foo/bar/", Some(base));
        assert_eq!(n, "https://example.com/Path/foo/bar");
    }

    #[test]
    fn normalize_unparseable_returns_verbatim() {
        let input = "not a url at all";
        assert_eq!(normalize(input, None), input);
    }

    #[test]
    fn normalize_fragment_and_query_order_do_not_affect_identity() {
        let a = normalize("https://example.com/x?b=2&a=1#frag1", None);
        let b = normalize("https://example.com/x?a=1&b=2#frag2", None);
        assert_eq!(a, b);
    }

    #[test]
    fn same_domain_ignores_www_prefix() {
        assert!(same_domain("https://www.example.com/a", "https://example.com/b"));
    }

    #[test]
    fn should_follow_rejects_blocked_extension() {
        let config = CrawlConfig::default();
        assert!(!should_follow(
            "https://example.com/file.pdf",
            "https://example.com/",
            &config
        ));
    }

    #[test]
    fn should_follow_rejects_blocked_path_substring() {
        let config = CrawlConfig::default();
        assert!(!should_follow(
            "https://example.com/api/data",
            "https://example.com/",
            &config
        ));
    }

    #[test]
    fn should_follow_rejects_external_by_default() {
        let config = CrawlConfig::default();
        assert!(!should_follow(
            "https://other.com/page",
            "https://example.com/",
            &config
        ));
    }

    #[test]
    fn should_follow_allows_external_when_configured() {
        let config = CrawlConfig {
            follow_external_links: true,
            ..Default::default()
        };
        assert!(should_follow(
            "https://other.com/page",
            "https://example.com/",
            &config
        ));
    }

    #[test]
    fn should_follow_honors_allowed_domains_suffix() {
        let config = CrawlConfig {
            follow_external_links: true,
            allowed_domains: vec!["partner.com".to_string()],
            ..Default::default()
        };
        assert!(should_follow(
            "https://sub.partner.com/page",
            "https://example.com/",
            &config
        ));
        assert!(!should_follow(
            "https://evil.com/page",
            "https://example.com/",
            &config
        ));
    }

    #[test]
    fn should_follow_ignores_invalid_regex() {
        let config = CrawlConfig {
            blocked_patterns: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        assert!(should_follow(
            "https://example.com/page",
            "https://example.com/",
            &config
        ));
    }
}
