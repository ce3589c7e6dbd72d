//! Link, AJAX-endpoint, and frame discovery from parsed markup (spec §4.4).

use std::collections::HashSet;

use chrono::Utc;
use regex::Regex;
use scraper::{Html, Selector};
use trawl_types::crawl::{CrawlConfig, CrawlPage};

use crate::url_normalizer::{normalize, should_follow};

const RELEVANCE_KEYWORDS_POSITIVE: &[&str] =
    &["read", "more", "view", "details", "article", "post", "page"];
const RELEVANCE_KEYWORDS_NEGATIVE: &[&str] =
    &["login", "signup", "register", "logout", "cart", "checkout"];

/// Discover outbound links in `html`, resolved against `base_url`, scored by
/// relevance, and filtered by the depth/visited/`should_follow` rules in
/// spec §4.4. Output is sorted by priority descending (stable).
pub fn discover_links(
    html: &str,
    base_url: &str,
    config: &CrawlConfig,
    current_depth: u32,
    visited: &HashSet<String>,
    task_description: Option<&str>,
) -> Vec<CrawlPage> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let child_depth = current_depth + 1;
    if child_depth > config.max_depth {
        return Vec::new();
    }

    let now = Utc::now();
    let parent = CrawlPage {
        url: base_url.to_string(),
        depth: current_depth,
        parent_url: None,
        discovered_at: now,
        visited_at: None,
        status: trawl_types::crawl::PageStatus::Visited,
        error: None,
        priority: 0,
    };

    let mut discovered: Vec<CrawlPage> = Vec::new();
    let mut seen_this_pass: HashSet<String> = HashSet::new();

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(h) => h,
            None => continue,
        };
        let link_text = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
        let title = element.value().attr("title").unwrap_or("");

        let resolved = normalize(href, Some(base_url));
        if url::Url::parse(&resolved).is_err() {
            continue;
        }
        if visited.contains(&resolved) {
            continue;
        }
        if seen_this_pass.contains(&resolved) {
            continue;
        }
        if !should_follow(&resolved, base_url, config) {
            continue;
        }

        let priority = score_link(&resolved, &link_text, title, task_description);
        seen_this_pass.insert(resolved.clone());
        discovered.push(CrawlPage::child(resolved, &parent, priority, now));
    }

    discovered.sort_by(|a, b| b.priority.cmp(&a.priority));
    discovered
}

/// Relevance scoring rules, applied in the order spec §4.4 lists them.
fn score_link(url: &str, link_text: &str, title: &str, task_description: Option<&str>) -> i32 {
    let mut score = 0;
    let combined = format!("{link_text} {title}").to_lowercase();

    let text_len = link_text.len();
    if text_len > 5 && text_len < 100 {
        score += 1;
    }

    if RELEVANCE_KEYWORDS_POSITIVE.iter().any(|kw| combined.contains(kw)) {
        score += 2;
    }
    if RELEVANCE_KEYWORDS_NEGATIVE.iter().any(|kw| combined.contains(kw)) {
        score -= 2;
    }

    if let Ok(re) = Regex::new(r"\d+") {
        if re.is_match(url) {
            score += 1;
        }
    }

    if let Some(task) = task_description {
        let lower_url = url.to_lowercase();
        let segments: Vec<&str> = lower_url
            .split(|c| c == '/' || c == '-' || c == '_' || c == '.')
            .filter(|s| !s.is_empty())
            .collect();

        for word in task.to_lowercase().split_whitespace() {
            if word.len() <= 3 {
                continue;
            }
            let substring_hit = segments
                .iter()
                .any(|seg| seg.contains(word) || word.contains(*seg));
            if substring_hit {
                score += 2;
            }
            if lower_url.contains(word) {
                score += 1;
            }
        }
    }

    score
}

const AJAX_PATTERNS: &[&str] = &[
    r#"fetch\(\s*["']([^"']+)["']"#,
    r#"\.get\(\s*["']([^"']+)["']"#,
    r#"\.post\(\s*["']([^"']+)["']"#,
    r#"ajax\(\s*["']([^"']+)["']"#,
    r#"url:\s*["']([^"']+)["']"#,
    r#"endpoint:\s*["']([^"']+)["']"#,
];

/// Scan inline `<script>` text for AJAX endpoint URL literals (spec §4.4).
pub fn discover_ajax_endpoints(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("script") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let patterns: Vec<Regex> = AJAX_PATTERNS.iter().filter_map(|p| Regex::new(p).ok()).collect();

    let mut endpoints: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for script in document.select(&selector) {
        let script_text = script.text().collect::<Vec<_>>().join("\n");
        for re in &patterns {
            for cap in re.captures_iter(&script_text) {
                let raw = match cap.get(1) {
                    Some(m) => m.as_str(),
                    None => continue,
                };
                if raw.starts_with("javascript:") || raw.starts_with('#') {
                    continue;
                }
                let resolved = normalize(raw, Some(base_url));
                if url::Url::parse(&resolved).is_err() {
                    continue;
                }
                if seen.insert(resolved.clone()) {
                    endpoints.push(resolved);
                }
            }
        }
    }

    endpoints
}

/// Discover `iframe`/`frame` `src` attributes (spec §4.4).
pub fn discover_frames(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("iframe[src], frame[src]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut frames: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for element in document.select(&selector) {
        let src = match element.value().attr("src") {
            Some(s) => s,
            None => continue,
        };
        if src.starts_with("javascript:") || src.starts_with('#') {
            continue;
        }
        let resolved = normalize(src, Some(base_url));
        if url::Url::parse(&resolved).is_err() {
            continue;
        }
        if seen.insert(resolved.clone()) {
            frames.push(resolved);
        }
    }

    frames
}
