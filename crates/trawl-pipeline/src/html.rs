//! HTML Processor: noise removal, main-content identification, tag/attribute
//! sanitization, and text extraction from markup (spec §4.5).

use std::collections::HashSet;

use lol_html::{comments, element, rewrite_str, RewriteStrSettings};
use scraper::{ElementRef, Html, Selector};
use trawl_types::scrape::MIN_CONTENT_TEXT_LEN;

/// 10 MiB.
pub const DEFAULT_MAX_MARKUP_LENGTH: usize = 10 * 1024 * 1024;

const NOISE_SELECTORS: &[&str] = &[
    ".ad",
    ".ads",
    ".advertisement",
    ".social",
    ".social-share",
    ".social-buttons",
    "nav",
    "footer",
    "aside.sidebar",
    ".sidebar",
    ".cookie-banner",
    ".cookie-consent",
    "[role=banner]",
    "[role=navigation]",
    "[role=complementary]",
    "[role=contentinfo]",
];

const MAIN_CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=main]",
    ".content",
    "#content",
    ".post",
    ".article",
    ".entry-content",
    ".post-content",
    ".article-content",
    ".main-content",
    ".page-content",
    "section",
    ".body-content",
];

const DEFAULT_SAFE_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "caption", "code", "del", "dl", "dt", "dd", "em", "h1",
    "h2", "h3", "h4", "h5", "h6", "hr", "i", "li", "ol", "p", "pre", "q", "small", "span",
    "strong", "sub", "sup", "table", "tbody", "td", "th", "thead", "tr", "u", "ul",
    // extended per spec §4.5
    "img", "figure", "figcaption",
];

const DEFAULT_SAFE_ATTRIBUTES: &[&str] = &["href", "src", "alt", "title"];

const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

#[derive(Debug, Clone)]
pub struct HtmlProcessorConfig {
    pub max_markup_length: usize,
    pub remove_scripts: bool,
    pub remove_styles: bool,
    pub remove_comments: bool,
    pub safe_tags: HashSet<String>,
    pub safe_attributes: HashSet<String>,
}

impl Default for HtmlProcessorConfig {
    fn default() -> Self {
        Self {
            max_markup_length: DEFAULT_MAX_MARKUP_LENGTH,
            remove_scripts: true,
            remove_styles: true,
            remove_comments: true,
            safe_tags: DEFAULT_SAFE_TAGS.iter().map(|s| s.to_string()).collect(),
            safe_attributes: DEFAULT_SAFE_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Truncate `html` to `config.max_markup_length`, logging a warning when it
/// happens. Truncation is by byte length, matching the spec's plain
/// length-based cutoff.
pub fn truncate_if_needed(html: &str, config: &HtmlProcessorConfig) -> String {
    if html.len() <= config.max_markup_length {
        return html.to_string();
    }
    tracing::warn!(
        original_len = html.len(),
        max = config.max_markup_length,
        "markup exceeds max_markup_length, truncating"
    );
    let mut cut = config.max_markup_length;
    while cut > 0 && !html.is_char_boundary(cut) {
        cut -= 1;
    }
    html[..cut].to_string()
}

/// Remove `<script>`/`<style>`/comments (per config) plus the fixed list of
/// noise selectors (ads, social, nav/footer/sidebar, cookie banners, ARIA
/// landmark roles that are never main content).
pub fn clean(html: &str, config: &HtmlProcessorConfig) -> String {
    let mut removal_selector = NOISE_SELECTORS.join(", ");
    if config.remove_scripts {
        removal_selector.push_str(", script");
    }
    if config.remove_styles {
        removal_selector.push_str(", style");
    }

    let mut document_content_handlers = Vec::new();
    if config.remove_comments {
        document_content_handlers.push(comments!("*", |c| {
            c.remove();
            Ok(())
        }));
    }

    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(removal_selector, |el| {
                el.remove();
                Ok(())
            })],
            document_content_handlers,
            ..RewriteStrSettings::default()
        },
    );

    match result {
        Ok(cleaned) => cleaned,
        Err(err) => {
            tracing::warn!(error = %err, "html cleaning pass failed, using input verbatim");
            html.to_string()
        }
    }
}

/// Identify "main content" among `clean_markup` by trying the ordered
/// selector cascade and accepting the first whose collapsed text length is
/// at least [`MIN_CONTENT_TEXT_LEN`]. Returns `None` when nothing qualifies,
/// so the caller falls back to `<body>`.
pub fn extract_main_content(clean_markup: &str) -> Option<String> {
    let document = Html::parse_document(clean_markup);

    for selector_str in MAIN_CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text_len = collapsed_text(element).len();
            if text_len >= MIN_CONTENT_TEXT_LEN {
                return Some(element.html());
            }
        }
    }
    None
}

/// Fall back to `<body>`'s outer HTML, or the whole document if there is no
/// `<body>` element (e.g. an HTML fragment).
pub fn extract_body(clean_markup: &str) -> String {
    let document = Html::parse_document(clean_markup);
    if let Ok(selector) = Selector::parse("body") {
        if let Some(body) = document.select(&selector).next() {
            return body.html();
        }
    }
    clean_markup.to_string()
}

/// Sanitize `html_fragment` to the safe-tag/safe-attribute whitelist.
/// Disallowed tags are unwrapped (their content survives); disallowed
/// attributes are stripped; `href`/`src` values are dropped unless their
/// scheme is in [`ALLOWED_URL_SCHEMES`] (`data:` is additionally allowed for
/// `<img src>`).
pub fn sanitize(html_fragment: &str, config: &HtmlProcessorConfig) -> String {
    let safe_tags = config.safe_tags.clone();
    let safe_attrs = config.safe_attributes.clone();

    let result = rewrite_str(
        html_fragment,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", move |el| {
                let tag = el.tag_name();
                if !safe_tags.contains(&tag) {
                    el.remove_and_keep_content();
                    return Ok(());
                }

                let attr_names: Vec<String> =
                    el.attributes().iter().map(|a| a.name()).collect();
                for name in attr_names {
                    if !safe_attrs.contains(&name) {
                        el.remove_attribute(&name);
                        continue;
                    }
                    if name == "href" || name == "src" {
                        if let Some(value) = el.get_attribute(&name) {
                            if !scheme_allowed(&value, &tag, &name) {
                                el.remove_attribute(&name);
                            }
                        }
                    }
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    );

    match result {
        Ok(sanitized) => sanitized,
        Err(err) => {
            tracing::warn!(error = %err, "sanitize pass failed, using input verbatim");
            html_fragment.to_string()
        }
    }
}

fn scheme_allowed(value: &str, tag: &str, attr: &str) -> bool {
    let lower = value.trim().to_lowercase();
    if tag == "img" && attr == "src" && lower.starts_with("data:") {
        return true;
    }
    // A scheme-relative or relative URL (no `:` before the first `/`) is
    // allowed through untouched.
    match lower.split_once(':') {
        Some((scheme, _)) if scheme.chars().all(|c| c.is_ascii_alphabetic()) => {
            ALLOWED_URL_SCHEMES.contains(&scheme)
        }
        _ => true,
    }
}

/// `textContent`, trimmed and with whitespace runs collapsed to one space.
fn collapsed_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    collapse_whitespace(&raw)
}

fn collapse_whitespace(s: &str) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim().to_string()
}

/// Extract plain text from `html_fragment`: strip all tags, collapse
/// whitespace runs to a single space, and collapse doubled blank-line runs.
pub fn extract_text(html_fragment: &str) -> String {
    let document = Html::parse_fragment(html_fragment);
    let raw: String = document.root_element().text().collect();
    let collapsed = collapse_whitespace(&raw);
    collapse_blank_lines(&collapsed)
}

fn collapse_blank_lines(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut blank_run = 0;
    for line in s.split('\n') {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_end_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_removes_scripts_and_noise() {
        let html = r#"<html><body><nav>menu</nav><script>evil()</script><main><p>Real content here that is long enough to qualify as main content for the purposes of this particular unit test assertion about length thresholds.</p></main></body></html>"#;
        let cleaned = clean(html, &HtmlProcessorConfig::default());
        assert!(!cleaned.contains("<script"));
        assert!(!cleaned.contains("<nav"));
        assert!(cleaned.contains("Real content"));
    }

    #[test]
    fn main_content_accepted_when_long_enough() {
        let long_text = "word ".repeat(60);
        let html = format!("<html><body><main><p>{long_text}</p></main></body></html>");
        let main = extract_main_content(&html);
        assert!(main.is_some());
    }

    #[test]
    fn main_content_rejected_when_too_short() {
        let html = "<html><body><main><p>short</p></main></body></html>";
        assert!(extract_main_content(html).is_none());
    }

    #[test]
    fn extract_body_falls_back_when_no_main_content() {
        let html = "<html><body><p>just body text</p></body></html>";
        let body = extract_body(html);
        assert!(body.contains("just body text"));
    }

    #[test]
    fn sanitize_strips_disallowed_tags_but_keeps_content() {
        let html = r#"<div onclick="bad()"><script>evil()</script><p class="x">hello <iframe src="https://evil.com"></iframe>world</p></div>"#;
        let sanitized = sanitize(html, &HtmlProcessorConfig::default());
        assert!(!sanitized.contains("<div"));
        assert!(!sanitized.contains("<iframe"));
        assert!(!sanitized.contains("onclick"));
        assert!(sanitized.contains("hello"));
        assert!(sanitized.contains("world"));
    }

    #[test]
    fn sanitize_drops_javascript_scheme_links() {
        let html = r#"<p><a href="javascript:alert(1)">click</a></p>"#;
        let sanitized = sanitize(html, &HtmlProcessorConfig::default());
        assert!(!sanitized.contains("javascript:"));
    }

    #[test]
    fn sanitize_allows_data_uri_for_img_src() {
        let html = r#"<img src="data:image/png;base64,abc" alt="x">"#;
        let sanitized = sanitize(html, &HtmlProcessorConfig::default());
        assert!(sanitized.contains("data:image/png"));
    }

    #[test]
    fn extract_text_collapses_whitespace_and_blank_lines() {
        let html = "<p>hello   world</p>\n\n\n<p>second</p>";
        let text = extract_text(html);
        assert!(!text.contains("  "));
        assert!(text.contains("hello world"));
    }

    #[test]
    fn truncate_respects_max_markup_length() {
        let html = "x".repeat(100);
        let config = HtmlProcessorConfig {
            max_markup_length: 10,
            ..Default::default()
        };
        let truncated = truncate_if_needed(&html, &config);
        assert_eq!(truncated.len(), 10);
    }
}
