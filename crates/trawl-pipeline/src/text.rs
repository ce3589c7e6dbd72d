//! Text Processor: Unicode normalization, control-char stripping, line-break
//! and whitespace normalization, and structure-preserving HTML→text
//! extraction (spec §4.7).

use scraper::{ElementRef, Html, Node};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnicodeForm {
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitespaceMode {
    /// Collapse all runs of whitespace (including newlines) to one space.
    Aggressive,
    /// Preserve at most a double newline between paragraphs; trim each
    /// line's leading/trailing spaces.
    PreserveParagraphs,
}

#[derive(Debug, Clone)]
pub struct TextProcessorConfig {
    pub normalize_unicode: bool,
    pub unicode_form: UnicodeForm,
    pub strip_control_chars: bool,
    pub normalize_line_breaks: bool,
    pub whitespace_mode: WhitespaceMode,
    pub trim_lines: bool,
    pub max_length: Option<usize>,
}

impl Default for TextProcessorConfig {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            unicode_form: UnicodeForm::Nfc,
            strip_control_chars: true,
            normalize_line_breaks: true,
            whitespace_mode: WhitespaceMode::Aggressive,
            trim_lines: true,
            max_length: None,
        }
    }
}

/// Run every enabled stage over `input`, in spec order: Unicode
/// normalization → control-char removal → line-break normalization →
/// whitespace cleanup → per-line trim → maxLength truncation.
pub fn process(input: &str, config: &TextProcessorConfig) -> String {
    let mut text = input.to_string();

    if config.normalize_unicode {
        text = normalize_unicode(&text, config.unicode_form);
    }
    if config.strip_control_chars {
        text = strip_control_chars(&text);
    }
    if config.normalize_line_breaks {
        text = normalize_line_breaks(&text);
    }
    text = clean_whitespace(&text, config.whitespace_mode);
    if config.trim_lines {
        text = trim_each_line(&text);
    }
    if let Some(max) = config.max_length {
        text = truncate_chars(&text, max);
    }
    text
}

fn normalize_unicode(s: &str, form: UnicodeForm) -> String {
    match form {
        UnicodeForm::Nfc => s.nfc().collect(),
        UnicodeForm::Nfd => s.nfd().collect(),
        UnicodeForm::Nfkc => s.nfkc().collect(),
        UnicodeForm::Nfkd => s.nfkd().collect(),
    }
}

/// ASCII 0x00–0x1F (except tab/LF/CR), 0x7F, zero-widths U+200B–U+200D,
/// U+FEFF, bidi controls U+202A–U+202E and U+2066–U+2069 (spec §4.7).
fn is_stripped_control_char(c: char) -> bool {
    let code = c as u32;
    match code {
        0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F => true,
        0x7F => true,
        0x200B..=0x200D => true,
        0xFEFF => true,
        0x202A..=0x202E => true,
        0x2066..=0x2069 => true,
        _ => false,
    }
}

fn strip_control_chars(s: &str) -> String {
    s.chars().filter(|c| !is_stripped_control_char(*c)).collect()
}

fn normalize_line_breaks(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

fn clean_whitespace(s: &str, mode: WhitespaceMode) -> String {
    match mode {
        WhitespaceMode::Aggressive => s.split_whitespace().collect::<Vec<_>>().join(" "),
        WhitespaceMode::PreserveParagraphs => {
            let mut out = String::with_capacity(s.len());
            let mut blank_run = 0;
            for line in s.split('\n') {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    blank_run += 1;
                    if blank_run > 1 {
                        continue;
                    }
                } else {
                    blank_run = 0;
                }
                out.push_str(trimmed);
                out.push('\n');
            }
            out.trim_end_matches('\n').to_string()
        }
    }
}

fn trim_each_line(s: &str) -> String {
    s.lines()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Concatenated `textContent`, whitespace-normalized.
    Flat,
    /// Inject blank lines around block elements, `- ` before `li`, a
    /// line-break before `br`/`hr`.
    StructurePreserving,
}

const STRUCTURAL_BLOCK_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p", "div", "section", "article"];

/// HTML → text extraction (spec §4.7), flat or structure-preserving.
pub fn extract_from_html(html: &str, mode: ExtractionMode) -> String {
    match mode {
        ExtractionMode::Flat => {
            let document = Html::parse_fragment(html);
            let raw: String = document.root_element().text().collect();
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        }
        ExtractionMode::StructurePreserving => {
            let document = Html::parse_fragment(html);
            let mut out = String::new();
            walk_structured(document.root_element(), &mut out);
            clean_whitespace(&out, WhitespaceMode::PreserveParagraphs)
        }
    }
}

fn walk_structured(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(elem) => {
                let tag = elem.name();
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if tag == "script" || tag == "style" {
                    continue;
                }
                if tag == "br" || tag == "hr" {
                    out.push('\n');
                    continue;
                }
                let is_block = STRUCTURAL_BLOCK_TAGS.contains(&tag);
                if is_block {
                    out.push('\n');
                }
                if tag == "li" {
                    out.push_str("- ");
                }
                walk_structured(child_el, out);
                if is_block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_zero_width_and_bidi_controls() {
        let s = "a\u{200B}b\u{202A}c";
        assert_eq!(strip_control_chars(s), "abc");
    }

    #[test]
    fn keeps_tab_newline_and_cr() {
        let s = "a\tb\nc\rd";
        assert_eq!(strip_control_chars(s), s);
    }

    #[test]
    fn normalizes_crlf_and_cr_to_lf() {
        assert_eq!(normalize_line_breaks("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn aggressive_whitespace_collapses_newlines() {
        let cleaned = clean_whitespace("a   b\n\n\nc", WhitespaceMode::Aggressive);
        assert_eq!(cleaned, "a b c");
    }

    #[test]
    fn preserve_paragraphs_caps_blank_runs_and_trims_lines() {
        let cleaned = clean_whitespace("  a  \n\n\n\n  b  ", WhitespaceMode::PreserveParagraphs);
        assert_eq!(cleaned, "a\n\nb");
    }

    #[test]
    fn truncate_respects_max_length_in_chars() {
        let config = TextProcessorConfig {
            max_length: Some(3),
            ..Default::default()
        };
        let result = process("hello world", &config);
        assert_eq!(result.chars().count(), 3);
    }

    #[test]
    fn flat_extraction_concatenates_text_content() {
        let html = "<div><p>hello</p> <p>world</p></div>";
        let text = extract_from_html(html, ExtractionMode::Flat);
        assert_eq!(text, "hello world");
    }

    #[test]
    fn structure_preserving_inserts_blank_lines_and_list_markers() {
        let html = "<div><h1>Title</h1><p>para</p><ul><li>one</li><li>two</li></ul></div>";
        let text = extract_from_html(html, ExtractionMode::StructurePreserving);
        assert!(text.contains("Title"));
        assert!(text.contains("- one"));
        assert!(text.contains("- two"));
    }

    #[test]
    fn process_runs_all_default_stages() {
        let input = "  Caf\u{65}\u{0301}   \r\n  is\u{200B}great  ";
        let result = process(input, &TextProcessorConfig::default());
        assert!(!result.contains('\u{200B}'));
        assert!(!result.contains("  "));
    }
}
