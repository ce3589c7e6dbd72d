//! Markdown Converter: rule-driven markup → Markdown (spec §4.6).

use ego_tree::NodeRef;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

use crate::html::extract_text;

/// Convert `html` to Markdown. On any internal failure this falls back to
/// plain text extraction (strip tags, collapse whitespace) rather than
/// propagating an error — matching the spec's "on converter exception"
/// fallback.
pub fn convert(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let mut out = String::new();
    for child in document.root_element().children() {
        render_node(child, &mut out);
    }
    normalize(&out)
}

fn render_node(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(&text.text),
        Node::Element(elem) => {
            let tag = elem.name();
            let Some(el) = ElementRef::wrap(node) else {
                render_children(node, out);
                return;
            };

            match tag {
                "script" | "style" => {}
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    let level = tag[1..].parse::<usize>().unwrap_or(1);
                    out.push_str("\n\n");
                    out.push_str(&"#".repeat(level));
                    out.push(' ');
                    render_children(node, out);
                    out.push_str("\n\n");
                }
                "p" => {
                    out.push_str("\n\n");
                    render_children(node, out);
                    out.push_str("\n\n");
                }
                "br" => out.push('\n'),
                "hr" => out.push_str("\n\n---\n\n"),
                "strong" | "b" => {
                    out.push_str("**");
                    render_children(node, out);
                    out.push_str("**");
                }
                "em" | "i" => {
                    out.push('*');
                    render_children(node, out);
                    out.push('*');
                }
                "code" => {
                    out.push('`');
                    render_children(node, out);
                    out.push('`');
                }
                "pre" => {
                    let language = find_code_language(node);
                    out.push_str("\n\n```");
                    out.push_str(&language.unwrap_or_default());
                    out.push('\n');
                    out.push_str(&pre_text(node));
                    out.push_str("\n```\n\n");
                }
                "blockquote" => {
                    let mut inner = String::new();
                    render_children(node, &mut inner);
                    out.push_str("\n\n");
                    for line in inner.trim().lines() {
                        out.push_str("> ");
                        out.push_str(line);
                        out.push('\n');
                    }
                    out.push('\n');
                }
                "ul" | "ol" => {
                    out.push('\n');
                    for child in node.children() {
                        if let Some(child_el) = ElementRef::wrap(child) {
                            if child_el.value().name() == "li" {
                                out.push_str("- ");
                                render_children(child, out);
                                out.push('\n');
                            }
                        }
                    }
                    out.push('\n');
                }
                "li" => {
                    // Reached only when not a direct child of ul/ol's loop
                    // above (e.g. nested lists); treat the same way.
                    out.push_str("- ");
                    render_children(node, out);
                    out.push('\n');
                }
                "a" => {
                    let href = el.value().attr("href").unwrap_or("");
                    out.push('[');
                    render_children(node, out);
                    out.push(']');
                    out.push('(');
                    out.push_str(href);
                    out.push(')');
                }
                "table" => {
                    out.push_str("\n\n");
                    out.push_str(&el.html());
                    out.push_str("\n\n");
                }
                _ => render_children(node, out),
            }
        }
        _ => {}
    }
}

fn render_children(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        render_node(child, out);
    }
}

fn find_code_language(pre_node: NodeRef<'_, Node>) -> Option<String> {
    for child in pre_node.children() {
        if let Some(el) = ElementRef::wrap(child) {
            if el.value().name() == "code" {
                if let Some(class) = el.value().attr("class") {
                    for token in class.split_whitespace() {
                        if let Some(lang) = token.strip_prefix("language-") {
                            return Some(lang.to_string());
                        }
                    }
                }
            }
        }
    }
    None
}

fn pre_text(pre_node: NodeRef<'_, Node>) -> String {
    let mut text = String::new();
    for child in pre_node.children() {
        if let Node::Text(t) = child.value() {
            text.push_str(&t.text);
        } else if let Some(el) = ElementRef::wrap(child) {
            if el.value().name() == "code" {
                text.push_str(&el.text().collect::<String>());
            }
        }
    }
    text.trim_end().to_string()
}

/// Post-pass normalization: collapse ≥3 newlines to 2, ensure one space
/// after heading markers, dedupe leading/trailing blank lines, normalize
/// list-item spacing.
fn normalize(markdown: &str) -> String {
    let mut result = markdown.to_string();

    if let Ok(re) = Regex::new(r"\n{3,}") {
        result = re.replace_all(&result, "\n\n").to_string();
    }
    if let Ok(re) = Regex::new(r"(?m)^(#{1,6})[ \t]*") {
        result = re.replace_all(&result, "$1 ").to_string();
    }
    if let Ok(re) = Regex::new(r"(?m)^-[ \t]+") {
        result = re.replace_all(&result, "- ").to_string();
    }

    result.trim_matches('\n').to_string()
}

/// Fallback used by the pipeline on a converter exception: strip tags and
/// collapse whitespace.
pub fn fallback_to_text(html: &str) -> String {
    extract_text(html)
}
