//! HTML to plain text for product descriptions
//!
//! Keeps text data and drops markup. Block-level elements turn into line
//! breaks so neighbouring paragraphs never run into each other.

use scraper::{ElementRef, Html, Node};

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "br", "dd", "div", "dl", "dt", "footer", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "li", "ol", "p", "section", "table", "td", "th", "tr", "ul",
];

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Strip tags from an HTML fragment and return its trimmed text content
pub fn clean_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());
    collect_text(fragment.root_element(), &mut text);
    normalize_lines(&text)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                let is_block = BLOCK_ELEMENTS.contains(&name);
                if is_block {
                    out.push('\n');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if is_block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Trim each line, drop blank ones, and replace non-breaking spaces
fn normalize_lines(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
