//! Parsed markup documents.
//!
//! Thin capability layer over `scraper`: parsing, element queries and the two
//! text accessors the crawler and the fact-box parser rely on.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Elements whose text content is never part of visible page text.
const SKIP_TAGS: &[&str] = &["script", "style", "noscript"];

/// Parse a CSS selector known at compile time.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// A parsed page.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// The document root element.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// First element matching `selector`, anywhere in the document.
    pub fn find(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// Trimmed text of the first element matching `selector`, if non-empty.
    pub fn title(&self, selector: &Selector) -> Option<String> {
        self.find(selector)
            .map(trimmed_text)
            .filter(|t| !t.is_empty())
    }
}

/// All text beneath `element`, concatenated and trimmed.
pub fn trimmed_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    collect_text(element, &mut |s| text.push_str(s));
    text.trim().to_string()
}

/// Each non-blank text fragment beneath `element`, individually trimmed, in
/// document order.
pub fn stripped_strings(element: ElementRef<'_>) -> Vec<String> {
    let mut strings = Vec::new();
    collect_text(element, &mut |s| {
        let s = s.trim();
        if !s.is_empty() {
            strings.push(s.to_string());
        }
    });
    strings
}

/// Stripped strings joined by single spaces.
pub fn joined_text(element: ElementRef<'_>) -> String {
    stripped_strings(element).join(" ")
}

fn collect_text(element: ElementRef<'_>, sink: &mut impl FnMut(&str)) {
    for child in element.children() {
        match child.value() {
            Node::Text(t) => {
                let s: &str = &t.text;
                sink(s);
            }
            Node::Element(el) => {
                if SKIP_TAGS.contains(&el.name()) {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, sink);
                }
            }
            _ => {}
        }
    }
}
