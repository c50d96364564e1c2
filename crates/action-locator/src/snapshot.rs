//! Point-in-time DOM snapshot used for fuzzy matching

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::errors::LocatorError;

/// Element node of a captured document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomNode {
    /// Lowercase tag name
    pub tag: String,

    /// Attributes, rendered in name order
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Text directly inside this element, before its children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default)]
    pub children: Vec<DomNode>,
}

impl DomNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: DomNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whitespace-separated entries of the `class` attribute
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Markup serialization of the whole subtree: tag, attributes, text and
    /// nested children.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Markup of this element alone: tag, attributes and direct text, with
    /// child elements left out.
    pub fn shallow_html(&self) -> String {
        let mut out = String::new();
        self.write_open(&mut out);
        if let Some(text) = &self.text {
            out.push_str(&escape(text, false));
        }
        self.write_close(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        self.write_open(out);
        if let Some(text) = &self.text {
            out.push_str(&escape(text, false));
        }
        for child in &self.children {
            child.write_html(out);
        }
        self.write_close(out);
    }

    fn write_open(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape(value, true));
        }
        out.push('>');
    }

    fn write_close(&self, out: &mut String) {
        if !is_void(&self.tag) {
            let _ = write!(out, "</{}>", self.tag);
        }
    }
}

/// Whether `tag` can stand alone as an XPath name step, as in `//svg:rect`.
pub fn is_name_token(tag: &str) -> bool {
    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "source" | "track" | "wbr"
    )
}

fn escape(raw: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// Immutable capture of a document. Fetched fresh for every fuzzy attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Document root; `None` for an empty document
    #[serde(default)]
    pub root: Option<DomNode>,
}

impl DomSnapshot {
    pub fn new(root: DomNode) -> Self {
        Self {
            url: None,
            root: Some(root),
        }
    }

    pub fn empty() -> Self {
        Self {
            url: None,
            root: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Decode a snapshot from JSON
    pub fn from_json(raw: &str) -> Result<Self, LocatorError> {
        serde_json::from_str(raw).map_err(|err| LocatorError::InvalidSnapshot(err.to_string()))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, LocatorError> {
        serde_json::from_reader(reader)
            .map_err(|err| LocatorError::InvalidSnapshot(err.to_string()))
    }

    /// Every element node in document (pre-)order
    pub fn elements(&self) -> Elements<'_> {
        Elements {
            stack: self.root.iter().collect(),
        }
    }

    pub fn element_count(&self) -> usize {
        self.elements().count()
    }
}

/// Pre-order iterator over element nodes
pub struct Elements<'a> {
    stack: Vec<&'a DomNode>,
}

impl<'a> Iterator for Elements<'a> {
    type Item = &'a DomNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
