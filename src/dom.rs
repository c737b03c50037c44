//! Element node model consumed by the conversion engine
//!
//! The engine does not walk the html5ever DOM directly. The parser lowers it
//! into [`HtmlNode`], a small owned tree carrying exactly what conversion
//! needs: a tag name, an attribute map, an inline-style map, children, and a
//! text payload for text nodes.
//!
//! Tag and attribute names are stored lowercased so all comparisons are
//! case-insensitive. The style map sits behind a `RefCell` because the
//! dispatcher has one documented side effect on input data: header-cell
//! children receive a default `font-weight: bold` entry when they do not
//! declare one. Everything else treats the tree as read-only.

use std::cell::RefCell;
use std::collections::HashMap;

/// Inline style mapping: lowercased property name to raw declared value
pub type StyleMap = HashMap<String, String>;

/// A single node of the parsed HTML tree
#[derive(Debug)]
pub struct HtmlNode {
    tag: String,
    attributes: HashMap<String, String>,
    styles: RefCell<StyleMap>,
    children: Vec<HtmlNode>,
    is_text: bool,
    text: String,
}

impl HtmlNode {
    /// Create an element node with no attributes, styles, or children
    pub fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: HashMap::new(),
            styles: RefCell::new(StyleMap::new()),
            children: Vec::new(),
            is_text: false,
            text: String::new(),
        }
    }

    /// Create a text node carrying the given payload
    pub fn text(content: &str) -> Self {
        Self {
            tag: String::new(),
            attributes: HashMap::new(),
            styles: RefCell::new(StyleMap::new()),
            children: Vec::new(),
            is_text: true,
            text: content.to_string(),
        }
    }

    /// Add an attribute (builder style, used by the parser and tests)
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Add an inline style declaration (builder style)
    pub fn with_style(self, property: &str, value: &str) -> Self {
        self.styles
            .borrow_mut()
            .insert(property.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Add a child node (builder style)
    pub fn with_child(mut self, child: HtmlNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    /// Set a style declaration, replacing any existing value
    ///
    /// Used by the parser when lowering inline `style` attributes; later
    /// declarations of the same property win, as in CSS.
    pub fn set_style(&self, property: &str, value: &str) {
        self.styles
            .borrow_mut()
            .insert(property.to_ascii_lowercase(), value.to_string());
    }

    pub fn push_child(&mut self, child: HtmlNode) {
        self.children.push(child);
    }

    /// Case-insensitive tag comparison used throughout the engine
    pub fn tag_is(&self, name: &str) -> bool {
        !self.is_text && self.tag.eq_ignore_ascii_case(name)
    }

    /// Lowercased tag name (empty for text nodes)
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_text(&self) -> bool {
        self.is_text
    }

    /// Raw text payload (empty for element nodes)
    pub fn text_content(&self) -> &str {
        &self.text
    }

    /// True for text nodes that are empty or whitespace-only
    ///
    /// Such nodes are dropped by the dispatcher so they never produce
    /// spurious empty runs.
    pub fn is_empty_text(&self) -> bool {
        self.is_text && self.text.trim().is_empty()
    }

    pub fn children(&self) -> &[HtmlNode] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Look up an attribute by name, case-insensitively
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Look up a declared inline style value, case-insensitively
    pub fn style_value(&self, property: &str) -> Option<String> {
        self.styles
            .borrow()
            .get(&property.to_ascii_lowercase())
            .cloned()
    }

    /// Snapshot of the node's current style map
    pub fn styles(&self) -> StyleMap {
        self.styles.borrow().clone()
    }

    /// Inject a style declaration unless the property is already present
    ///
    /// This is the one place input data is mutated: the table builder forces
    /// `font-weight: bold` onto header-cell children. The presence check makes
    /// the injection idempotent and keeps explicit author values untouched.
    /// Returns whether the value was inserted.
    pub fn set_style_if_absent(&self, property: &str, value: &str) -> bool {
        let key = property.to_ascii_lowercase();
        let mut styles = self.styles.borrow_mut();
        if styles.contains_key(&key) {
            return false;
        }
        styles.insert(key, value.to_string());
        true
    }
}
