//! Block/inline dispatcher - transforms the HTML node tree to WordprocessingML
//!
//! This module decides, node by node, what output a piece of HTML becomes.
//! The conversion is a single-threaded, depth-first traversal: each node is
//! fully processed before its siblings, and output is only ever appended,
//! never revisited.
//!
//! # Dispatch
//!
//! Elements are dispatched by lowercased tag name through one exhaustive
//! `match`. Block-level tags (`div`, `p`, headings, and friends) start a new
//! paragraph; `table` hands the subtree to the table grid builder; `br`
//! inserts a line break; inline formatting tags contribute default styles to
//! their descendants. Tags with no conversion of their own fall back to
//! inline content of the current paragraph - an unrecognized tag is never an
//! error, it just contributes no formatting.
//!
//! # The paragraph cursor
//!
//! Consecutive inline and text children accumulate into one paragraph until
//! a block-level child forces a new one. That "current paragraph" is
//! threaded through the traversal as a [`ParagraphCursor`]: a lazily created
//! paragraph plus the properties it will carry once the first run arrives.
//! Laziness matters - a `<div>` holding only a table must not leave an empty
//! paragraph behind.
//!
//! # Style threading
//!
//! A node's effective style is its parent's effective map merged with the
//! node's own declarations (own wins, and dispatch-level defaults such as
//! bold for `<strong>` sit in between). Run properties resolve from the
//! effective map; paragraph properties resolve from the block node's own
//! declarations only, which is why a margin never leaks from one sibling to
//! the next. Every resolution goes through the style value resolver and a
//! property is emitted only when resolution succeeds.

use crate::document::{
    BlockElement, Body, Paragraph, ParagraphProperties, Run, RunProperties,
};
use crate::dom::{HtmlNode, StyleMap};
use crate::error::ConversionError;
use crate::style;
use crate::table::TableBuilder;

/// Conversion options
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Base font size in half-points, the reference for relative font sizes
    pub base_font_size: u32,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            base_font_size: style::DEFAULT_FONT_SIZE,
        }
    }
}

/// Default styles contributed by heading tags unless the node overrides them
const HEADING_DEFAULTS: [(&str, &[(&str, &str)]); 6] = [
    ("h1", &[("font-size", "2em"), ("font-weight", "bold")]),
    ("h2", &[("font-size", "1.5em"), ("font-weight", "bold")]),
    ("h3", &[("font-size", "1.17em"), ("font-weight", "bold")]),
    ("h4", &[("font-weight", "bold")]),
    ("h5", &[("font-size", "0.83em"), ("font-weight", "bold")]),
    ("h6", &[("font-size", "0.67em"), ("font-weight", "bold")]),
];

/// The conversion engine's dispatcher
///
/// Stateless apart from its options; all traversal state lives in the
/// arguments threaded through the recursive calls, so one converter can be
/// reused across documents.
#[derive(Debug, Default)]
pub struct WordMlConverter {
    options: ConversionOptions,
}

impl WordMlConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConversionOptions) -> Self {
        Self { options }
    }

    pub(crate) fn base_font_size(&self) -> u32 {
        self.options.base_font_size
    }

    /// Convert a node tree into the body container
    ///
    /// `node` is the entry node supplied by the parser: the `<body>` subtree
    /// of a document, or the first element of a fragment. A body node
    /// contributes its children; any other node is converted itself.
    pub fn convert(&self, node: &HtmlNode, body: &mut Body) -> Result<(), ConversionError> {
        let inherited = StyleMap::new();
        let mut cursor = ParagraphCursor::new(ParagraphProperties::default());

        if node.tag_is("body") {
            for child in node.children() {
                self.process_child(child, &mut body.blocks, &mut cursor, &inherited)?;
            }
        } else {
            self.process_child(node, &mut body.blocks, &mut cursor, &inherited)?;
        }

        cursor.flush_into(&mut body.blocks);
        Ok(())
    }

    /// Convert one node into the given block container
    ///
    /// The workhorse of the traversal; also invoked by the table builder for
    /// cell content.
    pub(crate) fn process_child(
        &self,
        node: &HtmlNode,
        blocks: &mut Vec<BlockElement>,
        cursor: &mut ParagraphCursor,
        inherited: &StyleMap,
    ) -> Result<(), ConversionError> {
        if node.is_text() {
            if node.is_empty_text() {
                return Ok(());
            }
            let effective = merge_styles(inherited, &[], &node.styles());
            let properties = self.resolve_run_properties(&effective);
            let mut text = collapse_whitespace(node.text_content());
            let paragraph = cursor.ensure();
            if paragraph.runs.is_empty() {
                text = text.trim_start().to_string();
            }
            paragraph.runs.push(Run::text(&text, properties));
            return Ok(());
        }

        match node.tag() {
            "div" | "p" | "blockquote" | "li" | "center" => {
                self.process_block(node, blocks, cursor, inherited, &[])
            }

            tag @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                let defaults = HEADING_DEFAULTS
                    .iter()
                    .find(|(name, _)| *name == tag)
                    .map(|(_, defaults)| *defaults)
                    .unwrap_or(&[]);
                self.process_block(node, blocks, cursor, inherited, defaults)
            }

            "table" => {
                cursor.flush_into(blocks);
                if let Some(table) = TableBuilder::new(self).build(node, inherited)? {
                    blocks.push(BlockElement::Table(table));
                }
                Ok(())
            }

            "br" => {
                cursor.ensure().runs.push(Run::line_break());
                Ok(())
            }

            "b" | "strong" => {
                self.process_inline(node, blocks, cursor, inherited, &[("font-weight", "bold")])
            }
            "i" | "em" => {
                self.process_inline(node, blocks, cursor, inherited, &[("font-style", "italic")])
            }
            "u" => self.process_inline(
                node,
                blocks,
                cursor,
                inherited,
                &[("text-decoration", "underline")],
            ),

            // Non-content elements contribute nothing
            "script" | "style" | "noscript" => Ok(()),

            // No conversion owns this tag: its children are still visited as
            // inline content of the current paragraph
            _ => self.process_inline(node, blocks, cursor, inherited, &[]),
        }
    }

    /// Convert a block-level element
    ///
    /// Flushes the caller's paragraph, then accumulates the node's children
    /// into a fresh cursor carrying paragraph properties resolved from the
    /// node's own declarations.
    fn process_block(
        &self,
        node: &HtmlNode,
        blocks: &mut Vec<BlockElement>,
        cursor: &mut ParagraphCursor,
        inherited: &StyleMap,
        defaults: &[(&str, &str)],
    ) -> Result<(), ConversionError> {
        cursor.flush_into(blocks);

        let own = node.styles();
        let effective = merge_styles(inherited, defaults, &own);
        let properties = self.resolve_paragraph_properties(&own);

        let mut block_cursor = ParagraphCursor::new(properties);
        for child in node.children() {
            self.process_child(child, blocks, &mut block_cursor, &effective)?;
        }
        block_cursor.flush_into(blocks);
        Ok(())
    }

    /// Convert an inline element: children share the caller's paragraph
    fn process_inline(
        &self,
        node: &HtmlNode,
        blocks: &mut Vec<BlockElement>,
        cursor: &mut ParagraphCursor,
        inherited: &StyleMap,
        defaults: &[(&str, &str)],
    ) -> Result<(), ConversionError> {
        let effective = merge_styles(inherited, defaults, &node.styles());
        for child in node.children() {
            self.process_child(child, blocks, cursor, &effective)?;
        }
        Ok(())
    }

    /// Resolve run-level formatting from an effective style map
    ///
    /// Each property is set only when the resolver succeeds; unresolvable
    /// values leave the property unset rather than defaulting to zero.
    pub(crate) fn resolve_run_properties(&self, styles: &StyleMap) -> RunProperties {
        let mut properties = RunProperties::default();

        if let Some(value) = styles.get("font-size")
            && let Some(size) = style::font_size_in_half_points(value, self.options.base_font_size)
        {
            properties.font_size = Some(size);
        }
        if let Some(value) = styles.get("font-weight") {
            properties.bold = style::is_bold_weight(value);
        }
        if let Some(value) = styles.get("font-style") {
            properties.italic = style::is_italic_style(value);
        }
        if let Some(value) = styles.get("text-decoration") {
            properties.underline = style::has_underline(value);
        }

        properties
    }

    /// Resolve paragraph-level formatting from a node's own declarations
    ///
    /// Margins map to spacing (top/bottom) and indentation (left/right) in
    /// twentieths of a point; the shorthand accepts one, two, three, or four
    /// values in CSS order, and longhands override it.
    pub(crate) fn resolve_paragraph_properties(&self, styles: &StyleMap) -> ParagraphProperties {
        let mut properties = ParagraphProperties::default();

        if let Some(value) = styles.get("margin") {
            apply_margin_shorthand(&mut properties, value);
        }
        if let Some(value) = styles.get("margin-top")
            && let Some(twips) = style::length_in_twips(value, 0)
        {
            properties.spacing_before = Some(twips);
        }
        if let Some(value) = styles.get("margin-bottom")
            && let Some(twips) = style::length_in_twips(value, 0)
        {
            properties.spacing_after = Some(twips);
        }
        if let Some(value) = styles.get("margin-left")
            && let Some(twips) = style::length_in_twips(value, 0)
        {
            properties.indent_left = Some(twips);
        }
        if let Some(value) = styles.get("margin-right")
            && let Some(twips) = style::length_in_twips(value, 0)
        {
            properties.indent_right = Some(twips);
        }
        if let Some(value) = styles.get("text-align") {
            properties.justification = style::justification_from_text_align(value);
        }

        properties
    }
}

/// Mutable "current paragraph" threaded through the traversal
///
/// Holds the paragraph properties to apply and creates the paragraph lazily
/// when the first run arrives. Flushing appends the paragraph (if any) to a
/// block container and resets the cursor.
#[derive(Debug)]
pub(crate) struct ParagraphCursor {
    properties: ParagraphProperties,
    paragraph: Option<Paragraph>,
}

impl ParagraphCursor {
    pub(crate) fn new(properties: ParagraphProperties) -> Self {
        Self {
            properties,
            paragraph: None,
        }
    }

    /// The current paragraph, created on first use
    pub(crate) fn ensure(&mut self) -> &mut Paragraph {
        self.paragraph
            .get_or_insert_with(|| Paragraph::with_properties(self.properties.clone()))
    }

    /// Append the accumulated paragraph, if any, and reset
    pub(crate) fn flush_into(&mut self, blocks: &mut Vec<BlockElement>) {
        if let Some(paragraph) = self.paragraph.take() {
            blocks.push(BlockElement::Paragraph(paragraph));
        }
    }
}

/// Merge inherited styles, dispatch defaults, and a node's own declarations
///
/// Later sources win: defaults override inherited values, the node's own
/// declarations override both.
pub(crate) fn merge_styles(
    inherited: &StyleMap,
    defaults: &[(&str, &str)],
    own: &StyleMap,
) -> StyleMap {
    let mut merged = inherited.clone();
    for (property, value) in defaults {
        merged.insert((*property).to_string(), (*value).to_string());
    }
    for (property, value) in own {
        merged.insert(property.clone(), value.clone());
    }
    merged
}

/// Collapse whitespace runs to single spaces, preserving boundary spaces
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_whitespace = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
                in_whitespace = true;
            }
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}

/// Apply a CSS margin shorthand (1, 2, 3, or 4 values) to paragraph properties
fn apply_margin_shorthand(properties: &mut ParagraphProperties, value: &str) {
    let resolved: Vec<Option<u32>> = value
        .split_whitespace()
        .map(|token| style::length_in_twips(token, 0))
        .collect();

    let (top, right, bottom, left) = match resolved.as_slice() {
        [all] => (*all, *all, *all, *all),
        [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
        [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
        [top, right, bottom, left] => (*top, *right, *bottom, *left),
        _ => return,
    };

    if top.is_some() {
        properties.spacing_before = top;
    }
    if bottom.is_some() {
        properties.spacing_after = bottom;
    }
    if left.is_some() {
        properties.indent_left = left;
    }
    if right.is_some() {
        properties.indent_right = right;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RunContent;

    fn convert(node: &HtmlNode) -> Body {
        let mut body = Body::default();
        WordMlConverter::new().convert(node, &mut body).unwrap();
        body
    }

    fn paragraph(block: &BlockElement) -> &Paragraph {
        match block {
            BlockElement::Paragraph(p) => p,
            BlockElement::Table(_) => panic!("expected paragraph, found table"),
        }
    }

    #[test]
    fn test_div_with_relative_font_size() {
        let div = HtmlNode::element("div")
            .with_style("font-size", "100%")
            .with_child(HtmlNode::text("test"));

        let body = convert(&div);
        assert_eq!(body.blocks.len(), 1);
        let p = paragraph(&body.blocks[0]);
        assert!(p.properties.is_default());
        assert_eq!(p.runs.len(), 1);
        assert_eq!(p.runs[0].properties.font_size, Some(24));
        assert_eq!(p.runs[0].text_content(), "test");
    }

    #[test]
    fn test_margin_is_not_inherited_by_sibling() {
        let root = HtmlNode::element("body")
            .with_child(
                HtmlNode::element("div")
                    .with_style("margin", "5px")
                    .with_child(HtmlNode::text("1")),
            )
            .with_child(HtmlNode::element("div").with_child(HtmlNode::text("2")));

        let body = convert(&root);
        assert_eq!(body.blocks.len(), 2);

        let first = paragraph(&body.blocks[0]);
        assert_eq!(first.properties.spacing_before, Some(100));
        assert_eq!(first.properties.spacing_after, Some(100));
        assert_eq!(first.properties.indent_left, Some(100));
        assert_eq!(first.properties.indent_right, Some(100));
        assert_eq!(first.runs[0].text_content(), "1");

        let second = paragraph(&body.blocks[1]);
        assert!(second.properties.is_default());
        assert_eq!(second.runs[0].text_content(), "2");
    }

    #[test]
    fn test_unresolvable_style_omits_property() {
        let div = HtmlNode::element("div")
            .with_style("font-size", "enormous")
            .with_style("margin", "wide")
            .with_child(HtmlNode::text("x"));

        let body = convert(&div);
        let p = paragraph(&body.blocks[0]);
        assert!(p.properties.is_default());
        assert_eq!(p.runs[0].properties.font_size, None);
    }

    #[test]
    fn test_inline_children_share_one_paragraph() {
        let div = HtmlNode::element("div")
            .with_child(HtmlNode::text("plain "))
            .with_child(HtmlNode::element("b").with_child(HtmlNode::text("bold")))
            .with_child(HtmlNode::text(" tail"));

        let body = convert(&div);
        assert_eq!(body.blocks.len(), 1);
        let p = paragraph(&body.blocks[0]);
        assert_eq!(p.runs.len(), 3);
        assert!(!p.runs[0].properties.bold);
        assert!(p.runs[1].properties.bold);
        assert!(!p.runs[2].properties.bold);
        assert_eq!(p.runs[2].text_content(), " tail");
    }

    #[test]
    fn test_explicit_weight_overrides_bold_tag_default() {
        let div = HtmlNode::element("div").with_child(
            HtmlNode::element("strong")
                .with_style("font-weight", "normal")
                .with_child(HtmlNode::text("not bold")),
        );

        let body = convert(&div);
        let p = paragraph(&body.blocks[0]);
        assert!(!p.runs[0].properties.bold);
    }

    #[test]
    fn test_block_child_forces_new_paragraph() {
        let div = HtmlNode::element("div")
            .with_child(HtmlNode::text("before"))
            .with_child(HtmlNode::element("p").with_child(HtmlNode::text("inner")))
            .with_child(HtmlNode::text("after"));

        let body = convert(&div);
        assert_eq!(body.blocks.len(), 3);
        assert_eq!(paragraph(&body.blocks[0]).runs[0].text_content(), "before");
        assert_eq!(paragraph(&body.blocks[1]).runs[0].text_content(), "inner");
        assert_eq!(paragraph(&body.blocks[2]).runs[0].text_content(), "after");
    }

    #[test]
    fn test_unknown_tag_falls_back_to_inline_content() {
        let div = HtmlNode::element("div").with_child(
            HtmlNode::element("widget").with_child(HtmlNode::text("content")),
        );

        let body = convert(&div);
        assert_eq!(body.blocks.len(), 1);
        assert_eq!(paragraph(&body.blocks[0]).runs[0].text_content(), "content");
    }

    #[test]
    fn test_whitespace_only_text_is_dropped() {
        let div = HtmlNode::element("div")
            .with_child(HtmlNode::text("  \n  "))
            .with_child(HtmlNode::element("span").with_child(HtmlNode::text("\t")));

        let body = convert(&div);
        assert!(body.blocks.is_empty(), "no paragraph for pure whitespace");
    }

    #[test]
    fn test_empty_block_produces_no_paragraph() {
        let body = convert(&HtmlNode::element("div"));
        assert!(body.blocks.is_empty());
    }

    #[test]
    fn test_br_inserts_line_break_run() {
        let div = HtmlNode::element("div")
            .with_child(HtmlNode::text("a"))
            .with_child(HtmlNode::element("br"))
            .with_child(HtmlNode::text("b"));

        let body = convert(&div);
        let p = paragraph(&body.blocks[0]);
        assert_eq!(p.runs.len(), 3);
        assert_eq!(p.runs[1].content, RunContent::LineBreak);
    }

    #[test]
    fn test_heading_defaults_yield_bold_sized_runs() {
        let h1 = HtmlNode::element("h1").with_child(HtmlNode::text("title"));
        let body = convert(&h1);
        let p = paragraph(&body.blocks[0]);
        assert!(p.runs[0].properties.bold);
        assert_eq!(p.runs[0].properties.font_size, Some(48));
    }

    #[test]
    fn test_heading_declared_size_beats_default() {
        let h1 = HtmlNode::element("h1")
            .with_style("font-size", "10pt")
            .with_child(HtmlNode::text("title"));
        let body = convert(&h1);
        let p = paragraph(&body.blocks[0]);
        assert_eq!(p.runs[0].properties.font_size, Some(20));
    }

    #[test]
    fn test_font_size_inherited_through_inline_span() {
        let div = HtmlNode::element("div")
            .with_style("font-size", "14pt")
            .with_child(HtmlNode::element("span").with_child(HtmlNode::text("x")));

        let body = convert(&div);
        let p = paragraph(&body.blocks[0]);
        assert_eq!(p.runs[0].properties.font_size, Some(28));
    }

    #[test]
    fn test_relative_size_resolves_against_document_base() {
        // Relative values do not chain off ancestor computed sizes: the
        // child's own declaration replaces the parent's in the effective
        // map and resolves against the document base of 24 half-points
        let div = HtmlNode::element("div")
            .with_style("font-size", "20pt")
            .with_child(
                HtmlNode::element("span")
                    .with_style("font-size", "50%")
                    .with_child(HtmlNode::text("x")),
            );

        let body = convert(&div);
        let p = paragraph(&body.blocks[0]);
        assert_eq!(p.runs[0].properties.font_size, Some(12));
    }

    #[test]
    fn test_text_align_maps_to_justification() {
        let div = HtmlNode::element("div")
            .with_style("text-align", "center")
            .with_child(HtmlNode::text("x"));

        let body = convert(&div);
        let p = paragraph(&body.blocks[0]);
        assert_eq!(
            p.properties.justification,
            Some(crate::style::Justification::Center)
        );
    }

    #[test]
    fn test_margin_shorthand_two_values() {
        let div = HtmlNode::element("div")
            .with_style("margin", "10px 20px")
            .with_child(HtmlNode::text("x"));

        let body = convert(&div);
        let p = paragraph(&body.blocks[0]);
        assert_eq!(p.properties.spacing_before, Some(200));
        assert_eq!(p.properties.spacing_after, Some(200));
        assert_eq!(p.properties.indent_left, Some(400));
        assert_eq!(p.properties.indent_right, Some(400));
    }

    #[test]
    fn test_margin_shorthand_three_values() {
        // top, horizontal, bottom
        let div = HtmlNode::element("div")
            .with_style("margin", "1px 2px 3px")
            .with_child(HtmlNode::text("x"));

        let body = convert(&div);
        let p = paragraph(&body.blocks[0]);
        assert_eq!(p.properties.spacing_before, Some(20));
        assert_eq!(p.properties.spacing_after, Some(60));
        assert_eq!(p.properties.indent_left, Some(40));
        assert_eq!(p.properties.indent_right, Some(40));
    }

    #[test]
    fn test_margin_longhand_overrides_shorthand() {
        let div = HtmlNode::element("div")
            .with_style("margin", "5px")
            .with_style("margin-left", "10pt")
            .with_child(HtmlNode::text("x"));

        let body = convert(&div);
        let p = paragraph(&body.blocks[0]);
        assert_eq!(p.properties.indent_left, Some(200));
        assert_eq!(p.properties.indent_right, Some(100));
    }

    #[test]
    fn test_script_content_is_dropped() {
        let div = HtmlNode::element("div")
            .with_child(HtmlNode::element("script").with_child(HtmlNode::text("alert(1)")))
            .with_child(HtmlNode::text("visible"));

        let body = convert(&div);
        let p = paragraph(&body.blocks[0]);
        assert_eq!(p.runs.len(), 1);
        assert_eq!(p.runs[0].text_content(), "visible");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a  b\n\tc"), "a b c");
        assert_eq!(collapse_whitespace(" x "), " x ");
        assert_eq!(collapse_whitespace("plain"), "plain");
    }
}
