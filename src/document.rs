//! Output element model and document context
//!
//! The conversion engine produces a typed WordprocessingML element tree
//! rooted at [`Body`]: paragraphs own runs, runs own a text leaf or a line
//! break, tables own rows, rows own cells, and cells own block content
//! (at least one paragraph, always - empty cells are schema-invalid).
//!
//! [`WordDocument`] is the single entry point. It owns the body container,
//! drives parsing and conversion, and hands the populated tree to whatever
//! packaging layer sits downstream. The engine never mutates output that has
//! already been appended to a parent.
//!
//! # Example
//!
//! ```rust
//! use wordml_converter::document::{BlockElement, WordDocument};
//!
//! let mut doc = WordDocument::new();
//! doc.process(b"<div style='font-size:100%'>test</div>").unwrap();
//!
//! assert_eq!(doc.body().blocks.len(), 1);
//! let BlockElement::Paragraph(paragraph) = &doc.body().blocks[0] else {
//!     panic!("expected a paragraph");
//! };
//! assert_eq!(paragraph.runs[0].properties.font_size, Some(24));
//! ```

use crate::converter::WordMlConverter;
use crate::error::ConversionError;
use crate::parser;
use crate::style::Justification;
use crate::xml;

/// Block-level output content: the children of a body or a table cell
#[derive(Debug, Clone, PartialEq)]
pub enum BlockElement {
    Paragraph(Paragraph),
    Table(Table),
}

/// Root body container holding the document's visible content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub blocks: Vec<BlockElement>,
}

/// Paragraph-level formatting, all optional
///
/// Spacing and indentation are in twentieths of a point. An unset field means
/// the property is omitted from the output entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphProperties {
    pub spacing_before: Option<u32>,
    pub spacing_after: Option<u32>,
    pub indent_left: Option<u32>,
    pub indent_right: Option<u32>,
    pub justification: Option<Justification>,
}

impl ParagraphProperties {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// A paragraph owning an ordered sequence of runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub properties: ParagraphProperties,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(properties: ParagraphProperties) -> Self {
        Self {
            properties,
            runs: Vec::new(),
        }
    }
}

/// Run-level formatting, all optional
///
/// Font size is in half-points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProperties {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub font_size: Option<u32>,
}

impl RunProperties {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Leaf content of a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    Text(String),
    LineBreak,
}

/// A formatted run: properties plus one content leaf
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub properties: RunProperties,
    pub content: RunContent,
}

impl Run {
    pub fn text(content: &str, properties: RunProperties) -> Self {
        Self {
            properties,
            content: RunContent::Text(content.to_string()),
        }
    }

    pub fn line_break() -> Self {
        Self {
            properties: RunProperties::default(),
            content: RunContent::LineBreak,
        }
    }

    /// The text payload, empty for line breaks
    pub fn text_content(&self) -> &str {
        match &self.content {
            RunContent::Text(text) => text,
            RunContent::LineBreak => "",
        }
    }
}

/// Table-level formatting
///
/// `border_size` is in eighths of a point and applies to all edges and inside
/// borders when set. `width` is in twentieths of a point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableProperties {
    pub border_size: Option<u32>,
    pub width: Option<u32>,
}

/// Vertical merge marker on a cell
///
/// The origin cell of a row-span carries `Restart`; each continuation cell in
/// the rows below carries `Continue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalMerge {
    Restart,
    Continue,
}

/// Cell-level formatting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCellProperties {
    /// Preferred cell width in twentieths of a point
    pub width: Option<u32>,
    /// Number of grid columns this cell spans (col-span > 1)
    pub grid_span: Option<u32>,
    pub vertical_merge: Option<VerticalMerge>,
}

/// A table cell owning block content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    pub properties: TableCellProperties,
    pub blocks: Vec<BlockElement>,
}

impl TableCell {
    /// Whether the cell already owns at least one paragraph
    pub fn has_paragraph(&self) -> bool {
        self.blocks
            .iter()
            .any(|block| matches!(block, BlockElement::Paragraph(_)))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub properties: TableProperties,
    pub rows: Vec<TableRow>,
}

/// Document context: owns the body container and drives conversion
///
/// A single instance is reusable across documents but not safe for concurrent
/// `process` calls, since every call appends into the same body container.
#[derive(Debug, Default)]
pub struct WordDocument {
    body: Body,
    converter: WordMlConverter,
}

impl WordDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document driven by a converter with non-default options
    pub fn with_converter(converter: WordMlConverter) -> Self {
        Self {
            body: Body::default(),
            converter,
        }
    }

    /// Convert raw HTML into the body container
    ///
    /// Parses the input, locates the `<body>` subtree (or the first element
    /// when no body exists), and appends the converted content. Fails without
    /// producing partial output when the input cannot be parsed at all.
    ///
    /// # Errors
    ///
    /// - `ConversionError::InvalidInput` for empty input
    /// - `ConversionError::EncodingError` when the detected charset cannot
    ///   decode the bytes
    pub fn process(&mut self, html: &[u8]) -> Result<(), ConversionError> {
        self.process_with_content_type(html, None)
    }

    /// Convert raw HTML, using a Content-Type value for charset detection
    pub fn process_with_content_type(
        &mut self,
        html: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), ConversionError> {
        let root = parser::parse_html_with_charset(html, content_type)?;

        if let Some(node) = parser::find_body_or_first_element(&root) {
            self.converter.convert(node, &mut self.body)?;
        }

        Ok(())
    }

    /// The populated body container, for the downstream package layer
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Render the body as a WordprocessingML fragment
    pub fn to_xml(&self) -> String {
        xml::body_to_xml(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_rejected() {
        let mut doc = WordDocument::new();
        let result = doc.process(b"");
        assert!(matches!(result, Err(ConversionError::InvalidInput(_))));
        assert!(doc.body().blocks.is_empty(), "no partial output");
    }

    #[test]
    fn test_cell_paragraph_detection() {
        let mut cell = TableCell::default();
        assert!(!cell.has_paragraph());
        cell.blocks.push(BlockElement::Table(Table::default()));
        assert!(!cell.has_paragraph());
        cell.blocks.push(BlockElement::Paragraph(Paragraph::new()));
        assert!(cell.has_paragraph());
    }

    #[test]
    fn test_default_properties_are_recognized() {
        assert!(ParagraphProperties::default().is_default());
        assert!(RunProperties::default().is_default());

        let sized = RunProperties {
            font_size: Some(24),
            ..Default::default()
        };
        assert!(!sized.is_default());
    }

    #[test]
    fn test_process_appends_across_calls() {
        let mut doc = WordDocument::new();
        doc.process(b"<div>1</div>").unwrap();
        doc.process(b"<div>2</div>").unwrap();
        assert_eq!(doc.body().blocks.len(), 2);
    }
}
