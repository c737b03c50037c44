//! Table grid builder - reconciles row/col spans into a rectangular grid
//!
//! HTML lets authors declare `rowspan` and `colspan` freely; WordprocessingML
//! wants an explicit rectangular grid where a vertically merged cell appears
//! in *every* row it covers, marked as a continuation. This module walks one
//! `<table>` subtree and performs that reconciliation.
//!
//! # Row-span bookkeeping
//!
//! [`TableGridState`] is the only cross-row state: a map from column index to
//! the remaining row-span count, plus the origin node whose styling each
//! continuation cell replicates. Before any real cell is placed, the pending
//! spans at the current column are flushed as continuation cells; after the
//! row's explicit cells are exhausted, a trailing flush covers columns the
//! row never reached. Every active count therefore decreases by exactly one
//! per row and is dropped at zero.
//!
//! The state lives inside a single [`TableBuilder::build`] call and is never
//! shared beyond it, so a nested table simply gets its own state.
//!
//! # Header cells
//!
//! A `<th>` marks that cell (and only that cell) as a header: each direct
//! child gets `font-weight: bold` injected into its style map unless it
//! already declares a font-weight. This is the engine's one mutation of
//! input data.

use std::collections::HashMap;

use crate::converter::{ParagraphCursor, WordMlConverter, merge_styles};
use crate::document::{
    BlockElement, Paragraph, Run, RunProperties, Table, TableCell, TableCellProperties,
    TableProperties, TableRow, VerticalMerge,
};
use crate::dom::{HtmlNode, StyleMap};
use crate::error::ConversionError;
use crate::style;

/// Per-table bookkeeping for span reconciliation
#[derive(Debug)]
struct TableGridState<'n> {
    /// Current 0-based column index, reset at the start of each row
    col_index: usize,
    /// Column index to remaining row-span count (> 0 while active)
    pending_spans: HashMap<usize, u32>,
    /// Column index to the origin cell node of the active span
    span_origins: HashMap<usize, &'n HtmlNode>,
    /// Whether the cell being built originates from a `<th>`
    is_header_cell: bool,
}

impl<'n> TableGridState<'n> {
    fn new() -> Self {
        Self {
            col_index: 0,
            pending_spans: HashMap::new(),
            span_origins: HashMap::new(),
            is_header_cell: false,
        }
    }
}

/// Builds one table subtree, delegating cell content back to the dispatcher
pub(crate) struct TableBuilder<'c> {
    converter: &'c WordMlConverter,
}

impl<'c> TableBuilder<'c> {
    pub(crate) fn new(converter: &'c WordMlConverter) -> Self {
        Self { converter }
    }

    /// Convert a `<table>` subtree into a merge-annotated table
    ///
    /// Rows are collected from direct `<tr>` children and from `<thead>`,
    /// `<tbody>`, and `<tfoot>` sections (html5ever inserts `<tbody>` even
    /// when the author did not). Returns `Ok(None)` when the subtree yields
    /// no rows, so no empty table reaches the output.
    ///
    /// # Errors
    ///
    /// `ConversionError::StructuralError` when invoked on anything but a
    /// `<table>` node; appending row content outside a table would produce
    /// schema-invalid output downstream.
    pub(crate) fn build<'n>(
        &self,
        node: &'n HtmlNode,
        inherited: &StyleMap,
    ) -> Result<Option<Table>, ConversionError> {
        if !node.tag_is("table") {
            return Err(ConversionError::StructuralError(format!(
                "table builder invoked on <{}>",
                node.tag()
            )));
        }
        if !node.has_children() {
            return Ok(None);
        }

        let mut table = Table {
            properties: self.table_properties(node),
            rows: Vec::new(),
        };
        let mut state = TableGridState::new();

        for child in node.children() {
            if child.tag_is("tr") {
                self.build_row(child, &mut table, &mut state, inherited)?;
            } else if child.tag_is("thead") || child.tag_is("tbody") || child.tag_is("tfoot") {
                for row_node in child.children() {
                    if row_node.tag_is("tr") {
                        self.build_row(row_node, &mut table, &mut state, inherited)?;
                    }
                }
            }
        }

        if table.rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(table))
    }

    /// Convert one `<tr>`, interleaving continuation cells at occupied columns
    fn build_row<'n>(
        &self,
        tr: &'n HtmlNode,
        table: &mut Table,
        state: &mut TableGridState<'n>,
        inherited: &StyleMap,
    ) -> Result<(), ConversionError> {
        let mut row = TableRow::default();
        state.col_index = 0;

        for cell_node in tr.children() {
            let is_header = cell_node.tag_is("th");
            if is_header || cell_node.tag_is("td") {
                self.flush_pending_spans(state, &mut row);
                state.is_header_cell = is_header;
                let cell = self.build_cell(cell_node, state, inherited)?;
                row.cells.push(cell);
                state.col_index += 1;
            }
        }

        self.flush_trailing_spans(state, &mut row);

        // A row without children (or without any cell-producing child)
        // contributes nothing
        if !row.cells.is_empty() {
            table.rows.push(row);
        }
        Ok(())
    }

    /// Emit continuation cells while the current column has an active span
    ///
    /// Each emitted cell decrements the column's remaining count; the entry
    /// is removed when the count reaches zero, so it can never go negative.
    fn flush_pending_spans(&self, state: &mut TableGridState<'_>, row: &mut TableRow) {
        while let Some(&count) = state.pending_spans.get(&state.col_index) {
            let origin = state.span_origins[&state.col_index];
            row.cells.push(self.continuation_cell(origin));

            let remaining = count - 1;
            if remaining == 0 {
                state.pending_spans.remove(&state.col_index);
                state.span_origins.remove(&state.col_index);
            } else {
                state.pending_spans.insert(state.col_index, remaining);
            }
            state.col_index += 1;
        }
    }

    /// Flush spans extending past the row's last explicit cell
    ///
    /// Covers every remaining pending column in ascending order, including
    /// columns past a gap left by a short row, so each active span is
    /// decremented exactly once per row.
    fn flush_trailing_spans(&self, state: &mut TableGridState<'_>, row: &mut TableRow) {
        loop {
            let next = state
                .pending_spans
                .keys()
                .copied()
                .filter(|&col| col >= state.col_index)
                .min();
            match next {
                Some(col) => {
                    state.col_index = col;
                    self.flush_pending_spans(state, row);
                }
                None => break,
            }
        }
    }

    /// Convert one `<td>`/`<th>` into a cell at the current column
    fn build_cell<'n>(
        &self,
        node: &'n HtmlNode,
        state: &mut TableGridState<'n>,
        inherited: &StyleMap,
    ) -> Result<TableCell, ConversionError> {
        let mut properties = self.cell_properties(node);

        if let Some(span) = span_count(node, "rowspan") {
            properties.vertical_merge = Some(VerticalMerge::Restart);
            state.pending_spans.insert(state.col_index, span - 1);
            state.span_origins.insert(state.col_index, node);
        }

        if state.is_header_cell {
            for child in node.children() {
                child.set_style_if_absent("font-weight", "bold");
            }
        }

        let mut cell = TableCell {
            properties,
            blocks: Vec::new(),
        };

        let own = node.styles();
        let effective = merge_styles(inherited, &[], &own);
        let mut cursor = ParagraphCursor::new(self.converter.resolve_paragraph_properties(&own));
        for child in node.children() {
            self.converter
                .process_child(child, &mut cell.blocks, &mut cursor, &effective)?;
        }
        cursor.flush_into(&mut cell.blocks);

        // Cell must contain at least one paragraph, even when the source
        // cell is empty
        if !cell.has_paragraph() {
            cell.blocks.push(BlockElement::Paragraph(Paragraph::new()));
        }

        Ok(cell)
    }

    /// An empty cell marking that the cell above spans into this row
    fn continuation_cell(&self, origin: &HtmlNode) -> TableCell {
        let mut properties = self.cell_properties(origin);
        properties.vertical_merge = Some(VerticalMerge::Continue);

        let mut paragraph = Paragraph::new();
        paragraph.runs.push(Run::text("", RunProperties::default()));

        TableCell {
            properties,
            blocks: vec![BlockElement::Paragraph(paragraph)],
        }
    }

    /// Cell formatting from the node's attributes and inline styles
    fn cell_properties(&self, node: &HtmlNode) -> TableCellProperties {
        let mut properties = TableCellProperties::default();

        if let Some(span) = span_count(node, "colspan") {
            properties.grid_span = Some(span);
        }

        if let Some(width) = resolve_width(node) {
            properties.width = Some(width);
        }

        properties
    }

    /// Table formatting from the `<table>` node itself
    fn table_properties(&self, node: &HtmlNode) -> TableProperties {
        let mut properties = TableProperties::default();

        // The HTML border attribute is in pixels; border sizes in the output
        // are eighths of a point, at the engine's 1px = 1pt ratio
        if let Some(value) = node.attribute("border")
            && let Ok(border) = value.trim().parse::<u32>()
            && border > 0
        {
            // Overflowing sizes are unrepresentable; omit the border like
            // any other unresolvable value
            properties.border_size = border.checked_mul(8);
        }

        if let Some(width) = resolve_width(node) {
            properties.width = Some(width);
        }

        properties
    }
}

/// Parse a span attribute; anything malformed or below 2 means "no span"
fn span_count(node: &HtmlNode, attribute: &str) -> Option<u32> {
    let value = node.attribute(attribute)?;
    match value.trim().parse::<u32>() {
        Ok(span) if span >= 2 => Some(span),
        _ => None,
    }
}

/// Resolve a width from the `width` style or attribute to twips
///
/// The attribute form is unitless pixels, the style form carries CSS units.
/// Zero or unresolvable widths are treated as absent.
fn resolve_width(node: &HtmlNode) -> Option<u32> {
    let raw = node
        .style_value("width")
        .or_else(|| node.attribute("width").map(str::to_string))?;
    let width = style::length_in_twips(&raw, 0)
        .or_else(|| style::length_in_twips(&format!("{}px", raw.trim()), 0))?;
    if width > 0 { Some(width) } else { None }
}
