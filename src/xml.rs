//! WordprocessingML serialization of the output element tree
//!
//! Renders a populated [`Body`] as a `<w:body>` fragment. Packaging the
//! fragment into a full OPC document (content types, parts, relationships)
//! is the responsibility of the downstream package layer; this module only
//! gives the element tree a concrete, inspectable wire form.
//!
//! Property containers (`w:pPr`, `w:rPr`, `w:tcPr`) are emitted only when a
//! property is actually set, and always as the first child of their parent,
//! as the schema requires.

use crate::document::{
    BlockElement, Body, Paragraph, Run, RunContent, Table, TableCell, VerticalMerge,
};
use crate::style::Justification;

/// Render the body container as a WordprocessingML fragment
pub fn body_to_xml(body: &Body) -> String {
    let mut out = String::with_capacity(256);
    out.push_str("<w:body>");
    write_blocks(&mut out, &body.blocks);
    out.push_str("</w:body>");
    out
}

fn write_blocks(out: &mut String, blocks: &[BlockElement]) {
    for block in blocks {
        match block {
            BlockElement::Paragraph(paragraph) => write_paragraph(out, paragraph),
            BlockElement::Table(table) => write_table(out, table),
        }
    }
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph) {
    out.push_str("<w:p>");

    let props = &paragraph.properties;
    if !props.is_default() {
        out.push_str("<w:pPr>");
        if props.spacing_before.is_some() || props.spacing_after.is_some() {
            out.push_str("<w:spacing");
            if let Some(before) = props.spacing_before {
                out.push_str(&format!(" w:before=\"{}\"", before));
            }
            if let Some(after) = props.spacing_after {
                out.push_str(&format!(" w:after=\"{}\"", after));
            }
            out.push_str("/>");
        }
        if props.indent_left.is_some() || props.indent_right.is_some() {
            out.push_str("<w:ind");
            if let Some(left) = props.indent_left {
                out.push_str(&format!(" w:left=\"{}\"", left));
            }
            if let Some(right) = props.indent_right {
                out.push_str(&format!(" w:right=\"{}\"", right));
            }
            out.push_str("/>");
        }
        if let Some(justification) = props.justification {
            let val = match justification {
                Justification::Left => "left",
                Justification::Center => "center",
                Justification::Right => "right",
                Justification::Both => "both",
            };
            out.push_str(&format!("<w:jc w:val=\"{}\"/>", val));
        }
        out.push_str("</w:pPr>");
    }

    for run in &paragraph.runs {
        write_run(out, run);
    }

    out.push_str("</w:p>");
}

fn write_run(out: &mut String, run: &Run) {
    out.push_str("<w:r>");

    let props = &run.properties;
    if !props.is_default() {
        out.push_str("<w:rPr>");
        if props.bold {
            out.push_str("<w:b/>");
        }
        if props.italic {
            out.push_str("<w:i/>");
        }
        if props.underline {
            out.push_str("<w:u w:val=\"single\"/>");
        }
        if let Some(size) = props.font_size {
            out.push_str(&format!("<w:sz w:val=\"{}\"/>", size));
        }
        out.push_str("</w:rPr>");
    }

    match &run.content {
        RunContent::Text(text) => {
            out.push_str("<w:t xml:space=\"preserve\">");
            out.push_str(&escape_text(text));
            out.push_str("</w:t>");
        }
        RunContent::LineBreak => out.push_str("<w:br/>"),
    }

    out.push_str("</w:r>");
}

fn write_table(out: &mut String, table: &Table) {
    out.push_str("<w:tbl>");

    let props = &table.properties;
    if props.border_size.is_some() || props.width.is_some() {
        out.push_str("<w:tblPr>");
        if let Some(width) = props.width {
            out.push_str(&format!("<w:tblW w:w=\"{}\" w:type=\"dxa\"/>", width));
        }
        if let Some(size) = props.border_size {
            out.push_str("<w:tblBorders>");
            for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
                out.push_str(&format!(
                    "<w:{} w:val=\"single\" w:sz=\"{}\" w:space=\"0\"/>",
                    edge, size
                ));
            }
            out.push_str("</w:tblBorders>");
        }
        out.push_str("</w:tblPr>");
    }

    for row in &table.rows {
        out.push_str("<w:tr>");
        for cell in &row.cells {
            write_cell(out, cell);
        }
        out.push_str("</w:tr>");
    }

    out.push_str("</w:tbl>");
}

fn write_cell(out: &mut String, cell: &TableCell) {
    out.push_str("<w:tc>");

    let props = &cell.properties;
    if *props != Default::default() {
        out.push_str("<w:tcPr>");
        if let Some(width) = props.width {
            out.push_str(&format!("<w:tcW w:w=\"{}\" w:type=\"dxa\"/>", width));
        }
        if let Some(span) = props.grid_span {
            out.push_str(&format!("<w:gridSpan w:val=\"{}\"/>", span));
        }
        match props.vertical_merge {
            Some(VerticalMerge::Restart) => out.push_str("<w:vMerge w:val=\"restart\"/>"),
            Some(VerticalMerge::Continue) => out.push_str("<w:vMerge/>"),
            None => {}
        }
        out.push_str("</w:tcPr>");
    }

    write_blocks(out, &cell.blocks);
    out.push_str("</w:tc>");
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
