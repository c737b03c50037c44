//! HTML5 parsing and lowering into the engine's node model
//!
//! Parsing itself is delegated to Mozilla's html5ever, which implements the
//! WHATWG HTML5 algorithm and therefore handles malformed markup the same way
//! browsers do. The resulting RcDom is then lowered into the owned
//! [`HtmlNode`] tree the conversion engine consumes, with each node's inline
//! `style` attribute parsed into a property-value map. No selector matching
//! or cascade resolution happens here; only declared inline styles are kept.
//!
//! # Examples
//!
//! ```rust
//! use wordml_converter::parser::{find_body_or_first_element, parse_html};
//!
//! let root = parse_html(b"<html><body><div>Hello</div></body></html>").unwrap();
//! let body = find_body_or_first_element(&root).unwrap();
//! assert!(body.tag_is("body"));
//!
//! // Malformed markup is recovered, not rejected
//! let root = parse_html(b"<div><p>unclosed").unwrap();
//! assert!(find_body_or_first_element(&root).is_some());
//! ```

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::borrow::Cow;

use crate::charset::detect_charset;
use crate::dom::HtmlNode;
use crate::error::ConversionError;

/// Tag used for the synthetic root of a lowered tree
const DOCUMENT_TAG: &str = "#document";

/// Parse HTML bytes into a lowered node tree
///
/// Convenience wrapper around [`parse_html_with_charset`] with no
/// Content-Type value; charset detection falls back to HTML meta tags and
/// then UTF-8.
///
/// # Errors
///
/// - `ConversionError::InvalidInput` for empty input
/// - `ConversionError::EncodingError` for undecodable bytes or an
///   unsupported charset
pub fn parse_html(html: &[u8]) -> Result<HtmlNode, ConversionError> {
    parse_html_with_charset(html, None)
}

/// Parse HTML bytes with charset detection from an optional Content-Type
///
/// The charset cascade checks the Content-Type parameter first, then HTML
/// meta tags, then defaults to UTF-8. Non-UTF-8 input is transcoded before
/// html5ever sees it, since the parser sink expects UTF-8.
pub fn parse_html_with_charset(
    html: &[u8],
    content_type: Option<&str>,
) -> Result<HtmlNode, ConversionError> {
    if html.is_empty() {
        return Err(ConversionError::InvalidInput(
            "HTML input is empty".to_string(),
        ));
    }

    let detected_charset = detect_charset(content_type, html);
    let utf8_str = decode_to_utf8(html, &detected_charset)?;

    let dom = parse_document(RcDom::default(), Default::default()).one(utf8_str.as_ref());

    Ok(lower_document(&dom))
}

fn decode_to_utf8<'a>(html: &'a [u8], charset: &str) -> Result<Cow<'a, str>, ConversionError> {
    if charset.eq_ignore_ascii_case("UTF-8") {
        return std::str::from_utf8(html).map(Cow::Borrowed).map_err(|e| {
            ConversionError::EncodingError(format!(
                "Invalid UTF-8 at byte position {}: {}",
                e.valid_up_to(),
                e
            ))
        });
    }

    let encoding = encoding_rs::Encoding::for_label(charset.as_bytes()).ok_or_else(|| {
        ConversionError::EncodingError(format!("Unsupported charset '{}'", charset))
    })?;

    encoding
        .decode_without_bom_handling_and_without_replacement(html)
        .ok_or_else(|| {
            ConversionError::EncodingError(format!(
                "Invalid byte sequence for charset '{}'",
                charset
            ))
        })
}

/// Lower the RcDom document node into the owned node model
fn lower_document(dom: &RcDom) -> HtmlNode {
    let mut root = HtmlNode::element(DOCUMENT_TAG);
    lower_children(&dom.document, &mut root);
    root
}

fn lower_children(handle: &Handle, parent: &mut HtmlNode) {
    for child in handle.children.borrow().iter() {
        if let Some(node) = lower_node(child) {
            parent.push_child(node);
        }
    }
}

/// Lower a single RcDom node, dropping comments, doctypes, and processing
/// instructions that carry no document content
fn lower_node(handle: &Handle) -> Option<HtmlNode> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let mut node = HtmlNode::element(name.local.as_ref());
            for attr in attrs.borrow().iter() {
                node.set_attribute(attr.name.local.as_ref(), &attr.value);
            }
            if let Some(style) = node.attribute("style").map(str::to_string) {
                for (property, value) in parse_inline_style(&style) {
                    node.set_style(&property, &value);
                }
            }
            lower_children(handle, &mut node);
            Some(node)
        }
        NodeData::Text { contents } => Some(HtmlNode::text(&contents.borrow())),
        _ => None,
    }
}

/// Parse an inline `style` attribute into (property, value) declarations
///
/// Declarations are separated by `;`, property and value by the first `:`.
/// Property names are lowercased; values keep their declared form. Malformed
/// declarations are dropped.
pub fn parse_inline_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if property.is_empty() || value.is_empty() {
                None
            } else {
                Some((property, value))
            }
        })
        .collect()
}

/// Locate the `<body>` subtree, or the first element when no body exists
///
/// Mirrors the entry contract of the engine: conversion starts at the body
/// when the input is a full document and at the first meaningful element for
/// fragments.
pub fn find_body_or_first_element(root: &HtmlNode) -> Option<&HtmlNode> {
    if let Some(body) = find_tag(root, "body") {
        return Some(body);
    }
    first_element(root)
}

fn find_tag<'a>(node: &'a HtmlNode, tag: &str) -> Option<&'a HtmlNode> {
    if node.tag_is(tag) {
        return Some(node);
    }
    node.children()
        .iter()
        .find_map(|child| find_tag(child, tag))
}

fn first_element(node: &HtmlNode) -> Option<&HtmlNode> {
    for child in node.children() {
        if !child.is_text() && !child.tag_is("html") && !child.tag_is("head") {
            return Some(child);
        }
        if let Some(element) = first_element(child) {
            return Some(element);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_simple_document() {
        let root = parse_html(b"<html><body><h1>Hello</h1></body></html>").unwrap();
        let body = find_body_or_first_element(&root).unwrap();
        assert!(body.tag_is("body"));
        assert!(body.has_children());
    }

    #[test]
    fn test_parse_empty_input() {
        let result = parse_html(b"");
        assert!(matches!(result, Err(ConversionError::InvalidInput(_))));
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let result = parse_html(b"\xFF\xFE<html></html>");
        assert!(matches!(result, Err(ConversionError::EncodingError(_))));
    }

    #[test]
    fn test_parse_transcodes_iso_8859_1() {
        // "Café" with ISO-8859-1 encoded e-acute (invalid UTF-8)
        let html = b"<html><body><p>Caf\xE9</p></body></html>";
        let root =
            parse_html_with_charset(html, Some("text/html; charset=ISO-8859-1")).unwrap();
        let body = find_body_or_first_element(&root).unwrap();
        let p = &body.children()[0];
        assert_eq!(p.children()[0].text_content(), "Café");
    }

    #[test]
    fn test_unknown_charset_is_an_encoding_error() {
        let result = parse_html_with_charset(
            b"<p>x</p>",
            Some("text/html; charset=x-unknown-test"),
        );
        assert!(matches!(result, Err(ConversionError::EncodingError(_))));
    }

    #[test]
    fn test_inline_styles_are_lowered_into_the_map() {
        let root =
            parse_html(b"<div style='FONT-SIZE: 12pt; margin:5px'>x</div>").unwrap();
        let body = find_body_or_first_element(&root).unwrap();
        let div = &body.children()[0];
        assert!(div.tag_is("div"));
        assert_eq!(div.style_value("font-size").as_deref(), Some("12pt"));
        assert_eq!(div.style_value("margin").as_deref(), Some("5px"));
    }

    #[test]
    fn test_fragment_finds_body_inserted_by_html5ever() {
        // html5ever wraps fragments in html/body
        let root = parse_html(b"<div>content</div>").unwrap();
        let entry = find_body_or_first_element(&root).unwrap();
        assert!(entry.tag_is("body"));
        assert!(entry.children()[0].tag_is("div"));
    }

    #[test]
    fn test_comments_and_doctype_are_dropped() {
        let root =
            parse_html(b"<!DOCTYPE html><html><!-- note --><body><p>x</p></body></html>")
                .unwrap();
        let body = find_body_or_first_element(&root).unwrap();
        assert_eq!(body.children().len(), 1);
        assert!(body.children()[0].tag_is("p"));
    }

    #[test]
    fn test_parse_inline_style_declarations() {
        let declarations = parse_inline_style("font-size: 12pt; color:red;;broken; :x; y:");
        assert_eq!(
            declarations,
            vec![
                ("font-size".to_string(), "12pt".to_string()),
                ("color".to_string(), "red".to_string()),
            ]
        );
    }

    #[test]
    fn test_last_declaration_wins() {
        let root = parse_html(b"<div style='margin:5px;margin:10px'>x</div>").unwrap();
        let body = find_body_or_first_element(&root).unwrap();
        let div = &body.children()[0];
        assert_eq!(div.style_value("margin").as_deref(), Some("10px"));
    }

    proptest! {
        // The parser must never panic on malformed markup: html5ever
        // recovers per the HTML5 spec, and the lowering step has to cope
        // with whatever tree comes out.
        #[test]
        fn prop_malformed_html_no_crash(
            tag in prop::sample::select(vec!["div", "p", "span", "table", "tr", "td"]),
            content in "[a-zA-Z0-9 ]{0,80}",
            close_tag in prop::bool::ANY,
        ) {
            let mut html = format!("<{}>{}", tag, content);
            if close_tag {
                html.push_str(&format!("</{}>", tag));
            }

            match parse_html(html.as_bytes()) {
                Ok(_) => {}
                Err(ConversionError::InvalidInput(_)) => {}
                Err(ConversionError::EncodingError(_)) => {}
                Err(e) => panic!("unexpected error for malformed HTML: {:?}", e),
            }
        }

        #[test]
        fn prop_inline_style_parsing_is_total(style in ".*") {
            for (property, value) in parse_inline_style(&style) {
                prop_assert!(!property.is_empty());
                prop_assert!(!value.is_empty());
            }
        }
    }
}
