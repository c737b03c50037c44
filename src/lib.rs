//! WordML Converter - HTML to WordprocessingML conversion engine
//!
//! This library converts parsed HTML/CSS into a typed WordprocessingML
//! element tree: paragraphs, runs, formatting properties, and tables with
//! correct row-span/col-span merge semantics.
//!
//! # Architecture
//!
//! The library is structured into several modules:
//! - `parser`: HTML5 parsing using html5ever, lowered into the engine's node model
//! - `charset`: character encoding detection and handling
//! - `dom`: the element node model consumed by the engine
//! - `style`: CSS value resolution into half-points and twips
//! - `converter`: the block/inline dispatcher
//! - `table`: row/col-span grid reconciliation
//! - `document`: the output element model and `WordDocument` entry point
//! - `xml`: WordprocessingML serialization of the body
//!
//! # Usage
//!
//! ```rust
//! use wordml_converter::WordDocument;
//!
//! let mut doc = WordDocument::new();
//! doc.process(b"<div style='font-size:100%'>test</div>").unwrap();
//!
//! let xml = doc.to_xml();
//! assert!(xml.contains("<w:sz w:val=\"24\"/>"));
//! assert!(xml.contains("test"));
//! ```

// Module declarations
pub mod charset;
pub mod converter;
pub mod document;
pub mod dom;
pub mod error;
pub mod parser;
pub mod style;
mod table;
pub mod xml;

// Re-export main types for convenience
pub use converter::{ConversionOptions, WordMlConverter};
pub use document::WordDocument;
pub use dom::HtmlNode;
pub use error::ConversionError;
pub use parser::parse_html;
