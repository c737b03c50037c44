//! Style value resolver - textual CSS values to document-format units
//!
//! WordprocessingML measures font sizes in half-points (1pt = 2 half-points)
//! and spacing/indentation in twentieths of a point (1pt = 20 units, "twips").
//! This module converts the raw string values found in inline style maps into
//! those units.
//!
//! # Resolution rules
//!
//! - Percentages scale the supplied base value: `150%` of 24 half-points is 36
//! - `em` values multiply the base value: `2em` of 24 half-points is 48
//! - Named keywords (`xx-small` through `xx-large`) map through a fixed table
//!   of absolute half-point sizes
//! - `pt` and `px` convert through fixed ratios; pixels are treated at the
//!   historical 1px = 1pt ratio, so `5px` is 100 twips
//!
//! Anything malformed, negative, or unrecognized resolves to `None`. Callers
//! must leave the corresponding formatting property unset in that case; a
//! sentinel zero would produce schema-invalid output (a zero font size, for
//! example), whereas an omitted property merely falls back to document
//! defaults.
//!
//! All functions here are pure and free of shared state.
//!
//! # Examples
//!
//! ```rust
//! use wordml_converter::style::{font_size_in_half_points, length_in_twips};
//!
//! assert_eq!(font_size_in_half_points("100%", 24), Some(24));
//! assert_eq!(font_size_in_half_points("2em", 24), Some(48));
//! assert_eq!(font_size_in_half_points("xx-large", 24), Some(48));
//! assert_eq!(font_size_in_half_points("12pt", 24), Some(24));
//! assert_eq!(font_size_in_half_points("huge", 24), None);
//!
//! assert_eq!(length_in_twips("5px", 0), Some(100));
//! assert_eq!(length_in_twips("1pt", 0), Some(20));
//! ```

/// Default body font size in half-points (12pt)
pub const DEFAULT_FONT_SIZE: u32 = 24;

/// Half-points per point
const HALF_POINTS_PER_POINT: f64 = 2.0;

/// Twips per point
const TWIPS_PER_POINT: f64 = 20.0;

/// Absolute keyword sizes in half-points, derived from the CSS scaling
/// factors applied to the 24 half-point body default
const KEYWORD_SIZES: [(&str, u32); 7] = [
    ("xx-small", 14),
    ("x-small", 18),
    ("small", 21),
    ("medium", 24),
    ("large", 29),
    ("x-large", 36),
    ("xx-large", 48),
];

/// Paragraph justification values recognized by the output model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justification {
    Left,
    Center,
    Right,
    /// Fully justified (`text-align: justify`)
    Both,
}

/// Resolve a CSS font-size value to half-points
///
/// `base` is the size the value scales against for relative units
/// (percentages and `em`). Keywords resolve independently of the base.
/// Returns `None` for values that cannot be resolved.
pub fn font_size_in_half_points(raw: &str, base: u32) -> Option<u32> {
    let value = raw.trim().to_ascii_lowercase();

    for (keyword, half_points) in KEYWORD_SIZES {
        if value == keyword {
            return Some(half_points);
        }
    }

    scale_value(&value, base, HALF_POINTS_PER_POINT)
}

/// Resolve a CSS length value to twentieths of a point
///
/// `base` is the reference length for percentages and `em` values. Returns
/// `None` for values that cannot be resolved; size keywords are not lengths
/// and resolve to `None` here.
pub fn length_in_twips(raw: &str, base: u32) -> Option<u32> {
    let value = raw.trim().to_ascii_lowercase();
    scale_value(&value, base, TWIPS_PER_POINT)
}

/// Shared unit arithmetic for both target unit systems
///
/// `per_point` is the number of target units in one point (2 for half-points,
/// 20 for twips).
fn scale_value(value: &str, base: u32, per_point: f64) -> Option<u32> {
    if let Some(number) = value.strip_suffix('%') {
        let percent = parse_non_negative(number)?;
        return to_unit(f64::from(base) * percent / 100.0);
    }

    if let Some(number) = value.strip_suffix("em") {
        let factor = parse_non_negative(number)?;
        return to_unit(f64::from(base) * factor);
    }

    if let Some(number) = value.strip_suffix("pt") {
        let points = parse_non_negative(number)?;
        return to_unit(points * per_point);
    }

    // Pixels convert at the 1px = 1pt ratio used by the output format
    if let Some(number) = value.strip_suffix("px") {
        let pixels = parse_non_negative(number)?;
        return to_unit(pixels * per_point);
    }

    None
}

fn parse_non_negative(text: &str) -> Option<f64> {
    let number: f64 = text.trim().parse().ok()?;
    if number.is_finite() && number >= 0.0 {
        Some(number)
    } else {
        None
    }
}

fn to_unit(value: f64) -> Option<u32> {
    let rounded = value.round();
    if rounded >= 0.0 && rounded <= f64::from(u32::MAX) {
        Some(rounded as u32)
    } else {
        None
    }
}

/// Whether a CSS font-weight value means bold
///
/// Accepts the `bold`/`bolder` keywords and numeric weights of 600 or more.
pub fn is_bold_weight(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "bold" | "bolder" => true,
        _ => value.parse::<u32>().map(|w| w >= 600).unwrap_or(false),
    }
}

/// Whether a CSS font-style value means italic
pub fn is_italic_style(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    value == "italic" || value == "oblique"
}

/// Whether a CSS text-decoration value includes underline
pub fn has_underline(value: &str) -> bool {
    value
        .to_ascii_lowercase()
        .split_whitespace()
        .any(|token| token == "underline")
}

/// Map a CSS text-align value to a paragraph justification
pub fn justification_from_text_align(value: &str) -> Option<Justification> {
    match value.trim().to_ascii_lowercase().as_str() {
        "left" | "start" => Some(Justification::Left),
        "center" => Some(Justification::Center),
        "right" | "end" => Some(Justification::Right),
        "justify" => Some(Justification::Both),
        _ => None,
    }
}
