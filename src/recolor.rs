//! Textual color substitution inside a vector document.
//!
//! The document is never parsed: every literal occurrence of a color token is
//! rewritten, wherever it appears (attributes, style blocks, comments). Three
//! encodings are recognised: lowercase hex, hex in any other case, and the
//! functional `rgb(r, g, b)` form with arbitrary whitespace.

use regex::{NoExpand, Regex};

use crate::color::{self, Rgb};
use crate::mapping::ColorMapping;

/// Encoding written in place of a matched `rgb(...)` token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RgbForm {
    /// `rgb(r, g, b)`
    Functional,
    /// `#rrggbb`
    Hex,
}

fn functional(color: Rgb) -> String {
    format!("rgb({}, {}, {})", color.red, color.green, color.blue)
}

fn apply_pair(doc: &str, old: Rgb, new: Rgb, form: RgbForm) -> String {
    let old_hex = color::to_hex(old);
    let new_hex = color::to_hex(new);

    let mut out = doc.replace(&old_hex, &new_hex);

    // Uppercase and mixed-case spellings; output is always lowercase.
    if let Ok(re) = Regex::new(&format!("(?i){old_hex}")) {
        out = re.replace_all(&out, NoExpand(&new_hex)).into_owned();
    }

    let pattern = format!(
        r"(?i)rgb\(\s*{}\s*,\s*{}\s*,\s*{}\s*\)",
        old.red, old.green, old.blue
    );
    if let Ok(re) = Regex::new(&pattern) {
        let replacement = match form {
            RgbForm::Functional => functional(new),
            RgbForm::Hex => new_hex,
        };
        out = re.replace_all(&out, NoExpand(&replacement)).into_owned();
    }
    out
}

/// Apply every changing pair of `mapping`, in mapping order, writing `rgb()` tokens back as `rgb()`.
pub fn recolor_document(doc: &str, mapping: &ColorMapping) -> String {
    recolor_with(doc, mapping, RgbForm::Functional)
}

/// Apply every changing pair of `mapping` with an explicit target encoding for `rgb()` tokens.
///
/// Pairs are applied one after another, so a color produced by an earlier pair
/// can be rewritten again by a later one.
pub fn recolor_with(doc: &str, mapping: &ColorMapping, form: RgbForm) -> String {
    let mut out = doc.to_string();
    if out.is_empty() {
        return out;
    }
    for (old, new) in mapping.changes() {
        out = apply_pair(&out, old, new, form);
    }
    out
}

/// Replace one color everywhere in `doc`, writing `rgb()` tokens as hex.
///
/// Unparseable colors or an empty document leave the text untouched.
pub fn replace_color(doc: &str, old_hex: &str, new_hex: &str) -> String {
    let (Ok(old), Ok(new)) = (color::from_hex(old_hex), color::from_hex(new_hex)) else {
        tracing::warn!(old = old_hex, new = new_hex, "skipping replacement of invalid color");
        return doc.to_string();
    };
    if doc.is_empty() || old == new {
        return doc.to_string();
    }
    apply_pair(doc, old, new, RgbForm::Hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;
    use pretty_assertions::assert_eq;

    const RED: Rgb = Srgb::new(255, 0, 0);
    const BLUE: Rgb = Srgb::new(0, 0, 255);

    fn single(old: Rgb, new: Rgb) -> ColorMapping {
        [(old, new)].into_iter().collect()
    }

    #[test]
    fn rewrites_all_three_encodings() {
        let doc = r##"<rect fill="#ff0000"/><rect fill="#FF0000"/><rect fill="rgb(255, 0, 0)"/>"##;
        let out = replace_color(doc, "#ff0000", "#0000ff");
        assert_eq!(
            out,
            r##"<rect fill="#0000ff"/><rect fill="#0000ff"/><rect fill="#0000ff"/>"##
        );
    }

    #[test]
    fn mapping_keeps_functional_form() {
        let doc = r##"<g style="fill:rgb(255,0,0);stroke:RGB( 255 , 0 , 0 )"/>"##;
        let out = recolor_document(doc, &single(RED, BLUE));
        assert_eq!(
            out,
            r##"<g style="fill:rgb(0, 0, 255);stroke:rgb(0, 0, 255)"/>"##
        );
    }

    #[test]
    fn mixed_case_hex_is_normalised() {
        let out = replace_color(r##"<a fill="#fF00Aa"/>"##, "FF00AA", "#123ABC");
        assert_eq!(out, r##"<a fill="#123abc"/>"##);
    }

    #[test]
    fn no_op_pairs_change_nothing() {
        let doc = r##"<rect fill="#FF0000" stroke="rgb(255, 0, 0)"/>"##;
        assert_eq!(recolor_document(doc, &single(RED, RED)), doc);
        assert_eq!(replace_color(doc, "#ff0000", "#FF0000"), doc);
    }

    #[test]
    fn invalid_input_is_returned_unchanged() {
        let doc = r##"<rect fill="#ff0000"/>"##;
        assert_eq!(replace_color(doc, "red", "#0000ff"), doc);
        assert_eq!(replace_color(doc, "#ff0000", "#00f"), doc);
        assert_eq!(replace_color("", "#ff0000", "#0000ff"), "");
        assert_eq!(recolor_document("", &single(RED, BLUE)), "");
    }

    #[test]
    fn unrelated_components_are_left_alone() {
        let doc = r##"<rect fill="rgb(255, 0, 10)" stroke="rgb(25, 0, 0)"/>"##;
        assert_eq!(replace_color(doc, "#ff0000", "#0000ff"), doc);
    }

    #[test]
    fn matches_text_outside_attributes_too() {
        let doc = "<!-- was #ff0000 --><rect fill=\"#ff0000\"/>";
        let out = replace_color(doc, "#ff0000", "#00ff00");
        assert_eq!(out, "<!-- was #00ff00 --><rect fill=\"#00ff00\"/>");
    }

    #[test]
    fn pairs_apply_in_mapping_order() {
        let green = Srgb::new(0, 255, 0);
        let mapping: ColorMapping = [(RED, BLUE), (green, RED)].into_iter().collect();
        let out = recolor_document(r##"<a fill="#ff0000"/><b fill="#00ff00"/>"##, &mapping);
        assert_eq!(out, r##"<a fill="#0000ff"/><b fill="#ff0000"/>"##);
    }
}
