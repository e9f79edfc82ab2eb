//! Size extraction and raster embedding for SVG documents.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;

use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::pixels::PixelBuffer;

const DEFAULT_WIDTH: f64 = 300.0;
const DEFAULT_HEIGHT: f64 = 150.0;

fn attribute(tag: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(r#"\s{name}\s*=\s*(?:"([^"]*)"|'([^']*)')"#)).ok()?;
    let caps = re.captures(tag)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string())
}

/// Longest numeric prefix of `value`, ignoring any trailing unit.
fn leading_number(value: &str) -> Option<f64> {
    let re = Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").ok()?;
    re.find(value.trim_start())?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Strip units by keeping digits and dots only.
fn length(value: &str) -> Option<f64> {
    let digits: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    leading_number(&digits)
}

fn view_box_size(value: &str) -> Option<(f64, f64)> {
    let parts: Vec<&str> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .collect();
    match parts[..] {
        [_, _, w, h] => {
            let (w, h) = (leading_number(w)?, leading_number(h)?);
            (w > 0.0 && h > 0.0).then_some((w, h))
        }
        _ => None,
    }
}

/// Declared size of the document's root `<svg>` element.
///
/// A four-number `viewBox` with a positive size wins; otherwise `width` and
/// `height` are read with their units dropped. Anything still missing falls
/// back to 300 x 150.
pub fn bounding_box(doc: &str) -> Result<(f64, f64)> {
    let root = Regex::new(r"(?s)<svg\b[^>]*>")
        .ok()
        .and_then(|re| re.find(doc))
        .ok_or_else(|| Error::InvalidInput("document has no <svg> root element".into()))?;
    let tag = root.as_str();

    if let Some(size) = attribute(tag, "viewBox").as_deref().and_then(view_box_size) {
        return Ok(size);
    }

    let width = attribute(tag, "width")
        .as_deref()
        .and_then(length)
        .filter(|w| *w > 0.0)
        .unwrap_or(DEFAULT_WIDTH);
    let height = attribute(tag, "height")
        .as_deref()
        .and_then(length)
        .filter(|h| *h > 0.0)
        .unwrap_or(DEFAULT_HEIGHT);
    Ok((width, height))
}

/// Pixel size for an analysis rendering of a `width` x `height` document.
///
/// The larger side is brought to at most `max_render_size`, and small
/// documents are enlarged by no more than `max_upscale`.
pub fn render_size(width: f64, height: f64, config: &AnalyzerConfig) -> (u32, u32) {
    let max = config.max_render_size as f64;
    let scale = (max / width).min(max / height).min(config.max_upscale);
    let w = (width * scale).floor().max(1.0) as u32;
    let h = (height * scale).floor().max(1.0) as u32;
    (w, h)
}

/// Wrap a raster as a standalone SVG document with an embedded PNG.
pub fn embed_raster(buffer: &PixelBuffer) -> Result<String> {
    let png = buffer.to_png()?;
    let data_url = format!("data:image/png;base64,{}", STANDARD.encode(png));
    let (w, h) = (buffer.width(), buffer.height());
    Ok(format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 {w} {h}" width="{w}" height="{h}">
    <image href="{data_url}" x="0" y="0" width="{w}" height="{h}" />
</svg>"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_view_box() {
        let doc = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 50"></svg>"#;
        assert_eq!(bounding_box(doc).unwrap(), (100.0, 50.0));
        let doc = r#"<svg viewBox='-5,-5, 40 , 20'/>"#;
        assert_eq!(bounding_box(doc).unwrap(), (40.0, 20.0));
    }

    #[test]
    fn view_box_components_drop_trailing_units() {
        let doc = r#"<svg viewBox="0 0 100px 50" width="10" height="10"></svg>"#;
        assert_eq!(bounding_box(doc).unwrap(), (100.0, 50.0));
        let doc = r#"<svg viewBox="0 0 1.5e2mm 7.5" width="10" height="10"></svg>"#;
        assert_eq!(bounding_box(doc).unwrap(), (150.0, 7.5));
        let doc = r#"<svg viewBox="0 0 px 50" width="12" height="10"></svg>"#;
        assert_eq!(bounding_box(doc).unwrap(), (12.0, 10.0));
    }

    #[test]
    fn view_box_beats_width_and_height() {
        let doc = r#"<svg width="10" height="10" viewBox="0 0 200 100"></svg>"#;
        assert_eq!(bounding_box(doc).unwrap(), (200.0, 100.0));
    }

    #[test]
    fn falls_back_to_width_height_with_units() {
        let doc = r#"<svg width="120px" height="80pt"></svg>"#;
        assert_eq!(bounding_box(doc).unwrap(), (120.0, 80.0));
        let doc = r#"<svg viewBox="0 0 0 0" width="64" height="32"></svg>"#;
        assert_eq!(bounding_box(doc).unwrap(), (64.0, 32.0));
    }

    #[test]
    fn ignores_attributes_of_child_elements() {
        let doc = "<svg>\n<rect width=\"10\" height=\"10\"/></svg>";
        assert_eq!(bounding_box(doc).unwrap(), (300.0, 150.0));
    }

    #[test]
    fn defaults_when_undeclared() {
        assert_eq!(bounding_box("<svg></svg>").unwrap(), (300.0, 150.0));
        assert_eq!(bounding_box(r#"<svg width="40"/>"#).unwrap(), (40.0, 150.0));
    }

    #[test]
    fn missing_root_is_invalid_input() {
        assert!(matches!(bounding_box("<html/>"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn render_size_caps_and_upscales() {
        let cfg = AnalyzerConfig::default();
        assert_eq!(render_size(1600.0, 400.0, &cfg), (800, 200));
        assert_eq!(render_size(300.0, 150.0, &cfg), (600, 300));
        assert_eq!(render_size(500.0, 300.0, &cfg), (800, 480));
        assert_eq!(render_size(10000.0, 1.0, &cfg), (800, 1));
    }

    #[test]
    fn embedded_raster_declares_its_size() {
        let buffer = PixelBuffer::transparent(3, 2).unwrap();
        let doc = embed_raster(&buffer).unwrap();
        assert!(doc.contains(r#"viewBox="0 0 3 2""#));
        assert!(doc.contains("data:image/png;base64,"));
        assert_eq!(bounding_box(&doc).unwrap(), (3.0, 2.0));
    }
}
