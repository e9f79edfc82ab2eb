//! Browser entry points.
//!
//! The page renders the document onto a canvas and passes the `ImageData`
//! bytes in; everything returned is plain JS values.

use js_sys::{Array, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

use crate::color;
use crate::config::{AnalyzerConfig, DEFAULT_TOLERANCE};
use crate::document;
use crate::error::Error;
use crate::highlight;
use crate::histogram::{self, ColorEntry};
use crate::kmeans;
use crate::mapping;
use crate::pixels::PixelBuffer;
use crate::quantize;
use crate::recolor;

impl From<Error> for JsValue {
    fn from(err: Error) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(key), value)?;
    Ok(())
}

fn entry_object(entry: &ColorEntry) -> Result<Object, JsValue> {
    let obj = Object::new();
    set(&obj, "hex", &JsValue::from_str(&entry.hex()))?;
    set(&obj, "count", &JsValue::from_f64(entry.count as f64))?;
    set(&obj, "percentage", &JsValue::from_f64(entry.percentage))?;
    Ok(obj)
}

fn hex_list(js: &Array) -> Result<Vec<color::Rgb>, JsValue> {
    let mut out = Vec::with_capacity(js.length() as usize);
    for val in js.iter() {
        let s = val
            .as_string()
            .ok_or_else(|| JsValue::from_str("Palette values must be strings"))?;
        out.push(color::from_hex(&s)?);
    }
    Ok(out)
}

/// Count the opaque colors of a canvas `ImageData`.
///
/// Returns `{ colors: [{ hex, count, percentage }], total }`, most frequent first.
#[wasm_bindgen]
pub fn analyze_pixels(width: u32, height: u32, data: Vec<u8>) -> Result<Object, JsValue> {
    let buffer = PixelBuffer::new(width, height, data)?;
    let analysis = histogram::analyze(&buffer);

    let colors = Array::new();
    for entry in &analysis.entries {
        let obj = entry_object(entry)?;
        colors.push(&obj);
    }
    let result = Object::new();
    set(&result, "colors", &colors)?;
    set(&result, "total", &JsValue::from_f64(analysis.total_opaque as f64))?;
    Ok(result)
}

/// Cluster the colors of `data` into `k` hex colors.
#[wasm_bindgen]
pub fn reduce_palette(width: u32, height: u32, data: Vec<u8>, k: usize) -> Result<Array, JsValue> {
    let buffer = PixelBuffer::new(width, height, data)?;
    let analysis = histogram::analyze(&buffer);
    let palette = kmeans::reduce_palette(&analysis.entries, k)?;
    Ok(palette
        .iter()
        .map(|c| JsValue::from_str(&color::to_hex(*c)))
        .collect())
}

/// Reduce the document's colors to `target` using its rendering in `data`.
///
/// Returns `{ document, mapping }` where `mapping` maps every old hex color to its replacement.
#[wasm_bindgen]
pub fn reduce_document(
    doc: String,
    width: u32,
    height: u32,
    data: Vec<u8>,
    target: usize,
) -> Result<Object, JsValue> {
    let buffer = PixelBuffer::new(width, height, data)?;
    let analysis = histogram::analyze(&buffer);
    if target < 1 || target >= analysis.len() {
        return Err(Error::InvalidInput(format!(
            "target {target} must be between 1 and {}",
            analysis.len().saturating_sub(1)
        ))
        .into());
    }
    let palette = kmeans::reduce_palette(&analysis.entries, target)?;
    let color_mapping = mapping::build_mapping(&analysis.entries, &palette);

    let mapping_js = Object::new();
    for (old, new) in color_mapping.iter() {
        set(&mapping_js, &color::to_hex(old), &JsValue::from_str(&color::to_hex(new)))?;
    }
    let result = Object::new();
    set(
        &result,
        "document",
        &JsValue::from_str(&recolor::recolor_document(&doc, &color_mapping)),
    )?;
    set(&result, "mapping", &mapping_js)?;
    Ok(result)
}

/// Replace one color everywhere in the document text.
#[wasm_bindgen]
pub fn replace_color(doc: &str, old_hex: &str, new_hex: &str) -> String {
    recolor::replace_color(doc, old_hex, new_hex)
}

/// Build a highlight overlay for `visible` hex colors over a cached rendering.
#[wasm_bindgen]
pub fn highlight_overlay(
    width: u32,
    height: u32,
    data: Vec<u8>,
    visible: Array,
    tolerance: Option<u8>,
) -> Result<Uint8Array, JsValue> {
    let buffer = PixelBuffer::new(width, height, data)?;
    let visible = hex_list(&visible)?;
    let overlay = highlight::compose(&buffer, &visible, tolerance.unwrap_or(DEFAULT_TOLERANCE));
    Ok(Uint8Array::from(overlay.data()))
}

/// Quantize raw RGBA pixels to at most `k` colors.
#[wasm_bindgen]
pub fn quantize_pixels(width: u32, height: u32, data: Vec<u8>, k: usize) -> Result<Uint8Array, JsValue> {
    let buffer = PixelBuffer::new(width, height, data)?;
    let out = quantize::quantize(&buffer, k)?;
    Ok(Uint8Array::from(out.data()))
}

/// Turn encoded image bytes (PNG, JPEG, ...) into an SVG document with a quantized raster.
#[wasm_bindgen]
pub fn import_raster(input: Vec<u8>, n_colors: Option<usize>) -> Result<String, JsValue> {
    let mut config = AnalyzerConfig::default();
    if let Some(n) = n_colors {
        config = config.with_import_colors(n);
    }
    Ok(quantize::import_raster(&input, &config)?)
}

/// Canvas size to render the document at for analysis, as `[width, height]`.
#[wasm_bindgen]
pub fn document_render_size(doc: &str) -> Result<Array, JsValue> {
    let (w, h) = document::bounding_box(doc)?;
    let (width, height) = document::render_size(w, h, &AnalyzerConfig::default());
    let out = Array::new();
    out.push(&JsValue::from_f64(width as f64));
    out.push(&JsValue::from_f64(height as f64));
    Ok(out)
}

/// Group the colors of `data` by similarity: `[{ centroid, total, colors: [...] }]`.
#[wasm_bindgen]
pub fn group_colors(width: u32, height: u32, data: Vec<u8>) -> Result<Array, JsValue> {
    let buffer = PixelBuffer::new(width, height, data)?;
    let analysis = histogram::analyze(&buffer);
    let k = kmeans::suggested_group_count(analysis.len());
    let groups = kmeans::group_by_similarity(&analysis.entries, k)?;

    let out = Array::new();
    for group in &groups {
        let colors = Array::new();
        for entry in &group.colors {
            let obj = entry_object(entry)?;
            colors.push(&obj);
        }
        let obj = Object::new();
        set(&obj, "centroid", &JsValue::from_str(&color::to_hex(group.centroid)))?;
        set(&obj, "total", &JsValue::from_f64(group.total_count() as f64))?;
        set(&obj, "colors", &colors)?;
        out.push(&obj);
    }
    Ok(out)
}
