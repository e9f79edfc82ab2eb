//! Dominant-color analysis, palette reduction and recoloring for SVG documents.
//!
//! A rendering of the document is histogrammed, the observed colors are
//! clustered with count-weighted k-means, and the resulting old → new mapping
//! is written back into the document text. A highlight overlay can isolate
//! one color (or the most frequent few) on top of the cached rendering.
//!
//! The same core is exposed to JavaScript through `wasm-bindgen` (see
//! [`wasm`]) and to the command line through the `svg-palette` binary
//! (feature `native-bin`).

pub mod color;
pub mod config;
pub mod document;
pub mod error;
pub mod highlight;
pub mod histogram;
pub mod kmeans;
pub mod mapping;
pub mod pixels;
pub mod quantize;
pub mod recolor;
pub mod render;
pub mod session;
pub mod wasm;

pub use color::{Rgb, distance, from_hex, matches, to_hex};
pub use config::AnalyzerConfig;
pub use error::{Error, Result};
pub use highlight::HighlightMode;
pub use histogram::{ColorAnalysis, ColorEntry, analyze};
pub use kmeans::{ColorGroup, group_by_similarity, reduce_palette};
pub use mapping::{ColorMapping, build_mapping, nearest};
pub use pixels::PixelBuffer;
pub use recolor::{RgbForm, recolor_document, replace_color};
pub use render::Rasterizer;
#[cfg(feature = "resvg")]
pub use render::ResvgRasterizer;
pub use session::Session;
