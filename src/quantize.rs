//! Raster import: reduce an arbitrary image to a small palette and wrap it as a document.

use image::GenericImageView;
use image::imageops::{self, FilterType};

use crate::config::{AnalyzerConfig, DEFAULT_ITERATIONS};
use crate::document;
use crate::error::{Error, Result};
use crate::histogram;
use crate::kmeans;
use crate::mapping;
use crate::pixels::{PixelBuffer, is_transparent, rgb_of};

/// Quantize `buffer` to at most `k` colors with the default round count.
pub fn quantize(buffer: &PixelBuffer, k: usize) -> Result<PixelBuffer> {
    quantize_with(buffer, k, DEFAULT_ITERATIONS)
}

/// Remap every opaque pixel of `buffer` to its nearest color in a `k`-color palette.
///
/// A buffer that already has `k` or fewer colors (or none at all) comes back
/// unchanged. Transparent pixels are always copied through as they are.
pub fn quantize_with(buffer: &PixelBuffer, k: usize, iterations: usize) -> Result<PixelBuffer> {
    if k < 1 {
        return Err(Error::InvalidInput(format!(
            "palette size must be at least 1, got {k}"
        )));
    }
    let analysis = histogram::analyze(buffer);
    if analysis.len() <= k {
        tracing::debug!(
            colors = analysis.len(),
            k,
            "raster already within palette size"
        );
        return Ok(buffer.clone());
    }

    let palette = kmeans::reduce_palette_with(&analysis.entries, k, iterations)?;
    tracing::debug!(from = analysis.len(), to = palette.len(), "quantizing raster");

    Ok(buffer.map_pixels(|px| {
        if is_transparent(px) {
            return px;
        }
        match mapping::nearest(rgb_of(px), &palette) {
            Some(c) => [c.red, c.green, c.blue, px[3]],
            None => px,
        }
    }))
}

/// Decode image bytes, downscale past `max_render_size`, quantize, and embed as a document.
pub fn import_raster(bytes: &[u8], config: &AnalyzerConfig) -> Result<String> {
    let img = image::load_from_memory(bytes)?;
    let (orig_w, orig_h) = img.dimensions();
    if orig_w == 0 || orig_h == 0 {
        return Err(Error::InvalidInput(format!(
            "image has invalid dimensions {orig_w}x{orig_h}"
        )));
    }

    let mut rgba = img.to_rgba8();
    let max = config.max_render_size;
    if orig_w > max || orig_h > max {
        let scale = (max as f64 / orig_w as f64).min(max as f64 / orig_h as f64);
        let w = ((orig_w as f64 * scale).floor() as u32).max(1);
        let h = ((orig_h as f64 * scale).floor() as u32).max(1);
        tracing::info!(orig_w, orig_h, w, h, "scaling raster for import");
        rgba = imageops::resize(&rgba, w, h, FilterType::Triangle);
    }

    let buffer = PixelBuffer::from(rgba);
    let quantized = quantize_with(&buffer, config.import_colors, config.kmeans_iterations)?;
    tracing::info!(
        width = quantized.width(),
        height = quantized.height(),
        colors = config.import_colors,
        "raster converted to document"
    );
    document::embed_raster(&quantized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 7) as u8, (y * 11) as u8, 128, 255]);
            }
        }
        PixelBuffer::new(width, height, data).unwrap()
    }

    #[test]
    fn reduces_to_at_most_k_colors() {
        let src = gradient(12, 10);
        let out = quantize(&src, 4).unwrap();
        assert_eq!((out.width(), out.height()), (12, 10));
        assert!(histogram::analyze(&out).len() <= 4);
    }

    #[test]
    fn small_palettes_pass_through() {
        let src = gradient(2, 1);
        assert_eq!(quantize(&src, 16).unwrap(), src);
        let clear = PixelBuffer::transparent(4, 4).unwrap();
        assert_eq!(quantize(&clear, 1).unwrap(), clear);
    }

    #[test]
    fn transparent_pixels_are_copied() {
        let mut data = gradient(4, 4).into_raw();
        data[0..4].copy_from_slice(&[77, 66, 55, 3]);
        let src = PixelBuffer::new(4, 4, data).unwrap();
        let out = quantize(&src, 2).unwrap();
        assert_eq!(&out.data()[0..4], &[77, 66, 55, 3]);
    }

    #[test]
    fn zero_colors_is_rejected() {
        assert!(matches!(quantize(&gradient(2, 2), 0), Err(Error::InvalidInput(_))));
    }

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn import_scales_large_images() {
        let img = RgbaImage::from_pixel(1000, 500, Rgba([10, 20, 30, 255]));
        let doc = import_raster(&png_bytes(&img), &AnalyzerConfig::default()).unwrap();
        assert_eq!(document::bounding_box(&doc).unwrap(), (800.0, 400.0));
    }

    #[test]
    fn import_keeps_small_images() {
        let img = RgbaImage::from_pixel(30, 20, Rgba([200, 0, 0, 255]));
        let doc = import_raster(&png_bytes(&img), &AnalyzerConfig::default()).unwrap();
        assert!(doc.contains(r#"width="30" height="20""#));
    }

    #[test]
    fn import_rejects_garbage() {
        let err = import_raster(b"not an image", &AnalyzerConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }
}
