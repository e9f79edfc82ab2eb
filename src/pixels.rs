use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb as RgbPixel, RgbImage, RgbaImage, imageops};
use palette::Srgb;

use crate::color::Rgb;
use crate::config::ALPHA_THRESHOLD;
use crate::error::{Error, Result};

/// A row-major RGBA8 raster, top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Byte length of a `width` x `height` RGBA raster, if it fits in memory.
fn byte_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| Error::InvalidInput(format!("pixel buffer of {width}x{height} is too large")))
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes; the length must be exactly `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(Error::InvalidInput(format!(
                "pixel buffer of {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// A fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> Result<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len() / 4
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.data
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// A buffer with these dimensions around `data` of the same length.
    pub(crate) fn same_size(&self, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Map every pixel through `f`, keeping the dimensions.
    pub fn map_pixels(&self, f: impl Fn([u8; 4]) -> [u8; 4]) -> Self {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.pixels() {
            out.extend_from_slice(&f(px));
        }
        self.same_size(out)
    }

    /// Source-over composite of `self` on top of `base`.
    pub fn composite_over(&self, base: &PixelBuffer) -> Result<PixelBuffer> {
        if self.width != base.width || self.height != base.height {
            return Err(Error::InvalidInput(format!(
                "cannot composite {}x{} over {}x{}",
                self.width, self.height, base.width, base.height
            )));
        }
        let mut out = base.to_image()?;
        imageops::overlay(&mut out, &self.to_image()?, 0, 0);
        Ok(out.into())
    }

    /// Drop the alpha channel by compositing onto an opaque `background`.
    pub fn flatten(&self, background: Rgb) -> RgbImage {
        let back = [background.red, background.green, background.blue];
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let i = (y as usize * self.width as usize + x as usize) * 4;
            let px = &self.data[i..i + 4];
            let a = px[3] as f32 / 255.0;
            let mix = |c: usize| (px[c] as f32 * a + back[c] as f32 * (1.0 - a)).round() as u8;
            RgbPixel([mix(0), mix(1), mix(2)])
        })
    }

    fn to_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| Error::InvalidInput("pixel buffer does not fit its dimensions".into()))
    }

    /// Encode as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.to_image()?
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }

    /// Encode as JPEG bytes at `quality` (1-100), flattened on white.
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
            .encode_image(&self.flatten(Srgb::new(255, 255, 255)))?;
        Ok(buf)
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

#[inline]
pub(crate) fn is_transparent(px: [u8; 4]) -> bool {
    px[3] < ALPHA_THRESHOLD
}

#[inline]
pub(crate) fn rgb_of(px: [u8; 4]) -> Rgb {
    Srgb::new(px[0], px[1], px[2])
}
