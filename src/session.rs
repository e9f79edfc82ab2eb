//! Working state for one document: original and edited text, the cached
//! rendering, its color analysis and the highlight selection.

use crate::color::{self, Rgb};
use crate::config::AnalyzerConfig;
use crate::document;
use crate::error::{Error, Result};
use crate::highlight::{self, HighlightMode};
use crate::histogram::{self, ColorEntry};
use crate::kmeans;
use crate::mapping::{self, ColorMapping};
use crate::pixels::PixelBuffer;
use crate::recolor;
use crate::render::Rasterizer;

pub struct Session<R> {
    rasterizer: R,
    config: AnalyzerConfig,
    original: String,
    current: String,
    colors: Vec<ColorEntry>,
    total_opaque: u64,
    original_color_count: usize,
    buffer: Option<PixelBuffer>,
    selection: Option<HighlightMode>,
}

impl<R: Rasterizer> Session<R> {
    /// Render and analyse `doc`, keeping it as both the original and the working copy.
    pub fn open(doc: impl Into<String>, rasterizer: R, config: AnalyzerConfig) -> Result<Self> {
        let doc = doc.into();
        let mut session = Self {
            rasterizer,
            config,
            original: doc.clone(),
            current: doc,
            colors: Vec::new(),
            total_opaque: 0,
            original_color_count: 0,
            buffer: None,
            selection: None,
        };
        session.analyze()?;
        Ok(session)
    }

    /// Convert raster image bytes into a document and open it.
    pub fn import(bytes: &[u8], rasterizer: R, config: AnalyzerConfig) -> Result<Self> {
        let doc = crate::quantize::import_raster(bytes, &config)?;
        Self::open(doc, rasterizer, config)
    }

    fn analyze(&mut self) -> Result<()> {
        let (w, h) = document::bounding_box(&self.current)?;
        let (width, height) = document::render_size(w, h, &self.config);
        let buffer = self.rasterizer.rasterize(&self.current, width, height)?;
        let analysis = histogram::analyze(&buffer);

        self.colors = analysis.entries;
        self.total_opaque = analysis.total_opaque;
        self.buffer = Some(buffer);
        if self.original_color_count == 0 {
            self.original_color_count = self.colors.len();
        }
        tracing::info!(
            width,
            height,
            colors = self.colors.len(),
            "document analyzed"
        );
        Ok(())
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn colors(&self) -> &[ColorEntry] {
        &self.colors
    }

    pub fn total_opaque(&self) -> u64 {
        self.total_opaque
    }

    pub fn original_color_count(&self) -> usize {
        self.original_color_count
    }

    pub fn current_document(&self) -> &str {
        &self.current
    }

    pub fn original_document(&self) -> &str {
        &self.original
    }

    pub fn cached_buffer(&self) -> Option<&PixelBuffer> {
        self.buffer.as_ref()
    }

    /// Cluster the current colors down to `target`, rewrite the document and re-analyse it.
    pub fn reduce_colors(&mut self, target: usize) -> Result<ColorMapping> {
        let current = self.colors.len();
        if target < 1 {
            return Err(Error::InvalidInput(
                "target color count must be at least 1".into(),
            ));
        }
        if target >= current {
            return Err(Error::InvalidInput(format!(
                "current color count is already at or below target ({current} colors)"
            )));
        }

        let palette =
            kmeans::reduce_palette_with(&self.colors, target, self.config.kmeans_iterations)?;
        let mapping = mapping::build_mapping(&self.colors, &palette);
        self.current = recolor::recolor_document(&self.current, &mapping);
        self.analyze()?;

        tracing::info!(from = current, to = self.colors.len(), "colors reduced");
        Ok(mapping)
    }

    /// Replace the color at `index` with `new_hex` in the document.
    ///
    /// Returns `Ok(false)` when the color is unchanged. The analysis entry is
    /// updated in place; the document is not re-rendered.
    pub fn update_color(&mut self, index: usize, new_hex: &str) -> Result<bool> {
        let entry = self.colors.get(index).ok_or_else(|| {
            Error::InvalidInput(format!(
                "color index {index} out of range (0..{})",
                self.colors.len()
            ))
        })?;
        let new = color::from_hex(new_hex)?;
        if entry.color == new {
            return Ok(false);
        }

        let old_hex = entry.hex();
        let new_hex = color::to_hex(new);
        self.current = recolor::replace_color(&self.current, &old_hex, &new_hex);
        self.colors[index].color = new;
        tracing::info!(old = %old_hex, new = %new_hex, "color updated");
        Ok(true)
    }

    /// Go back to the original document and its analysis.
    pub fn reset(&mut self) -> Result<()> {
        self.current = self.original.clone();
        self.selection = None;
        self.analyze()
    }

    /// Select a highlight; selecting the active one again clears it.
    pub fn select(&mut self, mode: HighlightMode) -> Option<HighlightMode> {
        self.selection = match self.selection {
            Some(active) if active == mode => None,
            _ => Some(mode),
        };
        self.selection
    }

    /// Select by hex as the color list does: the color itself, or everything up to it.
    pub fn select_hex(&mut self, hex: &str, single: bool) -> Result<Option<HighlightMode>> {
        let color: Rgb = color::from_hex(hex)?;
        let mode = if single {
            HighlightMode::SingleColor(color)
        } else {
            let index = self
                .colors
                .iter()
                .position(|e| e.color == color)
                .ok_or_else(|| Error::InvalidInput(format!("{hex} is not an analysed color")))?;
            HighlightMode::CumulativePrefix(index)
        };
        Ok(self.select(mode))
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<HighlightMode> {
        self.selection
    }

    /// How many colors the current selection shows.
    pub fn visible_color_count(&self) -> usize {
        match self.selection {
            Some(mode) => mode.visible_count(self.colors.len()),
            None => self.colors.len(),
        }
    }

    /// Highlight overlay for the current selection, if there is one to draw.
    pub fn overlay(&self) -> Option<PixelBuffer> {
        highlight::overlay(
            self.buffer.as_ref(),
            self.selection.as_ref(),
            &self.colors,
            self.config.tolerance,
        )
    }

    /// The cached rendering with the active highlight drawn on top.
    pub fn export_raster(&self) -> Result<Option<PixelBuffer>> {
        let Some(base) = self.buffer.as_ref() else {
            return Ok(None);
        };
        match self.overlay() {
            Some(overlay) => overlay.composite_over(base).map(Some),
            None => Ok(Some(base.clone())),
        }
    }

    /// The working document, or a raster document showing the active highlight.
    pub fn export_highlighted(&self) -> Result<String> {
        if self.overlay().is_none() {
            return Ok(self.current.clone());
        }
        match self.export_raster()? {
            Some(raster) => document::embed_raster(&raster),
            None => Ok(self.current.clone()),
        }
    }
}
