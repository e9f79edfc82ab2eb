/// Tunables shared by the analysis, clustering and highlight stages.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalyzerConfig {
    /// Per-channel tolerance used when matching pixels against a visible set.
    pub tolerance: u8,
    /// Fixed number of k-means rounds.
    pub kmeans_iterations: usize,
    /// Longest side, in pixels, of an analysis rendering or an imported raster.
    pub max_render_size: u32,
    /// Upper bound on the scale factor applied to small documents.
    pub max_upscale: f64,
    /// Palette size used when converting a raster into a document.
    pub import_colors: usize,
}

pub const DEFAULT_TOLERANCE: u8 = 15;
pub const DEFAULT_ITERATIONS: usize = 10;
/// Pixels with alpha below this value count as transparent.
pub const ALPHA_THRESHOLD: u8 = 10;
/// Channel multiplier for pixels outside the visible set.
pub const DIM_FACTOR: f32 = 0.2;

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            kmeans_iterations: DEFAULT_ITERATIONS,
            max_render_size: 800,
            max_upscale: 2.0,
            import_colors: 16,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.kmeans_iterations = iterations;
        self
    }

    pub fn with_max_render_size(mut self, size: u32) -> Self {
        self.max_render_size = size;
        self
    }

    pub fn with_import_colors(mut self, colors: usize) -> Self {
        self.import_colors = colors;
        self
    }
}
