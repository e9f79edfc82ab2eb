use thiserror::Error;

/// Errors raised by the analysis and recoloring pipeline.
///
/// Degenerate inputs that have a defined result (fully transparent buffers,
/// identical old/new colors, missing selection) are not errors and never
/// surface here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid color format: {0}")]
    InvalidColorFormat(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
