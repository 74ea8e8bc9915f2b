//! Error types for the annotator and its persistence layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    /// A polygon needs at least three vertices.
    #[error("Polygon must have at least 3 points (got {count})")]
    TooFewPoints { count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// An operation needed the current image but none is loaded.
    #[error("No image loaded")]
    NoImageLoaded,
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
