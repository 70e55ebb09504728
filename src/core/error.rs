use std::fmt;

/// Universal error type for canvas operations.
///
/// This error type covers all possible errors that can occur while
/// translating drawing calls into content-stream output.
#[derive(Debug, Clone)]
pub enum CanvasError {
    /// The current transform has no inverse
    NonInvertibleTransform,

    /// A raster buffer does not match its declared dimensions
    InvalidRaster { expected: usize, actual: usize },

    /// Lossy image encoding failed terminally (after the retry)
    ImageEncode(String),

    /// An asynchronous raster source reported failure
    RasterUnavailable(String),

    /// Font resolution failed
    FontResolution(String),

    /// Paint could not be resolved to a content-stream instruction
    PaintResolution(String),

    /// Generic error with message
    Generic(String),
}

impl CanvasError {
    /// Create an image encoding error with a descriptive message.
    pub fn image_error(msg: impl Into<String>) -> Self {
        CanvasError::ImageEncode(msg.into())
    }

    /// Create a font resolution error with a descriptive message.
    pub fn font_error(msg: impl Into<String>) -> Self {
        CanvasError::FontResolution(msg.into())
    }

    /// Create a paint resolution error with a descriptive message.
    pub fn paint_error(msg: impl Into<String>) -> Self {
        CanvasError::PaintResolution(msg.into())
    }
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanvasError::NonInvertibleTransform => {
                write!(f, "Transform is not invertible")
            }
            CanvasError::InvalidRaster { expected, actual } => {
                write!(
                    f,
                    "Raster buffer length {} does not match dimensions (expected {})",
                    actual, expected
                )
            }
            CanvasError::ImageEncode(msg) => {
                write!(f, "Image encoding failed: {}", msg)
            }
            CanvasError::RasterUnavailable(msg) => {
                write!(f, "Raster source unavailable: {}", msg)
            }
            CanvasError::FontResolution(msg) => {
                write!(f, "Font resolution failed: {}", msg)
            }
            CanvasError::PaintResolution(msg) => {
                write!(f, "Paint resolution failed: {}", msg)
            }
            CanvasError::Generic(msg) => {
                write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for CanvasError {}

/// Result type alias for canvas operations
pub type CanvasResult<T> = Result<T, CanvasError>;
