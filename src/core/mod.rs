//! Core geometry and error types.
//!
//! Everything in this module is host-facing value material: colors,
//! transforms, paths, and the crate error type. Nothing here touches the
//! output buffer.

pub mod color;
pub mod error;
pub mod matrix;
pub mod path;

// Re-export key types
pub use color::Color;
pub use error::{CanvasError, CanvasResult};
pub use matrix::Matrix;
pub use path::{ArcKind, Path, PathBuilder, PathElement, Rect, WindingRule};
