//! # pdf-canvas: An Imperative 2D Canvas Emitting PDF Content Streams
//!
//! pdf-canvas translates a stateful, Y-up 2D drawing surface into the
//! append-only operator stream of a PDF page. A host toolkit draws
//! against [`PageCanvas`](canvas::PageCanvas) exactly as it would
//! against its native graphics surface; the crate tracks graphics
//! state, diffs it against what the stream already says, and emits
//! only the operators that change anything.
//!
//! ## Features
//!
//! - **State Diffing**: stroke attributes, colors, and opacities are
//!   re-emitted only when they differ from the last emission
//! - **Nested Contexts**: child canvases record into their own buffers
//!   and splice back into the parent stream at disposal
//! - **Style Synthesis**: bold, italic, and underline are synthesized
//!   for fonts that lack real variants
//! - **Paint Variety**: solid colors, linear gradients, tiled textures,
//!   and arbitrary per-pixel paints
//! - **Image Embedding**: raw or JPEG-re-encoded rasters with soft
//!   masks derived from alpha channels
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use pdf_canvas::canvas::{FixedFontMapper, FontSpec, PageCanvas, Paint};
//! use pdf_canvas::core::{Color, Path};
//!
//! // A US Letter page, in points
//! let mut canvas = PageCanvas::new(612.0, 792.0, Arc::new(FixedFontMapper::default()));
//!
//! canvas.set_paint(Paint::Solid(Color::rgb(220, 50, 50)));
//! canvas.fill(&Path::rectangle(72.0, 600.0, 200.0, 100.0));
//!
//! canvas.set_font(FontSpec::new("Helvetica", 24.0).bold());
//! canvas.draw_text("Hello", 72.0, 560.0)?;
//!
//! // Close the stream, then hand bytes and resources to a writer
//! canvas.dispose();
//! let operators = canvas.content();
//! let resources = canvas.take_resources();
//! # assert!(!operators.is_empty());
//! # assert_eq!(resources.fonts().len(), 1);
//! # Ok::<(), pdf_canvas::core::CanvasError>(())
//! ```
//!
//! ## Architecture
//!
//! pdf-canvas follows a three-layer architecture:
//!
//! 1. **Geometry Layer** (`core`): transforms, colors, paths, and the
//!    crate error type; no knowledge of the output format
//! 2. **Content Layer** (`content`): the operator vocabulary, the
//!    append-only byte sink, and the page resource registry
//! 3. **Canvas Layer** (`canvas`): graphics state tracking, emission
//!    diffing, text and image translation, and context lifecycle
//!
//! ## Coordinate Spaces
//!
//! Callers draw in user space, Y-up, with the origin at the bottom
//! left. Every coordinate is carried through the active transform and
//! the page-height vertical flip at emission time; the stream itself
//! never contains a transform operator for ordinary drawing.
//!
//! ## Nested Contexts
//!
//! ```rust
//! use std::sync::Arc;
//! use pdf_canvas::canvas::{FixedFontMapper, PageCanvas};
//! use pdf_canvas::core::Path;
//!
//! let mut page = PageCanvas::new(612.0, 792.0, Arc::new(FixedFontMapper::default()));
//! let mut cell = page.create_child();
//!
//! // The child inherits state and buffers its own operators
//! cell.clip(&Path::rectangle(100.0, 100.0, 200.0, 50.0));
//! cell.fill(&Path::oval(100.0, 100.0, 200.0, 50.0));
//!
//! // Disposing the root splices the child's bytes into place
//! page.dispose();
//! # assert!(page.is_disposed());
//! ```

pub mod canvas;
pub mod content;
pub mod core;

// Re-export main types for convenience
pub use canvas::{
    Canvas, CanvasOptions, ClipRegion, Composite, CustomPaint, FixedFontMapper, FixedMetricsFont,
    FontBinding, FontMapper, FontSpec, ImagePlacement, LineCap, LineJoin, OutputFont, PageCanvas,
    Paint, Raster, RasterFormat, RasterSource, SharedRaster, Stroke, StrokeOutline, StrokeStyle,
};

// Re-export content-layer types reachable from the canvas API
pub use content::{ContentStream, ImageResource, PageResources, ResourceName, TilingPattern};

// Re-export geometry types
pub use core::{
    ArcKind, CanvasError, CanvasResult, Color, Matrix, Path, PathBuilder, PathElement, Rect,
    WindingRule,
};
