//! Content emission layer.
//!
//! This layer owns the wire side of the crate: the operator vocabulary,
//! the append-only byte sink, and the registry of named resources the
//! emitted bytes refer to. It knows nothing about graphics state
//! tracking; the canvas layer decides *when* to emit, this layer decides
//! *how* the bytes look.

pub mod ops;
pub mod resources;
pub mod stream;

pub use ops::Operator;
pub use resources::{
    AxialShading, ExtGState, ImageColorSpace, ImageEncoding, ImageResource, PageResources,
    Pattern, ResourceName, TilingPattern,
};
pub use stream::ContentStream;
