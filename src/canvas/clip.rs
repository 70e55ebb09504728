//! Clip region bookkeeping.
//!
//! The canvas records each clip shape after applying the call-time
//! transform, so the region is an ordered list of shapes in a common
//! basis. The algebraic meaning is their intersection: emission replays
//! every shape as a clip pass, and the device clip narrows with each
//! one. No path boolean algebra happens in this crate.

use crate::core::path::{Path, Rect};

/// The accumulated clip: an ordered shape list whose meaning is the
/// intersection of all entries.
#[derive(Debug, Clone, Default)]
pub struct ClipRegion {
    shapes: Vec<Path>,
}

impl ClipRegion {
    /// A region consisting of a single shape.
    pub fn new(shape: Path) -> Self {
        ClipRegion {
            shapes: vec![shape],
        }
    }

    /// Narrow the region by another shape.
    pub fn intersect(&mut self, shape: Path) {
        self.shapes.push(shape);
    }

    /// The recorded shapes, oldest first. Replaying them as clip passes
    /// reconstructs the region.
    pub fn shapes(&self) -> &[Path] {
        &self.shapes
    }

    /// A conservative bounding rectangle: the intersection of the
    /// per-shape bounding boxes. Exact when every shape is an
    /// axis-aligned rectangle. `None` means the region is provably
    /// empty.
    pub fn bounds(&self) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        for shape in &self.shapes {
            let shape_bounds = shape.bounding_box()?;
            bounds = Some(match bounds {
                None => shape_bounds,
                Some(prev) => prev.intersect(&shape_bounds)?,
            });
        }
        bounds
    }
}
