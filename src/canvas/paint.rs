//! Paint model and the resolution of paints into resource definitions.
//!
//! Paint values live in user space on the canvas. Resolution turns them
//! into the device-space resource definitions the content stream refers
//! to: solid colors become color operators, linear gradients become
//! axial shading patterns, textures and arbitrary paints become tiling
//! patterns. Opacity is never part of the color operators; it travels
//! separately as extended-graphics-state changes.

use std::sync::Arc;

use crate::content::resources::{AxialShading, ResourceName, TilingPattern};
use crate::core::color::Color;
use crate::core::error::{CanvasError, CanvasResult};
use crate::core::matrix::Matrix;
use crate::core::path::Rect;

use super::image::{Raster, RasterFormat};

/// Compositing mode carried by the canvas.
///
/// Only constant-alpha source-over compositing affects the output; the
/// alpha multiplies into per-role opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Composite {
    SrcOver { alpha: f32 },
}

/// The opacity contributed by the composite, as a byte.
pub(crate) fn composite_alpha(composite: Option<Composite>) -> u8 {
    match composite {
        Some(Composite::SrcOver { alpha }) => (255.0 * alpha).round().clamp(0.0, 255.0) as u8,
        None => 255,
    }
}

/// A color with the composite's constant alpha folded into its alpha
/// byte. Colors pass through untouched when no attenuation applies.
pub(crate) fn composite_color(composite: Option<Composite>, color: Color) -> Color {
    match composite {
        Some(Composite::SrcOver { alpha }) if alpha != 1.0 => {
            color.with_alpha(color.effective_alpha(alpha))
        }
        _ => color,
    }
}

/// A host-defined paint evaluated per pixel.
pub trait CustomPaint: Send + Sync {
    /// The paint's color at a user-space point.
    fn color_at(&self, x: f64, y: f64) -> Color;

    /// Hint that every produced color is fully opaque, allowing the
    /// rasterization to skip the alpha channel.
    fn is_opaque(&self) -> bool {
        false
    }
}

/// The active paint.
#[derive(Clone)]
pub enum Paint {
    /// A solid color
    Solid(Color),

    /// A two-stop linear gradient between user-space points
    LinearGradient {
        start: (f64, f64),
        end: (f64, f64),
        start_color: Color,
        end_color: Color,
    },

    /// A raster tiled from an anchor rectangle
    Texture { raster: Arc<Raster>, anchor: Rect },

    /// A host paint evaluated per pixel
    Custom(Arc<dyn CustomPaint>),
}

impl Paint {
    /// The solid color, if this paint is one.
    pub fn solid_color(&self) -> Option<Color> {
        match self {
            Paint::Solid(color) => Some(*color),
            _ => None,
        }
    }
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Solid(Color::BLACK)
    }
}

impl std::fmt::Debug for Paint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Paint::Solid(c) => f.debug_tuple("Solid").field(c).finish(),
            Paint::LinearGradient {
                start,
                end,
                start_color,
                end_color,
            } => f
                .debug_struct("LinearGradient")
                .field("start", start)
                .field("end", end)
                .field("start_color", start_color)
                .field("end_color", end_color)
                .finish(),
            Paint::Texture { raster, anchor } => f
                .debug_struct("Texture")
                .field("size", &(raster.width(), raster.height()))
                .field("anchor", anchor)
                .finish(),
            Paint::Custom(_) => f.debug_tuple("Custom").field(&"..").finish(),
        }
    }
}

impl PartialEq for Paint {
    /// Equality used for suppressing redundant paint emission. Solid
    /// colors and gradients compare by value; textures and custom
    /// paints compare by identity since their pixel behavior cannot be
    /// inspected.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Paint::Solid(a), Paint::Solid(b)) => a == b,
            (
                Paint::LinearGradient {
                    start: s1,
                    end: e1,
                    start_color: c1,
                    end_color: d1,
                },
                Paint::LinearGradient {
                    start: s2,
                    end: e2,
                    start_color: c2,
                    end_color: d2,
                },
            ) => s1 == s2 && e1 == e2 && c1 == c2 && d1 == d2,
            (
                Paint::Texture {
                    raster: r1,
                    anchor: a1,
                },
                Paint::Texture {
                    raster: r2,
                    anchor: a2,
                },
            ) => Arc::ptr_eq(r1, r2) && a1 == a2,
            (Paint::Custom(a), Paint::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Build the axial shading for a gradient: endpoints carried through the
/// current transform, then flipped into device space.
pub(crate) fn gradient_shading(
    start: (f64, f64),
    end: (f64, f64),
    start_color: Color,
    end_color: Color,
    transform: &Matrix,
    surface_height: f64,
) -> AxialShading {
    let (x0, y0) = transform.apply(start.0, start.1);
    let (x1, y1) = transform.apply(end.0, end.1);
    AxialShading {
        coords: [x0, surface_height - y0, x1, surface_height - y1],
        c0: start_color,
        c1: end_color,
    }
}

/// Build the tiling pattern for a texture paint.
///
/// The cell is the raster's pixel box; the pattern matrix maps that box
/// onto the anchor rectangle under the current transform, with the
/// vertical axis flipped.
pub(crate) fn texture_pattern(
    raster: &Raster,
    anchor: &Rect,
    transform: &Matrix,
    surface_height: f64,
    image: ResourceName,
) -> CanvasResult<TilingPattern> {
    let w = raster.width() as f64;
    let h = raster.height() as f64;
    if w == 0.0 || h == 0.0 || anchor.is_empty() {
        return Err(CanvasError::paint_error("degenerate texture anchor"));
    }
    let mut matrix = Matrix::flip_y(surface_height);
    matrix.concat(transform);
    matrix.translate(anchor.x, anchor.y);
    matrix.scale(anchor.width / w, -anchor.height / h);
    Ok(TilingPattern {
        width: w,
        height: h,
        matrix,
        image,
    })
}

/// Rasterize a custom paint over the whole surface.
///
/// Each device pixel center is pulled back through the inverse of the
/// current transform and handed to the paint, so the paint sees user
/// coordinates exactly as it would on an immediate-mode surface.
pub(crate) fn rasterize_custom_paint(
    paint: &dyn CustomPaint,
    surface_width: f64,
    surface_height: f64,
    transform: &Matrix,
) -> CanvasResult<Raster> {
    let width = surface_width as u32;
    let height = surface_height as u32;
    if width == 0 || height == 0 {
        return Err(CanvasError::paint_error("zero-area surface"));
    }
    let inverse = transform
        .invert()
        .ok_or(CanvasError::NonInvertibleTransform)?;
    let opaque = paint.is_opaque();
    let channels = if opaque { 3 } else { 4 };
    let mut data = Vec::with_capacity(width as usize * height as usize * channels);
    for py in 0..height {
        for px in 0..width {
            let (ux, uy) = inverse.apply(px as f64 + 0.5, py as f64 + 0.5);
            let c = paint.color_at(ux, uy);
            data.push(c.r);
            data.push(c.g);
            data.push(c.b);
            if !opaque {
                data.push(c.a);
            }
        }
    }
    let format = if opaque {
        RasterFormat::Rgb8
    } else {
        RasterFormat::Rgba8
    };
    Raster::new(width, height, format, data)
}
