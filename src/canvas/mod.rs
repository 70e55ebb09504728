//! Graphics state tracking and operator emission.
//!
//! This layer is the client-facing side of the crate. [`PageCanvas`]
//! holds the live transform, clip, paint, stroke, and font state for
//! one drawing surface and translates imperative calls into operators
//! on the content layer's sink. The [`Canvas`] trait captures the
//! drawing capability itself, so hosts can code against the surface
//! without naming the concrete context type.

pub mod clip;
pub mod context;
pub mod fonts;
pub mod image;
pub mod paint;
pub mod stroke;
pub mod text;

pub use clip::ClipRegion;
pub use context::{CanvasOptions, PageCanvas, DEFAULT_JPEG_QUALITY};
pub use fonts::{
    FixedFontMapper, FixedMetricsFont, FontBinding, FontMapper, FontSpec, OutputFont,
    WEIGHT_BOLD, WEIGHT_REGULAR, WEIGHT_SEMIBOLD, WIDTH_REGULAR,
};
pub use image::{ImagePlacement, Raster, RasterFormat, RasterSource, SharedRaster};
pub use paint::{Composite, CustomPaint, Paint};
pub use stroke::{LineCap, LineJoin, Stroke, StrokeOutline, StrokeStyle};

use crate::core::color::Color;
use crate::core::error::CanvasResult;
use crate::core::matrix::Matrix;
use crate::core::path::{ArcKind, Path};

/// The imperative drawing surface.
///
/// Required methods are the primitive operations; the provided methods
/// build common shapes and route them through [`draw`](Canvas::draw)
/// and [`fill`](Canvas::fill). All coordinates are user space, Y-up,
/// under the current transform.
pub trait Canvas {
    /// Stroke a shape with the current stroke and paint.
    fn draw(&mut self, shape: &Path);

    /// Fill a shape with the current paint.
    fn fill(&mut self, shape: &Path);

    /// Intersect the clip with a shape.
    fn clip(&mut self, shape: &Path);

    /// Replace the clip with a shape, or clear it with `None`.
    fn set_clip(&mut self, shape: Option<&Path>);

    /// Fill a rectangle with the background color.
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Draw a text run with its baseline origin at `(x, y)`.
    fn draw_text(&mut self, text: &str, x: f64, y: f64) -> CanvasResult<()>;

    /// Place a raster image.
    fn draw_image(
        &mut self,
        source: &dyn RasterSource,
        placement: &ImagePlacement,
    ) -> CanvasResult<()>;

    fn set_paint(&mut self, paint: Paint);

    fn set_stroke(&mut self, stroke: Stroke);

    fn set_composite(&mut self, composite: Option<Composite>);

    fn set_background(&mut self, color: Color);

    fn set_font(&mut self, font: FontSpec);

    fn set_transform(&mut self, transform: Matrix);

    /// Concatenate a transform onto the current one.
    fn concat_transform(&mut self, other: &Matrix);

    fn translate(&mut self, tx: f64, ty: f64);

    fn scale(&mut self, sx: f64, sy: f64);

    /// Rotate about the origin by `theta` radians.
    fn rotate(&mut self, theta: f64);

    /// Rotate about `(x, y)` by `theta` radians.
    fn rotate_about(&mut self, theta: f64, x: f64, y: f64);

    fn shear(&mut self, shx: f64, shy: f64);

    /// Split off a child context whose buffer splices back in at the
    /// current position when the root is disposed.
    fn create_child(&mut self) -> Self
    where
        Self: Sized;

    /// Close the context. Idempotent; a no-op on child contexts.
    fn dispose(&mut self);

    // === Shape conveniences ===

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.draw(&Path::line(x1, y1, x2, y2));
    }

    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.draw(&Path::rectangle(x, y, width, height));
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.fill(&Path::rectangle(x, y, width, height));
    }

    /// Intersect the clip with a rectangle.
    fn clip_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.clip(&Path::rectangle(x, y, width, height));
    }

    fn draw_round_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        arc_width: f64,
        arc_height: f64,
    ) {
        self.draw(&Path::round_rect(x, y, width, height, arc_width, arc_height));
    }

    fn fill_round_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        arc_width: f64,
        arc_height: f64,
    ) {
        self.fill(&Path::round_rect(x, y, width, height, arc_width, arc_height));
    }

    fn draw_oval(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.draw(&Path::oval(x, y, width, height));
    }

    fn fill_oval(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.fill(&Path::oval(x, y, width, height));
    }

    /// Stroke an open elliptical arc.
    fn draw_arc(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        start_deg: f64,
        extent_deg: f64,
    ) {
        self.draw(&Path::arc(
            x,
            y,
            width,
            height,
            start_deg,
            extent_deg,
            ArcKind::Open,
        ));
    }

    /// Fill an elliptical arc closed through the center.
    fn fill_arc(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        start_deg: f64,
        extent_deg: f64,
    ) {
        self.fill(&Path::arc(
            x,
            y,
            width,
            height,
            start_deg,
            extent_deg,
            ArcKind::Pie,
        ));
    }

    fn draw_polyline(&mut self, points: &[(f64, f64)]) {
        self.draw(&Path::polyline(points));
    }

    fn draw_polygon(&mut self, points: &[(f64, f64)]) {
        self.draw(&Path::polygon(points));
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)]) {
        self.fill(&Path::polygon(points));
    }
}

impl Canvas for PageCanvas {
    fn draw(&mut self, shape: &Path) {
        PageCanvas::draw(self, shape);
    }

    fn fill(&mut self, shape: &Path) {
        PageCanvas::fill(self, shape);
    }

    fn clip(&mut self, shape: &Path) {
        PageCanvas::clip(self, shape);
    }

    fn set_clip(&mut self, shape: Option<&Path>) {
        PageCanvas::set_clip(self, shape);
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        PageCanvas::clear_rect(self, x, y, width, height);
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64) -> CanvasResult<()> {
        PageCanvas::draw_text(self, text, x, y)
    }

    fn draw_image(
        &mut self,
        source: &dyn RasterSource,
        placement: &ImagePlacement,
    ) -> CanvasResult<()> {
        PageCanvas::draw_image(self, source, placement)
    }

    fn set_paint(&mut self, paint: Paint) {
        PageCanvas::set_paint(self, paint);
    }

    fn set_stroke(&mut self, stroke: Stroke) {
        PageCanvas::set_stroke(self, stroke);
    }

    fn set_composite(&mut self, composite: Option<Composite>) {
        PageCanvas::set_composite(self, composite);
    }

    fn set_background(&mut self, color: Color) {
        PageCanvas::set_background(self, color);
    }

    fn set_font(&mut self, font: FontSpec) {
        PageCanvas::set_font(self, font);
    }

    fn set_transform(&mut self, transform: Matrix) {
        PageCanvas::set_transform(self, transform);
    }

    fn concat_transform(&mut self, other: &Matrix) {
        PageCanvas::concat_transform(self, other);
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        PageCanvas::translate(self, tx, ty);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        PageCanvas::scale(self, sx, sy);
    }

    fn rotate(&mut self, theta: f64) {
        PageCanvas::rotate(self, theta);
    }

    fn rotate_about(&mut self, theta: f64, x: f64, y: f64) {
        PageCanvas::rotate_about(self, theta, x, y);
    }

    fn shear(&mut self, shx: f64, shy: f64) {
        PageCanvas::shear(self, shx, shy);
    }

    fn create_child(&mut self) -> PageCanvas {
        PageCanvas::create_child(self)
    }

    fn dispose(&mut self) {
        PageCanvas::dispose(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shapes_canvas() -> PageCanvas {
        PageCanvas::shapes_only(100.0, 100.0)
    }

    #[test]
    fn test_convenience_shapes_route_through_draw_and_fill() {
        let mut canvas = shapes_canvas();
        canvas.draw_line(0.0, 0.0, 10.0, 10.0);
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0);
        canvas.draw_oval(0.0, 0.0, 10.0, 10.0);
        let content = String::from_utf8(canvas.content()).unwrap();
        assert!(content.contains("S\n"));
        assert!(content.contains("f\n"));
        assert!(content.contains("c\n"));
    }

    #[test]
    fn test_arc_kind_differs_between_draw_and_fill() {
        let mut drawn = shapes_canvas();
        drawn.draw_arc(0.0, 0.0, 40.0, 40.0, 0.0, 90.0);
        let drawn = String::from_utf8(drawn.content()).unwrap();

        let mut filled = shapes_canvas();
        filled.fill_arc(0.0, 0.0, 40.0, 40.0, 0.0, 90.0);
        let filled = String::from_utf8(filled.content()).unwrap();

        // an open arc has no closing segment; the pie is closed through
        // the center
        assert!(!drawn.trim_end().ends_with("h\nS"));
        assert!(filled.contains("h\nf\n"));
    }

    #[test]
    fn test_dynamic_dispatch_over_the_trait() {
        fn paint_badge(surface: &mut dyn Canvas) {
            surface.set_paint(Paint::Solid(Color::rgb(200, 30, 30)));
            surface.fill_oval(10.0, 10.0, 20.0, 20.0);
            surface.draw_polygon(&[(5.0, 5.0), (35.0, 5.0), (20.0, 30.0)]);
        }
        let mut canvas = shapes_canvas();
        paint_badge(&mut canvas);
        let content = String::from_utf8(canvas.content()).unwrap();
        assert!(content.contains("0.784314 0.117647 0.117647 rg\n"));
        assert!(content.contains("f\n"));
        assert!(content.contains("S\n"));
    }
}
