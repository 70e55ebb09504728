//! Path construction for canvas drawing.
//!
//! This module provides the geometric path model the canvas consumes.
//! Paths are built incrementally from move, line, quad, curve, and close
//! operations, carry a winding rule, and offer constructors for the common
//! host shapes (rectangles, ovals, arcs, round rectangles, polygons).

use std::fmt;

use super::matrix::Matrix;

/// Winding rule determining a path's interior for fill and clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindingRule {
    /// Nonzero winding number rule (default for most operations)
    NonZero,
    /// Even-odd rule
    EvenOdd,
}

impl Default for WindingRule {
    fn default() -> Self {
        WindingRule::NonZero
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from origin and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// The maximum x coordinate.
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    /// The maximum y coordinate.
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Intersect two rectangles, or `None` if they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());
        if max_x <= x || max_y <= y {
            return None;
        }
        Some(Rect::new(x, y, max_x - x, max_y - y))
    }
}

/// A path element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathElement {
    /// Move to a new point (starts a new subpath)
    MoveTo(f64, f64),
    /// Line to a point
    LineTo(f64, f64),
    /// Quadratic Bézier curve (qx, qy, x, y)
    QuadTo(f64, f64, f64, f64),
    /// Cubic Bézier curve (cp1x, cp1y, cp2x, cp2y, x, y)
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// Close the current subpath
    ClosePath,
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::MoveTo(x, y) => write!(f, "M {} {}", x, y),
            PathElement::LineTo(x, y) => write!(f, "L {} {}", x, y),
            PathElement::QuadTo(qx, qy, x, y) => write!(f, "Q {} {} {} {}", qx, qy, x, y),
            PathElement::CurveTo(cp1x, cp1y, cp2x, cp2y, x, y) => {
                write!(f, "C {} {} {} {} {} {}", cp1x, cp1y, cp2x, cp2y, x, y)
            }
            PathElement::ClosePath => write!(f, "Z"),
        }
    }
}

/// Kind of arc outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcKind {
    /// Leave the arc open (used when stroking)
    Open,
    /// Close with a straight chord between the endpoints
    Chord,
    /// Close through the ellipse center (used when filling)
    Pie,
}

// Cubic control distance for a quarter-circle arc: 4/3 * (sqrt(2) - 1)
const KAPPA: f64 = 0.552_284_749_830_793_4;

/// A geometric path with a winding rule.
///
/// Paths are composed of a sequence of path elements (move, line, quad,
/// curve, close). Quadratic segments are kept as-is; the emission layer
/// writes them in the shorthand cubic operator form.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// The path elements
    elements: Vec<PathElement>,

    /// Winding rule used when the path is filled or clipped
    winding: WindingRule,

    /// Current point (if any)
    current_point: Option<(f64, f64)>,

    /// Start of the current subpath (for close operations)
    subpath_start: Option<(f64, f64)>,

    /// Whether we have an open subpath
    has_open_subpath: bool,
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl Path {
    /// Create a new empty path with the nonzero winding rule.
    pub fn new() -> Self {
        Path {
            elements: Vec::new(),
            winding: WindingRule::NonZero,
            current_point: None,
            subpath_start: None,
            has_open_subpath: false,
        }
    }

    /// Set the winding rule, consuming and returning the path.
    pub fn with_winding(mut self, winding: WindingRule) -> Self {
        self.winding = winding;
        self
    }

    /// Set the winding rule in place.
    pub fn set_winding(&mut self, winding: WindingRule) {
        self.winding = winding;
    }

    /// Get the winding rule.
    pub fn winding(&self) -> WindingRule {
        self.winding
    }

    /// Move to a new point, starting a new subpath.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.elements.push(PathElement::MoveTo(x, y));
        self.current_point = Some((x, y));
        self.subpath_start = Some((x, y));
        self.has_open_subpath = false;
    }

    /// Add a line segment from the current point to (x, y).
    pub fn line_to(&mut self, x: f64, y: f64) {
        // If we don't have a current point, implicit move
        if self.current_point.is_none() {
            self.move_to(x, y);
            return;
        }

        self.elements.push(PathElement::LineTo(x, y));
        self.current_point = Some((x, y));
        self.has_open_subpath = true;
    }

    /// Add a quadratic Bézier curve with control point (qx, qy).
    pub fn quad_to(&mut self, qx: f64, qy: f64, x: f64, y: f64) {
        if self.current_point.is_none() {
            self.move_to(qx, qy);
        }

        self.elements.push(PathElement::QuadTo(qx, qy, x, y));
        self.current_point = Some((x, y));
        self.has_open_subpath = true;
    }

    /// Add a cubic Bézier curve.
    ///
    /// # Arguments
    /// * `cp1x, cp1y` - First control point
    /// * `cp2x, cp2y` - Second control point
    /// * `x, y` - End point
    pub fn curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        if self.current_point.is_none() {
            self.move_to(cp1x, cp1y);
        }

        self.elements
            .push(PathElement::CurveTo(cp1x, cp1y, cp2x, cp2y, x, y));
        self.current_point = Some((x, y));
        self.has_open_subpath = true;
    }

    /// Append a rectangle as a closed subpath.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
    }

    /// Close the current subpath.
    pub fn close_path(&mut self) {
        if self.has_open_subpath {
            self.elements.push(PathElement::ClosePath);
            if let Some(start) = self.subpath_start {
                self.current_point = Some(start);
            }
            self.has_open_subpath = false;
        }
    }

    /// Get the current point.
    pub fn current_point(&self) -> Option<(f64, f64)> {
        self.current_point
    }

    /// Get the path elements.
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get the number of elements in the path.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Return the path with every coordinate mapped through `m`.
    ///
    /// The winding rule is preserved. Control points transform like end
    /// points since affine maps take Bézier control polygons to control
    /// polygons.
    pub fn transform(&self, m: &Matrix) -> Path {
        let mut out = Path::new();
        out.winding = self.winding;
        for el in &self.elements {
            match *el {
                PathElement::MoveTo(x, y) => {
                    let (x, y) = m.apply(x, y);
                    out.move_to(x, y);
                }
                PathElement::LineTo(x, y) => {
                    let (x, y) = m.apply(x, y);
                    out.line_to(x, y);
                }
                PathElement::QuadTo(qx, qy, x, y) => {
                    let (qx, qy) = m.apply(qx, qy);
                    let (x, y) = m.apply(x, y);
                    out.quad_to(qx, qy, x, y);
                }
                PathElement::CurveTo(c1x, c1y, c2x, c2y, x, y) => {
                    let (c1x, c1y) = m.apply(c1x, c1y);
                    let (c2x, c2y) = m.apply(c2x, c2y);
                    let (x, y) = m.apply(x, y);
                    out.curve_to(c1x, c1y, c2x, c2y, x, y);
                }
                PathElement::ClosePath => out.close_path(),
            }
        }
        out
    }

    /// Get the bounding box of the path.
    ///
    /// Control points are included, so the box is conservative for curved
    /// segments.
    pub fn bounding_box(&self) -> Option<Rect> {
        if self.elements.is_empty() {
            return None;
        }

        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        let mut include = |x: f64, y: f64| {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        };

        for el in &self.elements {
            match *el {
                PathElement::MoveTo(x, y) | PathElement::LineTo(x, y) => include(x, y),
                PathElement::QuadTo(qx, qy, x, y) => {
                    include(qx, qy);
                    include(x, y);
                }
                PathElement::CurveTo(c1x, c1y, c2x, c2y, x, y) => {
                    include(c1x, c1y);
                    include(c2x, c2y);
                    include(x, y);
                }
                PathElement::ClosePath => {}
            }
        }

        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    // === Shape constructors ===

    /// A single line segment.
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Path {
        let mut p = Path::new();
        p.move_to(x1, y1);
        p.line_to(x2, y2);
        p
    }

    /// A closed rectangle.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Path {
        let mut p = Path::new();
        p.rect(x, y, width, height);
        p
    }

    /// An ellipse inscribed in the given rectangle, built from four cubic
    /// quarter arcs.
    pub fn oval(x: f64, y: f64, width: f64, height: f64) -> Path {
        let mut p = Path::arc(x, y, width, height, 0.0, 360.0, ArcKind::Chord);
        p.close_path();
        p
    }

    /// An elliptical arc inscribed in the given rectangle.
    ///
    /// Angles are in degrees, measured from the positive x axis toward the
    /// rectangle's top edge (the host shape convention: the parametric point
    /// is `(cx + rx*cos(t), cy - ry*sin(t))`).
    pub fn arc(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        start_deg: f64,
        extent_deg: f64,
        kind: ArcKind,
    ) -> Path {
        let rx = width / 2.0;
        let ry = height / 2.0;
        let cx = x + rx;
        let cy = y + ry;

        let extent = extent_deg.clamp(-360.0, 360.0);
        let start = start_deg.to_radians();
        let sweep = extent.to_radians();

        let point = |t: f64| (cx + rx * t.cos(), cy - ry * t.sin());
        let tangent = |t: f64| (-rx * t.sin(), -ry * t.cos());

        let mut p = Path::new();
        let (sx, sy) = point(start);
        p.move_to(sx, sy);

        let segments = (sweep.abs() / std::f64::consts::FRAC_PI_2).ceil().max(1.0) as usize;
        let step = sweep / segments as f64;
        let alpha = 4.0 / 3.0 * (step / 4.0).tan();

        let mut t0 = start;
        for _ in 0..segments {
            let t1 = t0 + step;
            let (p0x, p0y) = point(t0);
            let (p1x, p1y) = point(t1);
            let (d0x, d0y) = tangent(t0);
            let (d1x, d1y) = tangent(t1);
            p.curve_to(
                p0x + alpha * d0x,
                p0y + alpha * d0y,
                p1x - alpha * d1x,
                p1y - alpha * d1y,
                p1x,
                p1y,
            );
            t0 = t1;
        }

        match kind {
            ArcKind::Open => {}
            ArcKind::Chord => p.close_path(),
            ArcKind::Pie => {
                p.line_to(cx, cy);
                p.close_path();
            }
        }
        p
    }

    /// A rectangle with elliptical corners of the given arc width/height.
    pub fn round_rect(x: f64, y: f64, width: f64, height: f64, arc_w: f64, arc_h: f64) -> Path {
        let aw = arc_w.abs().min(width) / 2.0;
        let ah = arc_h.abs().min(height) / 2.0;
        if aw == 0.0 || ah == 0.0 {
            return Path::rectangle(x, y, width, height);
        }

        let kx = KAPPA * aw;
        let ky = KAPPA * ah;
        let (x1, y1) = (x + width, y + height);

        let mut p = Path::new();
        p.move_to(x + aw, y);
        p.line_to(x1 - aw, y);
        p.curve_to(x1 - aw + kx, y, x1, y + ah - ky, x1, y + ah);
        p.line_to(x1, y1 - ah);
        p.curve_to(x1, y1 - ah + ky, x1 - aw + kx, y1, x1 - aw, y1);
        p.line_to(x + aw, y1);
        p.curve_to(x + aw - kx, y1, x, y1 - ah + ky, x, y1 - ah);
        p.line_to(x, y + ah);
        p.curve_to(x, y + ah - ky, x + aw - kx, y, x + aw, y);
        p.close_path();
        p
    }

    /// An open polyline through the given points.
    pub fn polyline(points: &[(f64, f64)]) -> Path {
        let mut p = Path::new();
        let mut iter = points.iter();
        if let Some(&(x, y)) = iter.next() {
            p.move_to(x, y);
            for &(x, y) in iter {
                p.line_to(x, y);
            }
        }
        p
    }

    /// A closed polygon through the given points.
    pub fn polygon(points: &[(f64, f64)]) -> Path {
        let mut p = Path::polyline(points);
        p.close_path();
        p
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for el in &self.elements {
            write!(f, "{} ", el)?;
        }
        Ok(())
    }
}

/// Builder for constructing paths.
pub struct PathBuilder {
    path: Path,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBuilder {
    /// Create a new path builder.
    pub fn new() -> Self {
        PathBuilder { path: Path::new() }
    }

    /// Set the winding rule.
    pub fn winding(&mut self, winding: WindingRule) -> &mut Self {
        self.path.set_winding(winding);
        self
    }

    /// Move to a point.
    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.path.move_to(x, y);
        self
    }

    /// Add a line segment.
    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.path.line_to(x, y);
        self
    }

    /// Add a quadratic Bézier curve.
    pub fn quad_to(&mut self, qx: f64, qy: f64, x: f64, y: f64) -> &mut Self {
        self.path.quad_to(qx, qy, x, y);
        self
    }

    /// Add a cubic Bézier curve.
    pub fn curve_to(
        &mut self,
        cp1x: f64,
        cp1y: f64,
        cp2x: f64,
        cp2y: f64,
        x: f64,
        y: f64,
    ) -> &mut Self {
        self.path.curve_to(cp1x, cp1y, cp2x, cp2y, x, y);
        self
    }

    /// Add a rectangle.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.path.rect(x, y, width, height);
        self
    }

    /// Close the current subpath.
    pub fn close(&mut self) -> &mut Self {
        self.path.close_path();
        self
    }

    /// Build and return the path.
    pub fn build(&self) -> Path {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path() {
        let path = Path::new();
        assert!(path.is_empty());
        assert_eq!(path.len(), 0);
        assert_eq!(path.winding(), WindingRule::NonZero);
    }

    #[test]
    fn test_move_line_close() {
        let mut path = Path::new();
        path.move_to(10.0, 20.0);
        path.line_to(30.0, 40.0);
        path.close_path();
        assert_eq!(path.current_point(), Some((10.0, 20.0)));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_rect_elements() {
        let path = Path::rectangle(10.0, 20.0, 100.0, 50.0);
        assert_eq!(path.len(), 5); // move + 3 lines + close
        assert_eq!(
            path.bounding_box(),
            Some(Rect::new(10.0, 20.0, 100.0, 50.0))
        );
    }

    #[test]
    fn test_implicit_move_to() {
        let mut path = Path::new();
        path.line_to(30.0, 40.0);
        assert_eq!(path.current_point(), Some((30.0, 40.0)));
    }

    #[test]
    fn test_transform_preserves_winding() {
        let path = Path::rectangle(0.0, 0.0, 10.0, 10.0).with_winding(WindingRule::EvenOdd);
        let moved = path.transform(&Matrix::translation(5.0, 5.0));
        assert_eq!(moved.winding(), WindingRule::EvenOdd);
        assert_eq!(
            moved.bounding_box(),
            Some(Rect::new(5.0, 5.0, 10.0, 10.0))
        );
    }

    #[test]
    fn test_oval_starts_at_right_edge() {
        let oval = Path::oval(0.0, 0.0, 20.0, 10.0);
        match oval.elements()[0] {
            PathElement::MoveTo(x, y) => {
                assert_eq!(x, 20.0);
                assert_eq!(y, 5.0);
            }
            _ => panic!("oval must start with a move"),
        }
        // Four quarter arcs plus the closing element
        assert_eq!(oval.len(), 6);
    }

    #[test]
    fn test_arc_quarter_endpoint() {
        // Quarter arc of the unit-circle-like ellipse in a 2x2 box at origin
        let arc = Path::arc(-1.0, -1.0, 2.0, 2.0, 0.0, 90.0, ArcKind::Open);
        let last = *arc.elements().last().unwrap();
        match last {
            PathElement::CurveTo(_, _, _, _, x, y) => {
                assert!((x - 0.0).abs() < 1e-9);
                assert!((y - -1.0).abs() < 1e-9);
            }
            _ => panic!("arc must end with a curve"),
        }
    }

    #[test]
    fn test_pie_closes_through_center() {
        let pie = Path::arc(0.0, 0.0, 10.0, 10.0, 0.0, 90.0, ArcKind::Pie);
        let elements = pie.elements();
        assert_eq!(elements[elements.len() - 1], PathElement::ClosePath);
        assert_eq!(elements[elements.len() - 2], PathElement::LineTo(5.0, 5.0));
    }

    #[test]
    fn test_round_rect_degenerate_arc() {
        let p = Path::round_rect(0.0, 0.0, 10.0, 10.0, 0.0, 0.0);
        assert_eq!(p, Path::rectangle(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_polygon_closes() {
        let p = Path::polygon(&[(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)]);
        assert_eq!(p.len(), 4);
        assert_eq!(*p.elements().last().unwrap(), PathElement::ClosePath);
    }

    #[test]
    fn test_path_builder() {
        let mut builder = PathBuilder::new();
        builder
            .winding(WindingRule::EvenOdd)
            .move_to(10.0, 20.0)
            .quad_to(20.0, 30.0, 30.0, 40.0)
            .close();

        let path = builder.build();
        assert_eq!(path.len(), 3);
        assert_eq!(path.winding(), WindingRule::EvenOdd);
    }
}
