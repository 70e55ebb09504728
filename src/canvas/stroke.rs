//! Stroke model and state-diff emission.
//!
//! Stroke attributes live in user space on the canvas; the emitted
//! attributes are their device-space derivation (scaled by the uniform
//! scale factor of the current transform). Attribute operators are only
//! emitted for fields that differ from the last emitted state, in a fixed
//! order: width, cap, join, miter limit, dash.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::content::stream::ContentStream;
use crate::core::matrix::Matrix;
use crate::core::path::Path;

/// Line cap style. Codes match the emitted cap operator operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt = 0,
    Round = 1,
    Square = 2,
}

impl LineCap {
    /// Operator operand for this cap.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Cap for a host cap code. Unrecognized codes map to `Round`.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => LineCap::Butt,
            2 => LineCap::Square,
            _ => LineCap::Round,
        }
    }
}

impl Default for LineCap {
    /// The host toolkit's standard stroke uses square caps.
    fn default() -> Self {
        LineCap::Square
    }
}

/// Line join style. Codes match the emitted join operator operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Miter = 0,
    Round = 1,
    Bevel = 2,
}

impl LineJoin {
    /// Operator operand for this join.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Join for a host join code. Unrecognized codes map to `Round`.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => LineJoin::Miter,
            2 => LineJoin::Bevel,
            _ => LineJoin::Round,
        }
    }
}

impl Default for LineJoin {
    /// The host toolkit's standard stroke uses miter joins.
    fn default() -> Self {
        LineJoin::Miter
    }
}

/// A standard stroke: width, cap, join, miter limit, and optional dash.
///
/// An empty dash array means a solid line.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    pub dash: SmallVec<[f64; 6]>,
    pub dash_phase: f64,
}

impl StrokeStyle {
    /// A stroke of the given width with default cap, join, and miter.
    pub fn new(width: f64) -> Self {
        StrokeStyle {
            width,
            cap: LineCap::default(),
            join: LineJoin::default(),
            miter_limit: 10.0,
            dash: SmallVec::new(),
            dash_phase: 0.0,
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_miter_limit(mut self, limit: f64) -> Self {
        self.miter_limit = limit;
        self
    }

    pub fn with_dash(mut self, dash: &[f64], phase: f64) -> Self {
        self.dash = SmallVec::from_slice(dash);
        self.dash_phase = phase;
        self
    }

    /// Whether a dash pattern is set.
    pub fn has_dash(&self) -> bool {
        !self.dash.is_empty()
    }

    /// This stroke scaled into device space by a uniform factor.
    ///
    /// Width, dash elements, and dash phase scale; cap, join, and miter
    /// limit do not.
    pub fn scaled(&self, factor: f64) -> StrokeStyle {
        StrokeStyle {
            width: self.width * factor,
            cap: self.cap,
            join: self.join,
            miter_limit: self.miter_limit,
            dash: self.dash.iter().map(|v| v * factor).collect(),
            dash_phase: self.dash_phase * factor,
        }
    }
}

impl Default for StrokeStyle {
    /// Matches the host toolkit's no-argument stroke: width 1, square
    /// cap, miter join, miter limit 10, no dash.
    fn default() -> Self {
        StrokeStyle::new(1.0)
    }
}

/// A host-defined stroke that cannot be expressed with the standard
/// attributes. The host converts the stroked outline into a fillable
/// path; strokes using this are rendered as fills of that outline.
pub trait StrokeOutline: Send + Sync {
    /// The outline of `path` stroked with this stroke, as a fillable
    /// path in the same coordinate space.
    fn outline(&self, path: &Path) -> Path;
}

/// The active stroke: either standard attributes or a host outline
/// generator.
#[derive(Clone)]
pub enum Stroke {
    Standard(StrokeStyle),
    Outline(Arc<dyn StrokeOutline>),
}

impl Stroke {
    /// The standard attributes, if this is a standard stroke.
    pub fn style(&self) -> Option<&StrokeStyle> {
        match self {
            Stroke::Standard(style) => Some(style),
            Stroke::Outline(_) => None,
        }
    }

    /// This stroke carried into device space under `transform`.
    ///
    /// Standard strokes scale by the uniform scale factor `√|det|`;
    /// outline strokes pass through unchanged because the host flattens
    /// them in user space.
    pub fn transformed(&self, transform: &Matrix) -> Stroke {
        match self {
            Stroke::Standard(style) => {
                Stroke::Standard(style.scaled(transform.uniform_scale()))
            }
            Stroke::Outline(outline) => Stroke::Outline(Arc::clone(outline)),
        }
    }
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke::Standard(StrokeStyle::default())
    }
}

impl std::fmt::Debug for Stroke {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stroke::Standard(style) => f.debug_tuple("Standard").field(style).finish(),
            Stroke::Outline(_) => f.debug_tuple("Outline").field(&"..").finish(),
        }
    }
}

impl PartialEq for Stroke {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Stroke::Standard(a), Stroke::Standard(b)) => a == b,
            (Stroke::Outline(a), Stroke::Outline(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Emit the attribute operators needed to move from `old` to `new`.
///
/// With no prior state every attribute is emitted, which is how a fresh
/// scope establishes its stroke baseline. Emission order is fixed:
/// width, cap, join, miter limit, dash.
pub fn emit_stroke_diff(sink: &mut ContentStream, new: &StrokeStyle, old: Option<&StrokeStyle>) {
    if old == Some(new) {
        return;
    }
    if old.map_or(true, |o| o.width != new.width) {
        sink.set_line_width(new.width);
    }
    if old.map_or(true, |o| o.cap != new.cap) {
        sink.set_line_cap(new.cap.code());
    }
    if old.map_or(true, |o| o.join != new.join) {
        sink.set_line_join(new.join.code());
    }
    if old.map_or(true, |o| o.miter_limit != new.miter_limit) {
        sink.set_miter_limit(new.miter_limit);
    }
    let make_dash = match old {
        None => true,
        Some(o) => {
            if new.has_dash() {
                o.dash_phase != new.dash_phase || o.dash != new.dash
            } else {
                o.has_dash()
            }
        }
    };
    if make_dash {
        sink.set_dash(&new.dash, new.dash_phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(sink: &ContentStream) -> String {
        String::from_utf8(sink.bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_baseline_emits_everything() {
        let mut sink = ContentStream::new();
        emit_stroke_diff(&mut sink, &StrokeStyle::default(), None);
        assert_eq!(text(&sink), "1 w\n2 J\n0 j\n10 M\n[]0 d\n");
    }

    #[test]
    fn test_identical_stroke_emits_nothing() {
        let mut sink = ContentStream::new();
        let style = StrokeStyle::new(3.0).with_dash(&[4.0, 2.0], 1.0);
        emit_stroke_diff(&mut sink, &style, Some(&style.clone()));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_width_only_change() {
        let mut sink = ContentStream::new();
        let old = StrokeStyle::default();
        let new = StrokeStyle::new(2.5);
        emit_stroke_diff(&mut sink, &new, Some(&old));
        assert_eq!(text(&sink), "2.5 w\n");
    }

    #[test]
    fn test_dash_set_then_cleared() {
        let mut sink = ContentStream::new();
        let dashed = StrokeStyle::new(1.0).with_dash(&[3.0, 2.0], 0.0);
        emit_stroke_diff(&mut sink, &dashed, Some(&StrokeStyle::default()));
        assert_eq!(text(&sink), "[3 2 ]0 d\n");

        let mut sink = ContentStream::new();
        emit_stroke_diff(&mut sink, &StrokeStyle::default(), Some(&dashed));
        assert_eq!(text(&sink), "[]0 d\n");
    }

    #[test]
    fn test_same_dash_not_reemitted() {
        let mut sink = ContentStream::new();
        let a = StrokeStyle::new(1.0).with_dash(&[5.0, 1.0], 2.0);
        let b = StrokeStyle::new(2.0).with_dash(&[5.0, 1.0], 2.0);
        emit_stroke_diff(&mut sink, &b, Some(&a));
        assert_eq!(text(&sink), "2 w\n");
    }

    #[test]
    fn test_phase_change_reemits_dash() {
        let mut sink = ContentStream::new();
        let a = StrokeStyle::new(1.0).with_dash(&[5.0, 1.0], 0.0);
        let b = StrokeStyle::new(1.0).with_dash(&[5.0, 1.0], 2.5);
        emit_stroke_diff(&mut sink, &b, Some(&a));
        assert_eq!(text(&sink), "[5 1 ]2.5 d\n");
    }

    #[test]
    fn test_unrecognized_codes_map_to_round() {
        assert_eq!(LineCap::from_code(7), LineCap::Round);
        assert_eq!(LineJoin::from_code(9), LineJoin::Round);
        assert_eq!(LineCap::from_code(0), LineCap::Butt);
        assert_eq!(LineJoin::from_code(2), LineJoin::Bevel);
    }

    #[test]
    fn test_scaled_stroke() {
        let style = StrokeStyle::new(2.0).with_dash(&[4.0, 1.0], 3.0);
        let scaled = style.scaled(2.0);
        assert_eq!(scaled.width, 4.0);
        assert_eq!(scaled.dash.as_slice(), &[8.0, 2.0]);
        assert_eq!(scaled.dash_phase, 6.0);
        assert_eq!(scaled.cap, style.cap);
        assert_eq!(scaled.miter_limit, 10.0);
    }

    #[test]
    fn test_transformed_uses_uniform_scale() {
        let stroke = Stroke::Standard(StrokeStyle::new(2.0));
        let t = Matrix::scaling(3.0, 3.0);
        match stroke.transformed(&t) {
            Stroke::Standard(style) => assert!((style.width - 6.0).abs() < 1e-9),
            Stroke::Outline(_) => panic!("expected standard stroke"),
        }
    }
}
