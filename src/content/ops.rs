//! Content-stream operator vocabulary.
//!
//! This module defines the operators the canvas emits, with their
//! content-stream tokens. Only the write-side vocabulary is covered;
//! operators the translator never produces are not represented.

use std::fmt;

/// A content-stream operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    // === Graphics State Operators ===
    /// q - Save graphics state
    SaveState,
    /// Q - Restore graphics state
    RestoreState,
    /// cm - Concatenate matrix to current transformation matrix
    ConcatMatrix,
    /// w - Set line width
    SetLineWidth,
    /// J - Set line cap style
    SetLineCap,
    /// j - Set line join style
    SetLineJoin,
    /// M - Set miter limit
    SetMiterLimit,
    /// d - Set dash pattern
    SetDash,
    /// gs - Set parameters from extended graphics state dictionary
    SetExtGState,

    // === Path Construction Operators ===
    /// m - Begin new subpath
    MoveTo,
    /// l - Append straight line segment
    LineTo,
    /// c - Append cubic Bézier curve (two control points)
    CurveTo,
    /// v - Append cubic Bézier curve (current point as first control)
    CurveToInitial,
    /// h - Close subpath
    ClosePath,
    /// re - Append rectangle
    Rectangle,

    // === Path Painting Operators ===
    /// S - Stroke path
    Stroke,
    /// f - Fill path using nonzero winding rule
    Fill,
    /// f* - Fill path using even-odd rule
    FillEvenOdd,
    /// W - Set clipping path using nonzero winding rule
    Clip,
    /// W* - Set clipping path using even-odd rule
    ClipEvenOdd,
    /// n - End path without filling or stroking
    EndPath,

    // === Color Operators ===
    /// rg - Set RGB color for filling
    SetFillRGB,
    /// RG - Set RGB color for stroking
    SetStrokeRGB,
    /// cs - Set color space for filling
    SetFillColorSpace,
    /// CS - Set color space for stroking
    SetStrokeColorSpace,
    /// scn - Set fill color (pattern-capable form)
    SetFillColorN,
    /// SCN - Set stroke color (pattern-capable form)
    SetStrokeColorN,

    // === Text Operators ===
    /// BT - Begin text object
    BeginText,
    /// ET - End text object
    EndText,
    /// Tf - Set font and size
    SetFont,
    /// Tm - Set text matrix
    SetTextMatrix,
    /// Tc - Set character spacing
    SetCharSpacing,
    /// Tz - Set horizontal scaling
    SetHorizontalScaling,
    /// Tr - Set text rendering mode
    SetTextRenderMode,
    /// Tj - Show text string
    ShowText,

    // === XObject Operators ===
    /// Do - Invoke named XObject
    InvokeXObject,
}

impl Operator {
    /// The operator token as it appears in a content stream.
    pub fn token(&self) -> &'static str {
        match self {
            Operator::SaveState => "q",
            Operator::RestoreState => "Q",
            Operator::ConcatMatrix => "cm",
            Operator::SetLineWidth => "w",
            Operator::SetLineCap => "J",
            Operator::SetLineJoin => "j",
            Operator::SetMiterLimit => "M",
            Operator::SetDash => "d",
            Operator::SetExtGState => "gs",
            Operator::MoveTo => "m",
            Operator::LineTo => "l",
            Operator::CurveTo => "c",
            Operator::CurveToInitial => "v",
            Operator::ClosePath => "h",
            Operator::Rectangle => "re",
            Operator::Stroke => "S",
            Operator::Fill => "f",
            Operator::FillEvenOdd => "f*",
            Operator::Clip => "W",
            Operator::ClipEvenOdd => "W*",
            Operator::EndPath => "n",
            Operator::SetFillRGB => "rg",
            Operator::SetStrokeRGB => "RG",
            Operator::SetFillColorSpace => "cs",
            Operator::SetStrokeColorSpace => "CS",
            Operator::SetFillColorN => "scn",
            Operator::SetStrokeColorN => "SCN",
            Operator::BeginText => "BT",
            Operator::EndText => "ET",
            Operator::SetFont => "Tf",
            Operator::SetTextMatrix => "Tm",
            Operator::SetCharSpacing => "Tc",
            Operator::SetHorizontalScaling => "Tz",
            Operator::SetTextRenderMode => "Tr",
            Operator::ShowText => "Tj",
            Operator::InvokeXObject => "Do",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}
