//! The append-only content-stream sink.
//!
//! Every translator in the canvas layer emits through this writer. Output
//! is deterministic: numbers print as bare integers when they have no
//! fractional part and as 6-decimal trimmed literals otherwise, each
//! operator ends its own line, and save/restore depth is tracked so scope
//! discipline can be asserted.

use std::io::Write;

use crate::core::color::Color;
use crate::core::error::{CanvasError, CanvasResult};
use crate::core::matrix::Matrix;

use super::ops::Operator;

/// The append-only, save/restore-disciplined operator writer.
#[derive(Debug, Clone, Default)]
pub struct ContentStream {
    /// Raw operator bytes
    buffer: Vec<u8>,

    /// Current save/restore nesting depth
    depth: usize,
}

impl ContentStream {
    /// Create an empty content stream.
    pub fn new() -> Self {
        ContentStream {
            buffer: Vec::new(),
            depth: 0,
        }
    }

    /// The bytes emitted so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// The number of bytes emitted so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Current save/restore nesting depth.
    pub fn save_depth(&self) -> usize {
        self.depth
    }

    /// Consume the stream and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Replace the buffer wholesale (used when splicing child streams).
    pub(crate) fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.buffer = bytes;
    }

    /// The emitted bytes compressed with zlib (FlateDecode form).
    pub fn compressed(&self) -> CanvasResult<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&self.buffer)
            .map_err(|e| CanvasError::Generic(format!("Failed to compress content: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| CanvasError::Generic(format!("Failed to compress content: {}", e)))
    }

    // === Low-level emission helpers ===

    /// Append a number in canonical form.
    ///
    /// Integers print without a decimal point; other values print with up
    /// to six decimals, trailing zeros trimmed. Non-finite values collapse
    /// to zero rather than corrupting the stream.
    fn push_number(&mut self, n: f64) {
        if !n.is_finite() {
            self.buffer.push(b'0');
            return;
        }
        if n.fract() == 0.0 && n.abs() < 1e15 {
            let _ = write!(self.buffer, "{}", n as i64);
            return;
        }
        let mut s = format!("{:.6}", n);
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        if s == "-0" {
            s.truncate(0);
            s.push('0');
        }
        self.buffer.extend_from_slice(s.as_bytes());
    }

    /// Append a name with `#XX` escaping for delimiter characters.
    fn push_name(&mut self, name: &str) {
        self.buffer.push(b'/');
        for byte in name.bytes() {
            match byte {
                b'/' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'%' | b'#'
                | b' ' => {
                    let _ = write!(self.buffer, "#{:02X}", byte);
                }
                _ => self.buffer.push(byte),
            }
        }
    }

    /// Append an escaped literal string in parentheses.
    fn push_string(&mut self, s: &[u8]) {
        self.buffer.push(b'(');
        for &byte in s {
            match byte {
                b'(' => self.buffer.extend_from_slice(b"\\("),
                b')' => self.buffer.extend_from_slice(b"\\)"),
                b'\\' => self.buffer.extend_from_slice(b"\\\\"),
                b'\n' => self.buffer.extend_from_slice(b"\\n"),
                b'\r' => self.buffer.extend_from_slice(b"\\r"),
                b'\t' => self.buffer.extend_from_slice(b"\\t"),
                _ => self.buffer.push(byte),
            }
        }
        self.buffer.push(b')');
    }

    /// Append an operator with no operands.
    fn op(&mut self, op: Operator) {
        self.buffer.extend_from_slice(op.token().as_bytes());
        self.buffer.push(b'\n');
    }

    /// Append numeric operands followed by an operator.
    fn op_nums(&mut self, nums: &[f64], op: Operator) {
        for n in nums {
            self.push_number(*n);
            self.buffer.push(b' ');
        }
        self.op(op);
    }

    // === Graphics state ===

    /// Save the graphics state (`q`).
    pub fn save_state(&mut self) {
        self.depth += 1;
        self.op(Operator::SaveState);
    }

    /// Restore the graphics state (`Q`).
    pub fn restore_state(&mut self) {
        debug_assert!(self.depth > 0, "restore without matching save");
        self.depth = self.depth.saturating_sub(1);
        self.op(Operator::RestoreState);
    }

    /// Concatenate a matrix onto the current transformation (`cm`).
    pub fn concat_matrix(&mut self, m: &Matrix) {
        self.op_nums(&m.m, Operator::ConcatMatrix);
    }

    /// Set the line width (`w`).
    pub fn set_line_width(&mut self, width: f64) {
        self.op_nums(&[width], Operator::SetLineWidth);
    }

    /// Set the line cap code (`J`).
    pub fn set_line_cap(&mut self, cap: u8) {
        self.op_nums(&[cap as f64], Operator::SetLineCap);
    }

    /// Set the line join code (`j`).
    pub fn set_line_join(&mut self, join: u8) {
        self.op_nums(&[join as f64], Operator::SetLineJoin);
    }

    /// Set the miter limit (`M`).
    pub fn set_miter_limit(&mut self, limit: f64) {
        self.op_nums(&[limit], Operator::SetMiterLimit);
    }

    /// Set the dash pattern (`d`).
    ///
    /// An empty array with phase zero is the canonical "no dash" form,
    /// emitted as `[]0 d`.
    pub fn set_dash(&mut self, array: &[f64], phase: f64) {
        self.buffer.push(b'[');
        for v in array {
            self.push_number(*v);
            self.buffer.push(b' ');
        }
        self.buffer.push(b']');
        self.push_number(phase);
        self.buffer.push(b' ');
        self.op(Operator::SetDash);
    }

    /// Reference an extended graphics state resource (`gs`).
    pub fn set_ext_gstate(&mut self, name: &str) {
        self.push_name(name);
        self.buffer.push(b' ');
        self.op(Operator::SetExtGState);
    }

    // === Path construction ===

    /// Begin a subpath (`m`).
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.op_nums(&[x, y], Operator::MoveTo);
    }

    /// Line segment (`l`).
    pub fn line_to(&mut self, x: f64, y: f64) {
        self.op_nums(&[x, y], Operator::LineTo);
    }

    /// Cubic curve with two control points (`c`).
    pub fn curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.op_nums(&[c1x, c1y, c2x, c2y, x, y], Operator::CurveTo);
    }

    /// Cubic curve using the current point as first control point (`v`).
    pub fn curve_to_initial(&mut self, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.op_nums(&[c2x, c2y, x, y], Operator::CurveToInitial);
    }

    /// Close the current subpath (`h`).
    pub fn close_subpath(&mut self) {
        self.op(Operator::ClosePath);
    }

    /// Append a rectangle (`re`).
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.op_nums(&[x, y, width, height], Operator::Rectangle);
    }

    // === Path painting ===

    /// Stroke the path (`S`).
    pub fn stroke(&mut self) {
        self.op(Operator::Stroke);
    }

    /// Fill with the nonzero rule (`f`).
    pub fn fill(&mut self) {
        self.op(Operator::Fill);
    }

    /// Fill with the even-odd rule (`f*`).
    pub fn fill_even_odd(&mut self) {
        self.op(Operator::FillEvenOdd);
    }

    /// Intersect the clip with the path, nonzero rule (`W`).
    pub fn clip(&mut self) {
        self.op(Operator::Clip);
    }

    /// Intersect the clip with the path, even-odd rule (`W*`).
    pub fn clip_even_odd(&mut self) {
        self.op(Operator::ClipEvenOdd);
    }

    /// End the path without painting (`n`).
    pub fn end_path(&mut self) {
        self.op(Operator::EndPath);
    }

    // === Color ===

    /// Set the fill color (`rg`).
    pub fn set_fill_rgb(&mut self, color: Color) {
        let (r, g, b) = color.components();
        self.op_nums(&[r, g, b], Operator::SetFillRGB);
    }

    /// Set the stroke color (`RG`).
    pub fn set_stroke_rgb(&mut self, color: Color) {
        let (r, g, b) = color.components();
        self.op_nums(&[r, g, b], Operator::SetStrokeRGB);
    }

    /// Select the pattern color space and a pattern for filling
    /// (`/Pattern cs` + `/name scn`).
    pub fn set_fill_pattern(&mut self, name: &str) {
        self.push_name("Pattern");
        self.buffer.push(b' ');
        self.op(Operator::SetFillColorSpace);
        self.push_name(name);
        self.buffer.push(b' ');
        self.op(Operator::SetFillColorN);
    }

    /// Select the pattern color space and a pattern for stroking
    /// (`/Pattern CS` + `/name SCN`).
    pub fn set_stroke_pattern(&mut self, name: &str) {
        self.push_name("Pattern");
        self.buffer.push(b' ');
        self.op(Operator::SetStrokeColorSpace);
        self.push_name(name);
        self.buffer.push(b' ');
        self.op(Operator::SetStrokeColorN);
    }

    // === Text ===

    /// Begin a text object (`BT`).
    pub fn begin_text(&mut self) {
        self.op(Operator::BeginText);
    }

    /// End a text object (`ET`).
    pub fn end_text(&mut self) {
        self.op(Operator::EndText);
    }

    /// Set font resource and size (`Tf`).
    pub fn set_font(&mut self, name: &str, size: f64) {
        self.push_name(name);
        self.buffer.push(b' ');
        self.push_number(size);
        self.buffer.push(b' ');
        self.op(Operator::SetFont);
    }

    /// Set the text matrix (`Tm`).
    pub fn set_text_matrix(&mut self, m: &Matrix) {
        self.op_nums(&m.m, Operator::SetTextMatrix);
    }

    /// Set character spacing (`Tc`).
    pub fn set_char_spacing(&mut self, spacing: f64) {
        self.op_nums(&[spacing], Operator::SetCharSpacing);
    }

    /// Set horizontal scaling percentage (`Tz`).
    pub fn set_horizontal_scaling(&mut self, percent: f64) {
        self.op_nums(&[percent], Operator::SetHorizontalScaling);
    }

    /// Set the text rendering mode code (`Tr`).
    pub fn set_text_render_mode(&mut self, mode: u8) {
        self.op_nums(&[mode as f64], Operator::SetTextRenderMode);
    }

    /// Show an encoded text string (`Tj`).
    pub fn show_text(&mut self, encoded: &[u8]) {
        self.push_string(encoded);
        self.buffer.push(b' ');
        self.op(Operator::ShowText);
    }

    // === XObjects ===

    /// Invoke a named XObject (`Do`).
    pub fn invoke_xobject(&mut self, name: &str) {
        self.push_name(name);
        self.buffer.push(b' ');
        self.op(Operator::InvokeXObject);
    }
}
