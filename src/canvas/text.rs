//! Text run emission.
//!
//! A text run is placed by concatenating the translation to its origin
//! and the font's intrinsic transform onto the live transform, then
//! deriving a text matrix that undoes the device flip so glyphs render
//! upright. Styles the resolved face cannot provide are synthesized:
//! italic as a text-matrix shear, bold as a stroked fill. The advance
//! difference between the host's layout metric and the output font's
//! own metric is spread across the run as character spacing, keeping
//! line breaks where the host computed them.

use crate::core::color::Color;
use crate::core::error::CanvasResult;
use crate::core::matrix::Matrix;
use crate::core::path::Path;

use super::context::{CanvasCore, PageCanvas, PathDrawMode};
use super::stroke::{Stroke, StrokeStyle};

/// Divisor turning AFM metric units into text-space units.
const AFM_DIVISOR: f64 = 1000.0;

/// Underline thickness in AFM units, standing in for the value a font
/// descriptor would carry.
const UNDERLINE_THICKNESS: f64 = 50.0;

/// Slant for synthesized italics when the host has no angle, in degrees.
const DEFAULT_ITALIC_ANGLE: f64 = 15.0;

const TEXT_RENDER_FILL: u8 = 0;
const TEXT_RENDER_FILL_STROKE: u8 = 2;

impl CanvasCore {
    pub(crate) fn draw_text_run(&mut self, text: &str, x: f64, y: f64) -> CanvasResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.debug_check_splice_order();
        self.emit_fill_paint();

        if self.shapes_only {
            let font = self.shared.mapper.resolve(&self.font)?;
            match font.glyph_outline(text, self.font.size, x, y) {
                Some(outline) => self.follow_path(&outline, PathDrawMode::Fill),
                None => tracing::warn!(
                    "font {} cannot produce outlines, dropping text run",
                    font.postscript_name()
                ),
            }
            return Ok(());
        }

        let binding = self.ensure_binding()?;
        let size = self.font.size;
        let len = text.chars().count();

        let saved_transform = self.transform;
        let mut placed = saved_transform;
        placed.translate(x, y);
        placed.concat(&self.font.transform);
        self.set_transform(placed);

        let mut mx = Matrix::flip_y(self.height);
        mx.concat(&self.transform);
        mx.scale(1.0, -1.0);

        self.sink.begin_text();
        self.sink.set_font(binding.resource.as_str(), size);

        // A styled request that resolved to the plain face means no real
        // italic variant exists, so slant the text matrix instead. Fonts
        // whose descriptor already carries an angle render their own
        // slant.
        if self.font.italic && self.font.is_synthetic_style() {
            let host_angle = f64::from(self.font.italic_angle.unwrap_or(0.0));
            // host and device slants run in opposite directions
            let slant = if host_angle == 0.0 {
                DEFAULT_ITALIC_ANGLE
            } else {
                -host_angle
            };
            if binding.font.italic_angle() == 0.0 {
                mx.m[2] = slant / 100.0;
            }
        }
        self.sink.set_text_matrix(&mx);

        let width_attr = self.font.effective_width();
        if width_attr != super::fonts::WIDTH_REGULAR {
            self.sink.set_horizontal_scaling(100.0 / f64::from(width_attr));
        }

        // Fake boldness as a stroked fill unless the face itself is
        // bold already.
        let mut restore_render_mode = false;
        if !binding
            .font
            .postscript_name()
            .to_lowercase()
            .contains("bold")
        {
            let weight = self.font.effective_weight();
            if (self.font.bold || weight >= super::fonts::WEIGHT_SEMIBOLD)
                && self.font.is_synthetic_style()
            {
                let stroke_width =
                    size * f64::from(weight - super::fonts::WEIGHT_REGULAR) / 30.0;
                if stroke_width != 1.0 {
                    self.sink.set_text_render_mode(TEXT_RENDER_FILL_STROKE);
                    self.sink.set_line_width(stroke_width);
                    let color = self.paint.solid_color().unwrap_or(Color::BLACK);
                    self.sink.set_stroke_rgb(color);
                    // these writes bypass the diff trackers; reconcile
                    // them so the next stroke diffs against what the
                    // stream actually says
                    self.last_stroke.width = stroke_width;
                    self.last_stroke_paint = None;
                    restore_render_mode = true;
                }
            }
        }

        let measured = if size > 0.0 {
            self.shared
                .mapper
                .string_width(&self.font, text)
                .unwrap_or_else(|| binding.font.text_width(text, size))
        } else {
            0.0
        };
        if len > 1 {
            let adv = (measured - binding.font.text_width(text, size)) / (len - 1) as f64;
            self.sink.set_char_spacing(adv);
        }
        self.sink.show_text(&binding.font.encode(text));
        if len > 1 {
            self.sink.set_char_spacing(0.0);
        }
        if width_attr != super::fonts::WIDTH_REGULAR {
            self.sink.set_horizontal_scaling(100.0);
        }
        if restore_render_mode {
            self.sink.set_text_render_mode(TEXT_RENDER_FILL);
        }
        self.sink.end_text();
        self.set_transform(saved_transform);

        if self.font.underline {
            // underline geometry derives from the truncated point size,
            // matching the host metric convention
            let thickness = UNDERLINE_THICKNESS * f64::from(size as i32) / AFM_DIVISOR;
            let saved_stroke = self.stroke.clone();
            self.set_stroke(Stroke::Standard(StrokeStyle::new(thickness)));
            let line_y = y + thickness;
            self.follow_path(
                &Path::line(x, line_y, x + measured, line_y),
                PathDrawMode::Stroke,
            );
            self.set_stroke(saved_stroke);
        }
        Ok(())
    }
}

impl PageCanvas {
    /// Draw a text run with its baseline origin at `(x, y)`.
    ///
    /// Resolution errors from the font mapper surface here; nothing is
    /// emitted in that case.
    pub fn draw_text(&mut self, text: &str, x: f64, y: f64) -> CanvasResult<()> {
        self.lock().draw_text_run(text, x, y)
    }
}
