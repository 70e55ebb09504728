//! RGBA color values for canvas drawing.
//!
//! Colors arrive from the host with byte components and an alpha channel.
//! The alpha channel never reaches the content stream directly: it is
//! resolved into extended-graphics-state opacity by the paint translator.

/// An RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Opaque black (the default paint).
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    /// Opaque white (the default background).
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Neutral gray, used as the fallback when paint resolution fails.
    pub const GRAY: Color = Color::rgb(128, 128, 128);

    /// Create an opaque color from RGB byte values.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    /// Create a color from RGBA byte values.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// Return the same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Color { a, ..self }
    }

    /// Whether the color is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// RGB components normalized to the 0.0-1.0 range used by color operators.
    pub fn components(&self) -> (f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        )
    }

    /// Alpha after applying a source-over compositing factor.
    ///
    /// The color's own alpha byte is scaled by the composite alpha and
    /// rounded back to a byte, matching how a source-over blend would
    /// attenuate coverage.
    pub fn effective_alpha(&self, composite_alpha: f32) -> u8 {
        (self.a as f32 * composite_alpha).round().clamp(0.0, 255.0) as u8
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}
