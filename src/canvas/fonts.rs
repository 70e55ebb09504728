//! Logical font descriptors and the font-resolution seam.
//!
//! The canvas never touches font files. A [`FontSpec`] describes what the
//! host asked for; a [`FontMapper`] turns it into an [`OutputFont`] that
//! can name itself, measure text, and encode show-text bytes. Resolution
//! results are cached per descriptor in a lock-guarded map shared by a
//! root context and all of its children.

use std::sync::Arc;

use crate::content::resources::ResourceName;
use crate::core::error::CanvasResult;
use crate::core::matrix::Matrix;
use crate::core::path::Path;

/// Weight of a regular face, on the host attribute scale.
pub const WEIGHT_REGULAR: f32 = 1.0;

/// Weight at which boldness synthesis kicks in.
pub const WEIGHT_SEMIBOLD: f32 = 1.25;

/// Weight of a bold face.
pub const WEIGHT_BOLD: f32 = 2.0;

/// Width attribute of a regular face.
pub const WIDTH_REGULAR: f32 = 1.0;

/// A logical font descriptor as the host sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Family name requested by the host
    pub family: String,

    /// Concrete face name, when the host substituted a styled variant
    pub face_name: Option<String>,

    /// Point size
    pub size: f64,

    pub bold: bool,
    pub italic: bool,
    pub underline: bool,

    /// Host weight attribute, when set explicitly
    pub weight: Option<f32>,

    /// Host width attribute, when set explicitly
    pub width: Option<f32>,

    /// Host italic angle, when the style system knows one
    pub italic_angle: Option<f32>,

    /// Intrinsic glyph transform
    pub transform: Matrix,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        FontSpec {
            family: family.into(),
            face_name: None,
            size,
            bold: false,
            italic: false,
            underline: false,
            weight: None,
            width: None,
            italic_angle: None,
            transform: Matrix::IDENTITY,
        }
    }

    pub fn with_face_name(mut self, face: impl Into<String>) -> Self {
        self.face_name = Some(face.into());
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_italic_angle(mut self, angle: f32) -> Self {
        self.italic_angle = Some(angle);
        self
    }

    pub fn with_transform(mut self, transform: Matrix) -> Self {
        self.transform = transform;
        self
    }

    /// The face the descriptor resolves to, falling back to the family.
    pub fn resolved_face(&self) -> &str {
        self.face_name.as_deref().unwrap_or(&self.family)
    }

    /// Whether style flags must be synthesized because no distinct
    /// styled face was substituted for this descriptor.
    pub fn is_synthetic_style(&self) -> bool {
        self.resolved_face() == self.family
    }

    /// Weight, defaulting from the bold flag.
    pub fn effective_weight(&self) -> f32 {
        self.weight
            .unwrap_or(if self.bold { WEIGHT_BOLD } else { WEIGHT_REGULAR })
    }

    /// Width attribute, defaulting to regular.
    pub fn effective_width(&self) -> f32 {
        self.width.unwrap_or(WIDTH_REGULAR)
    }

    /// Key under which resolution results are cached.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}{}",
            self.resolved_face(),
            if self.bold { "b" } else { "" },
            if self.italic { "i" } else { "" },
        )
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        FontSpec::new("sans-serif", 12.0)
    }
}

/// A resolved output font that can measure and encode text.
pub trait OutputFont: Send + Sync {
    /// PostScript name of the font program.
    fn postscript_name(&self) -> &str;

    /// Italic angle from the font's own descriptor, in degrees.
    fn italic_angle(&self) -> f64 {
        0.0
    }

    /// Width of `text` at `size`, in user units.
    fn text_width(&self, text: &str, size: f64) -> f64;

    /// Bytes the show-text operator consumes for `text`.
    ///
    /// The default maps code points up to U+00FF to single bytes and
    /// everything else to `?`.
    fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .map(|c| {
                let cp = c as u32;
                if cp <= 0xFF { cp as u8 } else { b'?' }
            })
            .collect()
    }

    /// Outline of `text` with its baseline origin at `(x, y)`, for
    /// shapes-only rendering. `None` when the font cannot produce
    /// outlines.
    fn glyph_outline(&self, _text: &str, _size: f64, _x: f64, _y: f64) -> Option<Path> {
        None
    }
}

/// Resolves logical descriptors to output fonts.
pub trait FontMapper: Send + Sync {
    fn resolve(&self, spec: &FontSpec) -> CanvasResult<Arc<dyn OutputFont>>;

    /// Host-measured layout width of `text`, when the host has a layout
    /// engine of its own. `None` falls back to the output font's
    /// metrics.
    fn string_width(&self, _spec: &FontSpec, _text: &str) -> Option<f64> {
        None
    }
}

/// A resolved font together with its page resource name.
#[derive(Clone)]
pub struct FontBinding {
    pub font: Arc<dyn OutputFont>,
    pub resource: ResourceName,
}

impl std::fmt::Debug for FontBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBinding")
            .field("font", &self.font.postscript_name())
            .field("resource", &self.resource)
            .finish()
    }
}

/// An output font with one fixed advance per character.
///
/// Good enough for tests and for hosts that only need deterministic
/// layout.
#[derive(Debug, Clone)]
pub struct FixedMetricsFont {
    name: String,

    /// Advance per character in 1/1000 em
    advance: f64,

    italic_angle: f64,
}

impl FixedMetricsFont {
    pub fn new(name: impl Into<String>, advance: f64) -> Self {
        FixedMetricsFont {
            name: name.into(),
            advance,
            italic_angle: 0.0,
        }
    }

    pub fn with_italic_angle(mut self, angle: f64) -> Self {
        self.italic_angle = angle;
        self
    }
}

impl OutputFont for FixedMetricsFont {
    fn postscript_name(&self) -> &str {
        &self.name
    }

    fn italic_angle(&self) -> f64 {
        self.italic_angle
    }

    fn text_width(&self, text: &str, size: f64) -> f64 {
        text.chars().count() as f64 * self.advance * size / 1000.0
    }
}

/// A mapper that resolves every descriptor to a fixed-metrics font
/// named after its face.
#[derive(Debug, Clone)]
pub struct FixedFontMapper {
    advance: f64,
}

impl FixedFontMapper {
    pub fn new(advance: f64) -> Self {
        FixedFontMapper { advance }
    }
}

impl Default for FixedFontMapper {
    fn default() -> Self {
        FixedFontMapper::new(500.0)
    }
}

impl FontMapper for FixedFontMapper {
    fn resolve(&self, spec: &FontSpec) -> CanvasResult<Arc<dyn OutputFont>> {
        Ok(Arc::new(FixedMetricsFont::new(
            spec.resolved_face(),
            self.advance,
        )))
    }
}
