//! Page-level resource registry.
//!
//! Everything the emitted operator stream references by name (fonts,
//! image XObjects, patterns, extended graphics states) is recorded here
//! with a generated resource name. The host serializes the registry into
//! whatever dictionary form its output format requires; this layer only
//! guarantees stable naming and deduplication.

use rustc_hash::FxHashMap;

use crate::core::color::Color;
use crate::core::matrix::Matrix;

/// A generated name referencing a registered resource (without the
/// leading slash).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName(String);

impl ResourceName {
    fn new(prefix: &str, index: usize) -> Self {
        ResourceName(format!("{}{}", prefix, index))
    }

    /// The name without the leading slash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How image sample data is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Uncompressed samples, row-major
    Raw,

    /// A complete JPEG file (DCT-encoded)
    Jpeg,
}

/// Color interpretation of image samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageColorSpace {
    DeviceRgb,
    DeviceGray,
}

/// An embeddable image resource.
///
/// Covers full-color images, 8-bit soft masks, and 1-bit stencil masks.
/// A soft mask attached via [`ImageResource::set_soft_mask`] travels with
/// its parent image and is serialized by the host as the image's alpha
/// channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResource {
    pub width: u32,
    pub height: u32,
    pub color_space: ImageColorSpace,
    pub bits_per_component: u8,
    pub encoding: ImageEncoding,
    pub data: Vec<u8>,

    /// 8-bit alpha mask image, if any
    pub soft_mask: Option<Box<ImageResource>>,

    /// Whether this resource is a 1-bit stencil mask rather than an image
    pub is_stencil_mask: bool,

    /// Whether mask sample values are inverted (0 = opaque)
    pub inverted: bool,
}

impl ImageResource {
    /// An uncompressed 8-bit RGB image.
    pub fn rgb(width: u32, height: u32, data: Vec<u8>) -> Self {
        ImageResource {
            width,
            height,
            color_space: ImageColorSpace::DeviceRgb,
            bits_per_component: 8,
            encoding: ImageEncoding::Raw,
            data,
            soft_mask: None,
            is_stencil_mask: false,
            inverted: false,
        }
    }

    /// An uncompressed 8-bit grayscale image.
    pub fn gray(width: u32, height: u32, data: Vec<u8>) -> Self {
        ImageResource {
            color_space: ImageColorSpace::DeviceGray,
            ..ImageResource::rgb(width, height, data)
        }
    }

    /// A DCT-encoded image whose `data` is a complete JPEG file.
    pub fn jpeg(width: u32, height: u32, data: Vec<u8>) -> Self {
        ImageResource {
            encoding: ImageEncoding::Jpeg,
            ..ImageResource::rgb(width, height, data)
        }
    }

    /// A 1-bit stencil mask with packed rows.
    pub fn stencil_mask(width: u32, height: u32, data: Vec<u8>) -> Self {
        ImageResource {
            width,
            height,
            color_space: ImageColorSpace::DeviceGray,
            bits_per_component: 1,
            encoding: ImageEncoding::Raw,
            data,
            soft_mask: None,
            is_stencil_mask: true,
            inverted: false,
        }
    }

    /// Mark mask samples as inverted (0 = opaque).
    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    /// Attach an 8-bit soft mask describing this image's alpha channel.
    pub fn set_soft_mask(&mut self, mask: ImageResource) {
        self.soft_mask = Some(Box::new(mask));
    }
}

/// A two-stop axial (linear) shading in device space.
#[derive(Debug, Clone, PartialEq)]
pub struct AxialShading {
    /// Device-space endpoints `[x0, y0, x1, y1]`
    pub coords: [f64; 4],
    pub c0: Color,
    pub c1: Color,
}

/// A tiled raster pattern: one image repeated over the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TilingPattern {
    /// Cell width in pattern space
    pub width: f64,

    /// Cell height in pattern space
    pub height: f64,

    /// Pattern-to-device matrix
    pub matrix: Matrix,

    /// The image painted inside one cell
    pub image: ResourceName,
}

/// A pattern selectable through the pattern color space.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Shading(AxialShading),
    Tiling(TilingPattern),
}

/// A registered extended graphics state. Alpha values are stored as bytes
/// and serialized by the host as `value / 255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtGState {
    pub fill_alpha: Option<u8>,
    pub stroke_alpha: Option<u8>,
}

/// Registry of all named resources a page's content stream references.
#[derive(Debug, Default)]
pub struct PageResources {
    fonts: Vec<(ResourceName, String)>,
    images: Vec<(ResourceName, ImageResource)>,
    patterns: Vec<(ResourceName, Pattern)>,
    ext_gstates: Vec<(ResourceName, ExtGState)>,

    font_index: FxHashMap<String, usize>,
    gstate_index: FxHashMap<(Option<u8>, Option<u8>), usize>,
}

impl PageResources {
    pub fn new() -> Self {
        PageResources::default()
    }

    /// Resource name for a font, registering it on first use.
    ///
    /// Fonts are deduplicated by PostScript name so repeated text runs in
    /// the same face share one resource entry.
    pub fn font(&mut self, postscript_name: &str) -> ResourceName {
        if let Some(&i) = self.font_index.get(postscript_name) {
            return self.fonts[i].0.clone();
        }
        let name = ResourceName::new("F", self.fonts.len() + 1);
        self.font_index
            .insert(postscript_name.to_string(), self.fonts.len());
        self.fonts.push((name.clone(), postscript_name.to_string()));
        name
    }

    /// Register an image XObject. Every embed gets a fresh name.
    pub fn add_image(&mut self, image: ImageResource) -> ResourceName {
        let name = ResourceName::new("Im", self.images.len() + 1);
        self.images.push((name.clone(), image));
        name
    }

    /// Register an axial shading pattern.
    pub fn add_shading_pattern(&mut self, shading: AxialShading) -> ResourceName {
        self.add_pattern(Pattern::Shading(shading))
    }

    /// Register a tiling pattern.
    pub fn add_tiling_pattern(&mut self, pattern: TilingPattern) -> ResourceName {
        self.add_pattern(Pattern::Tiling(pattern))
    }

    fn add_pattern(&mut self, pattern: Pattern) -> ResourceName {
        let name = ResourceName::new("P", self.patterns.len() + 1);
        self.patterns.push((name.clone(), pattern));
        name
    }

    /// Resource name for an extended graphics state carrying the given
    /// alphas, deduplicated by value.
    pub fn ext_gstate(
        &mut self,
        fill_alpha: Option<u8>,
        stroke_alpha: Option<u8>,
    ) -> ResourceName {
        let key = (fill_alpha, stroke_alpha);
        if let Some(&i) = self.gstate_index.get(&key) {
            return self.ext_gstates[i].0.clone();
        }
        let name = ResourceName::new("GS", self.ext_gstates.len() + 1);
        self.gstate_index.insert(key, self.ext_gstates.len());
        self.ext_gstates.push((
            name.clone(),
            ExtGState {
                fill_alpha,
                stroke_alpha,
            },
        ));
        name
    }

    // === Read access for serialization ===

    pub fn fonts(&self) -> &[(ResourceName, String)] {
        &self.fonts
    }

    pub fn images(&self) -> &[(ResourceName, ImageResource)] {
        &self.images
    }

    pub fn patterns(&self) -> &[(ResourceName, Pattern)] {
        &self.patterns
    }

    pub fn ext_gstates(&self) -> &[(ResourceName, ExtGState)] {
        &self.ext_gstates
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
            && self.images.is_empty()
            && self.patterns.is_empty()
            && self.ext_gstates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_dedup() {
        let mut res = PageResources::new();
        let a = res.font("Helvetica");
        let b = res.font("Helvetica-Bold");
        let c = res.font("Helvetica");
        assert_eq!(a.as_str(), "F1");
        assert_eq!(b.as_str(), "F2");
        assert_eq!(c, a);
        assert_eq!(res.fonts().len(), 2);
    }

    #[test]
    fn test_image_names_sequential() {
        let mut res = PageResources::new();
        let a = res.add_image(ImageResource::rgb(1, 1, vec![0, 0, 0]));
        let b = res.add_image(ImageResource::rgb(1, 1, vec![0, 0, 0]));
        assert_eq!(a.as_str(), "Im1");
        assert_eq!(b.as_str(), "Im2");
    }

    #[test]
    fn test_gstate_dedup_by_alpha_pair() {
        let mut res = PageResources::new();
        let a = res.ext_gstate(Some(128), None);
        let b = res.ext_gstate(Some(128), None);
        let c = res.ext_gstate(None, Some(128));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(res.ext_gstates().len(), 2);
    }

    #[test]
    fn test_pattern_names_shared_counter() {
        let mut res = PageResources::new();
        let img = res.add_image(ImageResource::rgb(2, 2, vec![0; 12]));
        let s = res.add_shading_pattern(AxialShading {
            coords: [0.0, 0.0, 10.0, 10.0],
            c0: Color::BLACK,
            c1: Color::WHITE,
        });
        let t = res.add_tiling_pattern(TilingPattern {
            width: 2.0,
            height: 2.0,
            matrix: Matrix::IDENTITY,
            image: img,
        });
        assert_eq!(s.as_str(), "P1");
        assert_eq!(t.as_str(), "P2");
    }

    #[test]
    fn test_soft_mask_attachment() {
        let mut img = ImageResource::rgb(2, 1, vec![0; 6]);
        let mut mask = ImageResource::gray(2, 1, vec![10, 200]);
        mask.set_inverted(true);
        img.set_soft_mask(mask);
        let mask = img.soft_mask.as_ref().unwrap();
        assert!(mask.inverted);
        assert_eq!(mask.bits_per_component, 8);
    }
}
