//! Raster images, readiness-aware sources, and the embedding pipeline.
//!
//! A [`Raster`] is validated pixel data in one of three interleaved
//! formats. Embedding either passes samples through raw or re-encodes
//! them through the JPEG codec; in both cases a non-opaque alpha channel
//! is split into a derived soft mask. The derived mask is single-channel,
//! eight bits per sample, built from the raw alpha bytes, and marked
//! inverted.

use std::borrow::Cow;
use std::sync::{Condvar, Mutex, PoisonError};

use crate::content::resources::ImageResource;
use crate::core::error::{CanvasError, CanvasResult};
use crate::core::matrix::Matrix;
use crate::core::path::Rect;

/// Interleaved sample layout of a [`Raster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// 8-bit RGB triplets
    Rgb8,

    /// 8-bit RGBA quadruplets
    Rgba8,

    /// 8-bit grayscale
    Gray8,
}

impl RasterFormat {
    /// Bytes per pixel.
    pub fn channels(&self) -> usize {
        match self {
            RasterFormat::Rgb8 => 3,
            RasterFormat::Rgba8 => 4,
            RasterFormat::Gray8 => 1,
        }
    }
}

/// An in-memory raster image with validated dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    format: RasterFormat,
    data: Vec<u8>,
}

impl Raster {
    /// Create a raster, validating that `data` holds exactly
    /// `width × height` pixels in the given format.
    pub fn new(width: u32, height: u32, format: RasterFormat, data: Vec<u8>) -> CanvasResult<Self> {
        let expected = width as usize * height as usize * format.channels();
        if data.len() != expected {
            return Err(CanvasError::InvalidRaster {
                expected,
                actual: data.len(),
            });
        }
        Ok(Raster {
            width,
            height,
            format,
            data,
        })
    }

    pub fn rgb8(width: u32, height: u32, data: Vec<u8>) -> CanvasResult<Self> {
        Raster::new(width, height, RasterFormat::Rgb8, data)
    }

    pub fn rgba8(width: u32, height: u32, data: Vec<u8>) -> CanvasResult<Self> {
        Raster::new(width, height, RasterFormat::Rgba8, data)
    }

    pub fn gray8(width: u32, height: u32, data: Vec<u8>) -> CanvasResult<Self> {
        Raster::new(width, height, RasterFormat::Gray8, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> RasterFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the format carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.format == RasterFormat::Rgba8
    }

    /// The samples as RGB triplets, expanding grayscale and dropping
    /// alpha.
    pub fn rgb_bytes(&self) -> Vec<u8> {
        match self.format {
            RasterFormat::Rgb8 => self.data.clone(),
            RasterFormat::Rgba8 => {
                let mut out = Vec::with_capacity(self.pixel_count() * 3);
                for px in self.data.chunks_exact(4) {
                    out.extend_from_slice(&px[..3]);
                }
                out
            }
            RasterFormat::Gray8 => {
                let mut out = Vec::with_capacity(self.pixel_count() * 3);
                for &g in &self.data {
                    out.extend_from_slice(&[g, g, g]);
                }
                out
            }
        }
    }

    /// The alpha channel as one byte per pixel, if the format has one.
    pub fn alpha_bytes(&self) -> Option<Vec<u8>> {
        match self.format {
            RasterFormat::Rgba8 => {
                Some(self.data.chunks_exact(4).map(|px| px[3]).collect())
            }
            _ => None,
        }
    }
}

/// A supplier of raster pixels that may still be loading.
///
/// `wait_for_raster` blocks until the pixels exist; there is no timeout,
/// matching host image-loading contracts where readiness is always
/// eventually signaled.
pub trait RasterSource: Send + Sync {
    fn wait_for_raster(&self) -> CanvasResult<Cow<'_, Raster>>;
}

impl RasterSource for Raster {
    fn wait_for_raster(&self) -> CanvasResult<Cow<'_, Raster>> {
        Ok(Cow::Borrowed(self))
    }
}

/// A raster slot filled by another thread, typically a decoder.
///
/// Drawing threads block in [`RasterSource::wait_for_raster`] until the
/// loading thread calls [`SharedRaster::publish`].
#[derive(Debug, Default)]
pub struct SharedRaster {
    slot: Mutex<Option<Raster>>,
    ready: Condvar,
}

impl SharedRaster {
    pub fn new() -> Self {
        SharedRaster::default()
    }

    /// Install the pixels and wake all waiters.
    pub fn publish(&self, raster: Raster) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(raster);
        self.ready.notify_all();
    }

    /// Whether pixels have been published.
    pub fn is_ready(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl RasterSource for SharedRaster {
    fn wait_for_raster(&self) -> CanvasResult<Cow<'_, Raster>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        while slot.is_none() {
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        match slot.as_ref() {
            Some(raster) => Ok(Cow::Owned(raster.clone())),
            None => Err(CanvasError::RasterUnavailable(
                "raster slot emptied while waiting".to_string(),
            )),
        }
    }
}

/// Where and how an image lands on the page, in user space.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePlacement {
    /// Top-left corner at `(x, y)`, natural size
    At { x: f64, y: f64 },

    /// Scaled to fill the rectangle at `(x, y)`
    Fit {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    /// An explicit placement matrix applied to the pixel box
    Matrix(Matrix),

    /// A source sub-rectangle mapped onto a destination rectangle
    Region { source: Rect, dest: Rect },
}

impl ImagePlacement {
    /// Resolve to a placement matrix plus an optional stencil mask that
    /// restricts a region blit to its source rectangle.
    ///
    /// Returns `None` when the blit is a no-op: a zero-area image, or a
    /// region blit with a zero-area source or destination.
    pub(crate) fn resolve(
        &self,
        width: u32,
        height: u32,
    ) -> Option<(Matrix, Option<ImageResource>)> {
        if width == 0 || height == 0 {
            return None;
        }
        match self {
            ImagePlacement::At { x, y } => Some((Matrix::translation(*x, *y), None)),
            ImagePlacement::Fit {
                x,
                y,
                width: w,
                height: h,
            } => {
                let mut m = Matrix::translation(*x, *y);
                m.scale(w / width as f64, h / height as f64);
                Some((m, None))
            }
            ImagePlacement::Matrix(m) => Some((*m, None)),
            ImagePlacement::Region { source, dest } => {
                if source.is_empty() || dest.is_empty() {
                    return None;
                }
                let scale_x = dest.width / source.width;
                let scale_y = dest.height / source.height;
                let mut m = Matrix::translation(
                    dest.x - source.x * scale_x,
                    dest.y - source.y * scale_y,
                );
                m.scale(scale_x, scale_y);
                Some((m, Some(region_stencil_mask(width, height, source))))
            }
        }
    }
}

/// A 1-bit stencil mask marking the source rectangle of a region blit.
///
/// Bits inside the rectangle are set; the mask is marked inverted so the
/// set region is the painted one. Rows are packed most significant bit
/// first.
fn region_stencil_mask(width: u32, height: u32, source: &Rect) -> ImageResource {
    let row_bytes = (width as usize).div_ceil(8);
    let mut data = vec![0u8; row_bytes * height as usize];
    let x0 = source.x.max(0.0) as u32;
    let y0 = source.y.max(0.0) as u32;
    let x1 = (source.max_x().max(0.0) as u32).min(width);
    let y1 = (source.max_y().max(0.0) as u32).min(height);
    for y in y0..y1 {
        let row = y as usize * row_bytes;
        for x in x0..x1 {
            data[row + (x / 8) as usize] |= 0x80 >> (x % 8);
        }
    }
    let mut mask = ImageResource::stencil_mask(width, height, data);
    mask.set_inverted(true);
    mask
}

/// The derived soft mask for an alpha channel, or `None` when the
/// channel is fully opaque (alpha bytes summing to `255 × pixel_count`).
fn derived_soft_mask(width: u32, height: u32, alpha: Vec<u8>) -> Option<ImageResource> {
    let sum: u64 = alpha.iter().map(|&a| a as u64).sum();
    if sum < 255 * alpha.len() as u64 {
        let mut mask = ImageResource::gray(width, height, alpha);
        mask.set_inverted(true);
        Some(mask)
    } else {
        None
    }
}

/// Build the embeddable resource for a raster.
///
/// With `lossy` set the samples are flattened to opaque RGB and pushed
/// through the JPEG codec at the given quality; otherwise they embed
/// raw. Either way a non-opaque alpha channel becomes a derived soft
/// mask attached to the result.
pub(crate) fn build_image_resource(
    raster: &Raster,
    lossy: bool,
    quality: f32,
) -> CanvasResult<ImageResource> {
    if !lossy {
        return Ok(build_raw(raster));
    }
    #[cfg(feature = "jpeg-encoding")]
    {
        build_lossy(raster, quality)
    }
    #[cfg(not(feature = "jpeg-encoding"))]
    {
        let _ = quality;
        tracing::warn!("lossy encoding requested without the jpeg-encoding feature, embedding raw samples");
        Ok(build_raw(raster))
    }
}

fn build_raw(raster: &Raster) -> ImageResource {
    let (w, h) = (raster.width(), raster.height());
    match raster.format() {
        RasterFormat::Gray8 => ImageResource::gray(w, h, raster.data().to_vec()),
        RasterFormat::Rgb8 => ImageResource::rgb(w, h, raster.data().to_vec()),
        RasterFormat::Rgba8 => {
            let mut image = ImageResource::rgb(w, h, raster.rgb_bytes());
            if let Some(alpha) = raster.alpha_bytes() {
                if let Some(mask) = derived_soft_mask(w, h, alpha) {
                    image.set_soft_mask(mask);
                }
            }
            image
        }
    }
}

#[cfg(feature = "jpeg-encoding")]
fn build_lossy(raster: &Raster, quality: f32) -> CanvasResult<ImageResource> {
    let (w, h) = (raster.width(), raster.height());
    let rgb = raster.rgb_bytes();
    let mask = raster
        .alpha_bytes()
        .and_then(|alpha| derived_soft_mask(w, h, alpha));
    let data = match encode_jpeg(w, h, &rgb, quality) {
        Ok(data) => data,
        Err(err) => {
            // one retry with a freshly extracted buffer; a second
            // failure propagates
            tracing::warn!("JPEG encode failed, retrying: {}", err);
            encode_jpeg(w, h, &raster.rgb_bytes(), quality)?
        }
    };
    let mut image = ImageResource::jpeg(w, h, data);
    if let Some(mask) = mask {
        image.set_soft_mask(mask);
    }
    Ok(image)
}

#[cfg(feature = "jpeg-encoding")]
fn encode_jpeg(width: u32, height: u32, rgb: &[u8], quality: f32) -> CanvasResult<Vec<u8>> {
    use image::ImageEncoder;

    let q = ((quality * 100.0).round() as i32).clamp(1, 100) as u8;
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, q);
    encoder
        .write_image(rgb, width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| CanvasError::ImageEncode(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_raster_validation() {
        assert!(Raster::rgb8(2, 2, vec![0; 12]).is_ok());
        match Raster::rgb8(2, 2, vec![0; 11]) {
            Err(CanvasError::InvalidRaster { expected, actual }) => {
                assert_eq!(expected, 12);
                assert_eq!(actual, 11);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_opaque_alpha_never_derives_mask() {
        let raster = Raster::rgba8(2, 1, vec![1, 2, 3, 255, 4, 5, 6, 255]).unwrap();
        let image = build_raw(&raster);
        assert!(image.soft_mask.is_none());
        assert_eq!(image.data, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_translucent_alpha_derives_inverted_mask() {
        let raster = Raster::rgba8(2, 1, vec![1, 2, 3, 255, 4, 5, 6, 254]).unwrap();
        let image = build_raw(&raster);
        let mask = image.soft_mask.as_ref().unwrap();
        assert!(mask.inverted);
        assert_eq!(mask.bits_per_component, 8);
        assert_eq!(mask.data, vec![255, 254]);
    }

    #[test]
    fn test_gray_expansion() {
        let raster = Raster::gray8(2, 1, vec![10, 20]).unwrap();
        assert_eq!(raster.rgb_bytes(), vec![10, 10, 10, 20, 20, 20]);
    }

    #[test]
    fn test_region_mask_bits() {
        let mask = region_stencil_mask(10, 2, &Rect::new(2.0, 1.0, 4.0, 1.0));
        assert!(mask.is_stencil_mask);
        assert!(mask.inverted);
        assert_eq!(mask.bits_per_component, 1);
        // Row 0 untouched, row 1 has bits 2..6 set.
        assert_eq!(mask.data, vec![0x00, 0x00, 0x3C, 0x00]);
    }

    #[test]
    fn test_zero_area_region_is_noop() {
        let placement = ImagePlacement::Region {
            source: Rect::new(0.0, 0.0, 0.0, 5.0),
            dest: Rect::new(0.0, 0.0, 10.0, 10.0),
        };
        assert!(placement.resolve(4, 4).is_none());
    }

    #[test]
    fn test_region_placement_matrix() {
        let placement = ImagePlacement::Region {
            source: Rect::new(1.0, 2.0, 2.0, 2.0),
            dest: Rect::new(10.0, 20.0, 4.0, 6.0),
        };
        let (m, mask) = placement.resolve(4, 4).unwrap();
        assert!(mask.is_some());
        // Source corner (1, 2) must land on dest corner (10, 20).
        let (x, y) = m.apply(1.0, 2.0);
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_shared_raster_blocks_until_publish() {
        let shared = Arc::new(SharedRaster::new());
        assert!(!shared.is_ready());
        let publisher = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            publisher.publish(Raster::gray8(1, 1, vec![7]).unwrap());
        });
        let raster = shared.wait_for_raster().unwrap();
        assert_eq!(raster.data(), &[7]);
        handle.join().unwrap();
    }

    #[cfg(feature = "jpeg-encoding")]
    #[test]
    fn test_lossy_build_produces_jpeg() {
        let raster = Raster::rgb8(8, 8, vec![200; 8 * 8 * 3]).unwrap();
        let image = build_image_resource(&raster, true, 0.9).unwrap();
        assert_eq!(image.encoding, crate::content::resources::ImageEncoding::Jpeg);
        // JPEG SOI marker.
        assert_eq!(&image.data[..2], &[0xFF, 0xD8]);
    }
}
