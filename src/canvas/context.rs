//! The drawing context over an append-only content stream.
//!
//! A [`PageCanvas`] accepts an imperative host drawing model (mutable
//! paint, stroke, transform, clip, font) and renders it into operator
//! bytes as calls arrive. Nothing is ever rewritten: state changes are
//! diffed against what the stream already says, the clip can only be
//! reset by popping back to a saved bracket, and child contexts write
//! into buffers of their own that are spliced into the parent at
//! disposal.
//!
//! Device space puts the origin at the bottom-left, so every user-space
//! y coordinate is emitted as `height - y`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;

use crate::content::resources::{ImageResource, PageResources, ResourceName, TilingPattern};
use crate::content::stream::ContentStream;
use crate::core::color::Color;
use crate::core::error::CanvasResult;
use crate::core::matrix::Matrix;
use crate::core::path::{Path, PathElement, Rect, WindingRule};

use super::clip::ClipRegion;
use super::fonts::{FixedFontMapper, FontBinding, FontMapper, FontSpec};
use super::image::{build_image_resource, ImagePlacement, Raster, RasterSource};
use super::paint::{
    composite_alpha, composite_color, gradient_shading, rasterize_custom_paint, texture_pattern,
    Composite, CustomPaint, Paint,
};
use super::stroke::{emit_stroke_diff, Stroke, StrokeStyle};

/// Default quality for lossy raster re-encoding.
pub const DEFAULT_JPEG_QUALITY: f32 = 0.95;

fn clamp_quality(quality: f32) -> f32 {
    // max-then-min also squashes NaN to 0
    quality.max(0.0).min(1.0)
}

/// What a traced path is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PathDrawMode {
    Stroke,
    Fill,
    Clip,
}

/// Construction-time switches for a [`PageCanvas`].
#[derive(Debug, Clone)]
pub struct CanvasOptions {
    /// Record vector geometry only: text renders as glyph outlines and
    /// no font resources are registered.
    pub shapes_only: bool,

    /// Re-encode placed rasters through the JPEG codec instead of
    /// embedding their samples unmodified.
    pub convert_images_to_jpeg: bool,

    /// Quality for lossy re-encoding, clamped to `0.0..=1.0`.
    pub jpeg_quality: f32,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        CanvasOptions {
            shapes_only: false,
            convert_images_to_jpeg: false,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// State shared by a root context and every child split from it: the
/// font seam, the per-descriptor resolution cache, and the page's
/// resource registry.
pub(crate) struct SharedState {
    pub(crate) mapper: Arc<dyn FontMapper>,
    pub(crate) font_cache: Mutex<FxHashMap<String, FontBinding>>,
    pub(crate) resources: Mutex<PageResources>,
}

/// A child's splice point in its parent's buffer.
struct ChildMarker {
    offset: usize,
    core: Arc<Mutex<CanvasCore>>,
}

/// The full mutable state of one drawing context.
pub(crate) struct CanvasCore {
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) sink: ContentStream,
    pub(crate) transform: Matrix,

    pub(crate) paint: Paint,
    pub(crate) background: Color,
    pub(crate) composite: Option<Composite>,

    /// Stroke as the host set it, untransformed
    pub(crate) stroke: Stroke,
    /// The host stroke carried into device space, what actually emits
    pub(crate) device_stroke: Stroke,
    /// Width-one stroke in this context's device space, the diff
    /// baseline after clip resets
    pub(crate) baseline_stroke: StrokeStyle,
    /// Last stroke parameters written to the stream
    pub(crate) last_stroke: StrokeStyle,

    pub(crate) last_fill_paint: Option<Paint>,
    pub(crate) last_stroke_paint: Option<Paint>,
    pub(crate) fill_alpha: u8,
    pub(crate) stroke_alpha: u8,

    pub(crate) font: FontSpec,
    pub(crate) binding: Option<FontBinding>,

    /// Accumulated clip in base space, `None` when replaced with nothing
    pub(crate) clip: Option<ClipRegion>,

    pub(crate) shapes_only: bool,
    pub(crate) convert_images_to_jpeg: bool,
    pub(crate) jpeg_quality: f32,

    pub(crate) is_child: bool,
    pub(crate) disposed: bool,
    children: Vec<ChildMarker>,

    pub(crate) shared: Arc<SharedState>,
}

impl CanvasCore {
    fn new_root(
        width: f64,
        height: f64,
        mapper: Arc<dyn FontMapper>,
        options: CanvasOptions,
    ) -> CanvasCore {
        let shared = Arc::new(SharedState {
            mapper,
            font_cache: Mutex::new(FxHashMap::default()),
            resources: Mutex::new(PageResources::new()),
        });
        let baseline = StrokeStyle::default();
        let mut core = CanvasCore {
            width,
            height,
            sink: ContentStream::new(),
            transform: Matrix::IDENTITY,
            paint: Paint::Solid(Color::BLACK),
            background: Color::WHITE,
            composite: None,
            stroke: Stroke::default(),
            device_stroke: Stroke::default(),
            baseline_stroke: baseline.clone(),
            last_stroke: baseline.clone(),
            last_fill_paint: None,
            last_stroke_paint: None,
            fill_alpha: 255,
            stroke_alpha: 255,
            font: FontSpec::default(),
            binding: None,
            clip: None,
            shapes_only: options.shapes_only,
            convert_images_to_jpeg: options.convert_images_to_jpeg,
            jpeg_quality: clamp_quality(options.jpeg_quality),
            is_child: false,
            disposed: false,
            children: Vec::new(),
            shared,
        };

        core.sink.save_state();
        let full = Path::rectangle(0.0, 0.0, width, height).with_winding(WindingRule::EvenOdd);
        core.clip = Some(ClipRegion::new(full.clone()));
        core.follow_path(&full, PathDrawMode::Clip);
        emit_stroke_diff(&mut core.sink, &baseline, None);
        core.last_stroke = baseline;
        core.sink.save_state();
        core
    }

    /// Split off a child sharing this context's current state.
    ///
    /// The child gets its own buffer, fresh emission trackers, and a
    /// baseline stroke rescaled by the inherited transform. The
    /// inherited clip is replayed into the child's buffer after its
    /// inner save bracket so a later clip reset pops back to the page
    /// rectangle alone.
    fn child_of(parent: &CanvasCore) -> CanvasCore {
        let baseline = StrokeStyle::default().scaled(parent.transform.uniform_scale());
        let mut child = CanvasCore {
            width: parent.width,
            height: parent.height,
            sink: ContentStream::new(),
            transform: parent.transform,
            paint: parent.paint.clone(),
            background: parent.background,
            composite: parent.composite,
            stroke: parent.stroke.clone(),
            device_stroke: parent.device_stroke.clone(),
            baseline_stroke: baseline.clone(),
            last_stroke: baseline.clone(),
            last_fill_paint: None,
            last_stroke_paint: None,
            fill_alpha: 255,
            stroke_alpha: 255,
            font: parent.font.clone(),
            binding: parent.binding.clone(),
            clip: parent.clip.clone(),
            shapes_only: parent.shapes_only,
            convert_images_to_jpeg: parent.convert_images_to_jpeg,
            jpeg_quality: parent.jpeg_quality,
            is_child: true,
            disposed: false,
            children: Vec::new(),
            shared: Arc::clone(&parent.shared),
        };

        child.sink.save_state();
        let full = Path::rectangle(0.0, 0.0, child.width, child.height)
            .with_winding(WindingRule::EvenOdd);
        child.follow_path(&full, PathDrawMode::Clip);
        emit_stroke_diff(&mut child.sink, &baseline, None);
        child.sink.save_state();
        if let Some(region) = child.clip.clone() {
            for shape in region.shapes() {
                child.follow_path(shape, PathDrawMode::Clip);
            }
        }
        child
    }

    /// Once a child exists, any further parent bytes would land before
    /// the child's splice point and come out reordered at disposal.
    /// That is a contract violation on the caller's side, checked in
    /// debug builds.
    pub(crate) fn debug_check_splice_order(&self) {
        debug_assert!(
            self.children.is_empty(),
            "content appended to a context that has an undisposed child"
        );
    }

    pub(crate) fn lock_resources(&self) -> MutexGuard<'_, PageResources> {
        self.shared
            .resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // === Path tracing ===

    /// Trace a shape into the stream and finish it for the given mode.
    ///
    /// Stroking with a non-standard stroke falls back to filling the
    /// stroke's outline. Clip shapes arrive already in base space; the
    /// other modes carry coordinates through the live transform. All
    /// y coordinates flip into device space on the way out.
    pub(crate) fn follow_path(&mut self, shape: &Path, mode: PathDrawMode) {
        if mode == PathDrawMode::Stroke {
            let outlined = match &self.device_stroke {
                Stroke::Outline(outliner) => Some(outliner.outline(shape)),
                Stroke::Standard(_) => None,
            };
            if let Some(outlined) = outlined {
                self.follow_path(&outlined, PathDrawMode::Fill);
                return;
            }
            self.emit_stroke_state();
            self.emit_stroke_paint();
        } else if mode == PathDrawMode::Fill {
            self.emit_fill_paint();
        }

        let basis = if mode == PathDrawMode::Clip {
            Matrix::IDENTITY
        } else {
            self.transform
        };
        let h = self.height;
        let mut traces = 0usize;
        for element in shape.elements() {
            traces += 1;
            match *element {
                PathElement::MoveTo(x, y) => {
                    let (x, y) = basis.apply(x, y);
                    self.sink.move_to(x, h - y);
                }
                PathElement::LineTo(x, y) => {
                    let (x, y) = basis.apply(x, y);
                    self.sink.line_to(x, h - y);
                }
                PathElement::QuadTo(qx, qy, x, y) => {
                    let (qx, qy) = basis.apply(qx, qy);
                    let (x, y) = basis.apply(x, y);
                    self.sink.curve_to_initial(qx, h - qy, x, h - y);
                }
                PathElement::CurveTo(c1x, c1y, c2x, c2y, x, y) => {
                    let (c1x, c1y) = basis.apply(c1x, c1y);
                    let (c2x, c2y) = basis.apply(c2x, c2y);
                    let (x, y) = basis.apply(x, y);
                    self.sink.curve_to(c1x, h - c1y, c2x, h - c2y, x, h - y);
                }
                PathElement::ClosePath => self.sink.close_subpath(),
            }
        }

        match mode {
            PathDrawMode::Fill => {
                if traces > 0 {
                    match shape.winding() {
                        WindingRule::EvenOdd => self.sink.fill_even_odd(),
                        WindingRule::NonZero => self.sink.fill(),
                    }
                }
            }
            PathDrawMode::Stroke => {
                if traces > 0 {
                    self.sink.stroke();
                }
            }
            PathDrawMode::Clip => {
                // an empty clip still needs a path for the operator
                if traces == 0 {
                    self.sink.rect(0.0, 0.0, 0.0, 0.0);
                }
                match shape.winding() {
                    WindingRule::EvenOdd => self.sink.clip_even_odd(),
                    WindingRule::NonZero => self.sink.clip(),
                }
                self.sink.end_path();
            }
        }
    }

    // === Stroke and paint emission ===

    fn emit_stroke_state(&mut self) {
        if let Stroke::Standard(style) = &self.device_stroke {
            let style = style.clone();
            emit_stroke_diff(&mut self.sink, &style, Some(&self.last_stroke));
            self.last_stroke = style;
        }
    }

    pub(crate) fn emit_fill_paint(&mut self) {
        let changed = match &self.last_fill_paint {
            Some(last) => *last != self.paint,
            None => true,
        };
        if changed {
            self.last_fill_paint = Some(self.paint.clone());
            self.apply_paint(true);
        }
    }

    fn emit_stroke_paint(&mut self) {
        let changed = match &self.last_stroke_paint {
            Some(last) => *last != self.paint,
            None => true,
        };
        if changed {
            self.last_stroke_paint = Some(self.paint.clone());
            self.apply_paint(false);
        }
    }

    /// Realize the current paint for one role.
    ///
    /// Solid colors emit as device RGB with the composite's alpha folded
    /// in. Gradients and textures register page-level pattern resources
    /// and select them through the pattern color space. A texture or
    /// custom paint that cannot be realized degrades to flat gray.
    fn apply_paint(&mut self, fill: bool) {
        match self.paint.clone() {
            Paint::Solid(color) => {
                let color = composite_color(self.composite, color);
                if fill {
                    self.set_fill_opacity(color.a);
                    self.sink.set_fill_rgb(color);
                } else {
                    self.set_stroke_opacity(color.a);
                    self.sink.set_stroke_rgb(color);
                }
            }
            Paint::LinearGradient {
                start,
                end,
                start_color,
                end_color,
            } => {
                let c0 = composite_color(self.composite, start_color);
                let c1 = composite_color(self.composite, end_color);
                let shading =
                    gradient_shading(start, end, c0, c1, &self.transform, self.height);
                let name = self.lock_resources().add_shading_pattern(shading);
                let opacity = ((c0.a as f32 + c1.a as f32) / 2.0).round() as u8;
                if fill {
                    self.set_fill_opacity(opacity);
                    self.sink.set_fill_pattern(name.as_str());
                } else {
                    self.set_stroke_opacity(opacity);
                    self.sink.set_stroke_pattern(name.as_str());
                }
            }
            Paint::Texture { raster, anchor } => match self.texture_paint_name(&raster, &anchor) {
                Ok(name) => self.select_pattern(fill, &name),
                Err(err) => {
                    tracing::warn!("texture paint fell back to flat gray: {}", err);
                    self.fall_back_to_gray(fill);
                }
            },
            Paint::Custom(custom) => match self.custom_paint_name(custom.as_ref()) {
                Ok(name) => self.select_pattern(fill, &name),
                Err(err) => {
                    tracing::warn!("custom paint fell back to flat gray: {}", err);
                    self.fall_back_to_gray(fill);
                }
            },
        }
    }

    fn select_pattern(&mut self, fill: bool, name: &ResourceName) {
        let alpha = composite_alpha(self.composite);
        if fill {
            self.set_fill_opacity(alpha);
            self.sink.set_fill_pattern(name.as_str());
        } else {
            self.set_stroke_opacity(alpha);
            self.sink.set_stroke_pattern(name.as_str());
        }
    }

    // Emission tracking already points at the failed paint, so the gray
    // is written directly and the next differing paint re-emits.
    fn fall_back_to_gray(&mut self, fill: bool) {
        if fill {
            self.sink.set_fill_rgb(Color::GRAY);
        } else {
            self.sink.set_stroke_rgb(Color::GRAY);
        }
    }

    fn texture_paint_name(&mut self, raster: &Raster, anchor: &Rect) -> CanvasResult<ResourceName> {
        let image = build_image_resource(raster, false, self.jpeg_quality)?;
        let mut resources = self.lock_resources();
        let image_name = resources.add_image(image);
        let pattern = texture_pattern(raster, anchor, &self.transform, self.height, image_name)?;
        Ok(resources.add_tiling_pattern(pattern))
    }

    /// A custom paint becomes a surface-sized tile sampled through the
    /// inverse transform, so its cells land on device pixels under an
    /// identity pattern matrix.
    fn custom_paint_name(&mut self, paint: &dyn CustomPaint) -> CanvasResult<ResourceName> {
        let raster = rasterize_custom_paint(paint, self.width, self.height, &self.transform)?;
        let image = build_image_resource(&raster, false, self.jpeg_quality)?;
        let mut resources = self.lock_resources();
        let image_name = resources.add_image(image);
        let pattern = TilingPattern {
            width: raster.width() as f64,
            height: raster.height() as f64,
            matrix: Matrix::IDENTITY,
            image: image_name,
        };
        Ok(resources.add_tiling_pattern(pattern))
    }

    pub(crate) fn set_fill_opacity(&mut self, alpha: u8) {
        if alpha != self.fill_alpha {
            self.fill_alpha = alpha;
            let name = self.lock_resources().ext_gstate(Some(alpha), None);
            self.sink.set_ext_gstate(name.as_str());
        }
    }

    pub(crate) fn set_stroke_opacity(&mut self, alpha: u8) {
        if alpha != self.stroke_alpha {
            self.stroke_alpha = alpha;
            let name = self.lock_resources().ext_gstate(None, Some(alpha));
            self.sink.set_ext_gstate(name.as_str());
        }
    }

    // === Drawing operations ===

    pub(crate) fn draw_shape(&mut self, shape: &Path) {
        self.debug_check_splice_order();
        self.follow_path(shape, PathDrawMode::Stroke);
    }

    pub(crate) fn fill_shape(&mut self, shape: &Path) {
        self.debug_check_splice_order();
        self.follow_path(shape, PathDrawMode::Fill);
    }

    /// Intersect the clip with a shape, in user space.
    pub(crate) fn clip_shape(&mut self, shape: &Path) {
        self.debug_check_splice_order();
        let transformed = shape.transform(&self.transform);
        match &mut self.clip {
            Some(region) => region.intersect(transformed.clone()),
            None => self.clip = Some(ClipRegion::new(transformed.clone())),
        }
        self.follow_path(&transformed, PathDrawMode::Clip);
    }

    /// Replace the clip outright.
    ///
    /// The only way to widen an emitted clip is to pop back to the
    /// inner save bracket and push it again, which also resets every
    /// piece of emitted device state. The trackers reset with it so
    /// the next draw re-emits paint, opacity, and stroke deltas
    /// against the baseline.
    pub(crate) fn replace_clip(&mut self, shape: Option<&Path>) {
        self.debug_check_splice_order();
        self.sink.restore_state();
        self.sink.save_state();
        match shape {
            Some(shape) => {
                let transformed = shape.transform(&self.transform);
                self.clip = Some(ClipRegion::new(transformed.clone()));
                self.follow_path(&transformed, PathDrawMode::Clip);
            }
            None => self.clip = None,
        }
        self.last_fill_paint = None;
        self.last_stroke_paint = None;
        self.fill_alpha = 255;
        self.stroke_alpha = 255;
        self.last_stroke = self.baseline_stroke.clone();
    }

    /// Fill a rectangle with the background color, bypassing the
    /// composite, then restore paint and composite.
    pub(crate) fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let saved_paint = self.paint.clone();
        let saved_composite = self.composite;
        self.set_composite(None);
        self.set_paint(Paint::Solid(self.background));
        self.fill_shape(&Path::rectangle(x, y, width, height));
        self.set_paint(saved_paint);
        self.set_composite(saved_composite);
    }

    // === State setters ===

    pub(crate) fn set_paint(&mut self, paint: Paint) {
        self.paint = paint;
    }

    /// Setting the composite forgets emitted paints, since their alpha
    /// was computed under the old composite.
    pub(crate) fn set_composite(&mut self, composite: Option<Composite>) {
        self.composite = composite;
        self.last_fill_paint = None;
        self.last_stroke_paint = None;
    }

    pub(crate) fn set_stroke(&mut self, stroke: Stroke) {
        self.stroke = stroke;
        self.device_stroke = self.stroke.transformed(&self.transform);
    }

    pub(crate) fn set_font(&mut self, font: FontSpec) {
        if self.shapes_only {
            self.font = font;
            self.binding = None;
            return;
        }
        if font == self.font {
            return;
        }
        self.font = font;
        self.binding = None;
    }

    /// Resolve the current font descriptor to an output font, going
    /// through the cache shared with every related context.
    pub(crate) fn ensure_binding(&mut self) -> CanvasResult<FontBinding> {
        if let Some(binding) = &self.binding {
            return Ok(binding.clone());
        }
        let key = self.font.cache_key();
        let mut cache = self
            .shared
            .font_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(binding) = cache.get(&key) {
            let binding = binding.clone();
            drop(cache);
            self.binding = Some(binding.clone());
            return Ok(binding);
        }
        let font = self.shared.mapper.resolve(&self.font)?;
        let resource = self.lock_resources().font(font.postscript_name());
        let binding = FontBinding { font, resource };
        cache.insert(key, binding.clone());
        drop(cache);
        self.binding = Some(binding.clone());
        Ok(binding)
    }

    // === Transforms ===
    //
    // The device stroke is re-derived on the transform-replacing
    // mutations; translate, rotate, and shear adjust the matrix in
    // place and leave the derived stroke as it was.

    pub(crate) fn set_transform(&mut self, transform: Matrix) {
        self.transform = transform;
        self.device_stroke = self.stroke.transformed(&self.transform);
    }

    pub(crate) fn concat_transform(&mut self, other: &Matrix) {
        self.transform.concat(other);
        self.device_stroke = self.stroke.transformed(&self.transform);
    }

    pub(crate) fn translate(&mut self, tx: f64, ty: f64) {
        self.transform.translate(tx, ty);
    }

    pub(crate) fn scale(&mut self, sx: f64, sy: f64) {
        self.transform.scale(sx, sy);
        self.device_stroke = self.stroke.transformed(&self.transform);
    }

    pub(crate) fn rotate(&mut self, theta: f64) {
        self.transform.rotate(theta);
    }

    pub(crate) fn rotate_about(&mut self, theta: f64, x: f64, y: f64) {
        self.transform.translate(x, y);
        self.transform.rotate(theta);
        self.transform.translate(-x, -y);
    }

    pub(crate) fn shear(&mut self, shx: f64, shy: f64) {
        self.transform.shear(shx, shy);
    }

    // === Clip accessors ===

    /// The clip mapped back to user space, one path per intersected
    /// shape. `None` when unclipped or the transform cannot be
    /// inverted.
    pub(crate) fn clip_paths(&self) -> Option<Vec<Path>> {
        let region = self.clip.as_ref()?;
        let inverse = self.transform.invert()?;
        Some(
            region
                .shapes()
                .iter()
                .map(|shape| shape.transform(&inverse))
                .collect(),
        )
    }

    /// A user-space rectangle covering the clip. Conservative: the
    /// bounds of the intersection can be smaller than the intersected
    /// bounds reported here.
    pub(crate) fn clip_bounds(&self) -> Option<Rect> {
        let region = self.clip.as_ref()?;
        let inverse = self.transform.invert()?;
        let mut bounds: Option<Rect> = None;
        for shape in region.shapes() {
            let b = shape.transform(&inverse).bounding_box()?;
            bounds = Some(match bounds {
                Some(acc) => acc.intersect(&b)?,
                None => b,
            });
        }
        bounds
    }

    // === Images ===

    /// Place a raster on the page.
    ///
    /// The placement maps the raster's pixel box into user space; the
    /// emitted matrix additionally flips the samples right side up,
    /// since raster rows run top-down while device space runs
    /// bottom-up. The fill opacity around the invocation is the
    /// composite's alpha and is restored afterwards even on error.
    ///
    /// A source that fails to produce pixels degrades this one call to
    /// a no-op; encoding failures propagate.
    pub(crate) fn draw_image(
        &mut self,
        source: &dyn RasterSource,
        placement: &ImagePlacement,
        mask: Option<ImageResource>,
    ) -> CanvasResult<()> {
        self.debug_check_splice_order();
        let raster = match source.wait_for_raster() {
            Ok(raster) => raster,
            Err(err) => {
                tracing::warn!("raster source failed, skipping image: {}", err);
                return Ok(());
            }
        };
        let Some((placement_matrix, region_mask)) = placement.resolve(raster.width(), raster.height())
        else {
            tracing::debug!("zero-area image placement skipped");
            return Ok(());
        };

        let mut m = Matrix::flip_y(self.height);
        m.concat(&self.transform);
        m.concat(&placement_matrix);
        m.translate(0.0, raster.height() as f64);
        m.scale(raster.width() as f64, raster.height() as f64);
        m.scale(1.0, -1.0);

        let saved_alpha = self.fill_alpha;
        self.set_fill_opacity(composite_alpha(self.composite));
        let outcome = self.embed_image(&raster, &m, mask.or(region_mask));
        self.set_fill_opacity(saved_alpha);
        outcome
    }

    fn embed_image(
        &mut self,
        raster: &Raster,
        matrix: &Matrix,
        mask: Option<ImageResource>,
    ) -> CanvasResult<()> {
        let mut image = build_image_resource(raster, self.convert_images_to_jpeg, self.jpeg_quality)?;
        // an explicit mask replaces any alpha-derived one
        if let Some(mask) = mask {
            image.set_soft_mask(mask);
        }
        let name = self.lock_resources().add_image(image);
        self.sink.save_state();
        self.sink.concat_matrix(matrix);
        self.sink.invoke_xobject(name.as_str());
        self.sink.restore_state();
        Ok(())
    }
}

/// Walk the marker list, interleaving parent segments with child
/// buffers. Children close their open brackets on the way through.
fn flatten_into(core: &mut CanvasCore, out: &mut Vec<u8>) {
    let markers = std::mem::take(&mut core.children);
    let mut last = 0usize;
    for marker in markers {
        let mut child = marker.core.lock().unwrap_or_else(PoisonError::into_inner);
        child.disposed = true;
        child.sink.restore_state();
        child.sink.restore_state();
        out.extend_from_slice(&core.sink.bytes()[last..marker.offset]);
        flatten_into(&mut child, out);
        last = marker.offset;
    }
    out.extend_from_slice(&core.sink.bytes()[last..]);
}

/// An imperative drawing surface emitting an append-only operator
/// stream for one page.
///
/// Construction writes a preamble that saves the pristine device state,
/// clips to the page rectangle, and records the stroke baseline behind
/// a second save. [`dispose`](PageCanvas::dispose) closes both brackets
/// and splices child buffers into place; afterwards
/// [`content`](PageCanvas::content) is the final stream.
pub struct PageCanvas {
    pub(crate) core: Arc<Mutex<CanvasCore>>,
}

impl PageCanvas {
    /// A canvas over a `width` x `height` page.
    pub fn new(width: f64, height: f64, mapper: Arc<dyn FontMapper>) -> PageCanvas {
        PageCanvas::with_options(width, height, mapper, CanvasOptions::default())
    }

    pub fn with_options(
        width: f64,
        height: f64,
        mapper: Arc<dyn FontMapper>,
        options: CanvasOptions,
    ) -> PageCanvas {
        PageCanvas {
            core: Arc::new(Mutex::new(CanvasCore::new_root(width, height, mapper, options))),
        }
    }

    /// A canvas that records vector geometry only. Text renders as
    /// glyph outlines when the resolved font can produce them.
    pub fn shapes_only(width: f64, height: f64) -> PageCanvas {
        PageCanvas::with_options(
            width,
            height,
            Arc::new(FixedFontMapper::default()),
            CanvasOptions {
                shapes_only: true,
                ..CanvasOptions::default()
            },
        )
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, CanvasCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Drawing ===

    /// Stroke a shape with the current stroke and paint.
    pub fn draw(&mut self, shape: &Path) {
        self.lock().draw_shape(shape);
    }

    /// Fill a shape with the current paint.
    pub fn fill(&mut self, shape: &Path) {
        self.lock().fill_shape(shape);
    }

    /// Intersect the clip with a shape.
    pub fn clip(&mut self, shape: &Path) {
        self.lock().clip_shape(shape);
    }

    /// Replace the clip with a shape, or clear it with `None`.
    pub fn set_clip(&mut self, shape: Option<&Path>) {
        self.lock().replace_clip(shape);
    }

    /// Fill a rectangle with the background color.
    pub fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.lock().clear_rect(x, y, width, height);
    }

    /// Place a raster image.
    pub fn draw_image(
        &mut self,
        source: &dyn RasterSource,
        placement: &ImagePlacement,
    ) -> CanvasResult<()> {
        self.lock().draw_image(source, placement, None)
    }

    /// Place a raster image with an explicit mask, which takes the
    /// place of any mask derived from the raster's own alpha.
    pub fn draw_image_masked(
        &mut self,
        source: &dyn RasterSource,
        placement: &ImagePlacement,
        mask: Option<ImageResource>,
    ) -> CanvasResult<()> {
        self.lock().draw_image(source, placement, mask)
    }

    // === State ===

    pub fn set_paint(&mut self, paint: Paint) {
        self.lock().set_paint(paint);
    }

    pub fn paint(&self) -> Paint {
        self.lock().paint.clone()
    }

    pub fn set_stroke(&mut self, stroke: Stroke) {
        self.lock().set_stroke(stroke);
    }

    pub fn stroke(&self) -> Stroke {
        self.lock().stroke.clone()
    }

    pub fn set_composite(&mut self, composite: Option<Composite>) {
        self.lock().set_composite(composite);
    }

    pub fn composite(&self) -> Option<Composite> {
        self.lock().composite
    }

    pub fn set_background(&mut self, color: Color) {
        self.lock().background = color;
    }

    pub fn background(&self) -> Color {
        self.lock().background
    }

    pub fn set_font(&mut self, font: FontSpec) {
        self.lock().set_font(font);
    }

    pub fn font(&self) -> FontSpec {
        self.lock().font.clone()
    }

    // === Transforms ===

    pub fn set_transform(&mut self, transform: Matrix) {
        self.lock().set_transform(transform);
    }

    /// Concatenate a transform onto the current one.
    pub fn concat_transform(&mut self, other: &Matrix) {
        self.lock().concat_transform(other);
    }

    pub fn transform(&self) -> Matrix {
        self.lock().transform
    }

    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.lock().translate(tx, ty);
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.lock().scale(sx, sy);
    }

    pub fn rotate(&mut self, theta: f64) {
        self.lock().rotate(theta);
    }

    pub fn rotate_about(&mut self, theta: f64, x: f64, y: f64) {
        self.lock().rotate_about(theta, x, y);
    }

    pub fn shear(&mut self, shx: f64, shy: f64) {
        self.lock().shear(shx, shy);
    }

    // === Clip accessors ===

    /// The clip in user space, one path per intersected shape.
    pub fn clip_paths(&self) -> Option<Vec<Path>> {
        self.lock().clip_paths()
    }

    /// A user-space rectangle covering the clip.
    pub fn clip_bounds(&self) -> Option<Rect> {
        self.lock().clip_bounds()
    }

    // === Lifecycle ===

    /// Split off a child context that owns its own buffer.
    ///
    /// The child's bytes are spliced into this context's stream at the
    /// current position when the root is disposed. Between creating a
    /// child and disposing, the parent must not emit further content;
    /// debug builds check this.
    pub fn create_child(&mut self) -> PageCanvas {
        let mut core = self.lock();
        let child = CanvasCore::child_of(&core);
        let offset = core.sink.len();
        let child = Arc::new(Mutex::new(child));
        core.children.push(ChildMarker {
            offset,
            core: Arc::clone(&child),
        });
        PageCanvas { core: child }
    }

    /// Close the context.
    ///
    /// On a root this closes the preamble brackets, walks the child
    /// markers to splice their buffers into place, and freezes the
    /// stream. On a child it does nothing: children are finalized by
    /// their root. Calling it twice is a no-op.
    pub fn dispose(&mut self) {
        let mut core = self.lock();
        if core.is_child || core.disposed {
            return;
        }
        core.disposed = true;
        core.sink.restore_state();
        core.sink.restore_state();
        if !core.children.is_empty() {
            let mut flat = Vec::with_capacity(core.sink.len());
            flatten_into(&mut core, &mut flat);
            core.sink.set_bytes(flat);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    // === Output ===

    /// The operator bytes produced so far. Final once disposed.
    pub fn content(&self) -> Vec<u8> {
        self.lock().sink.bytes().to_vec()
    }

    /// Current save/restore nesting depth of this context's own stream.
    pub fn save_depth(&self) -> usize {
        self.lock().sink.save_depth()
    }

    /// The operator bytes behind a zlib deflate.
    pub fn compressed_content(&self) -> CanvasResult<Vec<u8>> {
        self.lock().sink.compressed()
    }

    /// Remove and return everything registered for this page: fonts,
    /// images, patterns, and graphics states. Meant to be called once
    /// after [`dispose`](PageCanvas::dispose), when the resource
    /// dictionary gets serialized next to the stream.
    pub fn take_resources(&self) -> PageResources {
        let shared = Arc::clone(&self.lock().shared);
        let mut resources = shared
            .resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *resources)
    }

    // === Options ===

    /// Quality for lossy raster re-encoding, clamped to `0.0..=1.0`.
    pub fn set_jpeg_quality(&mut self, quality: f32) {
        self.lock().jpeg_quality = clamp_quality(quality);
    }

    pub fn jpeg_quality(&self) -> f32 {
        self.lock().jpeg_quality
    }

    pub fn set_convert_images_to_jpeg(&mut self, convert: bool) {
        self.lock().convert_images_to_jpeg = convert;
    }

    pub fn convert_images_to_jpeg(&self) -> bool {
        self.lock().convert_images_to_jpeg
    }

    pub fn width(&self) -> f64 {
        self.lock().width
    }

    pub fn height(&self) -> f64 {
        self.lock().height
    }
}

impl fmt::Debug for PageCanvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.lock();
        f.debug_struct("PageCanvas")
            .field("width", &core.width)
            .field("height", &core.height)
            .field("is_child", &core.is_child)
            .field("disposed", &core.disposed)
            .finish()
    }
}
