use std::sync::Arc;

use crate::backend::{DrawOp, Drawable, SurfaceProvider};
use crate::buffer::PixelBuffer;
use crate::composite::{CompositeMode, composite_region};
use crate::engine::Registries;
use crate::error::{UbeError, UbeResult};
use crate::filter::{FilterArgs, FilterCtx, FilterQueue, FilterSpec};
use crate::region::resolve_region;

/// Options for [`ImageSurface::layer`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayerOptions {
    /// Blend mode name looked up in the engine's blend registry.
    pub blendmode: String,
    /// Alpha attenuation factor in `0..=1`, applied to the scratch surface
    /// before blending. 1.0 means no attenuation.
    pub opacity: f64,
    /// Seed the scratch surface with the parent's current pixels instead of
    /// transparent black.
    pub copy_parent: bool,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            blendmode: "normal".to_string(),
            opacity: 1.0,
            copy_parent: false,
        }
    }
}

/// A loaded image bound to a backing drawable, owning a deferred filter
/// queue and an optional full-surface pixel cache.
///
/// Filter methods only queue work and return `&mut Self` for chaining; the
/// apply family flushes the queue and commits pixels to the drawable.
pub struct ImageSurface {
    drawable: Box<dyn Drawable>,
    cache: Option<PixelBuffer>,
    queue: FilterQueue,
    registries: Arc<Registries>,
    provider: Arc<dyn SurfaceProvider>,
}

impl ImageSurface {
    pub(crate) fn new(
        drawable: Box<dyn Drawable>,
        registries: Arc<Registries>,
        provider: Arc<dyn SurfaceProvider>,
    ) -> Self {
        Self {
            drawable,
            cache: None,
            queue: FilterQueue::default(),
            registries,
            provider,
        }
    }

    pub fn width(&self) -> u32 {
        self.drawable.width()
    }

    pub fn height(&self) -> u32 {
        self.drawable.height()
    }

    pub fn pending_filters(&self) -> usize {
        self.queue.len()
    }

    /// Snapshot of the current full-surface pixels, cached until the next
    /// drawing mutation or partial write.
    pub fn pixels(&mut self) -> UbeResult<PixelBuffer> {
        self.fetch_full()
    }

    fn fetch_full(&mut self) -> UbeResult<PixelBuffer> {
        if let Some(cached) = &self.cache {
            return Ok(cached.clone());
        }
        let buf = self
            .drawable
            .read_pixels(0, 0, self.drawable.width(), self.drawable.height())?;
        self.cache = Some(buf.clone());
        Ok(buf)
    }

    /// Overwrite pixels at `(x, y)`. A full-surface write refreshes the
    /// cache; a partial write invalidates it.
    pub fn put_pixels(&mut self, buf: &PixelBuffer, x: u32, y: u32) -> UbeResult<()> {
        self.drawable.write_pixels(buf, x, y)?;
        let full = x == 0
            && y == 0
            && buf.width() == self.drawable.width()
            && buf.height() == self.drawable.height();
        self.cache = if full { Some(buf.clone()) } else { None };
        Ok(())
    }

    /// Run an opaque drawing operation against the backing drawable.
    pub fn draw(&mut self, op: &DrawOp) -> UbeResult<&mut Self> {
        self.drawable.draw(op)?;
        self.cache = None;
        Ok(self)
    }

    /// Push a filter invocation onto the queue. The single generic entry
    /// point behind every chainable filter method; unknown names are allowed
    /// here and resolved (or skipped) at flush time.
    pub fn queue_filter(&mut self, name: impl Into<String>, args: FilterArgs) -> &mut Self {
        self.queue.push(FilterSpec::new(name, args));
        self
    }

    // Chainable wrappers over `queue_filter`, one per built-in.

    pub fn invert(&mut self) -> &mut Self {
        self.queue_filter("invert", FilterArgs::empty())
    }

    /// Additive per-channel offset; entries beyond the slice default to 0.
    pub fn rgba(&mut self, deltas: &[i64]) -> &mut Self {
        let args = deltas.iter().map(|&d| serde_json::json!(d)).collect();
        self.queue_filter("rgba", FilterArgs::new(args))
    }

    pub fn lighten(&mut self, n: i64) -> &mut Self {
        self.queue_filter("lighten", FilterArgs::new(vec![serde_json::json!(n)]))
    }

    pub fn darken(&mut self, n: i64) -> &mut Self {
        self.queue_filter("darken", FilterArgs::new(vec![serde_json::json!(n)]))
    }

    pub fn grayscale(&mut self) -> &mut Self {
        self.queue_filter("grayscale", FilterArgs::empty())
    }

    /// Sepia tint at `strength` percent; `None` means full strength.
    pub fn sepiatone(&mut self, strength: Option<f64>) -> &mut Self {
        let args = match strength {
            Some(n) => FilterArgs::new(vec![serde_json::json!(n)]),
            None => FilterArgs::empty(),
        };
        self.queue_filter("sepiatone", args)
    }

    pub fn monochrome(&mut self, levels: i64) -> &mut Self {
        self.queue_filter("monochrome", FilterArgs::new(vec![serde_json::json!(levels)]))
    }

    pub fn threshold(&mut self, rgb: [i64; 3]) -> &mut Self {
        let args = rgb.iter().map(|&c| serde_json::json!(c)).collect();
        self.queue_filter("threshold", FilterArgs::new(args))
    }

    pub fn rgbbits(&mut self, n: f64) -> &mut Self {
        self.queue_filter("rgbbits", FilterArgs::new(vec![serde_json::json!(n)]))
    }

    pub fn channel(&mut self, name: &str) -> &mut Self {
        self.queue_filter("channel", FilterArgs::new(vec![serde_json::json!(name)]))
    }

    pub fn shift(&mut self, n: i64) -> &mut Self {
        self.queue_filter("shift", FilterArgs::new(vec![serde_json::json!(n)]))
    }

    pub fn opacity(&mut self, factor: f64) -> &mut Self {
        self.queue_filter("opacity", FilterArgs::new(vec![serde_json::json!(factor)]))
    }

    pub fn crop(&mut self, x: u32, y: u32, w: u32, h: u32) -> &mut Self {
        let args = [x, y, w, h].iter().map(|&v| serde_json::json!(v)).collect();
        self.queue_filter("crop", FilterArgs::new(args))
    }

    /// Flush the queue over the whole surface: fetch, filter, write back,
    /// refresh the cache, clear the queue.
    #[tracing::instrument(skip(self), fields(pending = self.queue.len()))]
    pub fn apply(&mut self) -> UbeResult<&mut Self> {
        let buf = self.fetch_full()?;
        let specs = self.queue.take();
        let mut ctx = FilterCtx::new(self.drawable.as_mut());
        let out = self.registries.filters.run(buf, &specs, &mut ctx)?;
        self.drawable.write_pixels(&out, 0, 0)?;
        self.cache = Some(out);
        Ok(self)
    }

    /// Flush the queue over a sub-rectangle, writing back at `(x, y)`. The
    /// whole-surface cache goes stale and is invalidated.
    pub fn apply_rect(&mut self, x: u32, y: u32, w: u32, h: u32) -> UbeResult<&mut Self> {
        let buf = self.drawable.read_pixels(x, y, w, h)?;
        let specs = self.queue.take();
        let mut ctx = FilterCtx::pinned(self.drawable.as_mut());
        let out = self.registries.filters.run(buf, &specs, &mut ctx)?;
        if out.width() != w || out.height() != h {
            return Err(UbeError::dimension_mismatch(
                "filter changed buffer dimensions during a rect-limited apply",
            ));
        }
        self.drawable.write_pixels(&out, x, y)?;
        self.cache = None;
        Ok(self)
    }

    /// Flush the queue over the region painted by `op`, merging filtered
    /// pixels back under the mask's alpha (antialiased) or a hard replace.
    pub fn apply_custom(&mut self, op: &DrawOp, antialias: bool) -> UbeResult<&mut Self> {
        let mode = if antialias {
            CompositeMode::AlphaWeighted
        } else {
            CompositeMode::hard_replace()
        };
        self.apply_custom_with(op, mode)
    }

    /// [`apply_custom`](Self::apply_custom) with an explicit composite mode.
    pub fn apply_custom_with(&mut self, op: &DrawOp, mode: CompositeMode) -> UbeResult<&mut Self> {
        let (w, h) = (self.drawable.width(), self.drawable.height());

        // Rasterize the mask onto a blank scratch drawable.
        let mut scratch = self.provider.create_blank(w, h)?;
        scratch.draw(op)?;
        let mask_full = scratch.read_pixels(0, 0, w, h)?;

        let region = resolve_region(&mask_full)?;
        let (rx, ry, rw, rh) = (region.x1, region.y1, region.width(), region.height());

        let mask = mask_full.copy_rect(rx, ry, rw, rh)?;
        let original = self.drawable.read_pixels(rx, ry, rw, rh)?;

        let specs = self.queue.take();
        let mut ctx = FilterCtx::pinned(self.drawable.as_mut());
        let processed = self.registries.filters.run(original.clone(), &specs, &mut ctx)?;
        if processed.width() != rw || processed.height() != rh {
            return Err(UbeError::dimension_mismatch(
                "filter changed buffer dimensions during a custom apply",
            ));
        }

        let mut merged = original;
        composite_region(&mut merged, &processed, &mask, mode)?;
        self.drawable.write_pixels(&merged, rx, ry)?;
        self.cache = None;
        Ok(self)
    }

    /// Blend a transient scratch surface onto this one.
    ///
    /// Flushes the current queue first, builds a parent-sized scratch
    /// surface, hands it to `populate`, attenuates its alpha when
    /// `opacity < 1` (before blending, not after), flushes it, then blends
    /// it onto this surface under `options.blendmode`.
    pub fn layer(
        &mut self,
        options: LayerOptions,
        populate: impl FnOnce(&mut ImageSurface) -> UbeResult<()>,
    ) -> UbeResult<&mut Self> {
        if !(0.0..=1.0).contains(&options.opacity) {
            return Err(UbeError::invalid_argument(
                "layer opacity must be in 0..=1",
            ));
        }

        self.apply()?;

        let (w, h) = (self.drawable.width(), self.drawable.height());
        let drawable = self.provider.create_blank(w, h)?;
        let mut scratch =
            ImageSurface::new(drawable, self.registries.clone(), self.provider.clone());
        if options.copy_parent {
            let parent = self.fetch_full()?;
            scratch.put_pixels(&parent, 0, 0)?;
        }

        populate(&mut scratch)?;
        if options.opacity < 1.0 {
            scratch.opacity(options.opacity);
        }
        scratch.apply()?;

        let mut base = self.fetch_full()?;
        let overlay = scratch.fetch_full()?;
        self.registries
            .blenders
            .blend(&options.blendmode, &mut base, &overlay)?;
        self.put_pixels(&base, 0, 0)?;
        Ok(self)
    }
}

impl std::fmt::Debug for ImageSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSurface")
            .field("width", &self.drawable.width())
            .field("height", &self.drawable.height())
            .field("cached", &self.cache.is_some())
            .field("pending_filters", &self.queue.len())
            .finish()
    }
}
