use std::sync::Arc;

use crate::backend::{Drawable, SurfaceProvider};
use crate::backend_mem::MemoryProvider;
use crate::blend::BlendRegistry;
use crate::buffer::PixelBuffer;
use crate::error::UbeResult;
use crate::filter::FilterRegistry;
use crate::surface::ImageSurface;

/// The filter and blend dispatch tables an engine hands to its surfaces.
#[derive(Clone, Debug, Default)]
pub struct Registries {
    pub filters: FilterRegistry,
    pub blenders: BlendRegistry,
}

impl Registries {
    /// Registries pre-populated with every built-in filter and blend mode.
    pub fn with_builtins() -> Self {
        let mut r = Self::default();
        crate::filters_std::register_builtins(&mut r.filters);
        crate::blend::register_builtins(&mut r.blenders);
        r
    }
}

/// An image source a surface can be loaded from.
pub enum Source {
    /// URL resolved by the provider; the asynchronous load path.
    Url(String),
    /// Raw pixel buffer, copied onto a fresh blank drawable.
    Pixels(PixelBuffer),
    /// An existing host drawable, adopted as-is.
    Drawable(Box<dyn Drawable>),
}

/// Owns the registries and the surface provider; loads surfaces.
///
/// Surfaces snapshot the registries at load time (copy-on-write `Arc`), so
/// `add_filters`/`add_blenders` affect surfaces loaded afterwards. Names
/// queued on a surface whose registry never learned them fall under the
/// documented skip policy.
pub struct Engine {
    registries: Arc<Registries>,
    provider: Arc<dyn SurfaceProvider>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(MemoryProvider)
    }
}

impl Engine {
    /// Engine over `provider` with the built-in filters and blend modes.
    pub fn new(provider: impl SurfaceProvider + 'static) -> Self {
        Self {
            registries: Arc::new(Registries::with_builtins()),
            provider: Arc::new(provider),
        }
    }

    /// Register additional filters.
    pub fn add_filters(&mut self, register: impl FnOnce(&mut FilterRegistry)) {
        register(&mut Arc::make_mut(&mut self.registries).filters);
    }

    /// Register additional blend modes.
    pub fn add_blenders(&mut self, register: impl FnOnce(&mut BlendRegistry)) {
        register(&mut Arc::make_mut(&mut self.registries).blenders);
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Load a single source into a surface.
    pub fn load(&self, source: Source) -> UbeResult<ImageSurface> {
        let drawable = match source {
            Source::Url(url) => self.provider.decode_url(&url)?,
            Source::Pixels(buf) => {
                let mut d = self.provider.create_blank(buf.width(), buf.height())?;
                d.write_pixels(&buf, 0, 0)?;
                d
            }
            Source::Drawable(d) => d,
        };
        Ok(ImageSurface::new(
            drawable,
            self.registries.clone(),
            self.provider.clone(),
        ))
    }

    /// Load a batch of sources, preserving input order in the result.
    ///
    /// `on_loaded` fires once per completed element, not once for the batch.
    pub fn load_batch(
        &self,
        sources: Vec<Source>,
        mut on_loaded: impl FnMut(&mut ImageSurface),
    ) -> UbeResult<Vec<ImageSurface>> {
        let mut surfaces = Vec::with_capacity(sources.len());
        for source in sources {
            let mut surface = self.load(source)?;
            on_loaded(&mut surface);
            surfaces.push(surface);
        }
        Ok(surfaces)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registries", &self.registries)
            .finish()
    }
}
