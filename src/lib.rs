//! Canvas-style image manipulation: deferred per-surface filter queues,
//! region-limited apply, and layer blending over straight-alpha RGBA8
//! buffers. Host I/O (fetching, native drawing contexts) stays behind the
//! [`backend`] traits; [`backend_mem`] is the in-memory reference adapter.

#![forbid(unsafe_code)]

pub mod backend;
pub mod backend_mem;
pub mod blend;
pub mod buffer;
pub mod composite;
pub mod engine;
pub mod error;
pub mod filter;
pub mod filters_std;
pub mod region;
pub mod surface;

pub use backend::{DrawOp, Drawable, SurfaceProvider};
pub use backend_mem::{MemoryProvider, MemorySurface};
pub use blend::BlendRegistry;
pub use buffer::PixelBuffer;
pub use composite::{CompositeMode, LEGACY_HARD_REPLACE_WEIGHT};
pub use engine::{Engine, Registries, Source};
pub use error::{UbeError, UbeResult};
pub use filter::{FilterArgs, FilterQueue, FilterRegistry, FilterSpec};
pub use region::{Region, resolve_region};
pub use surface::{ImageSurface, LayerOptions};
