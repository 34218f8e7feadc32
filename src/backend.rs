use crate::buffer::PixelBuffer;
use crate::error::UbeResult;

/// Opaque native drawing operation. The core never inspects it; it only hands
/// the op a mutable surface to paint on.
pub type DrawOp = dyn Fn(&mut dyn Drawable) -> UbeResult<()>;

/// A host-owned drawable surface the core can read pixels from and write
/// pixels back to. The canvas stand-in.
pub trait Drawable {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Read the `w`x`h` rectangle at `(x, y)` as straight-alpha RGBA8.
    fn read_pixels(&self, x: u32, y: u32, w: u32, h: u32) -> UbeResult<PixelBuffer>;

    /// Overwrite pixels starting at `(x, y)` with `buf`'s contents.
    fn write_pixels(&mut self, buf: &PixelBuffer, x: u32, y: u32) -> UbeResult<()>;

    /// Resize the backing store, discarding current contents.
    ///
    /// Only the crop filter calls this; a host that cannot resize may return
    /// an error and forgo crop support.
    fn resize(&mut self, width: u32, height: u32) -> UbeResult<()>;

    /// Execute an opaque drawing operation against this surface.
    fn draw(&mut self, op: &DrawOp) -> UbeResult<()>;
}

/// Factory for drawables: blank scratch surfaces and decoded URL loads.
///
/// `decode_url` is the asynchronous boundary of the original design; adapters
/// backed by a real fetch should resolve the load before returning, or return
/// `SurfaceNotLoaded` if they cannot complete it.
pub trait SurfaceProvider {
    fn create_blank(&self, width: u32, height: u32) -> UbeResult<Box<dyn Drawable>>;

    fn decode_url(&self, url: &str) -> UbeResult<Box<dyn Drawable>>;
}
