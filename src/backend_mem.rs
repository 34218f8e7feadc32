//! Reference in-memory adapter: a `PixelBuffer`-backed drawable and a
//! provider that decodes local files with the `image` crate. Hosts with a
//! real canvas implement [`Drawable`]/[`SurfaceProvider`] themselves.

use anyhow::Context;

use crate::backend::{DrawOp, Drawable, SurfaceProvider};
use crate::buffer::PixelBuffer;
use crate::error::{UbeError, UbeResult};

/// Heap-backed drawable, the canvas stand-in used by tests and examples.
#[derive(Clone, Debug)]
pub struct MemorySurface {
    pixels: PixelBuffer,
}

impl MemorySurface {
    pub fn blank(width: u32, height: u32) -> UbeResult<Self> {
        Ok(Self {
            pixels: PixelBuffer::blank(width, height)?,
        })
    }

    pub fn from_buffer(pixels: PixelBuffer) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }
}

impl Drawable for MemorySurface {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn read_pixels(&self, x: u32, y: u32, w: u32, h: u32) -> UbeResult<PixelBuffer> {
        self.pixels.copy_rect(x, y, w, h)
    }

    fn write_pixels(&mut self, buf: &PixelBuffer, x: u32, y: u32) -> UbeResult<()> {
        self.pixels.write_rect(buf, x, y)
    }

    fn resize(&mut self, width: u32, height: u32) -> UbeResult<()> {
        self.pixels = PixelBuffer::blank(width, height)?;
        Ok(())
    }

    fn draw(&mut self, op: &DrawOp) -> UbeResult<()> {
        op(self)
    }
}

/// Provider for [`MemorySurface`] drawables. URLs are local paths (a plain
/// path or `file://` prefixed); anything else is `SurfaceNotLoaded`, since
/// this adapter has no fetch stack.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryProvider;

impl SurfaceProvider for MemoryProvider {
    fn create_blank(&self, width: u32, height: u32) -> UbeResult<Box<dyn Drawable>> {
        Ok(Box::new(MemorySurface::blank(width, height)?))
    }

    fn decode_url(&self, url: &str) -> UbeResult<Box<dyn Drawable>> {
        let path = match url.split_once("://") {
            Some(("file", rest)) => rest,
            Some((scheme, _)) => {
                return Err(UbeError::not_loaded(format!(
                    "memory provider cannot fetch '{scheme}' urls"
                )));
            }
            None => url,
        };

        let bytes =
            std::fs::read(path).with_context(|| format!("read image file '{path}'"))?;
        let decoded = decode_image(&bytes)?;
        Ok(Box::new(MemorySurface::from_buffer(decoded)))
    }
}

/// Decode encoded image bytes into a straight-alpha RGBA8 buffer.
pub fn decode_image(bytes: &[u8]) -> UbeResult<PixelBuffer> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::from_vec(width, height, rgba.into_raw())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn draw_op_paints_through_the_trait() {
        let mut s = MemorySurface::blank(2, 2).unwrap();
        s.draw(&|d: &mut dyn Drawable| {
            let px = PixelBuffer::from_vec(1, 1, vec![9, 9, 9, 255])?;
            d.write_pixels(&px, 1, 1)
        })
        .unwrap();
        assert_eq!(s.pixels().pixel(1, 1), [9, 9, 9, 255]);
        assert_eq!(s.pixels().pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn resize_discards_contents() {
        let mut s = MemorySurface::blank(2, 2).unwrap();
        let px = PixelBuffer::from_vec(1, 1, vec![1, 2, 3, 4]).unwrap();
        s.write_pixels(&px, 0, 0).unwrap();
        s.resize(3, 1).unwrap();
        assert_eq!(s.width(), 3);
        assert_eq!(s.height(), 1);
        assert!(s.pixels().data().iter().all(|&v| v == 0));
    }

    #[test]
    fn decode_image_png_round_trips_dimensions() {
        let img = image::RgbaImage::from_raw(2, 1, vec![10, 20, 30, 255, 40, 50, 60, 128]).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&buf).unwrap();
        assert_eq!(decoded.width(), 2);
        assert_eq!(decoded.height(), 1);
        assert_eq!(decoded.pixel(0, 0), [10, 20, 30, 255]);
        assert_eq!(decoded.pixel(1, 0), [40, 50, 60, 128]);
    }

    #[test]
    fn unsupported_scheme_is_not_loaded() {
        let err = MemoryProvider.decode_url("https://example.com/a.png");
        assert!(matches!(err, Err(UbeError::SurfaceNotLoaded(_))));
    }
}
