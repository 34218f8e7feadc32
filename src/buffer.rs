use crate::error::{UbeError, UbeResult};

/// Straight-alpha RGBA8 raster, row-major, 4 bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent buffer of the given dimensions.
    pub fn blank(width: u32, height: u32) -> UbeResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Wrap raw RGBA8 bytes, validating `data.len() == width * height * 4`.
    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> UbeResult<Self> {
        let len = byte_len(width, height)?;
        if data.len() != len {
            return Err(UbeError::dimension_mismatch(format!(
                "pixel data is {} bytes, {width}x{height} rgba8 needs {len}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// RGBA bytes of the pixel at `(x, y)`. Callers must stay in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Copy of the `w`x`h` sub-rectangle starting at `(x, y)`.
    pub fn copy_rect(&self, x: u32, y: u32, w: u32, h: u32) -> UbeResult<Self> {
        self.check_rect(x, y, w, h)?;
        let mut out = Self::blank(w, h)?;
        let src_row = self.width as usize * 4;
        let dst_row = w as usize * 4;
        for row in 0..h as usize {
            let src = (y as usize + row) * src_row + x as usize * 4;
            let dst = row * dst_row;
            out.data[dst..dst + dst_row].copy_from_slice(&self.data[src..src + dst_row]);
        }
        Ok(out)
    }

    /// Overwrite the sub-rectangle at `(x, y)` with `src`'s pixels.
    pub fn write_rect(&mut self, src: &PixelBuffer, x: u32, y: u32) -> UbeResult<()> {
        self.check_rect(x, y, src.width, src.height)?;
        let dst_row = self.width as usize * 4;
        let src_row = src.width as usize * 4;
        for row in 0..src.height as usize {
            let dst = (y as usize + row) * dst_row + x as usize * 4;
            let s = row * src_row;
            self.data[dst..dst + src_row].copy_from_slice(&src.data[s..s + src_row]);
        }
        Ok(())
    }

    fn check_rect(&self, x: u32, y: u32, w: u32, h: u32) -> UbeResult<()> {
        if w == 0 || h == 0 {
            return Err(UbeError::invalid_argument("rect must be non-empty"));
        }
        let x2 = x.checked_add(w);
        let y2 = y.checked_add(h);
        match (x2, y2) {
            (Some(x2), Some(y2)) if x2 <= self.width && y2 <= self.height => Ok(()),
            _ => Err(UbeError::dimension_mismatch(format!(
                "rect {w}x{h}@({x},{y}) exceeds {}x{} buffer",
                self.width, self.height
            ))),
        }
    }
}

fn byte_len(width: u32, height: u32) -> UbeResult<usize> {
    if width == 0 || height == 0 {
        return Err(UbeError::invalid_argument(
            "buffer dimensions must be non-zero",
        ));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(|| UbeError::invalid_argument("buffer byte length overflows usize"))
}
