use crate::buffer::PixelBuffer;
use crate::error::{UbeError, UbeResult};

/// Inclusive bounding box of painted pixels, in source coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1 + 1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1 + 1
    }
}

/// Minimal bounding rectangle of non-transparent pixels in a mask buffer.
///
/// A pixel is painted when its alpha is greater than zero. A mask that
/// painted nothing is `EmptyRegion`; the legacy behavior here produced NaN
/// bounds, which this implementation deliberately tightens into an error.
pub fn resolve_region(mask: &PixelBuffer) -> UbeResult<Region> {
    let width = mask.width();
    let mut bounds: Option<Region> = None;

    for (i, px) in mask.data().chunks_exact(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        bounds = Some(match bounds {
            None => Region {
                x1: x,
                y1: y,
                x2: x,
                y2: y,
            },
            Some(r) => Region {
                x1: r.x1.min(x),
                y1: r.y1.min(y),
                x2: r.x2.max(x),
                y2: r.y2.max(y),
            },
        });
    }

    bounds.ok_or(UbeError::EmptyRegion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_painted_pixel_yields_unit_region() {
        let mut mask = PixelBuffer::blank(10, 10).unwrap();
        mask.set_pixel(5, 7, [0, 0, 0, 1]);
        let r = resolve_region(&mask).unwrap();
        assert_eq!(
            r,
            Region {
                x1: 5,
                y1: 7,
                x2: 5,
                y2: 7
            }
        );
        assert_eq!(r.width(), 1);
        assert_eq!(r.height(), 1);
    }

    #[test]
    fn bounds_cover_scattered_pixels() {
        let mut mask = PixelBuffer::blank(8, 6).unwrap();
        mask.set_pixel(2, 1, [0, 0, 0, 255]);
        mask.set_pixel(6, 4, [0, 0, 0, 128]);
        mask.set_pixel(4, 0, [0, 0, 0, 3]);
        let r = resolve_region(&mask).unwrap();
        assert_eq!(
            r,
            Region {
                x1: 2,
                y1: 0,
                x2: 6,
                y2: 4
            }
        );
        assert_eq!(r.width(), 5);
        assert_eq!(r.height(), 5);
    }

    #[test]
    fn fully_transparent_mask_is_empty_region() {
        let mask = PixelBuffer::blank(4, 4).unwrap();
        assert!(matches!(
            resolve_region(&mask),
            Err(UbeError::EmptyRegion)
        ));
    }

    #[test]
    fn opaque_rgb_with_zero_alpha_is_not_painted() {
        let mut mask = PixelBuffer::blank(4, 4).unwrap();
        mask.set_pixel(1, 1, [255, 255, 255, 0]);
        assert!(resolve_region(&mask).is_err());
    }
}
