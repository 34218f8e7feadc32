//! Merges a filtered region back into the original pixels, weighted by a
//! mask's alpha channel. Operates on region-sized buffers only; the caller
//! extracts the region and writes the merged result back.

use crate::buffer::PixelBuffer;
use crate::error::{UbeError, UbeResult};

/// Blend weight the legacy non-antialiased path hardcoded. Kept as a named
/// constant pending product clarification; the default hard replace uses 1.0.
pub const LEGACY_HARD_REPLACE_WEIGHT: f32 = 0.5;

/// How processed pixels are merged where the mask is painted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CompositeMode {
    /// Per-pixel weight `mask_alpha / 255`, applied to all four channels.
    AlphaWeighted,
    /// Fixed weight wherever mask alpha is nonzero. `weight` 1.0 replaces
    /// the pixel outright.
    HardReplace { weight: f32 },
}

impl CompositeMode {
    pub fn hard_replace() -> Self {
        Self::HardReplace { weight: 1.0 }
    }
}

/// Merge `processed` into `original` under `mode`, gated by `mask` alpha.
///
/// All three buffers must share dimensions. Pixels where the mask alpha is
/// zero are never written.
pub fn composite_region(
    original: &mut PixelBuffer,
    processed: &PixelBuffer,
    mask: &PixelBuffer,
    mode: CompositeMode,
) -> UbeResult<()> {
    let (w, h) = (original.width(), original.height());
    for (name, buf) in [("processed", processed), ("mask", mask)] {
        if buf.width() != w || buf.height() != h {
            return Err(UbeError::dimension_mismatch(format!(
                "{name} buffer is {}x{}, region is {w}x{h}",
                buf.width(),
                buf.height()
            )));
        }
    }

    let fixed_weight = match mode {
        CompositeMode::AlphaWeighted => None,
        CompositeMode::HardReplace { weight } => {
            if !(0.0..=1.0).contains(&weight) {
                return Err(UbeError::invalid_argument(
                    "hard replace weight must be in 0..=1",
                ));
            }
            Some(weight)
        }
    };

    let orig = original.data_mut();
    let proc_data = processed.data();
    let mask_data = mask.data();

    for (i, mask_px) in mask_data.chunks_exact(4).enumerate() {
        if mask_px[3] == 0 {
            continue;
        }
        let amount = match fixed_weight {
            Some(weight) => weight,
            None => mask_px[3] as f32 / 255.0,
        };
        let at = i * 4;
        for j in at..at + 4 {
            let merged = proc_data[j] as f32 * amount + orig[j] as f32 * (1.0 - amount);
            orig[j] = merged.round() as u8;
        }
    }

    Ok(())
}
