//! Layer blend modes. Arithmetic is 8-bit wraparound unless a mode's own
//! formula keeps values in range.

use std::collections::HashMap;
use std::sync::Arc;

use crate::buffer::PixelBuffer;
use crate::error::{UbeError, UbeResult};

/// Combines an overlay buffer into a base buffer of equal dimensions.
///
/// Implementations mutate `base` in place; the mutated base is the result.
pub trait Blender: Send + Sync {
    fn blend(&self, base: &mut [u8], overlay: &[u8]);
}

impl<F> Blender for F
where
    F: Fn(&mut [u8], &[u8]) + Send + Sync,
{
    fn blend(&self, base: &mut [u8], overlay: &[u8]) {
        self(base, overlay)
    }
}

/// Name-to-blend-function dispatch table.
#[derive(Clone, Default)]
pub struct BlendRegistry {
    blenders: HashMap<String, Arc<dyn Blender>>,
}

impl BlendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, blender: Arc<dyn Blender>) {
        self.blenders.insert(name.into(), blender);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blenders.contains_key(name)
    }

    /// Blend `overlay` into `base` under `mode`.
    ///
    /// Operands of unequal dimensions are a hard error. An unknown mode
    /// leaves `base` unchanged; that fallback is documented policy so layer
    /// code can run against a registry populated later.
    pub fn blend(&self, mode: &str, base: &mut PixelBuffer, overlay: &PixelBuffer) -> UbeResult<()> {
        if base.width() != overlay.width() || base.height() != overlay.height() {
            return Err(UbeError::dimension_mismatch(format!(
                "blend operands differ: base {}x{}, overlay {}x{}",
                base.width(),
                base.height(),
                overlay.width(),
                overlay.height()
            )));
        }
        let Some(blender) = self.blenders.get(mode) else {
            tracing::debug!(mode, "unknown blend mode, returning base unchanged");
            return Ok(());
        };
        blender.blend(base.data_mut(), overlay.data());
        Ok(())
    }
}

impl std::fmt::Debug for BlendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.blenders.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("BlendRegistry").field("blenders", &names).finish()
    }
}

/// Register the standard modes: `normal`, `subtract`, `multiply`, `screen`.
pub fn register_builtins(registry: &mut BlendRegistry) {
    registry.register("normal", Arc::new(normal));
    registry.register("subtract", Arc::new(subtract));
    registry.register("multiply", Arc::new(multiply));
    registry.register("screen", Arc::new(screen));
}

/// Wrapping add on all four channels, alpha included. Not alpha-compositing;
/// preserved from the original as specified behavior.
pub fn normal(base: &mut [u8], overlay: &[u8]) {
    for (b, o) in base.iter_mut().zip(overlay) {
        *b = b.wrapping_add(*o);
    }
}

/// Wrapping subtract on RGB; alpha untouched.
pub fn subtract(base: &mut [u8], overlay: &[u8]) {
    for (i, (b, o)) in base.iter_mut().zip(overlay).enumerate() {
        if i % 4 != 3 {
            *b = b.wrapping_sub(*o);
        }
    }
}

/// `base * overlay / 255` on RGB; alpha untouched.
pub fn multiply(base: &mut [u8], overlay: &[u8]) {
    for (i, (b, o)) in base.iter_mut().zip(overlay).enumerate() {
        if i % 4 != 3 {
            *b = ((*b as u16 * *o as u16) / 255) as u8;
        }
    }
}

/// `255 - (255-base)*(255-overlay)/255` on all four channels.
pub fn screen(base: &mut [u8], overlay: &[u8]) {
    for (b, o) in base.iter_mut().zip(overlay) {
        *b = 255 - (((255 - *b as u16) * (255 - *o as u16)) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BlendRegistry {
        let mut r = BlendRegistry::new();
        register_builtins(&mut r);
        r
    }

    fn buf(px: [u8; 4]) -> PixelBuffer {
        PixelBuffer::from_vec(1, 1, px.to_vec()).unwrap()
    }

    #[test]
    fn normal_adds_all_channels_with_wraparound() {
        let r = registry();
        let mut base = buf([250, 10, 20, 250]);
        let overlay = buf([10, 5, 5, 10]);
        r.blend("normal", &mut base, &overlay).unwrap();
        assert_eq!(base.pixel(0, 0), [4, 15, 25, 4]);
    }

    #[test]
    fn normal_then_subtract_restores_rgb() {
        let r = registry();
        let mut base = buf([100, 150, 200, 255]);
        let overlay = buf([30, 40, 50, 0]);
        r.blend("normal", &mut base, &overlay).unwrap();
        r.blend("subtract", &mut base, &overlay).unwrap();
        assert_eq!(base.pixel(0, 0), [100, 150, 200, 255]);
    }

    #[test]
    fn multiply_leaves_alpha_alone() {
        let r = registry();
        let mut base = buf([255, 128, 0, 77]);
        let overlay = buf([128, 255, 200, 0]);
        r.blend("multiply", &mut base, &overlay).unwrap();
        assert_eq!(base.pixel(0, 0), [128, 128, 0, 77]);
    }

    #[test]
    fn screen_lightens_toward_white() {
        let r = registry();
        let mut base = buf([0, 128, 255, 255]);
        let overlay = buf([128, 128, 128, 255]);
        r.blend("screen", &mut base, &overlay).unwrap();
        assert_eq!(base.pixel(0, 0), [128, 192, 255, 255]);
    }

    #[test]
    fn unknown_mode_is_a_passthrough() {
        let r = registry();
        let mut base = buf([1, 2, 3, 4]);
        let overlay = buf([9, 9, 9, 9]);
        r.blend("no-such-mode", &mut base, &overlay).unwrap();
        assert_eq!(base.pixel(0, 0), [1, 2, 3, 4]);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let r = registry();
        let mut base = buf([0, 0, 0, 0]);
        let overlay = PixelBuffer::blank(2, 1).unwrap();
        assert!(matches!(
            r.blend("normal", &mut base, &overlay),
            Err(UbeError::DimensionMismatch(_))
        ));
    }
}
