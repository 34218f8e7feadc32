//! Built-in filters. Per-channel arithmetic is intentional 8-bit wraparound
//! (not saturation) except for the posterizing filters, which clamp their
//! quantized value at 255.

use std::sync::Arc;

use crate::buffer::PixelBuffer;
use crate::error::{UbeError, UbeResult};
use crate::filter::{FilterArgs, FilterCtx, FilterRegistry};

/// Register every standard filter under its canonical name.
pub fn register_builtins(registry: &mut FilterRegistry) {
    fn in_place(
        f: impl Fn(&mut PixelBuffer, &FilterArgs) -> UbeResult<()> + Send + Sync + 'static,
    ) -> Arc<dyn crate::filter::Filter> {
        Arc::new(
            move |buf: &mut PixelBuffer,
                  args: &FilterArgs,
                  _ctx: &mut FilterCtx<'_>|
                  -> UbeResult<Option<PixelBuffer>> {
                f(buf, args)?;
                Ok(None)
            },
        )
    }

    registry.register("invert", in_place(|buf, _| invert(buf)));
    registry.register("rgba", in_place(rgba));
    registry.register("lighten", in_place(lighten));
    registry.register("darken", in_place(darken));
    registry.register("grayscale", in_place(|buf, _| grayscale(buf)));
    registry.register("sepiatone", in_place(sepiatone));
    registry.register("monochrome", in_place(monochrome));
    registry.register("threshold", in_place(threshold));
    registry.register("rgbbits", in_place(rgbbits));
    registry.register("channel", in_place(channel));
    registry.register("shift", in_place(shift));
    registry.register("opacity", in_place(opacity));
    registry.register(
        "crop",
        Arc::new(
            |buf: &mut PixelBuffer,
             args: &FilterArgs,
             ctx: &mut FilterCtx<'_>|
             -> UbeResult<Option<PixelBuffer>> {
                crop(buf, args, ctx).map(Some)
            },
        ),
    );
}

fn wrap_add(c: u8, delta: i64) -> u8 {
    (c as i64).wrapping_add(delta) as u8
}

/// `c' = 255 - c` on RGB; alpha untouched. Transparent pixels still flip.
pub fn invert(buf: &mut PixelBuffer) -> UbeResult<()> {
    for px in buf.data_mut().chunks_exact_mut(4) {
        px[0] = 255 - px[0];
        px[1] = 255 - px[1];
        px[2] = 255 - px[2];
    }
    Ok(())
}

/// Additive per-channel offset `[dr, dg, db, da]`; missing entries are 0.
pub fn rgba(buf: &mut PixelBuffer, args: &FilterArgs) -> UbeResult<()> {
    let mut deltas = [0i64; 4];
    for (i, d) in deltas.iter_mut().enumerate() {
        *d = args.f64_or(i, 0.0)?.round() as i64;
    }
    offset_channels(buf, deltas);
    Ok(())
}

fn offset_channels(buf: &mut PixelBuffer, deltas: [i64; 4]) {
    if deltas == [0, 0, 0, 0] {
        return;
    }
    for px in buf.data_mut().chunks_exact_mut(4) {
        for (c, d) in px.iter_mut().zip(deltas) {
            *c = wrap_add(*c, d);
        }
    }
}

pub fn lighten(buf: &mut PixelBuffer, args: &FilterArgs) -> UbeResult<()> {
    let n = args.f64_req(0)?.round() as i64;
    offset_channels(buf, [n, n, n, 0]);
    Ok(())
}

pub fn darken(buf: &mut PixelBuffer, args: &FilterArgs) -> UbeResult<()> {
    let n = args.f64_req(0)?.round() as i64;
    offset_channels(buf, [-n, -n, -n, 0]);
    Ok(())
}

/// R, G and B each become `round((R+G+B)/3)`.
pub fn grayscale(buf: &mut PixelBuffer) -> UbeResult<()> {
    for px in buf.data_mut().chunks_exact_mut(4) {
        let sum = px[0] as u32 + px[1] as u32 + px[2] as u32;
        let avg = ((sum as f64) / 3.0).round() as u8;
        px[0] = avg;
        px[1] = avg;
        px[2] = avg;
    }
    Ok(())
}

/// Grayscale plus an additive warm tint scaled by `n/100` (default 1).
pub fn sepiatone(buf: &mut PixelBuffer, args: &FilterArgs) -> UbeResult<()> {
    let v = match args.f64_opt(0)? {
        Some(n) => n / 100.0,
        None => 1.0,
    };
    grayscale(buf)?;
    let tint = [
        (94.0 * v).round() as i64,
        (38.0 * v).round() as i64,
        (18.0 * v).round() as i64,
    ];
    offset_channels(buf, [tint[0], tint[1], tint[2], 0]);
    Ok(())
}

/// Posterize luminance to `2^levels - 1` quantization steps.
pub fn monochrome(buf: &mut PixelBuffer, args: &FilterArgs) -> UbeResult<()> {
    let levels = args.i64_req(0)?;
    if !(1..=8).contains(&levels) {
        return Err(UbeError::invalid_argument(
            "monochrome levels must be in 1..=8",
        ));
    }
    let bits = (1i64 << levels) - 1;
    let step = (255.0 / bits as f64).round();
    for px in buf.data_mut().chunks_exact_mut(4) {
        let avg = (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0;
        let value = ((avg / step).round() * step).min(255.0) as u8;
        px[0] = value;
        px[1] = value;
        px[2] = value;
    }
    Ok(())
}

/// Binary black/white on whether `R+G+B` falls below the reference sum.
pub fn threshold(buf: &mut PixelBuffer, args: &FilterArgs) -> UbeResult<()> {
    let sum = args.f64_req(0)? + args.f64_req(1)? + args.f64_req(2)?;
    for px in buf.data_mut().chunks_exact_mut(4) {
        let v = if ((px[0] as u32 + px[1] as u32 + px[2] as u32) as f64) < sum {
            0
        } else {
            255
        };
        px[0] = v;
        px[1] = v;
        px[2] = v;
    }
    Ok(())
}

/// Posterize R, G, B independently to a `round(255/n)` step size.
pub fn rgbbits(buf: &mut PixelBuffer, args: &FilterArgs) -> UbeResult<()> {
    let n = args.f64_req(0)?;
    if !n.is_finite() || n < 1.0 {
        return Err(UbeError::invalid_argument("rgbbits n must be >= 1"));
    }
    let step = (255.0 / n).round();
    for px in buf.data_mut().chunks_exact_mut(4) {
        for c in &mut px[..3] {
            *c = ((*c as f64 / step).round() * step).min(255.0) as u8;
        }
    }
    Ok(())
}

/// Zero every channel except the selected one (and alpha). Selecting `a`
/// zeroes all of RGB.
pub fn channel(buf: &mut PixelBuffer, args: &FilterArgs) -> UbeResult<()> {
    let name = args.str_req(0)?;
    let keep = match name.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('r') => 0usize,
        Some('g') => 1,
        Some('b') => 2,
        Some('a') => 3,
        _ => {
            return Err(UbeError::invalid_argument(format!(
                "channel must be r, g, b or a, got '{name}'"
            )));
        }
    };
    for px in buf.data_mut().chunks_exact_mut(4) {
        for (i, c) in px[..3].iter_mut().enumerate() {
            if i != keep {
                *c = 0;
            }
        }
    }
    Ok(())
}

/// Cyclically rotate the RGB triplet by `n mod 3` positions; negative wraps.
pub fn shift(buf: &mut PixelBuffer, args: &FilterArgs) -> UbeResult<()> {
    let amount = args.i64_req(0)?.rem_euclid(3) as usize;
    if amount == 0 {
        return Ok(());
    }
    for px in buf.data_mut().chunks_exact_mut(4) {
        let rgb = [px[0], px[1], px[2]];
        px[0] = rgb[amount];
        px[1] = rgb[(amount + 1) % 3];
        px[2] = rgb[(amount + 2) % 3];
    }
    Ok(())
}

/// Multiply the alpha channel by a factor in `0..=1`. Used by `layer` to
/// pre-attenuate a scratch surface before blending.
pub fn opacity(buf: &mut PixelBuffer, args: &FilterArgs) -> UbeResult<()> {
    let factor = args.f64_req(0)?;
    if !(0.0..=1.0).contains(&factor) {
        return Err(UbeError::invalid_argument(
            "opacity factor must be in 0..=1",
        ));
    }
    for px in buf.data_mut().chunks_exact_mut(4) {
        px[3] = (px[3] as f64 * factor).round() as u8;
    }
    Ok(())
}

/// Replace the working buffer with the `[x, y, w, h]` sub-rectangle and
/// resize the backing surface to match. The one filter with side effects on
/// surface dimensions.
pub fn crop(
    buf: &mut PixelBuffer,
    args: &FilterArgs,
    ctx: &mut FilterCtx<'_>,
) -> UbeResult<PixelBuffer> {
    let mut coords = [0i64; 4];
    for (i, c) in coords.iter_mut().enumerate() {
        *c = args.i64_req(i)?;
    }
    let [x, y, w, h] = coords;
    if x < 0 || y < 0 || w < 1 || h < 1 {
        return Err(UbeError::invalid_argument(
            "crop coords must be [x>=0, y>=0, w>=1, h>=1]",
        ));
    }

    // Commit pending work so the crop reads filtered pixels.
    ctx.write_back(buf)?;
    let cropped = ctx.read_rect(x as u32, y as u32, w as u32, h as u32)?;
    ctx.resize_surface(w as u32, h as u32)?;
    Ok(cropped)
}
