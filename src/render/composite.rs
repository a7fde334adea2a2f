use crate::foundation::error::{ComposerError, ComposerResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over on premultiplied pixels, `src` scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> ComposerResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ComposerError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Fill with a two-color checkerboard of `cell`-pixel squares, anchored at `origin`.
pub fn checkerboard(
    dst: &mut [u8],
    width: u32,
    origin: (i32, i32),
    cell: u32,
    light: PremulRgba8,
    dark: PremulRgba8,
) {
    let cell = cell.max(1) as i32;
    let w = width as usize;
    for (i, px) in dst.chunks_exact_mut(4).enumerate() {
        let x = (i % w) as i32 - origin.0;
        let y = (i / w) as i32 - origin.1;
        let odd = (x.div_euclid(cell) + y.div_euclid(cell)).rem_euclid(2) == 1;
        px.copy_from_slice(if odd { &dark } else { &light });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
