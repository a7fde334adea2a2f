pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Straight RGBA8 to premultiplied RGBA8, in place.
pub(crate) fn premultiply_in_place(px: &mut [u8]) {
    for p in px.chunks_exact_mut(4) {
        let a = u16::from(p[3]);
        if a == 255 {
            continue;
        }
        p[0] = mul_div255_u8(u16::from(p[0]), a);
        p[1] = mul_div255_u8(u16::from(p[1]), a);
        p[2] = mul_div255_u8(u16::from(p[2]), a);
    }
}

/// Premultiplied RGBA8 back to straight RGBA8, in place.
pub(crate) fn unpremultiply_in_place(px: &mut [u8]) {
    for p in px.chunks_exact_mut(4) {
        let a = u32::from(p[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut p[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
