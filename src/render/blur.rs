use crate::foundation::error::{ComposerError, ComposerResult};

const ONE_Q16: u32 = 1 << 16;

/// Separable gaussian blur over premultiplied RGBA8 with edge clamping.
///
/// `tmp` is scratch space and is resized as needed, so callers can keep it across passes.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
    tmp: &mut Vec<u8>,
) -> ComposerResult<Vec<u8>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(|| ComposerError::render(format!("blur of {width}x{height} overflows")))?;
    if src.len() != len {
        return Err(ComposerError::render(format!(
            "blur source holds {} bytes, {width}x{height} needs {len}",
            src.len()
        )));
    }
    if radius == 0 || len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = kernel_q16(radius, sigma)?;
    tmp.clear();
    tmp.resize(len, 0);
    let mut out = vec![0u8; len];

    let (w, h) = (width as usize, height as usize);
    convolve(src, tmp, Axis::Rows { w, h }, &kernel);
    convolve(tmp, &mut out, Axis::Columns { w, h }, &kernel);
    Ok(out)
}

/// Sigma the editor uses for a given radius.
pub fn sigma_for_radius(radius: u32) -> f32 {
    (radius as f32 / 2.0).max(0.5)
}

/// Normalized 16.16 weights for `-radius..=radius`; any rounding drift lands on the center tap.
fn kernel_q16(radius: u32, sigma: f32) -> ComposerResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ComposerError::validation("blur sigma must be > 0"));
    }

    let r = radius as i64;
    let two_s2 = 2.0 * f64::from(sigma).powi(2);
    let raw: Vec<f64> = (-r..=r).map(|i| (-((i * i) as f64) / two_s2).exp()).collect();
    let total: f64 = raw.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(ComposerError::render("blur kernel has no weight"));
    }

    let mut weights: Vec<u32> = raw
        .iter()
        .map(|w| ((w / total) * f64::from(ONE_Q16)).round() as u32)
        .collect();
    let drift = i64::from(ONE_Q16) - weights.iter().map(|&w| i64::from(w)).sum::<i64>();
    let center = &mut weights[radius as usize];
    *center = (i64::from(*center) + drift).clamp(0, i64::from(ONE_Q16)) as u32;
    Ok(weights)
}

#[derive(Clone, Copy)]
enum Axis {
    Rows { w: usize, h: usize },
    Columns { w: usize, h: usize },
}

impl Axis {
    /// (lines, samples per line, pixel step along a line, pixel step between lines)
    fn walk(self) -> (usize, usize, usize, usize) {
        match self {
            Axis::Rows { w, h } => (h, w, 1, w),
            Axis::Columns { w, h } => (w, h, w, 1),
        }
    }
}

fn convolve(src: &[u8], dst: &mut [u8], axis: Axis, kernel: &[u32]) {
    let (lines, len, step, line_step) = axis.walk();
    let radius = (kernel.len() / 2) as isize;
    let last = len as isize - 1;
    for line in 0..lines {
        let base = line * line_step;
        for at in 0..len {
            let mut acc = [0u64; 4];
            for (k, &weight) in kernel.iter().enumerate() {
                let pos = (at as isize + k as isize - radius).clamp(0, last) as usize;
                let px = (base + pos * step) * 4;
                for (sum, &channel) in acc.iter_mut().zip(&src[px..px + 4]) {
                    *sum += u64::from(weight) * u64::from(channel);
                }
            }
            let px = (base + at * step) * 4;
            for (out, sum) in dst[px..px + 4].iter_mut().zip(acc) {
                *out = ((sum + u64::from(ONE_Q16 / 2)) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
