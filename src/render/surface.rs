use std::sync::Arc;

use crate::foundation::core::Region;
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::render::composite::over;

/// Premultiplied RGBA8 pixels covering the (possibly expanded) viewport.
///
/// `origin` is where canvas pixel `(0, 0)` sits inside the surface; it is non-zero when a
/// layout pass grew the viewport up or left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    origin: (i32, i32),
    data: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_origin(width, height, (0, 0))
    }

    pub fn with_origin(width: u32, height: u32, origin: (i32, i32)) -> Self {
        Self {
            width,
            height,
            origin,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Resize to the given geometry and clear to transparent.
    pub fn reset(&mut self, width: u32, height: u32, origin: (i32, i32)) {
        let len = (width as usize) * (height as usize) * 4;
        self.width = width;
        self.height = height;
        self.origin = origin;
        self.data.clear();
        self.data.resize(len, 0);
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin(&self) -> (i32, i32) {
        self.origin
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

    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Pixel at surface coordinates.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Pixel at canvas coordinates.
    pub fn canvas_pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let sx = u32::try_from(x + self.origin.0).ok()?;
        let sy = u32::try_from(y + self.origin.1).ok()?;
        self.pixel(sx, sy)
    }

    /// Composite `src` (premultiplied, `src_w * src_h`) with its top-left at canvas `(x, y)`.
    pub fn draw_premul(
        &mut self,
        src: &[u8],
        src_w: u32,
        src_h: u32,
        x: i32,
        y: i32,
        opacity: f32,
    ) -> ComposerResult<()> {
        if src.len() != (src_w as usize) * (src_h as usize) * 4 {
            return Err(ComposerError::render(
                "draw_premul expects src matching width*height*4",
            ));
        }
        let dx0 = x + self.origin.0;
        let dy0 = y + self.origin.1;
        for sy in 0..src_h as i32 {
            let dy = dy0 + sy;
            if dy < 0 || dy >= self.height as i32 {
                continue;
            }
            for sx in 0..src_w as i32 {
                let dx = dx0 + sx;
                if dx < 0 || dx >= self.width as i32 {
                    continue;
                }
                let si = ((sy as usize) * (src_w as usize) + (sx as usize)) * 4;
                let di = ((dy as usize) * (self.width as usize) + (dx as usize)) * 4;
                let out = over(
                    [
                        self.data[di],
                        self.data[di + 1],
                        self.data[di + 2],
                        self.data[di + 3],
                    ],
                    [src[si], src[si + 1], src[si + 2], src[si + 3]],
                    opacity,
                );
                self.data[di..di + 4].copy_from_slice(&out);
            }
        }
        Ok(())
    }

    /// Composite a same-geometry surface over this one.
    pub fn draw_surface(&mut self, src: &Surface, opacity: f32) -> ComposerResult<()> {
        if src.width != self.width || src.height != self.height || src.origin != self.origin {
            return Err(ComposerError::render("draw_surface expects matching geometry"));
        }
        crate::render::composite::over_in_place(&mut self.data, &src.data, opacity)
    }

    /// Multiply every pixel (all four premultiplied channels) by `factor`.
    pub fn scale_alpha(&mut self, factor: f32) {
        let f = ((factor.clamp(0.0, 1.0) * 255.0).round() as u16).min(255);
        if f == 255 {
            return;
        }
        for c in &mut self.data {
            *c = crate::foundation::math::mul_div255_u8(u16::from(*c), f);
        }
    }
}

/// A module's retained drawable: decoded pixels plus where they sit on the canvas.
#[derive(Clone, Debug)]
pub struct RetainedVisual {
    /// Premultiplied RGBA8, `width * height * 4`.
    pub pixels: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

impl RetainedVisual {
    pub fn bounds(&self) -> Region {
        Region::new(self.x, self.y, self.width as i32, self.height as i32)
    }

    /// Bind into `surface` at the visual's position.
    pub fn bind(&self, surface: &mut Surface) -> ComposerResult<()> {
        surface.draw_premul(&self.pixels, self.width, self.height, self.x, self.y, 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
