use std::collections::HashMap;

use vello_cpu::kurbo::Shape as _;

use crate::foundation::core::{Color, Point, Rect};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::render::composite::over_in_place;
use crate::render::surface::Surface;
use crate::render::text::TextLayout;

/// Vector fills rasterized with `vello_cpu` and composited over a [`Surface`].
///
/// Shapes are given in canvas coordinates; the surface origin is applied as a translation.
#[derive(Default)]
pub struct Rasterizer {
    ctx: Option<vello_cpu::RenderContext>,
    fonts: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

impl std::fmt::Debug for Rasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rasterizer").finish_non_exhaustive()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_rect(&mut self, surface: &mut Surface, rect: Rect, color: Color) -> ComposerResult<()> {
        self.with_ctx(surface, |ctx| {
            ctx.set_paint(paint(color));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
        })
    }

    pub fn fill_circle(
        &mut self,
        surface: &mut Surface,
        center: Point,
        radius: f64,
        color: Color,
    ) -> ComposerResult<()> {
        let circle = vello_cpu::kurbo::Circle::new((center.x, center.y), radius);
        let path = circle.to_path(0.1);
        self.with_ctx(surface, |ctx| {
            ctx.set_paint(paint(color));
            ctx.fill_path(&path);
        })
    }

    /// Outline of a circle, `width` pixels wide.
    pub fn stroke_circle(
        &mut self,
        surface: &mut Surface,
        center: Point,
        radius: f64,
        width: f64,
        color: Color,
    ) -> ComposerResult<()> {
        let circle = vello_cpu::kurbo::Circle::new((center.x, center.y), radius);
        let path = circle.to_path(0.1);
        self.with_ctx(surface, |ctx| {
            ctx.set_paint(paint(color));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
            ctx.stroke_path(&path);
        })
    }

    /// Glyphs of `layout` with its top-left corner at `at`, each run in its own brush.
    pub fn fill_text(&mut self, surface: &mut Surface, layout: &TextLayout, at: Point) -> ComposerResult<()> {
        let mut runs = Vec::new();
        for line in layout.parley().lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let run = glyph_run.run();
                let font = run.font();
                let data = self
                    .fonts
                    .entry((font.data.id(), font.index))
                    .or_insert_with(|| {
                        vello_cpu::peniko::FontData::new(
                            vello_cpu::peniko::Blob::from(font.data.data().to_vec()),
                            font.index,
                        )
                    })
                    .clone();

                let brush = glyph_run.style().brush;
                let baseline = glyph_run.baseline();
                let mut x = glyph_run.offset();
                let glyphs: Vec<vello_cpu::Glyph> = glyph_run
                    .glyphs()
                    .map(|g| {
                        let glyph = vello_cpu::Glyph {
                            id: g.id,
                            x: x + g.x,
                            y: baseline - g.y,
                        };
                        x += g.advance;
                        glyph
                    })
                    .collect();
                runs.push((data, run.font_size(), brush, glyphs));
            }
        }
        if runs.is_empty() {
            return Ok(());
        }

        self.with_ctx(surface, |ctx| {
            let base = *ctx.transform();
            ctx.set_transform(base * vello_cpu::kurbo::Affine::translate((at.x, at.y)));
            for (font, size, brush, glyphs) in runs {
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(brush.r, brush.g, brush.b, brush.a));
                ctx.glyph_run(&font).font_size(size).fill_glyphs(glyphs.into_iter());
            }
        })
    }

    fn with_ctx(
        &mut self,
        surface: &mut Surface,
        f: impl FnOnce(&mut vello_cpu::RenderContext),
    ) -> ComposerResult<()> {
        let width = u16::try_from(surface.width())
            .map_err(|_| ComposerError::render("surface width exceeds u16"))?;
        let height = u16::try_from(surface.height())
            .map_err(|_| ComposerError::render("surface height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Ok(());
        }

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let (ox, oy) = surface.origin();
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            f64::from(ox),
            f64::from(oy),
        )));
        f(&mut ctx);
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);
        over_in_place(surface.data_mut(), pixmap.data_as_u8_slice(), 1.0)
    }
}

fn paint(color: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
