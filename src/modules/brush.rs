use crate::foundation::core::{Color, Point};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::foundation::math::{premultiply_in_place, unpremultiply_in_place};
use crate::layer::handle::{PointerEvent, PointerKind};
use crate::layer::module::ModuleBehavior;
use crate::layer::{DrawCx, EventCx, Inputs, LayerState};
use crate::param::kinds::{ChoiceKind, ColorKind, ImageData, ImageKind, NumberKind};
use crate::param::parameter::Parameter;
use crate::render::composite::over;
use crate::render::outcome::RenderResult;
use crate::render::raster::Rasterizer;
use crate::render::surface::Surface;

const OUTLINE: Color = Color::rgba(128, 128, 128, 255);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrushMode {
    Draw,
    Erase,
}

impl BrushMode {
    pub const ALL: [BrushMode; 2] = [BrushMode::Draw, BrushMode::Erase];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draw => "Draw",
            Self::Erase => "Erase",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

/// Freehand painting. Strokes live in a headless canvas-sized image input, so they persist
/// with the template.
///
/// While selected in editor mode the brush outlines its footprint at the last pointer position.
#[derive(Debug, Default)]
pub struct Brush {
    last: Option<Point>,
    selected: bool,
    cursor: Option<Point>,
    raster: Rasterizer,
}

impl ModuleBehavior for Brush {
    fn type_name(&self) -> &'static str {
        "Brush"
    }

    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>) -> ComposerResult<()> {
        inputs.add(
            "Color",
            Parameter::new("Color", ColorKind)
                .with_default(Color::BLACK)
                .with_order(0),
        )?;
        inputs.add(
            "Size",
            Parameter::new("Size", NumberKind::integer().at_least(1.0))
                .with_default(10.0)
                .with_order(1),
        )?;
        inputs.add(
            "Mode",
            Parameter::new("Mode", ChoiceKind::new(BrushMode::ALL.map(BrushMode::as_str)))
                .with_default(BrushMode::Draw.as_str().to_owned())
                .with_order(2),
        )?;
        inputs.add("Strokes", Parameter::new("Strokes", ImageKind::headless()))?;
        Ok(())
    }

    fn draw(&mut self, layer: &LayerState, surface: &mut Surface, cx: &DrawCx<'_>) -> RenderResult<()> {
        // No strokes yet is a valid, empty drawing.
        if let Some(strokes) = layer.inputs().value::<ImageKind>(cx.table, "Strokes") {
            surface.draw_premul(
                &strokes.to_premul_bytes(),
                strokes.width(),
                strokes.height(),
                0,
                0,
                1.0,
            )?;
        }
        if cx.editor
            && self.selected
            && let Some(at) = self.cursor
            && let Some(size) = layer.inputs().value::<NumberKind>(cx.table, "Size")
        {
            self.raster
                .stroke_circle(surface, at, (size / 2.0).max(0.5), 1.0, OUTLINE)?;
        }
        Ok(())
    }

    fn on_input_event(
        &mut self,
        layer: &LayerState,
        event: &PointerEvent,
        cx: &mut EventCx<'_>,
    ) -> ComposerResult<bool> {
        if !cx.editor {
            return Ok(false);
        }
        self.cursor = Some(event.position);
        // Drags continue from the last stamped point; a press starts fresh.
        let from = match event.kind {
            PointerKind::Hover => return Ok(self.selected),
            PointerKind::Release => return Ok(self.last.take().is_some()),
            PointerKind::Press => None,
            PointerKind::Drag => match self.last {
                Some(p) => Some(p),
                None => return Ok(false),
            },
        };

        let inputs = layer.inputs();
        let (Some(color), Some(size), Some(mode)) = (
            inputs.value::<ColorKind>(cx.table, "Color"),
            inputs.value::<NumberKind>(cx.table, "Size"),
            inputs.value::<ChoiceKind>(cx.table, "Mode"),
        ) else {
            return Ok(false);
        };
        let mode = BrushMode::parse(&mode).unwrap_or(BrushMode::Draw);

        let param = inputs
            .get_mut::<ImageKind>(cx.table, "Strokes")
            .ok_or_else(|| ComposerError::validation("brush has no strokes input"))?;
        let mut strokes = fit_to_canvas(param.get_value(), cx.canvas.width, cx.canvas.height);
        let radius = (size / 2.0).max(0.5);
        match from {
            Some(from) => stroke_segment(strokes.make_mut(), from, event.position, radius, color, mode),
            None => stamp_disc(strokes.make_mut(), event.position, radius, color, mode),
        }
        param.initialize(strokes);
        param.touch();
        self.last = Some(event.position);
        Ok(true)
    }

    fn on_selection_change(
        &mut self,
        _layer: &LayerState,
        selected: bool,
        _table: &mut crate::param::table::ParamTable,
    ) {
        self.last = None;
        self.selected = selected;
        if !selected {
            self.cursor = None;
        }
    }
}

fn fit_to_canvas(existing: Option<ImageData>, width: u32, height: u32) -> ImageData {
    match existing {
        Some(img) if img.width() == width && img.height() == height => img,
        Some(img) => {
            let mut canvas = image::RgbaImage::new(width, height);
            image::imageops::replace(&mut canvas, img.as_image(), 0, 0);
            ImageData::new(canvas)
        }
        None => ImageData::new(image::RgbaImage::new(width, height)),
    }
}

/// Stamp discs from just past `from` up to `to`; `from` itself was stamped by the previous event.
fn stroke_segment(
    img: &mut image::RgbaImage,
    from: Point,
    to: Point,
    radius: f64,
    color: Color,
    mode: BrushMode,
) {
    let step = (radius / 2.0).max(1.0);
    let steps = ((to - from).hypot() / step).ceil().max(1.0) as u32;
    for i in 1..=steps {
        let t = f64::from(i) / f64::from(steps);
        stamp_disc(img, from.lerp(to, t), radius, color, mode);
    }
}

fn stamp_disc(img: &mut image::RgbaImage, center: Point, radius: f64, color: Color, mode: BrushMode) {
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    let x0 = ((center.x - radius).floor() as i64).max(0);
    let x1 = ((center.x + radius).ceil() as i64).min(w - 1);
    let y0 = ((center.y - radius).floor() as i64).max(0);
    let y1 = ((center.y + radius).ceil() as i64).min(h - 1);
    let src = color.to_premul();
    let r2 = radius * radius;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 + 0.5 - center.x;
            let dy = y as f64 + 0.5 - center.y;
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let px = img.get_pixel_mut(x as u32, y as u32);
            px.0 = match mode {
                BrushMode::Erase => [0, 0, 0, 0],
                BrushMode::Draw if color.a == 255 => [color.r, color.g, color.b, 255],
                BrushMode::Draw => {
                    let mut dst = px.0;
                    premultiply_in_place(&mut dst);
                    let mut out = over(dst, src, 1.0);
                    unpremultiply_in_place(&mut out);
                    out
                }
            };
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/modules/brush.rs"]
mod tests;
