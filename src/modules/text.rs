use std::sync::Arc;

use crate::foundation::core::{Canvas, Color, Point, Region};
use crate::foundation::error::ComposerResult;
use crate::layer::handle::Viewport;
use crate::layer::module::ModuleBehavior;
use crate::layer::{DrawCx, Inputs, LayerState};
use crate::param::kinds::{ChoiceKind, ColorKind, NumberKind, RegionKind, TextKind};
use crate::param::parameter::Parameter;
use crate::param::table::ParamTable;
use crate::render::outcome::{RenderAbort, RenderResult};
use crate::render::raster::Rasterizer;
use crate::render::surface::{RetainedVisual, Surface};
use crate::render::text::{FontBook, TextLayout, TextStyle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FontWeight {
    Thin,
    ExtraLight,
    Light,
    #[default]
    Normal,
    Medium,
    SemiBold,
    Bold,
    ExtraBold,
    Black,
}

impl FontWeight {
    pub const ALL: [FontWeight; 9] = [
        FontWeight::Thin,
        FontWeight::ExtraLight,
        FontWeight::Light,
        FontWeight::Normal,
        FontWeight::Medium,
        FontWeight::SemiBold,
        FontWeight::Bold,
        FontWeight::ExtraBold,
        FontWeight::Black,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thin => "Thin",
            Self::ExtraLight => "Extra Light",
            Self::Light => "Light",
            Self::Normal => "Normal",
            Self::Medium => "Medium",
            Self::SemiBold => "Semi Bold",
            Self::Bold => "Bold",
            Self::ExtraBold => "Extra Bold",
            Self::Black => "Black",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.as_str() == s)
    }

    /// CSS numeric weight.
    pub fn value(self) -> f32 {
        match self {
            Self::Thin => 100.0,
            Self::ExtraLight => 200.0,
            Self::Light => 300.0,
            Self::Normal => 400.0,
            Self::Medium => 500.0,
            Self::SemiBold => 600.0,
            Self::Bold => 700.0,
            Self::ExtraBold => 800.0,
            Self::Black => 900.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Posture {
    #[default]
    Regular,
    Italic,
}

impl Posture {
    pub const ALL: [Posture; 2] = [Posture::Regular, Posture::Italic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::Italic => "Italic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

struct Shaped {
    content: String,
    style: TextStyle,
    layout: TextLayout,
}

struct Rendered {
    location: Region,
    window: Region,
    pixels: Arc<Vec<u8>>,
}

/// A block of text whose top-left corner sits at "Location".
///
/// Layout sizes the location to the shaped text, so the selection frame hugs the glyphs.
/// Families resolve against the module's [`FontBook`] only.
pub struct Text {
    fonts: FontBook,
    content: String,
    raster: Rasterizer,
    shaped: Option<Shaped>,
    rendered: Option<Rendered>,
}

impl Text {
    pub fn new(fonts: FontBook) -> Self {
        Self {
            fonts,
            content: "Text".to_owned(),
            raster: Rasterizer::new(),
            shaped: None,
            rendered: None,
        }
    }

    /// Initial "Content"; may be empty.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    fn style(&self, layer: &LayerState, table: &ParamTable) -> RenderResult<(String, TextStyle)> {
        let inputs = layer.inputs();
        let content = inputs.require::<TextKind>(table, "Content")?;
        if content.trim().is_empty() {
            return Err(RenderAbort::skip("no text"));
        }
        let requested = inputs.require::<TextKind>(table, "Family")?;
        let family = self.fonts.family(&requested).ok_or_else(|| {
            RenderAbort::skip(format!("font family \"{requested}\" is not available"))
        })?;
        let weight = FontWeight::parse(&inputs.require::<ChoiceKind>(table, "Weight")?)
            .unwrap_or_default();
        let posture = Posture::parse(&inputs.require::<ChoiceKind>(table, "Posture")?)
            .unwrap_or_default();
        let size = inputs.require::<NumberKind>(table, "Size")?;
        let wrap = inputs.require::<NumberKind>(table, "Wrap")?;
        let color = inputs.require::<ColorKind>(table, "Color")?;

        let style = TextStyle {
            family,
            weight: weight.value(),
            italic: posture == Posture::Italic,
            size: size as f32,
            color,
            wrap: (wrap > 0.0).then_some(wrap as f32),
        };
        Ok((content, style))
    }

    /// Reshape only when the text or its style changed.
    fn shape(&mut self, layer: &LayerState, table: &ParamTable) -> RenderResult<&TextLayout> {
        let (content, style) = self.style(layer, table)?;
        let stale = self
            .shaped
            .as_ref()
            .is_none_or(|s| s.content != content || s.style != style);
        if stale {
            let layout = self.fonts.layout(&content, &style)?;
            self.shaped = Some(Shaped {
                content,
                style,
                layout,
            });
            self.rendered = None;
        }
        match &self.shaped {
            Some(shaped) => Ok(&shaped.layout),
            None => Err(RenderAbort::skip("no text")),
        }
    }
}

impl ModuleBehavior for Text {
    fn type_name(&self) -> &'static str {
        "Text"
    }

    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>) -> ComposerResult<()> {
        let edge = f64::from(Canvas::MAX_EDGE);
        let family = self
            .fonts
            .families()
            .into_iter()
            .next()
            .unwrap_or_else(|| "sans-serif".to_owned());

        inputs.add(
            "Content",
            Parameter::new("Content", TextKind { allow_empty: true })
                .with_default(self.content.clone())
                .with_order(0),
        )?;
        inputs.add(
            "Family",
            Parameter::new("Family", TextKind::default())
                .with_default(family)
                .with_order(1),
        )?;
        inputs.add(
            "Weight",
            Parameter::new("Weight", ChoiceKind::new(FontWeight::ALL.map(FontWeight::as_str)))
                .with_default(FontWeight::Normal.as_str().to_owned())
                .with_order(2),
        )?;
        inputs.add(
            "Posture",
            Parameter::new("Posture", ChoiceKind::new(Posture::ALL.map(Posture::as_str)))
                .with_default(Posture::Regular.as_str().to_owned())
                .with_order(3),
        )?;
        inputs.add(
            "Size",
            Parameter::new("Size", NumberKind::decimal().at_least(1.0).at_most(1000.0))
                .with_default(24.0)
                .with_order(4),
        )?;
        inputs.add(
            "Wrap",
            Parameter::new("Wrap", NumberKind::decimal().at_least(0.0).at_most(edge))
                .with_default(0.0)
                .with_order(5),
        )?;
        inputs.add(
            "Color",
            Parameter::new("Color", ColorKind)
                .with_default(Color::BLACK)
                .with_order(6),
        )?;
        inputs.add(
            "Location",
            Parameter::new("Location", RegionKind)
                .with_default(Region::default())
                .with_order(7),
        )?;
        Ok(())
    }

    fn is_node(&self) -> bool {
        true
    }

    fn request_layout(
        &mut self,
        layer: &LayerState,
        _viewport: &mut Viewport,
        table: &mut ParamTable,
    ) -> RenderResult<()> {
        let (w, h) = self.shape(layer, table)?.size();
        let (Ok(w), Ok(h)) = (i32::try_from(w), i32::try_from(h)) else {
            return Err(RenderAbort::skip("text is too large"));
        };
        if let Some(location) = layer.inputs().get_mut::<RegionKind>(table, "Location")
            && let Some(at) = location.get_value()
            && (at.width, at.height) != (w, h)
        {
            location.initialize(Region::new(at.x, at.y, w, h));
        }
        Ok(())
    }

    fn retained_visual(&mut self, layer: &LayerState, cx: &DrawCx<'_>) -> RenderResult<RetainedVisual> {
        let location = layer.inputs().require::<RegionKind>(cx.table, "Location")?;
        self.shape(layer, cx.table)?;
        if location.is_degenerate() {
            return Err(RenderAbort::skip("location is empty"));
        }
        let Some(window) = cx.viewport.clip(location) else {
            return Err(RenderAbort::skip("location is outside the viewport"));
        };

        let cached = self
            .rendered
            .as_ref()
            .filter(|r| r.location == location && r.window == window)
            .map(|r| Arc::clone(&r.pixels));
        let pixels = match cached {
            Some(pixels) => pixels,
            None => {
                let Some(shaped) = &self.shaped else {
                    return Err(RenderAbort::skip("no text"));
                };
                let mut surface = Surface::with_origin(
                    window.width as u32,
                    window.height as u32,
                    (-window.x, -window.y),
                );
                let at = Point::new(f64::from(location.x), f64::from(location.y));
                self.raster.fill_text(&mut surface, &shaped.layout, at)?;
                let pixels = Arc::new(surface.into_data());
                self.rendered = Some(Rendered {
                    location,
                    window,
                    pixels: Arc::clone(&pixels),
                });
                pixels
            }
        };
        Ok(RetainedVisual {
            pixels,
            width: window.width as u32,
            height: window.height as u32,
            x: window.x,
            y: window.y,
        })
    }
}

impl std::fmt::Debug for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Text")
            .field("fonts", &self.fonts)
            .field("shaped", &self.shaped.as_ref().map(|s| &s.layout))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/modules/text.rs"]
mod tests;
