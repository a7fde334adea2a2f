use crate::foundation::core::{Color, Region};
use crate::foundation::error::ComposerResult;
use crate::layer::module::ModuleBehavior;
use crate::layer::{DrawCx, Inputs, LayerState};
use crate::param::kinds::{ColorKind, RegionKind};
use crate::param::parameter::Parameter;
use crate::render::outcome::{RenderAbort, RenderResult};
use crate::render::raster::Rasterizer;
use crate::render::surface::Surface;

/// A filled rectangle.
#[derive(Debug, Default)]
pub struct Solid {
    raster: Rasterizer,
}

impl ModuleBehavior for Solid {
    fn type_name(&self) -> &'static str {
        "Solid"
    }

    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>) -> ComposerResult<()> {
        inputs.add(
            "Background",
            Parameter::new("Background", ColorKind)
                .with_default(Color::WHITE)
                .with_order(0),
        )?;
        inputs.add(
            "Location",
            Parameter::new("Location", RegionKind)
                .with_default(Region::new(0, 0, 100, 100))
                .with_order(1),
        )?;
        Ok(())
    }

    fn draw(&mut self, layer: &LayerState, surface: &mut Surface, cx: &DrawCx<'_>) -> RenderResult<()> {
        let inputs = layer.inputs();
        let color = inputs.require::<ColorKind>(cx.table, "Background")?;
        let location = inputs.require::<RegionKind>(cx.table, "Location")?;
        if location.is_degenerate() {
            return Err(RenderAbort::skip("location is empty"));
        }
        self.raster.fill_rect(surface, location.to_rect(), color)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/modules/solid.rs"]
mod tests;
