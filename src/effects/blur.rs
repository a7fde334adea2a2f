use crate::foundation::error::ComposerResult;
use crate::layer::effect::EffectBehavior;
use crate::layer::{DrawCx, Inputs, LayerState};
use crate::param::kinds::NumberKind;
use crate::param::parameter::Parameter;
use crate::render::blur::{blur_rgba8_premul, sigma_for_radius};
use crate::render::outcome::RenderResult;
use crate::render::surface::{RetainedVisual, Surface};

const MAX_RADIUS: f64 = 64.0;

/// Gaussian blur over the whole surface.
#[derive(Debug, Default)]
pub struct Blur {
    scratch: Vec<u8>,
}

impl EffectBehavior for Blur {
    fn type_name(&self) -> &'static str {
        "Blur"
    }

    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>) -> ComposerResult<()> {
        inputs.add(
            "Radius",
            Parameter::new("Radius", NumberKind::integer().at_least(0.0).at_most(MAX_RADIUS))
                .with_default(4.0),
        )?;
        Ok(())
    }

    fn reset(&mut self) {
        self.scratch.clear();
    }

    fn apply(
        &mut self,
        layer: &LayerState,
        surface: &mut Surface,
        _related: Option<&RetainedVisual>,
        cx: &DrawCx<'_>,
    ) -> RenderResult<()> {
        let radius = layer.inputs().require::<NumberKind>(cx.table, "Radius")? as u32;
        if radius == 0 {
            return Ok(());
        }
        let out = blur_rgba8_premul(
            surface.data(),
            surface.width(),
            surface.height(),
            radius,
            sigma_for_radius(radius),
            &mut self.scratch,
        )?;
        surface.data_mut().copy_from_slice(&out);
        Ok(())
    }
}
