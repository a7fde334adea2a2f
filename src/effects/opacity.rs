use crate::foundation::error::ComposerResult;
use crate::layer::effect::EffectBehavior;
use crate::layer::{DrawCx, Inputs, LayerState};
use crate::param::kinds::NumberKind;
use crate::param::parameter::Parameter;
use crate::render::outcome::RenderResult;
use crate::render::surface::{RetainedVisual, Surface};

/// Uniform fade, as a percentage.
#[derive(Debug, Default)]
pub struct Opacity;

impl EffectBehavior for Opacity {
    fn type_name(&self) -> &'static str {
        "Opacity"
    }

    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>) -> ComposerResult<()> {
        inputs.add(
            "Opacity",
            Parameter::new("Opacity", NumberKind::decimal().at_least(0.0).at_most(100.0))
                .with_default(100.0),
        )?;
        Ok(())
    }

    fn reset(&mut self) {}

    fn apply(
        &mut self,
        layer: &LayerState,
        surface: &mut Surface,
        _related: Option<&RetainedVisual>,
        cx: &DrawCx<'_>,
    ) -> RenderResult<()> {
        let percent = layer.inputs().require::<NumberKind>(cx.table, "Opacity")?;
        surface.scale_alpha((percent / 100.0) as f32);
        Ok(())
    }
}
