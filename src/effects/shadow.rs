use crate::foundation::core::{Canvas, Color};
use crate::foundation::error::ComposerResult;
use crate::foundation::math::mul_div255_u8;
use crate::layer::effect::EffectBehavior;
use crate::layer::{DrawCx, Inputs, LayerState};
use crate::param::kinds::{ColorKind, NumberKind};
use crate::param::parameter::Parameter;
use crate::render::blur::{blur_rgba8_premul, sigma_for_radius};
use crate::render::composite::over;
use crate::render::outcome::RenderResult;
use crate::render::surface::{RetainedVisual, Surface};

/// Offset, optionally softened copy of the module's silhouette, composited underneath it.
///
/// The silhouette comes from the related node's pixels when the module has one, otherwise from
/// the surface alpha.
#[derive(Debug, Default)]
pub struct DropShadow {
    shadow: Vec<u8>,
    scratch: Vec<u8>,
}

/// Offsets past a full canvas edge cannot land on the surface.
fn offset_kind() -> NumberKind {
    let edge = f64::from(Canvas::MAX_EDGE);
    NumberKind::integer().at_least(-edge).at_most(edge)
}

impl EffectBehavior for DropShadow {
    fn type_name(&self) -> &'static str {
        "DropShadow"
    }

    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>) -> ComposerResult<()> {
        inputs.add(
            "Color",
            Parameter::new("Color", ColorKind)
                .with_default(Color::rgba(0, 0, 0, 160))
                .with_order(0),
        )?;
        inputs.add(
            "Offset X",
            Parameter::new("Offset X", offset_kind())
                .with_default(4.0)
                .with_order(1),
        )?;
        inputs.add(
            "Offset Y",
            Parameter::new("Offset Y", offset_kind())
                .with_default(4.0)
                .with_order(2),
        )?;
        inputs.add(
            "Softness",
            Parameter::new("Softness", NumberKind::integer().at_least(0.0).at_most(64.0))
                .with_default(0.0)
                .with_order(3),
        )?;
        Ok(())
    }

    fn reset(&mut self) {
        self.shadow.clear();
    }

    fn apply(
        &mut self,
        layer: &LayerState,
        surface: &mut Surface,
        related: Option<&RetainedVisual>,
        cx: &DrawCx<'_>,
    ) -> RenderResult<()> {
        let inputs = layer.inputs();
        let color = inputs.require::<ColorKind>(cx.table, "Color")?.to_premul();
        let dx = inputs.require::<NumberKind>(cx.table, "Offset X")? as i64;
        let dy = inputs.require::<NumberKind>(cx.table, "Offset Y")? as i64;
        let softness = inputs.require::<NumberKind>(cx.table, "Softness")? as u32;

        let (w, h) = (surface.width() as i64, surface.height() as i64);
        self.shadow.resize(surface.data().len(), 0);

        let mut cast = |sx: i64, sy: i64, alpha: u8| {
            let (Some(x), Some(y)) = (sx.checked_add(dx), sy.checked_add(dy)) else {
                return;
            };
            if alpha == 0 || x < 0 || y < 0 || x >= w || y >= h {
                return;
            }
            let i = ((y * w + x) * 4) as usize;
            let a = u16::from(alpha);
            for c in 0..4 {
                self.shadow[i + c] = mul_div255_u8(u16::from(color[c]), a);
            }
        };

        match related {
            Some(node) => {
                let (ox, oy) = surface.origin();
                for (k, px) in node.pixels.chunks_exact(4).enumerate() {
                    let k = k as i64;
                    let nx = k % i64::from(node.width);
                    let ny = k / i64::from(node.width);
                    cast(
                        i64::from(node.x) + nx + i64::from(ox),
                        i64::from(node.y) + ny + i64::from(oy),
                        px[3],
                    );
                }
            }
            None => {
                for (k, px) in surface.data().chunks_exact(4).enumerate() {
                    let k = k as i64;
                    cast(k % w, k / w, px[3]);
                }
            }
        }

        if softness > 0 {
            self.shadow = blur_rgba8_premul(
                &self.shadow,
                surface.width(),
                surface.height(),
                softness,
                sigma_for_radius(softness),
                &mut self.scratch,
            )?;
        }

        for (dst, sh) in surface
            .data_mut()
            .chunks_exact_mut(4)
            .zip(self.shadow.chunks_exact(4))
        {
            let top = [dst[0], dst[1], dst[2], dst[3]];
            let under = [sh[0], sh[1], sh[2], sh[3]];
            dst.copy_from_slice(&over(under, top, 1.0));
        }
        Ok(())
    }
}
