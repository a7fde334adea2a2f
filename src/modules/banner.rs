use crate::foundation::core::{Canvas, Region};
use crate::foundation::error::ComposerResult;
use crate::layer::composite::CompositeBehavior;
use crate::layer::handle::Viewport;
use crate::layer::module::Module;
use crate::layer::{Inputs, LayerState};
use crate::modules::{ImageModule, Solid, Text};
use crate::param::kinds::{ImageKind, NumberKind, RegionKind};
use crate::param::parameter::Parameter;
use crate::param::set::ParameterSet;
use crate::param::table::ParamTable;
use crate::render::outcome::{RenderAbort, RenderResult};
use crate::render::text::FontBook;

const LOGO: usize = 0;
const TITLE: usize = 1;
const BAR: usize = 2;

/// A full-width bar above the canvas holding a logo and a title, both inset by "Padding".
///
/// The bar is a [`Solid`], the logo an [`ImageModule`] and the title a [`Text`] wrapped to the
/// room right of the logo. Their inputs are shared into the banner's own set; the bar's
/// "Location" is written by layout only and is disabled for the user.
#[derive(Debug, Default)]
pub struct Banner {
    fonts: FontBook,
}

impl Banner {
    pub fn new(fonts: FontBook) -> Self {
        Self { fonts }
    }
}

impl CompositeBehavior for Banner {
    fn type_name(&self) -> &'static str {
        "Banner"
    }

    fn compose_children(&mut self, table: &mut ParamTable) -> ComposerResult<Vec<Module>> {
        let title = Text::new(self.fonts.clone()).with_content("");
        Ok(vec![
            Module::new(Box::new(ImageModule::new()), table)?,
            Module::new(Box::new(title), table)?,
            Module::new(Box::new(Solid::default()), table)?,
        ])
    }

    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>, children: &[Module]) -> ComposerResult<()> {
        inputs.copy_from(children[BAR].layer().inputs(), &["Background", "Location"])?;
        inputs.copy_from_renamed(children[LOGO].layer().inputs(), &[("Image", "Logo")])?;
        inputs.add(
            "Padding",
            Parameter::new(
                "Padding",
                NumberKind::integer()
                    .at_least(0.0)
                    .at_most(f64::from(Canvas::MAX_EDGE)),
            )
            .with_default(5.0)
            .with_order(3),
        )?;
        inputs.copy_from_renamed(
            children[TITLE].layer().inputs(),
            &[
                ("Content", "Title"),
                ("Color", "Title Color"),
                ("Family", "Title Font"),
                ("Size", "Title Size"),
            ],
        )?;
        if let Some(id) = children[BAR].layer().inputs().id("Location")
            && let Some(slot) = inputs.table().slot_mut(id)
        {
            slot.set_disabled(true);
        }
        Ok(())
    }

    fn request_layout(
        &mut self,
        layer: &LayerState,
        children: &mut [Module],
        viewport: &mut Viewport,
        table: &mut ParamTable,
    ) -> RenderResult<()> {
        let padding = layer.inputs().require::<NumberKind>(table, "Padding")? as i64;
        let (logo_w, logo_h) = layer
            .inputs()
            .value::<ImageKind>(table, "Logo")
            .map_or((0, 0), |img| (i64::from(img.width()), i64::from(img.height())));
        let width = i64::from(viewport.canvas().width);

        let title_x = padding + logo_w + if logo_w > 0 { padding } else { 0 };
        let room = (width - title_x - padding).max(1);
        let (title_w, title_h) = measure_title(&mut children[TITLE], viewport, table, room)?;

        let inner = logo_h.max(title_h);
        let height = inner + 2 * padding;
        if height <= 0 {
            return Err(RenderAbort::skip("banner has no height"));
        }
        let top = padding - height;

        place(
            children[BAR].layer().inputs(),
            table,
            fit(0, -height, width, height)?,
        );
        place(
            children[LOGO].layer().inputs(),
            table,
            fit(padding, top + (inner - logo_h) / 2, logo_w, logo_h)?,
        );
        if title_h > 0 {
            place(
                children[TITLE].layer().inputs(),
                table,
                fit(title_x, top + (inner - title_h) / 2, title_w, title_h)?,
            );
        }
        let height =
            u32::try_from(height).map_err(|_| RenderAbort::skip("banner does not fit"))?;
        viewport.expand(height, 0, 0, 0);
        Ok(())
    }

    fn primary_child(&self) -> usize {
        BAR
    }
}

/// Wrap the title to `room` and lay it out. A title that skips (no text, unknown font) takes no
/// space.
fn measure_title(
    title: &mut Module,
    viewport: &mut Viewport,
    table: &mut ParamTable,
    room: i64,
) -> RenderResult<(i64, i64)> {
    if let Some(wrap) = title.layer().inputs().get_mut::<NumberKind>(table, "Wrap")
        && wrap.get_value() != Some(room as f64)
    {
        wrap.initialize(room as f64);
    }
    match title.request_layout(viewport, table) {
        Ok(()) => {}
        Err(RenderAbort::Skip(reason)) => {
            tracing::debug!(%reason, "banner title skipped");
            return Ok((0, 0));
        }
        Err(e) => return Err(e),
    }
    Ok(title
        .layer()
        .inputs()
        .value::<RegionKind>(table, "Location")
        .map_or((0, 0), |r| (i64::from(r.width), i64::from(r.height))))
}

fn fit(x: i64, y: i64, width: i64, height: i64) -> RenderResult<Region> {
    let coord = |v: i64| i32::try_from(v).map_err(|_| RenderAbort::skip("banner does not fit"));
    Ok(Region::new(coord(x)?, coord(y)?, coord(width)?, coord(height)?))
}

/// Layout writes are not edits: no undo entry, no listeners.
fn place(inputs: &ParameterSet, table: &mut ParamTable, region: Region) {
    if let Some(location) = inputs.get_mut::<RegionKind>(table, "Location")
        && location.get_value() != Some(region)
    {
        location.initialize(region);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/modules/banner.rs"]
mod tests;
