use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::foundation::core::Canvas;
use crate::foundation::error::{ComposerError, ComposerResult, LayerKind};
use crate::layer::module::Module;
use crate::template::catalog::Catalog;
use crate::template::Template;

/// JSON-facing template document.
///
/// `modules` is in stack order, top first. Input maps are keyed by the layer's input names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateDef {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub modules: Vec<ModuleDef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDef {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub inputs: Map<String, JsonValue>,
    #[serde(default)]
    pub effects: Vec<EffectDef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectDef {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub inputs: Map<String, JsonValue>,
}

impl TemplateDef {
    pub fn from_reader<R: std::io::Read>(r: R) -> ComposerResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| ComposerError::serde(format!("parse template JSON: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> ComposerResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ComposerError::invalid_input(format!("open template JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn from_json_str(s: &str) -> ComposerResult<Self> {
        serde_json::from_str(s).map_err(|e| ComposerError::serde(format!("parse template JSON: {e}")))
    }

    pub fn to_json_pretty(&self) -> ComposerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Template {
    /// Snapshot every module, effect and input into the persisted form.
    pub fn to_def(&self) -> TemplateDef {
        let table = self.params();
        let modules = self
            .modules()
            .iter()
            .map(|m| ModuleDef {
                type_name: m.type_name().to_owned(),
                display_name: m.layer().custom_display_name().map(str::to_owned),
                inputs: m.layer().inputs().serialize(table),
                effects: m
                    .effects()
                    .iter()
                    .map(|e| EffectDef {
                        name: e.type_name().to_owned(),
                        display_name: e.layer().custom_display_name().map(str::to_owned),
                        inputs: e.layer().inputs().serialize(table),
                    })
                    .collect(),
            })
            .collect();
        TemplateDef {
            name: self.name().to_owned(),
            width: self.canvas().width,
            height: self.canvas().height,
            modules,
        }
    }

    /// Rebuild a template through `catalog`.
    ///
    /// Either the whole document loads or nothing does: an unknown type name fails with
    /// [`ComposerError::MissingType`] and the partially built template is dropped.
    #[tracing::instrument(skip_all, fields(template = %def.name, modules = def.modules.len()))]
    pub fn from_def(def: &TemplateDef, catalog: &dyn Catalog) -> ComposerResult<Self> {
        let canvas = Canvas::new(def.width, def.height)?;
        let mut template = Template::new(def.name.clone(), canvas);
        for mdef in &def.modules {
            let module = build_module(mdef, catalog, &mut template)?;
            template.push_module(module);
        }
        tracing::debug!(params = template.params().len(), "template loaded");
        Ok(template)
    }
}

fn build_module(
    mdef: &ModuleDef,
    catalog: &dyn Catalog,
    template: &mut Template,
) -> ComposerResult<Module> {
    let table = template.params_mut();
    let mut module = catalog
        .create_module(&mdef.type_name, table)?
        .ok_or_else(|| ComposerError::missing_type(LayerKind::Module, &mdef.type_name))?;
    module
        .layer_mut()
        .set_display_name(mdef.display_name.clone());
    module.layer().inputs().deserialize(table, &mdef.inputs)?;

    for edef in &mdef.effects {
        let mut effect = catalog
            .create_effect(&edef.name, table)?
            .ok_or_else(|| ComposerError::missing_type(LayerKind::Effect, &edef.name))?;
        effect
            .layer_mut()
            .set_display_name(edef.display_name.clone());
        effect.layer().inputs().deserialize(table, &edef.inputs)?;
        module.add_effect(effect);
    }
    Ok(module)
}

#[cfg(test)]
#[path = "../../tests/unit/template/persist.rs"]
mod tests;
