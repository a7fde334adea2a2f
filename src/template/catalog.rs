use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::effects::{Blur, DropShadow, Opacity};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::layer::composite::CompositeModule;
use crate::layer::effect::Effect;
use crate::layer::module::Module;
use crate::modules::{Banner, Brush, ImageModule, Solid, Text};
use crate::param::table::ParamTable;
use crate::render::text::FontBook;
use crate::template::Template;
use crate::template::persist::TemplateDef;

/// Source of module/effect types and of stored templates.
///
/// `create_*` return `Ok(None)` for unknown names; `Err` only when a known type fails to build.
pub trait Catalog {
    fn create_module(&self, name: &str, table: &mut ParamTable) -> ComposerResult<Option<Module>>;

    fn create_effect(&self, name: &str, table: &mut ParamTable) -> ComposerResult<Option<Effect>>;

    fn module_types(&self) -> Vec<&str>;

    fn effect_types(&self) -> Vec<&str>;

    fn list_templates(&self) -> Vec<String>;

    fn load_template(&self, name: &str) -> ComposerResult<Option<Template>>;

    fn save_template(&self, template: &Template) -> ComposerResult<()>;

    /// Returns `false` when no template had that name.
    fn remove_template(&self, name: &str) -> ComposerResult<bool>;
}

type ModuleFactory = Box<dyn Fn(&mut ParamTable) -> ComposerResult<Module>>;
type EffectFactory = Box<dyn Fn(&mut ParamTable) -> ComposerResult<Effect>>;

/// In-process catalog: named factories plus an in-memory template store.
///
/// Stored templates are kept in their persisted JSON form, so loading one always goes through
/// the same path as loading from disk.
pub struct Registry {
    fonts: FontBook,
    modules: Vec<(String, ModuleFactory)>,
    effects: Vec<(String, EffectFactory)>,
    store: RefCell<BTreeMap<String, String>>,
}

impl Registry {
    /// A registry with no types and no templates.
    pub fn empty() -> Self {
        Self {
            fonts: FontBook::new(),
            modules: Vec::new(),
            effects: Vec::new(),
            store: RefCell::new(BTreeMap::new()),
        }
    }

    /// Registry preloaded with every built-in module and effect, and no fonts.
    pub fn with_builtins() -> Self {
        Self::with_fonts(FontBook::new())
    }

    /// Built-in types whose text modules shape with `fonts`.
    pub fn with_fonts(fonts: FontBook) -> Self {
        let mut r = Self::empty();
        r.fonts = fonts.clone();
        r.register_module("Solid", |t| Module::new(Box::new(Solid::default()), t));
        r.register_module("Brush", |t| Module::new(Box::new(Brush::default()), t));
        r.register_module("Image", |t| Module::new(Box::new(ImageModule::default()), t));
        let banner_fonts = fonts.clone();
        r.register_module("Banner", move |t| {
            Module::new(Box::new(CompositeModule::new(Banner::new(banner_fonts.clone()))), t)
        });
        r.register_module("Text", move |t| Module::new(Box::new(Text::new(fonts.clone())), t));
        r.register_effect("Opacity", |t| Effect::new(Box::new(Opacity), t));
        r.register_effect("Blur", |t| Effect::new(Box::new(Blur::default()), t));
        r.register_effect("DropShadow", |t| Effect::new(Box::new(DropShadow::default()), t));
        r
    }

    /// Fonts handed to the built-in text modules.
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Register (or replace) a module factory.
    pub fn register_module(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&mut ParamTable) -> ComposerResult<Module> + 'static,
    ) {
        let name = name.into();
        self.modules.retain(|(n, _)| *n != name);
        self.modules.push((name, Box::new(factory)));
    }

    pub fn register_effect(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&mut ParamTable) -> ComposerResult<Effect> + 'static,
    ) {
        let name = name.into();
        self.effects.retain(|(n, _)| *n != name);
        self.effects.push((name, Box::new(factory)));
    }

    /// Store a persisted document directly, validating it first.
    pub fn insert_def(&self, def: &TemplateDef) -> ComposerResult<()> {
        Template::from_def(def, self)?;
        self.store
            .borrow_mut()
            .insert(def.name.clone(), def.to_json_pretty()?);
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Catalog for Registry {
    fn create_module(&self, name: &str, table: &mut ParamTable) -> ComposerResult<Option<Module>> {
        match self.modules.iter().find(|(n, _)| n == name) {
            Some((_, factory)) => factory(table).map(Some),
            None => Ok(None),
        }
    }

    fn create_effect(&self, name: &str, table: &mut ParamTable) -> ComposerResult<Option<Effect>> {
        match self.effects.iter().find(|(n, _)| n == name) {
            Some((_, factory)) => factory(table).map(Some),
            None => Ok(None),
        }
    }

    fn module_types(&self) -> Vec<&str> {
        self.modules.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn effect_types(&self) -> Vec<&str> {
        self.effects.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn list_templates(&self) -> Vec<String> {
        self.store.borrow().keys().cloned().collect()
    }

    fn load_template(&self, name: &str) -> ComposerResult<Option<Template>> {
        let Some(json) = self.store.borrow().get(name).cloned() else {
            return Ok(None);
        };
        let def = TemplateDef::from_json_str(&json)?;
        Template::from_def(&def, self).map(Some)
    }

    #[tracing::instrument(skip_all, fields(template = %template.name()))]
    fn save_template(&self, template: &Template) -> ComposerResult<()> {
        if template.name().trim().is_empty() {
            return Err(ComposerError::validation("template name must not be empty"));
        }
        let json = template.to_def().to_json_pretty()?;
        self.store
            .borrow_mut()
            .insert(template.name().to_owned(), json);
        Ok(())
    }

    fn remove_template(&self, name: &str) -> ComposerResult<bool> {
        Ok(self.store.borrow_mut().remove(name).is_some())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &self.module_types())
            .field("effects", &self.effect_types())
            .field("templates", &self.list_templates())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/catalog.rs"]
mod tests;
