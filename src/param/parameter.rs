use std::cell::Cell;
use std::rc::Rc;

use serde_json::Value as JsonValue;

use crate::foundation::error::{ComposerError, ComposerResult};
use crate::param::kind::ParamKind;
use crate::param::table::ParamId;
use crate::param::undo::{UndoEntry, UndoHistory};

/// Callback fired after a user edit leaves the parameter valid.
pub type UpdateListener = Rc<dyn Fn()>;

/// Cached validity of a parameter's current content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Validity {
    /// Content changed since the last read.
    #[default]
    Unvalidated,
    Valid,
    Invalid,
}

/// One named, typed, validated editable value.
///
/// Construction creates the editor handle, so every `Parameter` is ready for use. Programmatic
/// writes ([`Parameter::set_value`]) never notify listeners; user edits ([`Parameter::edit`],
/// [`Parameter::commit`]) do.
pub struct Parameter<K: ParamKind> {
    kind: K,
    label: String,
    id: Option<ParamId>,
    handle: Option<K::Handle>,
    // Value store for headless parameters.
    shadow: Option<K::Value>,
    validity: Cell<Validity>,
    order: i32,
    user_provided: bool,
    generator_mode: bool,
    loaded: bool,
    initializing: bool,
    disabled: bool,
    note: Option<String>,
    listeners: Vec<UpdateListener>,
    undo: Option<Rc<dyn UndoHistory>>,
}

impl<K: ParamKind> Parameter<K> {
    pub fn new(label: impl Into<String>, kind: K) -> Self {
        let handle = kind.create_handle();
        Self {
            kind,
            label: label.into(),
            id: None,
            handle,
            shadow: None,
            validity: Cell::new(Validity::Unvalidated),
            order: -1,
            user_provided: false,
            generator_mode: false,
            loaded: false,
            initializing: false,
            disabled: false,
            note: None,
            listeners: Vec::new(),
            undo: None,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_default(mut self, value: K::Value) -> Self {
        self.set_default_value(value);
        self
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id(&self) -> Option<ParamId> {
        self.id
    }

    pub(crate) fn bind_id(&mut self, id: ParamId) {
        self.id = Some(id);
    }

    /// Editor handle for the shell to bind a widget to. `None` for headless parameters.
    pub fn display_handle(&self) -> Option<&K::Handle> {
        self.handle.as_ref()
    }

    pub fn is_headless(&self) -> bool {
        self.handle.is_none()
    }

    /// Read, parse and check the current content. Updates the cached validity.
    pub fn get_value(&self) -> Option<K::Value> {
        let read = match &self.handle {
            Some(h) => self.kind.read_value(h).ok(),
            None => self.shadow.clone(),
        };
        let out = read.filter(|v| self.kind.is_semantically_valid(v));
        self.validity.set(if out.is_some() {
            Validity::Valid
        } else {
            Validity::Invalid
        });
        out
    }

    pub fn is_valid(&self) -> bool {
        self.get_value().is_some()
    }

    /// Validity as of the last read, without re-reading.
    pub fn validity(&self) -> Validity {
        self.validity.get()
    }

    /// Programmatic write. Records an undo entry when registered, never fires listeners.
    pub fn set_value(&mut self, value: K::Value) {
        let before = self.undo_snapshot();
        self.store(value);
        if let Some(before) = before {
            self.record_change(before);
        }
    }

    /// Apply `value` only while no persisted value has been loaded.
    pub fn set_default_value(&mut self, value: K::Value) -> bool {
        if self.loaded {
            return false;
        }
        self.initialize(value);
        true
    }

    /// Seed the value without it counting as an edit.
    pub fn initialize(&mut self, value: K::Value) {
        self.initializing = true;
        self.set_value(value);
        self.initializing = false;
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// User edit through the editor handle. Returns `None` for headless parameters.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut K::Handle) -> R) -> Option<R> {
        let before = self.undo_snapshot();
        let out = f(self.handle.as_mut()?);
        self.validity.set(Validity::Unvalidated);
        if let Some(before) = before {
            self.record_change(before);
        }
        if self.is_valid() {
            self.fire();
        }
        Some(out)
    }

    /// User-level value write: stores, records undo, and fires listeners when valid.
    pub fn commit(&mut self, value: K::Value) {
        self.set_value(value);
        if self.is_valid() {
            self.fire();
        }
    }

    /// Fire listeners without changing the value.
    pub fn touch(&self) {
        self.fire();
    }

    pub fn serialize(&self) -> JsonValue {
        self.get_value()
            .map(|v| self.kind.to_json(&v))
            .unwrap_or(JsonValue::Null)
    }

    /// Apply a persisted value. `null` leaves the content untouched but still marks it loaded.
    pub fn deserialize(&mut self, json: &JsonValue) -> ComposerResult<()> {
        if !json.is_null() {
            let value = self.kind.from_json(json).map_err(|e| {
                ComposerError::serde(format!("input \"{}\" ({}): {e}", self.label, K::TAG))
            })?;
            self.initialize(value);
        }
        self.loaded = true;
        Ok(())
    }

    /// Put back a value captured by [`Parameter::serialize`] without recording it.
    ///
    /// `null` stands for "no usable value" and empties the parameter.
    pub fn restore(&mut self, json: &JsonValue) -> ComposerResult<()> {
        if json.is_null() {
            self.clear();
            self.fire();
            return Ok(());
        }
        let value = self
            .kind
            .from_json(json)
            .map_err(|e| ComposerError::serde(format!("input \"{}\": {e}", self.label)))?;
        self.initialize(value);
        self.fire();
        Ok(())
    }

    pub fn register_update_listener(&mut self, listener: UpdateListener) {
        self.listeners.push(listener);
    }

    /// Route value changes into `history`. Only the first call has any effect.
    pub fn register_undo_once(&mut self, history: &Rc<dyn UndoHistory>) -> bool {
        if self.undo.is_some() {
            return false;
        }
        history.register(self.id, &self.label);
        self.undo = Some(Rc::clone(history));
        true
    }

    pub fn is_undo_registered(&self) -> bool {
        self.undo.is_some()
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn set_order(&mut self, order: i32) {
        self.order = order;
    }

    pub fn is_user_provided(&self) -> bool {
        self.user_provided
    }

    pub fn set_user_provided(&mut self, provided: bool) {
        if self.user_provided == provided {
            return;
        }
        self.user_provided = provided;
        self.fire();
    }

    /// Whether the shell should show the "provided" toggle next to the editor.
    pub fn provided_visible(&self) -> bool {
        !self.generator_mode && self.handle.is_some()
    }

    pub fn is_generator_mode(&self) -> bool {
        self.generator_mode
    }

    pub fn set_generator_mode(&mut self, generator_mode: bool) {
        self.generator_mode = generator_mode;
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = Some(note.into());
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Drop the current content: a fresh handle, or no value for headless parameters.
    pub fn clear(&mut self) {
        match &mut self.handle {
            Some(h) => {
                if let Some(fresh) = self.kind.create_handle() {
                    *h = fresh;
                }
            }
            None => self.shadow = None,
        }
        self.validity.set(Validity::Unvalidated);
    }

    /// Parameters of one owner are ordered by `order` alone.
    pub fn cmp_order<J: ParamKind>(&self, other: &Parameter<J>) -> std::cmp::Ordering {
        self.order.cmp(&other.order())
    }

    fn store(&mut self, value: K::Value) {
        match &mut self.handle {
            Some(h) => self.kind.write_value(h, &value),
            None => self.shadow = Some(value),
        }
        self.validity.set(Validity::Unvalidated);
    }

    fn fire(&self) {
        for l in &self.listeners {
            l();
        }
    }

    fn undo_snapshot(&self) -> Option<JsonValue> {
        (self.undo.is_some() && !self.initializing).then(|| self.serialize())
    }

    fn record_change(&self, before: JsonValue) {
        let Some(history) = &self.undo else {
            return;
        };
        let after = self.serialize();
        if before == after {
            return;
        }
        history.record(UndoEntry {
            param: self.id,
            label: self.label.clone(),
            before,
            after,
        });
    }
}

impl<K: ParamKind> std::fmt::Debug for Parameter<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("kind", &K::TAG)
            .field("label", &self.label)
            .field("order", &self.order)
            .field("validity", &self.validity.get())
            .field("loaded", &self.loaded)
            .field("user_provided", &self.user_provided)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/param/parameter.rs"]
mod tests;
