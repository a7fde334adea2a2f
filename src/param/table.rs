use std::rc::Rc;

use serde_json::Value as JsonValue;

use crate::foundation::error::ComposerResult;
use crate::param::kind::ParamKind;
use crate::param::kinds::{
    ChoiceKind, ColorKind, HiddenKind, ImageKind, NumberKind, RegionKind, TextKind,
};
use crate::param::parameter::{Parameter, UpdateListener, Validity};
use crate::param::undo::UndoHistory;

/// Index of a parameter in its [`ParamTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub(crate) u32);

impl ParamId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A parameter of any kind.
#[derive(Debug)]
pub enum ParamSlot {
    Number(Parameter<NumberKind>),
    Color(Parameter<ColorKind>),
    Text(Parameter<TextKind>),
    Choice(Parameter<ChoiceKind>),
    Region(Parameter<RegionKind>),
    Image(Parameter<ImageKind>),
    Hidden(Parameter<HiddenKind>),
}

macro_rules! with_param {
    ($slot:expr, $p:ident => $body:expr) => {
        match $slot {
            ParamSlot::Number($p) => $body,
            ParamSlot::Color($p) => $body,
            ParamSlot::Text($p) => $body,
            ParamSlot::Choice($p) => $body,
            ParamSlot::Region($p) => $body,
            ParamSlot::Image($p) => $body,
            ParamSlot::Hidden($p) => $body,
        }
    };
}

impl ParamSlot {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Number(_) => NumberKind::TAG,
            Self::Color(_) => ColorKind::TAG,
            Self::Text(_) => TextKind::TAG,
            Self::Choice(_) => ChoiceKind::TAG,
            Self::Region(_) => RegionKind::TAG,
            Self::Image(_) => ImageKind::TAG,
            Self::Hidden(_) => HiddenKind::TAG,
        }
    }

    pub fn label(&self) -> &str {
        with_param!(self, p => p.label())
    }

    pub fn order(&self) -> i32 {
        with_param!(self, p => p.order())
    }

    pub fn set_order(&mut self, order: i32) {
        with_param!(self, p => p.set_order(order))
    }

    /// Compare by `order`, the only ordering parameters have.
    pub fn cmp_order(&self, other: &Self) -> std::cmp::Ordering {
        self.order().cmp(&other.order())
    }

    pub fn is_valid(&self) -> bool {
        with_param!(self, p => p.is_valid())
    }

    pub fn validity(&self) -> Validity {
        with_param!(self, p => p.validity())
    }

    pub fn is_headless(&self) -> bool {
        with_param!(self, p => p.is_headless())
    }

    pub fn is_disabled(&self) -> bool {
        with_param!(self, p => p.is_disabled())
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        with_param!(self, p => p.set_disabled(disabled))
    }

    pub fn is_loaded(&self) -> bool {
        with_param!(self, p => p.is_loaded())
    }

    pub fn is_user_provided(&self) -> bool {
        with_param!(self, p => p.is_user_provided())
    }

    pub fn set_user_provided(&mut self, provided: bool) {
        with_param!(self, p => p.set_user_provided(provided))
    }

    pub fn set_generator_mode(&mut self, generator_mode: bool) {
        with_param!(self, p => p.set_generator_mode(generator_mode))
    }

    pub fn note(&self) -> Option<&str> {
        with_param!(self, p => p.note())
    }

    pub fn serialize(&self) -> JsonValue {
        with_param!(self, p => p.serialize())
    }

    pub fn deserialize(&mut self, json: &JsonValue) -> ComposerResult<()> {
        with_param!(self, p => p.deserialize(json))
    }

    pub fn restore(&mut self, json: &JsonValue) -> ComposerResult<()> {
        with_param!(self, p => p.restore(json))
    }

    pub fn touch(&self) {
        with_param!(self, p => p.touch())
    }

    pub fn register_update_listener(&mut self, listener: UpdateListener) {
        with_param!(self, p => p.register_update_listener(listener))
    }

    pub fn register_undo_once(&mut self, history: &Rc<dyn UndoHistory>) -> bool {
        with_param!(self, p => p.register_undo_once(history))
    }
}

#[derive(Debug)]
struct Entry {
    slot: ParamSlot,
    refs: u32,
}

/// Arena owning every parameter of one template.
///
/// Parameter sets hold [`ParamId`]s into the table; a parameter reachable under several names
/// (or from several sets) is one entry with a reference count. Ids are never reused.
#[derive(Debug, Default)]
pub struct ParamTable {
    entries: Vec<Option<Entry>>,
    live: usize,
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `param`. The entry is dropped once the last set holding it releases it.
    pub fn insert<K: ParamKind>(&mut self, mut param: Parameter<K>) -> ParamId {
        let id = ParamId(self.entries.len() as u32);
        param.bind_id(id);
        self.entries.push(Some(Entry {
            slot: K::into_slot(param),
            refs: 0,
        }));
        self.live += 1;
        id
    }

    pub(crate) fn retain(&mut self, id: ParamId) -> bool {
        match self.entry_mut(id) {
            Some(e) => {
                e.refs += 1;
                true
            }
            None => false,
        }
    }

    /// Drop one reference; returns `true` when the entry was freed.
    pub(crate) fn release(&mut self, id: ParamId) -> bool {
        let Some(e) = self.entry_mut(id) else {
            return false;
        };
        e.refs = e.refs.saturating_sub(1);
        if e.refs > 0 {
            return false;
        }
        self.entries[id.index()] = None;
        self.live -= 1;
        true
    }

    pub fn ref_count(&self, id: ParamId) -> u32 {
        self.entries
            .get(id.index())
            .and_then(Option::as_ref)
            .map_or(0, |e| e.refs)
    }

    pub fn contains(&self, id: ParamId) -> bool {
        self.slot(id).is_some()
    }

    pub fn slot(&self, id: ParamId) -> Option<&ParamSlot> {
        self.entries
            .get(id.index())
            .and_then(Option::as_ref)
            .map(|e| &e.slot)
    }

    pub fn slot_mut(&mut self, id: ParamId) -> Option<&mut ParamSlot> {
        self.entry_mut(id).map(|e| &mut e.slot)
    }

    pub fn get<K: ParamKind>(&self, id: ParamId) -> Option<&Parameter<K>> {
        self.slot(id).and_then(K::from_slot)
    }

    pub fn get_mut<K: ParamKind>(&mut self, id: ParamId) -> Option<&mut Parameter<K>> {
        self.slot_mut(id).and_then(K::from_slot_mut)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamId, &ParamSlot)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (ParamId(i as u32), &e.slot)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ParamId, &mut ParamSlot)> {
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(|(i, e)| e.as_mut().map(|e| (ParamId(i as u32), &mut e.slot)))
    }

    fn entry_mut(&mut self, id: ParamId) -> Option<&mut Entry> {
        self.entries.get_mut(id.index()).and_then(Option::as_mut)
    }
}
