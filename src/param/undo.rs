use std::cell::RefCell;

use serde_json::Value as JsonValue;

use crate::param::table::ParamId;

/// One recorded value transition, both sides in persisted JSON form.
#[derive(Clone, Debug, PartialEq)]
pub struct UndoEntry {
    pub param: Option<ParamId>,
    pub label: String,
    pub before: JsonValue,
    pub after: JsonValue,
}

/// Sink for parameter value transitions.
///
/// Parameters call [`UndoHistory::register`] at most once each, then [`UndoHistory::record`] for
/// every change made outside of initialization. Stack depth and coalescing are up to the sink.
pub trait UndoHistory {
    fn register(&self, param: Option<ParamId>, label: &str);

    fn record(&self, entry: UndoEntry);

    /// Forget registrations and history, e.g. when the tracked document is replaced.
    fn clear(&self) {}
}

/// Unbounded in-memory history.
#[derive(Debug, Default)]
pub struct UndoLog {
    registered: RefCell<Vec<(Option<ParamId>, String)>>,
    undo: RefCell<Vec<UndoEntry>>,
    redo: RefCell<Vec<UndoEntry>>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrations(&self) -> usize {
        self.registered.borrow().len()
    }

    pub fn is_registered(&self, param: ParamId) -> bool {
        self.registered
            .borrow()
            .iter()
            .any(|(id, _)| *id == Some(param))
    }

    pub fn entries(&self) -> Vec<UndoEntry> {
        self.undo.borrow().clone()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.borrow().is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.borrow().is_empty()
    }

    /// Pop the latest transition and stage it for redo.
    pub fn pop_undo(&self) -> Option<UndoEntry> {
        let entry = self.undo.borrow_mut().pop()?;
        self.redo.borrow_mut().push(entry.clone());
        Some(entry)
    }

    pub fn pop_redo(&self) -> Option<UndoEntry> {
        let entry = self.redo.borrow_mut().pop()?;
        self.undo.borrow_mut().push(entry.clone());
        Some(entry)
    }
}

impl UndoHistory for UndoLog {
    fn register(&self, param: Option<ParamId>, label: &str) {
        self.registered.borrow_mut().push((param, label.to_owned()));
    }

    fn record(&self, entry: UndoEntry) {
        self.undo.borrow_mut().push(entry);
        self.redo.borrow_mut().clear();
    }

    fn clear(&self) {
        self.registered.borrow_mut().clear();
        self.undo.borrow_mut().clear();
        self.redo.borrow_mut().clear();
    }
}
