use std::cell::Cell;
use std::rc::Rc;

use crate::param::parameter::UpdateListener;

/// Upper bound on back-to-back passes inside one flush.
const MAX_CHAINED_PASSES: u32 = 4;

#[derive(Debug, Default)]
struct SchedulerState {
    pending: Cell<bool>,
    in_flight: Cell<bool>,
    requests: Cell<u64>,
    passes: Cell<u64>,
}

/// Coalesces render requests.
///
/// Requests only raise a flag. The owner calls [`RenderScheduler::flush`] once the current handler
/// has returned; any number of requests made before that collapse into one pass. A request made
/// while a pass runs schedules exactly one follow-up pass instead of recursing.
#[derive(Clone, Debug, Default)]
pub struct RenderScheduler {
    state: Rc<SchedulerState>,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        let s = &self.state;
        s.requests.set(s.requests.get() + 1);
        if s.pending.replace(true) || s.in_flight.get() {
            tracing::debug!(requests = s.requests.get(), "render request coalesced");
        }
    }

    /// An update listener that requests a render.
    pub fn listener(&self) -> UpdateListener {
        let this = self.clone();
        Rc::new(move || this.request())
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending.get()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.in_flight.get()
    }

    /// Total requests seen.
    pub fn requests(&self) -> u64 {
        self.state.requests.get()
    }

    /// Total passes run through [`RenderScheduler::flush`].
    pub fn passes(&self) -> u64 {
        self.state.passes.get()
    }

    /// Run `render` if a request is pending, repeating while new requests arrive mid-pass.
    ///
    /// Returns the last pass's output, or `None` if nothing ran. Re-entrant calls return `None`
    /// and leave the request pending for the outer flush.
    pub fn flush<T>(&self, mut render: impl FnMut() -> T) -> Option<T> {
        let s = &self.state;
        if s.in_flight.get() || !s.pending.get() {
            return None;
        }
        s.in_flight.set(true);
        let mut last = None;
        let mut chained = 0;
        while s.pending.replace(false) {
            last = Some(render());
            s.passes.set(s.passes.get() + 1);
            chained += 1;
            if chained >= MAX_CHAINED_PASSES && s.pending.get() {
                tracing::warn!(chained, "render keeps requesting itself; deferring to next flush");
                break;
            }
        }
        s.in_flight.set(false);
        last
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scheduler.rs"]
mod tests;
