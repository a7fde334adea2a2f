//! Application services shared by a session, and the cross-thread path back onto the UI thread.

use std::rc::Rc;
use std::thread::ThreadId;

use crossbeam_channel::{Receiver, Sender};

use crate::foundation::error::{ComposerError, ComposerResult};
use crate::param::undo::{UndoHistory, UndoLog};
use crate::render::compositor::CompositorOpts;
use crate::render::scheduler::RenderScheduler;
use crate::session::Session;
use crate::template::catalog::{Catalog, Registry};

/// Work deferred onto the UI thread.
pub type UiTask = Box<dyn FnOnce(&mut Session) -> ComposerResult<()> + Send>;

pub enum UiMessage {
    RequestRender,
    Run(UiTask),
}

impl std::fmt::Debug for UiMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestRender => f.write_str("RequestRender"),
            Self::Run(_) => f.write_str("Run(..)"),
        }
    }
}

/// Thread-safe handle for posting to a [`UiDispatcher`].
///
/// Posting after the dispatcher is gone is silently dropped.
#[derive(Clone, Debug)]
pub struct UiSender {
    tx: Sender<UiMessage>,
}

impl UiSender {
    pub fn request_render(&self) {
        let _ = self.tx.send(UiMessage::RequestRender);
    }

    pub fn run_later(&self, task: impl FnOnce(&mut Session) -> ComposerResult<()> + Send + 'static) {
        let _ = self.tx.send(UiMessage::Run(Box::new(task)));
    }
}

/// Queue drained on the thread that created it.
#[derive(Debug)]
pub struct UiDispatcher {
    owner: ThreadId,
    tx: Sender<UiMessage>,
    rx: Receiver<UiMessage>,
}

impl UiDispatcher {
    /// A dispatcher owned by the calling thread.
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            owner: std::thread::current().id(),
            tx,
            rx,
        }
    }

    pub fn sender(&self) -> UiSender {
        UiSender {
            tx: self.tx.clone(),
        }
    }

    pub fn is_owner_thread(&self) -> bool {
        std::thread::current().id() == self.owner
    }

    pub fn check_thread(&self) -> ComposerResult<()> {
        if self.is_owner_thread() {
            return Ok(());
        }
        Err(ComposerError::wrong_thread(format!(
            "dispatcher owned by {:?}, drained from {:?}",
            self.owner,
            std::thread::current().id()
        )))
    }

    /// Take everything posted so far.
    pub fn drain(&self) -> ComposerResult<Vec<UiMessage>> {
        self.check_thread()?;
        Ok(self.rx.try_iter().collect())
    }
}

impl Default for UiDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Services a session runs against.
pub struct AppContext {
    pub catalog: Rc<dyn Catalog>,
    pub undo: Rc<dyn UndoHistory>,
    pub scheduler: RenderScheduler,
    pub dispatcher: UiDispatcher,
    pub opts: CompositorOpts,
}

impl AppContext {
    pub fn new(catalog: Rc<dyn Catalog>, undo: Rc<dyn UndoHistory>) -> Self {
        Self {
            catalog,
            undo,
            scheduler: RenderScheduler::new(),
            dispatcher: UiDispatcher::new(),
            opts: CompositorOpts::from_env(),
        }
    }

    /// Builtin registry, in-memory undo log, options from the environment.
    pub fn with_builtins() -> (Self, Rc<UndoLog>) {
        let undo = Rc::new(UndoLog::new());
        let cx = Self::new(Rc::new(Registry::with_builtins()), undo.clone());
        (cx, undo)
    }

    pub fn with_opts(mut self, opts: CompositorOpts) -> Self {
        self.opts = opts;
        self
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("scheduler", &self.scheduler)
            .field("dispatcher", &self.dispatcher)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/unit/session/context.rs"]
mod tests;
