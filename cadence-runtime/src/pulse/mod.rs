//! Pulse sources: the external "call me back soon" primitive the scheduler
//! loop re-arms itself with.
//!
//! A scheduler holds two sources, a frame source for normal operation and a
//! fallback timer, and switches between them as host visibility changes.

mod manual;
mod timer;

pub use manual::ManualPulse;
pub use timer::{TokioPulse, DEFAULT_FALLBACK_DELAY_MS, DEFAULT_FRAME_PERIOD_MS};

use crate::LOG_TARGET;
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

/// One-shot callback handed to a pulse source.
pub type PulseCallback = Box<dyn FnOnce()>;

/// Requests a single callback at the host's discretion, "soon".
pub trait PulseSource {
    fn request(&self, pulse: PulseCallback);
}

/// Reports whether the host display context is visible.
pub trait Visibility {
    fn is_visible(&self) -> bool;
}

/// Host that is never backgrounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl Visibility for AlwaysVisible {
    fn is_visible(&self) -> bool {
        true
    }
}

/// Visibility toggled by the embedder. Clones share state.
#[derive(Debug, Clone)]
pub struct VisibilityFlag {
    visible: Rc<Cell<bool>>,
}

impl VisibilityFlag {
    pub fn new(visible: bool) -> Self {
        Self {
            visible: Rc::new(Cell::new(visible)),
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }
}

impl Default for VisibilityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Visibility for VisibilityFlag {
    fn is_visible(&self) -> bool {
        self.visible.get()
    }
}

/// Which source the loop currently re-arms through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseMode {
    Frame,
    Fallback,
}

/// Pick the pulse source for the current host state.
///
/// Hidden hosts only switch to the fallback timer when `keep_alive` is set;
/// otherwise the frame source stays in charge and the host throttles it.
pub fn select_mode(visible: bool, keep_alive: bool) -> PulseMode {
    if !visible && keep_alive {
        PulseMode::Fallback
    } else {
        PulseMode::Frame
    }
}

pub(crate) struct PulseSelector {
    frame: Rc<dyn PulseSource>,
    fallback: Rc<dyn PulseSource>,
    visibility: Rc<dyn Visibility>,
    keep_alive: bool,
    mode: Cell<PulseMode>,
}

impl PulseSelector {
    pub(crate) fn new(
        frame: Rc<dyn PulseSource>,
        fallback: Rc<dyn PulseSource>,
        visibility: Rc<dyn Visibility>,
        keep_alive: bool,
    ) -> Self {
        let mode = select_mode(visibility.is_visible(), keep_alive);
        Self {
            frame,
            fallback,
            visibility,
            keep_alive,
            mode: Cell::new(mode),
        }
    }

    pub(crate) fn mode(&self) -> PulseMode {
        self.mode.get()
    }

    /// Re-read visibility. Returns true when the mode changed.
    pub(crate) fn reselect(&self) -> bool {
        let mode = select_mode(self.visibility.is_visible(), self.keep_alive);
        let changed = mode != self.mode.replace(mode);
        if changed {
            debug!(target: LOG_TARGET, ?mode, "pulse source switched");
        }
        changed
    }

    pub(crate) fn request(&self, pulse: PulseCallback) {
        match self.mode.get() {
            PulseMode::Frame => self.frame.request(pulse),
            PulseMode::Fallback => self.fallback.request(pulse),
        }
    }
}
