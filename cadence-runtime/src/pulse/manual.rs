use super::{PulseCallback, PulseSource};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Pulse source driven by hand.
///
/// Requests are queued until the embedder fires them, which suits game loops
/// that already own a frame callback and deterministic tests. Clones share the
/// queue.
#[derive(Clone, Default)]
pub struct ManualPulse {
    queue: Rc<RefCell<VecDeque<PulseCallback>>>,
}

impl ManualPulse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requested pulses not yet fired.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Fire the oldest pending pulse. Returns false if none was queued.
    pub fn fire_next(&self) -> bool {
        // release the queue before running the pulse, which usually re-arms
        let next = self.queue.borrow_mut().pop_front();
        match next {
            Some(pulse) => {
                pulse();
                true
            }
            None => false,
        }
    }

    /// Fire the pulses queued right now; ones they request wait for the next call.
    pub fn fire_pending(&self) -> usize {
        let batch: Vec<PulseCallback> = self.queue.borrow_mut().drain(..).collect();
        let fired = batch.len();
        for pulse in batch {
            pulse();
        }
        fired
    }

    /// Drop all pending pulses without running them.
    pub fn clear(&self) {
        self.queue.borrow_mut().clear();
    }
}

impl PulseSource for ManualPulse {
    fn request(&self, pulse: PulseCallback) {
        self.queue.borrow_mut().push_back(pulse);
    }
}
