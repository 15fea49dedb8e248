//! Browser timer and task boundaries.

use crate::fetch::Spawner;
#[cfg(feature = "cache")]
use crate::prefetch::Scheduler;
use futures::future::LocalBoxFuture;
#[cfg(feature = "cache")]
use gloo_timers::callback::Timeout;
#[cfg(feature = "cache")]
use std::cell::{Cell, RefCell};
#[cfg(feature = "cache")]
use std::collections::HashMap;
#[cfg(feature = "cache")]
use std::rc::Rc;

/// `setTimeout`-backed [`Scheduler`].
///
/// Pending [`Timeout`] handles are held in a map so `clear_timeout` can drop
/// them (dropping a gloo `Timeout` without `forget()` clears the underlying
/// browser timer).
#[cfg(feature = "cache")]
#[derive(Default)]
pub struct WebScheduler {
    next_id: Cell<u64>,
    pending: Rc<RefCell<HashMap<u64, Timeout>>>,
}

#[cfg(feature = "cache")]
impl WebScheduler {
    /// Create a scheduler with no pending timers.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "cache")]
impl Scheduler for WebScheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let pending = Rc::clone(&self.pending);
        let timeout = Timeout::new(delay_ms, move || {
            pending.borrow_mut().remove(&id);
            callback();
        });
        self.pending.borrow_mut().insert(id, timeout);
        id
    }

    fn clear_timeout(&self, id: u64) {
        if let Some(timeout) = self.pending.borrow_mut().remove(&id) {
            timeout.cancel();
        }
    }
}

/// [`Spawner`] over the wasm-bindgen single-threaded executor.
pub struct WasmSpawner;

impl Spawner for WasmSpawner {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }
}
