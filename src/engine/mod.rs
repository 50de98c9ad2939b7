//! The transition engine: the machine facade, its shareable handle and the
//! worker thread that applies queued events.
//!
//! # Threading model
//!
//! - Exactly one worker thread exists per running machine
//! - `raise` may be called from any thread, including state callbacks, and
//!   never waits for the worker
//! - All callbacks and all active-state changes happen on the worker thread
//!   (or on the caller of `start`, before the worker exists)
//! - States and rules are configured only while the machine is stopped

mod handle;
mod machine;
mod registry;
mod worker;

pub use handle::MachineHandle;
pub use machine::Machine;

use crate::core::{StateId, TransitionHistory};
use crate::queue::EventQueue;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::thread::{self, ThreadId};
use uuid::Uuid;

/// Unique identity of a machine instance, attached to its log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(Uuid);

impl MachineId {
    pub(crate) fn generate() -> Self {
        MachineId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// State reachable from every handle and from the worker.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) id: MachineId,
    pub(crate) name: String,
    pub(crate) queue: EventQueue,
    pub(crate) active: RwLock<Option<StateId>>,
    pub(crate) running: AtomicBool,
    pub(crate) history: Mutex<TransitionHistory>,
    /// Thread currently running the worker loop, if any.
    pub(crate) worker_thread: Mutex<Option<ThreadId>>,
}

impl Shared {
    pub(crate) fn new(name: String, history_capacity: usize) -> Self {
        Self {
            id: MachineId::generate(),
            name,
            queue: EventQueue::new(),
            active: RwLock::new(None),
            running: AtomicBool::new(false),
            history: Mutex::new(TransitionHistory::with_capacity(history_capacity)),
            worker_thread: Mutex::new(None),
        }
    }

    pub(crate) fn on_worker_thread(&self) -> bool {
        *self.worker_thread.lock() == Some(thread::current().id())
    }
}
