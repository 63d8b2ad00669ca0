//! Named threads with small numeric ids for log records.

use ember_types::{EmberError, Result};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;
use tracing::debug;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
    static FIBER_ID: Cell<u64> = const { Cell::new(0) };
}

/// Numeric id of the calling thread, assigned on first use.
pub fn current_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

/// Name of the calling thread, or `UNKNOWN`.
pub fn current_name() -> String {
    std::thread::current()
        .name()
        .unwrap_or("UNKNOWN")
        .to_string()
}

/// Fiber/task id recorded for the calling thread (0 when unset).
pub fn current_fiber_id() -> u64 {
    FIBER_ID.with(Cell::get)
}

/// Record the fiber/task currently running on this thread.
pub fn set_current_fiber_id(id: u64) {
    FIBER_ID.with(|fiber| fiber.set(id));
}

/// A named OS thread running one callback.
pub struct Thread {
    id: u64,
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl Thread {
    /// Spawn `callback` on a new thread called `name`.
    ///
    /// Returns once the thread has started and reported its id.
    pub fn spawn<F>(name: impl Into<String>, callback: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();
        let (tx, rx) = mpsc::sync_channel(1);

        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                // The receiver only disappears if spawn() already gave up.
                let _ = tx.send(current_id());
                callback();
            })?;

        let id = rx
            .recv()
            .map_err(|_| EmberError::Other(format!("thread '{}' exited before starting", name)))?;
        debug!("Started thread {} ({})", name, id);

        Ok(Self {
            id,
            name,
            handle: Some(handle),
        })
    }

    /// Numeric id of the spawned thread.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Name of the spawned thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the callback to finish.
    pub fn join(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| EmberError::Other(format!("thread '{}' panicked", self.name))),
            None => Ok(()),
        }
    }
}
