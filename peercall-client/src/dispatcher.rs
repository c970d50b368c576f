//! Hands work from arbitrary threads to the single apply thread.
//!
//! Producers hold a [`DispatchHandle`] and call [`DispatchHandle::enqueue`],
//! which never blocks. The owner calls [`Dispatcher::drain`] once per tick.
//! A drain runs exactly the actions that were queued before it started;
//! anything enqueued while it runs waits for the next drain.

use crate::error::CallError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tokio::sync::mpsc;
use tracing::{debug, error};

pub type Action<T> = Box<dyn FnOnce(&mut T) -> Result<(), CallError> + Send + 'static>;

pub struct Dispatcher<T> {
    tx: mpsc::UnboundedSender<Action<T>>,
    rx: mpsc::UnboundedReceiver<Action<T>>,
}

/// Cloneable, thread-safe producer side of a [`Dispatcher`].
pub struct DispatchHandle<T> {
    tx: mpsc::UnboundedSender<Action<T>>,
}

impl<T> Clone for DispatchHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> DispatchHandle<T> {
    /// Queues `action` for the next drain. Returns `false` if the dispatcher
    /// has been dropped.
    pub fn enqueue<F>(&self, action: F) -> bool
    where
        F: FnOnce(&mut T) -> Result<(), CallError> + Send + 'static,
    {
        if self.tx.send(Box::new(action)).is_err() {
            debug!("Dispatcher gone, dropping action");
            return false;
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct DrainReport {
    pub executed: usize,
    pub failures: Vec<CallError>,
}

impl<T> Dispatcher<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn handle(&self) -> DispatchHandle<T> {
        DispatchHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn enqueue<F>(&self, action: F) -> bool
    where
        F: FnOnce(&mut T) -> Result<(), CallError> + Send + 'static,
    {
        self.tx.send(Box::new(action)).is_ok()
    }

    /// Runs the current batch against `target` in FIFO order.
    ///
    /// Errors and panics are caught per action and collected in the report;
    /// the rest of the batch still runs.
    pub fn drain(&mut self, target: &mut T) -> DrainReport {
        let mut batch = Vec::new();
        while let Ok(action) = self.rx.try_recv() {
            batch.push(action);
        }

        let mut report = DrainReport::default();
        for action in batch {
            report.executed += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| action(target))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Dispatched action failed: {}", e);
                    report.failures.push(e);
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!("Dispatched action panicked: {}", message);
                    report.failures.push(CallError::ActionPanicked(message));
                }
            }
        }

        report
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
