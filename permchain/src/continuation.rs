//! Single-shot continuation slots
//!
//! A scope handed to a developer callback resolves the owning task through
//! one of these. The task takes the value once the callback returns and then
//! closes the slot, so a scope that escaped its callback cannot resolve a
//! task that has already moved on.

use std::sync::{Mutex, MutexGuard};

use crate::error::ChainError;

#[derive(Debug)]
enum Slot<T> {
    Pending,
    Resolved(T),
    Closed,
}

/// A value that can be resolved exactly once
#[derive(Debug)]
pub struct Continuation<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> Continuation<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Pending),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Resolve the continuation
    ///
    /// Fails if it was already resolved or the owner has closed it.
    pub fn resolve(&self, value: T) -> Result<(), ChainError> {
        let mut slot = self.lock();
        match *slot {
            Slot::Pending => {
                *slot = Slot::Resolved(value);
                Ok(())
            }
            Slot::Resolved(_) => Err(ChainError::ContinuationResolved),
            Slot::Closed => Err(ChainError::ContinuationClosed),
        }
    }

    /// Take the resolved value (if any) and close the slot
    pub fn take(&self) -> Option<T> {
        match std::mem::replace(&mut *self.lock(), Slot::Closed) {
            Slot::Resolved(value) => Some(value),
            Slot::Pending | Slot::Closed => None,
        }
    }
}

impl<T> Default for Continuation<T> {
    fn default() -> Self {
        Self::new()
    }
}
