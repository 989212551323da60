//! Single-slot, last-write-wins hand-off
//!
//! One writer thread replaces the slot, one reader copies out of it. Nothing
//! is queued: a reader only ever sees the newest completed write.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct Mailbox<T> {
    slot: Mutex<T>,
}

impl<T> Mailbox<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Mutex::new(value),
        }
    }

    /// Mutate the slot under the lock. Keep `f` to a copy.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }

    /// Read the slot under the lock. Keep `f` to a copy.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        // the slot only ever holds plain values, a panicking writer cannot
        // leave it half-updated in a way readers care about
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Mailbox<T> {
    pub fn replace(&self, value: &T) {
        self.write(|slot| slot.clone_from(value));
    }

    pub fn snapshot(&self) -> T {
        self.read(T::clone)
    }
}
