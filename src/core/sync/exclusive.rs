/*!
 * Exclusive Slot
 *
 * Single-slot hand-off: the first writer wins and every other writer blocks
 * until the value is cleared. Reading is always allowed.
 *
 * # Design: Explicit Occupancy Over Held Lock
 *
 * Instead of keeping a mutex locked for as long as the slot is occupied, the
 * slot records its occupant thread and writers wait on a condvar for the
 * "vacated" signal. Every path takes and releases the inner lock exactly
 * once, so there is no lock to leak when the occupant never clears the slot.
 */

use parking_lot::{Condvar, Mutex};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use tracing::trace;

struct Slot<T> {
    value: Option<T>,
    occupant: Option<ThreadId>,
}

impl<T> Slot<T> {
    /// Store `value` if the slot is empty or already ours
    #[inline]
    fn try_fill(&mut self, value: T, me: ThreadId) -> Result<(), T> {
        match self.occupant {
            Some(occupant) if occupant != me => Err(value),
            _ => {
                self.value = Some(value);
                self.occupant = Some(me);
                Ok(())
            }
        }
    }
}

pub struct Exclusive<T> {
    slot: Mutex<Slot<T>>,
    vacated: Condvar,
}

impl<T> Default for Exclusive<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Exclusive<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                occupant: None,
            }),
            vacated: Condvar::new(),
        }
    }

    /// Store `value`, blocking while another thread occupies the slot
    ///
    /// The occupying thread itself may overwrite its value without blocking.
    pub fn set(&self, value: T) {
        let me = thread::current().id();
        let mut slot = self.slot.lock();
        let mut pending = value;

        loop {
            match slot.try_fill(pending, me) {
                Ok(()) => return,
                Err(value) => {
                    pending = value;
                    self.vacated.wait(&mut slot);
                }
            }
        }
    }

    /// Store `value` only if the slot is free (or ours); hands it back otherwise
    pub fn try_set(&self, value: T) -> Result<(), T> {
        self.slot.lock().try_fill(value, thread::current().id())
    }

    /// Bounded [`set`](Self::set); hands the value back on timeout
    pub fn set_timeout(&self, value: T, timeout: Duration) -> Result<(), T> {
        let me = thread::current().id();
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        let mut pending = value;

        loop {
            match slot.try_fill(pending, me) {
                Ok(()) => return Ok(()),
                Err(value) => {
                    if self.vacated.wait_until(&mut slot, deadline).timed_out() {
                        return slot.try_fill(value, me);
                    }
                    pending = value;
                }
            }
        }
    }

    /// Clear the slot and wake one blocked writer; returns the stored value
    pub fn release(&self) -> Option<T> {
        let mut slot = self.slot.lock();
        let value = slot.value.take();
        if slot.occupant.take().is_some() {
            trace!("Exclusive slot vacated");
            self.vacated.notify_one();
        }
        value
    }

    pub fn is_occupied(&self) -> bool {
        self.slot.lock().occupant.is_some()
    }

    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let slot = self.slot.lock();
        f(slot.value.as_ref())
    }
}

impl<T: Clone> Exclusive<T> {
    pub fn get(&self) -> Option<T> {
        self.slot.lock().value.clone()
    }
}
