//! Fixed-capacity cooperative timer pool.
//!
//! The pool is the sole timing mechanism of the controller: a fixed number
//! of slots, each holding a delay, a remaining-run count, and an action
//! value. `tick()` must be called once per control-loop iteration; it
//! returns the actions that came due, in slot order, and the caller
//! dispatches them. Because firing happens after the whole pool has been
//! scanned — and dispatch happens outside the pool entirely — a fired
//! action may freely schedule new timers or cancel arbitrary ones
//! (including its own) without corrupting the scan.
//!
//! Slot indices are reused; `TimerId`s are monotonically increasing and
//! never reused for the life of the process, so a stale id held by a caller
//! can never cancel somebody else's timer.
//!
//! The pool assumes the single-threaded cooperative model: it is only ever
//! touched from the control-loop thread.

use thiserror::Error;

/// Scheduling failure. The pool never grows; when every slot is live a new
/// request is refused and the caller must treat the deferred action as
/// dropped (a user-visible degradation, not a crash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer pool capacity exhausted ({capacity} slots live)")]
    CapacityExceeded { capacity: usize },
}

/// Opaque handle for a scheduled timer. Ids are unique for the process
/// lifetime even though slots are recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u32);

/// How many times a timer fires before its slot is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Once,
    /// Fire this many times. `Times(0)` is treated as `Once`.
    Times(u32),
    Forever,
}

struct Slot<A> {
    id: TimerId,
    delay_ms: u64,
    /// Baseline for the elapsed-time comparison; reset on fire and restart.
    armed_at_ms: u64,
    /// `None` means run forever.
    remaining: Option<u32>,
    enabled: bool,
    action: A,
}

/// Fixed pool of schedulable deferred/repeating actions.
pub struct TimerPool<A> {
    slots: Vec<Option<Slot<A>>>,
    next_id: u32,
    live: usize,
    exhaustions: u64,
}

impl<A: Copy> TimerPool<A> {
    /// Create a pool with a fixed number of slots.
    pub fn with_capacity(capacity: usize) -> TimerPool<A> {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        TimerPool {
            slots,
            next_id: 1,
            live: 0,
            exhaustions: 0,
        }
    }

    /// Schedule `action` once after `delay_ms`.
    pub fn after(&mut self, now_ms: u64, delay_ms: u64, action: A) -> Result<TimerId, TimerError> {
        self.repeat_n(now_ms, delay_ms, action, Repeat::Once)
    }

    /// Schedule `action` every `delay_ms` until cancelled.
    pub fn every(&mut self, now_ms: u64, delay_ms: u64, action: A) -> Result<TimerId, TimerError> {
        self.repeat_n(now_ms, delay_ms, action, Repeat::Forever)
    }

    /// Schedule `action` every `delay_ms` with an explicit run count.
    pub fn repeat_n(
        &mut self,
        now_ms: u64,
        delay_ms: u64,
        action: A,
        repeat: Repeat,
    ) -> Result<TimerId, TimerError> {
        let index = match self.slots.iter().position(Option::is_none) {
            Some(index) => index,
            None => {
                self.exhaustions += 1;
                return Err(TimerError::CapacityExceeded {
                    capacity: self.slots.len(),
                });
            }
        };

        let id = TimerId(self.next_id);
        self.next_id += 1;

        let remaining = match repeat {
            Repeat::Once | Repeat::Times(0) => Some(1),
            Repeat::Times(n) => Some(n),
            Repeat::Forever => None,
        };

        self.slots[index] = Some(Slot {
            id,
            delay_ms,
            armed_at_ms: now_ms,
            remaining,
            enabled: true,
            action,
        });
        self.live += 1;
        Ok(id)
    }

    /// Remove the timer unconditionally. Idempotent: cancelling an id that
    /// already fired out or never existed is a no-op. Safe to call for the
    /// timer whose action is currently being dispatched; the action will
    /// not be re-entered.
    pub fn cancel(&mut self, id: TimerId) {
        if let Some(index) = self.slot_of(id) {
            self.slots[index] = None;
            self.live -= 1;
        }
    }

    /// Pause or resume a timer without releasing its slot. A disabled
    /// timer keeps its elapsed baseline.
    pub fn set_enabled(&mut self, id: TimerId, enabled: bool) {
        if let Some(index) = self.slot_of(id) {
            if let Some(slot) = self.slots[index].as_mut() {
                slot.enabled = enabled;
            }
        }
    }

    /// Whether the timer is live and enabled. A fired-out or cancelled id
    /// reports `false`.
    pub fn is_enabled(&self, id: TimerId) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|slot| slot.id == id && slot.enabled)
    }

    /// Whether the timer is still live (pending), enabled or not.
    pub fn contains(&self, id: TimerId) -> bool {
        self.slot_of(id).is_some()
    }

    /// Reset the elapsed-time baseline without touching the remaining-run
    /// count.
    pub fn restart(&mut self, id: TimerId, now_ms: u64) {
        if let Some(index) = self.slot_of(id) {
            if let Some(slot) = self.slots[index].as_mut() {
                slot.armed_at_ms = now_ms;
            }
        }
    }

    /// Number of live timers.
    pub fn active_count(&self) -> usize {
        self.live
    }

    /// Number of free slots.
    pub fn free_slots(&self) -> usize {
        self.slots.len() - self.live
    }

    /// Total slot count.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Cumulative count of refused schedule requests, for observability.
    pub fn exhaustion_count(&self) -> u64 {
        self.exhaustions
    }

    /// Advance the pool to `now_ms` and return the actions that came due,
    /// in slot order.
    ///
    /// Two-phase: first every slot is scanned, and each enabled slot whose
    /// elapsed time has reached its delay is recorded, its baseline reset
    /// and its remaining-run count decremented; only after the scan are the
    /// recorded actions collected (and exhausted slots released). The
    /// caller dispatches the returned actions, so dispatch-time mutation of
    /// the pool cannot affect which timers were determined due this tick.
    /// There is no ordering between simultaneously-due timers beyond slot
    /// order.
    pub fn tick(&mut self, now_ms: u64) -> Vec<A> {
        let mut due: Vec<usize> = Vec::new();
        for (index, entry) in self.slots.iter_mut().enumerate() {
            if let Some(slot) = entry {
                if slot.enabled && now_ms.saturating_sub(slot.armed_at_ms) >= slot.delay_ms {
                    slot.armed_at_ms = now_ms;
                    if let Some(remaining) = slot.remaining.as_mut() {
                        *remaining = remaining.saturating_sub(1);
                    }
                    due.push(index);
                }
            }
        }

        let mut fired = Vec::with_capacity(due.len());
        for index in due {
            if let Some(slot) = &self.slots[index] {
                fired.push(slot.action);
                if slot.remaining == Some(0) {
                    self.slots[index] = None;
                    self.live -= 1;
                }
            }
        }
        fired
    }

    fn slot_of(&self, id: TimerId) -> Option<usize> {
        self.slots
            .iter()
            .position(|entry| entry.as_ref().is_some_and(|slot| slot.id == id))
    }
}

#[cfg(test)]
mod tests;
