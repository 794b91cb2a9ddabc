//! Bounds the number of engine runs in flight.
//!
//! Every solve can keep a core busy for its whole time limit, so the planner
//! takes a permit before starting one. Permits are returned on drop.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::{PlannerError, Result};

#[derive(Debug)]
struct Slots {
    in_use: Mutex<usize>,
    freed: Condvar,
    capacity: usize,
}

#[derive(Debug, Clone)]
pub struct SolveAdmission {
    slots: Arc<Slots>,
}

/// A held solve slot.
#[derive(Debug)]
pub struct SolvePermit {
    slots: Arc<Slots>,
}

impl SolveAdmission {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Slots {
                in_use: Mutex::new(0),
                freed: Condvar::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity
    }

    pub fn in_use(&self) -> usize {
        *self
            .slots
            .in_use
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a slot if one is free right now.
    pub fn try_acquire(&self) -> Option<SolvePermit> {
        let mut in_use = self
            .slots
            .in_use
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *in_use < self.slots.capacity {
            *in_use += 1;
            Some(self.permit())
        } else {
            None
        }
    }

    /// Wait up to `wait` for a slot.
    pub fn acquire_timeout(&self, wait: Duration) -> Result<SolvePermit> {
        let deadline = Instant::now() + wait;
        let mut in_use = self
            .slots
            .in_use
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        while *in_use >= self.slots.capacity {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(capacity = self.slots.capacity, "no solve slot available");
                return Err(PlannerError::Overloaded {
                    capacity: self.slots.capacity,
                });
            }
            let (guard, _) = self
                .slots
                .freed
                .wait_timeout(in_use, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            in_use = guard;
        }

        *in_use += 1;
        Ok(self.permit())
    }

    fn permit(&self) -> SolvePermit {
        SolvePermit {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl Drop for SolvePermit {
    fn drop(&mut self) {
        let mut in_use = self
            .slots
            .in_use
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *in_use = in_use.saturating_sub(1);
        self.slots.freed.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_capacity_is_enforced() {
        let admission = SolveAdmission::new(2);
        let first = admission.try_acquire();
        let second = admission.try_acquire();
        assert!(first.is_some() && second.is_some());
        assert!(admission.try_acquire().is_none());
        assert_eq!(admission.in_use(), 2);
    }

    #[test]
    fn test_drop_releases_slot() {
        let admission = SolveAdmission::new(1);
        let permit = admission.try_acquire().unwrap();
        drop(permit);
        assert_eq!(admission.in_use(), 0);
        assert!(admission.try_acquire().is_some());
    }

    #[test]
    fn test_acquire_timeout_overloaded() {
        let admission = SolveAdmission::new(1);
        let _held = admission.try_acquire().unwrap();
        let err = admission
            .acquire_timeout(Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(err, PlannerError::Overloaded { capacity: 1 }));
    }

    #[test]
    fn test_acquire_waits_for_release() {
        let admission = SolveAdmission::new(1);
        let held = admission.try_acquire().unwrap();
        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            drop(held);
        });
        let permit = admission.acquire_timeout(Duration::from_secs(5));
        assert!(permit.is_ok());
        releaser.join().unwrap();
    }

    #[test]
    fn test_zero_capacity_rounds_up() {
        assert_eq!(SolveAdmission::new(0).capacity(), 1);
    }
}
