// SPDX-License-Identifier: GPL-3.0-only

//! Compute-once cell for expensive probe results

use std::sync::{Mutex, PoisonError};

use upgrade_contracts::ProbeError;

#[derive(Debug)]
enum CellState<T> {
    Unknown,
    Done(T),
    Failed(ProbeError),
}

/// A lazily computed, memoized probe result.
///
/// The cell holds the mutex for the whole computation, so two callers
/// racing on the same instance never trigger the expensive probe (a mount
/// round trip) twice; the second caller blocks until the first one has
/// stored `Done` or `Failed`. Failures are memoized like values: a failed
/// measurement must stay a failure, not silently retry or decay to zero.
#[derive(Debug)]
pub struct ProbeCell<T> {
    state: Mutex<CellState<T>>,
}

impl<T: Clone> ProbeCell<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CellState::Unknown),
        }
    }

    /// Return the memoized result, running `probe` on first use
    pub fn get_or_probe(
        &self,
        probe: impl FnOnce() -> Result<T, ProbeError>,
    ) -> Result<T, ProbeError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            CellState::Done(value) => Ok(value.clone()),
            CellState::Failed(error) => Err(error.clone()),
            CellState::Unknown => match probe() {
                Ok(value) => {
                    *state = CellState::Done(value.clone());
                    Ok(value)
                }
                Err(error) => {
                    *state = CellState::Failed(error.clone());
                    Err(error)
                }
            },
        }
    }

    /// Like [`Self::get_or_probe`] for computations that cannot fail
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            CellState::Done(value) => value.clone(),
            // infallible computations never store Failed
            CellState::Failed(_) | CellState::Unknown => {
                let value = init();
                *state = CellState::Done(value.clone());
                value
            }
        }
    }
}

impl<T: Clone> Default for ProbeCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn probes_at_most_once() {
        let calls = AtomicU32::new(0);
        let cell = ProbeCell::new();

        for _ in 0..3 {
            let value = cell
                .get_or_probe(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42u64)
                })
                .expect("probe succeeds");
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn memoizes_failures() {
        let calls = AtomicU32::new(0);
        let cell: ProbeCell<u64> = ProbeCell::new();
        let error = ProbeError::Timeout("mount".to_string());

        for _ in 0..3 {
            let result = cell.get_or_probe(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(error.clone())
            });
            assert_eq!(result, Err(error.clone()));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_callers_share_one_probe() {
        let cell = std::sync::Arc::new(ProbeCell::new());
        let calls = std::sync::Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = cell.clone();
                let calls = calls.clone();
                std::thread::spawn(move || {
                    cell.get_or_probe(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(5));
                        Ok(7u8)
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("thread"), Ok(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
