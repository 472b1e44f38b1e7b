//! Rolling mean over the most recent observations.
//!
//! Bounded FIFO of integer observations with a running sum, so the mean is
//! exact and independent of insertion history.

use std::collections::VecDeque;

/// Rolling mean over the last `window` observations.
#[derive(Debug, Clone)]
pub struct RollingMean {
    /// Window size in observations.
    window: usize,
    /// Most recent observations, oldest first.
    values: VecDeque<u32>,
    /// Running sum of `values`.
    sum: u64,
}

impl RollingMean {
    /// Create a new rolling mean. A zero window is treated as one.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            values: VecDeque::with_capacity(window),
            sum: 0,
        }
    }

    /// Add an observation, evicting the oldest once the window is full.
    pub fn push(&mut self, value: u32) {
        if self.values.len() >= self.window {
            if let Some(old) = self.values.pop_front() {
                self.sum -= u64::from(old);
            }
        }
        self.values.push_back(value);
        self.sum += u64::from(value);
    }

    /// Mean of the observations in the window; 0.0 when empty.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.sum as f64 / self.values.len() as f64
    }

    /// Number of observations currently in the window.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Whether the window is full.
    pub fn is_full(&self) -> bool {
        self.values.len() >= self.window
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.values.clear();
        self.sum = 0;
    }
}
