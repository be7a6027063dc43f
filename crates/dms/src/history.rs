//! Bounded eye-count history

use std::collections::VecDeque;

/// Sliding window of recent eye counts, oldest evicted first
#[derive(Debug, Clone)]
pub struct EyeStateHistory {
    data: VecDeque<usize>,
    capacity: usize,
}

impl EyeStateHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, eye_count: usize) {
        if self.data.len() >= self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(eye_count);
    }

    /// Mean of the newest `n` entries, once at least `n` are present
    pub fn recent_mean(&self, n: usize) -> Option<f64> {
        if n == 0 || self.data.len() < n {
            return None;
        }
        let sum: usize = self.data.iter().rev().take(n).sum();
        Some(sum as f64 / n as f64)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.data.iter()
    }
}
