//! Online rolling volatility.
//!
//! Fixed-capacity circular buffer of the last W samples with a running sum
//! and sum of squares. Volatility is the population standard deviation
//! (`/count`) of the buffered samples.
//!
//! **Drift**: the running sums are rebuilt from the buffer once per full
//! cycle of evictions, so floating-point error cannot accumulate beyond one
//! window's worth of updates.

use crate::error::{DetectorError, DetectorResult};

/// Rolling standard deviation over the most recent `capacity` samples.
#[derive(Debug, Clone)]
pub struct VolatilityWindow {
    buffer: Vec<f64>,
    capacity: usize,
    /// Next slot to overwrite once the buffer is full.
    head: usize,
    sum: f64,
    sum_sq: f64,
    evictions_since_rebuild: usize,
}

impl VolatilityWindow {
    /// Create an empty window. Zero capacity is a configuration error.
    pub fn new(capacity: usize) -> DetectorResult<Self> {
        if capacity == 0 {
            return Err(DetectorError::ConfigError(
                "volatility window size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            sum: 0.0,
            sum_sq: 0.0,
            evictions_since_rebuild: 0,
        })
    }

    /// Add a sample, evicting the oldest one once the window is full.
    pub fn add_sample(&mut self, x: f64) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(x);
            self.sum += x;
            self.sum_sq += x * x;
            return;
        }

        let old = self.buffer[self.head];
        self.sum -= old;
        self.sum_sq -= old * old;

        self.buffer[self.head] = x;
        self.sum += x;
        self.sum_sq += x * x;
        self.head = (self.head + 1) % self.capacity;

        self.evictions_since_rebuild += 1;
        if self.evictions_since_rebuild >= self.capacity {
            self.rebuild_sums();
        }
    }

    fn rebuild_sums(&mut self) {
        self.sum = self.buffer.iter().sum();
        self.sum_sq = self.buffer.iter().map(|x| x * x).sum();
        self.evictions_since_rebuild = 0;
    }

    /// Population standard deviation. Exactly 0 with fewer than 2 samples.
    pub fn volatility(&self) -> f64 {
        let count = self.buffer.len();
        if count < 2 {
            return 0.0;
        }
        let n = count as f64;
        let mean = self.sum / n;
        // Cancellation can push this slightly below zero
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        variance.sqrt()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Buffered samples, oldest first.
    #[cfg(test)]
    fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.buffer.split_at(self.head);
        older.iter().chain(newer.iter()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_std(samples: &[f64]) -> f64 {
        if samples.len() < 2 {
            return 0.0;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        var.sqrt()
    }

    fn assert_close(a: f64, b: f64) {
        let scale = a.abs().max(b.abs()).max(1e-12);
        assert!(
            (a - b).abs() / scale < 1e-9,
            "incremental {a} vs from-scratch {b}"
        );
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            VolatilityWindow::new(0),
            Err(DetectorError::ConfigError(_))
        ));
    }

    #[test]
    fn test_zero_for_fewer_than_two_samples() {
        for capacity in [1, 2, 10] {
            let mut window = VolatilityWindow::new(capacity).unwrap();
            assert_eq!(window.volatility(), 0.0);
            window.add_sample(0.0042);
            assert_eq!(window.volatility(), 0.0);
        }
    }

    #[test]
    fn test_capacity_one_stays_zero() {
        let mut window = VolatilityWindow::new(1).unwrap();
        for x in [1.0, 5.0, -3.0] {
            window.add_sample(x);
            assert_eq!(window.len(), 1);
            assert_eq!(window.volatility(), 0.0);
        }
        assert_eq!(window.samples().collect::<Vec<_>>(), vec![-3.0]);
    }

    #[test]
    fn test_population_formula_pinned() {
        let mut window = VolatilityWindow::new(8).unwrap();
        for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            window.add_sample(x);
        }
        // Population std of this set is exactly 2 (sample std would be ~2.138)
        assert!((window.volatility() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_eviction_matches_from_scratch() {
        let capacity = 7;
        let mut window = VolatilityWindow::new(capacity).unwrap();
        let mut all = Vec::new();

        // Deterministic pseudo-random noise around zero, spread-sized
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        for _ in 0..500 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let x = 0.001 * ((state >> 33) as f64 / (1u64 << 31) as f64 - 0.5);
            window.add_sample(x);
            all.push(x);

            let start = all.len().saturating_sub(capacity);
            assert_close(window.volatility(), naive_std(&all[start..]));
        }
        assert_eq!(window.len(), capacity);
    }

    #[test]
    fn test_samples_oldest_first() {
        let mut window = VolatilityWindow::new(3).unwrap();
        for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
            window.add_sample(x);
        }
        assert_eq!(window.samples().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_constant_samples_never_negative() {
        let mut window = VolatilityWindow::new(50).unwrap();
        for _ in 0..200 {
            window.add_sample(1.234_567_89);
        }
        let vol = window.volatility();
        assert!(vol >= 0.0);
        assert!(vol < 1e-6);
    }
}
