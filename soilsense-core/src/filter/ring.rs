//! Fixed-Capacity Sample Ring
//!
//! ## Overview
//!
//! Each filter channel keeps its recent accepted samples in a ring whose
//! storage is fixed at compile time (`N`) while the active window is chosen
//! at runtime (`1..=N`). Reconfiguring the window never reallocates.
//!
//! ```text
//! SampleRing<15> with window = 5, after 7 pushes (a..g):
//! ┌───┬───┬───┬───┬───┬───┬─ ─ ─┬────┐
//! │ f │ g │ c │ d │ e │ · │     │ ·  │  ← only slots 0..window used
//! └───┴───┴───┴───┴───┴───┴─ ─ ─┴────┘
//!           ↑
//!           write_pos = 2, oldest = c
//!
//! Logical view (oldest → newest): c d e f g
//! ```
//!
//! All index arithmetic lives in `push` and `get`; callers only see
//! bounds-checked iteration and the summary statistics the filters need.

/// Ring of the most recent `window` samples, storage for `N`
///
/// ## Internal Invariants
///
/// - `1 <= window <= N`
/// - `write_pos < window`
/// - `len <= window`
#[derive(Debug, Clone)]
pub struct SampleRing<const N: usize> {
    data: [Option<f32>; N],
    window: usize,
    write_pos: usize,
    len: usize,
}

impl<const N: usize> SampleRing<N> {
    /// Empty ring using the full storage as window
    pub const fn new() -> Self {
        Self {
            data: [None; N],
            window: N,
            write_pos: 0,
            len: 0,
        }
    }

    /// Empty ring with a runtime window, clamped to `1..=N`
    pub fn with_window(window: usize) -> Self {
        let mut ring = Self::new();
        ring.set_window(window);
        ring
    }

    /// Change the window; the ring is cleared
    pub fn set_window(&mut self, window: usize) {
        self.window = window.clamp(1, N.max(1));
        self.clear();
    }

    /// Active window
    pub fn window(&self) -> usize {
        self.window
    }

    /// Storage capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Append a sample, evicting the oldest when the window is full
    pub fn push(&mut self, value: f32) {
        if N == 0 {
            return;
        }
        self.data[self.write_pos] = Some(value);
        self.write_pos = (self.write_pos + 1) % self.window;

        if self.len < self.window {
            self.len += 1;
        }
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no sample is stored
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when the window is full
    pub fn is_full(&self) -> bool {
        self.len == self.window
    }

    /// Most recent sample
    pub fn last(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let idx = if self.write_pos == 0 { self.window - 1 } else { self.write_pos - 1 };
        self.data.get(idx).copied().flatten()
    }

    /// Drop all samples, keeping the window
    pub fn clear(&mut self) {
        self.data = [None; N];
        self.write_pos = 0;
        self.len = 0;
    }

    /// Sample by logical index (0 = oldest)
    pub fn get(&self, index: usize) -> Option<f32> {
        if index >= self.len {
            return None;
        }
        let physical = if self.len < self.window {
            index
        } else {
            (self.write_pos + index) % self.window
        };
        self.data.get(physical).copied().flatten()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    /// Arithmetic mean
    pub fn mean(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        Some(self.iter().sum::<f32>() / self.len as f32)
    }

    /// Population variance
    pub fn variance(&self) -> Option<f32> {
        let mean = self.mean()?;
        let sum_sq: f32 = self.iter().map(|v| (v - mean) * (v - mean)).sum();
        Some(sum_sq / self.len as f32)
    }

    /// Population standard deviation
    pub fn std_dev(&self) -> Option<f32> {
        self.variance().map(libm::sqrtf)
    }

    /// Median; even counts take the lower of the two middle samples
    pub fn median(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let mut sorted = [0.0f32; N];
        for (slot, v) in sorted.iter_mut().zip(self.iter()) {
            *slot = v;
        }
        let samples = &mut sorted[..self.len];
        samples.sort_unstable_by(|a, b| a.total_cmp(b));
        samples.get((self.len - 1) / 2).copied()
    }
}

impl<const N: usize> Default for SampleRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ring() {
        let ring: SampleRing<5> = SampleRing::new();
        assert!(ring.is_empty());
        assert_eq!(ring.len(), 0);
        assert!(ring.last().is_none());
        assert!(ring.mean().is_none());
        assert!(ring.median().is_none());
    }

    #[test]
    fn runtime_window_evicts_oldest() {
        let mut ring = SampleRing::<15>::with_window(3);
        for i in 0..5 {
            ring.push(i as f32);
        }
        assert_eq!(ring.len(), 3);
        assert!(ring.is_full());
        let values: Vec<f32> = ring.iter().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(ring.last(), Some(4.0));
    }

    #[test]
    fn window_is_clamped() {
        assert_eq!(SampleRing::<15>::with_window(0).window(), 1);
        assert_eq!(SampleRing::<15>::with_window(40).window(), 15);
    }

    #[test]
    fn set_window_clears() {
        let mut ring = SampleRing::<15>::with_window(5);
        ring.push(1.0);
        ring.set_window(7);
        assert!(ring.is_empty());
        assert_eq!(ring.window(), 7);
    }

    #[test]
    fn statistics() {
        let mut ring = SampleRing::<8>::with_window(4);
        for v in [2.0, 4.0, 4.0, 6.0] {
            ring.push(v);
        }
        assert_eq!(ring.mean(), Some(4.0));
        assert_eq!(ring.variance(), Some(2.0));
        assert!((ring.std_dev().unwrap() - 1.414_213_5).abs() < 1e-6);
    }

    #[test]
    fn median_odd_and_even() {
        let mut ring = SampleRing::<15>::with_window(5);
        for v in [9.0, 1.0, 5.0, 3.0, 7.0] {
            ring.push(v);
        }
        assert_eq!(ring.median(), Some(5.0));

        let mut even = SampleRing::<15>::with_window(6);
        for v in [9.0, 1.0, 5.0, 3.0, 7.0, 11.0] {
            even.push(v);
        }
        // sorted 1 3 5 7 9 11 → lower middle
        assert_eq!(even.median(), Some(5.0));
    }
}
