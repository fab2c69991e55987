//! Fixed-Size Sample Window for RSSI History
//!
//! ## Overview
//!
//! A circular (ring) buffer holding the most recent raw signal-strength
//! readings for one beacon. The capacity is a compile-time constant, so
//! the collector's memory footprint is fixed regardless of how long the
//! radio keeps streaming.
//!
//! ## Design Rationale
//!
//! Distance estimation needs a sliding window of recent readings:
//! older samples describe a position the user may have already left,
//! while the outlier trim and the Kalman filter need enough history to
//! suppress multipath spikes. A ring buffer gives both properties with
//! fixed memory:
//!
//! - O(1) insertion (overwrites the oldest reading when full)
//! - O(n) chronological iteration for the compute cycle
//! - Zero heap allocations
//!
//! The window is owned by the collector and handed to the core only as
//! an immutable snapshot - the compute cycle never mutates it in place.
//!
//! ```text
//! SampleWindow<5> after 7 pushes of r0..r6:
//! ┌────┬────┬────┬────┬────┐
//! │ r5 │ r6 │ r2 │ r3 │ r4 │   write_pos = 2
//! └────┴────┴────┴────┴────┘
//! iter() yields r2, r3, r4, r5, r6 (oldest to newest)
//! ```

use heapless::Vec;

/// Fixed-capacity ring buffer of raw RSSI readings (dBm-like, signed)
///
/// ## Type Parameter
///
/// - `N`: window capacity, a compile-time constant. The reference
///   configuration uses [`crate::constants::SAMPLE_WINDOW_CAPACITY`].
///
/// ## Invariants
///
/// - `write_pos < N`
/// - `len <= N`
/// - `iter()` and `snapshot()` yield readings in chronological order
#[derive(Clone)]
pub struct SampleWindow<const N: usize> {
    /// Backing storage; slots beyond `len` are unwritten zeros
    data: [i16; N],
    /// Index of the next write, wraps at N
    write_pos: usize,
    /// Number of valid readings
    len: usize,
}

impl<const N: usize> SampleWindow<N> {
    /// Creates an empty window
    ///
    /// Const so windows can live in statics on embedded targets.
    pub const fn new() -> Self {
        Self {
            data: [0; N],
            write_pos: 0,
            len: 0,
        }
    }

    /// Adds a reading, overwriting the oldest when full
    pub fn push(&mut self, rssi: i16) {
        self.data[self.write_pos] = rssi;
        self.write_pos = (self.write_pos + 1) % N;

        if self.len < N {
            self.len += 1;
        }
    }

    /// Number of stored readings
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no readings are stored
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if the window holds its full capacity
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Discard all readings
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = i16> + '_ {
        (0..self.len).map(move |i| self.data[self.physical_index(i)])
    }

    /// Copy out the readings in chronological order
    ///
    /// This is the hand-off point to the compute cycle: the snapshot is
    /// an independent copy, so the collector can keep pushing while the
    /// cycle runs over frozen data.
    pub fn snapshot(&self) -> Vec<i16, N> {
        let mut out = Vec::new();
        for sample in self.iter() {
            // Capacity N bounds the iterator, push cannot fail
            let _ = out.push(sample);
        }
        out
    }

    /// Map a logical index (0 = oldest) to a physical slot
    fn physical_index(&self, index: usize) -> usize {
        if self.len < N {
            index
        } else {
            (self.write_pos + index) % N
        }
    }
}

impl<const N: usize> Default for SampleWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window() {
        let window: SampleWindow<5> = SampleWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.len(), 0);
        assert!(window.snapshot().is_empty());
    }

    #[test]
    fn push_and_snapshot() {
        let mut window = SampleWindow::<5>::new();
        window.push(-60);
        window.push(-62);

        assert_eq!(window.len(), 2);
        assert_eq!(window.snapshot().as_slice(), &[-60, -62]);
    }

    #[test]
    fn overwrite_keeps_newest() {
        let mut window = SampleWindow::<3>::new();
        for rssi in [-50, -51, -52, -53, -54] {
            window.push(rssi);
        }

        assert!(window.is_full());
        assert_eq!(window.len(), 3);
        assert_eq!(window.snapshot().as_slice(), &[-52, -53, -54]);
    }

    #[test]
    fn iteration_chronological() {
        let mut window = SampleWindow::<4>::new();
        for rssi in [-70, -71, -72] {
            window.push(rssi);
        }

        let collected: heapless::Vec<i16, 4> = window.iter().collect();
        assert_eq!(collected.as_slice(), &[-70, -71, -72]);
    }

    #[test]
    fn clear_resets() {
        let mut window = SampleWindow::<3>::new();
        window.push(-40);
        window.clear();

        assert!(window.is_empty());
        window.push(-45);
        assert_eq!(window.snapshot().as_slice(), &[-45]);
    }
}
