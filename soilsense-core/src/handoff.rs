//! Cycle handoff between the acquisition task and its consumers
//!
//! The acquisition task owns the [`PipelineContext`](crate::pipeline::PipelineContext).
//! Consumers (radio, web UI) never touch it; they receive copies of
//! [`CycleOutput`] through one of two channels:
//!
//! - [`SnapshotSlot`]: latest-value cell. Readers always see the newest
//!   complete snapshot and older ones are overwritten. Needs `std`.
//! - [`SnapshotQueue`]: bounded lock-free SPSC queue for consumers that
//!   must see every published cycle. When full, the newest snapshot is
//!   dropped and counted.

use heapless::spsc::{Consumer, Producer, Queue};

use crate::pipeline::CycleOutput;

#[cfg(feature = "std")]
pub use slot::SnapshotSlot;

#[cfg(feature = "std")]
mod slot {
    use std::sync::{Mutex, MutexGuard};

    use crate::pipeline::CycleOutput;

    /// Latest-value cell shared between threads
    #[derive(Debug, Default)]
    pub struct SnapshotSlot {
        inner: Mutex<Option<CycleOutput>>,
    }

    impl SnapshotSlot {
        /// Empty slot
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, Option<CycleOutput>> {
            // A writer cannot leave a half-written Copy value behind, so a
            // poisoned lock still holds a complete snapshot.
            self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }

        /// Replace the stored snapshot
        pub fn publish(&self, output: CycleOutput) {
            *self.lock() = Some(output);
        }

        /// Copy of the newest snapshot
        pub fn latest(&self) -> Option<CycleOutput> {
            *self.lock()
        }

        /// Take the newest snapshot, leaving the slot empty
        pub fn take(&self) -> Option<CycleOutput> {
            self.lock().take()
        }
    }
}

/// Bounded single-producer single-consumer queue of snapshots
///
/// Holds at most `N - 1` snapshots.
pub struct SnapshotQueue<const N: usize> {
    queue: Queue<CycleOutput, N>,
}

impl<const N: usize> Default for SnapshotQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SnapshotQueue<N> {
    /// Empty queue; usable in a `static`
    pub const fn new() -> Self {
        Self { queue: Queue::new() }
    }

    /// Split into the acquisition-side and consumer-side handles
    pub fn split(&mut self) -> (SnapshotProducer<'_, N>, SnapshotConsumer<'_, N>) {
        let (producer, consumer) = self.queue.split();
        (SnapshotProducer { producer, dropped: 0 }, SnapshotConsumer { consumer })
    }
}

/// Acquisition-side handle
pub struct SnapshotProducer<'a, const N: usize> {
    producer: Producer<'a, CycleOutput, N>,
    dropped: u32,
}

impl<'a, const N: usize> SnapshotProducer<'a, N> {
    /// Enqueue a snapshot; returns false and counts it when the queue is full
    pub fn push(&mut self, output: CycleOutput) -> bool {
        match self.producer.enqueue(output) {
            Ok(()) => true,
            Err(_) => {
                self.dropped = self.dropped.saturating_add(1);
                log_warn!("snapshot queue full, {} dropped", self.dropped);
                false
            }
        }
    }

    /// Snapshots dropped because the consumer fell behind
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

/// Consumer-side handle
pub struct SnapshotConsumer<'a, const N: usize> {
    consumer: Consumer<'a, CycleOutput, N>,
}

impl<'a, const N: usize> SnapshotConsumer<'a, N> {
    /// Oldest pending snapshot
    pub fn pop(&mut self) -> Option<CycleOutput> {
        self.consumer.dequeue()
    }

    /// Snapshots waiting
    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    /// True when nothing is waiting
    pub fn is_empty(&self) -> bool {
        !self.consumer.ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StageReport;
    use crate::publish::PublishDecision;
    use crate::reading::SensorReading;

    fn output(t: f32) -> CycleOutput {
        CycleOutput {
            reading: SensorReading { temperature: t, ..SensorReading::default() },
            publish: PublishDecision::First,
            stages: StageReport::default(),
        }
    }

    #[test]
    fn queue_preserves_order_and_counts_drops() {
        let mut queue: SnapshotQueue<4> = SnapshotQueue::new();
        let (mut tx, mut rx) = queue.split();
        assert!(rx.is_empty());
        for t in 0..3 {
            assert!(tx.push(output(t as f32)));
        }
        assert!(!tx.push(output(9.0)));
        assert_eq!(tx.dropped(), 1);
        assert_eq!(rx.len(), 3);
        assert_eq!(rx.pop().map(|o| o.reading.temperature), Some(0.0));
        assert_eq!(rx.pop().map(|o| o.reading.temperature), Some(1.0));
        assert_eq!(rx.pop().map(|o| o.reading.temperature), Some(2.0));
        assert_eq!(rx.pop(), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn slot_keeps_latest_across_threads() {
        use std::sync::Arc;

        let slot = Arc::new(SnapshotSlot::new());
        assert_eq!(slot.latest(), None);

        let writer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for t in 0..100 {
                    slot.publish(output(t as f32));
                }
            })
        };
        writer.join().unwrap();

        assert_eq!(slot.latest().map(|o| o.reading.temperature), Some(99.0));
        assert!(slot.take().is_some());
        assert_eq!(slot.take(), None);
    }
}
