//! Atomic publication of environment snapshots.
//!
//! The aggregator builds each [`EnvironmentSnapshot`] completely before
//! publishing it, then swaps a single `Arc` under a short write lock.
//! Readers clone the current `Arc` under a read lock and never hold the
//! lock while inspecting fields, so a reader always sees one whole snapshot
//! and never blocks the publisher for longer than a pointer swap.

use std::sync::Arc;

use aether_types::EnvironmentSnapshot;
use parking_lot::RwLock;

/// Writer side of the snapshot publication slot.
#[derive(Debug)]
pub struct SnapshotCell {
    slot: Arc<RwLock<Arc<EnvironmentSnapshot>>>,
}

impl SnapshotCell {
    /// Create a cell holding `initial`.
    pub fn new(initial: EnvironmentSnapshot) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// Replace the published snapshot as one unit.
    pub fn publish(&self, snapshot: EnvironmentSnapshot) -> Arc<EnvironmentSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.slot.write() = Arc::clone(&snapshot);
        snapshot
    }

    /// The currently published snapshot.
    pub fn load(&self) -> Arc<EnvironmentSnapshot> {
        Arc::clone(&self.slot.read())
    }

    /// A read-only handle for other threads.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new(EnvironmentSnapshot::default())
    }
}

/// Cloneable, thread-safe read handle on the published snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    slot: Arc<RwLock<Arc<EnvironmentSnapshot>>>,
}

impl SnapshotReader {
    /// The currently published snapshot.
    pub fn load(&self) -> Arc<EnvironmentSnapshot> {
        Arc::clone(&self.slot.read())
    }

    /// Publication counter of the current snapshot.
    pub fn sequence(&self) -> u64 {
        self.slot.read().sequence
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::cast_precision_loss,
    clippy::arithmetic_side_effects
)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// A snapshot whose fields all encode the same tick number.
    fn tagged(sequence: u64) -> EnvironmentSnapshot {
        let tag = sequence as f32;
        EnvironmentSnapshot {
            sequence,
            hour: tag,
            sun_intensity: tag,
            fog_density: tag,
            star_visibility: tag,
            ..EnvironmentSnapshot::default()
        }
    }

    #[test]
    fn publish_replaces_whole_snapshot() {
        let cell = SnapshotCell::default();
        let reader = cell.reader();
        assert_eq!(reader.sequence(), 0);

        let published = cell.publish(tagged(3));
        assert_eq!(published.sequence, 3);
        assert_eq!(*reader.load(), tagged(3));
        assert!(Arc::ptr_eq(&cell.load(), &reader.load()));
    }

    #[test]
    fn old_snapshots_stay_valid_after_publish() {
        let cell = SnapshotCell::default();
        cell.publish(tagged(1));
        let held = cell.load();
        cell.publish(tagged(2));
        assert_eq!(held.sequence, 1);
        assert_eq!(held.fog_density, 1.0);
    }

    #[test]
    fn concurrent_readers_never_see_torn_snapshots() {
        let cell = SnapshotCell::new(tagged(0));
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            let mut handles = Vec::new();
            for _ in 0..4 {
                let reader = cell.reader();
                let done = &done;
                handles.push(scope.spawn(move || {
                    let mut last = 0;
                    let mut reads = 0_u64;
                    loop {
                        let finished = done.load(Ordering::Acquire);
                        let snapshot = reader.load();
                        let tag = snapshot.sequence as f32;
                        assert_eq!(snapshot.sun_intensity, tag);
                        assert_eq!(snapshot.fog_density, tag);
                        assert_eq!(snapshot.star_visibility, tag);
                        assert!(snapshot.sequence >= last, "sequence went backwards");
                        last = snapshot.sequence;
                        reads += 1;
                        if finished {
                            break;
                        }
                    }
                    reads
                }));
            }

            for sequence in 1..=5_000 {
                cell.publish(tagged(sequence));
            }
            done.store(true, Ordering::Release);

            for handle in handles {
                assert!(handle.join().unwrap() > 0);
            }
        });

        assert_eq!(cell.load().sequence, 5_000);
    }
}
