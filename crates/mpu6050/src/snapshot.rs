//! Lock-free publication of the latest fusion state.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::fusion::FusionState;

/// Single-slot, last-write-wins cell holding the current [`FusionState`].
#[derive(Debug)]
pub(crate) struct SnapshotCell {
    current: ArcSwap<FusionState>,
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self {
            current: ArcSwap::from_pointee(FusionState::default()),
        }
    }
}

impl SnapshotCell {
    /// Replaces the published state with a single atomic swap and returns
    /// the published handle.
    pub(crate) fn publish(&self, state: FusionState) -> Arc<FusionState> {
        let state = Arc::new(state);
        self.current.store(Arc::clone(&state));
        state
    }

    /// Returns the latest published state. Never blocks.
    pub(crate) fn load(&self) -> Arc<FusionState> {
        self.current.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_all_zero() {
        let cell = SnapshotCell::default();
        assert_eq!(*cell.load(), FusionState::default());
    }

    #[test]
    fn readers_keep_their_handle_after_publish() {
        let cell = SnapshotCell::default();
        let before = cell.load();

        let published = cell.publish(FusionState {
            tick: 7,
            ..FusionState::default()
        });

        assert_eq!(before.tick, 0);
        assert_eq!(published.tick, 7);
        assert!(Arc::ptr_eq(&published, &cell.load()));
    }
}
