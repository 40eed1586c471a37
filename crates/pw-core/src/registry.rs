//! One conflict detector per calendar session.

use std::collections::HashMap;

use crate::conflict::{ConflictDetector, OverlapMode};
use crate::types::SessionId;

/// Keeps stability snapshots apart when one process serves many sessions.
#[derive(Debug, Default)]
pub struct DetectorRegistry {
    mode: OverlapMode,
    detectors: HashMap<SessionId, ConflictDetector>,
}

impl DetectorRegistry {
    /// Creates an empty registry whose detectors use `mode`.
    pub fn new(mode: OverlapMode) -> Self {
        Self {
            mode,
            detectors: HashMap::new(),
        }
    }

    /// Returns the session's detector, creating a cold one on first use.
    pub fn session(&mut self, id: &SessionId) -> &mut ConflictDetector {
        let mode = self.mode;
        self.detectors.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(session = %id, "creating conflict detector");
            ConflictDetector::with_mode(mode)
        })
    }

    /// Drops a session's state, returning its detector if there was one.
    pub fn remove(&mut self, id: &SessionId) -> Option<ConflictDetector> {
        self.detectors.remove(id)
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}
