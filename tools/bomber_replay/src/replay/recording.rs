//! Typed schema of a normalized game recording.
//!
//! A recording file holds one record per step; the normalizer turns those
//! records into the [`Snapshot`]s defined here.

use crate::types::{ActionVector, Direction, Position};
use serde::{Deserialize, Serialize};

/// Keys a record may carry once its values are decoded.
pub const RECORD_FIELDS: &[&str] = &[
    "step_count",
    "board",
    "board_size",
    "agents",
    "bombs",
    "items",
    "flames",
    "intended_actions",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentRecord {
    pub agent_id: usize,
    pub position: Position,
    pub ammo: u32,
    pub is_alive: bool,
    pub blast_strength: u32,
    pub can_kick: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BombRecord {
    pub bomber_id: usize,
    pub position: Position,
    pub life: u32,
    pub blast_strength: u32,
    pub moving_direction: Option<Direction>,
}

/// `[[row, col], item_code]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord(pub Position, pub u8);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlameRecord {
    pub position: Position,
    pub life: u32,
}

/// One observed game state.
///
/// `action` holds the actions that turn this snapshot into the next one in
/// the recording; the final snapshot has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub step_count: i64,
    pub board: Vec<Vec<u8>>,
    pub agents: Vec<AgentRecord>,
    pub bombs: Vec<BombRecord>,
    pub items: Vec<ItemRecord>,
    pub flames: Vec<FlameRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionVector>,
}

/// Snapshots ordered by strictly increasing `step_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    snapshots: Vec<Snapshot>,
}

impl Recording {
    /// Callers must hand over snapshots already sorted and de-duplicated;
    /// the normalizer is the only producer outside tests.
    pub(crate) fn from_sorted(snapshots: Vec<Snapshot>) -> Self {
        Self { snapshots }
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn first(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// Number of recorded transitions.
    pub fn transition_count(&self) -> usize {
        self.snapshots.len().saturating_sub(1)
    }
}
