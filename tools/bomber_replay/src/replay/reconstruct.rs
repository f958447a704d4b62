//! Rebuilds a live [`Scene`] from a [`Snapshot`].
//!
//! Reconstruction is pure: every entity is built from the values stored in
//! the snapshot, never from a default configuration that is later patched.

use crate::errors::{Location, ReplayError};
use crate::replay::recording::{AgentRecord, BombRecord, FlameRecord, ItemRecord, Snapshot};
use crate::replay::scene::{Agent, AgentState, Board, Bomb, Flame, Scene};
use crate::types::Position;
use std::collections::BTreeMap;

pub fn reconstruct(snapshot: &Snapshot) -> Result<Scene, ReplayError> {
    let at = Location::step(snapshot.step_count);
    let board = Board::from_rows(&snapshot.board, at)?;
    let agents = build_agents(&snapshot.agents, at)?;
    let bombs = build_bombs(&snapshot.bombs, &agents, at)?;
    let items = build_items(&snapshot.items, at)?;
    let flames = build_flames(&snapshot.flames);
    Ok(Scene {
        board,
        agents,
        bombs,
        items,
        flames,
    })
}

/// Agents sorted by `agent_id`, which must run exactly `0..n` so that both
/// action vectors and `bomber_id`s can index the list directly.
fn build_agents(records: &[AgentRecord], at: Location) -> Result<Vec<Agent>, ReplayError> {
    let mut sorted: Vec<&AgentRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.agent_id);

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            if record.agent_id != index {
                return Err(ReplayError::schema(
                    at,
                    "agents",
                    format!(
                        "agent ids must be 0..{} without gaps or repeats, found agent_id {} at index {index}",
                        records.len(),
                        record.agent_id
                    ),
                ));
            }
            Ok(Agent::new(
                record.agent_id,
                record.position,
                AgentState {
                    ammo: record.ammo,
                    is_alive: record.is_alive,
                    blast_strength: record.blast_strength,
                    can_kick: record.can_kick,
                },
            ))
        })
        .collect()
}

fn build_bombs(
    records: &[BombRecord],
    agents: &[Agent],
    at: Location,
) -> Result<Vec<Bomb>, ReplayError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let owner = agents.get(record.bomber_id).ok_or_else(|| {
                ReplayError::reference(
                    at,
                    format!(
                        "bomb {index} at {} has bomber_id {} but only {} agents exist",
                        record.position,
                        record.bomber_id,
                        agents.len()
                    ),
                )
            })?;
            Ok(Bomb::new(
                owner,
                record.position,
                record.life,
                record.blast_strength,
                record.moving_direction,
            ))
        })
        .collect()
}

fn build_items(
    records: &[ItemRecord],
    at: Location,
) -> Result<BTreeMap<Position, u8>, ReplayError> {
    let mut items = BTreeMap::new();
    for ItemRecord(position, code) in records {
        if let Some(previous) = items.insert(*position, *code) {
            return Err(ReplayError::schema(
                at,
                "items",
                format!("position {position} holds two items ({previous} and {code})"),
            ));
        }
    }
    Ok(items)
}

fn build_flames(records: &[FlameRecord]) -> Vec<Flame> {
    records
        .iter()
        .map(|record| Flame::new(record.position, record.life))
        .collect()
}
