//! Turns a raw, doubly-encoded recording file into a [`Recording`].
//!
//! The raw file is `{"state": [record, ...]}` where every record maps a key
//! to a *string* holding that field's JSON. Records may appear in any order,
//! and each record's `intended_actions` describes the transition that led
//! *into* it. Normalization decodes every field, orders records by
//! `step_count` and moves each `intended_actions` onto the preceding record
//! as `action`, so that `snapshots[i].action` turns `snapshots[i]` into
//! `snapshots[i + 1]`.

use crate::errors::{Location, ReplayError};
use crate::replay::recording::{
    AgentRecord, BombRecord, FlameRecord, ItemRecord, Recording, Snapshot, RECORD_FIELDS,
};
use crate::types::ActionVector;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Top-level key holding the per-step records.
pub const STATE_FIELD: &str = "state";

/// A record whose field values have been decoded once more.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    /// Position of the record in the file.
    pub record: usize,
    pub step_count: i64,
    pub fields: Map<String, Value>,
}

impl DecodedRecord {
    fn location(&self) -> Location {
        Location {
            record: Some(self.record),
            step: Some(self.step_count),
        }
    }
}

pub fn normalize(raw: &str) -> Result<Recording, ReplayError> {
    let mut records = decode_records(raw)?;
    sort_by_step(&mut records)?;
    let actions = realign_actions(&mut records)?;
    let snapshots = records
        .into_iter()
        .zip(actions)
        .map(|(record, action)| typed_snapshot(record, action))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Recording::from_sorted(snapshots))
}

/// Decode the outer document and every field value of every record.
pub fn decode_records(raw: &str) -> Result<Vec<DecodedRecord>, ReplayError> {
    let document: Value = serde_json::from_str(raw)
        .map_err(|e| ReplayError::decode(Location::default(), "<document>", e.to_string()))?;
    let states = document
        .get(STATE_FIELD)
        .ok_or_else(|| {
            ReplayError::schema(Location::default(), STATE_FIELD, "missing top-level array")
        })?
        .as_array()
        .ok_or_else(|| ReplayError::schema(Location::default(), STATE_FIELD, "expected an array"))?;
    if states.is_empty() {
        return Err(ReplayError::schema(
            Location::default(),
            STATE_FIELD,
            "recording has no records",
        ));
    }

    states
        .iter()
        .enumerate()
        .map(|(index, record)| decode_record(index, record))
        .collect()
}

fn decode_record(index: usize, record: &Value) -> Result<DecodedRecord, ReplayError> {
    let at = Location::record(index);
    let encoded = record
        .as_object()
        .ok_or_else(|| ReplayError::schema(at, "<record>", "expected an object"))?;

    let mut fields = Map::with_capacity(encoded.len());
    for (key, value) in encoded {
        let text = value.as_str().ok_or_else(|| {
            ReplayError::decode(at, key.as_str(), "field value is not an encoded string")
        })?;
        let decoded: Value = serde_json::from_str(text)
            .map_err(|e| ReplayError::decode(at, key.as_str(), e.to_string()))?;
        fields.insert(key.clone(), decoded);
    }

    let step_count = match fields.get("step_count") {
        None => return Err(ReplayError::schema(at, "step_count", "missing required field")),
        Some(value) => value
            .as_i64()
            .ok_or_else(|| ReplayError::schema(at, "step_count", format!("not an integer: {value}")))?,
    };

    Ok(DecodedRecord {
        record: index,
        step_count,
        fields,
    })
}

/// Order records by `step_count`; two records for the same step are an error.
pub fn sort_by_step(records: &mut [DecodedRecord]) -> Result<(), ReplayError> {
    records.sort_by_key(|record| record.step_count);
    if let Some(pair) = records
        .windows(2)
        .find(|pair| pair[0].step_count == pair[1].step_count)
    {
        return Err(ReplayError::schema(
            pair[1].location(),
            "step_count",
            format!(
                "duplicate step_count {} (also on record {})",
                pair[1].step_count, pair[0].record
            ),
        ));
    }
    Ok(())
}

/// Pop `intended_actions` off every record after the first and hand it to the
/// record before it. Returns one entry per record; the last is always `None`.
pub fn realign_actions(
    records: &mut [DecodedRecord],
) -> Result<Vec<Option<ActionVector>>, ReplayError> {
    let mut actions = vec![None; records.len()];
    // The first record has no preceding transition to attach to.
    if let Some(first) = records.first_mut() {
        first.fields.remove("intended_actions");
    }
    for index in 1..records.len() {
        let record = &mut records[index];
        let at = record.location();
        let value = record.fields.remove("intended_actions").ok_or_else(|| {
            ReplayError::schema(at, "intended_actions", "missing required field")
        })?;
        let vector: ActionVector = serde_json::from_value(value)
            .map_err(|e| ReplayError::schema(at, "intended_actions", e.to_string()))?;
        actions[index - 1] = Some(vector);
    }
    Ok(actions)
}

fn typed_snapshot(
    mut record: DecodedRecord,
    action: Option<ActionVector>,
) -> Result<Snapshot, ReplayError> {
    let at = record.location();
    if let Some(unknown) = record
        .fields
        .keys()
        .find(|key| !RECORD_FIELDS.contains(&key.as_str()))
    {
        return Err(ReplayError::schema(at, unknown.as_str(), "unknown field"));
    }

    let board: Vec<Vec<u8>> = take_field(&mut record.fields, "board", at)?;
    if let Some(size) = record.fields.remove("board_size") {
        let size: usize = serde_json::from_value(size)
            .map_err(|e| ReplayError::schema(at, "board_size", e.to_string()))?;
        if board.len() != size || board.iter().any(|row| row.len() != size) {
            return Err(ReplayError::schema(
                at,
                "board_size",
                format!("declared size {size} does not match the board"),
            ));
        }
    }

    Ok(Snapshot {
        step_count: record.step_count,
        board,
        agents: take_field::<Vec<AgentRecord>>(&mut record.fields, "agents", at)?,
        bombs: take_field::<Vec<BombRecord>>(&mut record.fields, "bombs", at)?,
        items: take_field::<Vec<ItemRecord>>(&mut record.fields, "items", at)?,
        flames: take_field::<Vec<FlameRecord>>(&mut record.fields, "flames", at)?,
        action,
    })
}

fn take_field<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    name: &str,
    at: Location,
) -> Result<T, ReplayError> {
    let value = fields
        .remove(name)
        .ok_or_else(|| ReplayError::schema(at, name, "missing required field"))?;
    serde_json::from_value(value).map_err(|e| ReplayError::schema(at, name, e.to_string()))
}
