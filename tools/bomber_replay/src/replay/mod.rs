//! Replay and verification of recorded bomber games.
//!
//! # Overview
//!
//! A recording file is a JSON object whose `state` array holds one record per
//! observed tick, every field value itself JSON-encoded. A run goes through:
//! 1. **normalize** – decode, sort by `step_count`, shift each record's
//!    `intended_actions` onto the record before it
//! 2. **reconstruct** – build a [`scene::Scene`] from one snapshot
//! 3. **simulator** – advance the carried scene one tick through a
//!    [`simulator::ForwardModel`]
//! 4. **verify** – compare the candidate with the next recorded scene
//!
//! [`replayer::replay`] drives the loop and stops at the first divergence.

pub mod normalize;
pub mod reconstruct;
pub mod recording;
pub mod replayer;
pub mod report;
pub mod scene;
pub mod simulator;
pub mod verify;

#[cfg(test)]
pub(crate) mod fixtures;
