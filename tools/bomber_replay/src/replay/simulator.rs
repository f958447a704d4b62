//! Boundary to the external forward model.
//!
//! The game rules live outside this crate. A [`ForwardModel`] advances a
//! scene by exactly one tick; [`advance`] is the single call site the replay
//! loop uses, and it enforces the action-vector contract first.

use crate::errors::{Location, ReplayError};
use crate::replay::reconstruct::reconstruct;
use crate::replay::recording::{AgentRecord, BombRecord, FlameRecord, ItemRecord, Snapshot};
use crate::replay::scene::Scene;
use crate::runtime::{ProcessRequest, ProcessRunner};
use crate::types::ActionVector;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub trait ForwardModel {
    /// `actions[k]` is the action of the agent with id `k`. `next_step` is
    /// the recorded `step_count` the returned scene stands for.
    fn step(
        &mut self,
        actions: &ActionVector,
        scene: &Scene,
        next_step: i64,
    ) -> Result<Scene, ReplayError>;
}

/// One tick of the external model, preceded by the action-count check.
pub fn advance(
    model: &mut dyn ForwardModel,
    actions: &ActionVector,
    scene: &Scene,
    at: Location,
    next_step: i64,
) -> Result<Scene, ReplayError> {
    actions.check_agent_count(scene.agents.len(), at)?;
    model.step(actions, scene, next_step)
}

/// Request written to an external simulator process: the recording's record
/// shape, with plain (single-encoded) values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRequest {
    pub actions: Vec<u8>,
    pub board: Vec<Vec<u8>>,
    pub agents: Vec<AgentRecord>,
    pub bombs: Vec<BombRecord>,
    pub items: Vec<ItemRecord>,
    pub flames: Vec<FlameRecord>,
}

impl StepRequest {
    pub fn new(actions: &ActionVector, scene: &Scene) -> Self {
        Self {
            actions: actions.codes(),
            board: scene.board.to_rows(),
            agents: scene.agents.iter().map(|agent| agent.to_record()).collect(),
            bombs: scene.bombs.iter().map(|bomb| bomb.to_record()).collect(),
            items: scene.item_records(),
            flames: scene.flames.iter().map(|flame| flame.to_record()).collect(),
        }
    }
}

/// The next scene as printed by an external simulator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepResponse {
    pub board: Vec<Vec<u8>>,
    pub agents: Vec<AgentRecord>,
    pub bombs: Vec<BombRecord>,
    pub items: Vec<ItemRecord>,
    pub flames: Vec<FlameRecord>,
}

impl StepResponse {
    /// Simulator output goes through the same reconstruction rules as a
    /// recorded snapshot.
    pub fn into_scene(self, step_count: i64) -> Result<Scene, ReplayError> {
        let snapshot = Snapshot {
            step_count,
            board: self.board,
            agents: self.agents,
            bombs: self.bombs,
            items: self.items,
            flames: self.flames,
            action: None,
        };
        reconstruct(&snapshot).map_err(|e| {
            ReplayError::Simulator(format!("simulator returned an invalid scene: {e}"))
        })
    }
}

/// Runs `program args...` once per tick, JSON request on stdin, JSON
/// response on stdout.
pub struct ProcessForwardModel<'a> {
    runner: &'a dyn ProcessRunner,
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl<'a> ProcessForwardModel<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            args,
            cwd: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl ForwardModel for ProcessForwardModel<'_> {
    fn step(
        &mut self,
        actions: &ActionVector,
        scene: &Scene,
        next_step: i64,
    ) -> Result<Scene, ReplayError> {
        let request = serde_json::to_string(&StepRequest::new(actions, scene))
            .map_err(|e| ReplayError::Simulator(e.to_string()))?;
        let output = self.runner.run(ProcessRequest {
            program: self.program.clone(),
            args: self.args.clone(),
            cwd: self.cwd.clone(),
            stdin: Some(request),
        })?;
        if output.exit_code != 0 {
            return Err(ReplayError::Simulator(format!(
                "{} exited with code {}: {}",
                self.program,
                output.exit_code,
                output.stderr.trim()
            )));
        }
        let response: StepResponse = serde_json::from_str(output.stdout.trim()).map_err(|e| {
            ReplayError::Simulator(format!("{} printed an unreadable scene: {e}", self.program))
        })?;
        response.into_scene(next_step)
    }
}
