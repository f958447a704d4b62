//! The step loop: advance the carried scene with each recorded action vector
//! and stop at the first step the forward model fails to reproduce.

use crate::errors::{Location, ReplayError};
use crate::observer::Observer;
use crate::replay::reconstruct::reconstruct;
use crate::replay::recording::Recording;
use crate::replay::scene::Scene;
use crate::replay::simulator::{advance, ForwardModel};
use crate::replay::verify::{compare, Comparison, Divergence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    pub verify: bool,
    pub comparison: Comparison,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            verify: true,
            comparison: Comparison::Board,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// Every transition reproduced the recording.
    Verified,
    /// Verification was off; every transition ran without a verdict.
    Unverified,
    Diverged(Divergence),
}

impl ReplayOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Unverified => "unverified",
            Self::Diverged(_) => "diverged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// Transitions the forward model actually ran.
    pub transitions: usize,
    pub outcome: ReplayOutcome,
    /// The carried scene when the loop stopped.
    pub final_scene: Scene,
}

/// Reconstructs every snapshot and checks every action vector against the
/// agents it drives, so structural errors surface before the first step.
pub fn preflight(recording: &Recording) -> Result<Vec<Scene>, ReplayError> {
    let snapshots = recording.snapshots();
    let mut scenes = Vec::with_capacity(snapshots.len());
    for (index, snapshot) in snapshots.iter().enumerate() {
        let scene = reconstruct(snapshot)?;
        let at = Location::step(snapshot.step_count);
        match (&snapshot.action, index + 1 < snapshots.len()) {
            (Some(actions), true) => actions.check_agent_count(scene.agents.len(), at)?,
            (None, true) => {
                return Err(ReplayError::schema(
                    at,
                    "intended_actions",
                    "no action vector leads to the next snapshot",
                ))
            }
            (_, false) => {}
        }
        scenes.push(scene);
    }
    Ok(scenes)
}

pub fn replay(
    recording: &Recording,
    model: &mut dyn ForwardModel,
    observer: &mut dyn Observer,
    options: ReplayOptions,
) -> Result<ReplayReport, ReplayError> {
    let recorded = preflight(recording)?;
    let Some(mut scene) = recorded.first().cloned() else {
        return Err(ReplayError::schema(
            Location::default(),
            "state",
            "recording has no snapshots",
        ));
    };
    let snapshots = recording.snapshots();

    let mut transitions = 0;
    for (index, pair) in snapshots.windows(2).enumerate() {
        let (from, to) = (&pair[0], &pair[1]);
        let at = Location::step(from.step_count);
        let actions = from.action.as_ref().ok_or_else(|| {
            ReplayError::schema(at, "intended_actions", "missing action vector")
        })?;

        observer.on_step_start(index, actions, &scene.board)?;
        let candidate = advance(model, actions, &scene, at, to.step_count)?;
        transitions += 1;
        observer.show_bombs(&candidate.bombs)?;
        observer.show(index, &candidate.board, &candidate.agents)?;

        if options.verify {
            let expected = &recorded[index + 1];
            let mismatches = compare(options.comparison, &candidate, expected);
            if !mismatches.is_empty() {
                let divergence = Divergence {
                    step_index: index,
                    from_step_count: from.step_count,
                    to_step_count: to.step_count,
                    mismatches,
                    expected_board: expected.board.to_rows(),
                    actual_board: candidate.board.to_rows(),
                };
                return Ok(ReplayReport {
                    transitions,
                    outcome: ReplayOutcome::Diverged(divergence),
                    final_scene: candidate,
                });
            }
        }
        scene = candidate;
    }

    observer.on_finish(snapshots.len() - 1, &scene.board)?;
    Ok(ReplayReport {
        transitions,
        outcome: if options.verify {
            ReplayOutcome::Verified
        } else {
            ReplayOutcome::Unverified
        },
        final_scene: scene,
    })
}
