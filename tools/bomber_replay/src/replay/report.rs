use crate::replay::replayer::{ReplayOutcome, ReplayReport};
use crate::replay::verify::{Comparison, Divergence};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex SHA-256 of the recording file as read.
pub fn recording_digest(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Machine-readable summary of one run, written by `--report-json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub recording: String,
    pub recording_sha256: String,
    pub snapshots: usize,
    pub transitions: usize,
    pub verify: bool,
    pub comparison: Comparison,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divergence: Option<DivergenceReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivergenceReport {
    pub expected_shape: (usize, usize),
    pub actual_shape: (usize, usize),
    pub summary: Vec<String>,
    #[serde(flatten)]
    pub detail: Divergence,
}

fn shape(grid: &[Vec<u8>]) -> (usize, usize) {
    (grid.len(), grid.first().map_or(0, Vec::len))
}

impl DivergenceReport {
    pub fn new(divergence: &Divergence) -> Self {
        Self {
            expected_shape: shape(&divergence.expected_board),
            actual_shape: shape(&divergence.actual_board),
            summary: divergence.mismatches.iter().map(ToString::to_string).collect(),
            detail: divergence.clone(),
        }
    }
}

impl RunReport {
    pub fn new(
        recording: impl Into<String>,
        raw: &str,
        snapshots: usize,
        verify: bool,
        comparison: Comparison,
        report: &ReplayReport,
    ) -> Self {
        let divergence = match &report.outcome {
            ReplayOutcome::Diverged(divergence) => Some(DivergenceReport::new(divergence)),
            ReplayOutcome::Verified | ReplayOutcome::Unverified => None,
        };
        Self {
            recording: recording.into(),
            recording_sha256: recording_digest(raw),
            snapshots,
            transitions: report.transitions,
            verify,
            comparison,
            outcome: report.outcome.as_str(),
            divergence,
        }
    }
}
