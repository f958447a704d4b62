//! Exact comparison of a simulated scene against the recorded one.

use crate::replay::scene::{Board, Scene};
use crate::types::Position;
use serde::{Deserialize, Serialize};

/// What has to match for a step to count as reproduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// Cell-wise board equality.
    #[default]
    Board,
    /// Board plus agents, bombs, items and flames.
    Scene,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Scene => "scene",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellMismatch {
    pub position: Position,
    pub expected: u8,
    pub actual: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    BoardShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    BoardCells {
        cells: Vec<CellMismatch>,
    },
    Agents,
    Bombs,
    Items,
    Flames,
}

/// First step whose simulated outcome differs from the recording.
///
/// `step_index` is the index of the transition (`index` → `index + 1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub step_index: usize,
    pub from_step_count: i64,
    pub to_step_count: i64,
    pub mismatches: Vec<Mismatch>,
    pub expected_board: Vec<Vec<u8>>,
    pub actual_board: Vec<Vec<u8>>,
}

/// Returns every difference between `actual` and `expected`; empty on match.
pub fn compare(comparison: Comparison, actual: &Scene, expected: &Scene) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    if let Some(mismatch) = compare_boards(&actual.board, &expected.board) {
        mismatches.push(mismatch);
    }
    if comparison == Comparison::Scene {
        if actual.agents != expected.agents {
            mismatches.push(Mismatch::Agents);
        }
        if !same_entities(&actual.bombs, &expected.bombs) {
            mismatches.push(Mismatch::Bombs);
        }
        if actual.items != expected.items {
            mismatches.push(Mismatch::Items);
        }
        if !same_entities(&actual.flames, &expected.flames) {
            mismatches.push(Mismatch::Flames);
        }
    }
    mismatches
}

/// Bombs and flames carry no identity of their own, so listing order is
/// not part of the state.
fn same_entities<T: Ord>(actual: &[T], expected: &[T]) -> bool {
    if actual.len() != expected.len() {
        return false;
    }
    let mut actual: Vec<&T> = actual.iter().collect();
    let mut expected: Vec<&T> = expected.iter().collect();
    actual.sort();
    expected.sort();
    actual == expected
}

pub fn compare_boards(actual: &Board, expected: &Board) -> Option<Mismatch> {
    if actual.shape() != expected.shape() {
        return Some(Mismatch::BoardShape {
            expected: expected.shape(),
            actual: actual.shape(),
        });
    }
    let cells: Vec<CellMismatch> = expected
        .rows()
        .zip(actual.rows())
        .enumerate()
        .flat_map(|(row, (expected_row, actual_row))| {
            expected_row
                .iter()
                .zip(actual_row)
                .enumerate()
                .filter(|(_, (expected, actual))| expected != actual)
                .map(move |(col, (expected, actual))| CellMismatch {
                    position: Position::new(row, col),
                    expected: *expected,
                    actual: *actual,
                })
        })
        .collect();
    (!cells.is_empty()).then_some(Mismatch::BoardCells { cells })
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BoardShape { expected, actual } => write!(
                f,
                "board shape {}x{} (recorded {}x{})",
                actual.0, actual.1, expected.0, expected.1
            ),
            Self::BoardCells { cells } => {
                write!(f, "{} board cell(s) differ", cells.len())?;
                for cell in cells.iter().take(8) {
                    write!(
                        f,
                        "; {} simulated {} recorded {}",
                        cell.position, cell.actual, cell.expected
                    )?;
                }
                if cells.len() > 8 {
                    write!(f, "; +{} more", cells.len() - 8)?;
                }
                Ok(())
            }
            Self::Agents => f.write_str("agents differ"),
            Self::Bombs => f.write_str("bombs differ"),
            Self::Items => f.write_str("items differ"),
            Self::Flames => f.write_str("flames differ"),
        }
    }
}
