//! Live game entities rebuilt from a snapshot or produced by a forward step.

use crate::errors::{Location, ReplayError};
use crate::replay::recording::{AgentRecord, BombRecord, FlameRecord, ItemRecord};
use crate::types::{AgentId, Direction, Position};
use std::collections::BTreeMap;

/// Fixed-size grid of cell codes, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl Board {
    pub fn from_rows(grid: &[Vec<u8>], at: Location) -> Result<Self, ReplayError> {
        let cols = grid.first().map_or(0, Vec::len);
        if let Some((row, values)) = grid
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != cols)
        {
            return Err(ReplayError::schema(
                at,
                "board",
                format!("row {row} has {} cells, expected {cols}", values.len()),
            ));
        }
        Ok(Self {
            rows: grid.len(),
            cols,
            cells: grid.iter().flatten().copied().collect(),
        })
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn contains(&self, position: Position) -> bool {
        position.row < self.rows && position.col < self.cols
    }

    pub fn get(&self, position: Position) -> Option<u8> {
        self.contains(position)
            .then(|| self.cells[position.row * self.cols + position.col])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.rows).map(move |row| &self.cells[row * self.cols..(row + 1) * self.cols])
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.rows().map(<[u8]>::to_vec).collect()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line = row
                .iter()
                .map(|code| format!("{code:>2}"))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "[{line}]")?;
        }
        Ok(())
    }
}

/// Runtime state an agent carries besides its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentState {
    pub ammo: u32,
    pub is_alive: bool,
    pub blast_strength: u32,
    pub can_kick: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: AgentId,
    pub position: Position,
    pub state: AgentState,
}

impl Agent {
    pub fn new(id: AgentId, position: Position, state: AgentState) -> Self {
        Self {
            id,
            position,
            state,
        }
    }

    pub fn to_record(&self) -> AgentRecord {
        AgentRecord {
            agent_id: self.id,
            position: self.position,
            ammo: self.state.ammo,
            is_alive: self.state.is_alive,
            blast_strength: self.state.blast_strength,
            can_kick: self.state.can_kick,
        }
    }
}

/// A placed bomb. `owner` indexes the scene's agent list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bomb {
    pub owner: AgentId,
    pub position: Position,
    pub life: u32,
    pub blast_strength: u32,
    pub moving_direction: Option<Direction>,
}

impl Bomb {
    /// Taking the owning agent by reference means a bomb can only be built
    /// once its owner has been resolved.
    pub fn new(
        owner: &Agent,
        position: Position,
        life: u32,
        blast_strength: u32,
        moving_direction: Option<Direction>,
    ) -> Self {
        Self {
            owner: owner.id,
            position,
            life,
            blast_strength,
            moving_direction,
        }
    }

    pub fn to_record(&self) -> BombRecord {
        BombRecord {
            bomber_id: self.owner,
            position: self.position,
            life: self.life,
            blast_strength: self.blast_strength,
            moving_direction: self.moving_direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Flame {
    pub position: Position,
    pub life: u32,
}

impl Flame {
    pub fn new(position: Position, life: u32) -> Self {
        Self { position, life }
    }

    pub fn to_record(&self) -> FlameRecord {
        FlameRecord {
            position: self.position,
            life: self.life,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub board: Board,
    pub agents: Vec<Agent>,
    pub bombs: Vec<Bomb>,
    pub items: BTreeMap<Position, u8>,
    pub flames: Vec<Flame>,
}

impl Scene {
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn item_records(&self) -> Vec<ItemRecord> {
        self.items
            .iter()
            .map(|(position, code)| ItemRecord(*position, *code))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Board;
    use crate::errors::{Location, ReplayError};
    use crate::types::Position;

    #[test]
    fn board_keeps_cells_exactly_as_stored() {
        let grid = vec![vec![0, 1, 2], vec![3, 4, 13]];
        let board = Board::from_rows(&grid, Location::step(0)).expect("board");
        assert_eq!(board.shape(), (2, 3));
        assert_eq!(board.get(Position::new(1, 2)), Some(13));
        assert_eq!(board.get(Position::new(2, 0)), None);
        assert_eq!(board.to_rows(), grid);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let grid = vec![vec![0, 1, 2], vec![3, 4]];
        let err = Board::from_rows(&grid, Location::step(4)).expect_err("ragged");
        assert!(matches!(err, ReplayError::Schema { ref field, .. } if field == "board"));
        assert!(err.to_string().contains("row 1 has 2 cells, expected 3"));
    }

    #[test]
    fn empty_board_has_no_rows() {
        let board = Board::from_rows(&[], Location::default()).expect("empty");
        assert_eq!(board.shape(), (0, 0));
        assert_eq!(board.rows().count(), 0);
        assert_eq!(board.to_string(), "");
    }
}
