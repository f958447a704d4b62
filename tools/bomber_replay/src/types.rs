use crate::errors::{Location, ReplayError};
use serde::{Deserialize, Serialize};

/// Board coordinate, serialized as `[row, col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "[usize; 2]")]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl TryFrom<Vec<i64>> for Position {
    type Error = String;

    fn try_from(value: Vec<i64>) -> Result<Self, Self::Error> {
        let [row, col] = value.as_slice() else {
            return Err(format!(
                "coordinate must have exactly 2 components, found {}",
                value.len()
            ));
        };
        let row = usize::try_from(*row).map_err(|_| format!("negative row {row}"))?;
        let col = usize::try_from(*col).map_err(|_| format!("negative column {col}"))?;
        Ok(Self { row, col })
    }
}

impl From<Position> for [usize; 2] {
    fn from(value: Position) -> Self {
        [value.row, value.col]
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Index of an agent within a scene; equal to the recorded `agent_id`.
pub type AgentId = usize;

/// Per-agent action codes of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Action {
    Stop = 0,
    Up = 1,
    Down = 2,
    Left = 3,
    Right = 4,
    Bomb = 5,
}

impl Action {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Bomb => "bomb",
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Stop),
            1 => Ok(Self::Up),
            2 => Ok(Self::Down),
            3 => Ok(Self::Left),
            4 => Ok(Self::Right),
            5 => Ok(Self::Bomb),
            other => Err(format!("unknown action code {other}")),
        }
    }
}

impl From<Action> for u8 {
    fn from(value: Action) -> Self {
        value.code()
    }
}

/// Movement direction of a kicked bomb; the directional subset of [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn as_action(self) -> Action {
        match self {
            Self::Up => Action::Up,
            Self::Down => Action::Down,
            Self::Left => Action::Left,
            Self::Right => Action::Right,
        }
    }
}

impl TryFrom<Action> for Direction {
    type Error = String;

    fn try_from(value: Action) -> Result<Self, Self::Error> {
        match value {
            Action::Up => Ok(Self::Up),
            Action::Down => Ok(Self::Down),
            Action::Left => Ok(Self::Left),
            Action::Right => Ok(Self::Right),
            other => Err(format!(
                "action `{}` (code {}) is not a direction",
                other.as_str(),
                other.code()
            )),
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Direction::try_from(Action::try_from(value)?)
    }
}

impl From<Direction> for u8 {
    fn from(value: Direction) -> Self {
        value.as_action().code()
    }
}

/// Actions for one transition, indexed by agent id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionVector(pub Vec<Action>);

impl ActionVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, agent_id: AgentId) -> Option<Action> {
        self.0.get(agent_id).copied()
    }

    pub fn codes(&self) -> Vec<u8> {
        self.0.iter().map(|action| action.code()).collect()
    }

    /// Every entry must address an existing agent and every agent must have
    /// an entry.
    pub fn check_agent_count(&self, agent_count: usize, at: Location) -> Result<(), ReplayError> {
        if self.0.len() > agent_count {
            return Err(ReplayError::reference(
                at,
                format!(
                    "action index {} has no agent with agent_id {} ({agent_count} agents)",
                    agent_count, agent_count
                ),
            ));
        }
        if self.0.len() < agent_count {
            return Err(ReplayError::reference(
                at,
                format!(
                    "agent_id {} has no action ({} actions for {agent_count} agents)",
                    self.0.len(),
                    self.0.len()
                ),
            ));
        }
        Ok(())
    }
}
