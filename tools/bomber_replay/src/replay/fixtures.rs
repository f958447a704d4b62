//! Builders for raw recording files used by unit tests.

use serde_json::{json, Map, Value};

pub const SIZE: usize = 4;

pub fn empty_board() -> Vec<Vec<u8>> {
    vec![vec![0; SIZE]; SIZE]
}

/// Decoded fields of one raw record; `encode_recording` applies the second
/// layer of encoding.
pub struct RecordBuilder {
    fields: Map<String, Value>,
}

impl RecordBuilder {
    /// Two agents in opposite corners of an empty 4x4 board.
    pub fn new(step_count: i64) -> Self {
        let mut fields = Map::new();
        fields.insert("step_count".to_string(), json!(step_count));
        fields.insert("board".to_string(), json!(empty_board()));
        fields.insert(
            "agents".to_string(),
            json!([agent(0, [0, 0]), agent(1, [3, 3])]),
        );
        fields.insert("bombs".to_string(), json!([]));
        fields.insert("items".to_string(), json!([]));
        fields.insert("flames".to_string(), json!([]));
        Self { fields }
    }

    pub fn board(self, board: Vec<Vec<u8>>) -> Self {
        self.raw_field("board", json!(board))
    }

    pub fn agents(self, agents: Value) -> Self {
        self.raw_field("agents", agents)
    }

    pub fn bombs(self, bombs: Value) -> Self {
        self.raw_field("bombs", bombs)
    }

    pub fn intended_actions(self, codes: &[u8]) -> Self {
        self.raw_field("intended_actions", json!(codes))
    }

    pub fn raw_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn build(self) -> Map<String, Value> {
        self.fields
    }
}

pub fn agent(agent_id: usize, position: [usize; 2]) -> Value {
    json!({
        "agent_id": agent_id,
        "position": position,
        "ammo": 1,
        "is_alive": true,
        "blast_strength": 2,
        "can_kick": false,
    })
}

pub fn encode_recording(records: &[Map<String, Value>]) -> String {
    let state = records
        .iter()
        .map(|record| {
            record
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.to_string())))
                .collect::<Map<String, Value>>()
        })
        .collect::<Vec<_>>();
    json!({ "state": state }).to_string()
}

/// A board differing from the empty one only at `(row, col)`.
pub fn board_with(row: usize, col: usize, code: u8) -> Vec<Vec<u8>> {
    let mut board = empty_board();
    board[row][col] = code;
    board
}
