use thiserror::Error;

/// Where in a recording a structural error was found.
///
/// `record` is the position of the record in the file as written (before
/// sorting); `step` is the decoded `step_count` once known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub record: Option<usize>,
    pub step: Option<i64>,
}

impl Location {
    pub fn record(index: usize) -> Self {
        Self {
            record: Some(index),
            step: None,
        }
    }

    pub fn step(step: i64) -> Self {
        Self {
            record: None,
            step: Some(step),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.record, self.step) {
            (Some(record), Some(step)) => write!(f, "record {record} (step {step})"),
            (Some(record), None) => write!(f, "record {record}"),
            (None, Some(step)) => write!(f, "step {step}"),
            (None, None) => write!(f, "recording"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("decode error at {at}, field `{field}`: {message}")]
    Decode {
        at: Location,
        field: String,
        message: String,
    },
    #[error("schema error at {at}, field `{field}`: {message}")]
    Schema {
        at: Location,
        field: String,
        message: String,
    },
    #[error("reference error at {at}: {message}")]
    Reference { at: Location, message: String },
    #[error("simulator error: {0}")]
    Simulator(String),
}

impl ReplayError {
    pub fn decode(at: Location, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            at,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn schema(at: Location, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            at,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn reference(at: Location, message: impl Into<String>) -> Self {
        Self::Reference {
            at,
            message: message.into(),
        }
    }

    /// Structural errors invalidate the recording itself, as opposed to the
    /// environment (io, config, simulator process).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Schema { .. } | Self::Reference { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Location, ReplayError};

    #[test]
    fn messages_name_the_offending_location() {
        let err = ReplayError::reference(Location::step(7), "bomb 0 has bomber_id 9 but only 4 agents");
        assert_eq!(
            err.to_string(),
            "reference error at step 7: bomb 0 has bomber_id 9 but only 4 agents"
        );

        let err = ReplayError::decode(Location::record(3), "board", "expected value");
        assert_eq!(
            err.to_string(),
            "decode error at record 3, field `board`: expected value"
        );
        assert!(err.is_structural());
        assert!(!ReplayError::Io("x".to_string()).is_structural());
    }
}
