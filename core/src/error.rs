use thiserror::Error;

#[derive(Error, Debug)]
pub enum BagError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Structural mismatch in {source_name}: {dimension} expected {expected}, got {actual}")]
    Structure {
        source_name: String,
        dimension: String,
        expected: String,
        actual: String,
    },

    #[error("Duplicate {axis} key in {source_name}: {key}")]
    DuplicateKey {
        source_name: String,
        axis: &'static str,
        key: String,
    },

    #[error("Level '{level}' is not part of schema '{schema}'")]
    UnknownLevel { level: String, schema: String },

    #[error("Group not found: region={region}, service_type={service_type}, type={type_}")]
    MissingGroup {
        region: String,
        service_type: String,
        type_: String,
    },

    #[error("Invalid schema '{schema}': {reason}")]
    InvalidSchema { schema: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BagError {
    pub fn structure(
        source_name: impl Into<String>,
        dimension: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::Structure {
            source_name: source_name.into(),
            dimension: dimension.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

pub type BagResult<T> = Result<T, BagError>;
