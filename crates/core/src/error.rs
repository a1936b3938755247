use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{entity} already exists with {field} = {value}")]
    Conflict {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("patient does not exist: {0}")]
    UnknownPatient(uuid::Uuid),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
    #[error(
        "{step} failed and compensation also failed: write={write_error}; cleanup={}",
        cleanup_errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    CompensationFailed {
        step: String,
        #[source]
        write_error: Box<CoreError>,
        cleanup_errors: Vec<StoreError>,
    },
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
