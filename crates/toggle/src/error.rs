/// Malformed write request. Never mutates state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("missing field `{field}`")]
    MissingField { field: &'static str },

    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field `{field}` is out of range")]
    OutOfRange { field: &'static str },

    #[error("field `{field}` must not be empty")]
    Empty { field: &'static str },
}

impl ValidationError {
    /// Offending field, if the body parsed far enough to have one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidJson(_) | Self::NotAnObject => None,
            Self::MissingField { field }
            | Self::WrongType { field, .. }
            | Self::OutOfRange { field }
            | Self::Empty { field } => Some(field),
        }
    }
}

/// Error types for the toggle controller
#[derive(Debug, thiserror::Error)]
pub enum ToggleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("toggle state failure: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToggleError {
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

pub type Result<T> = std::result::Result<T, ToggleError>;
