use thiserror::Error;

/// Failures raised at the storage boundary. Callers degrade both kinds to a
/// user-visible warning; neither is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Backend unreachable, credentials rejected, or the read itself failed.
    #[error("backend connection failed: {0}")]
    Connection(String),

    /// The backend refused the appended row.
    #[error("failed to write booking: {0}")]
    Write(String),
}

impl StoreError {
    pub fn connection(err: impl std::fmt::Display) -> Self {
        Self::Connection(err.to_string())
    }

    pub fn write(err: impl std::fmt::Display) -> Self {
        Self::Write(err.to_string())
    }
}

/// Rejections produced by the booking form before anything reaches a backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} must not be zero")]
    ZeroValue { field: &'static str },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("unknown booking channel '{0}' (expected Online, Direct, Travel Agent or Corporate)")]
    UnknownChannel(String),

    #[error("invalid booking date '{0}'")]
    InvalidDate(String),
}

/// A stored row that could not be turned into a `Booking`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("column '{column}' holds an invalid value '{value}'")]
    InvalidValue { column: &'static str, value: String },
}
