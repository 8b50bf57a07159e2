use thiserror::Error;

use crate::domain::Role;

/// Recoverable failures of the analysis core.
///
/// Callers decide per widget whether to skip, retry with other roles, or report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrendError {
    #[error("no column matches role `{role}` (available: {})", .available_columns.join(", "))]
    ColumnResolution {
        role: Role,
        available_columns: Vec<String>,
    },

    #[error("insufficient data: {n_observations} observation(s), at least {required} required")]
    InsufficientData { n_observations: usize, required: usize },

    #[error("row {row}: cannot parse {column} value '{value}'")]
    Unparseable {
        row: usize,
        column: String,
        value: String,
    },

    #[error("invalid year range {from}..{to}")]
    InvalidRange { from: i32, to: i32 },

    #[error("least squares solve failed: {0}")]
    Numeric(String),
}

impl TrendError {
    /// Exit code used when the error reaches the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            TrendError::ColumnResolution { .. }
            | TrendError::Unparseable { .. }
            | TrendError::InvalidRange { .. } => 2,
            TrendError::InsufficientData { .. } => 3,
            TrendError::Numeric(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<TrendError> for AppError {
    fn from(err: TrendError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_resolution_message_lists_columns() {
        let err = TrendError::ColumnResolution {
            role: Role::Value,
            available_columns: vec!["Year".to_string(), "Country".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no column matches role `value` (available: Year, Country)"
        );
        assert_eq!(AppError::from(err).exit_code(), 2);
    }

    #[test]
    fn insufficient_data_maps_to_exit_code_3() {
        let err = TrendError::InsufficientData {
            n_observations: 1,
            required: 2,
        };
        assert_eq!(AppError::from(err).exit_code(), 3);
    }
}
