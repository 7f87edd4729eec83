//! Error types for qubo-portfolio.

use thiserror::Error;

/// Error type for qubo-portfolio operations.
#[derive(Debug, Error)]
pub enum QuboError {
    /// Malformed or inconsistent problem parameters or configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The binary quadratic solver failed to produce a solution.
    #[error("Solver error ({backend}): {message}")]
    Solver {
        backend: &'static str,
        message: String,
    },

    /// Solver output could not be interpreted as a binary selection.
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Return statistics could not be estimated from the price data.
    #[error("Estimation error: {0}")]
    Estimation(String),

    /// Price data was unavailable for a symbol.
    #[error("Market data error: {0}")]
    MarketData(String),

    /// Failure reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuboError {
    /// Build a solver error tagged with the backend name.
    pub fn solver(backend: &'static str, message: impl Into<String>) -> Self {
        QuboError::Solver {
            backend,
            message: message.into(),
        }
    }

    /// Check if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, QuboError::Configuration(_))
    }

    /// Check if this is a solver error.
    pub fn is_solver(&self) -> bool {
        matches!(self, QuboError::Solver { .. })
    }

    /// Check if this is a decoding error.
    pub fn is_decoding(&self) -> bool {
        matches!(self, QuboError::Decoding(_))
    }
}

/// Result type for qubo-portfolio operations.
pub type Result<T> = std::result::Result<T, QuboError>;
