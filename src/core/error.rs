//! Error types for synthsim.

use thiserror::Error;

/// Result type alias for synthsim operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Error types for the simulator and its input/output layers.
#[derive(Error, Debug)]
pub enum SimError {
    /// Price or rate input that cannot be simulated.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Parameter combination that is well-formed but not allowed.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A feed backend returned no data for the request.
    #[error("No data available for {ticker}")]
    DataUnavailable { ticker: String },

    /// Text that could not be parsed (dates, config files).
    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl SimError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a length mismatch error between two columns.
    pub fn length_mismatch(column: &str, expected: usize, actual: usize) -> Self {
        Self::invalid_input(format!(
            "column '{column}' has {actual} values, expected {expected}"
        ))
    }

    /// Create a missing column error.
    pub fn missing_column(column: &str) -> Self {
        Self::invalid_input(format!("prices must include column '{column}'"))
    }

    /// Create a data unavailable error.
    pub fn data_unavailable(ticker: impl Into<String>) -> Self {
        Self::DataUnavailable {
            ticker: ticker.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Whether this error was raised by input validation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Whether this error was raised by parameter validation.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

#[cfg(feature = "python")]
impl From<SimError> for pyo3::PyErr {
    fn from(err: SimError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
