use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("Hospital API request failed: {0}")]
    Request(String),

    #[error("Failed to decode hospital API payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{operation} failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Availability cache has been disposed")]
    Disposed,
}

impl AvailabilityError {
    /// Number of fetch attempts behind this error.
    pub fn attempts(&self) -> u32 {
        match self {
            AvailabilityError::RetriesExhausted { attempts, .. } => *attempts,
            AvailabilityError::Disposed => 0,
            _ => 1,
        }
    }
}

impl From<anyhow::Error> for AvailabilityError {
    fn from(error: anyhow::Error) -> Self {
        AvailabilityError::Request(format!("{:#}", error))
    }
}

impl From<AvailabilityError> for AppError {
    fn from(error: AvailabilityError) -> Self {
        match error {
            AvailabilityError::Disposed => AppError::Unavailable(error.to_string()),
            _ => AppError::ExternalService(error.to_string()),
        }
    }
}
