use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Response body was empty")]
    EmptyBody,
}

impl FetchError {
    /// True when no HTTP response was received at all (unreachable host, timeout, reset).
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Timeout(_) | FetchError::Network(_))
    }

    /// Remote status code, for failures where the server answered with an error.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            FetchError::HttpStatus {
                status: status.as_u16(),
            }
        } else if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if e.is_builder() {
            FetchError::InvalidUrl(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No text to extract a recipe from")]
    EmptyInput,

    #[error("Model provider failed: {0}")]
    Provider(#[from] LlmError),

    #[error("Model output does not match the recipe schema: {0}")]
    NonConforming(String),
}
