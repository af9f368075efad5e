use std::fmt;

use ladle_core::{ExtractError, FetchError};
use thiserror::Error;

use crate::store::StoreError;

/// Pipeline stage a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CacheLookup,
    Fetch,
    Normalize,
    Extract,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::CacheLookup => "cache_lookup",
            Stage::Fetch => "fetch",
            Stage::Normalize => "normalize",
            Stage::Extract => "extract",
            Stage::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Normalization failed: {0}")]
    Normalize(String),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage failed during {stage}: {error}")]
    Store {
        stage: Stage,
        #[source]
        error: StoreError,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Fetch(_) => Stage::Fetch,
            PipelineError::Normalize(_) => Stage::Normalize,
            PipelineError::Extraction(_) => Stage::Extract,
            PipelineError::Store { stage, .. } => *stage,
        }
    }

    /// Status code the source site answered with, for fetch failures that got a response.
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            PipelineError::Fetch(e) => e.status(),
            _ => None,
        }
    }

    pub(super) fn store(stage: Stage) -> impl FnOnce(StoreError) -> Self {
        move |error| PipelineError::Store { stage, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_reported() {
        assert_eq!(
            PipelineError::Fetch(FetchError::EmptyBody).stage(),
            Stage::Fetch
        );
        assert_eq!(
            PipelineError::Normalize("empty".to_string()).stage(),
            Stage::Normalize
        );
        assert_eq!(
            PipelineError::Extraction(ExtractError::EmptyInput).stage(),
            Stage::Extract
        );
        assert_eq!(
            PipelineError::store(Stage::CacheLookup)(StoreError::Vanished).stage(),
            Stage::CacheLookup
        );
    }

    #[test]
    fn only_http_status_failures_carry_remote_status() {
        let gone = PipelineError::Fetch(FetchError::HttpStatus { status: 410 });
        assert_eq!(gone.remote_status(), Some(410));

        let down = PipelineError::Fetch(FetchError::Network("refused".to_string()));
        assert_eq!(down.remote_status(), None);
        assert_eq!(Stage::CacheLookup.to_string(), "cache_lookup");
    }
}
