use spoolprep_shared::ElementKind;
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong between constructing an element and seeing
/// it prepared. Payloads are strings so the error can be cloned out to every
/// waiter on an element.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrepareError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid {kind} source data: {reason}")]
    InvalidSourceData { kind: ElementKind, reason: String },
    #[error("Could not schedule preparation: {0}")]
    SchedulingFailure(String),
    #[error("Contract violation: {0}")]
    ContractViolation(String),
    #[error("Source could not be resolved: {0}")]
    Source(String),
    #[error("Preparation timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Preparation cancelled")]
    Cancelled,
    #[error("Preparation worker failed: {0}")]
    Worker(String),
}

impl PrepareError {
    pub fn invalid_source(kind: ElementKind, reason: impl Into<String>) -> Self {
        PrepareError::InvalidSourceData { kind, reason: reason.into() }
    }
}
