// src/types/errors.rs
//! Domain errors the web layer maps to specific HTTP statuses

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(problem: impl Into<String>) -> Self {
        DomainError::Validation(vec![problem.into()])
    }

    /// Ok when there is nothing to report
    pub fn check(problems: Vec<String>) -> Result<(), DomainError> {
        if problems.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(problems))
        }
    }
}
