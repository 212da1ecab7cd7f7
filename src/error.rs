//! Fatal errors of the rewrite pass
//!
//! Everything here aborts the pass. Recoverable findings are collected as
//! [`crate::report::Issue`] values instead.

use thiserror::Error;

use crate::error_msg::ErrorCode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// A line at or below the cutoff differs between input and output.
    #[error("line {line} is protected by cutoff {cutoff} but was altered")]
    CutoffViolation { line: usize, cutoff: usize },

    #[error("output has {output} lines but input has {input}")]
    LineCountMismatch { input: usize, output: usize },

    #[error("invalid producer pattern `{pattern}`: {reason}")]
    InvalidProducerPattern { pattern: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RewriteError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RewriteError::CutoffViolation { .. } => ErrorCode::RB100,
            RewriteError::LineCountMismatch { .. } => ErrorCode::RB101,
            RewriteError::InvalidProducerPattern { .. } => ErrorCode::RB120,
            RewriteError::Config(_) => ErrorCode::RB121,
        }
    }
}
