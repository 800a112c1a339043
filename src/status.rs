//! Structured error status shared by the lexer, parser, validator, and
//! operation tracker.
//!
//! Mirrors the gRPC-style error kinds the DDL core surfaces to its callers.
//! A single [`Status`] carries both the kind and a human-readable message so
//! that callers (the admin handlers, out of scope here) can map it onto the
//! wire protocol's error model without re-deriving the kind from the text.

use std::fmt;

use thiserror::Error;

/// The five error kinds the core ever returns. See spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    Unimplemented,
    AlreadyExists,
    NotFound,
    FailedPrecondition,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Unimplemented => "UNIMPLEMENTED",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::FailedPrecondition => "FAILED_PRECONDITION",
        };
        f.write_str(s)
    }
}

/// A structured error carrying an [`ErrorKind`] and message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct Status {
    pub kind: ErrorKind,
    pub message: String,
}

impl Status {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unimplemented, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FailedPrecondition, message)
    }
}

pub type Result<T> = std::result::Result<T, Status>;
