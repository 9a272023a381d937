//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when an expense, user or session is not found.
//! - [`Validation`] thrown when a submitted form does not pass validation; it
//!   carries the per-field messages.
//! - [`InvalidCredentials`] thrown when a login attempt fails.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidCredentials`]: EngineError::InvalidCredentials
use sea_orm::DbErr;
use thiserror::Error;

use crate::FieldErrors;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("Invalid form: {0}")]
    Validation(FieldErrors),
    #[error("Password hashing failed: {0}")]
    Password(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Password(a), Self::Password(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<FieldErrors> for EngineError {
    fn from(value: FieldErrors) -> Self {
        Self::Validation(value)
    }
}
