//! The module contains the errors the engine can return.
//!
//! Every failure in the inventory is recoverable: each variant renders to a
//! short human-readable alert through [`EngineError::alert`].
//!
//! - [`Auth`] and [`NotAuthenticated`] for session problems.
//! - [`Validation`] when form input is rejected before any gateway call.
//! - [`GatewayRead`] and [`GatewayWrite`] for backend failures.
//! - [`Attachment`] for missing or unreadable images and invoices.
//!
//!  [`Auth`]: EngineError::Auth
//!  [`NotAuthenticated`]: EngineError::NotAuthenticated
//!  [`Validation`]: EngineError::Validation
//!  [`GatewayRead`]: EngineError::GatewayRead
//!  [`GatewayWrite`]: EngineError::GatewayWrite
//!  [`Attachment`]: EngineError::Attachment
use thiserror::Error;

use crate::forms::FieldErrors;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("User not authenticated")]
    NotAuthenticated,
    #[error("Invalid input: {0}")]
    Validation(FieldErrors),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Vehicle {0} is already sold")]
    AlreadySold(String),
    #[error("Invalid record from backend: {0}")]
    InvalidRecord(String),
    #[error("Failed to load data: {0}")]
    GatewayRead(String),
    #[error("Failed to save changes: {0}")]
    GatewayWrite(String),
    #[error("Attachment error: {0}")]
    Attachment(String),
    #[error("Export failed: {0}")]
    Export(String),
    #[error("Settings error: {0}")]
    Settings(String),
}

impl EngineError {
    /// Message suitable for a dismissible alert.
    pub fn alert(&self) -> String {
        match self {
            Self::Auth(msg) => format!("Sign in failed: {msg}"),
            Self::NotAuthenticated => "Please sign in first.".to_string(),
            Self::Validation(errors) => errors.to_string(),
            Self::InvalidAmount(_) => "Please enter a valid amount.".to_string(),
            Self::KeyNotFound(key) => format!("Not found: {key}"),
            Self::AlreadySold(_) => "This car has already been sold.".to_string(),
            Self::InvalidRecord(_) | Self::GatewayRead(_) => {
                "Failed to load inventory data. Please try again.".to_string()
            }
            Self::GatewayWrite(_) => "Failed to save changes. Please try again.".to_string(),
            Self::Attachment(msg) => msg.clone(),
            Self::Export(_) => "Failed to export inventory.".to_string(),
            Self::Settings(_) => "Failed to save settings.".to_string(),
        }
    }

    /// `true` for errors that were raised before any gateway call.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidAmount(_))
    }
}

impl From<FieldErrors> for EngineError {
    fn from(value: FieldErrors) -> Self {
        Self::Validation(value)
    }
}
