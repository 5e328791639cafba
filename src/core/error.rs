//! Error handling for SWORD deposit operations
//!
//! This module provides the deposit error taxonomy with classification
//! helpers, using the thiserror crate for ergonomic error handling.

use thiserror::Error;

/// Main error type for deposit operations
#[derive(Error, Debug)]
pub enum DepositError {
    // Selection errors
    #[error("no publications were selected for deposit")]
    EmptySelection,

    #[error("publication {publication_id} not found")]
    PublicationNotFound { publication_id: i64 },

    #[error("deposit point {deposit_point_id} is not configured for this context")]
    DepositPointNotFound { deposit_point_id: i64 },

    // Package errors
    #[error("failed to assemble deposit package: {message}")]
    PackageBuild { message: String },

    // Exchange errors
    #[error("deposit transport failed: {message}")]
    Transport { message: String },

    #[error("repository rejected the deposit (HTTP {status}): {message}")]
    Protocol { status: u16, message: String },

    #[error("authentication with the deposit point failed (HTTP {status})")]
    AuthenticationFailed { status: u16 },

    // Receipt errors
    #[error("malformed deposit receipt: {message}")]
    MalformedReceipt { message: String },

    #[error("deposit receipt carries no statement or add link")]
    NoStatementLink,

    // Local errors
    #[error("configuration error: {0}")]
    Config(String),

    #[error("statement store error: {message}")]
    Store { message: String },
}

impl DepositError {
    /// Stable error code, suitable for machine-readable report entries
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptySelection => "EMPTY_SELECTION",
            Self::PublicationNotFound { .. } => "PUBLICATION_NOT_FOUND",
            Self::DepositPointNotFound { .. } => "DEPOSIT_POINT_NOT_FOUND",
            Self::PackageBuild { .. } => "PACKAGE_BUILD_FAILED",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Protocol { .. } => "PROTOCOL_ERROR",
            Self::AuthenticationFailed { .. } => "AUTHENTICATION_FAILED",
            Self::MalformedReceipt { .. } => "MALFORMED_RECEIPT",
            Self::NoStatementLink => "NO_STATEMENT_LINK",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Store { .. } => "STORE_ERROR",
        }
    }

    /// Whether re-running the batch may succeed without operator action.
    ///
    /// Transport failures (including client-level timeouts) are transient;
    /// everything else needs a config, credential, or content fix first.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
