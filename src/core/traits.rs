//! Core traits and types for SWORD deposits
//!
//! This module defines the fundamental abstractions for the deposit
//! workflow: the data model shared by all components and the collaborator
//! contracts (package building, deposit exchange, publication lookup,
//! statement persistence) that the orchestrator is wired with.

use crate::core::error::DepositError;
use crate::core::statement::StatementRecord;
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

// ============================================================================
// Deposit points
// ============================================================================

/// Visibility/lifecycle kind of a configured deposit point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositPointKind {
    /// Shown to managers for manual batch deposits
    Manager,
    /// Deposited to automatically on publication
    Automatic,
    /// Offered to authors as an optional target
    Optional,
}

/// A configured remote repository endpoint plus stored credentials.
///
/// Deposit points are created and edited elsewhere (administrative UI or
/// config file); the deposit core only ever reads them, looked up by id
/// within one publishing context.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositPoint {
    pub id: i64,
    #[serde(default)]
    pub context_id: i64,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    pub kind: DepositPointKind,
}

// ============================================================================
// Publications
// ============================================================================

/// The slice of a publication the deposit workflow needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub id: i64,
    pub context_id: i64,
    pub title: String,
}

/// Inclusion flags for package assembly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositFlags {
    /// Include editorial metadata files in the package
    #[serde(default)]
    pub include_editorial: bool,

    /// Include galley (reader-facing) files in the package
    #[serde(default)]
    pub include_galleys: bool,
}

// ============================================================================
// Packages
// ============================================================================

/// A staged deposit package: opaque payload plus declared content metadata.
///
/// The package is owned by the deposit attempt that created it and must be
/// released once the exchange completes, success or failure.
#[derive(Debug)]
pub struct Package {
    pub file_path: PathBuf,
    pub file_name: String,
    pub media_type: String,
    pub packaging: Option<String>,
}

impl Package {
    pub fn new<P: Into<PathBuf>>(file_path: P, file_name: String, media_type: String) -> Self {
        Self {
            file_path: file_path.into(),
            file_name,
            media_type,
            packaging: None,
        }
    }

    /// Set the SWORD packaging identifier declared on the exchange
    pub fn with_packaging(mut self, packaging: String) -> Self {
        self.packaging = Some(packaging);
        self
    }

    /// Delete the staged payload. A package that was already removed is not
    /// an error; anything else is surfaced so the caller can log it.
    pub async fn release(self) -> Result<(), DepositError> {
        match fs::remove_file(&self.file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DepositError::PackageBuild {
                message: format!("failed to release {}: {}", self.file_path.display(), e),
            }),
        }
    }
}

// ============================================================================
// Protocol responses
// ============================================================================

/// Outcome status of a successful deposit exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Created,
    Accepted,
}

/// A typed link from a deposit receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositLink {
    pub rel: String,
    pub href: String,
}

/// Parsed result of a successful deposit exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositReceipt {
    /// Repository-assigned identifier of the deposited object
    pub deposit_id: String,
    pub status: DepositStatus,
    /// Links in response order; order matters for relation fallback
    pub links: Vec<DepositLink>,
}

// ============================================================================
// Credentials (resolved form consumed by the client)
// ============================================================================

/// Credentials after sentinel substitution, ready for the wire.
///
/// Produced by `security::DepositCredentials::resolve`; the deposit client
/// never sees the `"<use-stored-password>"` sentinel.
#[derive(Debug, Clone, Default)]
pub struct ResolvedCredentials {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub api_key: Option<SecretString>,
}

// ============================================================================
// Collaborator contracts
// ============================================================================

/// Builds one deposit package per publication
#[async_trait]
pub trait PackageBuilder: Send + Sync {
    async fn build(
        &self,
        publication: &Publication,
        flags: DepositFlags,
    ) -> Result<Package, DepositError>;
}

/// Performs the authenticated deposit exchange against an endpoint.
///
/// Implementations classify failures into `DepositError::Transport`
/// (network, timeout, TLS) and `DepositError::Protocol` (non-2xx status,
/// malformed response body). No automatic retry: a failure is surfaced
/// immediately as an item-level failure.
#[async_trait]
pub trait DepositClient: Send + Sync {
    async fn deposit(
        &self,
        endpoint_url: &str,
        credentials: &ResolvedCredentials,
        package: &Package,
    ) -> Result<DepositReceipt, DepositError>;

    /// Retrieve a previously recorded statement document
    async fn fetch_statement(
        &self,
        statement_href: &str,
        credentials: &ResolvedCredentials,
    ) -> Result<String, DepositError>;
}

/// Looks up publications by id
#[async_trait]
pub trait PublicationSource: Send + Sync {
    async fn publication(&self, publication_id: i64)
    -> Result<Option<Publication>, DepositError>;
}

/// Looks up deposit points by id within one publishing context
#[async_trait]
pub trait DepositPointSource: Send + Sync {
    async fn by_id(
        &self,
        deposit_point_id: i64,
        context_id: i64,
    ) -> Result<Option<DepositPoint>, DepositError>;
}

/// Persists statement references per publication and deposit point.
///
/// `merge` must be non-destructive: inserting one deposit point's statement
/// never removes entries recorded for other deposit points, and re-merging
/// the same pair overwrites only that pair's entry.
#[async_trait]
pub trait StatementStore: Send + Sync {
    async fn merge(
        &self,
        publication_id: i64,
        deposit_point_id: i64,
        statement_href: &str,
    ) -> Result<(), DepositError>;

    /// Current record for a publication; empty if nothing was deposited yet
    async fn record(&self, publication_id: i64) -> Result<StatementRecord, DepositError>;
}
