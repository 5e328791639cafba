//! SWORD deposit client
//!
//! reqwest-backed implementation of the `DepositClient` contract: one
//! authenticated POST per deposit exchange, plus retrieval of statement
//! documents. Failures are classified into transport and protocol errors
//! here; no automatic retry is attempted.

use crate::core::error::DepositError;
use crate::core::traits::{DepositClient, DepositReceipt, DepositStatus, Package, ResolvedCredentials};
use crate::protocol::receipt::{PACKAGING_METS, parse_deposit_receipt};
use crate::security::credentials::mask_secret;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

/// Header carrying the declared SWORD packaging identifier
const PACKAGING_HEADER: &str = "X-Packaging";

/// Header carrying an API key where the repository expects one
const API_KEY_HEADER: &str = "X-Api-Key";

/// reqwest-backed SWORD client
pub struct SwordClient {
    http: reqwest::Client,
}

impl SwordClient {
    /// Build a client with the given per-exchange timeout. The timeout
    /// bounds worst-case latency per item; expiry surfaces as an ordinary
    /// transport failure.
    pub fn new(timeout: Duration) -> Result<Self, DepositError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sword-depositor/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| DepositError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl DepositClient for SwordClient {
    async fn deposit(
        &self,
        endpoint_url: &str,
        credentials: &ResolvedCredentials,
        package: &Package,
    ) -> Result<DepositReceipt, DepositError> {
        let payload = fs::read(&package.file_path).await.map_err(|e| {
            DepositError::PackageBuild {
                message: format!(
                    "failed to read staged package {}: {}",
                    package.file_path.display(),
                    e
                ),
            }
        })?;

        debug!(
            endpoint = endpoint_url,
            file = %package.file_name,
            bytes = payload.len(),
            "submitting deposit"
        );

        let packaging = package.packaging.as_deref().unwrap_or(PACKAGING_METS);
        let mut request = self
            .http
            .post(endpoint_url)
            .header(CONTENT_TYPE, &package.media_type)
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename={}", package.file_name),
            )
            .header(PACKAGING_HEADER, packaging)
            .body(payload);

        if let Some(username) = &credentials.username {
            request = request.basic_auth(
                username,
                credentials.password.as_ref().map(|p| p.expose_secret()),
            );
        }
        if let Some(api_key) = &credentials.api_key {
            debug!(
                api_key = %mask_secret(api_key.expose_secret()),
                "using API key authentication"
            );
            request = request.header(API_KEY_HEADER, api_key.expose_secret());
        }

        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(classify_transport)?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }

        let receipt = parse_deposit_receipt(&body, deposit_status_from(status))?;
        info!(deposit_id = %receipt.deposit_id, "deposit accepted by repository");

        Ok(receipt)
    }

    async fn fetch_statement(
        &self,
        statement_href: &str,
        credentials: &ResolvedCredentials,
    ) -> Result<String, DepositError> {
        let mut request = self.http.get(statement_href);

        if let Some(username) = &credentials.username {
            request = request.basic_auth(
                username,
                credentials.password.as_ref().map(|p| p.expose_secret()),
            );
        }
        if let Some(api_key) = &credentials.api_key {
            request = request.header(API_KEY_HEADER, api_key.expose_secret());
        }

        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(classify_transport)?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }

        Ok(body)
    }
}

/// Map an HTTP success status to the protocol-level deposit status
fn deposit_status_from(status: StatusCode) -> DepositStatus {
    if status == StatusCode::CREATED {
        DepositStatus::Created
    } else {
        DepositStatus::Accepted
    }
}

/// Network, timeout, and TLS failures are transport errors
fn classify_transport(error: reqwest::Error) -> DepositError {
    let message = if error.is_timeout() {
        format!("request timed out: {}", error)
    } else {
        error.to_string()
    };

    DepositError::Transport { message }
}

/// Non-success statuses are protocol errors, with authentication statuses
/// split out so the operator sees a credential problem as such
fn classify_status(status: u16, body: &str) -> DepositError {
    match status {
        401 | 403 => DepositError::AuthenticationFailed { status },
        _ => DepositError::Protocol {
            status,
            message: summarize_body(body),
        },
    }
}

/// First line of the response body, bounded for report readability
fn summarize_body(body: &str) -> String {
    let line = body.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let line = line.trim();

    if line.is_empty() {
        return "no response body".to_string();
    }

    if line.len() > 200 {
        let cut = line
            .char_indices()
            .take_while(|(i, _)| *i < 200)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}…", &line[..cut])
    } else {
        line.to_string()
    }
}
