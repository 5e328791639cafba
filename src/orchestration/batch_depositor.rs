//! Batch Depositor - drives the per-batch deposit workflow
//!
//! Features:
//! - Sequential, synchronous processing of the selected publications
//! - Context-ownership guard (cross-tenant publications are skipped)
//! - Credential sentinel resolution before any exchange
//! - Per-item failure isolation with one aggregate report
//! - Exactly one statement-store update per successful item

use crate::core::error::DepositError;
use crate::core::traits::{
    DepositClient, DepositFlags, DepositPoint, DepositPointSource, PackageBuilder, Publication,
    PublicationSource, ResolvedCredentials, StatementStore,
};
use crate::protocol::receipt::extract_statement_href;
use crate::security::credentials::DepositCredentials;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One batch invocation: which publications go to which deposit point
#[derive(Debug, Clone)]
pub struct BatchDepositRequest {
    pub context_id: i64,
    pub publication_ids: Vec<i64>,
    pub deposit_point_id: i64,
    pub credentials: DepositCredentials,
    pub flags: DepositFlags,
}

/// Outcome of one processed publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositOutcome {
    Success {
        publication_id: i64,
        deposit_id: String,
        statement_href: String,
    },
    Failure {
        title: String,
        message: String,
        code: &'static str,
    },
}

impl DepositOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Aggregate result of one batch invocation.
///
/// Outcomes appear in input order, one per publication that passed the
/// ownership check; publications failing that check are not counted.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub deposit_point_id: i64,
    pub outcomes: Vec<DepositOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn is_all_success(&self) -> bool {
        self.outcomes.iter().all(DepositOutcome::is_success)
    }

    pub fn successes(&self) -> impl Iterator<Item = &DepositOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &DepositOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// BatchDepositor - per-batch control loop over the deposit collaborators.
///
/// Collaborators are injected explicitly; the depositor holds no ambient
/// state and can be reused across batches. Batches touching the same
/// publication must not run concurrently (the statement store serializes
/// merges in-process, but cross-process exclusion is the platform's job).
pub struct BatchDepositor {
    publications: Arc<dyn PublicationSource>,
    deposit_points: Arc<dyn DepositPointSource>,
    package_builder: Arc<dyn PackageBuilder>,
    client: Arc<dyn DepositClient>,
    store: Arc<dyn StatementStore>,
}

impl BatchDepositor {
    pub fn new(
        publications: Arc<dyn PublicationSource>,
        deposit_points: Arc<dyn DepositPointSource>,
        package_builder: Arc<dyn PackageBuilder>,
        client: Arc<dyn DepositClient>,
        store: Arc<dyn StatementStore>,
    ) -> Self {
        Self {
            publications,
            deposit_points,
            package_builder,
            client,
            store,
        }
    }

    /// Run one batch to completion and report every outcome.
    ///
    /// The batch itself never aborts: item failures become report entries
    /// and processing continues with the next publication. Only an empty
    /// selection or an unresolvable deposit point short-circuits, before
    /// any collaborator is touched for items.
    pub async fn run_batch(&self, request: BatchDepositRequest) -> BatchReport {
        let started_at = Utc::now();
        let batch_id = Uuid::new_v4();
        let mut outcomes = Vec::new();

        info!(
            %batch_id,
            deposit_point_id = request.deposit_point_id,
            selected = request.publication_ids.len(),
            "starting deposit batch"
        );

        if request.publication_ids.is_empty() {
            outcomes.push(DepositOutcome::Failure {
                title: "No publications selected".to_string(),
                message: DepositError::EmptySelection.to_string(),
                code: DepositError::EmptySelection.code(),
            });
            return self.finish(batch_id, request.deposit_point_id, outcomes, started_at);
        }

        let deposit_point = match self
            .deposit_points
            .by_id(request.deposit_point_id, request.context_id)
            .await
        {
            Ok(Some(point)) => point,
            Ok(None) => {
                let error = DepositError::DepositPointNotFound {
                    deposit_point_id: request.deposit_point_id,
                };
                outcomes.push(DepositOutcome::Failure {
                    title: "Unknown deposit point".to_string(),
                    message: error.to_string(),
                    code: error.code(),
                });
                return self.finish(batch_id, request.deposit_point_id, outcomes, started_at);
            }
            Err(error) => {
                outcomes.push(DepositOutcome::Failure {
                    title: "Unknown deposit point".to_string(),
                    message: error.to_string(),
                    code: error.code(),
                });
                return self.finish(batch_id, request.deposit_point_id, outcomes, started_at);
            }
        };

        // the sentinel never reaches the client
        let credentials = request.credentials.resolve(&deposit_point);

        for publication_id in &request.publication_ids {
            // fetch and validate first so a display title is always
            // available for error reporting
            let publication = match self.publications.publication(*publication_id).await {
                Ok(Some(publication)) => publication,
                Ok(None) => {
                    let error = DepositError::PublicationNotFound {
                        publication_id: *publication_id,
                    };
                    outcomes.push(DepositOutcome::Failure {
                        title: format!("publication #{}", publication_id),
                        message: error.to_string(),
                        code: error.code(),
                    });
                    continue;
                }
                Err(error) => {
                    outcomes.push(DepositOutcome::Failure {
                        title: format!("publication #{}", publication_id),
                        message: error.to_string(),
                        code: error.code(),
                    });
                    continue;
                }
            };

            if publication.context_id != request.context_id {
                // not an error: the publication is simply not ours to deposit
                debug!(
                    publication_id = publication.id,
                    "skipping publication owned by another context"
                );
                continue;
            }

            match self
                .deposit_one(&publication, &deposit_point, &credentials, request.flags)
                .await
            {
                Ok((deposit_id, statement_href)) => {
                    info!(
                        publication_id = publication.id,
                        %deposit_id,
                        "publication deposited"
                    );
                    outcomes.push(DepositOutcome::Success {
                        publication_id: publication.id,
                        deposit_id,
                        statement_href,
                    });
                }
                Err(error) => {
                    warn!(
                        publication_id = publication.id,
                        code = error.code(),
                        error = %error,
                        "deposit failed for publication"
                    );
                    outcomes.push(DepositOutcome::Failure {
                        title: publication.title.clone(),
                        message: error.to_string(),
                        code: error.code(),
                    });
                }
            }
        }

        self.finish(batch_id, request.deposit_point_id, outcomes, started_at)
    }

    /// Build, exchange, interpret, persist for a single publication.
    ///
    /// The staged package is released as soon as the exchange completes,
    /// whichever way it went; only a fully interpreted and persisted
    /// deposit counts as success.
    async fn deposit_one(
        &self,
        publication: &Publication,
        deposit_point: &DepositPoint,
        credentials: &ResolvedCredentials,
        flags: DepositFlags,
    ) -> Result<(String, String), DepositError> {
        let package = self.package_builder.build(publication, flags).await?;

        let exchange = self
            .client
            .deposit(&deposit_point.url, credentials, &package)
            .await;

        if let Err(error) = package.release().await {
            warn!(
                publication_id = publication.id,
                error = %error,
                "failed to release deposit package"
            );
        }

        let receipt = exchange?;
        let statement_href = extract_statement_href(&receipt)?.to_string();

        self.store
            .merge(publication.id, deposit_point.id, &statement_href)
            .await?;

        Ok((receipt.deposit_id, statement_href))
    }

    fn finish(
        &self,
        batch_id: Uuid,
        deposit_point_id: i64,
        outcomes: Vec<DepositOutcome>,
        started_at: DateTime<Utc>,
    ) -> BatchReport {
        let report = BatchReport {
            batch_id,
            deposit_point_id,
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            %batch_id,
            outcomes = report.outcomes.len(),
            failures = report.failures().count(),
            "deposit batch finished"
        );

        report
    }
}
