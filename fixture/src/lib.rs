//! Fixture orchestration: converges an ordered batch of desired resources
//! before an integration-test run and reports what happened per resource.

pub mod config;
pub mod credentials;
pub mod presets;

pub use crate::config::FixtureConfig;
pub use crate::credentials::{CredentialProfile, CredentialScope};

use regsync_client::RegistryApi;
use regsync_core::{ConvergenceOutcome, DesiredResource, ResourceId};
use regsync_engine::Engine;

#[derive(thiserror::Error, Debug)]
pub enum FixtureError {
    #[error("config error: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("validation errors: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Client(#[from] regsync_client::ApiError),
    #[error("{0}")]
    Resource(#[from] regsync_core::Error),
}

pub type Result<T, E = FixtureError> = std::result::Result<T, E>;

#[derive(Clone, Debug, serde::Serialize)]
pub struct ConvergedResource {
    pub id: ResourceId,
    pub outcome: ConvergenceOutcome,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct FailedResource {
    pub id: ResourceId,
    pub reason: String,
}

/// Aggregate outcome of a setup run. Every failure names the resource it
/// belongs to; entries after the first failure appear in neither list.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct SetupReport {
    pub succeeded: Vec<ConvergedResource>,
    pub failed: Vec<FailedResource>,
}

impl SetupReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn outcome_count(
        &self,
        outcome: ConvergenceOutcome,
    ) -> usize {
        self.succeeded
            .iter()
            .filter(|converged| converged.outcome == outcome)
            .count()
    }
}

impl std::fmt::Display for SetupReport {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{} converged ({} created, {} recreated, {} already current); {} failed",
            self.succeeded.len(),
            self.outcome_count(ConvergenceOutcome::Created),
            self.outcome_count(ConvergenceOutcome::Recreated),
            self.outcome_count(ConvergenceOutcome::AlreadyCurrent),
            self.failed.len(),
        )
    }
}

/// Converges the batch in order, fail-fast: the first failure stops the run
/// and the remaining entries are never attempted. Ordering is the caller's
/// responsibility; registries must precede the schemas that depend on them.
pub async fn setup<C: RegistryApi>(
    engine: &Engine<C>,
    batch: &[DesiredResource],
) -> SetupReport {
    let mut report = SetupReport::default();

    for desired in batch {
        let id = desired.id();

        match engine.converge(desired).await {
            Ok(outcome) => {
                tracing::info!(resource = %id, %outcome, "converged");
                report.succeeded.push(ConvergedResource { id, outcome });
            },
            Err(err) => {
                tracing::error!(resource = %id, error = %err, "fixture setup failed");
                report.failed.push(FailedResource {
                    id,
                    reason: err.to_string(),
                });
                break;
            },
        }
    }

    report
}
