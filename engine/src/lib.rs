//! Convergence engine: drives remote registry state to match a desired
//! resource specification, one resource at a time.

pub mod waiter;

pub use waiter::{Expectation, WaitError, WaitMode, Waiter};

use regsync_client::{ApiError, RegistryApi};
use regsync_core::{
    ConvergenceOutcome, DesiredResource, RegistryId, RegistrySpec, RemoteState, ResourceId,
    ResourceSpec, SchemaId, SchemaSpec,
};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Propagation(#[from] WaitError),
    #[error("registry '{registry}' must exist before its schemas can be converged")]
    MissingParent { registry: RegistryId },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Clone, Copy, Debug, Default)]
pub struct EngineOptions {
    /// Delete and recreate every schema document found present, skipping the
    /// equivalence check. Legacy parity; registries stay create-if-absent.
    pub always_recreate: bool,
}

pub struct Engine<C> {
    client: C,
    waiter: Waiter,
    options: EngineOptions,
}

impl<C: RegistryApi> Engine<C> {
    pub fn new(
        client: C,
        waiter: Waiter,
    ) -> Self {
        Self::with_options(client, waiter, EngineOptions::default())
    }

    pub fn with_options(
        client: C,
        waiter: Waiter,
        options: EngineOptions,
    ) -> Self {
        Self {
            client,
            waiter,
            options,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Drives one resource to its desired state: create-if-absent,
    /// delete-then-recreate-if-stale. Safe to call again immediately with
    /// the same spec; the second call observes the converged state and
    /// mutates nothing. Issues at most one delete and one create, each
    /// followed by a propagation wait before anything depends on it.
    pub async fn converge(
        &self,
        desired: &DesiredResource,
    ) -> Result<ConvergenceOutcome> {
        match desired {
            DesiredResource::Registry { id, spec } => self.converge_registry(id, spec).await,
            DesiredResource::Schema { id, spec } => self.converge_schema(id, spec).await,
        }
    }

    async fn converge_registry(
        &self,
        id: &RegistryId,
        spec: &RegistrySpec,
    ) -> Result<ConvergenceOutcome> {
        let resource = ResourceId::Registry(id.clone());

        match self.client.probe(&resource).await? {
            RemoteState::Present(_) => {
                tracing::debug!(resource = %resource, "registry already present");
                Ok(ConvergenceOutcome::AlreadyCurrent)
            },
            RemoteState::Absent => {
                self.client.create_registry(id, spec).await?;
                self.waiter
                    .await_propagation(&self.client, &resource, Expectation::Present)
                    .await?;
                tracing::info!(resource = %resource, "created registry");
                Ok(ConvergenceOutcome::Created)
            },
        }
    }

    async fn converge_schema(
        &self,
        id: &SchemaId,
        spec: &SchemaSpec,
    ) -> Result<ConvergenceOutcome> {
        // Schema ids are only meaningful under an existing registry; the
        // remote service does not enforce this for us.
        let parent = ResourceId::Registry(id.registry.clone());
        if let RemoteState::Absent = self.client.probe(&parent).await? {
            return Err(EngineError::MissingParent {
                registry: id.registry.clone(),
            });
        }

        let resource = ResourceId::Schema(id.clone());

        match self.client.probe(&resource).await? {
            RemoteState::Absent => {
                self.client.create_schema(id, spec).await?;
                self.waiter
                    .await_propagation(&self.client, &resource, Expectation::Present)
                    .await?;
                tracing::info!(resource = %resource, "created schema");
                Ok(ConvergenceOutcome::Created)
            },
            RemoteState::Present(ResourceSpec::Schema(current))
                if !self.options.always_recreate && current.is_equivalent_to(spec) =>
            {
                tracing::debug!(resource = %resource, "schema content already current");
                Ok(ConvergenceOutcome::AlreadyCurrent)
            },
            RemoteState::Present(_) => {
                self.client.delete_schema(id).await?;
                self.waiter
                    .await_propagation(&self.client, &resource, Expectation::Absent)
                    .await?;

                self.client.create_schema(id, spec).await?;
                self.waiter
                    .await_propagation(&self.client, &resource, Expectation::Present)
                    .await?;

                tracing::info!(resource = %resource, "recreated schema");
                Ok(ConvergenceOutcome::Recreated)
            },
        }
    }
}
