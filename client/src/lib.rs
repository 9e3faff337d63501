//! Client boundary for the remote schema-registry service: the `RegistryApi`
//! contract the convergence engine drives, an HTTP binding, and an in-memory
//! double for tests.

#![allow(async_fn_in_trait)]

pub mod http;
pub mod memory;

pub use http::HttpRegistryClient;
pub use memory::MemoryRegistry;

use regsync_core::{
    RegistryId, RegistrySpec, RemoteState, ResourceId, ResourceSpec, SchemaId, SchemaSpec,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{id} not found")]
    NotFound { id: ResourceId },
    #[error("no authentication provided (set REGSYNC_TOKEN or configure a token)")]
    NoAuth,
    #[error("transient registry service error: {message}")]
    Transient { message: String },
    #[error("registry service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("validation errors: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Network and throttling failures a caller may want to retry. Rejected
    /// writes and validation failures are permanent.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transient { .. } | ApiError::Transport(_))
    }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Opaque RPC boundary to the remote registry service. "Not found" is the
/// only error code consumers inspect; everything else is an opaque failure.
pub trait RegistryApi: Send + Sync {
    async fn describe_registry(
        &self,
        id: &RegistryId,
    ) -> Result<RegistrySpec>;

    async fn create_registry(
        &self,
        id: &RegistryId,
        spec: &RegistrySpec,
    ) -> Result<()>;

    async fn delete_registry(
        &self,
        id: &RegistryId,
    ) -> Result<()>;

    /// Describes the exact (registry, name, version) triple.
    async fn describe_schema(
        &self,
        id: &SchemaId,
    ) -> Result<SchemaSpec>;

    async fn create_schema(
        &self,
        id: &SchemaId,
        spec: &SchemaSpec,
    ) -> Result<()>;

    /// Deletes the schema name as a whole, all versions included.
    async fn delete_schema(
        &self,
        id: &SchemaId,
    ) -> Result<()>;

    /// Describe with the "not found" case folded into `RemoteState::Absent`.
    /// The state is always queried fresh; implementations must not cache.
    async fn probe(
        &self,
        id: &ResourceId,
    ) -> Result<RemoteState> {
        let described = match id {
            ResourceId::Registry(registry) => {
                self.describe_registry(registry)
                    .await
                    .map(ResourceSpec::Registry)
            },
            ResourceId::Schema(schema) => {
                self.describe_schema(schema)
                    .await
                    .map(ResourceSpec::Schema)
            },
        };

        match described {
            Ok(spec) => Ok(RemoteState::Present(spec)),
            Err(err) if err.is_not_found() => Ok(RemoteState::Absent),
            Err(err) => Err(err),
        }
    }
}
