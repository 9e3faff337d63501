//! Data model for remote schema-registry resources: identifiers, desired
//! specifications, observed remote state, and convergence outcomes.

pub mod models;
pub mod state;

pub use models::{
    DesiredResource, RegistryId, RegistrySpec, ResourceId, ResourceKind, ResourceSpec, SchemaId,
    SchemaSpec, SchemaType,
};
pub use state::{ConvergenceOutcome, RemoteState};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid {kind} name '{name}': {reason}")]
    InvalidName {
        kind: ResourceKind,
        name: String,
        reason: String,
    },
    #[error("invalid schema version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
