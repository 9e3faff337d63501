//! In-memory registry double. State is shared across clones, every call is
//! journaled, and writes can be made to propagate lazily so waiter behavior
//! is testable without a live service.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;

use regsync_core::{RegistryId, RegistrySpec, ResourceId, SchemaId, SchemaSpec};

use crate::{ApiError, RegistryApi, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiOperation {
    DescribeRegistry { id: RegistryId },
    CreateRegistry { id: RegistryId },
    DeleteRegistry { id: RegistryId },
    DescribeSchema { id: SchemaId },
    CreateSchema { id: SchemaId },
    DeleteSchema { id: SchemaId },
}

#[derive(Clone, Debug)]
struct StoredRegistry {
    spec: RegistrySpec,
    hidden_for: u32,
}

#[derive(Clone, Debug)]
struct StoredSchema {
    version: String,
    spec: SchemaSpec,
    hidden_for: u32,
}

#[derive(Clone, Default)]
pub struct MemoryRegistry {
    registries: Arc<DashMap<String, StoredRegistry>>,
    schemas: Arc<DashMap<(String, String), StoredSchema>>,
    operations: Arc<RwLock<Vec<ApiOperation>>>,
    fail_create: Arc<DashMap<String, String>>,
    propagation_lag: u32,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes stay invisible to the next `lag` describes of the written
    /// resource, imitating an eventually-consistent read path. Deletes
    /// propagate immediately.
    pub fn with_propagation_lag(lag: u32) -> Self {
        Self {
            propagation_lag: lag,
            ..Self::default()
        }
    }

    /// Seeds a registry as already present and fully propagated.
    pub fn insert_registry(
        &self,
        id: &RegistryId,
        spec: RegistrySpec,
    ) {
        self.registries.insert(
            id.as_str().to_string(),
            StoredRegistry {
                spec,
                hidden_for: 0,
            },
        );
    }

    /// Seeds a schema as already present and fully propagated.
    pub fn insert_schema(
        &self,
        id: &SchemaId,
        spec: SchemaSpec,
    ) {
        self.schemas.insert(
            Self::schema_key(id),
            StoredSchema {
                version: id.version.clone(),
                spec,
                hidden_for: 0,
            },
        );
    }

    /// The next create of `id` fails with a rejection carrying `message`.
    pub fn fail_next_create(
        &self,
        id: &ResourceId,
        message: &str,
    ) {
        self.fail_create
            .insert(id.to_string(), message.to_string());
    }

    pub fn operations(&self) -> Vec<ApiOperation> {
        self.operations.read().unwrap().clone()
    }

    pub fn clear_operations(&self) {
        self.operations.write().unwrap().clear();
    }

    fn schema_key(id: &SchemaId) -> (String, String) {
        (id.registry.as_str().to_string(), id.name.clone())
    }

    fn record(
        &self,
        op: ApiOperation,
    ) {
        self.operations.write().unwrap().push(op);
    }

    fn injected_failure(
        &self,
        id: &ResourceId,
    ) -> Result<()> {
        if let Some((_, message)) = self.fail_create.remove(&id.to_string()) {
            return Err(ApiError::Rejected {
                status: 400,
                message,
            });
        }
        Ok(())
    }
}

impl RegistryApi for MemoryRegistry {
    async fn describe_registry(
        &self,
        id: &RegistryId,
    ) -> Result<RegistrySpec> {
        self.record(ApiOperation::DescribeRegistry { id: id.clone() });

        match self.registries.get_mut(id.as_str()) {
            Some(mut stored) if stored.hidden_for > 0 => {
                stored.hidden_for -= 1;
                Err(ApiError::NotFound {
                    id: ResourceId::Registry(id.clone()),
                })
            },
            Some(stored) => Ok(stored.spec.clone()),
            None => {
                Err(ApiError::NotFound {
                    id: ResourceId::Registry(id.clone()),
                })
            },
        }
    }

    async fn create_registry(
        &self,
        id: &RegistryId,
        spec: &RegistrySpec,
    ) -> Result<()> {
        self.record(ApiOperation::CreateRegistry { id: id.clone() });
        self.injected_failure(&ResourceId::Registry(id.clone()))?;

        if self.registries.contains_key(id.as_str()) {
            return Err(ApiError::Rejected {
                status: 409,
                message: format!("registry '{}' already exists", id),
            });
        }

        self.registries.insert(
            id.as_str().to_string(),
            StoredRegistry {
                spec: spec.clone(),
                hidden_for: self.propagation_lag,
            },
        );
        Ok(())
    }

    async fn delete_registry(
        &self,
        id: &RegistryId,
    ) -> Result<()> {
        self.record(ApiOperation::DeleteRegistry { id: id.clone() });

        if self.registries.remove(id.as_str()).is_none() {
            return Err(ApiError::NotFound {
                id: ResourceId::Registry(id.clone()),
            });
        }
        Ok(())
    }

    async fn describe_schema(
        &self,
        id: &SchemaId,
    ) -> Result<SchemaSpec> {
        self.record(ApiOperation::DescribeSchema { id: id.clone() });

        match self.schemas.get_mut(&Self::schema_key(id)) {
            Some(mut stored) if stored.hidden_for > 0 => {
                stored.hidden_for -= 1;
                Err(ApiError::NotFound {
                    id: ResourceId::Schema(id.clone()),
                })
            },
            Some(stored) if stored.version == id.version => Ok(stored.spec.clone()),
            _ => {
                Err(ApiError::NotFound {
                    id: ResourceId::Schema(id.clone()),
                })
            },
        }
    }

    async fn create_schema(
        &self,
        id: &SchemaId,
        spec: &SchemaSpec,
    ) -> Result<()> {
        self.record(ApiOperation::CreateSchema { id: id.clone() });
        self.injected_failure(&ResourceId::Schema(id.clone()))?;

        if !self.registries.contains_key(id.registry.as_str()) {
            return Err(ApiError::NotFound {
                id: ResourceId::Registry(id.registry.clone()),
            });
        }

        if self.schemas.contains_key(&Self::schema_key(id)) {
            return Err(ApiError::Rejected {
                status: 409,
                message: format!("schema '{}' already exists", id),
            });
        }

        self.schemas.insert(
            Self::schema_key(id),
            StoredSchema {
                version: id.version.clone(),
                spec: spec.clone(),
                hidden_for: self.propagation_lag,
            },
        );
        Ok(())
    }

    async fn delete_schema(
        &self,
        id: &SchemaId,
    ) -> Result<()> {
        self.record(ApiOperation::DeleteSchema { id: id.clone() });

        if self.schemas.remove(&Self::schema_key(id)).is_none() {
            return Err(ApiError::NotFound {
                id: ResourceId::Schema(id.clone()),
            });
        }
        Ok(())
    }
}
