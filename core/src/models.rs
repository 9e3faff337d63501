use crate::{Error, Result};

const MAX_NAME_LEN: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Registry,
    SchemaDocument,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ResourceKind::Registry => write!(f, "registry"),
            ResourceKind::SchemaDocument => write!(f, "schema document"),
        }
    }
}

fn validate_name(
    kind: ResourceKind,
    name: &str,
) -> Result<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.len() > MAX_NAME_LEN {
        "must be at most 64 characters"
    } else if name
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '_' | '-'))
    {
        "may only contain ASCII letters, digits, '.', '_' and '-'"
    } else {
        return Ok(());
    };

    Err(Error::InvalidName {
        kind,
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// Name of a registry, the container grouping related schema documents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryId(String);

impl RegistryId {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(ResourceKind::Registry, &name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegistryId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RegistryId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RegistryId> for String {
    fn from(value: RegistryId) -> Self {
        value.0
    }
}

impl std::str::FromStr for RegistryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// A versioned schema document under a registry. Identity for reads is the
/// full (registry, name, version) triple; deletes target the schema name as
/// a whole.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SchemaId {
    pub registry: RegistryId,
    pub name: String,
    pub version: String,
}

impl SchemaId {
    pub fn new(
        registry: RegistryId,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(ResourceKind::SchemaDocument, &name)?;

        let version = version.into();
        if version.is_empty() {
            return Err(Error::InvalidVersion {
                version,
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            registry,
            name,
            version,
        })
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.registry, self.name, self.version)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(untagged)]
pub enum ResourceId {
    Registry(RegistryId),
    Schema(SchemaId),
}

impl ResourceId {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceId::Registry(_) => ResourceKind::Registry,
            ResourceId::Schema(_) => ResourceKind::SchemaDocument,
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ResourceId::Registry(id) => write!(f, "registry \"{}\"", id),
            ResourceId::Schema(id) => write!(f, "schema \"{}\"", id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaType {
    OpenApi3,
    JsonSchemaDraft4,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, validator::Validate)]
pub struct RegistrySpec {
    #[validate(length(max = 256))]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, validator::Validate)]
pub struct SchemaSpec {
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(max = 256))]
    pub description: String,
    pub schema_type: SchemaType,
}

impl SchemaSpec {
    /// Logical content comparison: JSON documents are compared as parsed
    /// values, anything unparseable falls back to byte equality. Description
    /// drift alone does not make a schema stale.
    pub fn is_equivalent_to(
        &self,
        other: &SchemaSpec,
    ) -> bool {
        if self.schema_type != other.schema_type {
            return false;
        }

        match (
            serde_json::from_str::<serde_json::Value>(&self.content),
            serde_json::from_str::<serde_json::Value>(&other.content),
        ) {
            (Ok(ours), Ok(theirs)) => ours == theirs,
            _ => self.content == other.content,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ResourceSpec {
    Registry(RegistrySpec),
    Schema(SchemaSpec),
}

impl ResourceSpec {
    /// Kind-specific equivalence rule. A present registry is always current
    /// (recreating one would orphan every schema under it); schema documents
    /// compare logical content and type.
    pub fn is_equivalent_to(
        &self,
        other: &ResourceSpec,
    ) -> bool {
        match (self, other) {
            (ResourceSpec::Registry(_), ResourceSpec::Registry(_)) => true,
            (ResourceSpec::Schema(ours), ResourceSpec::Schema(theirs)) => {
                ours.is_equivalent_to(theirs)
            },
            _ => false,
        }
    }
}

/// A resource the orchestrator wants to exist remotely, with the content it
/// should have once converged. Kind and spec cannot disagree by construction.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DesiredResource {
    Registry { id: RegistryId, spec: RegistrySpec },
    Schema { id: SchemaId, spec: SchemaSpec },
}

impl DesiredResource {
    pub fn id(&self) -> ResourceId {
        match self {
            DesiredResource::Registry { id, .. } => ResourceId::Registry(id.clone()),
            DesiredResource::Schema { id, .. } => ResourceId::Schema(id.clone()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            DesiredResource::Registry { .. } => ResourceKind::Registry,
            DesiredResource::Schema { .. } => ResourceKind::SchemaDocument,
        }
    }

    pub fn spec(&self) -> ResourceSpec {
        match self {
            DesiredResource::Registry { spec, .. } => ResourceSpec::Registry(spec.clone()),
            DesiredResource::Schema { spec, .. } => ResourceSpec::Schema(spec.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case::test_case("partner-registry")]
    #[test_case::test_case("test-pagination")]
    #[test_case::test_case("a")]
    #[test_case::test_case("r.1_x-y")]
    fn accepts_valid_registry_names(name: &str) {
        let id = RegistryId::new(name).unwrap();
        assert_eq!(id.as_str(), name);
    }

    #[test_case::test_case("", "must not be empty"; "empty name")]
    #[test_case::test_case("has space", "may only contain"; "whitespace")]
    #[test_case::test_case("sch/ema", "may only contain"; "separator")]
    fn rejects_invalid_registry_names(
        name: &str,
        reason: &str,
    ) {
        let err = RegistryId::new(name).unwrap_err();
        assert!(err.to_string().contains(reason), "got: {err}");
    }

    #[test]
    fn rejects_overlong_names() {
        let err = RegistryId::new("x".repeat(65)).unwrap_err();
        assert!(err.to_string().contains("at most 64"));
    }

    #[test]
    fn rejects_empty_schema_version() {
        let registry = RegistryId::new("r").unwrap();
        let err = SchemaId::new(registry, "s", "").unwrap_err();
        assert!(matches!(err, Error::InvalidVersion { .. }));
    }

    #[test]
    fn resource_id_display_names_the_resource() {
        let registry = RegistryId::new("partner-registry").unwrap();
        let schema = SchemaId::new(registry.clone(), "schema_test-0", "1").unwrap();

        assert_eq!(
            ResourceId::Registry(registry).to_string(),
            "registry \"partner-registry\""
        );
        assert_eq!(
            ResourceId::Schema(schema).to_string(),
            "schema \"partner-registry/schema_test-0@1\""
        );
    }

    fn schema_spec(
        content: &str,
        schema_type: SchemaType,
    ) -> SchemaSpec {
        SchemaSpec {
            content: content.to_string(),
            description: "test-schema".to_string(),
            schema_type,
        }
    }

    #[test]
    fn equivalence_ignores_json_formatting() {
        let a = schema_spec(r#"{"openapi":"3.0.0","paths":{}}"#, SchemaType::OpenApi3);
        let b = schema_spec(
            "{\n  \"paths\": {},\n  \"openapi\": \"3.0.0\"\n}",
            SchemaType::OpenApi3,
        );
        assert!(a.is_equivalent_to(&b));
    }

    #[test]
    fn equivalence_ignores_description_drift() {
        let mut a = schema_spec(r#"{"openapi":"3.0.0"}"#, SchemaType::OpenApi3);
        let b = schema_spec(r#"{"openapi":"3.0.0"}"#, SchemaType::OpenApi3);
        a.description = "something else".to_string();
        assert!(a.is_equivalent_to(&b));
    }

    #[test]
    fn differing_content_is_not_equivalent() {
        let a = schema_spec(r#"{"title":"TicketCreated"}"#, SchemaType::OpenApi3);
        let b = schema_spec(r#"{"title":"TicketClosed"}"#, SchemaType::OpenApi3);
        assert!(!a.is_equivalent_to(&b));
    }

    #[test]
    fn differing_schema_type_is_not_equivalent() {
        let a = schema_spec(r#"{"type":"object"}"#, SchemaType::OpenApi3);
        let b = schema_spec(r#"{"type":"object"}"#, SchemaType::JsonSchemaDraft4);
        assert!(!a.is_equivalent_to(&b));
    }

    #[test]
    fn non_json_content_falls_back_to_byte_equality() {
        let a = schema_spec("not json", SchemaType::OpenApi3);
        let b = schema_spec("not json", SchemaType::OpenApi3);
        let c = schema_spec("not json either", SchemaType::OpenApi3);
        assert!(a.is_equivalent_to(&b));
        assert!(!a.is_equivalent_to(&c));
    }

    #[test]
    fn registry_specs_are_always_equivalent() {
        let a = ResourceSpec::Registry(RegistrySpec {
            description: "one".to_string(),
        });
        let b = ResourceSpec::Registry(RegistrySpec {
            description: "two".to_string(),
        });
        assert!(a.is_equivalent_to(&b));
    }

    #[test]
    fn registry_id_round_trips_through_serde() {
        let id = RegistryId::new("partner-registry").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"partner-registry\"");
        let back: RegistryId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn registry_id_serde_rejects_invalid_names() {
        let result = serde_json::from_str::<RegistryId>("\"has space\"");
        assert!(result.is_err());
    }
}
