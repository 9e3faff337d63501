//! Canned fixture batches: a registry plus a set of versioned schema
//! documents with known OpenAPI 3 content, ordered so the registry always
//! converges first.

use regsync_core::{
    DesiredResource, RegistryId, RegistrySpec, SchemaId, SchemaSpec, SchemaType,
};

pub const SCHEMA_VERSION: &str = "1";
pub const SCHEMA_DESCRIPTION: &str = "test-schema";

/// OpenAPI 3 document describing an event wrapped in a delivery envelope.
pub fn event_envelope_content() -> String {
    serde_json::json!({
        "openapi": "3.0.0",
        "info": { "version": "1.0.0", "title": "TicketCreated" },
        "paths": {},
        "components": {
            "schemas": {
                "Envelope": {
                    "type": "object",
                    "required": ["id", "source", "time", "region", "detail"],
                    "properties": {
                        "id": { "type": "string" },
                        "source": { "type": "string" },
                        "time": { "type": "string", "format": "date-time" },
                        "region": { "type": "string" },
                        "detail": { "$ref": "#/components/schemas/TicketCreated" },
                    },
                },
                "TicketCreated": {
                    "type": "object",
                    "required": ["creator", "department", "ticketId"],
                    "properties": {
                        "creator": { "type": "string" },
                        "department": { "type": "string" },
                        "ticketId": { "type": "string" },
                    },
                },
            },
        },
    })
    .to_string()
}

/// OpenAPI 3 document with a single plain object schema, no envelope.
pub fn object_schema_content() -> String {
    serde_json::json!({
        "openapi": "3.0.0",
        "info": { "version": "1.0.0", "title": "InventoryItem" },
        "paths": {},
        "components": {
            "schemas": {
                "InventoryItem": {
                    "type": "object",
                    "required": ["sku", "name", "quantity"],
                    "properties": {
                        "sku": { "type": "string" },
                        "name": { "type": "string" },
                        "quantity": { "type": "integer" },
                    },
                },
            },
        },
    })
    .to_string()
}

fn batch_with_content(
    name: &str,
    schema_count: usize,
    content: String,
) -> crate::Result<Vec<DesiredResource>> {
    let registry = RegistryId::new(name)?;

    let mut batch = Vec::with_capacity(schema_count + 1);
    batch.push(DesiredResource::Registry {
        id: registry.clone(),
        spec: RegistrySpec {
            description: name.to_string(),
        },
    });

    for i in 0..schema_count {
        batch.push(DesiredResource::Schema {
            id: SchemaId::new(registry.clone(), format!("schema_test-{i}"), SCHEMA_VERSION)?,
            spec: SchemaSpec {
                content: content.clone(),
                description: SCHEMA_DESCRIPTION.to_string(),
                schema_type: SchemaType::OpenApi3,
            },
        });
    }

    Ok(batch)
}

/// Registry plus `schema_count` enveloped event schemas. Two schemas covers
/// the basic case; a dozen exercises paginated listings.
pub fn event_registry(
    name: &str,
    schema_count: usize,
) -> crate::Result<Vec<DesiredResource>> {
    batch_with_content(name, schema_count, event_envelope_content())
}

/// Registry plus two plain object schemas.
pub fn object_registry(name: &str) -> crate::Result<Vec<DesiredResource>> {
    batch_with_content(name, 2, object_schema_content())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regsync_core::ResourceKind;

    #[test]
    fn event_registry_puts_the_registry_first() {
        let batch = event_registry("partner-registry", 2).unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].kind(), ResourceKind::Registry);
        assert!(
            batch[1..]
                .iter()
                .all(|desired| desired.kind() == ResourceKind::SchemaDocument)
        );
    }

    #[test]
    fn schema_names_are_stable_and_versioned() {
        let batch = event_registry("test-pagination", 12).unwrap();

        let DesiredResource::Schema { id, .. } = &batch[1] else {
            panic!("expected a schema entry");
        };
        assert_eq!(id.name, "schema_test-0");
        assert_eq!(id.version, SCHEMA_VERSION);
        assert_eq!(id.registry.as_str(), "test-pagination");

        let DesiredResource::Schema { id, .. } = &batch[12] else {
            panic!("expected a schema entry");
        };
        assert_eq!(id.name, "schema_test-11");
    }

    #[test]
    fn content_is_valid_json_with_a_schema_component() {
        for content in [event_envelope_content(), object_schema_content()] {
            let value: serde_json::Value = serde_json::from_str(&content).unwrap();
            assert_eq!(value["openapi"], "3.0.0");
            assert!(value["components"]["schemas"].is_object());
        }
    }

    #[test]
    fn invalid_registry_names_are_rejected() {
        assert!(event_registry("not a name", 1).is_err());
    }

    #[test]
    fn object_registry_uses_distinct_content() {
        assert_ne!(event_envelope_content(), object_schema_content());
    }
}
