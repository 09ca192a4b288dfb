use std::io::Write;

use anyres_client::{ClientError, InMemoryResourceClient, InMemorySchemaRegistry, ResourceClient};
use anyres_core::{ResourceId, SchemaRegistry};
use assert_json_diff::assert_json_include;
use serde_json::json;

const DEFINITIONS: &str = r#"[
    {
        "resourceType": "Microsoft.Resources/resourceGroups",
        "apiVersion": "2021-04-01",
        "body": {
            "properties": {
                "location": {"type": "string", "required": true},
                "tags": {"type": "object", "additionalProperties": {"type": "string"}}
            }
        }
    },
    {
        "resourceType": "Microsoft.Resources/resourceGroups",
        "apiVersion": "2022-09-01",
        "body": {"properties": {"location": {"type": "string"}}}
    }
]"#;

#[test]
fn loads_definitions_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DEFINITIONS.as_bytes()).unwrap();

    let registry = InMemorySchemaRegistry::from_json_file(file.path()).unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.latest_api_version("Microsoft.Resources/resourceGroups").as_deref(),
        Some("2022-09-01")
    );

    let id = ResourceId::new(
        "rg",
        "/subscriptions/000",
        "Microsoft.Resources/resourceGroups@2021-04-01",
        &registry,
    )
    .unwrap();
    let def = id.require_definition(&registry).unwrap();
    assert!(def.can_have_property("tags"));
}

#[test]
fn missing_file_is_a_definitions_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = InMemorySchemaRegistry::from_json_file(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ClientError::Definitions { .. }));
}

#[tokio::test]
async fn round_trips_through_backend() {
    let client = InMemoryResourceClient::new();
    let id = "/subscriptions/000/resourceGroups/rg";
    client
        .create_or_update(id, "2021-04-01", &json!({"location": "westeurope", "tags": {"a": "b"}}))
        .await
        .unwrap();

    let live = client.get(id, "2021-04-01").await.unwrap();
    assert_json_include!(
        actual: live,
        expected: json!({
            "id": id,
            "name": "rg",
            "type": "Microsoft.Resources/resourceGroups",
            "tags": {"a": "b"}
        })
    );

    tokio_test::assert_ok!(client.delete(id, "2021-04-01").await);
    assert!(client.get(id, "2021-04-01").await.unwrap_err().is_not_found());
}
