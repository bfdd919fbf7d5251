//! Contract Test: Contact Lifecycle
//!
//! Verifies contact creation from structured names, reads by handle, and
//! deletion rules including the immutable registry-operator contact.

mod common;

use common::*;
use rpp_core::RegistryConfig;
use rpp_core::protocol::{Method, Request};
use serde_json::json;

const ANN: &str = r#"{"name": {"components": [
    {"kind": "given", "value": "Ann"},
    {"kind": "surname", "value": "Example"}
]}}"#;

async fn create_contact(registry: &rpp_core::Registry, body: &str) -> rpp_core::Response {
    registry
        .handle(Request::new(Method::Put, "/entities/new").with_body(body))
        .await
}

#[tokio::test]
async fn create_assigns_a_handle_and_stores_the_joined_name() {
    let registry = registry().await;

    let response = create_contact(&registry, ANN).await;
    assert_eq!(response.status_code, 201);
    assert_eq!(response.status_message, "Created");
    let handle = response.fields["handle"].as_u64().unwrap();
    assert_eq!(result_text(&response), format!("Contact {handle} created"));

    let response = get(&registry, &format!("/entities/{handle}")).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(result_text(&response), format!("Contact {handle} exists"));
    assert_eq!(response.fields["name"], json!("Ann Example"));
    assert!(response.fields.contains_key("created"));
}

#[tokio::test]
async fn given_name_defaults_to_empty() {
    let registry = registry().await;

    let body = r#"{"name": {"components": [{"kind": "surname", "value": "Solo"}]}}"#;
    let response = create_contact(&registry, body).await;
    assert_eq!(response.status_code, 201);
    let handle = response.fields["handle"].as_u64().unwrap();

    let response = get(&registry, &format!("/entities/{handle}")).await;
    assert_eq!(response.fields["name"], json!(" Solo"));
}

#[tokio::test]
async fn missing_surname_is_an_internal_error() {
    let registry = registry().await;

    let body = r#"{"name": {"components": [{"kind": "given", "value": "Ann"}]}}"#;
    let response = create_contact(&registry, body).await;
    assert_eq!(response.status_code, 500);
}

#[tokio::test]
async fn delete_removes_the_contact() {
    let registry = registry().await;
    let response = create_contact(&registry, ANN).await;
    let handle = response.fields["handle"].as_u64().unwrap();

    let response = registry
        .handle(Request::new(Method::Delete, format!("/entities/{handle}")))
        .await;
    assert_eq!(response.status_code, 202);
    assert_eq!(result_text(&response), format!("{handle} deleted"));

    let response = get(&registry, &format!("/entities/{handle}")).await;
    assert_eq!(response.status_code, 404);
    assert_eq!(result_text(&response), format!("Contact {handle} NOT found"));
}

#[tokio::test]
async fn operator_contact_is_immutable() {
    let registry = registry().await;

    // The first contact receives handle 1, the configured operator handle
    let response = create_contact(&registry, ANN).await;
    assert_eq!(response.fields["handle"], json!(1));

    let response = registry
        .handle(Request::new(Method::Delete, "/entities/1"))
        .await;
    assert_eq!(response.status_code, 423);
    assert_eq!(response.status_message, "Immutable");
    assert_eq!(result_text(&response), "1 cannot be deleted");
}

#[tokio::test]
async fn quota_rejects_creation_once_reached() {
    let mut config = RegistryConfig::default();
    config.max_contacts = 1;
    let registry = registry_with(config).await;

    assert_eq!(create_contact(&registry, ANN).await.status_code, 201);

    let response = create_contact(&registry, ANN).await;
    assert_eq!(response.status_code, 400);
    assert_eq!(response.status_message, "Too many");
    assert_eq!(result_text(&response), "Too many contacts already");
}

#[tokio::test]
async fn non_numeric_handles_are_not_found() {
    let registry = registry().await;

    let response = get(&registry, "/entities/alice").await;
    assert_eq!(response.status_code, 404);
    assert_eq!(result_text(&response), "Contact alice NOT found");

    let response = registry
        .handle(Request::new(Method::Delete, "/entities/alice"))
        .await;
    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn contact_creation_requires_a_body() {
    let registry = registry().await;

    let response = registry
        .handle(Request::new(Method::Put, "/entities/new"))
        .await;
    assert_eq!(response.status_code, 400);
    assert_eq!(response.status_message, "Empty");
    assert_eq!(result_text(&response), "No JSON body to create contact");

    let response = create_contact(&registry, "not json").await;
    assert_eq!(response.status_code, 400);
    assert_eq!(response.status_message, "Invalid");
}
