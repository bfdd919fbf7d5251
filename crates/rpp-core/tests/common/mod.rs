//! Shared fixtures for the contract tests
//!
//! Each test builds a registry over a fresh in-memory store seeded with two
//! registrar accounts, then drives it through the protocol entry point the
//! way the HTTP collaborator would.

#![allow(dead_code)]

use std::sync::Arc;

use rpp_core::protocol::{Method, Request, Response};
use rpp_core::{MemoryStore, Registry, RegistryConfig};

pub const REGISTRAR_5: u32 = 5;
pub const SECRET_5: &str = "secret-five";
pub const REGISTRAR_6: u32 = 6;
pub const SECRET_6: &str = "secret-six";

/// A well-formed domain-creation body
pub const CREATE_BODY: &str = r#"{"holder": "H1", "tech": "H1", "admin": "H1"}"#;

/// Registry with default configuration and registrars 5 and 6
pub async fn registry() -> Registry {
    registry_with(RegistryConfig::default()).await
}

/// Registry with custom configuration and registrars 5 and 6
pub async fn registry_with(config: RegistryConfig) -> Registry {
    let store = MemoryStore::new();
    store.add_registrar(REGISTRAR_5, SECRET_5).await;
    store.add_registrar(REGISTRAR_6, SECRET_6).await;
    Registry::new(Arc::new(store), config).expect("registry construction succeeds")
}

/// Registry plus a handle on its store, for direct state assertions
pub async fn registry_and_store() -> (Registry, MemoryStore) {
    let store = MemoryStore::new();
    store.add_registrar(REGISTRAR_5, SECRET_5).await;
    store.add_registrar(REGISTRAR_6, SECRET_6).await;
    let registry = Registry::new(Arc::new(store.clone()), RegistryConfig::default())
        .expect("registry construction succeeds");
    (registry, store)
}

/// Create a domain through the protocol, asserting success
pub async fn create_domain(registry: &Registry, name: &str, registrar: u32, secret: &str) {
    let response = registry
        .handle(
            Request::new(Method::Put, format!("/domains/{name}"))
                .with_body(CREATE_BODY)
                .with_credentials(registrar, secret),
        )
        .await;
    assert_eq!(response.status_code, 201, "creating {name}: {response:?}");
}

/// GET a path without credentials
pub async fn get(registry: &Registry, path: &str) -> Response {
    registry.handle(Request::new(Method::Get, path)).await
}

/// The `result` field of a response
pub fn result_text(response: &Response) -> String {
    response.fields["result"].as_str().unwrap_or_default().to_string()
}
