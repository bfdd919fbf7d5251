//! Contract Test: Transfer State Machine
//!
//! Verifies the registrar-to-registrar transfer flow: request, query,
//! approval, rejection and cancellation, with their authorization rules.
//!
//! Constraints verified:
//! - A request by the current owner never creates a pending row
//! - At most one pending transfer exists per domain
//! - Approval reassigns the domain atomically and closes the transfer
//! - Rejection/cancellation remove the pending row without reassignment

mod common;

use common::*;
use rpp_core::protocol::{Method, Request};
use serde_json::json;

async fn post(
    registry: &rpp_core::Registry,
    path: &str,
    registrar: u32,
    secret: &str,
) -> rpp_core::Response {
    registry
        .handle(Request::new(Method::Post, path).with_credentials(registrar, secret))
        .await
}

async fn query(
    registry: &rpp_core::Registry,
    domain: &str,
    registrar: u32,
    secret: &str,
) -> rpp_core::Response {
    registry
        .handle(
            Request::new(Method::Get, format!("/domains/{domain}/transfer"))
                .with_credentials(registrar, secret),
        )
        .await
}

#[tokio::test]
async fn owner_request_is_a_noop() {
    let registry = registry().await;
    create_domain(&registry, "own.example", REGISTRAR_5, SECRET_5).await;

    let response = post(&registry, "/domains/own.example/transfer", REGISTRAR_5, SECRET_5).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(
        result_text(&response),
        "5 is already the registrar of own.example"
    );

    let response = query(&registry, "own.example", REGISTRAR_5, SECRET_5).await;
    assert_eq!(result_text(&response), "No pending transfer for own.example");
}

#[tokio::test]
async fn second_request_returns_existing_pending_transfer() {
    let registry = registry().await;
    create_domain(&registry, "move.example", REGISTRAR_5, SECRET_5).await;

    let response = post(&registry, "/domains/move.example/transfer", REGISTRAR_6, SECRET_6).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(
        result_text(&response),
        "Domain move.example transfer to registrar 6 started"
    );

    let response = post(&registry, "/domains/move.example/transfer", REGISTRAR_6, SECRET_6).await;
    assert_eq!(response.status_code, 200);
    assert!(result_text(&response)
        .starts_with("Domain move.example already has a transfer to registrar 6 pending"));

    let response = query(&registry, "move.example", REGISTRAR_5, SECRET_5).await;
    assert!(result_text(&response)
        .starts_with("Domain move.example has a transfer to registrar 6 pending"));
}

#[tokio::test]
async fn approval_reassigns_the_domain_and_closes_the_transfer() {
    let registry = registry().await;
    create_domain(&registry, "deal.example", REGISTRAR_5, SECRET_5).await;

    post(&registry, "/domains/deal.example/transfer", REGISTRAR_6, SECRET_6).await;

    let response = post(
        &registry,
        "/domains/deal.example/transfer/approval",
        REGISTRAR_5,
        SECRET_5,
    )
    .await;
    assert_eq!(response.status_code, 200);
    assert_eq!(result_text(&response), "Transfer of deal.example approved");

    let response = get(&registry, "/domains/deal.example").await;
    assert_eq!(response.fields["registrar"], json!(REGISTRAR_6));

    let response = query(&registry, "deal.example", REGISTRAR_6, SECRET_6).await;
    assert_eq!(result_text(&response), "No pending transfer for deal.example");
}

#[tokio::test]
async fn approval_requires_the_current_registrar() {
    let registry = registry().await;
    create_domain(&registry, "steal.example", REGISTRAR_5, SECRET_5).await;
    post(&registry, "/domains/steal.example/transfer", REGISTRAR_6, SECRET_6).await;

    // The requester cannot approve their own transfer
    let response = post(
        &registry,
        "/domains/steal.example/transfer/approval",
        REGISTRAR_6,
        SECRET_6,
    )
    .await;
    assert_eq!(response.status_code, 403);
    assert_eq!(response.status_message, "Not yours");
    assert_eq!(result_text(&response), "This is not your domain currently");

    let response = get(&registry, "/domains/steal.example").await;
    assert_eq!(response.fields["registrar"], json!(REGISTRAR_5));
}

#[tokio::test]
async fn rejection_removes_the_transfer_without_reassignment() {
    let registry = registry().await;
    create_domain(&registry, "nope.example", REGISTRAR_5, SECRET_5).await;
    post(&registry, "/domains/nope.example/transfer", REGISTRAR_6, SECRET_6).await;

    let response = post(
        &registry,
        "/domains/nope.example/transfer/rejection",
        REGISTRAR_5,
        SECRET_5,
    )
    .await;
    assert_eq!(response.status_code, 200);
    assert_eq!(result_text(&response), "Transfer of nope.example rejected");

    let response = get(&registry, "/domains/nope.example").await;
    assert_eq!(response.fields["registrar"], json!(REGISTRAR_5));

    let response = query(&registry, "nope.example", REGISTRAR_5, SECRET_5).await;
    assert_eq!(result_text(&response), "No pending transfer for nope.example");

    // A fresh transfer can now be requested
    let response = post(&registry, "/domains/nope.example/transfer", REGISTRAR_6, SECRET_6).await;
    assert!(result_text(&response).contains("started"));
}

#[tokio::test]
async fn cancellation_belongs_to_the_initiator() {
    let registry = registry().await;
    create_domain(&registry, "back.example", REGISTRAR_5, SECRET_5).await;
    post(&registry, "/domains/back.example/transfer", REGISTRAR_6, SECRET_6).await;

    // The losing registrar cannot cancel someone else's request
    let response = post(
        &registry,
        "/domains/back.example/transfer/cancelation",
        REGISTRAR_5,
        SECRET_5,
    )
    .await;
    assert_eq!(response.status_code, 403);
    assert_eq!(result_text(&response), "This is not your transfer");

    let response = post(
        &registry,
        "/domains/back.example/transfer/cancelation",
        REGISTRAR_6,
        SECRET_6,
    )
    .await;
    assert_eq!(response.status_code, 200);
    assert_eq!(result_text(&response), "Transfer of back.example cancelled");

    let response = query(&registry, "back.example", REGISTRAR_5, SECRET_5).await;
    assert_eq!(result_text(&response), "No pending transfer for back.example");
}

#[tokio::test]
async fn actions_without_a_pending_transfer_are_not_found() {
    let registry = registry().await;
    create_domain(&registry, "idle.example", REGISTRAR_5, SECRET_5).await;

    for action in ["approval", "rejection", "cancelation"] {
        let response = post(
            &registry,
            &format!("/domains/idle.example/transfer/{action}"),
            REGISTRAR_5,
            SECRET_5,
        )
        .await;
        assert_eq!(response.status_code, 404, "{action}");
        assert_eq!(response.status_message, "No transfer", "{action}");
    }
}

#[tokio::test]
async fn unknown_action_is_a_client_error() {
    let registry = registry().await;
    create_domain(&registry, "odd.example", REGISTRAR_5, SECRET_5).await;
    post(&registry, "/domains/odd.example/transfer", REGISTRAR_6, SECRET_6).await;

    let response = post(
        &registry,
        "/domains/odd.example/transfer/escalation",
        REGISTRAR_5,
        SECRET_5,
    )
    .await;
    assert_eq!(response.status_code, 400);
    assert_eq!(response.status_message, "Unknown transfer extra command");
}

#[tokio::test]
async fn transfer_of_unknown_domain_is_not_found() {
    let registry = registry().await;

    let response = post(&registry, "/domains/ghost.example/transfer", REGISTRAR_6, SECRET_6).await;
    assert_eq!(response.status_code, 404);
    assert_eq!(result_text(&response), "Domain ghost.example NOT found");
}

#[tokio::test]
async fn transfers_require_authentication() {
    let registry = registry().await;
    create_domain(&registry, "sec.example", REGISTRAR_5, SECRET_5).await;

    let response = registry
        .handle(Request::new(Method::Post, "/domains/sec.example/transfer"))
        .await;
    assert_eq!(response.status_code, 401);

    let response = registry
        .handle(Request::new(Method::Get, "/domains/sec.example/transfer"))
        .await;
    assert_eq!(response.status_code, 401);

    let response = registry
        .handle(
            Request::new(Method::Post, "/domains/sec.example/transfer")
                .with_credentials(REGISTRAR_6, "bad"),
        )
        .await;
    assert_eq!(response.status_code, 401);
    assert_eq!(response.status_message, "Wrong password");
}
