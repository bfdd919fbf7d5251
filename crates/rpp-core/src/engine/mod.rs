//! Lifecycle engines
//!
//! One engine per resource family, plus the authenticator. Each engine
//! works through the injected [`crate::traits::RegistryStore`], one
//! transaction per operation, and signals outcomes as typed errors the
//! router maps onto the wire.

pub mod auth;
pub mod contacts;
pub mod domains;
pub mod transfers;

pub use auth::{Authenticator, Credential};
pub use contacts::ContactEngine;
pub use domains::{Availability, DomainEngine};
pub use transfers::{TransferAction, TransferEngine, TransferRequested, TransferStatus};
