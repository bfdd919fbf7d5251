// # rpp-core
//
// Core library for the RPP registry backend: a minimal domain-name registry
// under a single top-level label, driven by a JSON-over-HTTP protocol with
// EPP-like semantics.
//
// ## Architecture Overview
//
// - **RegistryStore**: Trait for transactional access to persisted state
// - **Authenticator**: Registrar credential and ownership checks
// - **DomainEngine / ContactEngine / TransferEngine**: Lifecycle rules and
//   the registrar-to-registrar transfer state machine
// - **Registry**: Router that maps (method, path, body, credentials) tuples
//   onto engine operations and builds the response envelope
//
// ## Design Principles
//
// 1. **Transport-free core**: HTTP binding lives in the daemon crate
// 2. **Injected storage**: The core never opens connections itself
// 3. **One transaction per operation**: State is re-read then written
//    within a single unit of work; conflicts surface, never auto-retry
// 4. **Typed outcomes**: Engines signal results and failures as types,
//    serialized only at the protocol boundary

pub mod config;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod router;
pub mod schema;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::RegistryConfig;
pub use engine::{Authenticator, ContactEngine, DomainEngine, TransferEngine};
pub use error::{Error, Result};
pub use protocol::{Method, Request, Response};
pub use router::Registry;
pub use store::MemoryStore;
pub use traits::RegistryStore;
