// # Registry Store Trait
//
// Defines the interface for transactional access to persisted registry
// state: domains, contacts, registrars and transfers.
//
// ## Purpose
//
// The store is the only holder of durable state. The engines re-read then
// write within one transactional unit of work per request; no state is
// cached across requests.
//
// ## Implementations
//
// - Memory-based: snapshot transactions with optimistic commit
// - Future: PostgreSQL at read-committed with serialization detection

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::auth::Credential;

/// Errors surfaced by store implementations
///
/// `Conflict` signals a detected serialization/isolation violation. The
/// caller must roll back and surface it; retrying is never done at this
/// layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint was violated
    #[error("row already exists")]
    AlreadyExists,

    /// The transaction lost a serialization conflict
    #[error("transaction conflict")]
    Conflict,

    /// Backend-specific failure
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// A registered domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Fully qualified name, globally unique, always lowercase
    pub name: String,
    /// Handle of the registrant contact
    pub holder: String,
    /// Handle of the technical contact
    pub tech: String,
    /// Handle of the administrative contact
    pub admin: String,
    /// Sponsoring registrar
    pub registrar: u32,
    /// Registration time
    pub created: DateTime<Utc>,
}

/// Fields for a domain insertion; the store stamps the creation time
#[derive(Debug, Clone)]
pub struct NewDomain {
    pub name: String,
    pub holder: String,
    pub tech: String,
    pub admin: String,
    pub registrar: u32,
}

/// Which contact reference of a domain a patch updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactRole {
    Tech,
    Admin,
}

impl ContactRole {
    /// Human-readable role name used in wire messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tech => "tech",
            Self::Admin => "admin",
        }
    }
}

/// A contact record; handles are assigned by the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRecord {
    pub handle: u64,
    pub name: String,
    pub created: DateTime<Utc>,
}

/// A registrar account
///
/// Read-only from the core's perspective; used for authentication and
/// ownership comparisons only.
#[derive(Debug, Clone)]
pub struct RegistrarRecord {
    pub handle: u32,
    pub credential: Credential,
}

/// A domain transfer row
///
/// At most one transfer with `completed = false` may exist per domain at a
/// time; implementations enforce this on insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: u64,
    pub domain: String,
    /// Registrar that requested the transfer and gains the domain on approval
    pub winner: u32,
    pub created: DateTime<Utc>,
    pub completed: bool,
}

/// Factory for transactional units of work
///
/// # Thread Safety
///
/// Implementations must be safe to share across tasks; each request opens
/// its own transaction.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Open a new transaction
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
}

/// One transactional unit of work over the registry tables
///
/// All reads observe a consistent snapshot. Writes become visible only on
/// [`StoreTx::commit`]; dropping a transaction without committing discards
/// every write, exactly like an explicit [`StoreTx::rollback`].
///
/// Row-mutating operations return the affected-row count so callers can
/// verify that a transition touched exactly the rows it expected.
#[async_trait]
pub trait StoreTx: Send {
    /// Number of registered domains
    async fn count_domains(&mut self) -> Result<u64, StoreError>;

    /// Look up a domain by name
    async fn find_domain(&mut self, name: &str) -> Result<Option<DomainRecord>, StoreError>;

    /// All registered domain names
    async fn list_domains(&mut self) -> Result<Vec<String>, StoreError>;

    /// Insert a domain
    ///
    /// Returns [`StoreError::AlreadyExists`] if the name is taken.
    async fn insert_domain(&mut self, domain: NewDomain) -> Result<(), StoreError>;

    /// Update one contact reference of a domain, returning rows affected
    async fn update_domain_contact(
        &mut self,
        name: &str,
        role: ContactRole,
        handle: &str,
    ) -> Result<u64, StoreError>;

    /// Reassign the sponsoring registrar, returning rows affected
    async fn reassign_domain(&mut self, name: &str, registrar: u32) -> Result<u64, StoreError>;

    /// Delete a domain, returning rows affected
    async fn delete_domain(&mut self, name: &str) -> Result<u64, StoreError>;

    /// Number of contacts
    async fn count_contacts(&mut self) -> Result<u64, StoreError>;

    /// Look up a contact by handle
    async fn find_contact(&mut self, handle: u64) -> Result<Option<ContactRecord>, StoreError>;

    /// Insert a contact, returning the newly assigned handle
    async fn insert_contact(&mut self, name: &str) -> Result<u64, StoreError>;

    /// Delete a contact, returning rows affected
    async fn delete_contact(&mut self, handle: u64) -> Result<u64, StoreError>;

    /// Look up a registrar account
    async fn find_registrar(&mut self, handle: u32) -> Result<Option<RegistrarRecord>, StoreError>;

    /// The pending (not completed) transfer for a domain, if any
    async fn find_pending_transfer(
        &mut self,
        domain: &str,
    ) -> Result<Option<TransferRecord>, StoreError>;

    /// Insert a pending transfer, returning its id
    ///
    /// Returns [`StoreError::AlreadyExists`] if the domain already has a
    /// pending transfer. This uniqueness guarantee belongs to the store, not
    /// to the callers.
    async fn insert_transfer(&mut self, domain: &str, winner: u32) -> Result<u64, StoreError>;

    /// Mark the pending transfer of a domain completed, returning rows affected
    async fn complete_transfer(&mut self, domain: &str) -> Result<u64, StoreError>;

    /// Delete the pending transfer of a domain, returning rows affected
    async fn delete_pending_transfer(&mut self, domain: &str) -> Result<u64, StoreError>;

    /// Commit the transaction
    ///
    /// Returns [`StoreError::Conflict`] if another transaction committed in
    /// between; the writes are discarded in that case.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard the transaction explicitly
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
