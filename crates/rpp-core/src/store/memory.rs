// # Memory Registry Store
//
// In-memory implementation of RegistryStore.
//
// ## Purpose
//
// Provides a self-contained store for tests and single-node deployments
// that do not need durability. All state is lost on restart.
//
// ## Transactions
//
// A transaction clones the current state as a snapshot and works on the
// copy. Commit re-checks the store version under the write lock; if another
// transaction committed in between, the commit fails with
// `StoreError::Conflict` and the writes are discarded. This mirrors the
// conflict signal a serializable database raises, so the engines exercise
// the same error path as with a real backend.
//
// ## Invariants enforced here
//
// - Domain names are unique
// - At most one pending transfer per domain
// - Contact handles and transfer ids are assigned monotonically

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::engine::auth::Credential;
use crate::traits::registry_store::{
    ContactRecord, ContactRole, DomainRecord, NewDomain, RegistrarRecord, RegistryStore,
    StoreError, StoreTx, TransferRecord,
};

#[derive(Debug, Clone)]
struct State {
    version: u64,
    domains: HashMap<String, DomainRecord>,
    contacts: HashMap<u64, ContactRecord>,
    registrars: HashMap<u32, RegistrarRecord>,
    transfers: HashMap<u64, TransferRecord>,
    next_handle: u64,
    next_transfer_id: u64,
}

impl State {
    fn new() -> Self {
        Self {
            version: 0,
            domains: HashMap::new(),
            contacts: HashMap::new(),
            registrars: HashMap::new(),
            transfers: HashMap::new(),
            next_handle: 1,
            next_transfer_id: 1,
        }
    }

    fn pending_transfer(&self, domain: &str) -> Option<&TransferRecord> {
        self.transfers
            .values()
            .find(|t| !t.completed && t.domain == domain)
    }
}

/// In-memory registry store
///
/// Cloning is cheap; clones share the same state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(State::new())),
        }
    }

    /// Provision a registrar account
    ///
    /// Registrar management is out of scope for the protocol, so accounts
    /// are seeded directly rather than through a transaction.
    pub async fn add_registrar(&self, handle: u32, secret: &str) {
        let mut guard = self.inner.write().await;
        guard.registrars.insert(
            handle,
            RegistrarRecord {
                handle,
                credential: Credential::derive(secret),
            },
        );
        guard.version += 1;
    }

    /// Number of committed domains, outside any transaction
    pub async fn domain_count(&self) -> u64 {
        self.inner.read().await.domains.len() as u64
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.inner.read().await;
        Ok(Box::new(MemoryTx {
            inner: Arc::clone(&self.inner),
            base_version: guard.version,
            working: guard.clone(),
        }))
    }
}

struct MemoryTx {
    inner: Arc<RwLock<State>>,
    base_version: u64,
    working: State,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn count_domains(&mut self) -> Result<u64, StoreError> {
        Ok(self.working.domains.len() as u64)
    }

    async fn find_domain(&mut self, name: &str) -> Result<Option<DomainRecord>, StoreError> {
        Ok(self.working.domains.get(name).cloned())
    }

    async fn list_domains(&mut self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.working.domains.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn insert_domain(&mut self, domain: NewDomain) -> Result<(), StoreError> {
        if self.working.domains.contains_key(&domain.name) {
            return Err(StoreError::AlreadyExists);
        }
        let record = DomainRecord {
            name: domain.name.clone(),
            holder: domain.holder,
            tech: domain.tech,
            admin: domain.admin,
            registrar: domain.registrar,
            created: Utc::now(),
        };
        self.working.domains.insert(domain.name, record);
        Ok(())
    }

    async fn update_domain_contact(
        &mut self,
        name: &str,
        role: ContactRole,
        handle: &str,
    ) -> Result<u64, StoreError> {
        match self.working.domains.get_mut(name) {
            Some(record) => {
                match role {
                    ContactRole::Tech => record.tech = handle.to_string(),
                    ContactRole::Admin => record.admin = handle.to_string(),
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn reassign_domain(&mut self, name: &str, registrar: u32) -> Result<u64, StoreError> {
        match self.working.domains.get_mut(name) {
            Some(record) => {
                record.registrar = registrar;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_domain(&mut self, name: &str) -> Result<u64, StoreError> {
        Ok(if self.working.domains.remove(name).is_some() {
            1
        } else {
            0
        })
    }

    async fn count_contacts(&mut self) -> Result<u64, StoreError> {
        Ok(self.working.contacts.len() as u64)
    }

    async fn find_contact(&mut self, handle: u64) -> Result<Option<ContactRecord>, StoreError> {
        Ok(self.working.contacts.get(&handle).cloned())
    }

    async fn insert_contact(&mut self, name: &str) -> Result<u64, StoreError> {
        let handle = self.working.next_handle;
        self.working.next_handle += 1;
        self.working.contacts.insert(
            handle,
            ContactRecord {
                handle,
                name: name.to_string(),
                created: Utc::now(),
            },
        );
        Ok(handle)
    }

    async fn delete_contact(&mut self, handle: u64) -> Result<u64, StoreError> {
        Ok(if self.working.contacts.remove(&handle).is_some() {
            1
        } else {
            0
        })
    }

    async fn find_registrar(&mut self, handle: u32) -> Result<Option<RegistrarRecord>, StoreError> {
        Ok(self.working.registrars.get(&handle).cloned())
    }

    async fn find_pending_transfer(
        &mut self,
        domain: &str,
    ) -> Result<Option<TransferRecord>, StoreError> {
        Ok(self.working.pending_transfer(domain).cloned())
    }

    async fn insert_transfer(&mut self, domain: &str, winner: u32) -> Result<u64, StoreError> {
        if self.working.pending_transfer(domain).is_some() {
            return Err(StoreError::AlreadyExists);
        }
        let id = self.working.next_transfer_id;
        self.working.next_transfer_id += 1;
        self.working.transfers.insert(
            id,
            TransferRecord {
                id,
                domain: domain.to_string(),
                winner,
                created: Utc::now(),
                completed: false,
            },
        );
        Ok(id)
    }

    async fn complete_transfer(&mut self, domain: &str) -> Result<u64, StoreError> {
        let id = self.working.pending_transfer(domain).map(|t| t.id);
        match id {
            Some(id) => {
                if let Some(record) = self.working.transfers.get_mut(&id) {
                    record.completed = true;
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_pending_transfer(&mut self, domain: &str) -> Result<u64, StoreError> {
        let id = self.working.pending_transfer(domain).map(|t| t.id);
        match id {
            Some(id) => {
                self.working.transfers.remove(&id);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        if guard.version != self.base_version {
            return Err(StoreError::Conflict);
        }
        let mut committed = self.working;
        committed.version = self.base_version + 1;
        *guard = committed;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // The working copy is simply dropped.
        Ok(())
    }
}
