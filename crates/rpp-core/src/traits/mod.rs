//! Collaborator seams for the registry core
//!
//! The core owns lifecycle rules and the protocol mapping; everything that
//! touches durable state goes through the traits defined here.

pub mod registry_store;

pub use registry_store::{
    ContactRecord, ContactRole, DomainRecord, NewDomain, RegistrarRecord, RegistryStore,
    StoreError, StoreTx, TransferRecord,
};
