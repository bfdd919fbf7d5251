//! Authentication and ownership checks
//!
//! Registrars authenticate with their integer handle and a shared secret.
//! Secrets are never stored in clear: the store keeps a salted SHA-256
//! digest and presented secrets are compared in constant time.

use std::sync::Arc;

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::Result;
use crate::traits::registry_store::RegistryStore;

/// A stored registrar credential: random salt plus SHA-256(salt || secret)
#[derive(Debug, Clone)]
pub struct Credential {
    salt: [u8; 16],
    digest: [u8; 32],
}

impl Credential {
    /// Derive a credential from a secret with a fresh random salt
    pub fn derive(secret: &str) -> Self {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = Self::digest_with(&salt, secret);
        Self { salt, digest }
    }

    /// Rebuild a credential from stored parts
    pub fn from_parts(salt: [u8; 16], digest: [u8; 32]) -> Self {
        Self { salt, digest }
    }

    /// Verify a presented secret in constant time
    pub fn verify(&self, secret: &str) -> bool {
        let presented = Self::digest_with(&self.salt, secret);
        self.digest.ct_eq(&presented).into()
    }

    /// The stored parts, for persisting
    pub fn parts(&self) -> ([u8; 16], [u8; 32]) {
        (self.salt, self.digest)
    }

    fn digest_with(salt: &[u8; 16], secret: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(secret.as_bytes());
        hasher.finalize().into()
    }
}

/// Verifies registrar credentials against the store
pub struct Authenticator {
    store: Arc<dyn RegistryStore>,
}

impl Authenticator {
    /// Create an authenticator over a store
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }

    /// True iff a registrar with this handle exists and the secret verifies
    pub async fn authenticate(&self, registrar: u32, secret: &str) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        let record = tx.find_registrar(registrar).await?;
        tx.rollback().await?;

        match record {
            Some(record) => {
                let ok = record.credential.verify(secret);
                if !ok {
                    debug!(registrar, "credential verification failed");
                }
                Ok(ok)
            }
            None => {
                debug!(registrar, "unknown registrar");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_credential_verifies_its_secret() {
        let cred = Credential::derive("hunter2");
        assert!(cred.verify("hunter2"));
        assert!(!cred.verify("hunter3"));
        assert!(!cred.verify(""));
    }

    #[test]
    fn salts_differ_between_derivations() {
        let a = Credential::derive("same");
        let b = Credential::derive("same");
        assert_ne!(a.parts().0, b.parts().0);
    }

    #[test]
    fn credential_round_trips_through_parts() {
        let cred = Credential::derive("secret");
        let (salt, digest) = cred.parts();
        let rebuilt = Credential::from_parts(salt, digest);
        assert!(rebuilt.verify("secret"));
    }
}
