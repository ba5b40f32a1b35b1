//! High-level API for the session credential store.

use crate::{SecureStorage, StorageKeys, StorageResult};
use std::sync::RwLock;
use tracing::debug;

/// Durable store for the session artifacts: token pair and role tag.
///
/// The store is the exclusive owner of the durable session copies. All
/// operations go through an `RwLock` so that `clear_all` is atomic with
/// respect to concurrent reads: a reader never observes a partially
/// cleared session.
pub struct CredentialStore {
    storage: RwLock<Box<dyn SecureStorage>>,
}

impl CredentialStore {
    /// Create a new credential store over the given storage backend.
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self {
            storage: RwLock::new(storage),
        }
    }

    /// Store both tokens of a session.
    pub fn set_token_pair(&self, access: &str, refresh: &str) -> StorageResult<()> {
        let storage = self.storage.write().expect("credential store lock poisoned");
        storage.set(StorageKeys::ACCESS_TOKEN, access)?;
        storage.set(StorageKeys::REFRESH_TOKEN, refresh)?;
        debug!("Stored session token pair");
        Ok(())
    }

    /// Cache the resolved role tag.
    pub fn set_user_type(&self, user_type: &str) -> StorageResult<()> {
        let storage = self.storage.write().expect("credential store lock poisoned");
        storage.set(StorageKeys::USER_TYPE, user_type)
    }

    /// Retrieve the access token.
    pub fn access_token(&self) -> StorageResult<Option<String>> {
        let storage = self.storage.read().expect("credential store lock poisoned");
        storage.get(StorageKeys::ACCESS_TOKEN)
    }

    /// Retrieve the refresh token.
    pub fn refresh_token(&self) -> StorageResult<Option<String>> {
        let storage = self.storage.read().expect("credential store lock poisoned");
        storage.get(StorageKeys::REFRESH_TOKEN)
    }

    /// Retrieve the cached role tag.
    pub fn user_type(&self) -> StorageResult<Option<String>> {
        let storage = self.storage.read().expect("credential store lock poisoned");
        storage.get(StorageKeys::USER_TYPE)
    }

    /// Check whether an access token is present.
    pub fn has_session(&self) -> StorageResult<bool> {
        let storage = self.storage.read().expect("credential store lock poisoned");
        storage.has(StorageKeys::ACCESS_TOKEN)
    }

    /// Delete every stored session artifact.
    ///
    /// Holds the write lock for the whole sweep; every key is attempted
    /// even when an earlier delete fails, and the first failure is
    /// reported.
    pub fn clear_all(&self) -> StorageResult<()> {
        let storage = self.storage.write().expect("credential store lock poisoned");

        let mut first_error = None;
        for key in [
            StorageKeys::ACCESS_TOKEN,
            StorageKeys::REFRESH_TOKEN,
            StorageKeys::USER_TYPE,
        ] {
            if let Err(err) = storage.delete(key) {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            None => {
                debug!("Cleared session artifacts");
                Ok(())
            }
            Some(err) => Err(err),
        }
    }
}
