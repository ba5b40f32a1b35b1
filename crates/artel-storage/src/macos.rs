//! macOS Keychain implementation.

use crate::{SecureStorage, StorageError, StorageResult};
use security_framework::item::{ItemClass, ItemSearchOptions, Limit, SearchResult};
use security_framework::passwords::{delete_generic_password, set_generic_password};
use tracing::debug;

/// Keychain-based secure storage for macOS.
pub struct KeychainStore {
    service_name: String,
}

/// Whether a Security framework error means the item simply does not exist.
fn is_not_found(err: &impl std::fmt::Display) -> bool {
    let text = err.to_string().to_lowercase();
    text.contains("not found")
        || text.contains("could not be found")
        || text.contains("-25300")
        || text.contains("errsecitemnotfound")
}

impl KeychainStore {
    /// Create a new Keychain storage instance.
    pub fn new(service_name: &str) -> StorageResult<Self> {
        Ok(Self {
            service_name: service_name.to_string(),
        })
    }

    fn lookup(&self, key: &str) -> StorageResult<Option<String>> {
        let mut search = ItemSearchOptions::new();
        search
            .class(ItemClass::generic_password())
            .service(&self.service_name)
            .account(key)
            .limit(Limit::Max(1))
            .load_data(true);

        let results = match search.search() {
            Ok(results) => results,
            Err(err) if is_not_found(&err) => return Ok(None),
            Err(err) => {
                return Err(StorageError::Platform(format!(
                    "Keychain lookup failed: {}",
                    err
                )))
            }
        };

        match results.into_iter().next() {
            Some(SearchResult::Data(data)) => {
                let value =
                    String::from_utf8(data).map_err(|e| StorageError::Encoding(e.to_string()))?;
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }
}

impl SecureStorage for KeychainStore {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        debug!(service = %self.service_name, key = %key, "Setting keychain item");

        // Replace any existing item for the account
        let _ = delete_generic_password(&self.service_name, key);

        set_generic_password(&self.service_name, key, value.as_bytes())
            .map_err(|e| StorageError::Platform(format!("Keychain write failed: {}", e)))
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        debug!(service = %self.service_name, key = %key, "Getting keychain item");
        self.lookup(key)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        debug!(service = %self.service_name, key = %key, "Deleting keychain item");

        match delete_generic_password(&self.service_name, key) {
            Ok(()) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(StorageError::Platform(format!(
                "Keychain delete failed: {}",
                err
            ))),
        }
    }
}
