//! Account manager: translates keystore failures into the public error taxonomy

use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use super::store::{CredentialStore, KeystoreError};
use super::types::{Account, CreatedAccount};
use crate::crypto::KeyPair;
use crate::error::StatusError;

#[derive(Clone)]
pub struct AccountManager {
    store: Arc<dyn CredentialStore>,
}

impl AccountManager {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Unlock an account. Unknown addresses and wrong passwords are
    /// reported identically.
    pub async fn address_to_decrypted_account(
        &self,
        address: &str,
        password: &str,
    ) -> Result<(Account, KeyPair), StatusError> {
        self.store
            .decrypt_account(address, password)
            .await
            .map_err(|e| {
                match &e {
                    KeystoreError::AccountNotFound | KeystoreError::InvalidCredentials => {
                        debug!("Unlock rejected for {}", address)
                    }
                    other => warn!("Unlock failed for {}: {}", address, other),
                }
                StatusError::InvalidCredentials
            })
    }

    pub async fn create_account(&self, password: &str) -> Result<CreatedAccount, StatusError> {
        self.store.create_account(password).await.map_err(|e| {
            warn!("Account creation failed: {}", e);
            StatusError::CouldNotCreateAccount
        })
    }

    pub async fn recover_account(
        &self,
        mnemonic: &str,
        password: &str,
    ) -> Result<Account, StatusError> {
        self.store
            .recover_account(mnemonic, password)
            .await
            .map_err(|e| match e {
                KeystoreError::Recovery(_) => {
                    StatusError::InvalidParameters("invalid recovery phrase".to_string())
                }
                other => {
                    warn!("Account recovery failed: {}", other);
                    StatusError::CouldNotCreateAccount
                }
            })
    }
}

/// Late-bound account manager shared by the service and the approval gateway.
#[derive(Clone, Default)]
pub struct AccountManagerSlot(Arc<RwLock<Option<AccountManager>>>);

impl AccountManagerSlot {
    pub fn set(&self, manager: AccountManager) {
        let mut slot = self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(manager);
    }

    pub fn get(&self) -> Result<AccountManager, StatusError> {
        let slot = self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.clone().ok_or(StatusError::AccountManagerNotSet)
    }

    pub fn is_set(&self) -> bool {
        self.get().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountStore, KdfParams};
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn decrypt_account(
            &self,
            _address: &str,
            _password: &str,
        ) -> Result<(Account, KeyPair), KeystoreError> {
            Err(KeystoreError::Io(std::io::Error::other("disk on fire")))
        }

        async fn create_account(&self, _password: &str) -> Result<CreatedAccount, KeystoreError> {
            Err(KeystoreError::Io(std::io::Error::other("entropy source unavailable")))
        }

        async fn recover_account(
            &self,
            _mnemonic: &str,
            _password: &str,
        ) -> Result<Account, KeystoreError> {
            Err(KeystoreError::Io(std::io::Error::other("read only")))
        }
    }

    #[tokio::test]
    async fn test_unlock_errors_are_indistinguishable() {
        let manager = AccountManager::new(Arc::new(AccountStore::new(KdfParams::light())));
        let created = manager.create_account("pw123").await.unwrap();

        let wrong = manager
            .address_to_decrypted_account(&created.address, "nope")
            .await
            .err();
        let unknown = manager
            .address_to_decrypted_account("0x1111111111111111111111111111111111111111", "pw123")
            .await
            .err();
        assert_eq!(wrong, Some(StatusError::InvalidCredentials));
        assert_eq!(wrong, unknown);
    }

    #[tokio::test]
    async fn test_underlying_causes_are_hidden() {
        let manager = AccountManager::new(Arc::new(BrokenStore));
        assert_eq!(
            manager.create_account("pw").await.err(),
            Some(StatusError::CouldNotCreateAccount)
        );
        assert_eq!(
            manager.address_to_decrypted_account("0x00", "pw").await.err(),
            Some(StatusError::InvalidCredentials)
        );
        assert_eq!(
            manager.recover_account("words", "pw").await.err(),
            Some(StatusError::CouldNotCreateAccount)
        );
    }

    #[test]
    fn test_slot_requires_injection() {
        let slot = AccountManagerSlot::default();
        assert!(!slot.is_set());
        assert!(matches!(slot.get(), Err(StatusError::AccountManagerNotSet)));

        slot.set(AccountManager::new(Arc::new(BrokenStore)));
        assert!(slot.is_set());
    }
}
