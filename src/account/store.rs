//! Account storage: the password-encrypted keystore behind the account API

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::auth::{decrypt_data, encrypt_data, hash_password, verify_password, AuthError, KdfParams};
use super::recovery::{RecoveryError, RecoveryKey};
use super::types::{Account, Address, CreatedAccount};
use crate::crypto::{normalize_address, KeyPair};

#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("account not found")]
    AccountNotFound,
    #[error("account already exists")]
    AccountAlreadyExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("auth error: {0:?}")]
    Auth(AuthError),
    #[error("recovery error: {0:?}")]
    Recovery(RecoveryError),
    #[error("keystore corrupted: {0}")]
    Corrupted(String),
    #[error("keystore io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("keystore serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("keystore task failed: {0}")]
    Task(String),
}

impl From<AuthError> for KeystoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidPassword | AuthError::DecryptionFailed => {
                KeystoreError::InvalidCredentials
            }
            other => KeystoreError::Auth(other),
        }
    }
}

impl From<RecoveryError> for KeystoreError {
    fn from(err: RecoveryError) -> Self {
        KeystoreError::Recovery(err)
    }
}

/// Capability to unlock and create accounts from passwords.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Decrypt the signing key of `address` with `password`.
    async fn decrypt_account(
        &self,
        address: &str,
        password: &str,
    ) -> Result<(Account, KeyPair), KeystoreError>;

    /// Create a brand-new account protected by `password`.
    async fn create_account(&self, password: &str) -> Result<CreatedAccount, KeystoreError>;

    /// Re-import an account from its recovery phrase.
    async fn recover_account(&self, mnemonic: &str, password: &str)
        -> Result<Account, KeystoreError>;
}

struct StoreInner {
    accounts: RwLock<HashMap<Address, Account>>,
    keystore_dir: Option<PathBuf>,
    kdf: KdfParams,
}

/// Account store, optionally persisted as one JSON file per account.
#[derive(Clone)]
pub struct AccountStore {
    inner: Arc<StoreInner>,
}

impl AccountStore {
    /// Create a new in-memory account store
    pub fn new(kdf: KdfParams) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                accounts: RwLock::new(HashMap::new()),
                keystore_dir: None,
                kdf,
            }),
        }
    }

    /// Open (or create) a keystore directory and load every account in it
    pub fn open(dir: impl AsRef<Path>, kdf: KdfParams) -> Result<Self, KeystoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut accounts = HashMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<Account>(&content) {
                Ok(account) => {
                    accounts.insert(account.address.clone(), account);
                }
                Err(e) => warn!("Skipping unreadable keystore file {:?}: {}", path, e),
            }
        }
        info!("Keystore opened at {:?} ({} accounts)", dir, accounts.len());

        Ok(Self {
            inner: Arc::new(StoreInner {
                accounts: RwLock::new(accounts),
                keystore_dir: Some(dir),
                kdf,
            }),
        })
    }

    /// Known account addresses
    pub fn addresses(&self) -> Vec<Address> {
        match self.inner.accounts.read() {
            Ok(accounts) => accounts.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        }
    }

    pub fn get(&self, address: &str) -> Option<Account> {
        let address = normalize_address(address)?;
        let accounts = self.inner.accounts.read().ok()?;
        accounts.get(&address).cloned()
    }

    fn create_account_sync(&self, password: &str) -> Result<CreatedAccount, KeystoreError> {
        let recovery = RecoveryKey::generate()?;
        let keypair = recovery.derive_keypair(password)?;
        let account = self.seal(&keypair, password)?;
        self.insert(account.clone(), false)?;

        debug!("Created account {}", account.address);
        Ok(CreatedAccount {
            address: account.address,
            public_key: account.public_key,
            mnemonic: recovery.to_phrase(),
        })
    }

    fn decrypt_account_sync(
        &self,
        address: &str,
        password: &str,
    ) -> Result<(Account, KeyPair), KeystoreError> {
        let account = self.get(address).ok_or(KeystoreError::AccountNotFound)?;

        verify_password(password, &account.password_hash)?;
        let secret = decrypt_data(
            &account.signing_key_encrypted,
            password,
            &account.salt,
            account.pbkdf2_rounds,
        )?;
        let keypair = KeyPair::from_secret(&secret).map_err(KeystoreError::Corrupted)?;

        if keypair.public_key_hex() != account.public_key {
            return Err(KeystoreError::Corrupted(format!(
                "decrypted key does not match stored public key for {}",
                account.address
            )));
        }

        Ok((account, keypair))
    }

    fn recover_account_sync(&self, mnemonic: &str, password: &str) -> Result<Account, KeystoreError> {
        let recovery = RecoveryKey::from_phrase(mnemonic)?;
        let keypair = recovery.derive_keypair(password)?;

        if let Some(existing) = self.get(&keypair.address()) {
            return Ok(existing);
        }

        let account = self.seal(&keypair, password)?;
        self.insert(account.clone(), true)?;
        info!("Recovered account {}", account.address);
        Ok(account)
    }

    /// Build an encrypted account record for `keypair`
    fn seal(&self, keypair: &KeyPair, password: &str) -> Result<Account, KeystoreError> {
        let (password_hash, salt) = hash_password(password, &self.inner.kdf)?;
        let signing_key_encrypted = encrypt_data(
            keypair.secret_bytes().as_slice(),
            password,
            &salt,
            self.inner.kdf.pbkdf2_rounds,
        )?;

        Ok(Account {
            address: keypair.address(),
            public_key: keypair.public_key_hex(),
            password_hash,
            salt,
            signing_key_encrypted,
            pbkdf2_rounds: self.inner.kdf.pbkdf2_rounds,
            created_at: chrono::Utc::now().timestamp_millis() as u64,
        })
    }

    fn insert(&self, account: Account, allow_existing: bool) -> Result<(), KeystoreError> {
        {
            let mut accounts = self
                .inner
                .accounts
                .write()
                .map_err(|_| KeystoreError::Task("account map poisoned".to_string()))?;
            if accounts.contains_key(&account.address) && !allow_existing {
                return Err(KeystoreError::AccountAlreadyExists);
            }
            accounts.insert(account.address.clone(), account.clone());
        }

        if let Some(dir) = &self.inner.keystore_dir {
            let path = dir.join(format!("{}.json", account.address));
            let json = serde_json::to_string_pretty(&account)?;
            if let Err(e) = fs::write(&path, json) {
                // Keep memory and disk consistent
                if let Ok(mut accounts) = self.inner.accounts.write() {
                    accounts.remove(&account.address);
                }
                return Err(e.into());
            }
        }
        Ok(())
    }
}

fn join_error(e: tokio::task::JoinError) -> KeystoreError {
    KeystoreError::Task(e.to_string())
}

#[async_trait]
impl CredentialStore for AccountStore {
    async fn decrypt_account(
        &self,
        address: &str,
        password: &str,
    ) -> Result<(Account, KeyPair), KeystoreError> {
        let store = self.clone();
        let (address, password) = (address.to_string(), zeroize::Zeroizing::new(password.to_string()));
        tokio::task::spawn_blocking(move || store.decrypt_account_sync(&address, &password))
            .await
            .map_err(join_error)?
    }

    async fn create_account(&self, password: &str) -> Result<CreatedAccount, KeystoreError> {
        let store = self.clone();
        let password = zeroize::Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || store.create_account_sync(&password))
            .await
            .map_err(join_error)?
    }

    async fn recover_account(
        &self,
        mnemonic: &str,
        password: &str,
    ) -> Result<Account, KeystoreError> {
        let store = self.clone();
        let mnemonic = zeroize::Zeroizing::new(mnemonic.to_string());
        let password = zeroize::Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || store.recover_account_sync(&mnemonic, &password))
            .await
            .map_err(join_error)?
    }
}
