//! The `status` namespace: login, signup and logout

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::StatusService;
use crate::crypto::normalize_address;
use crate::error::StatusError;

/// json request for status_login.
#[derive(Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub address: String,
    pub password: String,
}

/// json response returned by status_login.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub address_key_id: String,
}

/// json request for status_signup.
#[derive(Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub password: String,
}

/// json response returned by status_signup.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignupResponse {
    pub address: String,
    pub pubkey: String,
    pub mnemonic: String,
}

/// json request for status_recover.
#[derive(Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RecoverRequest {
    pub mnemonic: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecoverResponse {
    pub address: String,
    pub pubkey: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LogoutResponse {
    pub address: Option<String>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for RecoverRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoverRequest").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest").finish_non_exhaustive()
    }
}

/// Account operations exposed over RPC
#[derive(Clone)]
pub struct StatusApi {
    service: Arc<StatusService>,
}

impl StatusApi {
    pub fn new(service: Arc<StatusService>) -> Self {
        Self { service }
    }

    /// Unlock an account, import its key and make it the active selection.
    /// Nothing is registered unless every step succeeds.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, StatusError> {
        let address = normalize_address(&req.address)
            .ok_or_else(|| StatusError::InvalidParameters("malformed address".to_string()))?;
        if req.password.is_empty() {
            return Err(StatusError::InvalidParameters("password is required".to_string()));
        }
        let manager = self.service.account_manager()?;
        let sessions = self.service.sessions();

        let _login = sessions.begin_login().await;
        let (account, key) = manager
            .address_to_decrypted_account(&address, &req.password)
            .await?;

        let address_key_id = sessions.import_key(key)?;
        if let Err(e) = sessions.select_account(&account.address, &address_key_id) {
            sessions.delete_key(&address_key_id);
            warn!("Could not select {}: {}", account.address, e);
            return Err(e);
        }

        info!("Logged in as {}", account.address);
        Ok(LoginResponse { address_key_id })
    }

    /// Create a new account. Failures never reveal their cause.
    pub async fn signup(&self, req: SignupRequest) -> Result<SignupResponse, StatusError> {
        if req.password.is_empty() {
            return Err(StatusError::InvalidParameters("password is required".to_string()));
        }
        let manager = self.service.account_manager()?;

        let created = manager
            .create_account(&req.password)
            .await
            .map_err(|_| StatusError::CouldNotCreateAccount)?;

        info!("Account created: {}", created.address);
        Ok(SignupResponse {
            address: created.address,
            pubkey: created.public_key,
            mnemonic: created.mnemonic,
        })
    }

    /// Rebuild an account from its recovery phrase and store it again
    pub async fn recover(&self, req: RecoverRequest) -> Result<RecoverResponse, StatusError> {
        if req.mnemonic.trim().is_empty() || req.password.is_empty() {
            return Err(StatusError::InvalidParameters(
                "mnemonic and password are required".to_string(),
            ));
        }
        let manager = self.service.account_manager()?;
        let account = manager.recover_account(req.mnemonic.trim(), &req.password).await?;

        info!("Account recovered: {}", account.address);
        Ok(RecoverResponse {
            address: account.address,
            pubkey: account.public_key,
        })
    }

    pub async fn logout(&self) -> Result<LogoutResponse, StatusError> {
        Ok(LogoutResponse {
            address: self.service.sessions().logout(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountManager, AccountStore, KdfParams};
    use crate::config::StatusServiceConfig;
    use crate::sign::MessageSigner;

    fn service() -> Arc<StatusService> {
        let service = Arc::new(StatusService::new(
            &StatusServiceConfig::default(),
            Arc::new(MessageSigner),
        ));
        service.set_account_manager(AccountManager::new(Arc::new(AccountStore::new(
            KdfParams::light(),
        ))));
        service
    }

    fn login(address: &str, password: &str) -> LoginRequest {
        LoginRequest {
            address: address.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let service = service();
        let api = service.api();

        let created = api
            .signup(SignupRequest { password: "pw123".to_string() })
            .await
            .unwrap();
        assert_eq!(created.mnemonic.split_whitespace().count(), 12);

        let res = api.login(login(&created.address, "pw123")).await.unwrap();
        assert!(!res.address_key_id.is_empty());
        assert!(service.sessions().has_key(&res.address_key_id));

        let active = service.sessions().active_account().unwrap();
        assert_eq!(active.address, created.address);
        assert_eq!(active.key_id, res.address_key_id);
    }

    #[tokio::test]
    async fn test_failed_login_registers_nothing() {
        let service = service();
        let api = service.api();
        let created = api
            .signup(SignupRequest { password: "pw123".to_string() })
            .await
            .unwrap();

        assert_eq!(
            api.login(login(&created.address, "wrongpw")).await,
            Err(StatusError::InvalidCredentials)
        );
        assert_eq!(service.sessions().key_count(), 0);
        assert!(service.sessions().active_account().is_none());

        // Retrying with the right password still works
        assert!(api.login(login(&created.address, "pw123")).await.is_ok());
        assert_eq!(service.sessions().key_count(), 1);
    }

    #[tokio::test]
    async fn test_relogin_replaces_session_key() {
        let service = service();
        let api = service.api();
        let created = api
            .signup(SignupRequest { password: "pw123".to_string() })
            .await
            .unwrap();

        let first = api.login(login(&created.address, "pw123")).await.unwrap();
        let second = api.login(login(&created.address, "pw123")).await.unwrap();
        assert_ne!(first.address_key_id, second.address_key_id);
        assert_eq!(service.sessions().key_count(), 1);

        assert_eq!(
            api.logout().await.unwrap().address,
            Some(created.address.clone())
        );
        assert_eq!(api.logout().await.unwrap().address, None);
    }

    #[tokio::test]
    async fn test_recover_restores_same_address() {
        let created = service()
            .api()
            .signup(SignupRequest { password: "pw123".to_string() })
            .await
            .unwrap();

        // A fresh keystore that has never seen the account
        let other = service();
        let api = other.api();
        let recovered = api
            .recover(RecoverRequest {
                mnemonic: created.mnemonic.clone(),
                password: "pw123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(recovered.address, created.address);
        assert_eq!(recovered.pubkey, created.pubkey);
        assert!(api.login(login(&created.address, "pw123")).await.is_ok());

        assert!(matches!(
            api.recover(RecoverRequest {
                mnemonic: "not a real phrase".to_string(),
                password: "pw123".to_string(),
            })
            .await,
            Err(StatusError::InvalidParameters(_))
        ));
    }

    #[tokio::test]
    async fn test_validation_and_missing_manager() {
        let bare = Arc::new(StatusService::new(
            &StatusServiceConfig::default(),
            Arc::new(MessageSigner),
        ));
        let api = bare.api();
        assert_eq!(
            api.login(login("0x1111111111111111111111111111111111111111", "pw"))
                .await,
            Err(StatusError::AccountManagerNotSet)
        );
        assert_eq!(
            api.signup(SignupRequest { password: "pw".to_string() }).await,
            Err(StatusError::AccountManagerNotSet)
        );

        assert!(matches!(
            api.login(login("bogus", "pw")).await,
            Err(StatusError::InvalidParameters(_))
        ));
        assert!(matches!(
            api.signup(SignupRequest { password: String::new() }).await,
            Err(StatusError::InvalidParameters(_))
        ));
    }
}
