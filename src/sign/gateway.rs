//! Approval gateway: the only place a decrypted key meets a sign request

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::handler::SignHandler;
use super::queue::{PendingHandle, PendingRequestTable};
use super::request::{Decision, PendingRequest, ResolutionResult, SignOutcome};
use crate::account::AccountManagerSlot;
use crate::crypto::KeyPair;
use crate::error::StatusError;
use crate::session::SessionRegistry;

pub struct ApprovalGateway {
    requests: Arc<PendingRequestTable>,
    sessions: Arc<SessionRegistry>,
    accounts: AccountManagerSlot,
    handler: Arc<dyn SignHandler>,
}

impl ApprovalGateway {
    pub fn new(
        requests: Arc<PendingRequestTable>,
        sessions: Arc<SessionRegistry>,
        accounts: AccountManagerSlot,
        handler: Arc<dyn SignHandler>,
    ) -> Self {
        Self {
            requests,
            sessions,
            accounts,
            handler,
        }
    }

    pub fn requests(&self) -> &Arc<PendingRequestTable> {
        &self.requests
    }

    /// Resolve a pending request.
    ///
    /// Only one caller can work on a given request at a time; concurrent
    /// callers get `UnknownRequest` straight away. A failed authentication
    /// leaves the request waiting so it can be retried.
    pub async fn resolve(
        &self,
        id: &str,
        decision: Decision,
        password: Option<&str>,
    ) -> Result<ResolutionResult, StatusError> {
        let entry = self.requests.entry(id).ok_or(StatusError::UnknownRequest)?;
        let _guard = entry.resolving.try_lock().map_err(|_| {
            debug!(request = %id, "Sign request is already being resolved");
            StatusError::UnknownRequest
        })?;
        // Finished between lookup and lock
        if !self.requests.contains(id) {
            return Err(StatusError::UnknownRequest);
        }

        match decision {
            Decision::Discard => {
                let result = self.requests.finish(&entry, SignOutcome::Discarded)?;
                info!(request = %id, "Sign request discarded");
                Ok(result)
            }
            Decision::Approve => {
                let password = password.ok_or(StatusError::InvalidCredentials)?;
                let request = entry.request();
                let key = self.signing_key(request, password).await?;

                let outcome = match self.handler.sign(&request.method, &request.args, &key) {
                    Ok(result) => SignOutcome::Signed { result },
                    Err(error) => {
                        warn!(request = %id, "Signing failed: {}", error);
                        SignOutcome::Failed { error }
                    }
                };
                drop(key);

                let result = self.requests.finish(&entry, outcome)?;
                match &result.outcome {
                    SignOutcome::Failed { error } => Err(StatusError::SigningFailed(error.clone())),
                    _ => {
                        info!(request = %id, "Sign request completed");
                        Ok(result)
                    }
                }
            }
        }
    }

    pub async fn approve(&self, id: &str, password: &str) -> Result<ResolutionResult, StatusError> {
        self.resolve(id, Decision::Approve, Some(password)).await
    }

    pub async fn discard(&self, id: &str) -> Result<ResolutionResult, StatusError> {
        self.resolve(id, Decision::Discard, None).await
    }

    /// Wait for a submitted request, discarding it once `timeout` elapses
    pub async fn wait(
        &self,
        handle: PendingHandle,
        timeout: Duration,
    ) -> Result<SignOutcome, StatusError> {
        let (id, mut rx) = handle.into_parts();
        loop {
            match tokio::time::timeout(timeout, &mut rx).await {
                Ok(outcome) => {
                    return outcome
                        .map_err(|_| StatusError::Internal("sign request dropped".to_string()))
                }
                Err(_) => {
                    warn!(request = %id, "Sign request timed out after {:?}", timeout);
                    match self.discard(&id).await {
                        Ok(result) => return Ok(result.outcome),
                        // Someone else is resolving it; their outcome arrives on rx
                        Err(StatusError::UnknownRequest) => continue,
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }

    /// Authenticate against the account named by the request (or the active
    /// account) and pick the key to sign with.
    async fn signing_key(
        &self,
        request: &PendingRequest,
        password: &str,
    ) -> Result<Arc<KeyPair>, StatusError> {
        let accounts = self.accounts.get()?;
        let address = match request.account()? {
            Some(address) => address,
            None => self
                .sessions
                .active_account()
                .map(|active| active.address)
                .ok_or(StatusError::InvalidCredentials)?,
        };

        let (account, key) = accounts
            .address_to_decrypted_account(&address, password)
            .await?;

        Ok(self
            .sessions
            .session_key_for(&account.address)
            .unwrap_or_else(|| Arc::new(key)))
    }
}
