//! Status service: wires the session registry, the pending request table and
//! the approval gateway together and plugs into the node lifecycle.

pub mod api;

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::account::{AccountManager, AccountManagerSlot};
use crate::config::StatusServiceConfig;
use crate::error::StatusError;
use crate::session::SessionRegistry;
use crate::sign::{ApprovalGateway, EventEmitter, PendingRequestTable, SignHandler};

pub use api::{
    LoginRequest, LoginResponse, LogoutResponse, RecoverRequest, RecoverResponse, SignupRequest,
    SignupResponse, StatusApi,
};

pub const STATUS_NAMESPACE: &str = "status";

/// An RPC namespace offered by a service
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ApiDescriptor {
    pub namespace: String,
    pub version: String,
    pub public: bool,
}

pub struct StatusService {
    accounts: AccountManagerSlot,
    sessions: Arc<SessionRegistry>,
    requests: Arc<PendingRequestTable>,
    gateway: Arc<ApprovalGateway>,
    events: Arc<EventEmitter>,
    request_timeout: Duration,
}

impl StatusService {
    /// The account manager is injected later with [`StatusService::set_account_manager`].
    pub fn new(config: &StatusServiceConfig, handler: Arc<dyn SignHandler>) -> Self {
        let events = Arc::new(EventEmitter::new(config.listener_buffer));
        let sessions = Arc::new(SessionRegistry::new(events.clone()));
        let requests = Arc::new(PendingRequestTable::new(events.clone()));
        let accounts = AccountManagerSlot::default();
        let gateway = Arc::new(ApprovalGateway::new(
            requests.clone(),
            sessions.clone(),
            accounts.clone(),
            handler,
        ));

        Self {
            accounts,
            sessions,
            requests,
            gateway,
            events,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Sets account manager for the API calls.
    pub fn set_account_manager(&self, manager: AccountManager) {
        self.accounts.set(manager);
        debug!("Account manager set");
    }

    pub(crate) fn account_manager(&self) -> Result<AccountManager, StatusError> {
        self.accounts.get()
    }

    pub fn apis(&self) -> Vec<ApiDescriptor> {
        vec![ApiDescriptor {
            namespace: STATUS_NAMESPACE.to_string(),
            version: "1.0".to_string(),
            public: false,
        }]
    }

    pub fn api(self: &Arc<Self>) -> StatusApi {
        StatusApi::new(self.clone())
    }

    /// No background work of its own; required by the node lifecycle.
    pub async fn start(&self) -> Result<(), StatusError> {
        info!("Status service started");
        Ok(())
    }

    /// No background work of its own; required by the node lifecycle.
    pub async fn stop(&self) -> Result<(), StatusError> {
        info!("Status service stopped");
        Ok(())
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn requests(&self) -> &Arc<PendingRequestTable> {
        &self.requests
    }

    pub fn gateway(&self) -> &Arc<ApprovalGateway> {
        &self.gateway
    }

    pub fn events(&self) -> &Arc<EventEmitter> {
        &self.events
    }

    /// How long a submitter waits before its request is discarded
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::MessageSigner;

    #[tokio::test]
    async fn test_lifecycle_is_noop() {
        let service = StatusService::new(&StatusServiceConfig::default(), Arc::new(MessageSigner));
        assert!(service.start().await.is_ok());
        assert!(service.stop().await.is_ok());
        assert!(matches!(
            service.account_manager(),
            Err(StatusError::AccountManagerNotSet)
        ));

        let apis = service.apis();
        assert_eq!(apis.len(), 1);
        assert_eq!(apis[0].namespace, STATUS_NAMESPACE);
        assert!(!apis[0].public);
    }
}
