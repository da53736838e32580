use std::sync::Arc;
use tracing::info;

use crate::account::{AccountManager, AccountStore};
use crate::config::StatusConfig;
use crate::error::StatusError;
use crate::rpc::{RpcServer, RpcState};
use crate::service::StatusService;
use crate::sign::{MessageSigner, Signal};

/// A running daemon: keystore, status service and the RPC server in front of it
pub struct StatusNode {
    pub service: Arc<StatusService>,
    pub store: AccountStore,
    pub config: StatusConfig,
}

impl StatusNode {
    pub fn new(config: StatusConfig) -> Result<Self, StatusError> {
        info!("Starting status node...");

        info!("Keystore: opening '{}'", config.node.keystore_dir);
        let store = AccountStore::open(&config.node.keystore_dir, config.keystore)
            .map_err(|e| StatusError::Internal(format!("failed to open keystore: {}", e)))?;
        info!("Keystore: {} account(s) loaded", store.addresses().len());

        let service = Arc::new(StatusService::new(
            &config.status,
            Arc::new(MessageSigner),
        ));
        service.set_account_manager(AccountManager::new(Arc::new(store.clone())));

        Ok(Self {
            service,
            store,
            config,
        })
    }

    pub async fn start(self, rpc_port: u16) -> Result<(), StatusError> {
        // 1. Signal log
        self.service.events().subscribe(|signal: &Signal| -> Result<(), String> {
            info!(target: "statusd::signal", "{}", signal.to_json());
            Ok(())
        });

        // 2. Service lifecycle
        self.service.start().await?;

        // 3. RPC Server
        let state = RpcState::new(self.service.clone(), &self.config.status);
        let served = RpcServer::new(state, rpc_port).start().await;

        self.service.stop().await?;
        served
    }
}
