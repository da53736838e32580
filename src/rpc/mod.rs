pub mod handlers;
pub mod types;

use axum::{routing::post, Router};
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::StatusServiceConfig;
use crate::error::StatusError;
use crate::service::StatusService;

/// Namespaces served regardless of the status service switch
const SIGNING_NAMESPACES: [&str; 2] = ["personal", "sign"];

#[derive(Clone)]
pub struct RpcState {
    pub service: Arc<StatusService>,
    namespaces: Arc<HashSet<String>>,
}

impl RpcState {
    pub fn new(service: Arc<StatusService>, config: &StatusServiceConfig) -> Self {
        let mut namespaces: HashSet<String> =
            SIGNING_NAMESPACES.iter().map(|ns| ns.to_string()).collect();
        if config.enabled {
            namespaces.extend(service.apis().into_iter().map(|api| api.namespace));
        }
        Self {
            service,
            namespaces: Arc::new(namespaces),
        }
    }

    /// Methods are named `<namespace>_<name>`
    pub fn is_exported(&self, method: &str) -> bool {
        method
            .split_once('_')
            .map_or(false, |(ns, _)| self.namespaces.contains(ns))
    }
}

pub struct RpcServer {
    state: RpcState,
    bind_addr: String,
}

impl RpcServer {
    pub fn new(state: RpcState, port: u16) -> Self {
        Self {
            state,
            bind_addr: format!("0.0.0.0:{}", port),
        }
    }

    pub fn router(state: RpcState) -> Router {
        Router::new()
            .route("/", post(handlers::handle_rpc_request))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub async fn start(self) -> Result<(), StatusError> {
        let app = Self::router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|e| StatusError::Internal(format!("failed to bind RPC server: {}", e)))?;

        info!("RPC server listening on {}", self.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| StatusError::Internal(format!("RPC server failed: {}", e)))
    }
}
