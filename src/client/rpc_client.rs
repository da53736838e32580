// RPC client for making JSON-RPC requests
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::rpc::types::PersonalSignResponse;
use crate::service::{LoginResponse, LogoutResponse, SignupResponse};
use crate::sign::{PendingRequest, ResolutionResult};

pub struct RpcClient {
    url: String,
    client: Client,
    request_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: Client::new(),
            request_id: AtomicU64::new(1),
        }
    }

    // Helper for sending requests
    async fn send_request(&self, method: &str, params: Value) -> Result<Value, String> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("RPC request failed: {}", e))?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))?;

        if let Some(error) = json.get("error") {
            return Err(format!(
                "{} (code {})",
                error["message"].as_str().unwrap_or("Unknown error"),
                error["code"]
            ));
        }

        Ok(json["result"].clone())
    }

    /// Call `method` and decode its result
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, String> {
        let result = self.send_request(method, params).await?;
        serde_json::from_value(result).map_err(|e| format!("Unexpected result for {}: {}", method, e))
    }

    pub async fn signup(&self, password: &str) -> Result<SignupResponse, String> {
        self.call("status_signup", json!({ "password": password })).await
    }

    pub async fn login(&self, address: &str, password: &str) -> Result<LoginResponse, String> {
        self.call(
            "status_login",
            json!({ "address": address, "password": password }),
        )
        .await
    }

    pub async fn logout(&self) -> Result<LogoutResponse, String> {
        self.call("status_logout", Value::Null).await
    }

    pub async fn personal_sign(
        &self,
        data: &str,
        account: Option<&str>,
    ) -> Result<PersonalSignResponse, String> {
        self.call("personal_sign", json!({ "data": data, "account": account }))
            .await
    }

    pub async fn pending(&self) -> Result<Vec<PendingRequest>, String> {
        self.call("sign_pending", Value::Null).await
    }

    pub async fn approve(&self, id: &str, password: &str) -> Result<ResolutionResult, String> {
        self.call("sign_approve", json!({ "id": id, "password": password }))
            .await
    }

    pub async fn discard(&self, id: &str) -> Result<ResolutionResult, String> {
        self.call("sign_discard", json!({ "id": id })).await
    }
}
