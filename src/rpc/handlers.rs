use super::types::*;
use crate::crypto::normalize_address;
use crate::error::METHOD_NOT_FOUND_CODE;
use crate::rpc::RpcState;
use crate::service::{LoginRequest, RecoverRequest, SignupRequest};
use crate::sign::{SignArgs, PERSONAL_SIGN_METHOD};
use axum::{debug_handler, extract::State, Json};
use serde_json::json;
use tracing::debug;

/// Main dispatcher: routes incoming JSON-RPC requests to the correct handler.
#[debug_handler]
pub async fn handle_rpc_request(
    State(state): State<RpcState>,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    Json(dispatch(&state, req).await)
}

pub async fn dispatch(state: &RpcState, req: RpcRequest) -> RpcResponse {
    debug!("RPC Request: method={}, id={}", req.method, req.id);

    let result = if !state.is_exported(&req.method) {
        Err(method_not_found(&req.method))
    } else {
        match req.method.as_str() {
            "status_login" => handle_status_login(state, req.params).await,
            "status_signup" => handle_status_signup(state, req.params).await,
            "status_recover" => handle_status_recover(state, req.params).await,
            "status_logout" => handle_status_logout(state).await,
            "personal_sign" => handle_personal_sign(state, req.params).await,
            "sign_approve" => handle_sign_approve(state, req.params).await,
            "sign_discard" => handle_sign_discard(state, req.params).await,
            "sign_pending" => handle_sign_pending(state).await,
            _ => Err(method_not_found(&req.method)),
        }
    };

    RpcResponse::from_result(req.id, result)
}

fn method_not_found(method: &str) -> RpcError {
    RpcError {
        code: METHOD_NOT_FOUND_CODE,
        message: format!("Method not found: {}", method),
    }
}

//
// === status namespace ===
//

/// Handle status_login(address, password)
async fn handle_status_login(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let req: LoginRequest = parse_params("status_login", params)?;
    let res = state.service.api().login(req).await?;
    to_json(&res)
}

/// Handle status_signup(password)
async fn handle_status_signup(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let req: SignupRequest = parse_params("status_signup", params)?;
    let res = state.service.api().signup(req).await?;
    to_json(&res)
}

/// Handle status_recover(mnemonic, password)
async fn handle_status_recover(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let req: RecoverRequest = parse_params("status_recover", params)?;
    let res = state.service.api().recover(req).await?;
    to_json(&res)
}

async fn handle_status_logout(state: &RpcState) -> Result<serde_json::Value, RpcError> {
    let res = state.service.api().logout().await?;
    to_json(&res)
}

//
// === signing ===
//

/// Handle personal_sign: queue the request and block until it is approved,
/// discarded or times out.
async fn handle_personal_sign(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    // Positional form is [data] or [data, account]
    let p: PersonalSignParams = match params {
        serde_json::Value::Array(items) if items.first().map_or(false, |v| v.is_string()) => {
            if items.len() > 2 {
                return Err(invalid_params(PERSONAL_SIGN_METHOD));
            }
            let mut items = items.into_iter();
            let data = items.next().unwrap_or_default();
            let account = items.next().unwrap_or(serde_json::Value::Null);
            parse_params(PERSONAL_SIGN_METHOD, json!({ "data": data, "account": account }))?
        }
        other => parse_params(PERSONAL_SIGN_METHOD, other)?,
    };

    let mut args = SignArgs::new();
    args.insert("data".to_string(), json!(p.data));
    if let Some(account) = p.account {
        let address =
            normalize_address(&account).ok_or_else(|| invalid_params(PERSONAL_SIGN_METHOD))?;
        args.insert("account".to_string(), json!(address));
    }

    let service = &state.service;
    let handle = service.requests().submit(PERSONAL_SIGN_METHOD, args);
    let id = handle.id().to_string();
    let outcome = service
        .gateway()
        .wait(handle, service.request_timeout())
        .await?;

    to_json(&PersonalSignResponse { id, outcome })
}

/// Handle sign_approve(id, password)
async fn handle_sign_approve(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let p: ApproveParams = parse_params("sign_approve", params)?;
    let res = state.service.gateway().approve(&p.id, &p.password).await?;
    to_json(&res)
}

/// Handle sign_discard(id)
async fn handle_sign_discard(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let p: DiscardParams = parse_params("sign_discard", params)?;
    let res = state.service.gateway().discard(&p.id).await?;
    to_json(&res)
}

async fn handle_sign_pending(state: &RpcState) -> Result<serde_json::Value, RpcError> {
    to_json(&state.service.requests().list())
}
