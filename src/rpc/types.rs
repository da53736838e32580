// RPC types for JSON-RPC 2.0 protocol
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StatusError, INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE};
use crate::sign::{RequestId, SignOutcome};

#[derive(Deserialize, Debug)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: serde_json::Value,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: serde_json::Value,
}

impl RpcResponse {
    pub fn from_result(id: serde_json::Value, result: Result<serde_json::Value, RpcError>) -> Self {
        match result {
            Ok(val) => Self {
                jsonrpc: "2.0".to_string(),
                result: Some(val),
                error: None,
                id,
            },
            Err(err) => Self {
                jsonrpc: "2.0".to_string(),
                result: None,
                error: Some(err),
                id,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl From<StatusError> for RpcError {
    fn from(e: StatusError) -> Self {
        RpcError {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

/// Decode method params given either as an object or as a one-element array
/// wrapping that object. Decode errors never echo the submitted values.
pub fn parse_params<T: DeserializeOwned>(
    method: &str,
    params: serde_json::Value,
) -> Result<T, RpcError> {
    let params = match params {
        serde_json::Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    };
    serde_json::from_value(params).map_err(|e| {
        debug!("Rejected params for {}: {:?}", method, e.classify());
        invalid_params(method)
    })
}

pub fn invalid_params(method: &str) -> RpcError {
    RpcError {
        code: INVALID_PARAMS_CODE,
        message: format!("Invalid params for {}", method),
    }
}

/// Safely serialize to JSON value
pub fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError {
        code: INTERNAL_ERROR_CODE,
        message: format!("Serialization error: {}", e),
    })
}

// Method-specific parameter types
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct PersonalSignParams {
    pub data: String,
    #[serde(default)]
    pub account: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApproveParams {
    pub id: RequestId,
    pub password: String,
}

impl std::fmt::Debug for ApproveParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApproveParams")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct DiscardParams {
    pub id: RequestId,
}

/// Result of personal_sign once the request has left the queue
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PersonalSignResponse {
    pub id: RequestId,
    #[serde(flatten)]
    pub outcome: SignOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_params_accepts_object_or_wrapped_object() {
        let p: DiscardParams = parse_params("sign_discard", json!({"id": "abc"})).unwrap();
        assert_eq!(p.id, "abc");
        let p: DiscardParams = parse_params("sign_discard", json!([{"id": "abc"}])).unwrap();
        assert_eq!(p.id, "abc");

        let err =
            parse_params::<DiscardParams>("sign_discard", json!({"id": "abc", "extra": 1}))
                .unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS_CODE);
        assert!(parse_params::<DiscardParams>("sign_discard", json!(null)).is_err());
    }

    #[test]
    fn test_param_errors_do_not_echo_values() {
        let err = parse_params::<ApproveParams>(
            "sign_approve",
            json!({"id": "abc", "password": 12345}),
        )
        .unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS_CODE);
        assert_eq!(err.message, "Invalid params for sign_approve");
        assert!(!err.message.contains("12345"));
    }

    #[test]
    fn test_status_error_maps_to_code() {
        let err: RpcError = StatusError::UnknownRequest.into();
        assert_eq!(err.code, -32002);
    }

    #[test]
    fn test_sign_response_flattens_outcome() {
        let resp = PersonalSignResponse {
            id: "r1".to_string(),
            outcome: SignOutcome::Discarded,
        };
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"id": "r1", "status": "discarded"})
        );
    }
}
