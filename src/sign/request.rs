//! Sign request types shared by the queue, the gateway and the event stream

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::account::Address;
use crate::crypto::normalize_address;
use crate::error::StatusError;

/// Unique sign request identifier (UUID v4)
pub type RequestId = String;

/// Method arguments as submitted by the caller
pub type SignArgs = Map<String, Value>;

/// Argument naming the account a request must be signed with
pub const ACCOUNT_ARG: &str = "account";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Waiting,
    Completed,
    Discarded,
}

/// How a pending request should be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Discard,
}

/// Snapshot of a pending request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub method: String,
    pub args: SignArgs,
    pub created_at: DateTime<Utc>,
    pub state: RequestState,
}

impl PendingRequest {
    /// Account named in the request arguments, normalized. A present but
    /// malformed value is an error, never a fallback to another account.
    pub fn account(&self) -> Result<Option<Address>, StatusError> {
        match self.args.get(ACCOUNT_ARG) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => normalize_address(raw).map(Some).ok_or_else(|| {
                StatusError::InvalidParameters("malformed account argument".to_string())
            }),
            Some(_) => Err(StatusError::InvalidParameters(
                "account argument must be an address string".to_string(),
            )),
        }
    }
}

/// Final result delivered to the submitter and to listeners
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignOutcome {
    Signed { result: Value },
    Failed { error: String },
    Discarded,
}

impl SignOutcome {
    pub fn is_discarded(&self) -> bool {
        matches!(self, SignOutcome::Discarded)
    }

    pub fn state(&self) -> RequestState {
        match self {
            SignOutcome::Discarded => RequestState::Discarded,
            _ => RequestState::Completed,
        }
    }
}

/// Returned to whoever resolved the request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    pub id: RequestId,
    pub method: String,
    pub state: RequestState,
    pub outcome: SignOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_with(account: Option<Value>) -> PendingRequest {
        let mut args = SignArgs::new();
        if let Some(account) = account {
            args.insert(ACCOUNT_ARG.to_string(), account);
        }
        PendingRequest {
            id: "r1".to_string(),
            method: "personal_sign".to_string(),
            args,
            created_at: Utc::now(),
            state: RequestState::Waiting,
        }
    }

    #[test]
    fn test_account_argument() {
        assert_eq!(request_with(None).account(), Ok(None));
        assert_eq!(request_with(Some(Value::Null)).account(), Ok(None));
        assert_eq!(
            request_with(Some(json!("0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD"))).account(),
            Ok(Some("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd".to_string()))
        );

        for bad in [
            json!("0xdeadbeef"),
            json!(["0xabcdefabcdefabcdefabcdefabcdefabcdefabcd"]),
            json!(42),
        ] {
            assert!(matches!(
                request_with(Some(bad)).account(),
                Err(StatusError::InvalidParameters(_))
            ));
        }
    }
}
