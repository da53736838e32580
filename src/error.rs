use thiserror::Error;

/// JSON-RPC code returned when a method is unknown or its namespace is not exported.
pub const METHOD_NOT_FOUND_CODE: i32 = -32601;
pub const INVALID_PARAMS_CODE: i32 = -32602;
pub const INTERNAL_ERROR_CODE: i32 = -32603;

/// Errors surfaced by the account and signing APIs.
///
/// Lower layers (keystore, crypto helpers) are translated into this taxonomy
/// before anything crosses the API boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("could not create the specified account")]
    CouldNotCreateAccount,
    #[error("unknown or already resolved sign request")]
    UnknownRequest,
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("account manager is not set")]
    AccountManagerNotSet,
    #[error("internal error: {0}")]
    Internal(String),
}

impl StatusError {
    /// Stable JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            StatusError::InvalidParameters(_) => INVALID_PARAMS_CODE,
            StatusError::InvalidCredentials => -32000,
            StatusError::CouldNotCreateAccount => -32001,
            StatusError::UnknownRequest => -32002,
            StatusError::SigningFailed(_) => -32003,
            StatusError::AccountManagerNotSet => -32004,
            StatusError::Internal(_) => INTERNAL_ERROR_CODE,
        }
    }
}
