use serde_json::{json, Value};

use super::request::SignArgs;
use crate::crypto::KeyPair;

pub const PERSONAL_SIGN_METHOD: &str = "personal_sign";

/// Prefix prepended to personal messages before signing
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// The signing capability invoked once a request has been approved.
pub trait SignHandler: Send + Sync {
    fn sign(&self, method: &str, args: &SignArgs, key: &KeyPair) -> Result<Value, String>;
}

/// Signs personal messages with the unlocked account key.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageSigner;

impl MessageSigner {
    /// `data` is either `0x` prefixed hex or plain UTF-8 text
    pub fn decode_data(data: &str) -> Vec<u8> {
        if let Some(stripped) = data.strip_prefix("0x") {
            if let Ok(bytes) = hex::decode(stripped) {
                return bytes;
            }
        }
        data.as_bytes().to_vec()
    }

    pub fn personal_message(data: &[u8]) -> Vec<u8> {
        let mut message = format!("{}{}", PERSONAL_MESSAGE_PREFIX, data.len()).into_bytes();
        message.extend_from_slice(data);
        message
    }
}

impl SignHandler for MessageSigner {
    fn sign(&self, method: &str, args: &SignArgs, key: &KeyPair) -> Result<Value, String> {
        match method {
            PERSONAL_SIGN_METHOD => {
                let data = args
                    .get("data")
                    .and_then(Value::as_str)
                    .ok_or_else(|| "missing data argument".to_string())?;
                let message = Self::personal_message(&Self::decode_data(data));
                Ok(json!({
                    "signature": key.sign_hex(&message),
                    "public_key": key.public_key_hex(),
                }))
            }
            other => Err(format!("unsupported sign method: {}", other)),
        }
    }
}
