//! Account type definitions

use serde::{Deserialize, Serialize};

/// Account address (`0x` + 40 lowercase hex chars)
pub type Address = String;

/// Stored account record. Holds only encrypted key material.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Account {
    // Identity
    pub address: Address,
    pub public_key: String,

    // Authentication
    pub password_hash: String, // Argon2id hash
    pub salt: Vec<u8>,

    // Signing secret encrypted with the password
    pub signing_key_encrypted: Vec<u8>,
    #[serde(default = "default_pbkdf2_rounds")]
    pub pbkdf2_rounds: u32,

    pub created_at: u64,
}

/// Records written before the round count was stored used the default cost
fn default_pbkdf2_rounds() -> u32 {
    super::auth::KdfParams::default().pbkdf2_rounds
}

/// Result of creating a new account. The mnemonic is only ever returned here.
#[derive(Serialize, Clone)]
pub struct CreatedAccount {
    pub address: Address,
    pub public_key: String,
    pub mnemonic: String,
}

impl std::fmt::Debug for CreatedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatedAccount")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("mnemonic", &"<redacted>")
            .finish()
    }
}
