//! Account recovery using BIP39 mnemonic seed phrases

use bip39::{Language, Mnemonic};
use tiny_hderive::bip32::ExtendedPrivKey;
use zeroize::Zeroizing;

use crate::crypto::KeyPair;

/// Derivation path for the account signing key.
pub const ACCOUNT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryError {
    InvalidMnemonic,
    KeyDerivationFailed,
}

/// Recovery key system using BIP39 mnemonic
pub struct RecoveryKey {
    pub mnemonic: Mnemonic,
}

impl RecoveryKey {
    /// Generate a new 12-word recovery key
    pub fn generate() -> Result<Self, RecoveryError> {
        use rand::rngs::OsRng;
        use rand::RngCore;

        // 128 bits of entropy = 12 words
        let mut entropy = Zeroizing::new([0u8; 16]);
        OsRng.fill_bytes(&mut entropy[..]);

        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy[..])
            .map_err(|_| RecoveryError::InvalidMnemonic)?;

        Ok(Self { mnemonic })
    }

    /// Create from existing mnemonic phrase
    pub fn from_phrase(phrase: &str) -> Result<Self, RecoveryError> {
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase.trim())
            .map_err(|_| RecoveryError::InvalidMnemonic)?;

        Ok(Self { mnemonic })
    }

    pub fn to_phrase(&self) -> String {
        self.mnemonic.words().collect::<Vec<&str>>().join(" ")
    }

    /// Derive the account keypair. The password doubles as the BIP39
    /// passphrase, so the same phrase yields different keys per password.
    pub fn derive_keypair(&self, password: &str) -> Result<KeyPair, RecoveryError> {
        let seed = Zeroizing::new(self.mnemonic.to_seed(password));

        let ext_key = ExtendedPrivKey::derive(&seed[..], ACCOUNT_DERIVATION_PATH)
            .map_err(|_| RecoveryError::KeyDerivationFailed)?;
        let secret = Zeroizing::new(ext_key.secret());

        KeyPair::from_secret(&secret[..]).map_err(|_| RecoveryError::KeyDerivationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_key_generation() {
        let recovery = RecoveryKey::generate().unwrap();
        let phrase = recovery.to_phrase();

        assert_eq!(phrase.split_whitespace().count(), 12);

        let recovered = RecoveryKey::from_phrase(&phrase).unwrap();
        assert_eq!(recovery.to_phrase(), recovered.to_phrase());
        assert_eq!(
            RecoveryKey::from_phrase("not a real phrase").err(),
            Some(RecoveryError::InvalidMnemonic)
        );
    }

    #[test]
    fn test_keypair_derivation() {
        let recovery = RecoveryKey::generate().unwrap();
        let first = recovery.derive_keypair("pw123").unwrap();
        let again = recovery.derive_keypair("pw123").unwrap();
        assert_eq!(first.public_key_hex(), again.public_key_hex());

        // Different passphrase, different key
        let other = recovery.derive_keypair("other").unwrap();
        assert_ne!(first.public_key_hex(), other.public_key_hex());
    }
}
