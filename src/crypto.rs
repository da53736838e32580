use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Length of an account address in bytes (rendered as `0x` + 40 hex chars).
pub const ADDRESS_LENGTH: usize = 20;

/// Ed25519 signing key. The secret is wiped when the value is dropped.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        KeyPair {
            signing_key: SigningKey::generate(&mut csprng),
        }
    }

    /// Build a keypair from raw secret bytes
    pub fn from_secret(secret: &[u8]) -> Result<Self, String> {
        let bytes: Zeroizing<[u8; 32]> = Zeroizing::new(
            secret
                .try_into()
                .map_err(|_| format!("invalid secret length: {}", secret.len()))?,
        );
        Ok(KeyPair {
            signing_key: SigningKey::from_bytes(&bytes),
        })
    }

    /// Secret bytes, wrapped so the copy is wiped on drop
    pub(crate) fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// Sign a message with the private key
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Verify a signature against a message using this keypair's public key
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.signing_key.verifying_key().verify(message, signature).is_ok()
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign a message and return a `0x` prefixed hex string
    pub fn sign_hex(&self, message: &[u8]) -> String {
        format!("0x{}", hex::encode(self.sign(message).to_bytes()))
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key().to_bytes())
    }

    /// Account address derived from the public key
    pub fn address(&self) -> String {
        address_from_pubkey(&self.public_key().to_bytes())
    }
}

/// `0x` + hex of the last 20 bytes of SHA-256(pubkey).
pub fn address_from_pubkey(pubkey: &[u8]) -> String {
    let digest = Sha256::digest(pubkey);
    format!("0x{}", hex::encode(&digest[digest.len() - ADDRESS_LENGTH..]))
}

/// Lowercase an address and check its shape.
pub fn normalize_address(address: &str) -> Option<String> {
    let trimmed = address.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))?;
    if body.len() != ADDRESS_LENGTH * 2 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{}", body.to_ascii_lowercase()))
}

/// Verify a hex signature against a message with a hex public key
pub fn verify_with_pubkey_hex(message: &[u8], signature_hex: &str, pubkey_hex: &str) -> bool {
    let sig_hex = signature_hex.trim_start_matches("0x");
    let (Ok(sig_bytes), Ok(pk_bytes)) = (hex::decode(sig_hex), hex::decode(pubkey_hex)) else {
        return false;
    };
    let (Ok(signature), Ok(pk)) = (
        Signature::from_slice(&sig_bytes),
        <[u8; 32]>::try_from(pk_bytes.as_slice()),
    ) else {
        return false;
    };
    match VerifyingKey::from_bytes(&pk) {
        Ok(pubkey) => pubkey.verify(message, &signature).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify_hex() {
        let kp = KeyPair::generate();
        let sig = kp.sign_hex(b"hello");
        assert!(sig.starts_with("0x"));
        assert!(verify_with_pubkey_hex(b"hello", &sig, &kp.public_key_hex()));
        assert!(!verify_with_pubkey_hex(b"other", &sig, &kp.public_key_hex()));
    }

    #[test]
    fn test_from_secret_roundtrip() {
        let kp = KeyPair::generate();
        let restored = KeyPair::from_secret(kp.secret_bytes().as_slice()).unwrap();
        assert_eq!(kp.public_key_hex(), restored.public_key_hex());
        assert!(KeyPair::from_secret(&[1u8; 16]).is_err());
    }

    #[test]
    fn test_address_shape() {
        let kp = KeyPair::generate();
        let addr = kp.address();
        assert_eq!(addr.len(), 2 + ADDRESS_LENGTH * 2);
        assert_eq!(normalize_address(&addr.to_uppercase().replacen("0X", "0x", 1)), Some(addr));
        assert_eq!(normalize_address("0x1234"), None);
        assert_eq!(normalize_address("not-an-address"), None);
    }
}
