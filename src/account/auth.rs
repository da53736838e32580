//! Password hashing and key encryption for stored accounts

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

const NONCE_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    InvalidPassword,
    EncryptionFailed,
    DecryptionFailed,
    InvalidKey,
}

/// Cost parameters for password hashing and key derivation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KdfParams {
    pub pbkdf2_rounds: u32,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            pbkdf2_rounds: 100_000,
            argon2_memory_kib: Params::DEFAULT_M_COST,
            argon2_iterations: Params::DEFAULT_T_COST,
        }
    }
}

impl KdfParams {
    /// Cheap parameters for tests and throwaway dev keystores
    pub fn light() -> Self {
        Self {
            pbkdf2_rounds: 1_000,
            argon2_memory_kib: 256,
            argon2_iterations: 1,
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>, AuthError> {
        let params = Params::new(self.argon2_memory_kib, self.argon2_iterations, 1, None)
            .map_err(|_| AuthError::InvalidKey)?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a password using Argon2id. Returns the PHC string and the random
/// salt used for key encryption.
pub fn hash_password(password: &str, kdf: &KdfParams) -> Result<(String, Vec<u8>), AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = kdf
        .argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::InvalidPassword)?
        .to_string();

    Ok((password_hash, salt.as_str().as_bytes().to_vec()))
}

/// Verify a password against a hash. Cost parameters come from the hash itself.
pub fn verify_password(password: &str, password_hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|_| AuthError::InvalidPassword)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidPassword)
}

/// Derive an encryption key from a password and salt
pub fn derive_encryption_key(password: &str, salt: &[u8], rounds: u32) -> Zeroizing<[u8; 32]> {
    use hmac::Hmac;
    use pbkdf2::pbkdf2;

    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, rounds, &mut key[..]);
    key
}

/// Encrypt data using AES-256-GCM. The nonce is prepended to the ciphertext.
pub fn encrypt_data(
    data: &[u8],
    password: &str,
    salt: &[u8],
    rounds: u32,
) -> Result<Vec<u8>, AuthError> {
    let key = derive_encryption_key(password, salt, rounds);
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| AuthError::InvalidKey)?;

    let nonce_bytes: [u8; NONCE_LEN] = rand::random();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, data)
        .map_err(|_| AuthError::EncryptionFailed)?;

    let mut result = nonce_bytes.to_vec();
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt data produced by [`encrypt_data`]
pub fn decrypt_data(
    encrypted: &[u8],
    password: &str,
    salt: &[u8],
    rounds: u32,
) -> Result<Zeroizing<Vec<u8>>, AuthError> {
    if encrypted.len() < NONCE_LEN {
        return Err(AuthError::DecryptionFailed);
    }

    let key = derive_encryption_key(password, salt, rounds);
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| AuthError::InvalidKey)?;

    let (nonce, ciphertext) = encrypted.split_at(NONCE_LEN);
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| AuthError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let kdf = KdfParams::light();
        let (hash, salt) = hash_password("my_secure_password_123", &kdf).unwrap();
        assert!(!salt.is_empty());

        assert!(verify_password("my_secure_password_123", &hash).is_ok());
        assert_eq!(
            verify_password("wrong_password", &hash),
            Err(AuthError::InvalidPassword)
        );
    }

    #[test]
    fn test_encryption() {
        let data = b"sensitive data";
        let salt = b"random_salt_1234";

        let encrypted = encrypt_data(data, "encryption_password", salt, 1_000).unwrap();
        let decrypted = decrypt_data(&encrypted, "encryption_password", salt, 1_000).unwrap();
        assert_eq!(data, decrypted.as_slice());

        assert_eq!(
            decrypt_data(&encrypted, "nope", salt, 1_000).unwrap_err(),
            AuthError::DecryptionFailed
        );
        assert!(decrypt_data(&encrypted[..4], "encryption_password", salt, 1_000).is_err());
    }
}
