//! Account System Module
//!
//! This module implements password-protected accounts:
//! - Argon2id password verification
//! - AES-256-GCM encrypted signing keys
//! - BIP39 recovery phrases
//! - A late-bound account manager for the status service

pub mod auth;
pub mod manager;
pub mod recovery;
pub mod store;
pub mod types;

pub use auth::KdfParams;
pub use manager::{AccountManager, AccountManagerSlot};
pub use recovery::RecoveryKey;
pub use store::{AccountStore, CredentialStore, KeystoreError};
pub use types::{Account, Address, CreatedAccount};
