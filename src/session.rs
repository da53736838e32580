//! Session registry: the unlocked key ring and the process-wide account selection

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::account::Address;
use crate::crypto::KeyPair;
use crate::error::StatusError;
use crate::sign::events::{EventEmitter, Signal};

/// Opaque handle to a decrypted key held by the registry
pub type SessionKeyId = String;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ActiveAccount {
    pub address: Address,
    pub key_id: SessionKeyId,
    pub selected_at: DateTime<Utc>,
}

#[derive(Default)]
struct SessionState {
    keys: HashMap<SessionKeyId, Arc<KeyPair>>,
    active: Option<ActiveAccount>,
}

pub struct SessionRegistry {
    state: Mutex<SessionState>,
    login_lock: tokio::sync::Mutex<()>,
    events: Arc<EventEmitter>,
}

impl SessionRegistry {
    pub fn new(events: Arc<EventEmitter>) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            login_lock: tokio::sync::Mutex::new(()),
            events,
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Serializes logins so a selection is never applied halfway
    pub(crate) async fn begin_login(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.login_lock.lock().await
    }

    /// Take ownership of a decrypted key and return its handle
    pub fn import_key(&self, key: KeyPair) -> Result<SessionKeyId, StatusError> {
        let mut state = self.state();
        for _ in 0..8 {
            let mut raw = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut raw);
            let id = hex::encode(raw);
            if !state.keys.contains_key(&id) {
                state.keys.insert(id.clone(), Arc::new(key));
                debug!("Imported key pair {}", id);
                return Ok(id);
            }
        }
        Err(StatusError::Internal("could not allocate key id".to_string()))
    }

    pub fn has_key(&self, id: &str) -> bool {
        self.state().keys.contains_key(id)
    }

    pub fn key_count(&self) -> usize {
        self.state().keys.len()
    }

    /// Drop a key. Deleting the active key also clears the selection.
    pub fn delete_key(&self, id: &str) -> bool {
        let mut state = self.state();
        if state.keys.remove(id).is_none() {
            return false;
        }
        if state.active.as_ref().map(|a| a.key_id.as_str()) == Some(id) {
            if let Some(previous) = state.active.take() {
                self.events.publish(Signal::AccountLoggedOut {
                    address: previous.address,
                });
            }
        }
        true
    }

    /// Mark `address` as the active account, backed by the imported key `key_id`.
    /// The previously selected key is discarded.
    pub fn select_account(&self, address: &str, key_id: &str) -> Result<(), StatusError> {
        let mut state = self.state();
        if !state.keys.contains_key(key_id) {
            return Err(StatusError::Internal(format!("unknown key id {}", key_id)));
        }

        let previous = state.active.replace(ActiveAccount {
            address: address.to_string(),
            key_id: key_id.to_string(),
            selected_at: Utc::now(),
        });
        if let Some(previous) = previous {
            if previous.key_id != key_id {
                state.keys.remove(&previous.key_id);
            }
        }

        self.events.publish(Signal::AccountSelected {
            address: address.to_string(),
        });
        info!("Account selected: {}", address);
        Ok(())
    }

    pub fn active_account(&self) -> Option<ActiveAccount> {
        self.state().active.clone()
    }

    /// Clear the selection and drop its key. Returns the address that was active.
    pub fn logout(&self) -> Option<Address> {
        let mut state = self.state();
        let previous = state.active.take()?;
        state.keys.remove(&previous.key_id);

        self.events.publish(Signal::AccountLoggedOut {
            address: previous.address.clone(),
        });
        info!("Account logged out: {}", previous.address);
        Some(previous.address)
    }

    /// Key of the active account, if `address` is the current selection
    pub(crate) fn session_key_for(&self, address: &str) -> Option<Arc<KeyPair>> {
        let state = self.state();
        let active = state.active.as_ref()?;
        if !active.address.eq_ignore_ascii_case(address) {
            return None;
        }
        state.keys.get(&active.key_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(EventEmitter::default()))
    }

    #[test]
    fn test_import_and_delete() {
        let sessions = registry();
        let id = sessions.import_key(KeyPair::generate()).unwrap();
        assert_eq!(id.len(), 64);
        assert!(sessions.has_key(&id));
        assert!(sessions.delete_key(&id));
        assert!(!sessions.delete_key(&id));
        assert_eq!(sessions.key_count(), 0);
    }

    #[test]
    fn test_reselect_drops_previous_key() {
        let sessions = registry();
        let first_key = KeyPair::generate();
        let first_addr = first_key.address();
        let first = sessions.import_key(first_key).unwrap();
        sessions.select_account(&first_addr, &first).unwrap();
        assert!(sessions.session_key_for(&first_addr).is_some());

        let second_key = KeyPair::generate();
        let second_addr = second_key.address();
        let second = sessions.import_key(second_key).unwrap();
        sessions.select_account(&second_addr, &second).unwrap();

        assert!(!sessions.has_key(&first));
        assert!(sessions.session_key_for(&first_addr).is_none());
        assert_eq!(sessions.active_account().unwrap().key_id, second);
    }

    #[test]
    fn test_select_requires_imported_key() {
        let sessions = registry();
        assert!(sessions.select_account("0xabc", "missing").is_err());
        assert!(sessions.active_account().is_none());
    }

    #[tokio::test]
    async fn test_logout_emits_and_clears() {
        let events = Arc::new(EventEmitter::default());
        let (_h, mut rx) = events.stream();
        let sessions = SessionRegistry::new(events);

        let key = KeyPair::generate();
        let address = key.address();
        let id = sessions.import_key(key).unwrap();
        sessions.select_account(&address, &id).unwrap();

        assert_eq!(sessions.logout(), Some(address.clone()));
        assert_eq!(sessions.logout(), None);
        assert_eq!(sessions.key_count(), 0);

        assert_eq!(rx.recv().await.unwrap(), Signal::AccountSelected { address: address.clone() });
        assert_eq!(rx.recv().await.unwrap(), Signal::AccountLoggedOut { address });
    }
}
