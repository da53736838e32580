//! Pending sign request table

use chrono::Utc;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::events::{EventEmitter, Signal};
use super::request::{
    PendingRequest, RequestId, RequestState, ResolutionResult, SignArgs, SignOutcome,
};
use crate::error::StatusError;

pub(crate) struct PendingEntry {
    request: PendingRequest,
    /// Held by the single caller currently resolving this request
    pub(crate) resolving: tokio::sync::Mutex<()>,
    done_tx: Mutex<Option<oneshot::Sender<SignOutcome>>>,
}

impl PendingEntry {
    pub(crate) fn request(&self) -> &PendingRequest {
        &self.request
    }
}

/// Returned to the submitter; resolves once the request reaches a terminal state
#[derive(Debug)]
pub struct PendingHandle {
    id: RequestId,
    rx: oneshot::Receiver<SignOutcome>,
}

impl PendingHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn into_parts(self) -> (RequestId, oneshot::Receiver<SignOutcome>) {
        (self.id, self.rx)
    }

    /// Wait for approval or discard, without a deadline
    pub async fn wait(self) -> Result<SignOutcome, StatusError> {
        self.rx
            .await
            .map_err(|_| StatusError::Internal("sign request dropped".to_string()))
    }
}

pub struct PendingRequestTable {
    entries: Mutex<HashMap<RequestId, Arc<PendingEntry>>>,
    events: Arc<EventEmitter>,
}

impl PendingRequestTable {
    pub fn new(events: Arc<EventEmitter>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            events,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<RequestId, Arc<PendingEntry>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a request and announce it to listeners
    pub fn submit(&self, method: &str, args: SignArgs) -> PendingHandle {
        let (done_tx, rx) = oneshot::channel();
        let mut entries = self.entries();

        let id = loop {
            let candidate = uuid::Uuid::new_v4().to_string();
            if let Entry::Vacant(slot) = entries.entry(candidate.clone()) {
                slot.insert(Arc::new(PendingEntry {
                    request: PendingRequest {
                        id: candidate.clone(),
                        method: method.to_string(),
                        args: args.clone(),
                        created_at: Utc::now(),
                        state: RequestState::Waiting,
                    },
                    resolving: tokio::sync::Mutex::new(()),
                    done_tx: Mutex::new(Some(done_tx)),
                }));
                break candidate;
            }
        };

        // Announced under the table lock so no resolver can see the request first
        self.events.publish(Signal::RequestAdded {
            id: id.clone(),
            method: method.to_string(),
            args,
        });
        drop(entries);

        info!(request = %id, "Sign request added: {}", method);
        PendingHandle { id, rx }
    }

    pub fn get(&self, id: &str) -> Option<PendingRequest> {
        self.entries().get(id).map(|e| e.request.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries().contains_key(id)
    }

    /// Waiting requests, oldest first
    pub fn list(&self) -> Vec<PendingRequest> {
        let mut requests: Vec<PendingRequest> =
            self.entries().values().map(|e| e.request.clone()).collect();
        requests.sort_by_key(|r| r.created_at);
        requests
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn entry(&self, id: &str) -> Option<Arc<PendingEntry>> {
        self.entries().get(id).cloned()
    }

    /// Move a request to its terminal state: remove it, wake the submitter
    /// and publish the completion. Fails if another caller already did.
    pub(crate) fn finish(
        &self,
        entry: &PendingEntry,
        outcome: SignOutcome,
    ) -> Result<ResolutionResult, StatusError> {
        let request = entry.request();
        let mut entries = self.entries();
        match entries.get(&request.id) {
            Some(current) if std::ptr::eq(Arc::as_ptr(current), entry) => {
                entries.remove(&request.id);
            }
            _ => return Err(StatusError::UnknownRequest),
        }

        self.events.publish(Signal::RequestCompleted {
            id: request.id.clone(),
            method: request.method.clone(),
            outcome: outcome.clone(),
        });
        drop(entries);

        let done_tx = entry
            .done_tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(tx) = done_tx {
            if tx.send(outcome.clone()).is_err() {
                debug!(request = %request.id, "Submitter stopped waiting");
            }
        }

        Ok(ResolutionResult {
            id: request.id.clone(),
            method: request.method.clone(),
            state: outcome.state(),
            outcome,
        })
    }
}
