//! Lifecycle signals and the listener registry that fans them out.
//!
//! Every subscriber owns a bounded channel drained by its own tokio task.
//! Publishing never waits: a full or closed channel only affects that
//! subscriber.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::request::{RequestId, SignArgs, SignOutcome};

pub const EVENT_SIGN_REQUEST_ADDED: &str = "sign.request.added";
pub const EVENT_SIGN_REQUEST_COMPLETED: &str = "sign.request.completed";
pub const EVENT_ACCOUNT_SELECTED: &str = "account.selected";
pub const EVENT_ACCOUNT_LOGOUT: &str = "account.logout";

/// Notification describing a state transition. Serializes to the
/// `{"type": ..., "event": {...}}` envelope.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "event")]
pub enum Signal {
    #[serde(rename = "sign.request.added")]
    RequestAdded {
        id: RequestId,
        method: String,
        args: SignArgs,
    },
    #[serde(rename = "sign.request.completed")]
    RequestCompleted {
        id: RequestId,
        method: String,
        outcome: SignOutcome,
    },
    #[serde(rename = "account.selected")]
    AccountSelected { address: String },
    #[serde(rename = "account.logout")]
    AccountLoggedOut { address: String },
}

impl Signal {
    pub fn kind(&self) -> &'static str {
        match self {
            Signal::RequestAdded { .. } => EVENT_SIGN_REQUEST_ADDED,
            Signal::RequestCompleted { .. } => EVENT_SIGN_REQUEST_COMPLETED,
            Signal::AccountSelected { .. } => EVENT_ACCOUNT_SELECTED,
            Signal::AccountLoggedOut { .. } => EVENT_ACCOUNT_LOGOUT,
        }
    }

    /// Sign request this signal belongs to, if any
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Signal::RequestAdded { id, .. } | Signal::RequestCompleted { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"{}","error":"{}"}}"#, self.kind(), e)
        })
    }
}

/// Callback invoked for every published signal
pub trait EventListener: Send + Sync + 'static {
    fn on_signal(&self, signal: &Signal) -> Result<(), String>;
}

impl<F> EventListener for F
where
    F: Fn(&Signal) -> Result<(), String> + Send + Sync + 'static,
{
    fn on_signal(&self, signal: &Signal) -> Result<(), String> {
        self(signal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

pub struct EventEmitter {
    subscribers: Mutex<HashMap<u64, mpsc::Sender<Signal>>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl EventEmitter {
    /// `buffer` bounds how many undelivered signals a single subscriber may hold
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, HashMap<u64, mpsc::Sender<Signal>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a raw stream of signals. Dropping the receiver unsubscribes.
    pub fn stream(&self) -> (SubscriptionHandle, mpsc::Receiver<Signal>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers().insert(id, tx);
        (SubscriptionHandle(id), rx)
    }

    /// Run `listener` on its own task for every future signal.
    /// Must be called from within a tokio runtime.
    pub fn subscribe<L: EventListener>(&self, listener: L) -> SubscriptionHandle {
        let (handle, mut rx) = self.stream();
        let id = handle.0;
        tokio::spawn(async move {
            while let Some(signal) = rx.recv().await {
                if let Err(e) = listener.on_signal(&signal) {
                    warn!(subscription = id, "Listener failed on {}: {}", signal.kind(), e);
                }
            }
            debug!(subscription = id, "Listener task finished");
        });
        handle
    }

    /// Returns false if the handle was already gone
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.subscribers().remove(&handle.0).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    pub(crate) fn publish(&self, signal: Signal) {
        let mut subscribers = self.subscribers();
        subscribers.retain(|id, tx| match tx.try_send(signal.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(subscription = *id, "Subscriber lagging, dropped {}", signal.kind());
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(subscription = *id, "Subscriber gone, removing");
                false
            }
        });
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn added(id: &str) -> Signal {
        Signal::RequestAdded {
            id: id.to_string(),
            method: "personal_sign".to_string(),
            args: SignArgs::new(),
        }
    }

    #[test]
    fn test_envelope_shape() {
        let mut args = SignArgs::new();
        args.insert("data".to_string(), json!("hello"));
        let signal = Signal::RequestAdded {
            id: "abc".to_string(),
            method: "personal_sign".to_string(),
            args,
        };
        let value: serde_json::Value = serde_json::from_str(&signal.to_json()).unwrap();
        assert_eq!(value["type"], EVENT_SIGN_REQUEST_ADDED);
        assert_eq!(value["event"]["id"], "abc");
        assert_eq!(value["event"]["args"]["data"], "hello");

        let done = Signal::RequestCompleted {
            id: "abc".to_string(),
            method: "personal_sign".to_string(),
            outcome: SignOutcome::Discarded,
        };
        let value = serde_json::to_value(&done).unwrap();
        assert_eq!(value["type"], EVENT_SIGN_REQUEST_COMPLETED);
        assert_eq!(value["event"]["outcome"]["status"], "discarded");
        assert_eq!(done.request_id(), Some("abc"));
    }

    #[tokio::test]
    async fn test_stream_preserves_order() {
        let emitter = EventEmitter::new(8);
        let (_handle, mut rx) = emitter.stream();

        emitter.publish(added("1"));
        emitter.publish(added("2"));

        assert_eq!(rx.recv().await.unwrap().request_id(), Some("1"));
        assert_eq!(rx.recv().await.unwrap().request_id(), Some("2"));
    }

    #[tokio::test]
    async fn test_full_subscriber_does_not_block_publish() {
        let emitter = EventEmitter::new(1);
        let (_slow, mut slow_rx) = emitter.stream();
        let (_fast, mut fast_rx) = emitter.stream();

        emitter.publish(added("1"));
        assert!(fast_rx.recv().await.is_some());
        emitter.publish(added("2"));

        // Slow subscriber kept the first signal and lost the overflow
        assert_eq!(slow_rx.recv().await.unwrap().request_id(), Some("1"));
        assert!(slow_rx.try_recv().is_err());
        assert_eq!(fast_rx.recv().await.unwrap().request_id(), Some("2"));
        assert_eq!(emitter.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_listener_is_isolated() {
        let emitter = EventEmitter::new(8);
        emitter.subscribe(|_: &Signal| -> Result<(), String> { Err("boom".to_string()) });
        emitter.subscribe(|_: &Signal| -> Result<(), String> { panic!("listener bug") });

        let (tx, mut rx) = mpsc::unbounded_channel();
        emitter.subscribe(move |s: &Signal| {
            tx.send(s.clone()).map_err(|e| e.to_string())
        });

        emitter.publish(added("1"));
        emitter.publish(added("2"));

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        let second = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert_eq!(first.unwrap().request_id(), Some("1"));
        assert_eq!(second.unwrap().request_id(), Some("2"));
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let emitter = Arc::new(EventEmitter::new(8));
        let (handle, mut rx) = emitter.stream();
        assert!(emitter.unsubscribe(handle));
        assert!(!emitter.unsubscribe(handle));

        emitter.publish(added("1"));
        assert!(rx.recv().await.is_none());

        // Dropped receivers are pruned on the next publish
        let (_h, rx2) = emitter.stream();
        drop(rx2);
        emitter.publish(added("2"));
        assert_eq!(emitter.subscriber_count(), 0);
    }
}
