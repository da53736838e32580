//! User-approved signing
//!
//! A producer submits a request to the [`PendingRequestTable`] and awaits its
//! [`PendingHandle`]. Listeners learn about the request through the
//! [`EventEmitter`] and drive it to completion through the
//! [`ApprovalGateway`], which authenticates the password, signs, removes the
//! request and announces the outcome.

pub mod events;
pub mod gateway;
pub mod handler;
pub mod queue;
pub mod request;

pub use events::{EventEmitter, EventListener, Signal, SubscriptionHandle};
pub use gateway::ApprovalGateway;
pub use handler::{MessageSigner, SignHandler, PERSONAL_SIGN_METHOD};
pub use queue::{PendingHandle, PendingRequestTable};
pub use request::{
    Decision, PendingRequest, RequestId, RequestState, ResolutionResult, SignArgs, SignOutcome,
};
