//! Engine events.
//!
//! The order flow API publishes an event after every committed state change that the outside
//! world cares about (payment confirmed, agent assigned, order delivered, order annulled).
//! Subscribers (agent assignment and the customer notification relay) run on their own tokio
//! tasks, decoupled from the request path that triggered the change.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
