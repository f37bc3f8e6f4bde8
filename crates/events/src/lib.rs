//! `wms-events`: event plumbing shared by the warehouse aggregates.
//!
//! Aggregates emit typed events; infrastructure wraps them in an
//! [`EventEnvelope`] (stream metadata) and fans them out over an [`EventBus`].

mod bus;
mod envelope;
mod event;
mod handler;
mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
