//! Infrastructure layer: event store, unit of work, read models and the
//! warehouse workflow service that ties them together.

pub mod config;
pub mod error;
pub mod event_store;
pub mod locks;
pub mod projections;
pub mod read_model;
pub mod seed;
pub mod streams;
pub mod unique_index;
pub mod unit_of_work;
pub mod workflow;


pub use config::{ConfigError, WmsConfig};
pub use error::{WorkflowError, WorkflowResult};
pub use workflow::{InMemoryWarehouse, ItemChanges, NewItem, UserChanges, WarehouseService};
