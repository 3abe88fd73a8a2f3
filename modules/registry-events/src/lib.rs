//! In-process domain event bus.
//!
//! The ingestion path publishes here after a successful create. Delivery is
//! fire-and-forget: publishing never fails the write that triggered it, and
//! the bus is not part of the core's correctness contract.

pub mod bus;
pub mod types;

pub use bus::EventBus;
pub use types::RegistryEvent;
