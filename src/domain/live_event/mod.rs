//! LiveEvent aggregate: the scheduled gathering users register for.

mod aggregate;
mod events;

pub use aggregate::{CapacityChange, EventLimits, EventPatch, LiveEvent};
pub use events::EventCapacityIncreased;
