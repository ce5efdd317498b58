//! Registration aggregate, lifecycle events, and the pure waitlist planners.

mod aggregate;
pub mod emission;
mod events;
mod status;
pub mod waitlist;

pub use aggregate::Registration;
pub use events::{
    RegistrationCancelled, RegistrationCreated, RegistrationPromoted, RegistrationWaitlisted,
    WaitlistPositionChanged, WaitlistRemoval,
};
pub use status::RegistrationStatus;
