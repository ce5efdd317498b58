//! Registration command and query handlers.

mod cancel_registration;
mod confirm_registration;
mod queries;
mod register;

pub use cancel_registration::{CancelRegistrationCommand, CancelRegistrationHandler};
pub use confirm_registration::{ConfirmRegistrationCommand, ConfirmRegistrationHandler};
pub use queries::{
    GetWaitlistHandler, GetWaitlistQuery, ListRegistrationsHandler, ListRegistrationsQuery,
};
pub use register::{RegisterCommand, RegisterHandler, RegisterResult};
