//! User handlers: DSAR export and erasure.

mod erase_user;
mod export_user;

pub use erase_user::{EraseUserCommand, EraseUserHandler};
pub use export_user::{
    ExportUserHandler, ExportUserQuery, RegistrationExport, UserExport, UserProfileExport,
};
