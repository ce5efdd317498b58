//! User aggregate.

mod aggregate;

pub use aggregate::User;
