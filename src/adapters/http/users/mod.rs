//! Users surface: handlers and routes.

pub mod handlers;
pub mod routes;

pub use handlers::UserHandlers;
pub use routes::user_routes;
