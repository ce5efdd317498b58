//! PostgreSQL adapters: repositories, readers, the transactional
//! registration store, and the outbox table.

mod live_event_reader;
mod live_event_repository;
mod outbox_store;
mod registration_reader;
mod registration_store;
mod user_repository;

pub use live_event_reader::PostgresLiveEventReader;
pub use live_event_repository::PostgresLiveEventRepository;
pub use outbox_store::PostgresOutboxStore;
pub use registration_reader::PostgresRegistrationReader;
pub use registration_store::PostgresRegistrationStore;
pub use user_repository::PostgresUserRepository;
