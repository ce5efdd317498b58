//! LiveEvent command and query handlers.

mod create_event;
mod delete_event;
mod publish_event;
mod queries;
mod update_event;

pub use create_event::{CreateEventCommand, CreateEventHandler};
pub use delete_event::{DeleteEventCommand, DeleteEventHandler};
pub use publish_event::{PublishEventCommand, PublishEventHandler, PublishEventResult};
pub use queries::{GetEventHandler, GetEventQuery, ListEventsHandler, ListEventsQuery};
pub use update_event::{UpdateEventCommand, UpdateEventHandler, UpdateEventResult};
