//! Foundation types shared across the domain: identifiers, timestamps,
//! errors, command metadata, and the domain-event infrastructure.

mod command;
mod errors;
mod events;
mod ids;
mod timestamp;

pub use command::{CommandMetadata, Requester};
pub use errors::{DomainError, ErrorCode, ErrorKind, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::{LiveEventId, RegistrationId, UserId};
pub use timestamp::Timestamp;
