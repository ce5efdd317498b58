//! EventRouter - explicit type registry plus handler routing.
//!
//! Replaces reflection-style event mapping with data: each event type is
//! registered with a decoder proving the payload deserializes to its Rust
//! type, and with the set of handlers that consume it. The queue worker
//! dispatches through this table.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{EventHandler, EventSubscriber};

type Decoder = Arc<dyn Fn(&EventEnvelope) -> Result<(), DomainError> + Send + Sync>;

/// Failure reasons the worker treats as fatal (no retry, straight to DLQ).
pub const REASON_UNKNOWN_EVENT: &str = "unknown_event";
pub const REASON_PAYLOAD_ERROR: &str = "payload_error";

/// Routes event envelopes to typed handlers.
#[derive(Default)]
pub struct EventRouter {
    decoders: RwLock<HashMap<String, Decoder>>,
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event type with its payload type.
    ///
    /// Dispatch rejects envelopes whose payload does not deserialize to `T`,
    /// so schema drift surfaces at the router rather than inside handlers.
    pub fn register_type<T: DeserializeOwned + 'static>(&self, event_type: &str) {
        let decoder: Decoder = Arc::new(|envelope: &EventEnvelope| {
            envelope.payload_as::<T>().map(|_| ()).map_err(|e| {
                DomainError::new(
                    ErrorCode::InvalidFormat,
                    format!("Payload of {} failed to decode: {}", envelope.event_type, e),
                )
                .with_detail("reason", REASON_PAYLOAD_ERROR)
            })
        });
        self.decoders
            .write()
            .expect("EventRouter: decoders lock poisoned")
            .insert(event_type.to_string(), decoder);
    }

    /// Whether an event type has been registered.
    pub fn is_known(&self, event_type: &str) -> bool {
        self.decoders
            .read()
            .expect("EventRouter: decoders lock poisoned")
            .contains_key(event_type)
    }

    /// Decode-check and dispatch one envelope to every routed handler.
    ///
    /// Unknown types and undecodable payloads fail with a `reason` detail of
    /// `unknown_event` / `payload_error`; the worker treats those as fatal.
    /// Handler errors are collected and returned together (retryable).
    pub async fn dispatch(&self, envelope: &EventEnvelope) -> Result<(), DomainError> {
        let decoder = {
            let decoders = self
                .decoders
                .read()
                .expect("EventRouter: decoders lock poisoned");
            decoders.get(&envelope.event_type).cloned()
        };

        let decoder = decoder.ok_or_else(|| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("No type registered for {}", envelope.event_type),
            )
            .with_detail("reason", REASON_UNKNOWN_EVENT)
        })?;
        decoder(envelope)?;

        let routed: Vec<Arc<dyn EventHandler>> = {
            let handlers = self
                .handlers
                .read()
                .expect("EventRouter: handlers lock poisoned");
            handlers.get(&envelope.event_type).cloned().unwrap_or_default()
        };

        let mut errors = Vec::new();
        for handler in routed {
            if let Err(e) = handler.handle(envelope.clone()).await {
                errors.push(format!("{}: {}", handler.name(), e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::QueueError,
                format!("Handler errors: {}", errors.join(", ")),
            ))
        }
    }
}

impl EventSubscriber for EventRouter {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        self.handlers
            .write()
            .expect("EventRouter: handlers lock poisoned")
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }
}

/// True when the router error must not be retried.
pub fn is_fatal(error: &DomainError) -> bool {
    matches!(
        error.details.get("reason").map(String::as_str),
        Some(REASON_UNKNOWN_EVENT) | Some(REASON_PAYLOAD_ERROR)
    )
}
