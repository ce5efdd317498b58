//! Gatherly - live-event sign-up service.
//!
//! The core of the system is the registration/waitlist engine and the
//! reliable domain-event pipeline around it: commands mutate state and
//! write outbox rows in one transaction under a per-event advisory lock;
//! ordering-sensitive events (promotion, reindexing) run synchronously
//! in-process, the rest drain through the outbox queue worker.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
