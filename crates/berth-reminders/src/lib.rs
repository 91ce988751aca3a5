//! # berth-reminders
//!
//! Durable reminder persistence for a distributed-actor runtime.
//!
//! A reminder is a periodic wake-up registration owned by one entity. Each
//! registration is one document keyed by `(service, owner, name)` and
//! carries a 32-bit ring hash of its owner, so the runtime's scheduling
//! subsystem can claim responsibility for ring ranges and query exactly the
//! reminders that fall inside them — including ranges that wrap around the
//! ring.
//!
//! - [`ReminderLedger`]: point/owner/range reads, upsert, conditional remove
//! - [`ring`]: the owner hash and the wrap-around interval arithmetic

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod docs;
pub mod reminders;
pub mod ring;
pub mod types;

pub use reminders::ReminderLedger;
pub use types::{EntityId, ReminderEntry, StartAt};
