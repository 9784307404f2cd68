//! Session store for a facilitated team retrospective.
//!
//! A retro walks through a fixed set of [`models::RetroStep`]s: icebreaker,
//! review of last retro's action items, note capture, topic grouping with a
//! limited vote budget, and checkout. [`store::SessionStore`] owns the
//! session state and keeps a durable [`snapshot`] in a pluggable
//! [`storage::SnapshotStorage`] backend such as [`db::Database`].

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod snapshot;
pub mod storage;
pub mod store;
