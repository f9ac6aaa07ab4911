//! Guild chat bot with an S3-backed configuration store, a disk-mirrored
//! media library, and a dotted-name command dispatcher.
//!
//! The library half is platform-neutral: command handlers talk to the chat
//! platform only through [`context::ChatContext`] and to durable state only
//! through [`storage::ObjectCache`]. The binary in `main.rs` wires both to
//! Telegram and S3.

/// Telegram transport glue
pub mod bot;
/// Application settings loading
pub mod config;
/// Reply surface handed to command handlers
pub mod context;
/// Command registry and dispatch
pub mod dispatch;
/// Per-guild configuration documents
pub mod guild;
/// Localized resource files
pub mod locale;
/// Feature command groups
pub mod modules;
/// Per-guild playback queues
pub mod queue;
/// Media catalogue and search index
pub mod search;
/// Shared process state
pub mod state;
/// Remote object store and its local disk mirror
pub mod storage;
/// Test fixtures shared by unit and integration tests
pub mod testing;
