//! Notification delivery for slot monitor runs.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable notification channels
//! - Chat webhook notifier implementation
//! - Dispatcher that owns the optional report and alert channels

pub mod dispatcher;
pub mod traits;
pub mod webhook;

pub use dispatcher::{Channel, Dispatcher};
pub use traits::{DeliveryResult, MessageKind, Notification, Notifier, NotifyError};
