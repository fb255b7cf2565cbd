//! Utility modules for rollsync.
//!
//! - [`datetime`] - date/time formats shared by the store and the wire protocol

pub mod datetime;
