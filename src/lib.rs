//! Rollsync - offline-first attendance capture and sync
//!
//! This library keeps signed attendance records on the device and moves them
//! to the central server when a connection is available. Capture never needs
//! the network; uploads happen in small sequential batches so that a slow rural
//! link can make progress one batch at a time.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`config`] - Application configuration management
//! * [`storage`] - Local database, migrations and the single-flight open
//! * [`repositories`] - Queries over the local tables
//! * [`api`] - Wire format and HTTP client for the attendance server
//! * [`sync`] - Pending tracking, batch upload, bulk refresh and retention
//! * [`connectivity`] - Reachability probing and the reconnect trigger
//! * [`session`] - Login, refresh and the guarded logout
//! * [`capture`] - Recording and undoing signatures
//! * [`utils`] - Utility functions and helpers

/// Attendance server protocol: wire format and HTTP client
pub mod api;

/// Signature capture with location and compression hooks
pub mod capture;

/// Configuration module for managing application settings
pub mod config;

/// Reachability probes and the connectivity state machine
pub mod connectivity;

/// Application constants and default values
pub mod constants;

/// SeaORM entity models for database tables
pub mod entities;

/// Error taxonomy and user-facing messages
pub mod error;

/// Logging utilities for debugging and error tracking
pub mod logger;

/// Repository layer for database operations
pub mod repositories;

/// Session lifecycle and the logout gate
pub mod session;

/// Local storage layer for session, reference and attendance data
pub mod storage;

/// Synchronization engine for uploading captured attendance
pub mod sync;

/// Utility functions for date/time handling and other helpers
pub mod utils;

// Re-export entity models for convenient access
pub use entities::{activity, attendance_event, class_assignment, period, student};
pub use error::{AppError, Result};
