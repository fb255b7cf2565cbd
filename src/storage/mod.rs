//! Local storage module for attendance data persistence
//!
//! This module provides database operations using SeaORM over SQLite for:
//! - The session singleton
//! - Reference data (class assignments, students, periods, activities)
//! - Attendance events and their upload status
//! - Schema versioning

pub mod db;
pub mod handle;
pub mod migrations;

pub use db::{LocalStorage, StoreLocation};
pub use handle::StoreHandle;
