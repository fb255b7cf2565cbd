//! Repository layer for database operations.
//!
//! This module provides repository structs that encapsulate database queries
//! and operations, following the Data Mapper pattern recommended by SeaORM.
//! Every method is generic over `ConnectionTrait`, so the same query runs on
//! the plain connection or inside a transaction.

pub mod activity;
pub mod attendance;
pub mod class_assignment;
pub mod period;
pub mod session;
pub mod student;

pub use activity::ActivityRepository;
pub use attendance::{ActivityPending, AttendanceRepository};
pub use class_assignment::ClassAssignmentRepository;
pub use period::PeriodRepository;
pub use session::SessionRepository;
pub use student::StudentRepository;
