pub mod activity;
pub mod attendance_event;
pub mod class_assignment;
pub mod period;
pub mod schema_version;
pub mod session;
pub mod student;

pub use activity::Entity as Activity;
pub use attendance_event::Entity as AttendanceEvent;
pub use attendance_event::UploadStatus;
pub use class_assignment::Entity as ClassAssignment;
pub use period::Entity as Period;
pub use schema_version::Entity as SchemaVersion;
pub use session::Entity as Session;
pub use student::Entity as Student;
