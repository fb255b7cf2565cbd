//! Constants used throughout the application
//!
//! This module centralizes protocol limits, placeholder values and the
//! user-facing text so the sync engine and the CLI agree on them.

// Protocol defaults
pub const DEFAULT_ENDPOINT: &str = "https://accionhonduras.org/participacion/admin/api_sync.php";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_BATCH_PAUSE_MS: u64 = 500;
pub const DEFAULT_RETENTION_DAYS: u32 = 50;
pub const DEFAULT_LOCATION_TIMEOUT_SECS: u64 = 4;
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 15;
/// Reachability probes give up much earlier than real requests.
pub const PROBE_TIMEOUT_SECS: u64 = 5;
/// How much of an unexpected (HTML) body is kept for diagnosis.
pub const RESPONSE_EXCERPT_CHARS: usize = 150;
/// Rows per INSERT statement during bulk refresh.
pub const INSERT_CHUNK_SIZE: usize = 100;

// Placeholder values written instead of NULL
pub const NO_GPS: &str = "Sin GPS";
pub const NO_PERIOD_LABEL: &str = "Sin Periodo";
pub const MISSING_FIELD: &str = "N/D";
pub const SESSION_LOCATION_LABEL: &str = "Docente Activo";
pub const SIGNATURE_DATA_URI_PREFIX: &str = "data:image";
pub const DEFAULT_SIGNATURE_MIME: &str = "image/png";

// Success Messages
pub const SUCCESS_LOGIN: &str = "✅ Data downloaded successfully";
pub const SUCCESS_REFRESH: &str = "✅ Reference data refreshed";
pub const SUCCESS_SYNC: &str = "✅ Attendance uploaded";
pub const SUCCESS_NOTHING_PENDING: &str = "✅ Nothing pending, everything is uploaded";
pub const SUCCESS_CAPTURED: &str = "✅ Attendance saved";
pub const SUCCESS_UNDONE: &str = "✅ Attendance removed";
pub const SUCCESS_LOGOUT: &str = "♻️ Session closed and local data wiped";

// Error Messages
pub const ERROR_STORE_UNAVAILABLE: &str = "❌ Could not open the local database";
pub const ERROR_STORE: &str = "❌ Local database error";
pub const ERROR_NETWORK_UNREACHABLE: &str = "❌ No internet connection";
pub const ERROR_TIMEOUT: &str = "⏳ The connection is too slow, the server did not answer in time";
pub const ERROR_SERVER_REJECTED: &str = "❌ The server rejected the request";
pub const ERROR_MALFORMED_RESPONSE: &str = "❌ The server returned an unexpected (HTML) response";
pub const ERROR_INVALID_SNAPSHOT: &str = "❌ The downloaded data is incomplete";
pub const ERROR_PARTIAL_UPLOAD: &str = "❌ Upload stopped at batch";
pub const ERROR_NOT_AUTHENTICATED: &str = "❌ No active session, please log in";
pub const ERROR_PENDING_UPLOADS: &str = "⚠️ There are signatures waiting to be uploaded, sync before logging out";
pub const ERROR_ALREADY_CAPTURED: &str = "⚠️ This student already signed for this activity today";
pub const ERROR_SYNC_IN_PROGRESS: &str = "⚠️ A synchronization is already running";
pub const ERROR_DEFAULT_SERVER_MESSAGE: &str = "Unknown server error";

// UI Messages
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";
