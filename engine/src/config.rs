//! Application configuration constants
//!
//! Central location for all configuration constants, timing windows,
//! and generated-value formats used throughout the engine.

// ===== Input Timing =====

/// Quiet window for the search box in milliseconds.
/// Only the last keystroke inside this window filters and renders.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Interval between task reminder scans in seconds
pub const REMINDER_SCAN_INTERVAL_SECS: u64 = 30;

// ===== Drafts =====

/// Draft key used for a chart that has not been committed yet
pub const NEW_RECORD_DRAFT_KEY: &str = "__new__";

// ===== Generated Values =====

/// Prefix of generated medical record numbers
pub const MRN_PREFIX: &str = "MRN";

/// Number of trailing timestamp digits in a generated MRN
pub const MRN_DIGITS: usize = 6;

/// Glasgow Coma Scale value assumed for a fully alert patient
pub const DEFAULT_GCS: &str = "15";

/// Date format used for admission dates
pub const ADMISSION_DATE_FORMAT: &str = "%Y-%m-%d";

// ===== Notifications =====

/// Sound played when a new alert arrives from the backend
pub const ALERT_SOUND: &str = "alert";

/// Sound played when a task reminder becomes due
pub const REMINDER_SOUND: &str = "chime";

// ===== Realtime =====

/// Buffered change events per subscriber before lagging receivers skip ahead
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

// ===== Storage =====

/// SQLite database file name inside the app data directory
pub const DATABASE_FILE: &str = "charts.db";

/// Settings file name inside the app data directory
pub const SETTINGS_FILE: &str = "settings.json";
