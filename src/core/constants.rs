// Recording constants for ICB projects

// Fixed 50 Hz sampling: one reading every 20 ms
pub const SAMPLE_INTERVAL_US: i64 = 20_000;

// Raw readings are divided by this before display
pub const SAMPLE_SCALE: f64 = 10.0;

// Each reading is one little-endian i16
pub const READING_SIZE: usize = 2;

// Point annotations are widened by this on both sides before a range query.
// Slightly under one sample interval so at most one reading is captured.
pub const POINT_TOLERANCE_MS: i64 = 19;

// "Go to" viewport padding for point annotations
pub const POINT_FOCUS_SECS: i64 = 5;
pub const POINT_FOCUS_HALF_HEIGHT: f64 = 30.0;

// Range annotations are padded by 1/15 of their width
pub const RANGE_FOCUS_DIVISOR: i32 = 15;

pub const CALIBRATION_EXTENSION: &str = "cal";
pub const SAMPLE_EXTENSION: &str = "wav";
pub const ANNOTATION_EXTENSION: &str = "json";
pub const ANNOTATION_FILE_NAME: &str = "annotations.json";

// Appended to an unreadable annotation file name before it is overwritten
pub const BACKUP_SUFFIX: &str = ".bak";

// First line of a .cal file, e.g. "01-01-2023 10:00:00"
pub const CALIBRATION_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";
pub const CALIBRATION_TIME_SHAPE: &str = "dd-dd-dddd dd:dd:dd";

// Filename prefix shared by .cal and .wav files: DD-MM-YYYY_HH_MM_SS_
pub const FILE_STAMP_SHAPE: &str = "dd-dd-dddd_dd_dd_dd_";
pub const MAX_SEQUENCE_DIGITS: usize = 4;

// Path handed over by a file dialog when the user pressed cancel
pub const CANCEL_SENTINEL: &str = "/";

pub const DEFAULT_COLOR: (u8, u8, u8) = (255, 0, 0);
