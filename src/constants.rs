// This file contains constants for the prober and its codec process
// Sentinel tables used by the classifier live in src/probe/syntax.rs

// Codec process defaults
pub const DEFAULT_CODEC_PROGRAM: &str = "../oftr";
pub const DEFAULT_CODEC_ARGS: [&str; 3] = ["encode", "-jkR", "--silent-error"];
pub const ENV_CODEC_PROGRAM: &str = "PROBE_CODEC";
pub const ENV_CODEC_WRAPPER: &str = "CODEC_WRAPPER";

// Protocol versions stamped into every sample document
pub const MIN_VERSION: u8 = 1;
pub const DEFAULT_MAX_VERSION: u8 = 5;

// Fixed-size string widths recognized by the classifier
pub const DEFAULT_STRING_WIDTHS: [usize; 3] = [16, 32, 256];

// JSON Field Name Constants
pub const JSON_FIELD_MSG: &str = "msg";
pub const JSON_FIELD_TYPE: &str = "type";
pub const JSON_FIELD_VERSION: &str = "version";

// Message types whose label includes the `msg.type` subtype
pub const MULTIPART_TYPE_SUFFIXES: [&str; 2] = ["MULTIPART_REQUEST", "MULTIPART_REPLY"];

// Report
pub const REPORT_HEADER: [&str; 8] = [
    "version", "type", "keypath", "syntax", "required", "default", "missing", "modify",
];
pub const REPORT_MODIFY_ERROR: &str = "ERROR";
pub const REPORT_INCREMENT_ACCEPTED: &str = "OVERFLOW_ACCEPTED";

// Default log filter when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
