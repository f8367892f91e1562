//! Input bounds and layout constants.
//!
//! The enabled map arrives from an untrusted UI boundary, so its size is
//! bounded before any key is sanitized.

/// Maximum number of entries accepted in one enabled map.
pub const MAX_ENABLED_KEYS: usize = 4096;

/// Maximum length of a sanitized property key, in characters.
pub const MAX_KEY_LEN: usize = 256;

/// Vertical gap between the viewport center and the placed component.
pub const VIEWPORT_PADDING: f64 = 100.0;

/// Default time to wait for a refresh acknowledgement, in milliseconds.
pub const DEFAULT_REFRESH_TIMEOUT_MS: u64 = 10_000;
