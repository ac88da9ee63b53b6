//! Constants for the download module (timeouts, throttling, concurrency).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Upper bound for the fixed pre-fetch delay, in milliseconds.
pub const MAX_DELAY_MS: u64 = 60_000;

/// Default number of rows admitted per batch. 1 means strictly sequential.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;
