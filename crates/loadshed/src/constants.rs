//! Centralized configuration constants

/// Default maximum number of concurrently admitted operations.
pub const DEFAULT_LIMIT: usize = 100;

/// Default number of operations allowed to wait beyond the limit.
///
/// Zero disables the waiting queue: excess operations are rejected
/// immediately.
pub const DEFAULT_WAITING_LIMIT: usize = 0;

/// Default smoothing factor for the duration moving average.
///
/// Low values favor stability over reactivity; 0.1 weighs roughly the last
/// ten observations.
pub const DEFAULT_EMA_ALPHA: f64 = 0.1;
