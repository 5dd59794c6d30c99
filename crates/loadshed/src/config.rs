//! Admission control configuration types
//!
//! The set of tunables is small and fixed, so configuration is a plain
//! struct with documented defaults rather than builder options.

use crate::constants::{DEFAULT_EMA_ALPHA, DEFAULT_LIMIT, DEFAULT_WAITING_LIMIT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Configuration for [`Loadshedder`](crate::Loadshedder)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Maximum number of concurrent operations. Must be positive.
    #[serde(default = "default_limit")]
    #[validate(range(min = 1))]
    pub limit: usize,
    /// Maximum number of operations allowed to wait beyond `limit`.
    /// Usually a small fraction of `limit`, like 20-30%.
    /// If zero, operations are rejected immediately once the limit is
    /// reached.
    #[serde(default)]
    pub waiting_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            waiting_limit: DEFAULT_WAITING_LIMIT,
        }
    }
}

/// Configuration for [`QosShedder`](crate::QosShedder)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QosConfig {
    /// Maximum number of concurrent operations. Must be positive.
    #[serde(default = "default_limit")]
    #[validate(range(min = 1))]
    pub limit: usize,
    /// Projected-wait threshold for over-limit admission.
    /// If zero, every over-limit operation is rejected.
    #[serde(default)]
    pub max_wait_time: Duration,
    /// Smoothing factor for the duration moving average, in the open
    /// interval (0, 1).
    #[serde(default = "default_ema_alpha")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub ema_alpha: f64,
}

impl Default for QosConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            max_wait_time: Duration::ZERO,
            ema_alpha: DEFAULT_EMA_ALPHA,
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_ema_alpha() -> f64 {
    DEFAULT_EMA_ALPHA
}
