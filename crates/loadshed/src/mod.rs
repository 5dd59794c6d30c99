//! # loadshed
//!
//! In-process admission control: bound the number of simultaneously
//! executing operations, optionally queue the excess for a bounded time,
//! and shed the rest.
//!
//! Two admission policies share one acquire/release/stats contract:
//!
//! | Engine | Policy |
//! |--------|--------|
//! | [`Loadshedder`] | Bounded FIFO waiting queue on a counting semaphore |
//! | [`QosShedder`]  | Non-blocking projected-wait admission from a duration EMA |
//!
//! Rejection is a first-class outcome, not an error: acquire always returns
//! a [`Token`] whose [`Token::accepted`] flag the caller must check. Every
//! call also returns a [`Stats`] snapshot, so occupancy never needs a
//! separate polling step. Observability is wired by the caller through the
//! [`Reporter`] hooks.
//!
//! ```
//! use loadshed::{Config, Loadshedder};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let shedder = Loadshedder::new(Config {
//!     limit: 2,
//!     waiting_limit: 0,
//! });
//!
//! let cancel = CancellationToken::new();
//! let (stats, token) = shedder.acquire(&cancel).await;
//! assert!(token.accepted());
//! assert_eq!(stats.running, 1);
//!
//! // ... do the guarded work ...
//!
//! shedder.release(&token);
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod duration;
pub mod error;
pub mod guard;
pub mod qos;
pub mod reporter;
pub mod shedder;
pub mod stats;
pub mod token;

// Re-export commonly used types
pub use config::{Config, QosConfig};
pub use duration::DurationTracker;
pub use error::{Error, Result};
pub use guard::SlotGuard;
pub use qos::QosShedder;
pub use reporter::{LogReporter, NullReporter, Reporter};
pub use shedder::Loadshedder;
pub use stats::Stats;
pub use token::Token;
