//! bitBond client core
//!
//! Discovery (swipe a queue of candidate profiles into connection intents),
//! a session gate that holds everything back until the identity check
//! resolves, and pollers that keep the messaging, notification and
//! connection surfaces current.

/// Horizontal drag distance that turns a release into a committed swipe
pub const SWIPE_THRESHOLD: f32 = 100.0;

/// Poll intervals per surface
/// Messages refresh fast (open conversation), notifications slowly (badge)
pub const MESSAGE_POLL_INTERVAL_MS: u64 = 3_000;
pub const NOTIFICATION_POLL_INTERVAL_MS: u64 = 30_000;

/// A poll cycle is skipped if the previous one started or landed less than
/// this long ago (manual refresh colliding with a timer tick)
pub const POLL_GUARD_WINDOW_MS: u64 = 1_000;

/// Initialize logging - call once early in main()
///
/// RUST_LOG overrides the default filter.
pub fn init_logging() {
    // Filter out noisy reqwest/hyper debug logs
    let env = env_logger::Env::default().default_filter_or("info,reqwest=warn,hyper_util=warn");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

pub mod config;
pub mod discovery;
pub mod network;
pub mod session;
pub mod sync;
pub mod types;

pub use config::Config;
pub use discovery::{DiscoveryEngine, DiscoveryError, FeedView};
pub use network::{ApiError, Backend, HttpBackend};
pub use session::{AppContext, SessionGate};

pub use types::*;
