//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time and RNG seeding
//! - Leaderboard HTTP transport (browser fetch)

#[cfg(target_arch = "wasm32")]
pub mod http;
pub mod time;

#[cfg(target_arch = "wasm32")]
pub use http::HttpLeaderboard;
pub use time::{entropy_seed, now_ms};
