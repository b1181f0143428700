//! Flappy Kiro - A side-scrolling gravity arcade game
//!
//! Core modules:
//! - `sim`: Simulation engine (physics, wall generation, collisions, scoring)
//! - `session`: Screen state machine driving the engine and leaderboard
//! - `events`: Structured lifecycle/telemetry sink
//! - `leaderboard`: Score submission and ranking seam
//! - `settings`: Persisted player preferences
//! - `platform`: Browser/native platform abstraction

pub mod error;
pub mod events;
pub mod leaderboard;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{EngineError, SessionError, TransportError, UsernameError};
pub use events::{EventSink, LogSink, MemorySink, NoopSink};
pub use leaderboard::{LeaderboardEntry, LeaderboardService, MemoryLeaderboard, ScoreSubmission};
pub use session::{LeaderboardView, RunSummary, Screen, SessionController};
pub use settings::Settings;
pub use sim::{Difficulty, DifficultyProfile, Engine};

/// Game configuration constants
pub mod consts {
    /// Playfield dimensions (canvas pixels)
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;

    /// Actor defaults - horizontal position never changes during a run
    pub const ACTOR_X: f32 = 80.0;
    pub const ACTOR_WIDTH: f32 = 34.0;
    pub const ACTOR_HEIGHT: f32 = 24.0;

    /// Wall defaults
    pub const OBSTACLE_WIDTH: f32 = 60.0;
    /// Minimum solid wall kept above and below every gap
    pub const GAP_MARGIN: f32 = 50.0;

    /// Entries shown on the leaderboard screen
    pub const LEADERBOARD_VIEW_LEN: usize = 20;
    /// Entries the in-memory leaderboard retains
    pub const LEADERBOARD_RETAINED: usize = 100;
    /// Highest score a leaderboard accepts
    pub const MAX_SUBMITTED_SCORE: u32 = 10_000;

    /// Username length limit (characters)
    pub const USERNAME_MAX_LEN: usize = 20;
}
