//! Session controller
//!
//! Screen state machine: menu, playing, game over, leaderboard. Owns at most
//! one engine (one per run), gates score submission on username validation,
//! and reconciles leaderboard replies inside the frame callback.
//!
//! | From        | Trigger           | To          |
//! |-------------|-------------------|-------------|
//! | menu        | select difficulty | menu        |
//! | menu        | start             | playing     |
//! | playing     | engine game over  | gameOver    |
//! | playing     | leave             | menu        |
//! | gameOver    | submit score      | gameOver    |
//! | gameOver    | play again        | playing     |
//! | gameOver    | back to menu      | menu        |
//! | menu        | show leaderboard  | leaderboard |
//! | leaderboard | back              | menu        |

pub mod username;

use std::rc::Rc;

use log::Level;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::consts::LEADERBOARD_VIEW_LEN;
use crate::error::{SessionError, UsernameError};
use crate::events::EventSink;
use crate::leaderboard::{LeaderboardEntry, LeaderboardReply, LeaderboardService, ScoreSubmission};
use crate::platform::time::{entropy_seed, now_ms};
use crate::settings::Settings;
use crate::sim::{Difficulty, Engine, GameOver, Playfield};

pub use username::validate_username;

/// Closed set of screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    Leaderboard,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Menu => "menu",
            Screen::Playing => "playing",
            Screen::GameOver => "gameOver",
            Screen::Leaderboard => "leaderboard",
        }
    }
}

/// Game-over notification handed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub score: u32,
    pub difficulty: Difficulty,
}

impl From<GameOver> for RunSummary {
    fn from(over: GameOver) -> Self {
        Self {
            score: over.score,
            difficulty: over.difficulty,
        }
    }
}

/// What the leaderboard screen shows
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LeaderboardView {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<LeaderboardEntry>),
    /// Fetch succeeded with no scores yet
    Empty,
    Failed(String),
}

/// The one submission allowed in flight
#[derive(Debug, Clone)]
struct PendingSubmission {
    /// Index of the run the score came from
    run: u64,
    username: String,
}

pub struct SessionController {
    screen: Screen,
    difficulty: Difficulty,
    engine: Option<Engine>,
    last_run: Option<RunSummary>,
    playfield: Playfield,
    leaderboard: Box<dyn LeaderboardService>,
    sink: Rc<dyn EventSink>,
    /// Fixed base seed; `None` seeds every run from the clock
    seed: Option<u64>,
    runs_started: u64,
    /// Run index of `last_run`
    last_run_index: u64,
    username_input: String,
    pending: Option<PendingSubmission>,
    /// Name from the latest accepted submission, until the host takes it
    accepted_username: Option<String>,
    status_message: Option<String>,
    leaderboard_view: LeaderboardView,
}

impl SessionController {
    pub fn new(
        settings: &Settings,
        leaderboard: Box<dyn LeaderboardService>,
        sink: Rc<dyn EventSink>,
    ) -> Self {
        Self {
            screen: Screen::Menu,
            difficulty: settings.difficulty,
            engine: None,
            last_run: None,
            playfield: Playfield::default(),
            leaderboard,
            sink,
            seed: None,
            runs_started: 0,
            last_run_index: 0,
            username_input: settings.username.clone(),
            pending: None,
            accepted_username: None,
            status_message: None,
            leaderboard_view: LeaderboardView::Idle,
        }
    }

    /// Derive every run's seed from `seed` (reproducible wall gaps)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_playfield(mut self, playfield: Playfield) -> Self {
        self.playfield = playfield;
        self
    }

    // === Transitions ===

    /// Menu: change the difficulty used by the next run
    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> Result<(), SessionError> {
        self.require(Screen::Menu, "select_difficulty")?;
        self.difficulty = difficulty;
        self.sink.emit(
            Level::Info,
            "difficulty_selected",
            json!({ "difficulty": difficulty.as_str() }),
        );
        Ok(())
    }

    /// Menu -> playing
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.require(Screen::Menu, "start")?;
        self.begin_run("start")
    }

    /// Game over -> playing
    pub fn play_again(&mut self) -> Result<(), SessionError> {
        self.require(Screen::GameOver, "play_again")?;
        self.begin_run("play_again")
    }

    /// Playing -> menu, cancelling the run
    pub fn leave(&mut self) -> Result<(), SessionError> {
        self.require(Screen::Playing, "leave")?;
        if let Some(mut engine) = self.engine.take() {
            engine.stop();
        }
        self.transition(Screen::Menu, "leave");
        Ok(())
    }

    /// Game over -> menu
    pub fn back_to_menu(&mut self) -> Result<(), SessionError> {
        self.require(Screen::GameOver, "back_to_menu")?;
        self.engine = None;
        self.status_message = None;
        self.transition(Screen::Menu, "back_to_menu");
        Ok(())
    }

    /// Menu -> leaderboard, requesting fresh entries
    pub fn show_leaderboard(&mut self) -> Result<(), SessionError> {
        self.require(Screen::Menu, "show_leaderboard")?;
        self.leaderboard_view = LeaderboardView::Loading;
        self.leaderboard.fetch_leaderboard();
        self.sink.emit(Level::Info, "leaderboard_requested", json!({}));
        self.transition(Screen::Leaderboard, "show_leaderboard");
        Ok(())
    }

    /// Leaderboard -> menu
    pub fn back(&mut self) -> Result<(), SessionError> {
        self.require(Screen::Leaderboard, "back")?;
        self.transition(Screen::Menu, "back");
        Ok(())
    }

    /// Game over: validate and send the finished run's score.
    ///
    /// The username is re-checked here even if the live input passed; a
    /// failing check or an in-flight submission never reaches the service.
    pub fn submit_score(&mut self, username: &str) -> Result<(), SessionError> {
        self.require(Screen::GameOver, "submit_score")?;
        self.username_input = username.to_string();

        if self.pending.is_some() {
            self.sink.emit(
                Level::Warn,
                "score_submission_rejected",
                json!({ "reason": "pending" }),
            );
            return Err(SessionError::SubmissionPending);
        }

        if let Err(err) = validate_username(username) {
            self.status_message = Some(err.to_string());
            self.sink.emit(
                Level::Warn,
                "score_submission_rejected",
                json!({ "reason": err.to_string() }),
            );
            return Err(err.into());
        }

        let run = self.last_run.ok_or(SessionError::NothingToSubmit)?;
        let submission = ScoreSubmission {
            username: username.to_string(),
            score: run.score,
            difficulty: run.difficulty,
            timestamp: now_ms(),
        };
        self.sink.emit(
            Level::Info,
            "score_submission_attempt",
            json!({
                "username": submission.username,
                "score": submission.score,
                "difficulty": submission.difficulty.as_str(),
            }),
        );
        self.pending = Some(PendingSubmission {
            run: self.last_run_index,
            username: submission.username.clone(),
        });
        self.status_message = Some("Submitting score...".to_string());
        self.leaderboard.submit_score(submission);
        Ok(())
    }

    // === Input/frame callbacks ===

    /// Flap input; ignored outside the playing screen
    pub fn jump(&mut self) {
        if self.screen != Screen::Playing {
            return;
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.apply_impulse();
        }
    }

    /// Update the live username field, returning its validation result
    pub fn set_username_input(&mut self, input: &str) -> Result<(), UsernameError> {
        self.username_input = input.to_string();
        validate_username(input)
    }

    /// One display frame: reconcile leaderboard replies, then step the engine
    /// once while it is running. Returns the game-over notification on the
    /// frame the run ends.
    pub fn frame(&mut self) -> Option<RunSummary> {
        self.pump_replies();

        if self.screen != Screen::Playing {
            return None;
        }
        let engine = self.engine.as_mut()?;
        if !engine.is_running() {
            return None;
        }
        let over = engine.step()?;
        Some(self.on_game_over(over))
    }

    /// Apply every completed leaderboard call
    pub fn pump_replies(&mut self) {
        while let Some(reply) = self.leaderboard.poll() {
            self.reconcile(reply);
        }
    }

    // === Read accessors ===

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Live score while playing, final score afterwards
    pub fn score(&self) -> u32 {
        match (&self.engine, self.last_run) {
            (Some(engine), _) if self.screen == Screen::Playing => engine.score(),
            (_, Some(run)) => run.score,
            _ => 0,
        }
    }

    pub fn playfield(&self) -> Playfield {
        self.playfield
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    pub fn last_run(&self) -> Option<RunSummary> {
        self.last_run
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn leaderboard_view(&self) -> &LeaderboardView {
        &self.leaderboard_view
    }

    pub fn username_input(&self) -> &str {
        &self.username_input
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    /// Username of the latest accepted submission, handed out once
    pub fn take_accepted_username(&mut self) -> Option<String> {
        self.accepted_username.take()
    }

    /// Whether the submit button should be enabled
    pub fn can_submit(&self) -> bool {
        self.screen == Screen::GameOver
            && self.last_run.is_some()
            && self.pending.is_none()
            && validate_username(&self.username_input).is_ok()
    }

    /// Whether the host should keep scheduling frames for the engine
    pub fn is_animating(&self) -> bool {
        self.screen == Screen::Playing && self.engine.as_ref().is_some_and(Engine::is_running)
    }

    // === Internals ===

    fn require(&self, screen: Screen, trigger: &'static str) -> Result<(), SessionError> {
        if self.screen == screen {
            return Ok(());
        }
        self.sink.emit(
            Level::Warn,
            "invalid_transition",
            json!({ "screen": self.screen.as_str(), "trigger": trigger }),
        );
        Err(SessionError::InvalidTransition {
            screen: self.screen,
            trigger,
        })
    }

    fn transition(&mut self, to: Screen, trigger: &'static str) {
        self.sink.emit(
            Level::Info,
            "screen_transition",
            json!({ "from": self.screen.as_str(), "to": to.as_str(), "trigger": trigger }),
        );
        self.screen = to;
    }

    fn next_seed(&mut self) -> u64 {
        self.runs_started += 1;
        match self.seed {
            Some(seed) => seed.wrapping_add(self.runs_started),
            None => entropy_seed(),
        }
    }

    fn begin_run(&mut self, trigger: &'static str) -> Result<(), SessionError> {
        let seed = self.next_seed();
        let mut engine = Engine::with_seed(self.playfield, self.sink.clone(), seed);
        engine.configure(self.difficulty)?;
        engine.start()?;
        self.engine = Some(engine);
        self.status_message = None;
        self.transition(Screen::Playing, trigger);
        Ok(())
    }

    fn on_game_over(&mut self, over: GameOver) -> RunSummary {
        let summary = RunSummary::from(over);
        self.last_run = Some(summary);
        self.last_run_index = self.runs_started;
        self.status_message = None;
        self.transition(Screen::GameOver, "game_over");
        summary
    }

    fn reconcile(&mut self, reply: LeaderboardReply) {
        match reply {
            LeaderboardReply::Submitted(result) => {
                let Some(pending) = self.pending.take() else {
                    log::warn!("Submission reply with nothing pending");
                    return;
                };
                // Feedback belongs to the game-over screen of the run that was sent
                let current =
                    self.screen == Screen::GameOver && pending.run == self.last_run_index;
                match result {
                    Ok(receipt) => {
                        self.sink.emit(
                            Level::Info,
                            "score_submission_result",
                            json!({ "success": true, "rank": receipt.rank }),
                        );
                        self.accepted_username = Some(pending.username);
                        if current {
                            self.username_input.clear();
                            self.status_message =
                                Some(format!("Score submitted! Rank #{}", receipt.rank));
                        }
                    }
                    Err(err) => {
                        self.sink.emit(
                            Level::Error,
                            "score_submission_result",
                            json!({ "success": false, "error": err.message }),
                        );
                        if current {
                            self.status_message = Some(format!("Failed to submit score: {err}"));
                        }
                    }
                }
            }
            LeaderboardReply::Fetched(Ok(mut entries)) => {
                entries.truncate(LEADERBOARD_VIEW_LEN);
                self.sink.emit(
                    Level::Info,
                    "leaderboard_loaded",
                    json!({ "entries": entries.len() }),
                );
                self.leaderboard_view = if entries.is_empty() {
                    LeaderboardView::Empty
                } else {
                    LeaderboardView::Loaded(entries)
                };
            }
            LeaderboardReply::Fetched(Err(err)) => {
                self.sink.emit(
                    Level::Warn,
                    "leaderboard_failed",
                    json!({ "error": err.message }),
                );
                self.leaderboard_view = LeaderboardView::Failed(err.message);
            }
        }
    }
}
