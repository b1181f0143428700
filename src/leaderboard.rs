//! Leaderboard seam
//!
//! The session controller talks to a leaderboard through a request/poll
//! interface: calls return immediately and completed results are drained with
//! `poll()` from inside the frame loop. `MemoryLeaderboard` is the in-process
//! implementation used natively and in tests; the browser build uses
//! `platform::HttpLeaderboard`.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::consts::{LEADERBOARD_RETAINED, LEADERBOARD_VIEW_LEN, MAX_SUBMITTED_SCORE};
use crate::error::TransportError;
use crate::session::username::validate_username;
use crate::sim::Difficulty;

/// A ranked row, as returned by the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u32,
    pub difficulty: Difficulty,
}

/// Score submission payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub username: String,
    pub score: u32,
    pub difficulty: Difficulty,
    /// Unix timestamp (ms) of submission
    pub timestamp: f64,
}

impl ScoreSubmission {
    pub fn entry(&self) -> LeaderboardEntry {
        LeaderboardEntry {
            username: self.username.clone(),
            score: self.score,
            difficulty: self.difficulty,
        }
    }
}

/// Successful submission acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// 1-indexed position of the new score
    pub rank: usize,
}

/// A completed leaderboard call
#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardReply {
    Submitted(Result<SubmitReceipt, TransportError>),
    Fetched(Result<Vec<LeaderboardEntry>, TransportError>),
}

/// Score storage reached asynchronously
pub trait LeaderboardService {
    /// Issue a submission; the result arrives later through `poll()`
    fn submit_score(&mut self, submission: ScoreSubmission);
    /// Request the top entries, score descending; the result arrives through `poll()`
    fn fetch_leaderboard(&mut self);
    /// Next completed call, if any
    fn poll(&mut self) -> Option<LeaderboardReply>;
}

impl<T: LeaderboardService + ?Sized> LeaderboardService for Rc<RefCell<T>> {
    fn submit_score(&mut self, submission: ScoreSubmission) {
        self.borrow_mut().submit_score(submission);
    }

    fn fetch_leaderboard(&mut self) {
        self.borrow_mut().fetch_leaderboard();
    }

    fn poll(&mut self) -> Option<LeaderboardReply> {
        self.borrow_mut().poll()
    }
}

/// Aggregate figures over retained scores
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LeaderboardStats {
    pub total_games: usize,
    /// Rounded to 2 decimal places
    pub average_score: f64,
    pub highest_score: u32,
    pub difficulty_distribution: BTreeMap<Difficulty, usize>,
}

/// In-process leaderboard
///
/// Validates like a server would, keeps the best `LEADERBOARD_RETAINED`
/// scores sorted descending (ties keep submission order) and answers
/// fetches with the top `LEADERBOARD_VIEW_LEN`.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaderboard {
    entries: Vec<ScoreSubmission>,
    replies: VecDeque<LeaderboardReply>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a submission, returning its rank
    pub fn record(&mut self, submission: ScoreSubmission) -> Result<SubmitReceipt, TransportError> {
        validate_username(&submission.username).map_err(|e| TransportError::new(e.to_string()))?;
        if submission.score > MAX_SUBMITTED_SCORE {
            return Err(TransportError::new(format!(
                "Score must be between 0 and {MAX_SUBMITTED_SCORE}"
            )));
        }

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| submission.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, submission);
                i + 1
            }
            None => {
                self.entries.push(submission);
                self.entries.len()
            }
        };

        self.entries.truncate(LEADERBOARD_RETAINED);
        log::info!("Leaderboard recorded score at rank {} ({} retained)", rank, self.entries.len());

        Ok(SubmitReceipt { rank })
    }

    /// Top `n` entries, score descending
    pub fn top(&self, n: usize) -> Vec<LeaderboardEntry> {
        self.entries.iter().take(n).map(ScoreSubmission::entry).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    pub fn stats(&self) -> LeaderboardStats {
        if self.entries.is_empty() {
            return LeaderboardStats::default();
        }
        let total_games = self.entries.len();
        let sum: u64 = self.entries.iter().map(|e| u64::from(e.score)).sum();
        let average = sum as f64 / total_games as f64;
        let mut difficulty_distribution = BTreeMap::new();
        for e in &self.entries {
            *difficulty_distribution.entry(e.difficulty).or_insert(0) += 1;
        }
        LeaderboardStats {
            total_games,
            average_score: (average * 100.0).round() / 100.0,
            highest_score: self.top_score().unwrap_or(0),
            difficulty_distribution,
        }
    }
}

impl LeaderboardService for MemoryLeaderboard {
    fn submit_score(&mut self, submission: ScoreSubmission) {
        let result = self.record(submission);
        self.replies.push_back(LeaderboardReply::Submitted(result));
    }

    fn fetch_leaderboard(&mut self) {
        let entries = self.top(LEADERBOARD_VIEW_LEN);
        self.replies.push_back(LeaderboardReply::Fetched(Ok(entries)));
    }

    fn poll(&mut self) -> Option<LeaderboardReply> {
        self.replies.pop_front()
    }
}
