//! Simulation engine
//!
//! Owns one run at a time and exposes the lifecycle contract the session
//! controller drives: configure, start, flap, step, stop. Tick rate is the
//! caller's concern; one `step()` call is one tick.

use std::rc::Rc;

use log::Level;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde_json::json;

use super::difficulty::DifficultyProfile;
use super::state::{GameOver, Playfield, RunState};
use super::tick::tick;
use crate::error::EngineError;
use crate::events::EventSink;

pub struct Engine {
    playfield: Playfield,
    profile: Option<DifficultyProfile>,
    run: Option<RunState>,
    rng: Pcg32,
    sink: Rc<dyn EventSink>,
}

impl Engine {
    /// Engine with a wall-clock seed
    pub fn new(playfield: Playfield, sink: Rc<dyn EventSink>) -> Self {
        Self::with_seed(playfield, sink, crate::platform::time::entropy_seed())
    }

    /// Engine with a fixed seed for reproducible wall gaps
    pub fn with_seed(playfield: Playfield, sink: Rc<dyn EventSink>, seed: u64) -> Self {
        Self {
            playfield,
            profile: None,
            run: None,
            rng: Pcg32::seed_from_u64(seed),
            sink,
        }
    }

    /// Bind a difficulty profile. Must not be called while a run is active.
    pub fn configure(&mut self, profile: impl Into<DifficultyProfile>) -> Result<(), EngineError> {
        if self.is_running() {
            return Err(EngineError::InvalidState {
                operation: "configure",
                reason: "a run is active",
            });
        }
        self.profile = Some(profile.into());
        Ok(())
    }

    /// Discard any previous run and begin a fresh one
    pub fn start(&mut self) -> Result<(), EngineError> {
        let profile = self.profile.ok_or(EngineError::InvalidState {
            operation: "start",
            reason: "no difficulty profile configured",
        })?;
        self.run = Some(RunState::new(profile, &self.playfield));
        self.sink.emit(
            Level::Info,
            "run_started",
            json!({
                "difficulty": profile.difficulty.as_str(),
                "gravity": profile.gravity,
                "impulse": profile.impulse,
                "scroll_speed": profile.scroll_speed,
                "gap_size": profile.gap_size,
                "spacing": profile.spacing,
            }),
        );
        Ok(())
    }

    /// Halt the run. Safe from any state.
    pub fn stop(&mut self) {
        if let Some(run) = self.run.as_mut() {
            if run.running {
                run.running = false;
                self.sink.emit(
                    Level::Info,
                    "run_stopped",
                    json!({
                        "score": run.score,
                        "difficulty": run.profile.difficulty.as_str(),
                    }),
                );
            }
        }
    }

    /// Flap: overwrite vertical velocity with the profile impulse.
    /// Ignored unless running; repeated calls before a tick are idempotent.
    pub fn apply_impulse(&mut self) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if !run.running || run.terminal {
            return;
        }
        run.actor.vel = run.profile.impulse;
        self.sink.emit(
            Level::Debug,
            "impulse",
            json!({ "y": run.actor.pos.y, "velocity": run.actor.vel }),
        );
    }

    /// Advance one tick. Returns the game-over signal on the tick the run ends.
    pub fn step(&mut self) -> Option<GameOver> {
        let run = self.run.as_mut()?;
        if !run.running || run.terminal {
            return None;
        }

        let outcome = tick(run, &self.playfield, &mut self.rng);

        if let Some(id) = outcome.spawned {
            if let Some(wall) = run.newest_obstacle() {
                self.sink.emit(
                    Level::Debug,
                    "obstacle_spawned",
                    json!({ "id": id, "gap_top": wall.gap_top, "gap_bottom": wall.gap_bottom }),
                );
            }
        }

        for n in 0..outcome.scored {
            let score = run.score - outcome.scored + n + 1;
            self.sink
                .emit(Level::Info, "score_incremented", json!({ "score": score }));
        }

        let reason = outcome.collision?;
        let game_over = GameOver {
            score: run.score,
            difficulty: run.profile.difficulty,
            reason,
        };
        self.sink.emit(
            Level::Info,
            "collision",
            json!({
                "kind": reason.as_str(),
                "y": run.actor.pos.y,
                "tick": run.time_ticks,
            }),
        );
        self.sink.emit(
            Level::Info,
            "run_ended",
            json!({
                "score": game_over.score,
                "difficulty": game_over.difficulty.as_str(),
                "reason": reason.as_str(),
                "ticks": run.time_ticks,
            }),
        );
        Some(game_over)
    }

    pub fn score(&self) -> u32 {
        self.run.as_ref().map_or(0, |run| run.score)
    }

    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|run| run.running)
    }

    pub fn is_terminal(&self) -> bool {
        self.run.as_ref().is_some_and(|run| run.terminal)
    }

    pub fn profile(&self) -> Option<&DifficultyProfile> {
        self.profile.as_ref()
    }

    /// Current run, for rendering
    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::events::{MemorySink, NoopSink};
    use crate::sim::{CollisionKind, Difficulty};
    use proptest::prelude::*;

    fn engine() -> Engine {
        Engine::with_seed(Playfield::default(), Rc::new(NoopSink), 99)
    }

    fn started(difficulty: Difficulty) -> Engine {
        let mut engine = engine();
        engine.configure(difficulty).unwrap();
        engine.start().unwrap();
        engine
    }

    /// Flap whenever the actor sinks below the next gap's centre
    fn autopilot(engine: &mut Engine) {
        let Some(run) = engine.run() else { return };
        let target = run
            .obstacles
            .iter()
            .find(|w| w.trailing_edge() > run.actor.pos.x)
            .map(|w| (w.gap_top + w.gap_bottom) / 2.0)
            .unwrap_or(PLAYFIELD_HEIGHT / 2.0);
        if run.actor.bottom() > target + 20.0 && run.actor.vel > 0.0 {
            engine.apply_impulse();
        }
    }

    #[test]
    fn test_start_requires_configure() {
        let mut engine = engine();
        assert!(matches!(
            engine.start(),
            Err(EngineError::InvalidState { operation: "start", .. })
        ));
        assert!(!engine.is_running());
    }

    #[test]
    fn test_configure_while_running_fails() {
        let mut engine = started(Difficulty::Easy);
        assert!(matches!(
            engine.configure(Difficulty::Hard),
            Err(EngineError::InvalidState { operation: "configure", .. })
        ));
        assert_eq!(engine.profile().unwrap().difficulty, Difficulty::Easy);

        engine.stop();
        engine.configure(Difficulty::Hard).unwrap();
        assert_eq!(engine.profile().unwrap().difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_easy_scenario_step_and_impulse() {
        let mut engine = started(Difficulty::Easy);
        let run = engine.run().unwrap();
        assert_eq!(run.actor.pos.y, 300.0);
        assert_eq!(run.actor.vel, 0.0);

        engine.step();
        let run = engine.run().unwrap();
        assert!((run.actor.vel - 0.3).abs() < 1e-5);
        assert!((run.actor.pos.y - 300.3).abs() < 1e-4);

        let mut engine = started(Difficulty::Easy);
        engine.apply_impulse();
        engine.step();
        let run = engine.run().unwrap();
        assert!((run.actor.vel - (-5.7)).abs() < 1e-5);
        assert!((run.actor.pos.y - 294.3).abs() < 1e-4);
    }

    #[test]
    fn test_repeated_impulse_is_overwrite() {
        let mut engine = started(Difficulty::Medium);
        engine.apply_impulse();
        engine.apply_impulse();
        engine.apply_impulse();
        assert_eq!(engine.run().unwrap().actor.vel, -7.0);
        engine.step();
        assert!((engine.run().unwrap().actor.vel - (-6.6)).abs() < 1e-5);
    }

    #[test]
    fn test_start_fully_resets() {
        let mut engine = started(Difficulty::Easy);
        for _ in 0..30 {
            engine.step();
        }
        engine.start().unwrap();
        let run = engine.run().unwrap();
        assert_eq!(run.actor.pos.y, PLAYFIELD_HEIGHT / 2.0);
        assert_eq!(run.actor.vel, 0.0);
        assert!(run.obstacles.is_empty());
        assert_eq!(run.score, 0);
        assert!(engine.is_running());
        assert!(!engine.is_terminal());
    }

    #[test]
    fn test_game_over_on_floor() {
        let sink = Rc::new(MemorySink::new());
        let mut engine = Engine::with_seed(Playfield::default(), sink.clone(), 5);
        engine.configure(Difficulty::Hard).unwrap();
        engine.start().unwrap();

        let mut signal = None;
        for _ in 0..500 {
            if let Some(over) = engine.step() {
                signal = Some(over);
                break;
            }
        }
        let over = signal.expect("falling actor must hit the floor");
        assert_eq!(over.reason, CollisionKind::Boundary);
        assert_eq!(over.score, 0);
        assert_eq!(over.difficulty, Difficulty::Hard);
        assert!(engine.is_terminal());
        assert!(!engine.is_running());

        assert_eq!(sink.count("run_started"), 1);
        assert_eq!(sink.named("collision")[0].data["kind"], "boundary");
        assert_eq!(sink.named("run_ended")[0].data["difficulty"], "hard");
    }

    #[test]
    fn test_terminal_ignores_step_and_impulse() {
        let mut engine = started(Difficulty::Easy);
        while engine.step().is_none() {}
        let before = engine.run().unwrap().clone();
        engine.apply_impulse();
        assert!(engine.step().is_none());
        let after = engine.run().unwrap();
        assert_eq!(after.actor, before.actor);
        assert_eq!(after.time_ticks, before.time_ticks);
        assert_eq!(after.score, before.score);
    }

    #[test]
    fn test_stop_halts_without_terminal() {
        let sink = Rc::new(MemorySink::new());
        let mut engine = Engine::with_seed(Playfield::default(), sink.clone(), 5);
        engine.stop();
        engine.configure(Difficulty::Easy).unwrap();
        engine.start().unwrap();
        engine.step();
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
        assert!(!engine.is_terminal());
        assert!(engine.step().is_none());
        assert_eq!(sink.count("run_stopped"), 1);
    }

    #[test]
    fn test_autopilot_scores_and_emits_each_increment() {
        let sink = Rc::new(MemorySink::new());
        let mut engine = Engine::with_seed(Playfield::default(), sink.clone(), 11);
        engine.configure(Difficulty::Easy).unwrap();
        engine.start().unwrap();
        for _ in 0..3_000 {
            autopilot(&mut engine);
            if engine.step().is_some() {
                break;
            }
        }
        let score = engine.score();
        assert!(score >= 1, "autopilot should clear at least one wall");
        let increments = sink.named("score_incremented");
        assert_eq!(increments.len() as u32, score);
        for (i, event) in increments.iter().enumerate() {
            assert_eq!(event.data["score"], i as u32 + 1);
        }
    }

    proptest! {
        #[test]
        fn prop_score_monotonic_and_bounded(seed in any::<u64>(), flaps in proptest::collection::vec(any::<bool>(), 1..600)) {
            let mut engine = Engine::with_seed(Playfield::default(), Rc::new(NoopSink), seed);
            engine.configure(Difficulty::Easy).unwrap();
            engine.start().unwrap();
            let mut last = engine.score();
            for flap in flaps {
                if flap {
                    engine.apply_impulse();
                }
                let over = engine.step();
                let score = engine.score();
                prop_assert!(score >= last);
                prop_assert!(score - last <= 1);
                last = score;
                if over.is_some() {
                    prop_assert!(engine.is_terminal());
                    break;
                }
            }
        }

        #[test]
        fn prop_velocity_law(seed in any::<u64>(), flaps in proptest::collection::vec(any::<bool>(), 1..40)) {
            let mut engine = Engine::with_seed(Playfield::default(), Rc::new(NoopSink), seed);
            engine.configure(Difficulty::Medium).unwrap();
            engine.start().unwrap();
            let gravity = Difficulty::Medium.profile().gravity;
            let impulse = Difficulty::Medium.profile().impulse;
            for flap in flaps {
                if !engine.is_running() {
                    break;
                }
                let before = engine.run().unwrap().actor.vel;
                if flap {
                    engine.apply_impulse();
                }
                engine.step();
                let after = engine.run().unwrap().actor.vel;
                let expected = if flap { impulse + gravity } else { before + gravity };
                prop_assert!((after - expected).abs() < 1e-4);
            }
        }

        #[test]
        fn prop_gaps_within_bounds(seed in any::<u64>()) {
            let mut engine = Engine::with_seed(Playfield::default(), Rc::new(NoopSink), seed);
            for d in Difficulty::ALL {
                engine.configure(d).unwrap();
                engine.start().unwrap();
                engine.step();
                let run = engine.run().unwrap();
                prop_assert_eq!(run.obstacles.len(), 1);
                let wall = &run.obstacles[0];
                prop_assert!(wall.top_segment_height() >= 0.0);
                prop_assert!(wall.bottom_segment_height(PLAYFIELD_HEIGHT) >= 0.0);
                prop_assert_eq!(wall.gap_bottom, wall.gap_top + d.profile().gap_size);
                engine.stop();
            }
        }
    }
}
