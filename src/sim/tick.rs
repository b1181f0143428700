//! Discrete simulation tick
//!
//! Advances a run by one step. Order within a tick is fixed:
//! integrate, generate, scroll, retire/score, boundary check, wall check.

use rand::Rng;

use super::collision::check_collisions;
use super::state::{CollisionKind, Obstacle, Playfield, RunState};
use crate::consts::GAP_MARGIN;

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// Walls retired and scored this tick
    pub scored: u32,
    /// ID of the wall created this tick
    pub spawned: Option<u32>,
    /// Terminal collision, if any
    pub collision: Option<CollisionKind>,
}

/// Advance the run by one tick. No-op unless running and not terminal.
pub fn tick<R: Rng>(run: &mut RunState, playfield: &Playfield, rng: &mut R) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    if !run.running || run.terminal {
        return outcome;
    }

    run.time_ticks += 1;
    let profile = run.profile;

    // Semi-implicit Euler: velocity first, then position
    run.actor.vel += profile.gravity;
    run.actor.pos.y += run.actor.vel;

    let spawn_due = run
        .newest_obstacle()
        .is_none_or(|newest| newest.receded() >= profile.spacing);
    if spawn_due {
        outcome.spawned = Some(generate_obstacle(run, playfield, rng));
    }

    for wall in run.obstacles.iter_mut() {
        wall.x -= profile.scroll_speed;
    }

    // Oldest walls are leftmost, so retirement only ever pops from the front
    while run
        .obstacles
        .front()
        .is_some_and(|wall| wall.trailing_edge() < 0.0)
    {
        if let Some(mut wall) = run.obstacles.pop_front() {
            if !wall.scored {
                wall.scored = true;
                run.score += 1;
                outcome.scored += 1;
            }
        }
    }

    outcome.collision = check_collisions(&run.actor, &run.obstacles, playfield);
    if outcome.collision.is_some() {
        run.terminal = true;
        run.running = false;
    }

    outcome
}

/// Range of valid gap top offsets: both solid segments keep the edge margin
pub fn gap_top_range(playfield_height: f32, gap_size: f32) -> (f32, f32) {
    // Shrink the margin when the playfield is too short to honour it
    let margin = GAP_MARGIN.min(((playfield_height - gap_size) / 2.0).max(0.0));
    let lo = margin;
    let hi = (playfield_height - gap_size - margin).max(lo);
    (lo, hi)
}

/// Create a wall at the right edge with a fresh random gap, returning its ID
pub fn generate_obstacle<R: Rng>(
    run: &mut RunState,
    playfield: &Playfield,
    rng: &mut R,
) -> u32 {
    let gap_size = run.profile.gap_size;
    let (lo, hi) = gap_top_range(playfield.height, gap_size);
    let gap_top = if hi > lo { rng.random_range(lo..=hi) } else { lo };

    let id = run.next_obstacle_id();
    run.obstacles
        .push_back(Obstacle::new(id, playfield.width, gap_top, gap_size));
    id
}
