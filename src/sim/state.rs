//! Run state and core simulation types
//!
//! Screen coordinates: x grows right, y grows down, origin at the top-left of
//! the playfield. Everything a renderer needs is readable from here.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::difficulty::{Difficulty, DifficultyProfile};
use crate::consts::*;

/// Playfield dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
        }
    }
}

/// Axis-aligned box (min = top-left corner)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Whether the horizontal spans intersect (touching edges do not count)
    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionKind {
    /// Actor left the playfield vertically
    Boundary,
    /// Actor touched a wall outside its gap
    Wall,
}

impl CollisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionKind::Boundary => "boundary",
            CollisionKind::Wall => "wall",
        }
    }
}

/// Game-over signal raised by the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameOver {
    pub score: u32,
    pub difficulty: Difficulty,
    pub reason: CollisionKind,
}

/// The controlled character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Top-left corner; x never changes during a run
    pub pos: Vec2,
    /// Vertical velocity (positive = falling)
    pub vel: f32,
    pub size: Vec2,
}

impl Actor {
    /// Actor centred vertically, at rest
    pub fn new(playfield: &Playfield) -> Self {
        Self {
            pos: Vec2::new(ACTOR_X, playfield.height / 2.0),
            vel: 0.0,
            size: Vec2::new(ACTOR_WIDTH, ACTOR_HEIGHT),
        }
    }

    pub fn top(&self) -> f32 {
        self.pos.y
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }
}

/// One gapped wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Leading (left) edge
    pub x: f32,
    /// Where the leading edge was when the wall was created
    pub spawn_x: f32,
    pub width: f32,
    /// Offset of the gap's upper edge from the top of the playfield
    pub gap_top: f32,
    /// Always `gap_top + gap_size`
    pub gap_bottom: f32,
    /// Set once, when the wall retires past the left edge
    pub scored: bool,
}

impl Obstacle {
    pub fn new(id: u32, x: f32, gap_top: f32, gap_size: f32) -> Self {
        Self {
            id,
            x,
            spawn_x: x,
            width: OBSTACLE_WIDTH,
            gap_top,
            gap_bottom: gap_top + gap_size,
            scored: false,
        }
    }

    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }

    /// Distance scrolled since creation
    pub fn receded(&self) -> f32 {
        self.spawn_x - self.x
    }

    pub fn top_segment_height(&self) -> f32 {
        self.gap_top
    }

    pub fn bottom_segment_height(&self, playfield_height: f32) -> f32 {
        playfield_height - self.gap_bottom
    }

    /// Solid part above the gap
    pub fn top_segment(&self) -> Aabb {
        Aabb::new(self.x, 0.0, self.width, self.top_segment_height())
    }

    /// Solid part below the gap
    pub fn bottom_segment(&self, playfield_height: f32) -> Aabb {
        Aabb::new(
            self.x,
            self.gap_bottom,
            self.width,
            self.bottom_segment_height(playfield_height),
        )
    }

    /// Full horizontal span of the wall, top to bottom
    pub fn span(&self, playfield_height: f32) -> Aabb {
        Aabb::new(self.x, 0.0, self.width, playfield_height)
    }
}

/// Complete state of one run, owned by a single engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub actor: Actor,
    /// Oldest (leftmost) first
    pub obstacles: VecDeque<Obstacle>,
    pub score: u32,
    pub running: bool,
    pub terminal: bool,
    pub profile: DifficultyProfile,
    /// Ticks advanced since start
    pub time_ticks: u64,
    next_id: u32,
}

impl RunState {
    /// Fresh run: actor centred, no walls, score 0, running
    pub fn new(profile: DifficultyProfile, playfield: &Playfield) -> Self {
        Self {
            actor: Actor::new(playfield),
            obstacles: VecDeque::with_capacity(Self::obstacle_capacity(&profile, playfield)),
            score: 0,
            running: true,
            terminal: false,
            profile,
            time_ticks: 0,
            next_id: 1,
        }
    }

    /// Upper bound on walls alive at once for this profile and playfield
    pub fn obstacle_capacity(profile: &DifficultyProfile, playfield: &Playfield) -> usize {
        let span = playfield.width + OBSTACLE_WIDTH + profile.spacing;
        (span / profile.spacing.max(1.0)).ceil() as usize + 1
    }

    /// Allocate a new wall ID
    pub fn next_obstacle_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Most recently created wall
    pub fn newest_obstacle(&self) -> Option<&Obstacle> {
        self.obstacles.back()
    }

    pub fn actor_bounds(&self) -> Aabb {
        self.actor.bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_is_centred_and_empty() {
        let playfield = Playfield::default();
        let run = RunState::new(Difficulty::Easy.profile(), &playfield);
        assert_eq!(run.actor.pos.y, 300.0);
        assert_eq!(run.actor.pos.x, ACTOR_X);
        assert_eq!(run.actor.vel, 0.0);
        assert!(run.obstacles.is_empty());
        assert_eq!(run.score, 0);
        assert!(run.running);
        assert!(!run.terminal);
    }

    #[test]
    fn test_obstacle_segments() {
        let wall = Obstacle::new(1, 800.0, 50.0, 200.0);
        assert_eq!(wall.gap_bottom, 250.0);
        assert_eq!(wall.top_segment_height(), 50.0);
        assert_eq!(wall.bottom_segment_height(600.0), 350.0);

        let top = wall.top_segment();
        assert_eq!(top.min, Vec2::new(800.0, 0.0));
        assert_eq!(top.height(), 50.0);
        let bottom = wall.bottom_segment(600.0);
        assert_eq!(bottom.min.y, 250.0);
        assert_eq!(bottom.height(), 350.0);
        assert_eq!(bottom.width(), OBSTACLE_WIDTH);
    }

    #[test]
    fn test_aabb_overlap_x() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps_x(&Aabb::new(5.0, 100.0, 10.0, 10.0)));
        assert!(!a.overlaps_x(&Aabb::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!a.overlaps_x(&Aabb::new(-10.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_obstacle_capacity_covers_screen() {
        let playfield = Playfield::default();
        for d in Difficulty::ALL {
            let profile = d.profile();
            let cap = RunState::obstacle_capacity(&profile, &playfield);
            let on_screen = ((playfield.width + OBSTACLE_WIDTH) / profile.spacing).ceil() as usize;
            assert!(cap > on_screen);
        }
    }
}
