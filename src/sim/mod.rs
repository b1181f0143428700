//! Simulation module
//!
//! All gameplay logic lives here:
//! - One tick per `Engine::step()` call, no internal clock
//! - Seeded RNG only
//! - Walls kept oldest-to-newest (retirement pops from the front)
//! - No rendering or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod engine;
pub mod state;
pub mod tick;

pub use collision::{actor_boundary_collision, actor_wall_collision, check_collisions};
pub use difficulty::{Difficulty, DifficultyProfile};
pub use engine::Engine;
pub use state::{Aabb, Actor, CollisionKind, GameOver, Obstacle, Playfield, RunState};
pub use tick::{TickOutcome, generate_obstacle, tick};
