//! Terminal collision checks
//!
//! Both checks run on post-integration positions within the same tick.

use super::state::{Actor, CollisionKind, Obstacle, Playfield};

/// Actor touched the top of the playfield or reached the floor
pub fn actor_boundary_collision(actor: &Actor, playfield: &Playfield) -> bool {
    actor.top() <= 0.0 || actor.bottom() >= playfield.height
}

/// Actor shares horizontal span with the wall but is not inside its gap
pub fn actor_wall_collision(actor: &Actor, wall: &Obstacle, playfield_height: f32) -> bool {
    if !actor.bounds().overlaps_x(&wall.span(playfield_height)) {
        return false;
    }
    actor.top() < wall.gap_top || actor.bottom() > wall.gap_bottom
}

/// First terminal collision for this tick, boundary checked before walls
pub fn check_collisions<'a>(
    actor: &Actor,
    walls: impl IntoIterator<Item = &'a Obstacle>,
    playfield: &Playfield,
) -> Option<CollisionKind> {
    if actor_boundary_collision(actor, playfield) {
        return Some(CollisionKind::Boundary);
    }
    walls
        .into_iter()
        .any(|wall| actor_wall_collision(actor, wall, playfield.height))
        .then_some(CollisionKind::Wall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use glam::Vec2;

    fn actor_at(y: f32) -> Actor {
        let mut actor = Actor::new(&Playfield::default());
        actor.pos = Vec2::new(ACTOR_X, y);
        actor
    }

    #[test]
    fn test_boundary_top_and_floor() {
        let playfield = Playfield::default();
        assert!(!actor_boundary_collision(&actor_at(300.0), &playfield));
        assert!(actor_boundary_collision(&actor_at(0.0), &playfield));
        assert!(actor_boundary_collision(&actor_at(-3.0), &playfield));
        // Bottom edge exactly on the floor
        assert!(actor_boundary_collision(
            &actor_at(PLAYFIELD_HEIGHT - ACTOR_HEIGHT),
            &playfield
        ));
        assert!(!actor_boundary_collision(
            &actor_at(PLAYFIELD_HEIGHT - ACTOR_HEIGHT - 0.5),
            &playfield
        ));
    }

    #[test]
    fn test_wall_inside_gap_is_safe() {
        let wall = Obstacle::new(1, ACTOR_X - 10.0, 200.0, 200.0);
        assert!(!actor_wall_collision(&actor_at(250.0), &wall, PLAYFIELD_HEIGHT));
        // Flush with both gap edges
        assert!(!actor_wall_collision(&actor_at(200.0), &wall, PLAYFIELD_HEIGHT));
        assert!(!actor_wall_collision(
            &actor_at(400.0 - ACTOR_HEIGHT),
            &wall,
            PLAYFIELD_HEIGHT
        ));
    }

    #[test]
    fn test_wall_outside_gap_hits() {
        let wall = Obstacle::new(1, ACTOR_X - 10.0, 200.0, 200.0);
        assert!(actor_wall_collision(&actor_at(199.0), &wall, PLAYFIELD_HEIGHT));
        assert!(actor_wall_collision(&actor_at(390.0), &wall, PLAYFIELD_HEIGHT));
    }

    #[test]
    fn test_wall_without_horizontal_overlap_is_ignored() {
        let ahead = Obstacle::new(1, ACTOR_X + ACTOR_WIDTH, 200.0, 200.0);
        let behind = Obstacle::new(2, ACTOR_X - OBSTACLE_WIDTH, 200.0, 200.0);
        let actor = actor_at(50.0);
        assert!(!actor_wall_collision(&actor, &ahead, PLAYFIELD_HEIGHT));
        assert!(!actor_wall_collision(&actor, &behind, PLAYFIELD_HEIGHT));
    }

    #[test]
    fn test_check_collisions_prefers_boundary() {
        let playfield = Playfield::default();
        let walls = [Obstacle::new(1, ACTOR_X, 200.0, 200.0)];
        assert_eq!(
            check_collisions(&actor_at(0.0), &walls, &playfield),
            Some(CollisionKind::Boundary)
        );
        assert_eq!(
            check_collisions(&actor_at(100.0), &walls, &playfield),
            Some(CollisionKind::Wall)
        );
        assert_eq!(check_collisions(&actor_at(250.0), &walls, &playfield), None);
    }
}
