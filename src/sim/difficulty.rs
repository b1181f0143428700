//! Difficulty profile table
//!
//! Each difficulty maps to five physics/generation constants. Difficulty rises
//! monotonically across every field from easy to hard: stronger gravity, a
//! sharper flap, faster scroll, narrower gaps, tighter wall spacing.

use serde::{Deserialize, Serialize};

/// Difficulty identifier (wire names: "easy", "medium", "hard")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Physics/generation constants for this difficulty
    pub fn profile(&self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                difficulty: *self,
                gravity: 0.3,
                impulse: -6.0,
                scroll_speed: 2.0,
                gap_size: 200.0,
                spacing: 300.0,
            },
            Difficulty::Medium => DifficultyProfile {
                difficulty: *self,
                gravity: 0.4,
                impulse: -7.0,
                scroll_speed: 3.0,
                gap_size: 170.0,
                spacing: 260.0,
            },
            Difficulty::Hard => DifficultyProfile {
                difficulty: *self,
                gravity: 0.5,
                impulse: -8.0,
                scroll_speed: 4.0,
                gap_size: 140.0,
                spacing: 220.0,
            },
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable tuning for one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub difficulty: Difficulty,
    /// Downward acceleration per tick
    pub gravity: f32,
    /// Velocity set by a flap (negative = upward)
    pub impulse: f32,
    /// Horizontal wall speed per tick
    pub scroll_speed: f32,
    /// Vertical opening of every wall
    pub gap_size: f32,
    /// Distance between consecutive wall leading edges
    pub spacing: f32,
}

impl From<Difficulty> for DifficultyProfile {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easy_profile_values() {
        let p = Difficulty::Easy.profile();
        assert_eq!(p.gravity, 0.3);
        assert_eq!(p.impulse, -6.0);
        assert_eq!(p.scroll_speed, 2.0);
        assert_eq!(p.gap_size, 200.0);
        assert_eq!(p.spacing, 300.0);
    }

    #[test]
    fn test_difficulty_monotonic_across_all_fields() {
        for pair in Difficulty::ALL.windows(2) {
            let (a, b) = (pair[0].profile(), pair[1].profile());
            assert!(b.gravity > a.gravity);
            assert!(b.impulse.abs() > a.impulse.abs());
            assert!(b.scroll_speed > a.scroll_speed);
            assert!(b.gap_size < a.gap_size);
            assert!(b.spacing < a.spacing);
        }
    }

    #[test]
    fn test_impulse_is_upward() {
        for d in Difficulty::ALL {
            assert!(d.profile().impulse < 0.0);
        }
    }

    #[test]
    fn test_parse_and_wire_names() {
        assert_eq!(Difficulty::parse("Hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse(" med "), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse("nightmare"), None);
        for d in Difficulty::ALL {
            assert_eq!(Difficulty::parse(d.as_str()), Some(d));
        }
        assert_eq!(serde_json::to_string(&Difficulty::Medium).unwrap(), "\"medium\"");
        let d: Difficulty = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(d, Difficulty::Hard);
    }
}
