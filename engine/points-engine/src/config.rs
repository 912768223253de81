//! Scoring rule table

use crate::error::ScoringError;
use serde::{Deserialize, Serialize};
use squad_model::Position;

/// One value per position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerPosition<T> {
    pub keeper: T,
    pub defender: T,
    pub midfielder: T,
    pub forward: T,
}

impl<T: Copy> PerPosition<T> {
    pub fn get(&self, position: Position) -> T {
        match position {
            Position::Keeper => self.keeper,
            Position::Defender => self.defender,
            Position::Midfielder => self.midfielder,
            Position::Forward => self.forward,
        }
    }
}

/// Point values and thresholds of the scoring ruleset
///
/// Missing fields fall back to the defaults, so a rules file only needs to
/// list what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Minutes needed for the full appearance award and a clean sheet
    pub full_appearance_minutes: u16,
    pub short_appearance_points: i32,
    pub full_appearance_points: i32,

    pub goal_points: PerPosition<i32>,
    pub assist_points: i32,
    pub clean_sheet_points: PerPosition<i32>,

    /// Keeper earns one point per this many saves
    pub saves_per_point: u8,
    pub penalty_save_points: i32,
    pub penalty_miss_points: i32,

    /// Combined defensive actions needed for the defensive contribution
    /// award. Keepers never earn it.
    pub defensive_contribution_threshold: PerPosition<Option<u32>>,
    pub defensive_contribution_points: i32,

    /// Keeper/Defender lose a point per this many goals conceded
    pub goals_conceded_per_point: u8,

    pub yellow_card_points: i32,
    /// Applied instead of, not on top of, any yellow card deduction
    pub red_card_points: i32,
    pub own_goal_points: i32,

    /// Largest plausible minutes value, extra time included
    pub max_minutes: u16,
    pub max_bonus: u8,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            full_appearance_minutes: 60,
            short_appearance_points: 1,
            full_appearance_points: 2,
            goal_points: PerPosition { keeper: 10, defender: 6, midfielder: 5, forward: 4 },
            assist_points: 3,
            clean_sheet_points: PerPosition { keeper: 4, defender: 4, midfielder: 1, forward: 0 },
            saves_per_point: 3,
            penalty_save_points: 5,
            penalty_miss_points: -2,
            defensive_contribution_threshold: PerPosition {
                keeper: None,
                defender: Some(10),
                midfielder: Some(12),
                forward: Some(12),
            },
            defensive_contribution_points: 2,
            goals_conceded_per_point: 2,
            yellow_card_points: -1,
            red_card_points: -3,
            own_goal_points: -2,
            max_minutes: 130,
            max_bonus: 3,
        }
    }
}

impl ScoringRules {
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.saves_per_point == 0 {
            return Err(ScoringError::InvalidConfig {
                message: "saves_per_point must be positive".to_string(),
            });
        }
        if self.goals_conceded_per_point == 0 {
            return Err(ScoringError::InvalidConfig {
                message: "goals_conceded_per_point must be positive".to_string(),
            });
        }
        if self.full_appearance_minutes == 0 || self.full_appearance_minutes > self.max_minutes {
            return Err(ScoringError::InvalidConfig {
                message: "full_appearance_minutes out of range".to_string(),
            });
        }
        Ok(())
    }

    /// Load rules from a TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let rules: ScoringRules = toml::from_str(&content)?;
        rules.validate()?;
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_valid() {
        let rules = ScoringRules::default();
        rules.validate().unwrap();
        assert_eq!(rules.goal_points.get(Position::Keeper), 10);
        assert_eq!(rules.clean_sheet_points.get(Position::Midfielder), 1);
        assert_eq!(rules.defensive_contribution_threshold.get(Position::Keeper), None);
    }

    #[test]
    fn test_partial_rules_file() {
        let text = r#"
            assist_points = 4

            [goal_points]
            keeper = 9
            defender = 6
            midfielder = 5
            forward = 4
        "#;
        let parsed: ScoringRules = toml::from_str(text).unwrap();
        assert_eq!(parsed.assist_points, 4);
        assert_eq!(parsed.goal_points.keeper, 9);
        assert_eq!(parsed.red_card_points, -3);
    }

    #[test]
    fn test_zero_divisor_rejected() {
        let rules = ScoringRules { saves_per_point: 0, ..Default::default() };
        assert!(rules.validate().is_err());
    }
}
