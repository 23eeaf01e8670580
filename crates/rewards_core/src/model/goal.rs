//! Goal progress calculator.
//!
//! # Responsibility
//! - Map an aggregate point total onto fixed-target goals.
//!
//! # Invariants
//! - Progress is clamped to `[0.0, 100.0]` and rounded to one decimal.
//! - Progress is monotonically non-decreasing in the total.
//! - A non-positive target fails that goal only.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A fixed point target rendered as a progress bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub label: String,
    pub target: i64,
    /// Presentation-only accent color.
    #[serde(default)]
    pub color: Option<String>,
}

impl Goal {
    pub fn new(label: impl Into<String>, target: i64) -> Self {
        Self {
            label: label.into(),
            target,
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Goal set used when no configuration overrides it.
pub fn default_goals() -> Vec<Goal> {
    vec![
        Goal::new("Skate", 2500).with_color("#4caf50"),
        Goal::new("Videogame", 7500).with_color("#2196f3"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalError {
    /// Target is zero or negative.
    InvalidGoal { label: String, target: i64 },
}

impl Display for GoalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGoal { label, target } => {
                write!(f, "goal `{label}` has invalid target {target}; expected > 0")
            }
        }
    }
}

impl Error for GoalError {}

/// Evaluated progress for one goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub label: String,
    pub total: u64,
    pub target: u64,
    pub percent: f64,
    pub color: Option<String>,
}

impl GoalProgress {
    pub fn is_reached(&self) -> bool {
        self.total >= self.target
    }
}

/// Returns `min(total / target * 100, 100)` rounded to one decimal place.
pub fn progress(total: u64, goal: &Goal) -> Result<f64, GoalError> {
    if goal.target <= 0 {
        return Err(GoalError::InvalidGoal {
            label: goal.label.clone(),
            target: goal.target,
        });
    }

    let percent = (total as f64 / goal.target as f64 * 100.0).min(100.0);
    Ok((percent * 10.0).round() / 10.0)
}

pub fn evaluate_goal(total: u64, goal: &Goal) -> Result<GoalProgress, GoalError> {
    let percent = progress(total, goal)?;
    Ok(GoalProgress {
        label: goal.label.clone(),
        total,
        target: goal.target.unsigned_abs(),
        percent,
        color: goal.color.clone(),
    })
}

/// Evaluates every goal independently; one invalid goal never hides others.
pub fn evaluate_goals(total: u64, goals: &[Goal]) -> Vec<Result<GoalProgress, GoalError>> {
    goals.iter().map(|goal| evaluate_goal(total, goal)).collect()
}

#[cfg(test)]
mod tests {
    use super::{default_goals, evaluate_goals, progress, Goal, GoalError};

    #[test]
    fn zero_total_is_zero_percent() {
        assert_eq!(progress(0, &Goal::new("Skate", 2500)).unwrap(), 0.0);
    }

    #[test]
    fn exact_target_is_exactly_one_hundred() {
        assert_eq!(progress(7500, &Goal::new("Videogame", 7500)).unwrap(), 100.0);
    }

    #[test]
    fn overshoot_is_clamped() {
        assert_eq!(progress(99_999, &Goal::new("Skate", 2500)).unwrap(), 100.0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        // 50 / 7500 = 0.666..%
        assert_eq!(progress(50, &Goal::new("Videogame", 7500)).unwrap(), 0.7);
        // 1 / 3 = 33.333..%
        assert_eq!(progress(1, &Goal::new("Third", 3)).unwrap(), 33.3);
    }

    #[test]
    fn progress_is_monotonic_and_bounded() {
        let goal = Goal::new("Skate", 2500);
        let mut previous = 0.0;
        for total in (0..4000).step_by(7) {
            let current = progress(total, &goal).unwrap();
            assert!(current >= previous, "{current} < {previous} at {total}");
            assert!(current <= 100.0);
            previous = current;
        }
    }

    #[test]
    fn non_positive_target_is_invalid() {
        for target in [0, -10] {
            let err = progress(10, &Goal::new("Broken", target)).unwrap_err();
            assert_eq!(
                err,
                GoalError::InvalidGoal {
                    label: "Broken".to_string(),
                    target
                }
            );
        }
    }

    #[test]
    fn invalid_goal_does_not_abort_others() {
        let mut goals = default_goals();
        goals.insert(1, Goal::new("Broken", 0));

        let results = evaluate_goals(2500, &goals);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().percent, 100.0);
        assert!(results[0].as_ref().unwrap().is_reached());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().percent, 33.3);
    }
}
