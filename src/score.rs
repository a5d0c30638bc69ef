use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Upper bound of the goal inputs offered by the entry forms. The engine itself
/// accepts any non-negative count.
pub const UI_MAX_GOALS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    HomeWin,
    AwayWin,
    Draw,
}

impl Score {
    pub const fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    pub fn parse(home: impl GoalInput, away: impl GoalInput) -> Result<Self> {
        let home = home.to_goals()?;
        let away = away.to_goals()?;
        Ok(Self { home, away })
    }

    pub fn outcome(&self) -> Outcome {
        match self.home.cmp(&self.away) {
            Ordering::Greater => Outcome::HomeWin,
            Ordering::Less => Outcome::AwayWin,
            Ordering::Equal => Outcome::Draw,
        }
    }

    pub fn within_ui_range(&self) -> bool {
        self.home <= UI_MAX_GOALS && self.away <= UI_MAX_GOALS
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

pub trait GoalInput {
    fn to_goals(&self) -> Result<u32>;
}

impl GoalInput for u32 {
    fn to_goals(&self) -> Result<u32> {
        Ok(*self)
    }
}

impl GoalInput for i64 {
    fn to_goals(&self) -> Result<u32> {
        if *self < 0 {
            return Err(EngineError::invalid(format!(
                "goal count {self} is negative"
            )));
        }
        u32::try_from(*self)
            .map_err(|_| EngineError::invalid(format!("goal count {self} is out of range")))
    }
}

impl GoalInput for f64 {
    fn to_goals(&self) -> Result<u32> {
        if !self.is_finite() || self.fract() != 0.0 {
            return Err(EngineError::invalid(format!(
                "goal count {self} is not a whole number"
            )));
        }
        if *self < 0.0 {
            return Err(EngineError::invalid(format!(
                "goal count {self} is negative"
            )));
        }
        if *self > f64::from(u32::MAX) {
            return Err(EngineError::invalid(format!(
                "goal count {self} is out of range"
            )));
        }
        Ok(*self as u32)
    }
}

impl GoalInput for &str {
    fn to_goals(&self) -> Result<u32> {
        let raw = self.trim();
        if raw.is_empty() {
            return Err(EngineError::invalid("goal count is empty"));
        }
        match raw.parse::<i64>() {
            Ok(value) => value.to_goals(),
            Err(_) => Err(EngineError::invalid(format!(
                "goal count {raw:?} is not a whole number"
            ))),
        }
    }
}

impl GoalInput for String {
    fn to_goals(&self) -> Result<u32> {
        self.as_str().to_goals()
    }
}
