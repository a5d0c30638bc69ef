use tracing::debug;

use crate::error::{EngineError, Result};
use crate::predictions::PredictionStore;
use crate::ranking::{self, FixturePoints, RankingEntry};
use crate::schedule::{FixtureId, GroupId, Schedule};
use crate::score::Score;
use crate::standings::{self, TeamStanding};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentState {
    pub schedule: Schedule,
    pub predictions: PredictionStore,
}

impl TournamentState {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            predictions: PredictionStore::new(),
        }
    }

    pub fn world_cup_2022() -> Self {
        Self::new(Schedule::world_cup_2022())
    }

    pub fn standings(&self, group: GroupId) -> Result<Vec<TeamStanding>> {
        standings::standings(&self.schedule, group)
    }

    pub fn global_ranking(&self) -> Vec<RankingEntry> {
        ranking::global_ranking(&self.predictions, &self.schedule)
    }

    pub fn match_day_points(&self, user: &str, group: GroupId, match_day: u8) -> Vec<FixturePoints> {
        ranking::match_day_points(&self.predictions, &self.schedule, user, group, match_day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    SetResult {
        group: GroupId,
        match_day: u8,
        fixture_index: usize,
        score: Score,
    },
    SetPrediction {
        user: String,
        fixture: FixtureId,
        score: Score,
    },
    AddPartition {
        user: String,
    },
    Replace(Box<TournamentState>),
}

/// Applies one delta. On error the state is left exactly as it was.
pub fn apply_delta(state: &mut TournamentState, delta: Delta) -> Result<()> {
    match delta {
        Delta::SetResult {
            group,
            match_day,
            fixture_index,
            score,
        } => {
            state
                .schedule
                .set_result(group, match_day, fixture_index, score.home, score.away)?;
            debug!(%group, match_day, fixture_index, %score, "result recorded");
        }
        Delta::SetPrediction {
            user,
            fixture,
            score,
        } => {
            if state.schedule.fixture(&fixture).is_none() {
                return Err(EngineError::not_found(format!("fixture {fixture}")));
            }
            state
                .predictions
                .set_prediction(&user, fixture, score.home, score.away)?;
            debug!(user = %user, %fixture, %score, "prediction recorded");
        }
        Delta::AddPartition { user } => {
            if user.is_empty() {
                return Err(EngineError::invalid("user name is empty"));
            }
            state.predictions.ensure_partition(&user);
            debug!(user = %user, "prediction partition ready");
        }
        Delta::Replace(next) => {
            *state = *next;
        }
    }
    Ok(())
}
