use rand::Rng;

use crate::error::{EngineError, Result};
use crate::schedule::FixtureId;
use crate::score::Score;
use crate::state::{Delta, TournamentState, apply_delta};

// Rough World Cup goal distribution for one side: 0..=5 goals.
const GOAL_WEIGHTS: [u32; 6] = [30, 35, 20, 9, 4, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulationSummary {
    pub results: usize,
    pub predictions: usize,
}

pub fn random_goals(rng: &mut impl Rng) -> u32 {
    let total: u32 = GOAL_WEIGHTS.iter().sum();
    let mut roll = rng.gen_range(0..total);
    for (goals, weight) in GOAL_WEIGHTS.iter().enumerate() {
        if roll < *weight {
            return goals as u32;
        }
        roll -= weight;
    }
    0
}

pub fn random_score(rng: &mut impl Rng) -> Score {
    Score::new(random_goals(rng), random_goals(rng))
}

pub fn simulate(
    state: &mut TournamentState,
    rng: &mut impl Rng,
    users: &[&str],
    result_ratio: f64,
) -> Result<SimulationSummary> {
    if result_ratio.is_nan() {
        return Err(EngineError::invalid("result ratio is not a number"));
    }
    let ratio = result_ratio.clamp(0.0, 1.0);
    let mut summary = SimulationSummary::default();

    let slots: Vec<FixtureId> = state.schedule.fixtures().map(|f| f.id).collect();
    for id in &slots {
        if rng.gen_bool(ratio) {
            apply_delta(
                state,
                Delta::SetResult {
                    group: id.group,
                    match_day: id.match_day,
                    fixture_index: usize::from(id.seq) - 1,
                    score: random_score(rng),
                },
            )?;
            summary.results += 1;
        }
    }

    for user in users {
        apply_delta(
            state,
            Delta::AddPartition {
                user: user.to_string(),
            },
        )?;
        for id in &slots {
            apply_delta(
                state,
                Delta::SetPrediction {
                    user: user.to_string(),
                    fixture: *id,
                    score: random_score(rng),
                },
            )?;
            summary.predictions += 1;
        }
    }

    Ok(summary)
}
