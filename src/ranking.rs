use rayon::prelude::*;
use serde::Serialize;

use crate::predictions::{PredictionStore, UserPredictions};
use crate::schedule::{GroupId, Schedule};
use crate::scoring::score;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub user: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixturePoints {
    pub fixture: String,
    pub home: String,
    pub away: String,
    pub points: Option<u32>,
}

pub fn user_total(partition: &UserPredictions, schedule: &Schedule) -> u32 {
    partition
        .picks
        .iter()
        .map(|(id, pick)| {
            let result = schedule.fixture(id).and_then(|f| f.result.as_ref());
            score(pick.as_ref(), result)
        })
        .sum()
}

pub fn global_ranking(predictions: &PredictionStore, schedule: &Schedule) -> Vec<RankingEntry> {
    let partitions: Vec<&UserPredictions> = predictions.users().collect();
    let mut out: Vec<RankingEntry> = partitions
        .par_iter()
        .map(|partition| RankingEntry {
            user: partition.user.clone(),
            points: user_total(partition, schedule),
        })
        .collect();
    out.sort_by(|a, b| b.points.cmp(&a.points));
    out
}

pub fn match_day_points(
    predictions: &PredictionStore,
    schedule: &Schedule,
    user: &str,
    group: GroupId,
    match_day: u8,
) -> Vec<FixturePoints> {
    let Some(day) = schedule.group(group).and_then(|gs| gs.match_day(match_day)) else {
        return Vec::new();
    };
    day.iter()
        .map(|fixture| FixturePoints {
            fixture: fixture.id.to_string(),
            home: fixture.home.clone(),
            away: fixture.away.clone(),
            points: fixture
                .result
                .as_ref()
                .map(|r| score(predictions.prediction(user, &fixture.id), Some(r))),
        })
        .collect()
}
