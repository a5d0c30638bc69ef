use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::schedule::{GroupId, GroupSchedule, Schedule};

pub const QUALIFYING_SLOTS: usize = 2;

const WIN_POINTS: u32 = 3;
const DRAW_POINTS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamStanding {
    pub team: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u64,
    pub goals_against: u64,
    pub goal_diff: i64,
    pub points: u32,
}

impl TeamStanding {
    fn new(team: &str) -> Self {
        Self {
            team: team.to_string(),
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_diff: 0,
            points: 0,
        }
    }

    fn record(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.goals_for += u64::from(scored);
        self.goals_against += u64::from(conceded);
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => {
                self.won += 1;
                self.points += WIN_POINTS;
            }
            std::cmp::Ordering::Less => self.lost += 1,
            std::cmp::Ordering::Equal => {
                self.drawn += 1;
                self.points += DRAW_POINTS;
            }
        }
    }
}

pub fn standings(schedule: &Schedule, group: GroupId) -> Result<Vec<TeamStanding>> {
    let gs = schedule
        .group(group)
        .ok_or_else(|| EngineError::not_found(format!("group {group}")))?;
    Ok(group_table(gs))
}

pub fn group_table(gs: &GroupSchedule) -> Vec<TeamStanding> {
    let mut table: Vec<TeamStanding> = gs.teams.iter().map(|t| TeamStanding::new(t)).collect();

    for fixture in gs.fixtures() {
        let Some(result) = fixture.result else {
            continue;
        };
        let home = table.iter().position(|row| row.team == fixture.home);
        let away = table.iter().position(|row| row.team == fixture.away);
        let (Some(home), Some(away)) = (home, away) else {
            continue;
        };
        table[home].record(result.home, result.away);
        table[away].record(result.away, result.home);
    }

    for row in &mut table {
        row.goal_diff = saturating_i64(row.goals_for) - saturating_i64(row.goals_against);
    }

    table.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.goal_diff.cmp(&a.goal_diff))
            .then(b.goals_for.cmp(&a.goals_for))
    });
    table
}

fn saturating_i64(goals: u64) -> i64 {
    i64::try_from(goals).unwrap_or(i64::MAX)
}

pub fn qualifiers(table: &[TeamStanding]) -> &[TeamStanding] {
    &table[..table.len().min(QUALIFYING_SLOTS)]
}
