use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, Result};
use crate::score::{GoalInput, Score};

pub const GROUP_SIZE: usize = 4;
pub const MATCH_DAYS: u8 = 3;
pub const FIXTURES_PER_DAY: usize = 2;

// Home/away team indices per match day. Fixture ids depend on this exact order.
const PAIRINGS: [[(usize, usize); FIXTURES_PER_DAY]; MATCH_DAYS as usize] = [
    [(0, 1), (2, 3)],
    [(0, 2), (1, 3)],
    [(1, 2), (0, 3)],
];

const WORLD_CUP_2022: [(GroupId, [&str; GROUP_SIZE]); 8] = [
    (GroupId::A, ["Qatar", "Ecuador", "Senegal", "Netherlands"]),
    (GroupId::B, ["England", "Iran", "United States", "Wales"]),
    (GroupId::C, ["Argentina", "Saudi Arabia", "Mexico", "Poland"]),
    (GroupId::D, ["France", "Australia", "Denmark", "Tunisia"]),
    (GroupId::E, ["Spain", "Costa Rica", "Germany", "Japan"]),
    (GroupId::F, ["Belgium", "Canada", "Morocco", "Croatia"]),
    (GroupId::G, ["Brazil", "Serbia", "Switzerland", "Cameroon"]),
    (GroupId::H, ["Portugal", "Ghana", "Uruguay", "South Korea"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupId {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl GroupId {
    pub const ALL: [GroupId; 8] = [
        GroupId::A,
        GroupId::B,
        GroupId::C,
        GroupId::D,
        GroupId::E,
        GroupId::F,
        GroupId::G,
        GroupId::H,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GroupId::A => "A",
            GroupId::B => "B",
            GroupId::C => "C",
            GroupId::D => "D",
            GroupId::E => "E",
            GroupId::F => "F",
            GroupId::G => "G",
            GroupId::H => "H",
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupId {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self> {
        GroupId::ALL
            .into_iter()
            .find(|g| g.as_str() == raw.trim())
            .ok_or_else(|| EngineError::not_found(format!("group {raw:?}")))
    }
}

/// `{group}-J{match_day}-{seq}`, with `seq` 1-based within the match day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureId {
    pub group: GroupId,
    pub match_day: u8,
    pub seq: u8,
}

impl FixtureId {
    pub fn new(group: GroupId, match_day: u8, seq: u8) -> Self {
        Self {
            group,
            match_day,
            seq,
        }
    }

    pub fn in_range(&self) -> bool {
        (1..=MATCH_DAYS).contains(&self.match_day)
            && (1..=FIXTURES_PER_DAY as u8).contains(&self.seq)
    }
}

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-J{}-{}", self.group, self.match_day, self.seq)
    }
}

impl FromStr for FixtureId {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self> {
        let malformed = || EngineError::invalid(format!("malformed fixture id {raw:?}"));
        let mut parts = raw.split('-');
        let (Some(group), Some(day), Some(seq), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        let group = group.parse::<GroupId>().map_err(|_| malformed())?;
        let match_day = day
            .strip_prefix('J')
            .and_then(|d| d.parse::<u8>().ok())
            .ok_or_else(malformed)?;
        let seq = seq.parse::<u8>().map_err(|_| malformed())?;
        let id = Self {
            group,
            match_day,
            seq,
        };
        // canonical spelling only
        if id.to_string() != raw {
            return Err(malformed());
        }
        Ok(id)
    }
}

impl Serialize for FixtureId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FixtureId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    pub home: String,
    pub away: String,
    pub result: Option<Score>,
}

impl Fixture {
    pub fn group(&self) -> GroupId {
        self.id.group
    }
}

pub type MatchDay = [Fixture; FIXTURES_PER_DAY];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSchedule {
    pub teams: [String; GROUP_SIZE],
    pub match_days: [MatchDay; MATCH_DAYS as usize],
}

impl GroupSchedule {
    fn generate(group: GroupId, teams: [String; GROUP_SIZE]) -> Self {
        let match_days = std::array::from_fn(|day_idx| {
            std::array::from_fn(|seq_idx| {
                let (home, away) = PAIRINGS[day_idx][seq_idx];
                Fixture {
                    id: FixtureId::new(group, day_idx as u8 + 1, seq_idx as u8 + 1),
                    home: teams[home].clone(),
                    away: teams[away].clone(),
                    result: None,
                }
            })
        });
        Self { teams, match_days }
    }

    pub fn match_day(&self, day: u8) -> Option<&MatchDay> {
        let idx = usize::from(day).checked_sub(1)?;
        self.match_days.get(idx)
    }

    pub fn fixtures(&self) -> impl Iterator<Item = &Fixture> {
        self.match_days.iter().flat_map(|day| day.iter())
    }

    fn check(&self, group: GroupId) -> Result<()> {
        validate_teams(group, &self.teams)?;
        for (day_idx, day) in self.match_days.iter().enumerate() {
            for (seq_idx, fixture) in day.iter().enumerate() {
                let expected = FixtureId::new(group, day_idx as u8 + 1, seq_idx as u8 + 1);
                let (home, away) = PAIRINGS[day_idx][seq_idx];
                if fixture.id != expected
                    || fixture.home != self.teams[home]
                    || fixture.away != self.teams[away]
                {
                    return Err(EngineError::invalid(format!(
                        "fixture {} does not match the {expected} slot of group {group}",
                        fixture.id
                    )));
                }
            }
        }
        Ok(())
    }
}

pub type Roster = BTreeMap<GroupId, [String; GROUP_SIZE]>;

pub fn default_roster() -> Roster {
    WORLD_CUP_2022
        .into_iter()
        .map(|(group, teams)| (group, teams.map(str::to_string)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    groups: BTreeMap<GroupId, GroupSchedule>,
}

impl Schedule {
    pub fn generate(roster: &Roster) -> Result<Self> {
        let mut groups = BTreeMap::new();
        for (group, teams) in roster {
            validate_teams(*group, teams)?;
            groups.insert(*group, GroupSchedule::generate(*group, teams.clone()));
        }
        Ok(Self { groups })
    }

    pub fn world_cup_2022() -> Self {
        let groups = default_roster()
            .into_iter()
            .map(|(group, teams)| (group, GroupSchedule::generate(group, teams)))
            .collect();
        Self { groups }
    }

    pub fn roster(&self) -> Roster {
        self.groups
            .iter()
            .map(|(group, gs)| (*group, gs.teams.clone()))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        for (group, gs) in &self.groups {
            gs.check(*group)?;
        }
        Ok(())
    }

    pub fn group_ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.keys().copied()
    }

    pub fn group(&self, group: GroupId) -> Option<&GroupSchedule> {
        self.groups.get(&group)
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &GroupSchedule)> {
        self.groups.iter().map(|(id, gs)| (*id, gs))
    }

    pub fn fixtures(&self) -> impl Iterator<Item = &Fixture> {
        self.groups.values().flat_map(|gs| gs.fixtures())
    }

    pub fn fixture(&self, id: &FixtureId) -> Option<&Fixture> {
        if !id.in_range() {
            return None;
        }
        self.fixture_at(
            id.group,
            id.match_day,
            usize::from(id.seq).saturating_sub(1),
        )
    }

    /// `fixture_index` is the 0-based position within the match day.
    pub fn fixture_at(&self, group: GroupId, match_day: u8, fixture_index: usize) -> Option<&Fixture> {
        self.groups
            .get(&group)?
            .match_day(match_day)?
            .get(fixture_index)
    }

    fn fixture_at_mut(
        &mut self,
        group: GroupId,
        match_day: u8,
        fixture_index: usize,
    ) -> Option<&mut Fixture> {
        let idx = usize::from(match_day).checked_sub(1)?;
        self.groups
            .get_mut(&group)?
            .match_days
            .get_mut(idx)?
            .get_mut(fixture_index)
    }

    pub fn set_result(
        &mut self,
        group: GroupId,
        match_day: u8,
        fixture_index: usize,
        home_goals: impl GoalInput,
        away_goals: impl GoalInput,
    ) -> Result<Score> {
        let score = Score::parse(home_goals, away_goals)?;
        let fixture = self
            .fixture_at_mut(group, match_day, fixture_index)
            .ok_or_else(|| {
                EngineError::not_found(format!(
                    "fixture {fixture_index} of match day {match_day} in group {group}"
                ))
            })?;
        fixture.result = Some(score);
        Ok(score)
    }
}

fn validate_teams(group: GroupId, teams: &[String; GROUP_SIZE]) -> Result<()> {
    let mut seen = HashSet::new();
    for team in teams {
        if team.trim().is_empty() {
            return Err(EngineError::invalid(format!(
                "group {group} has an empty team name"
            )));
        }
        if !seen.insert(team.as_str()) {
            return Err(EngineError::invalid(format!(
                "group {group} lists {team} twice"
            )));
        }
    }
    Ok(())
}
