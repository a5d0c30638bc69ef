use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, Result};
use crate::schedule::FixtureId;
use crate::score::{GoalInput, Score};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPredictions {
    pub user: String,
    pub picks: BTreeMap<FixtureId, Option<Score>>,
}

impl UserPredictions {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            picks: BTreeMap::new(),
        }
    }

    pub fn pick(&self, fixture: &FixtureId) -> Option<&Score> {
        self.picks.get(fixture).and_then(|p| p.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionStore {
    users: Vec<UserPredictions>,
}

impl PredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn users(&self) -> impl Iterator<Item = &UserPredictions> {
        self.users.iter()
    }

    pub fn partition(&self, user: &str) -> Option<&UserPredictions> {
        self.users.iter().find(|p| p.user == user)
    }

    pub fn contains_user(&self, user: &str) -> bool {
        self.partition(user).is_some()
    }

    pub fn ensure_partition(&mut self, user: &str) -> &mut UserPredictions {
        let idx = match self.users.iter().position(|p| p.user == user) {
            Some(idx) => idx,
            None => {
                self.users.push(UserPredictions::new(user));
                self.users.len() - 1
            }
        };
        &mut self.users[idx]
    }

    pub fn prediction(&self, user: &str, fixture: &FixtureId) -> Option<&Score> {
        self.partition(user)?.pick(fixture)
    }

    pub fn set_prediction(
        &mut self,
        user: &str,
        fixture: FixtureId,
        home_goals: impl GoalInput,
        away_goals: impl GoalInput,
    ) -> Result<Score> {
        if user.is_empty() {
            return Err(EngineError::invalid("user name is empty"));
        }
        let score = Score::parse(home_goals, away_goals)?;
        self.ensure_partition(user)
            .picks
            .insert(fixture, Some(score));
        Ok(score)
    }
}

impl Serialize for PredictionStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.users.len()))?;
        for partition in &self.users {
            map.serialize_entry(&partition.user, &partition.picks)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PredictionStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(StoreVisitor)
    }
}

struct StoreVisitor;

impl<'de> Visitor<'de> for StoreVisitor {
    type Value = PredictionStore;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of user name to fixture predictions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut store = PredictionStore::new();
        while let Some((user, picks)) =
            access.next_entry::<String, BTreeMap<FixtureId, Option<Score>>>()?
        {
            if store.contains_user(&user) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate prediction partition for {user}"
                )));
            }
            store.users.push(UserPredictions { user, picks });
        }
        Ok(store)
    }
}
