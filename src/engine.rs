use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::auth::Credentials;
use crate::error::{EngineError, Result};
use crate::kv::KeyValueStore;
use crate::persist::{self, PersistKeys};
use crate::ranking::{FixturePoints, RankingEntry};
use crate::schedule::{FixtureId, GroupId, Roster, Schedule};
use crate::score::{GoalInput, Score};
use crate::simulate::{self, SimulationSummary};
use crate::standings::TeamStanding;
use crate::state::{Delta, TournamentState, apply_delta};

pub type SaveHandle = JoinHandle<Result<()>>;

pub struct Engine {
    state: TournamentState,
    roster: Roster,
    store: Arc<dyn KeyValueStore>,
    credentials: Arc<dyn Credentials>,
    keys: PersistKeys,
    session: Option<String>,
}

impl Engine {
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        credentials: Arc<dyn Credentials>,
        keys: PersistKeys,
        roster: Roster,
    ) -> Result<Self> {
        let defaults = Schedule::generate(&roster)?;
        let state = persist::load_state(store.as_ref(), &keys, defaults).await;
        Ok(Self {
            state,
            roster,
            store,
            credentials,
            keys,
            session: None,
        })
    }

    pub fn state(&self) -> &TournamentState {
        &self.state
    }

    pub fn schedule(&self) -> &Schedule {
        &self.state.schedule
    }

    pub fn current_user(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub async fn register(&mut self, user: &str, secret: &str) -> Result<SaveHandle> {
        check_credentials_input(user, secret)?;
        let rt = save_runtime()?;
        self.credentials.create(user, secret).await?;
        self.apply(Delta::AddPartition {
            user: user.to_string(),
        })?;
        self.session = Some(user.to_string());
        info!(user, "registered");
        Ok(self.spawn_save(&rt))
    }

    pub async fn login(&mut self, user: &str, secret: &str) -> Result<()> {
        check_credentials_input(user, secret)?;
        if !self.credentials.verify(user, secret).await? {
            return Err(EngineError::AuthFailure(
                "unknown user or wrong password".to_string(),
            ));
        }
        self.session = Some(user.to_string());
        info!(user, "logged in");
        Ok(())
    }

    pub fn logout(&mut self) {
        self.session = None;
    }

    /// `fixture_index` is the 0-based position within the match day.
    pub fn set_result(
        &mut self,
        group: GroupId,
        match_day: u8,
        fixture_index: usize,
        home_goals: impl GoalInput,
        away_goals: impl GoalInput,
    ) -> Result<SaveHandle> {
        let score = Score::parse(home_goals, away_goals)?;
        let rt = save_runtime()?;
        self.apply(Delta::SetResult {
            group,
            match_day,
            fixture_index,
            score,
        })?;
        Ok(self.spawn_save(&rt))
    }

    pub fn set_prediction(
        &mut self,
        user: &str,
        fixture_id: &str,
        home_goals: impl GoalInput,
        away_goals: impl GoalInput,
    ) -> Result<SaveHandle> {
        let fixture = fixture_id.parse::<FixtureId>()?;
        let score = Score::parse(home_goals, away_goals)?;
        let rt = save_runtime()?;
        self.apply(Delta::SetPrediction {
            user: user.to_string(),
            fixture,
            score,
        })?;
        Ok(self.spawn_save(&rt))
    }

    pub fn submit_prediction(
        &mut self,
        fixture_id: &str,
        home_goals: impl GoalInput,
        away_goals: impl GoalInput,
    ) -> Result<SaveHandle> {
        let user = self.require_session()?.to_string();
        self.set_prediction(&user, fixture_id, home_goals, away_goals)
    }

    pub fn standings(&self, group: GroupId) -> Result<Vec<TeamStanding>> {
        self.state.standings(group)
    }

    pub fn global_ranking(&self) -> Vec<RankingEntry> {
        self.state.global_ranking()
    }

    pub fn my_match_day_points(&self, group: GroupId, match_day: u8) -> Result<Vec<FixturePoints>> {
        let user = self.require_session()?;
        Ok(self.state.match_day_points(user, group, match_day))
    }

    pub fn simulate(
        &mut self,
        rng: &mut impl rand::Rng,
        users: &[&str],
        result_ratio: f64,
    ) -> Result<(SimulationSummary, SaveHandle)> {
        let rt = save_runtime()?;
        let mut next = self.state.clone();
        let summary = simulate::simulate(&mut next, rng, users, result_ratio)?;
        self.apply(Delta::Replace(Box::new(next)))?;
        Ok((summary, self.spawn_save(&rt)))
    }

    pub async fn reset(&mut self) -> Result<()> {
        persist::clear_state(self.store.as_ref(), &self.keys).await?;
        let fresh = TournamentState::new(Schedule::generate(&self.roster)?);
        self.apply(Delta::Replace(Box::new(fresh)))?;
        info!("tournament state reset");
        Ok(())
    }

    fn apply(&mut self, delta: Delta) -> Result<()> {
        apply_delta(&mut self.state, delta)
    }

    fn require_session(&self) -> Result<&str> {
        self.session
            .as_deref()
            .ok_or_else(|| EngineError::AuthFailure("not logged in".to_string()))
    }

    fn spawn_save(&self, rt: &Handle) -> SaveHandle {
        let store = Arc::clone(&self.store);
        let keys = self.keys.clone();
        let schedule = self.state.schedule.clone();
        let predictions = self.state.predictions.clone();
        rt.spawn(async move {
            let res = persist::save_state(store.as_ref(), &keys, &schedule, &predictions).await;
            if let Err(err) = &res {
                warn!(error = %err, "state kept in memory only");
            }
            res
        })
    }
}

fn save_runtime() -> Result<Handle> {
    Handle::try_current()
        .map_err(|err| EngineError::persistence(format!("no runtime to save on: {err}")))
}

fn check_credentials_input(user: &str, secret: &str) -> Result<()> {
    if user.is_empty() || secret.is_empty() {
        return Err(EngineError::invalid("user name and password are required"));
    }
    Ok(())
}
