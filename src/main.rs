use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use quiniela::auth::KvCredentials;
use quiniela::config::Config;
use quiniela::schedule::{FixtureId, GroupId, default_roster};
use quiniela::score::Score;
use quiniela::standings::qualifiers;
use quiniela::{Engine, SaveHandle};

const USAGE: &str = "usage: quiniela <command>
  register <user> <password>
  predict <user> <password> <fixture-id> <home> <away>
  points <user> <password> <group> <match-day>
  result <fixture-id> <home> <away>
  schedule [group]
  standings <group>
  ranking
  simulate [user ...] [--ratio=<0..1>] [--seed=<n>]
  reset";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some((command, rest)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    let config = Config::from_env();
    let store = config.open_store()?;
    let credentials = Arc::new(KvCredentials::new(Arc::clone(&store)));
    let mut engine = Engine::load(store, credentials, config.keys.clone(), default_roster())
        .await
        .context("engine startup")?;

    match command.as_str() {
        "register" => {
            let [user, password] = take_args::<2>(rest)?;
            let save = engine.register(user, password).await?;
            println!("Registered {user}");
            report_save(save).await;
        }
        "predict" => {
            let [user, password, fixture, home, away] = take_args::<5>(rest)?;
            engine.login(user, password).await?;
            warn_outside_ui_range(home, away);
            let save = engine.submit_prediction(fixture, home.as_str(), away.as_str())?;
            println!("{user}: {fixture} {home}-{away}");
            report_save(save).await;
        }
        "points" => {
            let [user, password, group, day] = take_args::<4>(rest)?;
            engine.login(user, password).await?;
            let group = group.parse::<GroupId>()?;
            let day = day
                .parse::<u8>()
                .with_context(|| format!("invalid match day {day:?}"))?;
            for row in engine.my_match_day_points(group, day)? {
                let pts = row
                    .points
                    .map(|p| format!("{p} pts"))
                    .unwrap_or_else(|| "pending".to_string());
                println!("{:<8} {} vs {}: {}", row.fixture, row.home, row.away, pts);
            }
        }
        "result" => {
            let [fixture, home, away] = take_args::<3>(rest)?;
            let id = fixture.parse::<FixtureId>()?;
            warn_outside_ui_range(home, away);
            let index = usize::from(id.seq)
                .checked_sub(1)
                .ok_or_else(|| anyhow!("fixture {id} does not exist"))?;
            let save = engine.set_result(id.group, id.match_day, index, home.as_str(), away.as_str())?;
            println!("Result {id}: {home}-{away}");
            report_save(save).await;
        }
        "schedule" => {
            let only = rest.first().map(|g| g.parse::<GroupId>()).transpose()?;
            for (group, gs) in engine.schedule().groups() {
                if only.is_some_and(|g| g != group) {
                    continue;
                }
                println!("Group {group}: {}", gs.teams.join(", "));
                for fixture in gs.fixtures() {
                    let result = fixture
                        .result
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  {:<8} {} vs {}  {}",
                        fixture.id.to_string(),
                        fixture.home,
                        fixture.away,
                        result
                    );
                }
            }
        }
        "standings" => {
            let [group] = take_args::<1>(rest)?;
            let group = group.parse::<GroupId>()?;
            let table = engine.standings(group)?;
            let advancing = qualifiers(&table).len();
            println!("Group {group}");
            println!(
                "{:>2}  {:<16} {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>4} {:>3}",
                "#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"
            );
            for (idx, row) in table.iter().enumerate() {
                let marker = if idx < advancing { "*" } else { " " };
                println!(
                    "{:>2}{} {:<16} {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>4} {:>3}",
                    idx + 1,
                    marker,
                    row.team,
                    row.played,
                    row.won,
                    row.drawn,
                    row.lost,
                    row.goals_for,
                    row.goals_against,
                    row.goal_diff,
                    row.points
                );
            }
        }
        "ranking" => {
            let ranking = engine.global_ranking();
            if ranking.is_empty() {
                println!("No predictions yet");
            }
            for (idx, row) in ranking.iter().enumerate() {
                println!("{:>3}. {:<20} {:>4} pts", idx + 1, row.user, row.points);
            }
        }
        "simulate" => {
            let ratio = parse_flag(rest, "--ratio")
                .map(|raw| raw.parse::<f64>())
                .transpose()
                .context("invalid --ratio")?
                .unwrap_or(0.6);
            let mut rng = match parse_flag(rest, "--seed") {
                Some(raw) => StdRng::seed_from_u64(raw.parse().context("invalid --seed")?),
                None => StdRng::from_entropy(),
            };
            let users = rest
                .iter()
                .filter(|a| !a.starts_with("--"))
                .map(String::as_str)
                .collect::<Vec<_>>();
            let (summary, save) = engine.simulate(&mut rng, &users, ratio)?;
            println!(
                "Simulated {} results and {} predictions",
                summary.results, summary.predictions
            );
            report_save(save).await;
        }
        "reset" => {
            engine.reset().await?;
            println!("Stored schedule and predictions cleared");
        }
        other => {
            println!("{USAGE}");
            bail!("unknown command {other:?}");
        }
    }

    Ok(())
}

fn take_args<const N: usize>(rest: &[String]) -> Result<[&String; N]> {
    if rest.len() != N {
        bail!("expected {N} argument(s), got {}\n{USAGE}", rest.len());
    }
    Ok(std::array::from_fn(|idx| &rest[idx]))
}

fn parse_flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter().find_map(|arg| {
        arg.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
            .map(str::trim)
    })
}

fn warn_outside_ui_range(home: &str, away: &str) {
    if let Ok(score) = Score::parse(home, away)
        && !score.within_ui_range()
    {
        eprintln!("[WARN] {score} is outside the usual 0-20 range");
    }
}

async fn report_save(save: SaveHandle) {
    match save.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => eprintln!("[WARN] change kept but not saved: {err}"),
        Err(err) => eprintln!("[WARN] save task failed: {err}"),
    }
}
