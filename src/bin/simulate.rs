use clap::Parser;
use planet_conqueror_server::constants::{
    MAX_ROCKET_UPGRADE, MAX_SATELLITE_UPGRADE, MIN_ROCKET_UPGRADE, PLAYER2_COLOR, PLAYER_COLOR,
    TICK_MS,
};
use planet_conqueror_server::engine::{
    AiProfile, GameEngine, GameEngineOptions, TargetPick, UpgradePick,
};
use planet_conqueror_server::types::{GameEvent, MatchOutcome, Snapshot};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

/// Plays whole matches with every faction under AI control and checks board
/// invariants after each tick. Exits 1 when any invariant broke.
#[derive(Parser, Debug)]
#[command(author, version, about = "Headless AI-vs-AI planet conquest runs")]
struct Cli {
    /// Play only this level instead of the built-in matchups.
    #[arg(long)]
    level: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 1)]
    runs: u32,
    /// Simulated minutes before a match is called a stalemate.
    #[arg(long, default_value_t = 20)]
    max_minutes: u32,
    /// Seat a second "human" faction, also autoplayed.
    #[arg(long)]
    two_player: bool,
    #[arg(long = "report")]
    report_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct Matchup {
    label: String,
    level: u32,
    seed: u32,
    second_seat: bool,
    sim_limit_ms: u64,
    profile: AiProfile,
}

#[derive(Clone, Debug, Default, Serialize)]
struct EventTally {
    captures: u32,
    connections: u32,
    upgrades: u32,
    turns: u32,
}

impl EventTally {
    fn absorb(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::PlanetCaptured { .. } => self.captures += 1,
                GameEvent::ConnectionCreated { .. } => self.connections += 1,
                GameEvent::UpgradeApplied { .. } => self.upgrades += 1,
                GameEvent::TurnChanged { .. } => self.turns += 1,
                _ => {}
            }
        }
    }
}

/// Distinct violations in first-seen order, with how many ticks showed each.
#[derive(Debug, Default)]
struct InvariantLog {
    first_tick: BTreeMap<String, u64>,
    hits: BTreeMap<String, u32>,
    order: Vec<String>,
}

impl InvariantLog {
    fn record(&mut self, tick: u64, violation: String) {
        let hits = self.hits.entry(violation.clone()).or_insert(0);
        *hits += 1;
        if *hits == 1 {
            tracing::warn!(tick, violation = %violation, "invariant broken");
            self.first_tick.insert(violation.clone(), tick);
            self.order.push(violation);
        }
    }

    fn is_clean(&self) -> bool {
        self.order.is_empty()
    }

    fn total_hits(&self) -> u32 {
        self.hits.values().sum()
    }

    fn into_lines(self) -> Vec<String> {
        self.order
            .into_iter()
            .map(|violation| {
                let tick = self.first_tick.get(&violation).copied().unwrap_or_default();
                let hits = self.hits.get(&violation).copied().unwrap_or_default();
                format!("{violation} (first at {tick} ms, {hits} ticks)")
            })
            .collect()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchReport {
    label: String,
    level: u32,
    seed: u32,
    /// "won", "lost" or "stalemate".
    verdict: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    survivor: Option<String>,
    sim_ms: u64,
    years: i32,
    tally: EventTally,
    violation_ticks: u32,
    violations: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchReport {
    generated_at: String,
    matches: usize,
    mean_sim_ms: u64,
    verdicts: BTreeMap<String, usize>,
    survivors: BTreeMap<String, usize>,
    reports: Vec<MatchReport>,
}

impl BatchReport {
    fn from_reports(reports: Vec<MatchReport>) -> Self {
        let mut verdicts = BTreeMap::new();
        let mut survivors = BTreeMap::new();
        for report in &reports {
            *verdicts.entry(report.verdict.clone()).or_insert(0) += 1;
            if let Some(survivor) = &report.survivor {
                *survivors.entry(survivor.clone()).or_insert(0) += 1;
            }
        }
        let mean_sim_ms = match reports.len() {
            0 => 0,
            n => reports.iter().map(|r| r.sim_ms).sum::<u64>() / n as u64,
        };
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            matches: reports.len(),
            mean_sim_ms,
            verdicts,
            survivors,
            reports,
        }
    }

    fn is_clean(&self) -> bool {
        self.reports.iter().all(|report| report.violations.is_empty())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut reports = Vec::new();
    for matchup in plan_matchups(&cli) {
        let span = tracing::info_span!("match", label = %matchup.label, seed = matchup.seed);
        let _enter = span.enter();
        let report = play_matchup(&matchup);
        tracing::info!(
            verdict = %report.verdict,
            sim_ms = report.sim_ms,
            captures = report.tally.captures,
            "match finished"
        );
        match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(error) => tracing::error!(error = %error, "match report did not serialize"),
        }
        reports.push(report);
    }

    let batch = BatchReport::from_reports(reports);
    tracing::info!(
        matches = batch.matches,
        mean_sim_ms = batch.mean_sim_ms,
        "batch finished"
    );

    if let Some(path) = cli.report_path.as_deref() {
        if let Err(error) = write_report(path, &batch) {
            tracing::error!(path = %path.display(), error = %error, "report not written");
            std::process::exit(2);
        }
    }
    if !batch.is_clean() {
        std::process::exit(1);
    }
}

fn plan_matchups(cli: &Cli) -> Vec<Matchup> {
    let base_seed = cli
        .seed
        .map(|seed| seed as u32)
        .unwrap_or_else(rand::random::<u32>);
    let sim_limit_ms = u64::from(cli.max_minutes.clamp(1, 120)) * 60_000;

    let presets: Vec<(String, u32, AiProfile)> = match cli.level {
        Some(level) => {
            let level = level.clamp(1, 6);
            vec![(format!("level{level}"), level, AiProfile::default())]
        }
        None => vec![
            ("uniform-level2".to_string(), 2, AiProfile::default()),
            (
                "bully-level3".to_string(),
                3,
                AiProfile {
                    upgrade_pick: UpgradePick::Strongest,
                    target_pick: TargetPick::Weakest,
                    spare_allies: true,
                },
            ),
        ],
    };

    (0..cli.runs.clamp(1, 100))
        .flat_map(|run| {
            presets
                .iter()
                .enumerate()
                .map(move |(slot, (name, level, profile))| Matchup {
                    label: format!("{name}#{}", run + 1),
                    level: *level,
                    seed: base_seed
                        .wrapping_add(run.wrapping_mul(7_919))
                        .wrapping_add(slot as u32),
                    second_seat: cli.two_player,
                    sim_limit_ms,
                    profile: *profile,
                })
        })
        .collect()
}

fn play_matchup(matchup: &Matchup) -> MatchReport {
    let mut engine = GameEngine::new(
        PLAYER_COLOR,
        matchup.second_seat.then_some(PLAYER2_COLOR),
        matchup.level,
        GameEngineOptions {
            seed: matchup.seed,
            ai: matchup.profile,
            ai_enabled: true,
            autoplay_humans: true,
        },
    );

    let mut tally = EventTally::default();
    let mut log = InvariantLog::default();
    while !engine.is_ended() && engine.current_ticks < matchup.sim_limit_ms {
        engine.step(TICK_MS);
        let snapshot = engine.build_snapshot(true);
        tally.absorb(&snapshot.events);
        for violation in board_violations(&snapshot) {
            log.record(snapshot.current_ticks, violation);
        }
    }

    let (verdict, survivor) = match engine.outcome() {
        Some(MatchOutcome::Won { faction }) => ("won", Some(faction.to_string())),
        Some(MatchOutcome::Lost { faction }) => ("lost", Some(faction.to_string())),
        None => ("stalemate", None),
    };
    if !log.is_clean() {
        tracing::warn!(distinct = log.order.len(), "match broke invariants");
    }

    MatchReport {
        label: matchup.label.clone(),
        level: matchup.level,
        seed: matchup.seed,
        verdict: verdict.to_string(),
        survivor,
        sim_ms: engine.current_ticks,
        years: engine.year - engine.year_start,
        tally,
        violation_ticks: log.total_hits(),
        violations: log.into_lines(),
    }
}

fn board_violations(snapshot: &Snapshot) -> Vec<String> {
    let mut found = Vec::new();
    for planet in &snapshot.planets {
        if planet.value < 0 {
            found.push(format!("{} below zero", planet.id));
        }
        if !(MIN_ROCKET_UPGRADE..=MAX_ROCKET_UPGRADE).contains(&planet.rocket_upgrade)
            || planet.satellite_upgrade > MAX_SATELLITE_UPGRADE
        {
            found.push(format!("{} upgrade out of range", planet.id));
        }
    }

    let mut pairs = BTreeSet::new();
    for link in &snapshot.connections {
        if !pairs.insert((link.from, link.to)) {
            found.push(format!("link {} -> {} doubled", link.from, link.to));
        }
        if link.rockets.iter().any(|rocket| rocket.payload <= 0) {
            found.push(format!("link {} -> {} carries an empty rocket", link.from, link.to));
        }
    }

    // A single remaining owner means the match is over and rotation stopped.
    let owners: BTreeSet<_> = snapshot.planets.iter().map(|planet| planet.color).collect();
    if owners.len() > 1 && !owners.contains(&snapshot.current_turn_color) {
        found.push(format!(
            "turn held by eliminated faction {}",
            snapshot.current_turn_color
        ));
    }
    found
}

fn write_report(path: &Path, batch: &BatchReport) -> io::Result<()> {
    let text = serde_json::to_string_pretty(batch).map_err(io::Error::other)?;
    std::fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(verdict: &str, survivor: Option<&str>, sim_ms: u64) -> MatchReport {
        MatchReport {
            label: "test".to_string(),
            level: 2,
            seed: 42,
            verdict: verdict.to_string(),
            survivor: survivor.map(str::to_string),
            sim_ms,
            years: 0,
            tally: EventTally::default(),
            violation_ticks: 0,
            violations: Vec::new(),
        }
    }

    #[test]
    fn batch_counts_verdicts_and_survivors() {
        let batch = BatchReport::from_reports(vec![
            report("stalemate", None, 60_000),
            report("won", Some("#007848"), 90_000),
            report("lost", Some("#ff0000"), 30_000),
        ]);
        assert_eq!(batch.matches, 3);
        assert_eq!(batch.mean_sim_ms, 60_000);
        assert_eq!(batch.verdicts.get("won"), Some(&1));
        assert_eq!(batch.survivors.len(), 2);
        assert!(batch.is_clean());
    }

    #[test]
    fn write_report_fails_without_parent_dir() {
        let target = std::env::temp_dir()
            .join(format!("planet-conqueror-missing-{}", rand::random::<u32>()))
            .join("report.json");
        let batch = BatchReport::from_reports(vec![report("stalemate", None, 1)]);
        assert!(write_report(&target, &batch).is_err());
    }

    #[test]
    fn invariant_log_keeps_first_tick_and_counts_repeats() {
        let mut log = InvariantLog::default();
        log.record(50, "planet_3 below zero".to_string());
        log.record(100, "planet_3 below zero".to_string());
        log.record(150, "link 1 -> 2 doubled".to_string());

        assert!(!log.is_clean());
        assert_eq!(log.total_hits(), 3);
        let lines = log.into_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "planet_3 below zero (first at 50 ms, 2 ticks)");
    }

    #[test]
    fn matchups_repeat_per_run_with_distinct_seeds() {
        let cli = Cli::parse_from(["simulate", "--seed", "9", "--runs", "2"]);
        let matchups = plan_matchups(&cli);
        assert_eq!(matchups.len(), 4);
        let seeds: BTreeSet<u32> = matchups.iter().map(|m| m.seed).collect();
        assert_eq!(seeds.len(), 4);
        assert_eq!(matchups[1].profile.target_pick, TargetPick::Weakest);
        assert_eq!(matchups[2].label, "uniform-level2#2");
    }

    #[test]
    fn short_match_keeps_invariants() {
        let matchup = Matchup {
            label: "smoke".to_string(),
            level: 1,
            seed: 1234,
            second_seat: false,
            sim_limit_ms: 2 * 60_000,
            profile: AiProfile::default(),
        };
        let report = play_matchup(&matchup);
        assert!(report.violations.is_empty(), "{:?}", report.violations);
        assert!(report.sim_ms <= 2 * 60_000);
    }
}
