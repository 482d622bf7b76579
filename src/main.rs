//! Bug Squash entry point
//!
//! Headless native runner: plays one seeded session against a scripted
//! player and prints a JSON summary. A real host (Android, web) drives
//! [`GameLoop`] the same way, replacing the scripted player with touch input
//! and the command log with drawing.

use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use bug_squash::{ConfigError, Settings};
use bug_squash::sim::{BugKind, GameLoop, HostCommand};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

/// Host frame length (ms)
const FRAME_MS: u64 = 16;
const DEFAULT_DURATION_MS: u64 = 30_000;
const FIELD_WIDTH: u32 = 1080;
const FIELD_HEIGHT: u32 = 1600;

/// Chance per frame that the player goes for a bug
const TAP_CHANCE: f64 = 0.04;
/// Chance the player taps a poison bug anyway
const POISON_SLIP_CHANCE: f64 = 0.2;
/// Chance per frame of a stray tap on empty field
const STRAY_TAP_CHANCE: f64 = 0.004;

#[derive(Debug)]
struct Cli {
    settings_path: Option<PathBuf>,
    seed: Option<u64>,
    duration_ms: u64,
    summary_out: Option<PathBuf>,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);

        let mut settings_path = None;
        let mut seed = None;
        let mut duration_ms = DEFAULT_DURATION_MS;
        let mut summary_out = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--settings" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--settings requires a file path"))?;
                    settings_path = Some(PathBuf::from(value));
                }
                "--seed" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--seed requires a number"))?;
                    seed = Some(
                        value
                            .parse::<u64>()
                            .with_context(|| format!("invalid --seed value: {value}"))?,
                    );
                }
                "--duration-ms" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--duration-ms requires a number"))?;
                    duration_ms = value
                        .parse::<u64>()
                        .with_context(|| format!("invalid --duration-ms value: {value}"))?;
                }
                "--summary-out" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--summary-out requires a file path"))?;
                    summary_out = Some(PathBuf::from(value));
                }
                "--help" | "-h" => {
                    println!(
                        "Usage: bug-squash [--settings PATH] [--seed N] [--duration-ms N] [--summary-out PATH]"
                    );
                    std::process::exit(0);
                }
                other => return Err(anyhow!("unknown argument: {other}. Use --help for usage.")),
            }
        }

        Ok(Self {
            settings_path,
            seed,
            duration_ms,
            summary_out,
        })
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    seed: u64,
    duration_ms: u64,
    score: i64,
    misses: u32,
    spawned_normal: u32,
    spawned_bonus: u32,
    spawned_poison: u32,
    squashed: u32,
    expired: u32,
    taps: u32,
}

/// Load the settings file. A file that cannot be read is an error; one that
/// reads but does not parse or validate falls back to defaults.
fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    match Settings::load(path) {
        Ok(settings) => Ok(settings),
        Err(err @ ConfigError::Io { .. }) => {
            Err(err).with_context(|| format!("failed to load settings: {}", path.display()))
        }
        Err(err) => {
            log::warn!("Ignoring settings in {}: {err}. Using defaults.", path.display());
            Ok(Settings::default())
        }
    }
}

fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5EED)
}

/// Pick a tap point for this frame, if the player acts
fn player_tap(game: &GameLoop, player: &mut Pcg32) -> Option<Vec2> {
    let half = Vec2::splat(game.bug_size() / 2.0);
    let now = game.now_ms();

    if player.random_bool(TAP_CHANCE) {
        // Oldest bug first: it is the one about to escape
        if let Some(bug) = game.active_bugs().next() {
            if bug.kind != BugKind::Poison || player.random_bool(POISON_SLIP_CHANCE) {
                return Some(bug.position_at(now) + half);
            }
        }
    }

    if player.random_bool(STRAY_TAP_CHANCE) {
        return Some(Vec2::new(
            player.random_range(0..FIELD_WIDTH) as f32,
            player.random_range(0..FIELD_HEIGHT) as f32,
        ));
    }
    None
}

fn log_command(now_ms: u64, command: &HostCommand) {
    match command {
        HostCommand::SpawnVisual {
            id, kind, duration_ms, ..
        } => log::debug!("[{now_ms:>6}ms] spawn {id} {} ({duration_ms}ms)", kind.as_str()),
        HostCommand::RemoveVisual(id) => log::debug!("[{now_ms:>6}ms] remove {id}"),
        HostCommand::ScoreChanged { score, misses } => {
            log::debug!("[{now_ms:>6}ms] score={score} misses={misses}")
        }
        HostCommand::StatusChanged(status) => log::info!("[{now_ms:>6}ms] {status}"),
    }
}

fn run(cli: Cli) -> Result<Summary> {
    let settings = load_settings(cli.settings_path.as_ref())?;
    let seed = cli.seed.or(settings.seed).unwrap_or_else(clock_seed);
    log::info!("Game initialized with seed: {seed}");

    let mut game = GameLoop::new(&settings, seed);
    let mut player = Pcg32::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15);
    let mut taps = 0u32;

    game.on_field_measured(FIELD_WIDTH, FIELD_HEIGHT);
    game.on_session_start();

    while game.now_ms() < cli.duration_ms {
        if let Some(point) = player_tap(&game, &mut player) {
            taps += 1;
            game.on_tap_at(point);
        }
        game.advance(FRAME_MS);
        let now = game.now_ms();
        for command in game.drain_commands() {
            log_command(now, &command);
        }
    }

    let session = game.session();
    let summary = Summary {
        seed,
        duration_ms: game.now_ms(),
        score: game.score(),
        misses: game.misses(),
        spawned_normal: session.stats.spawned(BugKind::Normal),
        spawned_bonus: session.stats.spawned(BugKind::Bonus),
        spawned_poison: session.stats.spawned(BugKind::Poison),
        squashed: session.stats.squashed,
        expired: session.stats.expired,
        taps,
    };

    game.on_session_destroyed();
    Ok(summary)
}

fn main() -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Bug Squash (headless) starting...");

    let cli = Cli::parse()?;
    let summary_out = cli.summary_out.clone();
    let summary = run(cli)?;

    let json = serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
    match summary_out {
        Some(path) => {
            fs::write(&path, json)
                .with_context(|| format!("failed writing summary: {}", path.display()))?;
            log::info!("Summary written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
