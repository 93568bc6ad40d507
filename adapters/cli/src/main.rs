#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the Tower Sandbox toolkit.

mod config;
mod demo;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tower_sandbox_core::{Difficulty, MapDescriptor};
use tower_sandbox_presenter::{ExitStatus, Presenter};
use tower_sandbox_system_map_registry::MapRegistry;
use tower_sandbox_system_wave_loader::{load_waves, write_waves};
use tracing::{error, info, Level};

use crate::config::Settings;

/// Command-line options for the Tower Sandbox executable.
#[derive(Debug, Parser)]
#[command(name = "tower-sandbox", version, about = "Tower defense map and wave toolkit")]
struct Cli {
    /// Whether to play the waves back or only summarize them.
    #[arg(long, value_enum, default_value_t = Mode::Demo, conflicts_with = "configurator")]
    mode: Mode,
    /// Shorthand for `--mode configurator`.
    #[arg(long)]
    configurator: bool,
    /// Identifier of the map to use instead of asking interactively.
    #[arg(long, value_name = "ID")]
    map: Option<String>,
    /// Difficulty applied to the map's waves.
    #[arg(long, value_name = "VALUE")]
    difficulty: Option<f64>,
    /// Directory scanned for map metadata files.
    #[arg(long, value_name = "DIR")]
    maps_dir: Option<PathBuf>,
    /// Settings file to read instead of `tower-sandbox.toml`.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Writes the selected map's base waves to this CSV file.
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
    /// Raises log verbosity; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.configurator {
            Mode::Configurator
        } else {
            self.mode
        }
    }
}

/// Top-level behaviour selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Headless wave playback on a simulated clock.
    Demo,
    /// Map menu followed by the adjusted wave summary.
    Configurator,
}

/// Entry point for the Tower Sandbox command-line interface.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(status) => status.into(),
        Err(error) => {
            error!("{error:#}");
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .without_time()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitStatus> {
    let settings = Settings::load(cli.config.as_deref())?;
    let maps_dir = cli.maps_dir.as_ref().unwrap_or(&settings.maps_dir);
    let difficulty = cli.difficulty.unwrap_or(settings.difficulty);

    let registry = MapRegistry::load(maps_dir)?;
    info!(maps = registry.list_maps().len(), dir = %maps_dir.display(), "maps loaded");
    let presenter = Presenter::new(&registry, settings.adjuster()?);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let map = match cli.map.as_deref() {
        Some(id) => registry.get_map(id)?,
        None => presenter.select_map(&mut io::stdin().lock(), &mut out)?,
    };

    if let Some(path) = &cli.export {
        export_waves(map, path)?;
        writeln!(out, "Exported waves of {} to {}", map.id(), path.display())
            .context("failed to write to stdout")?;
    }

    match cli.mode() {
        Mode::Configurator => Ok(presenter.run_summary(
            map.id().as_str(),
            difficulty,
            &mut out,
            &mut io::stderr().lock(),
        )),
        Mode::Demo => {
            let difficulty = Difficulty::new(difficulty)?;
            let (map, waves) = presenter.adjusted_waves(map.id().as_str(), difficulty)?;
            demo::play(map, waves, settings.demo, &mut out)?;
            Ok(ExitStatus::Success)
        }
    }
}

fn export_waves(map: &MapDescriptor, path: &Path) -> Result<()> {
    let records = load_waves(map)?;
    let file = File::create(path)
        .with_context(|| format!("failed to create export file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_waves(&records, &mut writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write waves to {}", path.display()))?;
    info!(map = %map.id(), waves = records.len(), path = %path.display(), "waves exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn demo_is_the_default_mode() {
        let cli = Cli::try_parse_from(["tower-sandbox"]).expect("no arguments parse");
        assert_eq!(cli.mode(), Mode::Demo);
        assert!(cli.map.is_none());
    }

    #[test]
    fn configurator_flag_selects_configurator() {
        let cli = Cli::try_parse_from(["tower-sandbox", "--configurator", "--map", "forest-01"])
            .expect("flags parse");
        assert_eq!(cli.mode(), Mode::Configurator);
        assert_eq!(cli.map.as_deref(), Some("forest-01"));

        let cli = Cli::try_parse_from(["tower-sandbox", "--mode", "configurator"])
            .expect("mode parses");
        assert_eq!(cli.mode(), Mode::Configurator);
    }

    #[test]
    fn configurator_flag_conflicts_with_explicit_mode() {
        let result = Cli::try_parse_from(["tower-sandbox", "--mode", "demo", "--configurator"]);
        assert!(result.is_err());
    }

    #[test]
    fn overrides_and_verbosity_parse() {
        let cli = Cli::try_parse_from([
            "tower-sandbox",
            "--difficulty",
            "2.5",
            "--maps-dir",
            "campaign",
            "--export",
            "out.csv",
            "-vv",
        ])
        .expect("overrides parse");
        assert_eq!(cli.difficulty, Some(2.5));
        assert_eq!(cli.maps_dir, Some(PathBuf::from("campaign")));
        assert_eq!(cli.export, Some(PathBuf::from("out.csv")));
        assert_eq!(cli.verbose, 2);
    }
}
