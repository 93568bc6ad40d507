use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tower_sandbox_system_difficulty::{DifficultyAdjuster, ScalingPolicy, WaveCurve};
use tracing::debug;

/// Settings file read when `--config` is not given.
pub(crate) const DEFAULT_SETTINGS_PATH: &str = "tower-sandbox.toml";

/// Values loaded from the optional TOML settings file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    /// Directory scanned for map metadata files.
    pub(crate) maps_dir: PathBuf,
    /// Difficulty used when the command line does not override it.
    pub(crate) difficulty: f64,
    /// Mapping from difficulty to strength multiplier.
    pub(crate) scaling: ScalingPolicy,
    /// Per-wave escalation.
    pub(crate) curve: WaveCurve,
    /// Headless playback tuning.
    pub(crate) demo: DemoSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            maps_dir: PathBuf::from("data/maps"),
            difficulty: 1.0,
            scaling: ScalingPolicy::default(),
            curve: WaveCurve::default(),
            demo: DemoSettings::default(),
        }
    }
}

/// Tuning of the headless wave playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DemoSettings {
    /// Passes over the wave list. More than one loops the schedule.
    pub(crate) rounds: u32,
    /// Simulated clock step in milliseconds.
    pub(crate) tick_millis: u64,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            rounds: 1,
            tick_millis: 100,
        }
    }
}

impl Settings {
    /// Loads settings from `explicit`, or from the default file when present.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path,
            None => {
                let path = Path::new(DEFAULT_SETTINGS_PATH);
                if !path.is_file() {
                    debug!(path = DEFAULT_SETTINGS_PATH, "no settings file found, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings = Self::parse(&contents)
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    fn parse(contents: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(contents).context("failed to parse settings toml contents")?;
        if settings.demo.rounds == 0 {
            bail!("`demo.rounds` must be at least 1");
        }
        if settings.demo.tick_millis == 0 {
            bail!("`demo.tick_millis` must be at least 1");
        }
        Ok(settings)
    }

    /// Builds the adjuster described by the scaling and curve sections.
    pub(crate) fn adjuster(&self) -> Result<DifficultyAdjuster> {
        DifficultyAdjuster::new(self.scaling.clone(), self.curve.clone())
            .context("invalid difficulty scaling settings")
    }
}
