#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Terminal presentation of the map menu and adjusted wave summaries.
//!
//! The presenter is the error boundary of the toolkit: the loading systems
//! propagate [`Error`] values up to [`Presenter::run_summary`], which logs
//! them, reports them to the user and converts them into an [`ExitStatus`].

use std::{
    error::Error as _,
    io::{BufRead, Write},
};

use tower_sandbox_core::{AdjustedWaveRecord, Difficulty, Error, MapDescriptor, Result};
use tower_sandbox_system_difficulty::DifficultyAdjuster;
use tower_sandbox_system_map_registry::MapRegistry;
use tower_sandbox_system_wave_loader::load_waves;
use tracing::{debug, error, info};

/// Outcome reported to the operating system by the command surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every step completed.
    Success,
    /// An error was reported to the user.
    Failure,
}

impl ExitStatus {
    /// Numeric process exit code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        Self::from(status.code())
    }
}

/// Renders menus and summaries for the maps of one registry.
#[derive(Debug)]
pub struct Presenter<'a> {
    registry: &'a MapRegistry,
    adjuster: DifficultyAdjuster,
}

impl<'a> Presenter<'a> {
    /// Creates a presenter over an already loaded registry.
    #[must_use]
    pub fn new(registry: &'a MapRegistry, adjuster: DifficultyAdjuster) -> Self {
        Self { registry, adjuster }
    }

    /// Writes the numbered list of available maps.
    pub fn present_menu(&self, out: &mut impl Write) -> Result<()> {
        let menu = self.render_menu();
        write_console(out, &menu)
    }

    /// Prompts until the user picks a map by number or identifier.
    ///
    /// Invalid answers are reported and the question is asked again. Running
    /// out of input fails with [`Error::SelectionAborted`].
    pub fn select_map(
        &self,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> Result<&'a MapDescriptor> {
        let maps = self.registry.list_maps();
        let mut menu = self.render_menu();
        menu.push_str(&format!("Select a map [1-{}]: ", maps.len()));
        write_console(out, &menu)?;

        let mut line = String::new();
        loop {
            line.clear();
            let read = input
                .read_line(&mut line)
                .map_err(|source| Error::Console { source })?;
            if read == 0 {
                return Err(Error::SelectionAborted);
            }

            let answer = line.trim();
            if let Some(map) = self.resolve_choice(answer) {
                debug!(map = %map.id(), "map selected");
                return Ok(map);
            }
            write_console(
                out,
                &format!(
                    "`{answer}` is not a listed map. Enter a number between 1 and {}: ",
                    maps.len()
                ),
            )?;
        }
    }

    /// Loads a map's waves and adjusts them for `difficulty`.
    pub fn adjusted_waves(
        &self,
        map_id: &str,
        difficulty: Difficulty,
    ) -> Result<(&'a MapDescriptor, Vec<AdjustedWaveRecord>)> {
        let map = self.registry.get_map(map_id)?;
        let records = load_waves(map)?;
        info!(
            map = %map.id(),
            waves = records.len(),
            %difficulty,
            "adjusting waves"
        );
        Ok((map, self.adjuster.apply(&records, difficulty)))
    }

    /// Writes the adjusted wave summary of one map.
    ///
    /// Nothing is written unless loading and adjustment both succeed.
    pub fn present_summary(
        &self,
        map_id: &str,
        difficulty: f64,
        out: &mut impl Write,
    ) -> Result<()> {
        let difficulty = Difficulty::new(difficulty)?;
        let (map, waves) = self.adjusted_waves(map_id, difficulty)?;
        let summary = self.render_summary(map, difficulty, &waves);
        write_console(out, &summary)
    }

    /// Presents a summary and turns any failure into a user-facing message.
    pub fn run_summary(
        &self,
        map_id: &str,
        difficulty: f64,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> ExitStatus {
        match self.present_summary(map_id, difficulty, out) {
            Ok(()) => ExitStatus::Success,
            Err(error) => {
                report(&error, err);
                ExitStatus::Failure
            }
        }
    }

    fn resolve_choice(&self, answer: &str) -> Option<&'a MapDescriptor> {
        let maps = self.registry.list_maps();
        match answer.parse::<usize>() {
            Ok(number) => number.checked_sub(1).and_then(|index| maps.get(index)),
            Err(_) => self.registry.get_map(answer).ok(),
        }
    }

    fn render_menu(&self) -> String {
        let mut menu = String::from("Available maps:\n");
        for (position, map) in self.registry.list_maps().iter().enumerate() {
            let description = &map.metadata().description;
            if description.is_empty() {
                menu.push_str(&format!("  {}. {}\n", position + 1, map.name()));
            } else {
                menu.push_str(&format!(
                    "  {}. {} — {}\n",
                    position + 1,
                    map.name(),
                    description
                ));
            }
        }
        menu
    }

    fn render_summary(
        &self,
        map: &MapDescriptor,
        difficulty: Difficulty,
        waves: &[AdjustedWaveRecord],
    ) -> String {
        let metadata = map.metadata();
        let enemies: u64 = waves
            .iter()
            .map(|wave| u64::from(wave.count) + u64::from(wave.special.is_some()))
            .sum();

        let mut lines = vec![format!(
            "{} [{}] at difficulty {} (x{:.2})",
            map.name(),
            map.id(),
            difficulty,
            self.adjuster.multiplier(difficulty)
        )];
        if !metadata.description.is_empty() {
            lines.push(metadata.description.clone());
        }
        if let Some(size) = metadata.size {
            lines.push(format!(
                "Grid {}x{}, path length {} tiles",
                size.columns,
                size.rows,
                metadata.path_length()
            ));
        }
        lines.push(format!("{} waves, {} enemies", waves.len(), enemies));
        lines.extend(waves.iter().map(render_wave));

        let mut summary = lines.join("\n");
        summary.push('\n');
        summary
    }
}

fn render_wave(wave: &AdjustedWaveRecord) -> String {
    let mut line = format!(
        "  wave {:>2}: {} x {} every {:.2}s",
        wave.index.get(),
        wave.count,
        wave.enemy,
        wave.spawn_interval.as_secs_f64()
    );
    if let Some(health) = wave.health {
        line.push_str(&format!(", health {health}"));
    }
    if let Some(speed) = wave.speed {
        line.push_str(&format!(", speed {speed}"));
    }
    if let Some(special) = &wave.special {
        line.push_str(&format!(", then {special}"));
    }
    if !wave.tags.is_empty() {
        line.push_str(&format!(" [{}]", wave.tags.join(", ")));
    }
    line
}

fn write_console(out: &mut impl Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|source| Error::Console { source })
}

/// Logs `error` and writes it, with its causes, to `err`.
pub fn report(error: &Error, err: &mut impl Write) {
    error!(kind = ?error.kind(), "{error}");

    let mut message = format!("error: {error}\n");
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(&format!("  caused by: {cause}\n"));
        source = cause.source();
    }
    // Nothing left to report to when stderr itself fails.
    let _ = err.write_all(message.as_bytes());
}
