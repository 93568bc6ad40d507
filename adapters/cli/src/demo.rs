use std::{io::Write, time::Duration};

use anyhow::{Context, Result};
use tower_sandbox_core::{AdjustedWaveRecord, MapDescriptor};
use tower_sandbox_system_wave_schedule::{Config, Spawn, WaveSchedule};
use tracing::{debug, info};

use crate::config::DemoSettings;

/// Plays the adjusted waves of `map` on a simulated clock and logs each spawn.
pub(crate) fn play(
    map: &MapDescriptor,
    waves: Vec<AdjustedWaveRecord>,
    settings: DemoSettings,
    out: &mut impl Write,
) -> Result<()> {
    let rounds = usize::try_from(settings.rounds).unwrap_or(usize::MAX);
    let tick = Duration::from_millis(settings.tick_millis);
    let mut schedule = WaveSchedule::new(
        waves,
        Config::new(map.metadata().spawn_delay, settings.rounds > 1),
    );
    let mut budget = schedule.total_waves().saturating_mul(rounds);

    writeln!(
        out,
        "Playing {} [{}]: {} waves, {} round(s)",
        map.name(),
        map.id(),
        schedule.total_waves(),
        settings.rounds
    )
    .context("failed to write demo output")?;
    info!(map = %map.id(), rounds, "starting demo playback");

    // Each wave begins at the exact time of the previous wave's last spawn.
    // `carry` is how far the tick-stepped clock has already run past it.
    let mut started = Duration::ZERO;
    let mut carry = Duration::ZERO;
    let mut spawns = Vec::new();
    while budget > 0 && schedule.start_next_wave() {
        budget -= 1;
        if let Some(wave) = schedule.current_wave() {
            debug!(%wave, "wave started");
            writeln!(out, "[{:>8.2}s] wave {wave} begins", started.as_secs_f64())
                .context("failed to write demo output")?;
        }

        let mut elapsed = carry;
        let mut last_offset = Duration::ZERO;
        schedule.handle(carry, &mut spawns);
        loop {
            for spawn in spawns.drain(..) {
                last_offset = spawn.offset;
                writeln!(out, "{}", describe(started, &spawn))
                    .context("failed to write demo output")?;
            }
            if !schedule.wave_in_progress() {
                break;
            }
            schedule.handle(tick, &mut spawns);
            elapsed = elapsed.saturating_add(tick);
        }

        carry = elapsed.saturating_sub(last_offset);
        started = started.saturating_add(last_offset);
    }

    writeln!(out, "Finished after {:.2}s", started.as_secs_f64())
        .context("failed to write demo output")?;
    Ok(())
}

fn describe(started: Duration, spawn: &Spawn) -> String {
    let at = started.saturating_add(spawn.offset).as_secs_f64();
    if spawn.special {
        format!(
            "[{at:>8.2}s] wave {} special {}",
            spawn.wave, spawn.enemy
        )
    } else {
        format!(
            "[{at:>8.2}s] wave {} spawns {} #{}",
            spawn.wave,
            spawn.enemy,
            spawn.ordinal + 1
        )
    }
}
