#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave playback driven by explicit time deltas.

use std::time::Duration;

use tower_sandbox_core::{AdjustedWaveRecord, EnemyKind, WaveIndex};

/// Configuration parameters required to construct the schedule.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    spawn_delay: Duration,
    loop_waves: bool,
}

impl Config {
    /// Creates a configuration from the map's spawn delay and the loop flag.
    #[must_use]
    pub const fn new(spawn_delay: Duration, loop_waves: bool) -> Self {
        Self {
            spawn_delay,
            loop_waves,
        }
    }
}

/// Enemy that came due while the schedule advanced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spawn {
    /// Wave that produced the enemy.
    pub wave: WaveIndex,
    /// Enemy type to create.
    pub enemy: EnemyKind,
    /// Zero-based position of the enemy within its wave.
    pub ordinal: u32,
    /// Time since the wave started at which the enemy was due.
    pub offset: Duration,
    /// Whether the enemy is the wave's special.
    pub special: bool,
}

/// Timer-driven controller that releases the enemies of one wave at a time.
#[derive(Debug)]
pub struct WaveSchedule {
    waves: Vec<AdjustedWaveRecord>,
    spawn_delay: Duration,
    loop_waves: bool,
    current: Option<usize>,
    active: Option<ActiveWave>,
}

impl WaveSchedule {
    /// Creates an idle schedule over the provided waves.
    #[must_use]
    pub fn new(waves: Vec<AdjustedWaveRecord>, config: Config) -> Self {
        Self {
            waves,
            spawn_delay: config.spawn_delay,
            loop_waves: config.loop_waves,
            current: None,
            active: None,
        }
    }

    /// Starts the next wave.
    ///
    /// Returns `false` while a wave is still spawning or when no wave is left.
    /// A looping schedule restarts at the first wave after the last one.
    pub fn start_next_wave(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }

        let mut next = self.current.map_or(0, |index| index + 1);
        if next >= self.waves.len() {
            if self.loop_waves && !self.waves.is_empty() {
                next = 0;
            } else {
                return false;
            }
        }

        self.current = Some(next);
        self.active = Some(ActiveWave::new(&self.waves[next], self.spawn_delay));
        true
    }

    /// Advances the active wave by `dt` and emits every spawn that came due.
    pub fn handle(&mut self, dt: Duration, out: &mut Vec<Spawn>) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        active.elapsed = active.elapsed.saturating_add(dt);
        while let Some(spawn) = active.next_due() {
            out.push(spawn);
        }

        if active.is_exhausted() {
            self.active = None;
        }
    }

    /// Returns to the idle state and forgets progress.
    pub fn reset(&mut self) {
        self.current = None;
        self.active = None;
    }

    /// Index of the wave currently spawning.
    #[must_use]
    pub fn current_wave(&self) -> Option<WaveIndex> {
        self.active.as_ref().map(|active| active.wave)
    }

    /// Whether a wave is currently spawning.
    #[must_use]
    pub fn wave_in_progress(&self) -> bool {
        self.active.is_some()
    }

    /// Number of configured waves.
    #[must_use]
    pub fn total_waves(&self) -> usize {
        self.waves.len()
    }

    /// Waves left to play, the active one included.
    ///
    /// A looping schedule never runs out and reports `None`.
    #[must_use]
    pub fn remaining_waves(&self) -> Option<usize> {
        if self.loop_waves {
            return None;
        }
        let started = self.current.map_or(0, |index| index + 1);
        let active = usize::from(self.active.is_some());
        Some(self.waves.len().saturating_sub(started) + active)
    }

    /// Whether every wave has been fully spawned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.loop_waves && self.active.is_none() && self.remaining_waves() == Some(0)
    }
}

#[derive(Debug)]
struct ActiveWave {
    wave: WaveIndex,
    enemy: EnemyKind,
    special: Option<EnemyKind>,
    count: u32,
    interval: Duration,
    delay: Duration,
    next: u32,
    elapsed: Duration,
}

impl ActiveWave {
    fn new(record: &AdjustedWaveRecord, delay: Duration) -> Self {
        Self {
            wave: record.index,
            enemy: record.enemy.clone(),
            special: record.special.clone(),
            count: record.count,
            interval: record.spawn_interval,
            delay,
            next: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn total(&self) -> u32 {
        self.count
            .saturating_add(u32::from(self.special.is_some()))
    }

    fn offset_of(&self, ordinal: u32) -> Duration {
        self.interval
            .checked_mul(ordinal)
            .unwrap_or(Duration::MAX)
            .saturating_add(self.delay)
    }

    fn next_due(&mut self) -> Option<Spawn> {
        if self.is_exhausted() {
            return None;
        }

        let ordinal = self.next;
        let offset = self.offset_of(ordinal);
        if offset > self.elapsed {
            return None;
        }

        self.next += 1;
        let special = ordinal >= self.count;
        let enemy = if special {
            self.special.clone()?
        } else {
            self.enemy.clone()
        };
        Some(Spawn {
            wave: self.wave,
            enemy,
            ordinal,
            offset,
            special,
        })
    }

    fn is_exhausted(&self) -> bool {
        self.next >= self.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(count: u32, interval: Duration, special: Option<&str>) -> AdjustedWaveRecord {
        AdjustedWaveRecord {
            index: WaveIndex::FIRST,
            enemy: EnemyKind::new("goblin").expect("non-empty enemy"),
            count,
            spawn_interval: interval,
            health: None,
            speed: None,
            special: special.and_then(EnemyKind::new),
            tags: Vec::new(),
        }
    }

    #[test]
    fn offsets_include_spawn_delay() {
        let active = ActiveWave::new(
            &record(3, Duration::from_millis(500), None),
            Duration::from_secs(1),
        );
        assert_eq!(active.offset_of(0), Duration::from_secs(1));
        assert_eq!(active.offset_of(2), Duration::from_secs(2));
    }

    #[test]
    fn offsets_saturate_instead_of_overflowing() {
        let active = ActiveWave::new(&record(u32::MAX, Duration::MAX, None), Duration::ZERO);
        assert_eq!(active.offset_of(u32::MAX), Duration::MAX);
    }

    #[test]
    fn special_counts_towards_total() {
        let plain = ActiveWave::new(&record(4, Duration::ZERO, None), Duration::ZERO);
        let special = ActiveWave::new(&record(4, Duration::ZERO, Some("warlord")), Duration::ZERO);
        assert_eq!(plain.total(), 4);
        assert_eq!(special.total(), 5);
    }
}
