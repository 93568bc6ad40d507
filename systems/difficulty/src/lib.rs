#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure difficulty adjustment of parsed wave records.
//!
//! The adjuster never mutates its input: every call derives a fresh
//! [`AdjustedWaveRecord`] sequence from the base records, the difficulty and
//! the adjuster's configuration. Identical inputs always produce identical
//! outputs.

mod curve;
mod policy;

use std::time::Duration;

pub use curve::WaveCurve;
pub use policy::{ScalingPolicy, Tier, MAX_MULTIPLIER, MIN_MULTIPLIER};
use tower_sandbox_core::{AdjustedWaveRecord, Difficulty, Result, WaveRecord};

/// Float noise tolerated before a scaled count is rounded up.
const COUNT_EPSILON: f64 = 1e-9;

/// Applies a [`ScalingPolicy`] and a [`WaveCurve`] to wave records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DifficultyAdjuster {
    policy: ScalingPolicy,
    curve: WaveCurve,
}

impl DifficultyAdjuster {
    /// Creates an adjuster after validating both halves of its configuration.
    pub fn new(policy: ScalingPolicy, curve: WaveCurve) -> Result<Self> {
        policy.validate()?;
        curve.validate()?;
        Ok(Self { policy, curve })
    }

    /// Scaling policy in use.
    #[must_use]
    pub fn policy(&self) -> &ScalingPolicy {
        &self.policy
    }

    /// Per-wave escalation in use.
    #[must_use]
    pub fn curve(&self) -> &WaveCurve {
        &self.curve
    }

    /// Strength multiplier the policy assigns to `difficulty`.
    #[must_use]
    pub fn multiplier(&self, difficulty: Difficulty) -> f64 {
        self.policy.multiplier(difficulty)
    }

    /// Validates `difficulty` and adjusts every record.
    ///
    /// Fails with [`tower_sandbox_core::Error::InvalidDifficulty`] when the
    /// value lies outside [`Difficulty::MIN`]..=[`Difficulty::MAX`].
    pub fn adjust(
        &self,
        records: &[WaveRecord],
        difficulty: f64,
    ) -> Result<Vec<AdjustedWaveRecord>> {
        let difficulty = Difficulty::new(difficulty)?;
        Ok(self.apply(records, difficulty))
    }

    /// Adjusts every record for an already validated difficulty.
    #[must_use]
    pub fn apply(&self, records: &[WaveRecord], difficulty: Difficulty) -> Vec<AdjustedWaveRecord> {
        let multiplier = self.policy.multiplier(difficulty);
        records
            .iter()
            .map(|record| self.adjust_record(record, multiplier))
            .collect()
    }

    fn adjust_record(&self, record: &WaveRecord, multiplier: f64) -> AdjustedWaveRecord {
        let health_factor = multiplier * self.curve.health_multiplier(record.index);
        let speed_factor = self.curve.speed_multiplier(record.index);
        let count_factor = multiplier * self.curve.count_multiplier(record.index);

        let count = scale_count(record.count, count_factor);
        let health = record.health.map(|health| scale_stat(health, health_factor));
        let speed = record.speed.map(|speed| scale_stat(speed, speed_factor));

        let mut tags = Vec::new();
        if record.health.is_some() {
            if let Some(tag) = percent_tag("health", health_factor) {
                tags.push(tag);
            }
        }
        if record.speed.is_some() {
            if let Some(tag) = percent_tag("speed", speed_factor) {
                tags.push(tag);
            }
        }
        if count > record.count {
            tags.push(format!("+count {}", count - record.count));
        } else if count < record.count {
            tags.push(format!("-count {}", record.count - count));
        }

        let special = record
            .special
            .clone()
            .or_else(|| self.curve.special_for(record.index).cloned());
        if let Some(special) = &special {
            tags.push(format!("special {special}"));
        }

        AdjustedWaveRecord {
            index: record.index,
            enemy: record.enemy.clone(),
            count,
            spawn_interval: scale_interval(record.spawn_interval, multiplier),
            health,
            speed,
            special,
            tags,
        }
    }
}

fn scale_count(count: u32, factor: f64) -> u32 {
    let scaled = (f64::from(count) * factor - COUNT_EPSILON).ceil().max(1.0);
    // Saturating cast.
    scaled as u32
}

fn scale_interval(interval: Duration, multiplier: f64) -> Duration {
    let nanos = (interval.as_nanos() as f64 / multiplier).round();
    Duration::from_nanos(nanos as u64)
}

/// Scales a stat and rounds it to two decimals. A factor of exactly one
/// leaves the base value untouched.
fn scale_stat(value: f64, factor: f64) -> f64 {
    if factor == 1.0 {
        value
    } else {
        round2(value * factor)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percent_tag(label: &str, factor: f64) -> Option<String> {
    let percent = ((factor - 1.0) * 100.0).round();
    if percent > 0.0 {
        Some(format!("+{label} {percent}%"))
    } else if percent < 0.0 {
        Some(format!("-{label} {}%", -percent))
    } else {
        None
    }
}
