use serde::{Deserialize, Serialize};
use tower_sandbox_core::{EnemyKind, Error, Result, WaveIndex};

/// Per-wave escalation applied on top of the difficulty multiplier.
///
/// Each growth rate compounds once per wave after the first, so wave `n`
/// is scaled by `(1 + growth)^(n - 1)`. The default curve is flat.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaveCurve {
    /// Compounding growth of enemy health.
    pub health_growth: f64,
    /// Compounding growth of enemy speed.
    pub speed_growth: f64,
    /// Compounding growth of enemy count.
    pub count_growth: f64,
    /// Every `special_frequency`-th wave receives a special enemy when its
    /// record names none. Zero disables the feature.
    pub special_frequency: u32,
    /// Specials handed out in rotation.
    pub extra_specials: Vec<EnemyKind>,
}

impl WaveCurve {
    /// Health multiplier for the provided wave.
    #[must_use]
    pub fn health_multiplier(&self, wave: WaveIndex) -> f64 {
        compound(self.health_growth, wave)
    }

    /// Speed multiplier for the provided wave.
    #[must_use]
    pub fn speed_multiplier(&self, wave: WaveIndex) -> f64 {
        compound(self.speed_growth, wave)
    }

    /// Count multiplier for the provided wave.
    #[must_use]
    pub fn count_multiplier(&self, wave: WaveIndex) -> f64 {
        compound(self.count_growth, wave)
    }

    /// Special assigned to `wave` by the rotation, if any.
    #[must_use]
    pub fn special_for(&self, wave: WaveIndex) -> Option<&EnemyKind> {
        if self.special_frequency == 0 || self.extra_specials.is_empty() {
            return None;
        }
        let wave = wave.get();
        if wave % self.special_frequency != 0 {
            return None;
        }
        let slot = usize::try_from(wave / self.special_frequency - 1).ok()?;
        self.extra_specials.get(slot % self.extra_specials.len())
    }

    /// Rejects negative or non-finite growth rates and an empty rotation.
    pub fn validate(&self) -> Result<()> {
        for (name, growth) in [
            ("health_growth", self.health_growth),
            ("speed_growth", self.speed_growth),
            ("count_growth", self.count_growth),
        ] {
            if !growth.is_finite() || growth < 0.0 {
                return Err(Error::InvalidScalingPolicy {
                    reason: format!("`{name}` must be a non-negative number, found {growth}"),
                });
            }
        }
        if self.special_frequency > 0 && self.extra_specials.is_empty() {
            return Err(Error::InvalidScalingPolicy {
                reason: "`special_frequency` requires at least one entry in `extra_specials`"
                    .to_owned(),
            });
        }
        Ok(())
    }
}

fn compound(growth: f64, wave: WaveIndex) -> f64 {
    let exponent = i32::try_from(wave.get() - 1).unwrap_or(i32::MAX);
    (1.0 + growth).powi(exponent)
}
