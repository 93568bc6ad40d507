use serde::{Deserialize, Serialize};
use tower_sandbox_core::{Difficulty, Error, Result};

/// Smallest multiplier a linear policy can produce.
pub const MIN_MULTIPLIER: f64 = 0.05;
/// Largest multiplier a policy may produce at [`Difficulty::MAX`].
pub const MAX_MULTIPLIER: f64 = 100.0;

/// Maps a difficulty to the multiplier applied to enemy strength.
///
/// Every policy is non-decreasing in difficulty once validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalingPolicy {
    /// `1 + slope * (difficulty - 1)`, floored at [`MIN_MULTIPLIER`].
    Linear {
        /// Change in multiplier per unit of difficulty.
        slope: f64,
    },
    /// Step function over difficulty thresholds.
    Tiered {
        /// Steps ordered by strictly increasing threshold.
        tiers: Vec<Tier>,
    },
}

/// One step of a [`ScalingPolicy::Tiered`] policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tier {
    /// Lowest difficulty at which the tier applies.
    pub min_difficulty: f64,
    /// Multiplier used while the tier applies.
    pub multiplier: f64,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self::Linear { slope: 1.0 }
    }
}

impl ScalingPolicy {
    /// Multiplier for the provided difficulty.
    ///
    /// Below the first tier of a tiered policy the first tier's multiplier
    /// applies.
    #[must_use]
    pub fn multiplier(&self, difficulty: Difficulty) -> f64 {
        let value = difficulty.get();
        match self {
            Self::Linear { slope } => (1.0 + slope * (value - 1.0)).max(MIN_MULTIPLIER),
            Self::Tiered { tiers } => tiers
                .iter()
                .rev()
                .find(|tier| tier.min_difficulty <= value)
                .or_else(|| tiers.first())
                .map_or(1.0, |tier| tier.multiplier),
        }
    }

    /// Rejects policies that could decrease strength as difficulty rises.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Linear { slope } => {
                if !slope.is_finite() || *slope < 0.0 {
                    return Err(invalid(format!(
                        "linear slope must be a non-negative number, found {slope}"
                    )));
                }
                let strongest = 1.0 + slope * (Difficulty::MAX - 1.0);
                if !strongest.is_finite() || strongest > MAX_MULTIPLIER {
                    return Err(invalid(format!(
                        "linear slope {slope} yields multiplier {strongest} at difficulty {}, \
                         above the limit of {MAX_MULTIPLIER}",
                        Difficulty::MAX
                    )));
                }
            }
            Self::Tiered { tiers } => {
                if tiers.is_empty() {
                    return Err(invalid("tiered policy needs at least one tier".to_owned()));
                }
                for tier in tiers {
                    if !tier.min_difficulty.is_finite() {
                        return Err(invalid(format!(
                            "tier threshold must be finite, found {}",
                            tier.min_difficulty
                        )));
                    }
                    if !tier.multiplier.is_finite() || tier.multiplier <= 0.0 {
                        return Err(invalid(format!(
                            "tier multiplier must be positive, found {}",
                            tier.multiplier
                        )));
                    }
                    if tier.multiplier > MAX_MULTIPLIER {
                        return Err(invalid(format!(
                            "tier multiplier {} is above the limit of {MAX_MULTIPLIER}",
                            tier.multiplier
                        )));
                    }
                }
                for pair in tiers.windows(2) {
                    let (lower, upper) = (pair[0], pair[1]);
                    if upper.min_difficulty <= lower.min_difficulty {
                        return Err(invalid(format!(
                            "tier thresholds must increase, found {} after {}",
                            upper.min_difficulty, lower.min_difficulty
                        )));
                    }
                    if upper.multiplier < lower.multiplier {
                        return Err(invalid(format!(
                            "tier multipliers must not decrease, found {} after {}",
                            upper.multiplier, lower.multiplier
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> Error {
    Error::InvalidScalingPolicy { reason }
}
