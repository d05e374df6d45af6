//! Percentile-biased parent sampling over a ranked population.
//!
//! # Distribution
//!
//! Each draw samples `u ~ U[0, 1)` and maps it through
//!
//! ```text
//! percentile = max_percentile * u^(1 / (1 - fitness_bias))
//! index      = floor(percentile * population_len)
//! ```
//!
//! - `max_percentile` truncates the eligible pool to the top fraction of the
//!   ranking. With `0.2`, only the best 20% can become parents.
//! - `fitness_bias` skews the pool toward index 0. At `0.0` every eligible
//!   index is equally likely; as it approaches `1.0` the best individual
//!   takes nearly every draw.
//!
//! This is inverse-CDF sampling: O(1) per draw, no search, sampling with
//! replacement. The population must already be ranked best-first (see
//! [`ranking::rank`](crate::ranking::rank)).
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg32;
//! use steerevo_training::sampling::PercentileSampler;
//!
//! let sampler = PercentileSampler::new(0.2, 0.5).unwrap();
//! let mut rng = Pcg32::seed_from_u64(0);
//! let parents = sampler.sample(100, 150, &mut rng);
//! assert_eq!(parents.len(), 150);
//! assert!(parents.iter().all(|&i| i < 20));
//! ```

use rand::Rng;

/// Invalid sampler parameters.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SamplerParamError {
    #[display("max percentile must be in (0, 1], got {value}")]
    MaxPercentile { value: f64 },
    #[display("fitness bias must be in [0, 1), got {value}")]
    FitnessBias { value: f64 },
}

/// Draws parent indices biased toward the top of a ranked population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileSampler {
    max_percentile: f64,
    fitness_bias: f64,
}

impl Default for PercentileSampler {
    fn default() -> Self {
        Self {
            max_percentile: 0.2,
            fitness_bias: 0.5,
        }
    }
}

impl PercentileSampler {
    /// Creates a sampler.
    ///
    /// # Arguments
    ///
    /// * `max_percentile` - Fraction of the ranking eligible for selection, in `(0, 1]`
    /// * `fitness_bias` - Skew toward the best individual, in `[0, 1)`
    pub fn new(max_percentile: f64, fitness_bias: f64) -> Result<Self, SamplerParamError> {
        if !(max_percentile > 0.0 && max_percentile <= 1.0) {
            return Err(SamplerParamError::MaxPercentile {
                value: max_percentile,
            });
        }
        if !(0.0..1.0).contains(&fitness_bias) {
            return Err(SamplerParamError::FitnessBias {
                value: fitness_bias,
            });
        }
        Ok(Self {
            max_percentile,
            fitness_bias,
        })
    }

    #[must_use]
    pub fn max_percentile(&self) -> f64 {
        self.max_percentile
    }

    #[must_use]
    pub fn fitness_bias(&self) -> f64 {
        self.fitness_bias
    }

    /// Number of top-ranked individuals that can be drawn.
    ///
    /// Always at least 1 and at most `population_len` (for a non-empty
    /// population).
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn eligible_len(&self, population_len: usize) -> usize {
        let eligible = (self.max_percentile * population_len as f64).ceil() as usize;
        eligible.clamp(1, population_len.max(1))
    }

    /// Draws a single index in `0..eligible_len(population_len)`.
    ///
    /// # Panics
    ///
    /// Panics if `population_len` is zero.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn draw<R>(&self, population_len: usize, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        assert!(population_len > 0, "cannot sample from an empty population");
        let u: f64 = rng.random();
        let percentile = self.max_percentile * u.powf(1.0 / (1.0 - self.fitness_bias));
        let index = (percentile * population_len as f64).floor() as usize;
        // Rounding can land exactly on the boundary.
        index.min(self.eligible_len(population_len) - 1)
    }

    /// Draws `count` indices with replacement.
    ///
    /// `count` may be smaller than, equal to, or larger than the population.
    ///
    /// # Panics
    ///
    /// Panics if `population_len` is zero and `count` is not.
    pub fn sample<R>(&self, population_len: usize, count: usize, rng: &mut R) -> Vec<usize>
    where
        R: Rng + ?Sized,
    {
        (0..count).map(|_| self.draw(population_len, rng)).collect()
    }
}
