//! Percentile bootstrap with optional chunked parallel execution
//!
//! Each resample draws `n` respondent indices with replacement and evaluates a
//! statistic over the original data through those indices, so no resampled
//! copy of the data is materialised. The requested resamples are split into
//! chunks (one per worker of the execution engine), each with its own seeded
//! random stream; order of draws does not matter for percentile intervals.

use crate::{ConfidenceInterval, Diagnostics, IntervalMethod, IntervalResult};
use rand::prelude::*;
use rand::rngs::StdRng;
use survey_core::{math::empirical_quantile, Error, ExecutionEngine, Result, SequentialEngine};
use tracing::{debug, instrument};

/// Smallest number of resamples accepted
pub const MIN_RESAMPLES: usize = 1000;

/// Default number of bootstrap resamples
pub const DEFAULT_RESAMPLES: usize = 5000;

/// Odd 64-bit constant (2^64 / golden ratio) spreading chunk indices over the seed space
const CHUNK_SEED_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed of the random stream for `chunk`
///
/// Chunk 0 keeps the base seed, so a single-chunk run depends on the seed
/// alone. Other chunks land far from `base_seed + k`, where neighbouring
/// questions' base seeds live.
fn chunk_seed(base_seed: u64, chunk: usize) -> u64 {
    base_seed ^ (chunk as u64).wrapping_mul(CHUNK_SEED_MULTIPLIER)
}

/// Bootstrap draws of a statistic, sorted ascending
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapDistribution {
    draws: Vec<f64>,
    n_resamples: usize,
}

impl BootstrapDistribution {
    fn from_draws(mut draws: Vec<f64>, n_resamples: usize) -> Result<Self> {
        draws.retain(|x| x.is_finite());
        if draws.is_empty() {
            return Err(Error::Computation(
                "No bootstrap resample produced a finite statistic".to_string(),
            ));
        }
        draws.sort_by(|a, b| a.total_cmp(b));
        Ok(Self { draws, n_resamples })
    }

    /// Sorted finite draws
    pub fn draws(&self) -> &[f64] {
        &self.draws
    }

    /// Number of resamples requested
    pub fn n_resamples(&self) -> usize {
        self.n_resamples
    }

    /// Number of finite draws
    pub fn n_valid(&self) -> usize {
        self.draws.len()
    }

    pub fn mean(&self) -> f64 {
        self.draws.iter().sum::<f64>() / self.draws.len() as f64
    }

    /// Standard deviation of the draws
    pub fn standard_error(&self) -> f64 {
        let n = self.draws.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let ss: f64 = self.draws.iter().map(|x| (x - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    }

    /// Empirical `[α/2, 1-α/2]` quantiles
    pub fn percentile_bounds(&self, confidence_level: f64) -> Result<(f64, f64)> {
        let alpha = 1.0 - confidence_level;
        let lower = empirical_quantile(&self.draws, alpha / 2.0)?;
        let upper = empirical_quantile(&self.draws, 1.0 - alpha / 2.0)?;
        Ok((lower, upper))
    }
}

/// Bootstrap engine
///
/// ```rust
/// use survey_confidence::Bootstrap;
/// use survey_core::sequential;
///
/// let values = [3.0, 5.0, 4.0, 4.0, 2.0, 5.0];
/// let bootstrap = Bootstrap::new(sequential())
///     .with_resamples(2000)
///     .with_confidence_level(0.95)
///     .with_seed(Some(7));
///
/// let dist = bootstrap
///     .distribution(values.len(), |idx| {
///         idx.iter().map(|&i| values[i]).sum::<f64>() / idx.len() as f64
///     })
///     .unwrap();
/// let (lower, upper) = dist.percentile_bounds(0.95).unwrap();
/// assert!(lower <= upper);
/// ```
#[derive(Debug, Clone)]
pub struct Bootstrap<E> {
    engine: E,
    n_resamples: usize,
    confidence_level: f64,
    seed: Option<u64>,
}

impl Default for Bootstrap<SequentialEngine> {
    fn default() -> Self {
        Self::new(SequentialEngine)
    }
}

impl<E: ExecutionEngine> Bootstrap<E> {
    /// Create a new bootstrap engine
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            n_resamples: DEFAULT_RESAMPLES,
            confidence_level: 0.95,
            seed: None,
        }
    }

    /// Set the number of bootstrap resamples (validated when run)
    pub fn with_resamples(mut self, n_resamples: usize) -> Self {
        self.n_resamples = n_resamples;
        self
    }

    /// Set the confidence level (validated when run)
    pub fn with_confidence_level(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    /// Set random seed for reproducibility; `None` draws from the thread RNG
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn n_resamples(&self) -> usize {
        self.n_resamples
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn validate(&self) -> Result<()> {
        if self.n_resamples < MIN_RESAMPLES {
            return Err(Error::Configuration(format!(
                "Bootstrap requires at least {MIN_RESAMPLES} resamples, got {}",
                self.n_resamples
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(Error::invalid_confidence_level(self.confidence_level));
        }
        Ok(())
    }

    /// Resamples per chunk; one chunk per worker
    fn chunk_sizes(&self) -> Vec<usize> {
        let n_chunks = if self.engine.is_parallel() {
            self.engine.num_threads().clamp(1, self.n_resamples.max(1))
        } else {
            1
        };
        let base = self.n_resamples / n_chunks;
        let remainder = self.n_resamples % n_chunks;
        (0..n_chunks)
            .map(|i| base + usize::from(i < remainder))
            .collect()
    }

    /// Draw the bootstrap distribution of `statistic` over `n` respondents
    ///
    /// `statistic` receives the resampled respondent indices.
    #[instrument(
        skip(self, statistic),
        fields(n_resamples = self.n_resamples, strategy = ?self.engine.strategy())
    )]
    pub fn distribution<F>(&self, n: usize, statistic: F) -> Result<BootstrapDistribution>
    where
        F: Fn(&[usize]) -> f64 + Sync + Send,
    {
        self.validate()?;
        if n == 0 {
            return Err(Error::empty_input("bootstrap"));
        }

        let base_seed = self.seed.unwrap_or_else(|| thread_rng().gen());
        let chunks = self.chunk_sizes();
        debug!("Running {} resamples in {} chunk(s)", self.n_resamples, chunks.len());

        let chunk_draws = self.engine.execute_batch(chunks.len(), |chunk| {
            let mut rng = StdRng::seed_from_u64(chunk_seed(base_seed, chunk));
            let mut indices = vec![0usize; n];
            let mut draws = Vec::with_capacity(chunks[chunk]);
            for _ in 0..chunks[chunk] {
                for idx in indices.iter_mut() {
                    *idx = rng.gen_range(0..n);
                }
                draws.push(statistic(&indices));
            }
            draws
        });

        let draws: Vec<f64> = chunk_draws.into_iter().flatten().collect();
        let distribution = BootstrapDistribution::from_draws(draws, self.n_resamples)?;
        if distribution.n_valid() < self.n_resamples {
            debug!(
                "Dropped {} non-finite bootstrap draws",
                self.n_resamples - distribution.n_valid()
            );
        }
        Ok(distribution)
    }

    /// Percentile interval for `statistic`, reported against `estimate`
    pub fn percentile_interval<F>(
        &self,
        n: usize,
        estimate: f64,
        statistic: F,
    ) -> Result<IntervalResult>
    where
        F: Fn(&[usize]) -> f64 + Sync + Send,
    {
        let distribution = self.distribution(n, statistic)?;
        let (lower, upper) = distribution.percentile_bounds(self.confidence_level)?;
        let n_valid = distribution.n_valid();
        let n_resamples = distribution.n_resamples();

        let mut result = IntervalResult::new(
            IntervalMethod::Bootstrap,
            ConfidenceInterval::new(lower, upper, estimate, self.confidence_level),
            Diagnostics::Bootstrap {
                n_resamples,
                n_valid,
                bootstrap_mean: distribution.mean(),
                bootstrap_se: distribution.standard_error(),
                draws: distribution.draws,
            },
        );
        if n_valid < n_resamples {
            result = result.with_advisory(format!(
                "{} of {n_resamples} bootstrap resamples produced no finite statistic",
                n_resamples - n_valid
            ));
        }
        Ok(result)
    }
}
