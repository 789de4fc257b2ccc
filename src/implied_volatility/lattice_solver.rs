//! Bisection solver inverting the binomial lattice.
//!
//! The lattice price is non-decreasing in volatility for both flavors and
//! both exercise styles, so bisection on a fixed bracket always narrows onto
//! the root when one exists inside it.

use crate::error::{CalibError, Result};
use crate::pricing::{BinomialLattice, LatticeConfig};
use crate::types::{ExerciseStyle, MarketEnvironment, OptionSpec, OptionType};
use crate::utils::validate_positive;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for the lattice bisection solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BisectionConfig {
    /// Lower end of the volatility bracket (default: 0.001).
    pub min_vol: f64,
    /// Upper end of the volatility bracket (default: 10.0).
    pub max_vol: f64,
    /// Bracket width below which the midpoint is accepted (default: 1e-5).
    pub tolerance: f64,
    /// Maximum bisection steps before giving up (default: 750).
    pub max_iterations: u32,
    /// Lattice used for every price evaluation.
    pub lattice: LatticeConfig,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        Self {
            min_vol: 0.001,
            max_vol: 10.0,
            tolerance: 1e-5,
            max_iterations: 750,
            lattice: LatticeConfig::default(),
        }
    }
}

impl BisectionConfig {
    /// Creates a new solver configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the bracket-width tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the volatility bracket.
    #[must_use]
    pub fn with_bounds(mut self, min_vol: f64, max_vol: f64) -> Self {
        self.min_vol = min_vol;
        self.max_vol = max_vol;
        self
    }

    /// Sets the lattice resolution.
    #[must_use]
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.lattice.steps = steps;
        self
    }

    fn validate(&self) -> Result<()> {
        validate_positive(self.min_vol, "min_vol")?;
        validate_positive(self.tolerance, "tolerance")?;
        if !self.max_vol.is_finite() || self.max_vol <= self.min_vol {
            return Err(CalibError::invalid(format!(
                "volatility bracket [{}, {}] is empty",
                self.min_vol, self.max_vol
            )));
        }
        Ok(())
    }
}

/// Implied volatility recovered from the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticeIV {
    /// Implied volatility.
    pub vol: f64,
    /// Number of price evaluations performed.
    pub iterations: u32,
}

/// Lowest arbitrage-free premium: immediate exercise value for American
/// contracts, discounted forward intrinsic for European ones.
fn price_floor(spec: &OptionSpec, env: &MarketEnvironment, style: ExerciseStyle) -> f64 {
    match style {
        ExerciseStyle::American => spec.option_type.intrinsic(env.spot, spec.strike),
        ExerciseStyle::European => {
            let carry_spot = env.spot * (-env.dividend_yield * spec.expiry).exp();
            let discounted_strike = spec.strike * env.discount(spec.expiry);
            (spec.option_type.payoff_sign() * (carry_spot - discounted_strike)).max(0.0)
        }
    }
}

/// Solves for the volatility at which the lattice reproduces `market_price`.
///
/// Each step prices the bracket midpoint and keeps the half that contains
/// the sign change. The midpoint is returned as soon as it prices exactly or
/// the bracket is narrower than `config.tolerance`.
///
/// # Errors
/// - [`CalibError::InvalidInput`] for invalid contract, market or
///   configuration, and for a price below the no-arbitrage floor.
/// - [`CalibError::ConvergenceFailure`] naming flavor and strike when
///   `config.max_iterations` is exhausted.
/// - Any lattice error raised while pricing a midpoint.
pub fn solve_lattice_iv(
    spec: &OptionSpec,
    env: &MarketEnvironment,
    market_price: f64,
    style: ExerciseStyle,
    config: &BisectionConfig,
) -> Result<LatticeIV> {
    spec.validate()?;
    env.validate()?;
    config.validate()?;
    validate_positive(market_price, "market price")?;

    let floor = price_floor(spec, env, style);
    if market_price < floor {
        return Err(CalibError::invalid(format!(
            "{} strike {} premium {market_price} is below its no-arbitrage floor {floor}",
            spec.option_type, spec.strike
        )));
    }

    let mut low = config.min_vol;
    let mut high = config.max_vol;

    for iteration in 0..config.max_iterations {
        let mid = 0.5 * (low + high);
        let diff = BinomialLattice::price(spec, env, mid, style, &config.lattice)? - market_price;

        if diff == 0.0 || (high - low) < config.tolerance {
            if mid - config.min_vol < config.tolerance || config.max_vol - mid < config.tolerance {
                warn!(
                    option_type = %spec.option_type,
                    strike = spec.strike,
                    vol = mid,
                    market_price,
                    "implied vol pinned to search bound"
                );
            }
            debug!(
                option_type = %spec.option_type,
                strike = spec.strike,
                dividend_yield = env.dividend_yield,
                vol = mid,
                iterations = iteration + 1,
                "lattice implied vol"
            );
            return Ok(LatticeIV {
                vol: mid,
                iterations: iteration + 1,
            });
        }

        if diff > 0.0 {
            high = mid;
        } else {
            low = mid;
        }
    }

    Err(CalibError::ConvergenceFailure {
        solver: "bisection",
        option_type: spec.option_type,
        strike: spec.strike,
        iterations: config.max_iterations,
        last_vol: 0.5 * (low + high),
    })
}

/// American implied volatility from raw inputs, with default settings.
///
/// # Errors
/// See [`solve_lattice_iv`].
pub fn implied_vol(
    spot: f64,
    rate: f64,
    expiry: f64,
    strike: f64,
    option_type: OptionType,
    dividend_yield: f64,
    market_price: f64,
) -> Result<f64> {
    let spec = OptionSpec::new(option_type, strike, expiry)?;
    let env = MarketEnvironment::new(spot, rate, dividend_yield)?;
    solve_lattice_iv(
        &spec,
        &env,
        market_price,
        ExerciseStyle::American,
        &BisectionConfig::default(),
    )
    .map(|iv| iv.vol)
}
