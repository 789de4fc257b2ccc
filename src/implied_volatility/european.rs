//! European-equivalent implied volatility.
//!
//! An American premium is first inverted on the lattice, the resulting vol
//! is repriced without early exercise, and that European price is inverted
//! through the closed form with Newton-Raphson seeded at the American vol.

use super::lattice_solver::{BisectionConfig, solve_lattice_iv};
use crate::error::{CalibError, Result};
use crate::pricing::{BinomialLattice, BlackScholes};
use crate::types::{ExerciseStyle, MarketEnvironment, OptionSpec, OptionType};
use crate::utils::{validate_non_negative, validate_positive};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the Newton-Raphson solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    /// Maximum iterations before giving up (default: 250).
    pub max_iterations: u32,
    /// Absolute price tolerance (default: 1e-6).
    pub tolerance: f64,
    /// Minimum vol bound (default: 0.001).
    pub min_vol: f64,
    /// Maximum vol bound (default: 10.0).
    pub max_vol: f64,
    /// Vega below which the derivative is treated as degenerate.
    pub min_vega: f64,
    /// Largest vol move per iteration.
    pub max_step: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 250,
            tolerance: 1e-6,
            min_vol: 0.001,
            max_vol: 10.0,
            min_vega: 1e-10,
            max_step: 0.5,
        }
    }
}

impl NewtonConfig {
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

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the vol bounds.
    #[must_use]
    pub fn with_bounds(mut self, min_vol: f64, max_vol: f64) -> Self {
        self.min_vol = min_vol;
        self.max_vol = max_vol;
        self
    }

    fn validate(&self) -> Result<()> {
        validate_positive(self.min_vol, "min_vol")?;
        validate_positive(self.tolerance, "tolerance")?;
        validate_positive(self.max_step, "max_step")?;
        validate_non_negative(self.min_vega, "min_vega")?;
        if !self.max_vol.is_finite() || self.max_vol <= self.min_vol {
            return Err(CalibError::invalid(format!(
                "volatility bounds [{}, {}] are empty",
                self.min_vol, self.max_vol
            )));
        }
        Ok(())
    }
}

/// European-equivalent implied volatility and the intermediate values that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EuropeanIV {
    /// Closed-form implied volatility.
    pub vol: f64,
    /// Lattice (American) implied volatility used as the seed.
    pub american_vol: f64,
    /// Lattice price of the contract at `american_vol` without early exercise.
    pub european_price: f64,
    /// Newton-Raphson iterations.
    pub iterations: u32,
}

impl EuropeanIV {
    /// European minus American vol, in basis points.
    #[must_use]
    pub fn spread_bps(&self) -> f64 {
        (self.vol - self.american_vol) * 10_000.0
    }
}

/// Inverts the closed form against `target_price` by Newton-Raphson.
///
/// σ_{n+1} = σ_n - (BS(σ_n) - target) / vega(σ_n), with each step capped at
/// `config.max_step` and the iterate kept within the configured bounds.
///
/// # Returns
/// `(vol, iterations)` on convergence.
///
/// # Errors
/// - [`CalibError::ConvergenceFailure`] when the iteration cap is hit.
/// - [`CalibError::NumericalDomain`] when vega vanishes or turns non-finite.
pub fn solve_black_scholes_iv(
    spec: &OptionSpec,
    env: &MarketEnvironment,
    target_price: f64,
    initial_guess: f64,
    config: &NewtonConfig,
) -> Result<(f64, u32)> {
    spec.validate()?;
    env.validate()?;
    config.validate()?;
    validate_positive(target_price, "target price")?;
    validate_positive(initial_guess, "initial guess")?;

    let mut vol = initial_guess.clamp(config.min_vol, config.max_vol);

    for iteration in 0..config.max_iterations {
        let diff = BlackScholes::price(spec, env, vol) - target_price;
        if diff.abs() < config.tolerance {
            return Ok((vol, iteration + 1));
        }

        let vega = BlackScholes::vega(spec, env, vol);
        if !vega.is_finite() || vega < config.min_vega {
            return Err(CalibError::domain(
                "newton-raphson",
                format!(
                    "vega {vega:e} at vol {vol} for {} strike {}",
                    spec.option_type, spec.strike
                ),
            ));
        }

        let step = (diff / vega).clamp(-config.max_step, config.max_step);
        vol = (vol - step).clamp(config.min_vol, config.max_vol);
    }

    Err(CalibError::ConvergenceFailure {
        solver: "newton-raphson",
        option_type: spec.option_type,
        strike: spec.strike,
        iterations: config.max_iterations,
        last_vol: vol,
    })
}

/// European-equivalent implied volatility of an American premium.
///
/// # Errors
/// Propagates failures from the lattice inversion and from Newton-Raphson.
pub fn solve_european_iv(
    spec: &OptionSpec,
    env: &MarketEnvironment,
    american_price: f64,
    bisection: &BisectionConfig,
    newton: &NewtonConfig,
) -> Result<EuropeanIV> {
    newton.validate()?;
    let american = solve_lattice_iv(spec, env, american_price, ExerciseStyle::American, bisection)?;
    let european_price = BinomialLattice::price(
        spec,
        env,
        american.vol,
        ExerciseStyle::European,
        &bisection.lattice,
    )?;
    let (vol, iterations) = solve_black_scholes_iv(spec, env, european_price, american.vol, newton)?;

    debug!(
        option_type = %spec.option_type,
        strike = spec.strike,
        american_vol = american.vol,
        european_price,
        vol,
        iterations,
        "european implied vol"
    );

    Ok(EuropeanIV {
        vol,
        american_vol: american.vol,
        european_price,
        iterations,
    })
}

/// European-equivalent implied volatility from raw inputs, with default
/// settings.
///
/// # Errors
/// See [`solve_european_iv`].
pub fn european_implied_vol(
    expiry: f64,
    spot: f64,
    rate: f64,
    dividend_yield: f64,
    strike: f64,
    option_type: OptionType,
    american_price: f64,
) -> Result<f64> {
    let spec = OptionSpec::new(option_type, strike, expiry)?;
    let env = MarketEnvironment::new(spot, rate, dividend_yield)?;
    solve_european_iv(
        &spec,
        &env,
        american_price,
        &BisectionConfig::default(),
        &NewtonConfig::default(),
    )
    .map(|iv| iv.vol)
}
