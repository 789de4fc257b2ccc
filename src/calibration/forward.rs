//! Fixed-point calibration of the implied forward and dividend yield.
//!
//! American premiums do not satisfy put-call parity, so the forward is found
//! by alternating two steps until the forward stops moving:
//!
//! 1. invert the call and put premiums on the lattice at the current
//!    dividend yield;
//! 2. reprice both at their implied vols without early exercise and apply
//!    European parity, `F = e^{rT}(C_eur - P_eur) + K`, then map the forward
//!    back to a dividend yield, `q = ln(S0/F)/T + r`.

use crate::error::{CalibError, Result};
use crate::implied_volatility::{BisectionConfig, solve_lattice_iv};
use crate::pricing::BinomialLattice;
use crate::types::{ExerciseStyle, MarketEnvironment, OptionSpec};
use crate::utils::validate_positive;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// How the dividend yield is derived from a forward estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DividendYieldUpdate {
    /// `q = ln(S0/F)/T + r` on every step, including the first.
    #[default]
    Consistent,
    /// First step uses `q = ln(S0/F)/T` with no rate term; later steps and
    /// the reported yield use the consistent formula. Converges to the same
    /// forward but needs more iterations.
    InitialOmitsRate,
}

/// Configuration for the forward/dividend fixed-point loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Forward change below which the loop stops (default: 1e-3).
    pub tolerance: f64,
    /// Maximum fixed-point iterations (default: 750).
    pub max_iterations: u32,
    /// Dividend yield update rule.
    pub dividend_update: DividendYieldUpdate,
    /// Settings for the per-step implied vol solves.
    pub bisection: BisectionConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_iterations: 750,
            dividend_update: DividendYieldUpdate::default(),
            bisection: BisectionConfig::default(),
        }
    }
}

impl CalibrationConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`CalibError::InvalidInput`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CalibError::invalid(format!("calibration config: {e}")))
    }

    /// Sets the forward convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum number of fixed-point iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the dividend yield update rule.
    #[must_use]
    pub fn with_dividend_update(mut self, dividend_update: DividendYieldUpdate) -> Self {
        self.dividend_update = dividend_update;
        self
    }

    /// Sets the implied vol solver settings.
    #[must_use]
    pub fn with_bisection(mut self, bisection: BisectionConfig) -> Self {
        self.bisection = bisection;
        self
    }

    /// Sets the lattice resolution used by every pricing call.
    #[must_use]
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.bisection.lattice.steps = steps;
        self
    }
}

/// Loop state after one accepted iteration. Iteration 0 is the initial step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    /// Iteration number.
    pub iteration: u32,
    /// Forward estimate.
    pub forward: f64,
    /// Dividend yield derived from `forward`.
    pub dividend_yield: f64,
}

/// Output of a single parity step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParityStep {
    /// American implied vol of the call.
    pub call_vol: f64,
    /// American implied vol of the put.
    pub put_vol: f64,
    /// Call repriced at `call_vol` without early exercise.
    pub call_european: f64,
    /// Put repriced at `put_vol` without early exercise.
    pub put_european: f64,
    /// Parity forward `e^{rT}(C_eur - P_eur) + K`.
    pub forward: f64,
}

/// Converged forward calibration for one expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardCalibration {
    /// Identifier shared with every log event of the run.
    pub run_id: Uuid,
    /// Spot used for the run.
    pub spot: f64,
    /// Risk-free rate used for the run.
    pub rate: f64,
    /// Expiry in years.
    pub expiry: f64,
    /// Anchor strike.
    pub strike: f64,
    /// Converged forward.
    pub forward: f64,
    /// Implied dividend yield `ln(S0/F)/T + r`.
    pub dividend_yield: f64,
    /// Fixed-point iterations after the initial step.
    pub iterations: u32,
    /// Call implied vol at the last step.
    pub call_vol: f64,
    /// Put implied vol at the last step.
    pub put_vol: f64,
    /// Every accepted state, initial step first.
    pub history: Vec<CalibrationState>,
}

impl ForwardCalibration {
    /// Present value of dividends implied by the forward: `S0 - F·e^{-rT}`.
    #[must_use]
    pub fn cash_dividend(&self) -> f64 {
        self.spot - self.forward * (-self.rate * self.expiry).exp()
    }

    /// Pricing environment carrying the calibrated dividend yield.
    #[must_use]
    pub fn environment(&self) -> MarketEnvironment {
        MarketEnvironment {
            spot: self.spot,
            rate: self.rate,
            dividend_yield: self.dividend_yield,
        }
    }

    /// Dividend yield in percent.
    #[must_use]
    pub fn dividend_yield_percent(&self) -> f64 {
        self.dividend_yield * 100.0
    }
}

/// Dividend yield implied by a forward: `ln(S0/F)/T + rate_term`.
///
/// # Errors
/// Returns [`CalibError::NumericalDomain`] if the forward is not strictly
/// positive and finite.
pub fn dividend_yield_from_forward(
    spot: f64,
    forward: f64,
    expiry: f64,
    rate_term: f64,
) -> Result<f64> {
    if !forward.is_finite() || forward <= 0.0 {
        return Err(CalibError::domain(
            "dividend yield from forward",
            format!("forward {forward} is not positive"),
        ));
    }
    Ok((spot / forward).ln() / expiry + rate_term)
}

/// Drives the fixed-point loop for one expiry and one anchor strike.
#[derive(Debug, Clone)]
pub struct ForwardDividendCalibrator {
    run_id: Uuid,
    env: MarketEnvironment,
    call: OptionSpec,
    put: OptionSpec,
    call_price: f64,
    put_price: f64,
    config: CalibrationConfig,
}

impl ForwardDividendCalibrator {
    /// Creates a calibrator. `env.dividend_yield` is the initial guess.
    ///
    /// # Errors
    /// Returns [`CalibError::InvalidInput`] for invalid market data, strike,
    /// expiry or premiums.
    pub fn new(
        env: MarketEnvironment,
        strike: f64,
        expiry: f64,
        call_price: f64,
        put_price: f64,
        config: CalibrationConfig,
    ) -> Result<Self> {
        env.validate()?;
        let call = OptionSpec::call(strike, expiry)?;
        validate_positive(call_price, "call price")?;
        validate_positive(put_price, "put price")?;
        validate_positive(config.tolerance, "calibration tolerance")?;

        Ok(Self {
            run_id: Uuid::new_v4(),
            env,
            call,
            put: call.counterpart(),
            call_price,
            put_price,
            config,
        })
    }

    /// Identifier of this run.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Implied vols, European repricing and parity forward at `dividend_yield`.
    ///
    /// # Errors
    /// Propagates implied vol and lattice failures.
    pub fn parity_step(&self, dividend_yield: f64) -> Result<ParityStep> {
        let env = self.env.with_dividend_yield(dividend_yield);
        let bisection = &self.config.bisection;

        let call_vol = solve_lattice_iv(
            &self.call,
            &env,
            self.call_price,
            ExerciseStyle::American,
            bisection,
        )?
        .vol;
        let put_vol = solve_lattice_iv(
            &self.put,
            &env,
            self.put_price,
            ExerciseStyle::American,
            bisection,
        )?
        .vol;

        let call_european = BinomialLattice::price(
            &self.call,
            &env,
            call_vol,
            ExerciseStyle::European,
            &bisection.lattice,
        )?;
        let put_european = BinomialLattice::price(
            &self.put,
            &env,
            put_vol,
            ExerciseStyle::European,
            &bisection.lattice,
        )?;

        let forward =
            (env.rate * self.call.expiry).exp() * (call_european - put_european) + self.call.strike;

        Ok(ParityStep {
            call_vol,
            put_vol,
            call_european,
            put_european,
            forward,
        })
    }

    fn initial_dividend_yield(&self, forward: f64) -> Result<f64> {
        let rate_term = match self.config.dividend_update {
            DividendYieldUpdate::Consistent => self.env.rate,
            DividendYieldUpdate::InitialOmitsRate => 0.0,
        };
        dividend_yield_from_forward(self.env.spot, forward, self.call.expiry, rate_term)
    }

    /// Runs the loop to convergence.
    ///
    /// # Errors
    /// - [`CalibError::CalibrationFailure`] when `max_iterations` pass
    ///   without the forward settling.
    /// - [`CalibError::NumericalDomain`] for a non-positive forward.
    /// - Any error from the per-step implied vol solves.
    pub fn calibrate(&self) -> Result<ForwardCalibration> {
        let span = info_span!(
            "calibrate_forward",
            run_id = %self.run_id,
            strike = self.call.strike,
            expiry = self.call.expiry
        );
        let _enter = span.enter();

        let spot = self.env.spot;
        let rate = self.env.rate;
        let expiry = self.call.expiry;

        if self.config.dividend_update == DividendYieldUpdate::InitialOmitsRate {
            warn!("initial dividend yield update omits the rate term");
        }

        let first = self.parity_step(self.env.dividend_yield)?;
        let mut state = CalibrationState {
            iteration: 0,
            forward: first.forward,
            dividend_yield: self.initial_dividend_yield(first.forward)?,
        };
        let mut history = vec![state];
        debug!(
            iteration = 0,
            forward = state.forward,
            dividend_yield = state.dividend_yield,
            call_vol = first.call_vol,
            put_vol = first.put_vol,
            "initial parity forward"
        );

        for iteration in 1..=self.config.max_iterations {
            let step = self.parity_step(state.dividend_yield)?;
            let dividend_yield = dividend_yield_from_forward(spot, step.forward, expiry, rate)?;
            let delta = (step.forward - state.forward).abs();
            state = CalibrationState {
                iteration,
                forward: step.forward,
                dividend_yield,
            };
            history.push(state);

            debug!(
                iteration,
                forward = step.forward,
                dividend_yield,
                call_vol = step.call_vol,
                put_vol = step.put_vol,
                delta,
                "calibration step"
            );

            if delta < self.config.tolerance {
                info!(
                    iterations = iteration,
                    forward = step.forward,
                    dividend_yield,
                    "forward calibration converged"
                );
                return Ok(ForwardCalibration {
                    run_id: self.run_id,
                    spot,
                    rate,
                    expiry,
                    strike: self.call.strike,
                    forward: step.forward,
                    dividend_yield,
                    iterations: iteration,
                    call_vol: step.call_vol,
                    put_vol: step.put_vol,
                    history,
                });
            }
        }

        error!(
            iterations = self.config.max_iterations,
            last_forward = state.forward,
            "forward calibration failed"
        );
        Err(CalibError::CalibrationFailure {
            run_id: self.run_id,
            strike: self.call.strike,
            iterations: self.config.max_iterations,
            last_forward: state.forward,
            last_dividend_yield: state.dividend_yield,
        })
    }
}

/// Calibrated forward from raw inputs, with default settings.
///
/// # Errors
/// See [`ForwardDividendCalibrator::calibrate`].
pub fn calibrate_forward(
    expiry: f64,
    spot: f64,
    rate: f64,
    initial_dividend_yield: f64,
    strike: f64,
    call_price: f64,
    put_price: f64,
) -> Result<f64> {
    let env = MarketEnvironment::new(spot, rate, initial_dividend_yield)?;
    ForwardDividendCalibrator::new(
        env,
        strike,
        expiry,
        call_price,
        put_price,
        CalibrationConfig::default(),
    )?
    .calibrate()
    .map(|calibration| calibration.forward)
}
