//! Cox-Ross-Rubinstein binomial lattice with optional early exercise.
//!
//! The lattice is rebuilt for every pricing call. Spot values live in a
//! triangular grid (layer `i` holds `i + 1` nodes, node `j` being the number
//! of up moves), and backward valuation overwrites a single value buffer of
//! `steps + 1` slots one layer at a time.

use crate::error::{CalibError, Result};
use crate::types::{ExerciseStyle, MarketEnvironment, OptionSpec, OptionType};
use crate::utils::validate_positive;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Default number of time steps.
pub const DEFAULT_STEPS: usize = 750;

/// Lattice resolution.
///
/// Accuracy improves with `steps` at O(steps²) cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    /// Number of time steps between valuation date and expiry.
    pub steps: usize,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
        }
    }
}

impl LatticeConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of time steps.
    #[must_use]
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }
}

/// Recombining spot grid and valuation buffer for a single pricing call.
#[derive(Debug)]
pub struct LatticeGrid {
    steps: usize,
    /// Flattened triangle; layer `i` starts at `i * (i + 1) / 2`.
    spots: Vec<f64>,
    /// Option values of the layer currently being rolled back.
    values: Vec<f64>,
    up: f64,
    up_probability: f64,
    step_discount: f64,
}

impl LatticeGrid {
    /// Builds the spot grid for the given contract, market and volatility.
    ///
    /// # Errors
    /// - [`CalibError::InvalidInput`] if `steps` is zero or any input is out
    ///   of range.
    /// - [`CalibError::NumericalDomain`] if the risk-neutral up-probability
    ///   falls outside `[0, 1]`, which happens when the volatility is too
    ///   small to span the carry over one step.
    pub fn build(
        spec: &OptionSpec,
        env: &MarketEnvironment,
        vol: f64,
        steps: usize,
    ) -> Result<Self> {
        spec.validate()?;
        env.validate()?;
        validate_positive(vol, "volatility")?;
        if steps == 0 {
            return Err(CalibError::invalid("lattice steps must be at least 1"));
        }

        let dt = spec.expiry / steps as f64;
        let up = (vol * dt.sqrt()).exp();
        let down = 1.0 / up;
        let growth = ((env.rate - env.dividend_yield) * dt).exp();
        let up_probability = (growth - down) / (up - down);
        if !up_probability.is_finite() || !(0.0..=1.0).contains(&up_probability) {
            return Err(CalibError::domain(
                "risk-neutral probability",
                format!(
                    "p = {up_probability} outside [0, 1] for vol {vol}, dt {dt}, carry {}",
                    env.rate - env.dividend_yield
                ),
            ));
        }

        // spot * d^i * (u/d)^j by multiplicative recurrence.
        let ratio = up / down;
        let mut spots = Vec::with_capacity((steps + 1) * (steps + 2) / 2);
        let mut base = env.spot;
        for layer in 0..=steps {
            let mut s = base;
            for _ in 0..=layer {
                spots.push(s);
                s *= ratio;
            }
            base *= down;
        }

        trace!(
            steps,
            up,
            up_probability,
            strike = spec.strike,
            "built lattice grid"
        );

        Ok(Self {
            steps,
            spots,
            values: vec![0.0; steps + 1],
            up,
            up_probability,
            step_discount: (-env.rate * dt).exp(),
        })
    }

    /// Number of time steps.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Up factor `u`; the down factor is `1/u`.
    #[must_use]
    pub fn up_factor(&self) -> f64 {
        self.up
    }

    /// Risk-neutral probability of an up move.
    #[must_use]
    pub fn up_probability(&self) -> f64 {
        self.up_probability
    }

    /// Spot values of one time layer, ordered by number of up moves.
    /// `None` past the terminal layer.
    #[must_use]
    pub fn layer(&self, layer: usize) -> Option<&[f64]> {
        let width = layer.checked_add(1)?;
        let start = layer.checked_mul(width)? / 2;
        self.spots.get(start..start.checked_add(width)?)
    }

    /// Rolls the option back through the grid and returns the root value.
    ///
    /// The value buffer is reset on every call, so one grid can value
    /// several payoffs on the same spot tree.
    pub fn value(&mut self, option_type: OptionType, strike: f64, style: ExerciseStyle) -> f64 {
        let steps = self.steps;
        let disc_p = self.step_discount * self.up_probability;
        let disc_1mp = self.step_discount * (1.0 - self.up_probability);
        let early = style.allows_early_exercise();

        let terminal_start = steps * (steps + 1) / 2;
        for (value, &spot) in self
            .values
            .iter_mut()
            .zip(&self.spots[terminal_start..terminal_start + steps + 1])
        {
            *value = option_type.intrinsic(spot, strike);
        }

        for layer in (0..steps).rev() {
            let start = layer * (layer + 1) / 2;
            for node in 0..=layer {
                let continuation =
                    disc_p.mul_add(self.values[node + 1], disc_1mp * self.values[node]);
                self.values[node] = if early {
                    continuation.max(option_type.intrinsic(self.spots[start + node], strike))
                } else {
                    continuation
                };
            }
        }

        self.values[0]
    }
}

/// Binomial lattice pricer.
pub struct BinomialLattice;

impl BinomialLattice {
    /// Prices a contract on a freshly built lattice.
    ///
    /// # Errors
    /// See [`LatticeGrid::build`].
    pub fn price(
        spec: &OptionSpec,
        env: &MarketEnvironment,
        vol: f64,
        style: ExerciseStyle,
        config: &LatticeConfig,
    ) -> Result<f64> {
        let mut grid = LatticeGrid::build(spec, env, vol, config.steps)?;
        Ok(grid.value(spec.option_type, spec.strike, style))
    }

    /// Early-exercise premium: American minus European value on one grid.
    pub fn early_exercise_premium(
        spec: &OptionSpec,
        env: &MarketEnvironment,
        vol: f64,
        config: &LatticeConfig,
    ) -> Result<f64> {
        let mut grid = LatticeGrid::build(spec, env, vol, config.steps)?;
        let american = grid.value(spec.option_type, spec.strike, ExerciseStyle::American);
        let european = grid.value(spec.option_type, spec.strike, ExerciseStyle::European);
        Ok(american - european)
    }
}

/// Prices an option on a binomial lattice from raw inputs.
///
/// `early_exercise = true` values the American contract, `false` the
/// European one.
#[allow(clippy::too_many_arguments)]
pub fn lattice_price(
    option_type: OptionType,
    strike: f64,
    expiry: f64,
    spot: f64,
    rate: f64,
    vol: f64,
    dividend_yield: f64,
    early_exercise: bool,
    steps: usize,
) -> Result<f64> {
    let spec = OptionSpec::new(option_type, strike, expiry)?;
    let env = MarketEnvironment::new(spot, rate, dividend_yield)?;
    BinomialLattice::price(
        &spec,
        &env,
        vol,
        ExerciseStyle::from_early_exercise(early_exercise),
        &LatticeConfig::new().with_steps(steps),
    )
}
