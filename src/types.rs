//! Contract, quote and market types shared by the pricers and solvers.

use crate::error::{CalibError, Result};
use crate::utils::{validate_finite, validate_non_negative, validate_positive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Option flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option (right to buy the underlying at strike price).
    Call,
    /// Put option (right to sell the underlying at strike price).
    Put,
}

impl OptionType {
    /// Payoff sign φ: +1 for calls, -1 for puts.
    ///
    /// Every payoff in the crate is written as `max(φ·(S - K), 0)` and the
    /// closed form as `φ·(S·e^{-qT}·N(φ·d1) - K·e^{-rT}·N(φ·d2))`.
    #[must_use]
    pub fn payoff_sign(self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Immediate-exercise payoff at the given spot.
    #[inline]
    #[must_use]
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        (self.payoff_sign() * (spot - strike)).max(0.0)
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

impl FromStr for OptionType {
    type Err = CalibError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(OptionType::Call),
            "put" => Ok(OptionType::Put),
            other => Err(CalibError::invalid(format!(
                "unrecognized option flavor '{other}'"
            ))),
        }
    }
}

/// Exercise rule applied during backward valuation on the lattice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseStyle {
    /// Exercisable at any lattice node.
    #[default]
    American,
    /// Exercisable only at expiry.
    European,
}

impl ExerciseStyle {
    /// Maps the lattice `early_exercise` flag onto a style.
    #[must_use]
    pub fn from_early_exercise(early_exercise: bool) -> Self {
        if early_exercise {
            ExerciseStyle::American
        } else {
            ExerciseStyle::European
        }
    }

    /// Returns true when nodes compare continuation against intrinsic value.
    #[must_use]
    pub fn allows_early_exercise(self) -> bool {
        matches!(self, ExerciseStyle::American)
    }
}

/// An option contract: flavor, strike and time to expiry in years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Call or Put.
    pub option_type: OptionType,
    /// Strike price `K`.
    pub strike: f64,
    /// Time to expiry `T` as a year fraction.
    pub expiry: f64,
}

impl OptionSpec {
    /// Creates a validated contract.
    ///
    /// # Errors
    /// Returns [`CalibError::InvalidInput`] if strike or expiry is not
    /// strictly positive and finite.
    pub fn new(option_type: OptionType, strike: f64, expiry: f64) -> Result<Self> {
        validate_positive(strike, "strike")?;
        validate_positive(expiry, "expiry")?;
        Ok(Self {
            option_type,
            strike,
            expiry,
        })
    }

    /// Creates a validated call.
    pub fn call(strike: f64, expiry: f64) -> Result<Self> {
        Self::new(OptionType::Call, strike, expiry)
    }

    /// Creates a validated put.
    pub fn put(strike: f64, expiry: f64) -> Result<Self> {
        Self::new(OptionType::Put, strike, expiry)
    }

    /// Same strike and expiry, opposite flavor.
    #[must_use]
    pub fn counterpart(&self) -> Self {
        let option_type = match self.option_type {
            OptionType::Call => OptionType::Put,
            OptionType::Put => OptionType::Call,
        };
        Self {
            option_type,
            ..*self
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_positive(self.strike, "strike")?;
        validate_positive(self.expiry, "expiry")?;
        Ok(())
    }
}

/// An observed premium for a listed contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    /// The quoted contract.
    pub spec: OptionSpec,
    /// Observed premium in price units.
    pub premium: f64,
}

impl MarketQuote {
    /// Creates a validated quote.
    ///
    /// # Errors
    /// Returns [`CalibError::InvalidInput`] for a negative or non-finite
    /// premium, or an invalid contract.
    pub fn new(spec: OptionSpec, premium: f64) -> Result<Self> {
        spec.validate()?;
        validate_non_negative(premium, "premium")?;
        Ok(Self { spec, premium })
    }
}

/// Risk-neutral pricing context: spot, risk-free rate and dividend yield.
///
/// The dividend yield is the quantity being solved for during calibration.
/// The calibrator never mutates an environment in place; each iteration
/// derives a new one via [`MarketEnvironment::with_dividend_yield`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketEnvironment {
    /// Underlying spot price `S0`.
    pub spot: f64,
    /// Continuously compounded risk-free rate `r`.
    pub rate: f64,
    /// Continuous dividend yield `q`.
    pub dividend_yield: f64,
}

impl MarketEnvironment {
    /// Creates a validated environment.
    ///
    /// # Errors
    /// Returns [`CalibError::InvalidInput`] if spot is not strictly positive
    /// or rate/dividend yield are not finite.
    pub fn new(spot: f64, rate: f64, dividend_yield: f64) -> Result<Self> {
        validate_positive(spot, "spot")?;
        validate_finite(rate, "rate")?;
        validate_finite(dividend_yield, "dividend yield")?;
        Ok(Self {
            spot,
            rate,
            dividend_yield,
        })
    }

    /// Copy of this environment with a different dividend yield.
    #[must_use]
    pub fn with_dividend_yield(&self, dividend_yield: f64) -> Self {
        Self {
            dividend_yield,
            ..*self
        }
    }

    /// Model forward `S0·e^{(r-q)T}`.
    #[must_use]
    pub fn forward(&self, expiry: f64) -> f64 {
        self.spot * ((self.rate - self.dividend_yield) * expiry).exp()
    }

    /// Discount factor `e^{-rT}`.
    #[must_use]
    pub fn discount(&self, expiry: f64) -> f64 {
        (-self.rate * expiry).exp()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_positive(self.spot, "spot")?;
        validate_finite(self.rate, "rate")?;
        validate_finite(self.dividend_yield, "dividend yield")?;
        Ok(())
    }
}
