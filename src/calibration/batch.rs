//! Parallel extraction across independent strikes and expiries.
//!
//! Strikes of one expiry and separate expiries share no mutable state, so
//! each item runs as its own rayon task with its own copy of the market
//! environment. Every item carries its own `Result`; a failed strike or
//! expiry never aborts the rest of the batch.

use super::forward::{CalibrationConfig, ForwardCalibration, ForwardDividendCalibrator};
use crate::error::Result;
use crate::implied_volatility::{BisectionConfig, EuropeanIV, NewtonConfig, solve_european_iv};
use crate::types::{MarketEnvironment, MarketQuote};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// European-equivalent vol for one quote of a smile.
#[derive(Debug, Clone)]
pub struct StrikeVol {
    /// The quote the vol was extracted from.
    pub quote: MarketQuote,
    /// Extracted vol or the error for this quote alone.
    pub result: Result<EuropeanIV>,
}

/// Extracts European-equivalent vols for every quote, in input order.
///
/// `env` should carry the calibrated dividend yield, see
/// [`ForwardCalibration::environment`].
pub fn european_vol_smile(
    env: &MarketEnvironment,
    quotes: &[MarketQuote],
    bisection: &BisectionConfig,
    newton: &NewtonConfig,
) -> Vec<StrikeVol> {
    let smile: Vec<StrikeVol> = quotes
        .par_iter()
        .map(|quote| {
            let env = *env;
            StrikeVol {
                quote: *quote,
                result: solve_european_iv(&quote.spec, &env, quote.premium, bisection, newton),
            }
        })
        .collect();

    let failed = smile.iter().filter(|s| s.result.is_err()).count();
    if failed > 0 {
        warn!(failed, total = smile.len(), "european vol smile has failed strikes");
    }
    smile
}

/// Inputs for calibrating one expiry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardRequest {
    /// Market at valuation; `dividend_yield` is the initial guess.
    pub env: MarketEnvironment,
    /// Expiry in years.
    pub expiry: f64,
    /// Anchor strike.
    pub strike: f64,
    /// American call premium at the anchor strike.
    pub call_price: f64,
    /// American put premium at the anchor strike.
    pub put_price: f64,
}

impl ForwardRequest {
    /// Runs the calibration for this request.
    ///
    /// # Errors
    /// See [`ForwardDividendCalibrator::calibrate`].
    pub fn calibrate(&self, config: &CalibrationConfig) -> Result<ForwardCalibration> {
        ForwardDividendCalibrator::new(
            self.env,
            self.strike,
            self.expiry,
            self.call_price,
            self.put_price,
            *config,
        )?
        .calibrate()
    }
}

/// Calibrates independent expiries in parallel, returning one result per
/// request in input order.
pub fn calibrate_expiries(
    requests: &[ForwardRequest],
    config: &CalibrationConfig,
) -> Vec<Result<ForwardCalibration>> {
    let results: Vec<Result<ForwardCalibration>> = requests
        .par_iter()
        .map(|request| request.calibrate(config))
        .collect();

    let converged = results.iter().filter(|r| r.is_ok()).count();
    info!(converged, total = results.len(), "expiry calibrations finished");
    results
}
