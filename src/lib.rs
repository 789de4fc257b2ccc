//! # deamerican-rs
//!
//! Implied forward and dividend yield calibration for American-style option
//! expiries.
//!
//! Listed equity options are usually American, so their premiums carry an
//! early-exercise premium and do not satisfy put-call parity. This crate
//! strips that premium out with a Cox-Ross-Rubinstein binomial lattice:
//!
//! - [`pricing`]: the lattice pricer (American and European exercise) and
//!   the Black-Scholes closed form with continuous dividend yield.
//! - [`implied_volatility`]: bisection on the lattice for American implied
//!   vols, Newton-Raphson on the closed form for European-equivalent vols.
//! - [`calibration`]: the fixed-point loop recovering the implied forward
//!   and dividend yield of one expiry, and rayon-parallel batch drivers.
//!
//! ## Example
//!
//! ```no_run
//! use deamerican_rs::prelude::*;
//!
//! let env = MarketEnvironment::new(177.83, 0.05482, 0.0001)?;
//! let calibration = ForwardDividendCalibrator::new(
//!     env,
//!     185.0,
//!     127.0 / 365.0,
//!     7.625,
//!     11.975,
//!     CalibrationConfig::default(),
//! )?
//! .calibrate()?;
//!
//! println!(
//!     "forward {:.4}, dividend yield {:.4}%",
//!     calibration.forward,
//!     calibration.dividend_yield_percent()
//! );
//! # Ok::<(), deamerican_rs::CalibError>(())
//! ```
//!
//! ## Logging
//!
//! Every solver emits `tracing` events; calibration runs are wrapped in a
//! `calibrate_forward` span carrying a `run_id`. Install any subscriber to
//! see them.

pub mod calibration;
pub mod error;
pub mod implied_volatility;
pub mod pricing;
pub mod types;
mod utils;

pub use calibration::{
    CalibrationConfig, ForwardCalibration, ForwardDividendCalibrator, calibrate_forward,
};
pub use error::{CalibError, Result};
pub use implied_volatility::{european_implied_vol, implied_vol};
pub use pricing::{black_scholes_price, lattice_price};
pub use types::{ExerciseStyle, MarketEnvironment, MarketQuote, OptionSpec, OptionType};

/// Commonly used types and functions.
pub mod prelude {
    pub use crate::calibration::{
        CalibrationConfig, DividendYieldUpdate, ForwardCalibration, ForwardDividendCalibrator,
        ForwardRequest, StrikeVol, calibrate_expiries, calibrate_forward, european_vol_smile,
    };
    pub use crate::error::{CalibError, Result};
    pub use crate::implied_volatility::{
        BisectionConfig, EuropeanIV, LatticeIV, NewtonConfig, european_implied_vol, implied_vol,
        solve_european_iv, solve_lattice_iv,
    };
    pub use crate::pricing::{
        BinomialLattice, BlackScholes, LatticeConfig, black_scholes_price, lattice_price,
    };
    pub use crate::types::{
        ExerciseStyle, MarketEnvironment, MarketQuote, OptionSpec, OptionType,
    };
}
