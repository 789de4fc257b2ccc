//! Implied volatility extraction from American option premiums.
//!
//! Two solvers are provided:
//!
//! - **Bisection on the lattice** recovers the American implied volatility.
//!   The lattice has no analytic vega, but its price is monotone in
//!   volatility, so bisection on `[0.001, 10]` is always valid.
//! - **Newton-Raphson on the closed form** recovers the European-equivalent
//!   volatility once the American vol has been repriced without early
//!   exercise. Vega is analytic here, so convergence takes a handful of
//!   iterations from the American seed.
//!
//! # Example
//!
//! ```ignore
//! use deamerican_rs::implied_volatility::{implied_vol, european_implied_vol};
//! use deamerican_rs::OptionType;
//!
//! let american = implied_vol(100.0, 0.03, 1.0, 105.0, OptionType::Call, 0.01, 6.64)?;
//! let european = european_implied_vol(1.0, 100.0, 0.03, 0.01, 105.0, OptionType::Call, 6.64)?;
//! println!("American {:.2}%, European {:.2}%", american * 100.0, european * 100.0);
//! ```

mod european;
mod lattice_solver;

pub use european::{
    EuropeanIV, NewtonConfig, european_implied_vol, solve_black_scholes_iv, solve_european_iv,
};
pub use lattice_solver::{BisectionConfig, LatticeIV, implied_vol, solve_lattice_iv};
