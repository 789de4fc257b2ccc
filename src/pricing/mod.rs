//! Option pricers: the binomial lattice used to value American contracts and
//! the closed form used once European-equivalent prices are known.

mod black_scholes;
mod lattice;

pub use black_scholes::{BlackScholes, black_scholes_price};
pub use lattice::{BinomialLattice, DEFAULT_STEPS, LatticeConfig, LatticeGrid, lattice_price};
