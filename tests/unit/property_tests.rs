//! Property-based tests using proptest.
//!
//! Lattices are kept small so each case stays cheap; the properties hold
//! at any resolution.

use deamerican_rs::prelude::*;
use proptest::prelude::*;

const STEPS: usize = 50;

fn lattice() -> LatticeConfig {
    LatticeConfig::new().with_steps(STEPS)
}

fn option_type() -> impl Strategy<Value = OptionType> {
    prop_oneof![Just(OptionType::Call), Just(OptionType::Put)]
}

fn style() -> impl Strategy<Value = ExerciseStyle> {
    prop_oneof![Just(ExerciseStyle::American), Just(ExerciseStyle::European)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Lattice price is non-decreasing in volatility for every flavor and
    /// exercise style.
    #[test]
    fn lattice_price_is_monotone_in_vol(
        option_type in option_type(),
        style in style(),
        strike in 80.0_f64..120.0,
        expiry in 0.1_f64..2.0,
        rate in 0.0_f64..0.08,
        dividend_yield in 0.0_f64..0.05,
        vol in 0.05_f64..1.0,
        bump in 0.01_f64..0.5,
    ) {
        let spec = OptionSpec::new(option_type, strike, expiry).unwrap();
        let env = MarketEnvironment::new(100.0, rate, dividend_yield).unwrap();

        let low = BinomialLattice::price(&spec, &env, vol, style, &lattice()).unwrap();
        let high = BinomialLattice::price(&spec, &env, vol + bump, style, &lattice()).unwrap();
        prop_assert!(
            high >= low - 1e-10,
            "{:?} {:?}: price fell from {} to {} when vol rose from {} to {}",
            option_type, style, low, high, vol, vol + bump
        );
    }

    /// American value dominates both the European value and intrinsic.
    #[test]
    fn american_dominates_european(
        option_type in option_type(),
        strike in 80.0_f64..120.0,
        expiry in 0.1_f64..2.0,
        rate in 0.0_f64..0.08,
        dividend_yield in 0.0_f64..0.05,
        vol in 0.05_f64..1.0,
    ) {
        let spec = OptionSpec::new(option_type, strike, expiry).unwrap();
        let env = MarketEnvironment::new(100.0, rate, dividend_yield).unwrap();

        let american =
            BinomialLattice::price(&spec, &env, vol, ExerciseStyle::American, &lattice()).unwrap();
        let european =
            BinomialLattice::price(&spec, &env, vol, ExerciseStyle::European, &lattice()).unwrap();
        prop_assert!(american >= european - 1e-10);
        prop_assert!(american >= option_type.intrinsic(100.0, strike) - 1e-10);
    }

    /// European lattice values satisfy put-call parity against the model
    /// forward.
    #[test]
    fn european_lattice_parity(
        strike in 80.0_f64..120.0,
        expiry in 0.1_f64..2.0,
        rate in -0.01_f64..0.08,
        dividend_yield in -0.01_f64..0.05,
        vol in 0.05_f64..1.0,
    ) {
        let call = OptionSpec::call(strike, expiry).unwrap();
        let env = MarketEnvironment::new(100.0, rate, dividend_yield).unwrap();

        let c = BinomialLattice::price(&call, &env, vol, ExerciseStyle::European, &lattice()).unwrap();
        let p = BinomialLattice::price(&call.counterpart(), &env, vol, ExerciseStyle::European, &lattice())
            .unwrap();
        let expected = env.discount(expiry) * (env.forward(expiry) - strike);
        prop_assert!((c - p - expected).abs() < 1e-8, "parity gap {}", c - p - expected);
    }

    /// Bisection recovers the volatility a European lattice price was
    /// generated with.
    #[test]
    fn european_round_trip(
        option_type in option_type(),
        strike in 85.0_f64..115.0,
        expiry in 0.25_f64..2.0,
        rate in 0.0_f64..0.08,
        dividend_yield in 0.0_f64..0.05,
        vol in 0.1_f64..0.8,
    ) {
        let spec = OptionSpec::new(option_type, strike, expiry).unwrap();
        let env = MarketEnvironment::new(100.0, rate, dividend_yield).unwrap();
        let config = BisectionConfig::new().with_steps(STEPS);

        let price =
            BinomialLattice::price(&spec, &env, vol, ExerciseStyle::European, &config.lattice).unwrap();
        let iv = solve_lattice_iv(&spec, &env, price, ExerciseStyle::European, &config).unwrap();
        prop_assert!((iv.vol - vol).abs() < 1e-4, "recovered {} for {}", iv.vol, vol);
    }
}
