use approx::assert_abs_diff_eq;
use deamerican_rs::prelude::*;

#[test]
fn test_lattice_converges_to_closed_form() {
    let lattice =
        lattice_price(OptionType::Call, 100.0, 1.0, 100.0, 0.03, 0.2, 0.01, false, 750).unwrap();
    let closed = black_scholes_price(OptionType::Call, 100.0, 1.0, 100.0, 0.03, 0.2, 0.01);

    assert_abs_diff_eq!(closed, 8.827321, epsilon = 1e-6);
    assert_abs_diff_eq!(lattice, closed, epsilon = 1e-2);
}

#[test]
fn test_put_early_exercise_scenario() {
    let american =
        lattice_price(OptionType::Put, 100.0, 1.0, 105.0, 0.03, 0.2, 0.01, true, 750).unwrap();
    let european =
        lattice_price(OptionType::Put, 100.0, 1.0, 105.0, 0.03, 0.2, 0.01, false, 750).unwrap();

    assert_abs_diff_eq!(american, 5.1462, epsilon = 1e-4);
    assert_abs_diff_eq!(european, 5.0191, epsilon = 1e-4);

    let spec = OptionSpec::put(100.0, 1.0).unwrap();
    let env = MarketEnvironment::new(105.0, 0.03, 0.01).unwrap();
    let premium =
        BinomialLattice::early_exercise_premium(&spec, &env, 0.2, &LatticeConfig::default())
            .unwrap();
    assert_abs_diff_eq!(premium, american - european, epsilon = 1e-12);
}

#[test]
fn test_worked_example_implied_vol() {
    let american = implied_vol(100.0, 0.03, 1.0, 105.0, OptionType::Call, 0.01, 6.64).unwrap();
    assert_abs_diff_eq!(american, 0.20, epsilon = 1e-4);

    let european =
        european_implied_vol(1.0, 100.0, 0.03, 0.01, 105.0, OptionType::Call, 6.64).unwrap();
    assert_abs_diff_eq!(european, american, epsilon = 3e-3);
}

#[test]
fn test_closed_form_round_trip_through_newton() {
    let env = MarketEnvironment::new(177.83, 0.05482, 0.0028).unwrap();
    let spec = OptionSpec::put(185.0, 127.0 / 365.0).unwrap();
    let price = BlackScholes::price(&spec, &env, 0.31);

    let (vol, iterations) = deamerican_rs::implied_volatility::solve_black_scholes_iv(
        &spec,
        &env,
        price,
        0.2,
        &NewtonConfig::default(),
    )
    .unwrap();
    assert_abs_diff_eq!(vol, 0.31, epsilon = 1e-5);
    assert!(iterations <= 10);
}

#[test]
fn test_invalid_inputs_never_panic() {
    assert!(matches!(
        lattice_price(OptionType::Call, -1.0, 1.0, 100.0, 0.03, 0.2, 0.01, true, 100),
        Err(CalibError::InvalidInput { .. })
    ));
    assert!(matches!(
        lattice_price(OptionType::Call, 100.0, 1.0, 100.0, 0.03, 0.0, 0.01, true, 100),
        Err(CalibError::InvalidInput { .. })
    ));
    assert!(matches!(
        lattice_price(OptionType::Call, 100.0, 1.0, 100.0, 0.03, 0.2, 0.01, true, 0),
        Err(CalibError::InvalidInput { .. })
    ));
    assert!(matches!(
        implied_vol(100.0, 0.03, 1.0, 105.0, OptionType::Put, 0.01, f64::NAN),
        Err(CalibError::InvalidInput { .. })
    ));
}
