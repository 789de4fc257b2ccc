//! End-to-end forward and dividend calibration on listed AAPL premiums.

use approx::assert_abs_diff_eq;
use deamerican_rs::prelude::*;

const SPOT: f64 = 177.83;
const RATE: f64 = 0.05482;
const STRIKE: f64 = 185.0;
const CALL_PRICE: f64 = 7.625;
const PUT_PRICE: f64 = 11.975;

fn expiry() -> f64 {
    127.0 / 365.0
}

fn aapl_env() -> MarketEnvironment {
    MarketEnvironment::new(SPOT, RATE, 0.0001).unwrap()
}

fn aapl_calibration(config: CalibrationConfig) -> ForwardCalibration {
    ForwardDividendCalibrator::new(aapl_env(), STRIKE, expiry(), CALL_PRICE, PUT_PRICE, config)
        .unwrap()
        .calibrate()
        .unwrap()
}

#[test]
fn test_aapl_forward_converges() {
    let calibration = aapl_calibration(CalibrationConfig::default());

    assert_abs_diff_eq!(calibration.forward, 181.0784, epsilon = 1e-2);
    assert!(calibration.iterations <= 3, "took {} iterations", calibration.iterations);
    assert_abs_diff_eq!(calibration.dividend_yield, 0.002795, epsilon = 1e-4);
    assert_abs_diff_eq!(calibration.dividend_yield_percent(), 0.2795, epsilon = 1e-2);

    // At the fixed point both flavors imply the same vol.
    assert_abs_diff_eq!(calibration.call_vol, 0.2232, epsilon = 1e-3);
    assert_abs_diff_eq!(calibration.put_vol, calibration.call_vol, epsilon = 1e-4);

    let last = calibration.history.last().unwrap();
    assert_abs_diff_eq!(last.forward, calibration.forward, epsilon = 1e-12);
}

#[test]
fn test_aapl_forward_helper() {
    let forward =
        calibrate_forward(expiry(), SPOT, RATE, 0.0001, STRIKE, CALL_PRICE, PUT_PRICE).unwrap();
    assert_abs_diff_eq!(forward, 181.0784, epsilon = 1e-2);
}

#[test]
fn test_initial_update_without_rate_reaches_same_forward() {
    let consistent = aapl_calibration(CalibrationConfig::default());
    let legacy = aapl_calibration(
        CalibrationConfig::new().with_dividend_update(DividendYieldUpdate::InitialOmitsRate),
    );

    assert_abs_diff_eq!(legacy.forward, consistent.forward, epsilon = 5e-3);
    assert_abs_diff_eq!(legacy.dividend_yield, consistent.dividend_yield, epsilon = 1e-4);
    assert!(legacy.iterations >= consistent.iterations);

    // Only the initial state skips the rate term.
    let initial = legacy.history[0];
    let expected = (SPOT / initial.forward).ln() / expiry();
    assert_abs_diff_eq!(initial.dividend_yield, expected, epsilon = 1e-12);
}

#[test]
fn test_cash_dividend_matches_forward() {
    let calibration = aapl_calibration(CalibrationConfig::default());
    let expected = SPOT - calibration.forward * (-RATE * expiry()).exp();
    assert_abs_diff_eq!(calibration.cash_dividend(), expected, epsilon = 1e-12);
    assert!(calibration.cash_dividend() > 0.0);
    assert!(calibration.cash_dividend() < 1.0);
}

#[test]
fn test_aapl_european_vols() {
    let calibration = aapl_calibration(CalibrationConfig::default());
    let env = calibration.environment();
    let quotes = [
        MarketQuote::new(OptionSpec::call(STRIKE, expiry()).unwrap(), CALL_PRICE).unwrap(),
        MarketQuote::new(OptionSpec::put(STRIKE, expiry()).unwrap(), PUT_PRICE).unwrap(),
    ];

    let smile = european_vol_smile(
        &env,
        &quotes,
        &BisectionConfig::default(),
        &NewtonConfig::default(),
    );
    assert_eq!(smile.len(), 2);

    for strike_vol in &smile {
        let iv = strike_vol.result.as_ref().unwrap();
        assert_abs_diff_eq!(iv.vol, 0.22318, epsilon = 2e-4);
        assert!(iv.spread_bps().abs() < 30.0, "spread {} bps", iv.spread_bps());
        assert!(iv.european_price <= strike_vol.quote.premium + 1e-9);
    }
}

#[test]
fn test_calibrate_expiries_matches_single_run() {
    let request = ForwardRequest {
        env: aapl_env(),
        expiry: expiry(),
        strike: STRIKE,
        call_price: CALL_PRICE,
        put_price: PUT_PRICE,
    };
    let bad = ForwardRequest {
        call_price: -1.0,
        ..request
    };

    let results = calibrate_expiries(&[request, bad, request], &CalibrationConfig::default());
    assert_eq!(results.len(), 3);
    assert!(matches!(results[1], Err(CalibError::InvalidInput { .. })));

    let first = results[0].as_ref().unwrap();
    let third = results[2].as_ref().unwrap();
    assert_abs_diff_eq!(first.forward, third.forward, epsilon = 1e-12);
    assert_ne!(first.run_id, third.run_id);
}

#[test]
fn test_calibration_failure_is_reported_not_fatal() {
    let config = CalibrationConfig::new()
        .with_tolerance(1e-300)
        .with_max_iterations(1)
        .with_steps(100);
    let err = ForwardDividendCalibrator::new(aapl_env(), STRIKE, expiry(), CALL_PRICE, PUT_PRICE, config)
        .unwrap()
        .calibrate()
        .unwrap_err();

    assert!(err.is_convergence_failure());
    assert!(matches!(err, CalibError::CalibrationFailure { iterations: 1, .. }));
    assert!(err.to_string().contains("did not converge"));
}
