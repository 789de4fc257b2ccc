use deamerican_rs::prelude::*;

#[test]
fn test_calibration_config_serde_round_trip() {
    let config = CalibrationConfig::new()
        .with_tolerance(1e-4)
        .with_max_iterations(100)
        .with_dividend_update(DividendYieldUpdate::InitialOmitsRate)
        .with_bisection(BisectionConfig::new().with_bounds(0.01, 5.0).with_steps(400));

    let json = serde_json::to_string(&config).unwrap();
    let restored = CalibrationConfig::from_json(&json).unwrap();
    assert_eq!(restored, config);
}

#[test]
fn test_partial_config_takes_defaults() {
    let config = CalibrationConfig::from_json("{}").unwrap();
    assert_eq!(config, CalibrationConfig::default());
    assert_eq!(config.bisection.lattice.steps, deamerican_rs::pricing::DEFAULT_STEPS);

    let newton: NewtonConfig = serde_json::from_str(r#"{"max_iterations": 10}"#).unwrap();
    assert_eq!(newton.max_iterations, 10);
    assert!((newton.tolerance - 1e-6).abs() < 1e-15);
}

#[test]
fn test_calibration_result_serializes() {
    let env = MarketEnvironment::new(100.0, 0.04, 0.015).unwrap();
    let lattice = LatticeConfig::new().with_steps(100);
    let call = OptionSpec::call(100.0, 0.5).unwrap();
    let c = BinomialLattice::price(&call, &env, 0.25, ExerciseStyle::American, &lattice).unwrap();
    let p = BinomialLattice::price(&call.counterpart(), &env, 0.25, ExerciseStyle::American, &lattice)
        .unwrap();

    let calibration = ForwardDividendCalibrator::new(
        env,
        100.0,
        0.5,
        c,
        p,
        CalibrationConfig::new().with_steps(100),
    )
    .unwrap()
    .calibrate()
    .unwrap();

    let json = serde_json::to_value(&calibration).unwrap();
    assert_eq!(json["run_id"], calibration.run_id.to_string());
    assert_eq!(
        json["history"].as_array().unwrap().len(),
        calibration.history.len()
    );

    let restored: ForwardCalibration = serde_json::from_value(json).unwrap();
    assert_eq!(restored.run_id, calibration.run_id);
    assert_eq!(restored.iterations, calibration.iterations);
    assert!((restored.forward - calibration.forward).abs() < 1e-12);
    assert!((restored.dividend_yield - calibration.dividend_yield).abs() < 1e-12);
}
