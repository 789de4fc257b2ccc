//! Calibrates the implied forward and dividend yield of one AAPL expiry
//! from its American call and put premiums, then extracts the
//! European-equivalent vols at the anchor strike.
//!
//! Logs at DEBUG so every calibration step is visible:
//!
//! ```text
//! cargo run -p demos --bin aapl_forward
//! ```

use deamerican_rs::prelude::*;
use tracing::{error, info};

const SPOT: f64 = 177.83;
const RATE: f64 = 0.05482;
const DAYS_TO_EXPIRY: f64 = 127.0;
const STRIKE: f64 = 185.0;
const CALL_PRICE: f64 = 7.625;
const PUT_PRICE: f64 = 11.975;
const INITIAL_DIVIDEND_YIELD: f64 = 0.0001;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let expiry = DAYS_TO_EXPIRY / 365.0;
    let env = MarketEnvironment::new(SPOT, RATE, INITIAL_DIVIDEND_YIELD)?;
    let config = CalibrationConfig::default();
    info!(config = %serde_json::to_string(&config)?, "starting calibration");

    let calibrator =
        ForwardDividendCalibrator::new(env, STRIKE, expiry, CALL_PRICE, PUT_PRICE, config)?;
    let calibration = match calibrator.calibrate() {
        Ok(calibration) => calibration,
        Err(e) => {
            error!("calibration failed: {}", e);
            return Err(e.into());
        }
    };

    println!("run id:           {}", calibration.run_id);
    println!("iterations:       {}", calibration.iterations);
    println!("forward:          {:.4}", calibration.forward);
    println!("dividend yield:   {:.4}%", calibration.dividend_yield_percent());
    println!("cash dividend:    {:.4}", calibration.cash_dividend());

    let quotes = [
        MarketQuote::new(OptionSpec::call(STRIKE, expiry)?, CALL_PRICE)?,
        MarketQuote::new(OptionSpec::put(STRIKE, expiry)?, PUT_PRICE)?,
    ];
    let smile = european_vol_smile(
        &calibration.environment(),
        &quotes,
        &config.bisection,
        &NewtonConfig::default(),
    );

    for strike_vol in smile {
        let spec = strike_vol.quote.spec;
        match strike_vol.result {
            Ok(iv) => println!(
                "{} {}: american vol {:.4}%, european vol {:.4}% ({:+.2} bps)",
                spec.option_type,
                spec.strike,
                iv.american_vol * 100.0,
                iv.vol * 100.0,
                iv.spread_bps()
            ),
            Err(e) => error!("{} {}: {}", spec.option_type, spec.strike, e),
        }
    }

    Ok(())
}
