//! Implied forward and dividend yield calibration for one expiry, plus
//! parallel batch drivers over strikes and expiries.

mod batch;
mod forward;

pub use batch::{ForwardRequest, StrikeVol, calibrate_expiries, european_vol_smile};
pub use forward::{
    CalibrationConfig, CalibrationState, DividendYieldUpdate, ForwardCalibration,
    ForwardDividendCalibrator, ParityStep, calibrate_forward, dividend_yield_from_forward,
};
