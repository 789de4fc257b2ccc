//! Black-Scholes-Merton pricing with a continuous dividend yield.
//!
//! Only used once a European-equivalent price is established; there is no
//! early exercise in this model.

use crate::types::{MarketEnvironment, OptionSpec, OptionType};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Black-Scholes-Merton pricing model implementation.
pub struct BlackScholes;

impl BlackScholes {
    /// Standard normal cumulative distribution function.
    #[must_use]
    pub fn norm_cdf(x: f64) -> f64 {
        Normal::standard().cdf(x)
    }

    /// Standard normal probability density function.
    #[must_use]
    pub fn norm_pdf(x: f64) -> f64 {
        Normal::standard().pdf(x)
    }

    /// Calculates the d1 parameter.
    ///
    /// d1 = [ln(S/K) + (r - q)T + σ²T/2] / (σ√T)
    #[must_use]
    pub fn d1(spot: f64, strike: f64, rate: f64, dividend_yield: f64, time: f64, vol: f64) -> f64 {
        let sqrt_time = time.sqrt();
        ((spot / strike).ln() + (rate - dividend_yield) * time + 0.5 * vol * vol * time)
            / (vol * sqrt_time)
    }

    /// Calculates the d2 parameter: d2 = d1 - σ√T.
    #[must_use]
    pub fn d2(d1: f64, vol: f64, time: f64) -> f64 {
        d1 - vol * time.sqrt()
    }

    /// Theoretical option price.
    ///
    /// price = φ·(S·e^{-qT}·N(φ·d1) - K·e^{-rT}·N(φ·d2)), φ = +1 call, -1 put.
    ///
    /// A zero volatility or expiry collapses to the discounted forward
    /// intrinsic value.
    #[must_use]
    pub fn price(spec: &OptionSpec, env: &MarketEnvironment, vol: f64) -> f64 {
        let phi = spec.option_type.payoff_sign();
        let carry_spot = env.spot * (-env.dividend_yield * spec.expiry).exp();
        let discounted_strike = spec.strike * env.discount(spec.expiry);

        if spec.expiry <= 0.0 || vol <= 0.0 {
            return (phi * (carry_spot - discounted_strike)).max(0.0);
        }

        let d1 = Self::d1(
            env.spot,
            spec.strike,
            env.rate,
            env.dividend_yield,
            spec.expiry,
            vol,
        );
        let d2 = Self::d2(d1, vol, spec.expiry);

        phi * (carry_spot * Self::norm_cdf(phi * d1)
            - discounted_strike * Self::norm_cdf(phi * d2))
    }

    /// Vega (∂price/∂σ), identical for calls and puts.
    ///
    /// Vega = K·e^{-rT}·n(d2)·√T, which equals S·e^{-qT}·n(d1)·√T.
    #[must_use]
    pub fn vega(spec: &OptionSpec, env: &MarketEnvironment, vol: f64) -> f64 {
        if spec.expiry <= 0.0 || vol <= 0.0 {
            return 0.0;
        }

        let d1 = Self::d1(
            env.spot,
            spec.strike,
            env.rate,
            env.dividend_yield,
            spec.expiry,
            vol,
        );
        let d2 = Self::d2(d1, vol, spec.expiry);
        spec.strike * env.discount(spec.expiry) * Self::norm_pdf(d2) * spec.expiry.sqrt()
    }
}

/// Closed-form European price from raw inputs.
#[must_use]
pub fn black_scholes_price(
    option_type: OptionType,
    strike: f64,
    expiry: f64,
    spot: f64,
    rate: f64,
    vol: f64,
    dividend_yield: f64,
) -> f64 {
    let spec = OptionSpec {
        option_type,
        strike,
        expiry,
    };
    let env = MarketEnvironment {
        spot,
        rate,
        dividend_yield,
    };
    BlackScholes::price(&spec, &env, vol)
}
