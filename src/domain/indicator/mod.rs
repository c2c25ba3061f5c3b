//! Streaming technical indicators.
//!
//! [`IndicatorEngine`] owns one rolling state object per indicator and is fed
//! one bar at a time. Each call returns an [`IndicatorSnapshot`]:
//! - `ema`: trend average of closes
//! - `atr`: Wilder average true range (volatility)
//! - `adx`: trend strength
//! - `rsi`: momentum
//! - `channel_upper` / `channel_lower`: Keltner bounds `ema ± k * atr`,
//!   rounded to whole strikes

pub mod adx;
pub mod atr;
pub mod ema;
pub mod rsi;
pub mod wilder;

use crate::domain::bar::PriceBar;
use crate::domain::params::StrategyParameters;

use adx::Adx;
use atr::Atr;
use ema::Ema;
use rsi::Rsi;

/// Derived values for one bar. Fields that have not warmed up yet hold 0;
/// only a snapshot with `ready == true` may be used for entries.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorSnapshot {
    pub ready: bool,
    pub ema: f64,
    pub atr: f64,
    pub adx: f64,
    pub rsi: f64,
    pub channel_upper: i64,
    pub channel_lower: i64,
}

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    ema_period: usize,
    atr_period: usize,
    adx_period: usize,
    rsi_period: usize,
    multiplier: f64,
    ema: Ema,
    atr: Atr,
    adx: Adx,
    rsi: Rsi,
    bars_seen: usize,
}

impl IndicatorEngine {
    pub fn new(params: &StrategyParameters) -> Self {
        IndicatorEngine {
            ema_period: params.ema_period,
            atr_period: params.atr_period,
            adx_period: params.adx_period,
            rsi_period: params.rsi_period,
            multiplier: params.atr_multiplier,
            ema: Ema::new(params.ema_period),
            atr: Atr::new(params.atr_period),
            adx: Adx::new(params.adx_period),
            rsi: Rsi::new(params.rsi_period),
            bars_seen: 0,
        }
    }

    /// Drops all rolling state, as if no bar had been seen.
    pub fn reset(&mut self) {
        self.ema = Ema::new(self.ema_period);
        self.atr = Atr::new(self.atr_period);
        self.adx = Adx::new(self.adx_period);
        self.rsi = Rsi::new(self.rsi_period);
        self.bars_seen = 0;
    }

    /// Number of bars needed before the first ready snapshot.
    pub fn warmup_bars(&self) -> usize {
        [
            self.ema_period,
            self.atr_period,
            self.rsi_period + 1,
            2 * self.adx_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    pub fn update(&mut self, bar: &PriceBar) -> IndicatorSnapshot {
        self.bars_seen += 1;

        let ema = self.ema.update(bar.close);
        let atr = self.atr.update(bar);
        let adx = self.adx.update(bar);
        let rsi = self.rsi.update(bar.close);

        let mut snapshot = IndicatorSnapshot {
            ready: false,
            ema: ema.unwrap_or(0.0),
            atr: atr.unwrap_or(0.0),
            adx: adx.unwrap_or(0.0),
            rsi: rsi.unwrap_or(0.0),
            channel_upper: 0,
            channel_lower: 0,
        };

        if let (Some(ema), Some(atr), Some(_), Some(_)) = (ema, atr, adx, rsi) {
            let (upper, lower) = keltner_bounds(ema, atr, self.multiplier);
            snapshot.ready = true;
            snapshot.channel_upper = upper;
            snapshot.channel_lower = lower;
        }

        snapshot
    }
}

/// `ema ± multiplier * atr`, each rounded half away from zero.
pub fn keltner_bounds(ema: f64, atr: f64, multiplier: f64) -> (i64, i64) {
    let upper = (ema + multiplier * atr).round() as i64;
    let lower = (ema - multiplier * atr).round() as i64;
    (upper, lower)
}
