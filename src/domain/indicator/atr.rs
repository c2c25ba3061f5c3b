//! Average True Range with Wilder smoothing.
//!
//! TR of the first bar is high - low; afterwards the gap-aware true range.
//! Warmup: first (n-1) bars produce no value.

use super::wilder::WilderAverage;
use crate::domain::bar::PriceBar;

#[derive(Debug, Clone)]
pub struct Atr {
    prev_close: Option<f64>,
    avg: WilderAverage,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Atr {
            prev_close: None,
            avg: WilderAverage::new(period),
        }
    }

    pub fn update(&mut self, bar: &PriceBar) -> Option<f64> {
        let tr = match self.prev_close {
            Some(prev) => bar.true_range(prev),
            None => bar.high - bar.low,
        };
        self.prev_close = Some(bar.close);
        self.avg.update(tr)
    }
}
