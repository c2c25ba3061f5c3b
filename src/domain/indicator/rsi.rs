//! RSI (Relative Strength Index) momentum measure.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars produce no value (n price changes are needed).

use super::wilder::WilderAverage;

#[derive(Debug, Clone)]
pub struct Rsi {
    prev_close: Option<f64>,
    avg_gain: WilderAverage,
    avg_loss: WilderAverage,
    value: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Rsi {
            prev_close: None,
            avg_gain: WilderAverage::new(period),
            avg_loss: WilderAverage::new(period),
            value: None,
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        let Some(prev) = self.prev_close.replace(close) else {
            return None;
        };

        let change = close - prev;
        let gain = self.avg_gain.update(change.max(0.0));
        let loss = self.avg_loss.update((-change).max(0.0));

        if let (Some(gain), Some(loss)) = (gain, loss) {
            self.value = Some(if loss == 0.0 {
                100.0
            } else {
                100.0 - (100.0 / (1.0 + gain / loss))
            });
        }
        self.value
    }
}
