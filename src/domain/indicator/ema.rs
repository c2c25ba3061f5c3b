//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) inputs produce no value.

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    k: f64,
    count: usize,
    sum: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Ema {
            period,
            k: 2.0 / (period as f64 + 1.0),
            count: 0,
            sum: 0.0,
            value: None,
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        self.value = match self.value {
            Some(prev) => Some(close * self.k + prev * (1.0 - self.k)),
            None => {
                self.sum += close;
                self.count += 1;
                if self.count == self.period {
                    Some(self.sum / self.period as f64)
                } else {
                    None
                }
            }
        };
        self.value
    }
}
