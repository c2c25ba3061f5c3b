//! Wilder smoothing (alpha = 1/n).
//!
//! Seeded with the simple mean of the first n inputs, then
//! avg = (prev_avg * (n-1) + x) / n.

#[derive(Debug, Clone)]
pub struct WilderAverage {
    period: usize,
    count: usize,
    sum: f64,
    value: Option<f64>,
}

impl WilderAverage {
    pub fn new(period: usize) -> Self {
        WilderAverage {
            period: period.max(1),
            count: 0,
            sum: 0.0,
            value: None,
        }
    }

    pub fn update(&mut self, x: f64) -> Option<f64> {
        let n = self.period as f64;
        self.value = match self.value {
            Some(prev) => Some((prev * (n - 1.0) + x) / n),
            None => {
                self.sum += x;
                self.count += 1;
                if self.count == self.period {
                    Some(self.sum / n)
                } else {
                    None
                }
            }
        };
        self.value
    }
}
