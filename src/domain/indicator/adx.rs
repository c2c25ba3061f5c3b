//! ADX (Average Directional Index) trend-strength measure.
//!
//! +DM = up_move if up_move > down_move and up_move > 0, else 0 (mirror for -DM).
//! TR, +DM and -DM are Wilder-smoothed over n; +DI/-DI = 100 * DM / TR;
//! DX = 100 * |+DI - -DI| / (+DI + -DI); ADX = Wilder average of DX.
//!
//! Warmup: the first DX needs n changes (bar n), the first ADX needs n DX
//! values, so bar 2n-1 is the first with a value.

use super::wilder::WilderAverage;
use crate::domain::bar::PriceBar;

#[derive(Debug, Clone, Copy)]
struct PrevBar {
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Debug, Clone)]
pub struct Adx {
    prev: Option<PrevBar>,
    tr: WilderAverage,
    plus_dm: WilderAverage,
    minus_dm: WilderAverage,
    dx: WilderAverage,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Adx {
            prev: None,
            tr: WilderAverage::new(period),
            plus_dm: WilderAverage::new(period),
            minus_dm: WilderAverage::new(period),
            dx: WilderAverage::new(period),
        }
    }

    pub fn update(&mut self, bar: &PriceBar) -> Option<f64> {
        let current = PrevBar {
            high: bar.high,
            low: bar.low,
            close: bar.close,
        };
        let Some(prev) = self.prev.replace(current) else {
            return None;
        };

        let up_move = bar.high - prev.high;
        let down_move = prev.low - bar.low;
        let plus = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let minus = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        let tr = self.tr.update(bar.true_range(prev.close));
        let plus = self.plus_dm.update(plus);
        let minus = self.minus_dm.update(minus);

        match (tr, plus, minus) {
            (Some(tr), Some(plus), Some(minus)) => {
                let dx = directional_index(tr, plus, minus);
                self.dx.update(dx)
            }
            _ => None,
        }
    }
}

fn directional_index(tr: f64, plus_dm: f64, minus_dm: f64) -> f64 {
    if tr <= 0.0 {
        return 0.0;
    }
    let plus_di = 100.0 * plus_dm / tr;
    let minus_di = 100.0 * minus_dm / tr;
    let sum = plus_di + minus_di;
    if sum == 0.0 {
        0.0
    } else {
        100.0 * (plus_di - minus_di).abs() / sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::bar_hlc;

    #[test]
    fn adx_warmup_is_two_periods() {
        let mut adx = Adx::new(3);
        let out: Vec<_> = (0..8)
            .map(|i| {
                let c = 100.0 + i as f64;
                adx.update(&bar_hlc(i, c + 1.0, c - 1.0, c))
            })
            .collect();
        for (i, v) in out.iter().enumerate().take(5) {
            assert!(v.is_none(), "bar {i} should not be ready");
        }
        assert!(out[5].is_some());
    }

    #[test]
    fn adx_strong_uptrend_is_high() {
        let mut adx = Adx::new(3);
        let mut last = None;
        for i in 0..12 {
            let c = 100.0 + 2.0 * i as f64;
            last = adx.update(&bar_hlc(i, c + 1.0, c - 1.0, c));
        }
        // only +DM ever fires, so DX is 100 on every bar
        assert!((last.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn adx_oscillation_is_low() {
        let mut adx = Adx::new(3);
        let mut last = None;
        for i in 0..20 {
            let c = if i % 2 == 0 { 100.0 } else { 101.0 };
            last = adx.update(&bar_hlc(i, c + 1.0, c - 1.0, c));
        }
        assert!(last.unwrap() < 25.0);
    }

    #[test]
    fn flat_bars_yield_zero() {
        let mut adx = Adx::new(2);
        let mut last = None;
        for i in 0..6 {
            last = adx.update(&bar_hlc(i, 100.0, 100.0, 100.0));
        }
        assert_eq!(last, Some(0.0));
    }

    #[test]
    fn directional_index_balanced() {
        assert!(directional_index(2.0, 1.0, 1.0).abs() < f64::EPSILON);
        assert!((directional_index(2.0, 1.0, 0.0) - 100.0).abs() < f64::EPSILON);
    }
}
