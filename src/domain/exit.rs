//! Exit rules for an open position.
//!
//! Breach is checked before expiry, and the upper strike before the lower.
//! A breach settles at `-max_loss`, an expiry at `+credit`.

use super::bar::PriceBar;
use super::params::{PositionHorizon, StrategyParameters};
use super::trade::{BreachSide, Closing, ExitReason, OpenPosition};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitDecision {
    StillOpen,
    Closed(Closing),
}

#[derive(Debug, Clone, Copy)]
pub struct ExitEngine<'a> {
    params: &'a StrategyParameters,
}

impl<'a> ExitEngine<'a> {
    pub fn new(params: &'a StrategyParameters) -> Self {
        ExitEngine { params }
    }

    /// Evaluates one post-entry bar and counts it in `position.bars_held`.
    pub fn evaluate(&self, bar: &PriceBar, position: &mut OpenPosition) -> ExitDecision {
        position.bars_held += 1;

        if let Some(side) = breach_side(bar, position) {
            return ExitDecision::Closed(self.breach(bar, side, false));
        }

        let expired = match self.params.horizon {
            PositionHorizon::WeeklyExpiry { .. } => position
                .expiry_date
                .is_some_and(|expiry| bar.date_in(self.params.session.timezone) >= expiry),
            PositionHorizon::Bars(n) => position.bars_held >= n,
        };

        if expired {
            ExitDecision::Closed(Closing {
                exit_time: bar.timestamp,
                reason: ExitReason::Expiry,
                breach_side: None,
                pnl: position.credit,
                forced: false,
            })
        } else {
            ExitDecision::StillOpen
        }
    }

    /// Resolves a position still open after the last bar, settling the last
    /// close against the strikes.
    pub fn force_close(&self, last: &PriceBar, position: &OpenPosition) -> Closing {
        let close = last.close;
        let side = if close > position.upper_strike as f64 {
            Some(BreachSide::Upper)
        } else if close < position.lower_strike as f64 {
            Some(BreachSide::Lower)
        } else {
            None
        };

        match side {
            Some(side) => self.breach(last, side, true),
            None => Closing {
                exit_time: last.timestamp,
                reason: ExitReason::Expiry,
                breach_side: None,
                pnl: position.credit,
                forced: true,
            },
        }
    }

    fn breach(&self, bar: &PriceBar, side: BreachSide, forced: bool) -> Closing {
        Closing {
            exit_time: bar.timestamp,
            reason: ExitReason::Breach,
            breach_side: Some(side),
            pnl: -self.params.max_loss,
            forced,
        }
    }
}

fn breach_side(bar: &PriceBar, position: &OpenPosition) -> Option<BreachSide> {
    if bar.high > position.upper_strike as f64 {
        Some(BreachSide::Upper)
    } else if bar.low < position.lower_strike as f64 {
        Some(BreachSide::Lower)
    } else {
        None
    }
}
