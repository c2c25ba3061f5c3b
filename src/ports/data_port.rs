//! Input loading port.

use crate::domain::bar::PriceBar;
use crate::domain::blackout::BlackoutWindow;
use crate::domain::error::CondorError;
use crate::domain::params::SessionWindow;

/// Supplies validated simulation input.
///
/// Implementations normalize every timestamp into `session.timezone` and
/// return bars sorted by strictly increasing timestamp.
pub trait DataPort {
    fn load_bars(&self, session: &SessionWindow) -> Result<Vec<PriceBar>, CondorError>;

    fn load_blackouts(&self) -> Result<Vec<BlackoutWindow>, CondorError>;
}
