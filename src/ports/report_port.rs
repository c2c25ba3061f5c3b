//! Result export port.

use crate::domain::error::CondorError;
use crate::domain::params::StrategyParameters;
use crate::domain::runner::SimulationOutput;

/// Port for writing simulation results somewhere durable.
pub trait ReportPort {
    fn write(
        &self,
        output: &SimulationOutput,
        params: &StrategyParameters,
    ) -> Result<(), CondorError>;
}
