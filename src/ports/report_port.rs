//! Report output port trait.

use std::path::Path;

use crate::domain::error::CopilotError;
use crate::domain::payload::{RebalanceResponse, SimulationResponse};

/// Port for writing engine results. `None` output means stdout.
pub trait ReportPort {
    fn write_simulation(
        &self,
        response: &SimulationResponse,
        output: Option<&Path>,
    ) -> Result<(), CopilotError>;

    fn write_rebalance(
        &self,
        response: &RebalanceResponse,
        output: Option<&Path>,
    ) -> Result<(), CopilotError>;
}
