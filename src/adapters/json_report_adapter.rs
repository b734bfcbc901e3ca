//! JSON report adapter.

use crate::domain::error::CopilotError;
use crate::domain::payload::{RebalanceResponse, SimulationResponse};
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn render<T: Serialize>(&self, value: &T) -> Result<String, CopilotError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.map_err(|e| CopilotError::Report {
            reason: format!("failed to serialize report: {e}"),
        })
    }

    fn emit<T: Serialize>(&self, value: &T, output: Option<&Path>) -> Result<(), CopilotError> {
        let mut body = self.render(value)?;
        body.push('\n');
        match output {
            Some(path) => {
                fs::write(path, body)?;
                tracing::info!(path = %path.display(), "report written");
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(body.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_simulation(
        &self,
        response: &SimulationResponse,
        output: Option<&Path>,
    ) -> Result<(), CopilotError> {
        self.emit(response, output)
    }

    fn write_rebalance(
        &self,
        response: &RebalanceResponse,
        output: Option<&Path>,
    ) -> Result<(), CopilotError> {
        self.emit(response, output)
    }
}
