//! API response and query types.
//!
//! Step record field names follow the timeline CSV columns so both export
//! formats read the same.

use serde::{Deserialize, Serialize};

use crate::recipe::{Mode, TestType};
use crate::sim::summary::TimelineSummary;
use crate::sim::superposition::ProfileSummary;
use crate::sim::types::StepResult;

/// Totals of one recipe.
#[derive(Debug, Serialize)]
pub struct RecipeSummaryRecord {
    pub name: String,
    /// Steps in one cycle.
    pub steps_per_cycle: usize,
    #[serde(flatten)]
    pub summary: TimelineSummary,
}

/// Combined state response: every recipe's totals and the combined peaks.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub recipes: Vec<RecipeSummaryRecord>,
    pub profile: ProfileSummary,
}

/// Single step record using the timeline CSV column names.
///
/// Cycle and step numbers are 1-based, efficiency and SoC are percentages.
#[derive(Debug, Serialize)]
pub struct StepRecord {
    pub cycle: usize,
    pub step: usize,
    pub mode: Mode,
    pub test_type: TestType,
    pub voltage_v: Option<f64>,
    pub current_a: Option<f64>,
    pub c_rate: f64,
    pub actual_time_h: f64,
    pub efficiency_pct: f64,
    pub power_kw: f64,
    pub energy_kwh: f64,
    pub charge_ah: f64,
    pub soc_pct: f64,
    pub start_h: f64,
    pub end_h: f64,
    pub skipped: bool,
}

impl From<&StepResult> for StepRecord {
    fn from(r: &StepResult) -> Self {
        Self {
            cycle: r.cycle + 1,
            step: r.step_index + 1,
            mode: r.mode,
            test_type: r.test_type,
            voltage_v: r.voltage,
            current_a: r.current,
            c_rate: r.c_rate,
            actual_time_h: r.actual_time_hours,
            efficiency_pct: r.efficiency_fraction * 100.0,
            power_kw: r.power_kw,
            energy_kwh: r.energy_kwh,
            charge_ah: r.charge_ah,
            soc_pct: r.soc_percent,
            start_h: r.start_hours,
            end_h: r.end_hours,
            skipped: r.skipped,
        }
    }
}

/// Optional cycle selector for the timeline endpoint (1-based).
#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub cycle: Option<usize>,
}

/// Optional time window for the profile endpoint.
#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    /// Start time (h, inclusive).
    pub from: Option<f64>,
    /// End time (h, inclusive).
    pub to: Option<f64>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
