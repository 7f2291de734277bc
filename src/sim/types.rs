//! Core simulation types: running cell state and per-step results.

use std::fmt;

use serde::Serialize;

use crate::recipe::{Mode, TestType};

/// Relative distance from empty or full below which charge snaps to the bound.
const CHARGE_SNAP_RELATIVE: f64 = 1e-12;

/// Cell state threaded through one timeline build.
///
/// Created empty for every build; never shared between timelines.
///
/// # Examples
///
/// ```
/// use cycler_sim::sim::types::SimulationState;
///
/// let mut state = SimulationState::new(100.0);
/// state.apply_charge(150.0);
/// assert_eq!(state.charge_ah(), 100.0);
/// assert_eq!(state.soc_percent(), 100.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    capacity_ah: f64,
    charge_ah: f64,
    clock_hours: f64,
}

impl SimulationState {
    /// Creates an empty cell at time zero.
    pub fn new(capacity_ah: f64) -> Self {
        Self {
            capacity_ah: capacity_ah.max(0.0),
            charge_ah: 0.0,
            clock_hours: 0.0,
        }
    }

    pub fn capacity_ah(&self) -> f64 {
        self.capacity_ah
    }

    /// Accumulated charge (Ah), always within `[0, capacity]`.
    pub fn charge_ah(&self) -> f64 {
        self.charge_ah
    }

    /// Elapsed time since the start of the timeline (h).
    pub fn clock_hours(&self) -> f64 {
        self.clock_hours
    }

    /// Charge that can still be stored before the cell is full (Ah).
    pub fn headroom_ah(&self) -> f64 {
        self.capacity_ah - self.charge_ah
    }

    /// State of charge in percent; `0.0` for a zero-capacity cell.
    pub fn soc_percent(&self) -> f64 {
        if self.capacity_ah > 0.0 {
            self.charge_ah / self.capacity_ah * 100.0
        } else {
            0.0
        }
    }

    /// Adds (or with a negative `delta_ah`, removes) charge, clamped to `[0, capacity]`.
    ///
    /// Charge within rounding distance of either bound snaps onto it, so a
    /// full cell has exactly zero headroom.
    pub fn apply_charge(&mut self, delta_ah: f64) {
        let charge = (self.charge_ah + delta_ah).clamp(0.0, self.capacity_ah);
        let snap = self.capacity_ah * CHARGE_SNAP_RELATIVE;
        self.charge_ah = if self.capacity_ah - charge <= snap {
            self.capacity_ah
        } else if charge <= snap {
            0.0
        } else {
            charge
        };
    }

    /// Advances the clock by a non-negative duration.
    pub fn advance(&mut self, hours: f64) {
        self.clock_hours += hours.max(0.0);
    }
}

/// Outcome of one executed recipe step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// Repetition index (0-based).
    pub cycle: usize,
    /// Position of the step within its recipe (0-based).
    pub step_index: usize,
    pub mode: Mode,
    pub test_type: TestType,
    /// Operating voltage after CP/CCCV resolution (V).
    pub voltage: Option<f64>,
    /// Operating current after CP resolution (A).
    pub current: Option<f64>,
    /// Current relative to the cell capacity (1/h).
    pub c_rate: f64,
    /// Duration the step actually ran (h).
    pub actual_time_hours: f64,
    /// Conversion efficiency (fraction; `1.0` for Rest, may be negative on discharge).
    pub efficiency_fraction: f64,
    /// Facility power (kW; negative when discharge recovery exceeds standby).
    pub power_kw: f64,
    /// Facility energy over the step (kWh).
    pub energy_kwh: f64,
    /// Accumulated charge after the step (Ah).
    pub charge_ah: f64,
    /// State of charge after the step (%).
    pub soc_percent: f64,
    /// Elapsed time when the step started (h).
    pub start_hours: f64,
    /// Elapsed time when the step ended (h).
    pub end_hours: f64,
    /// `true` when required inputs were missing and the step was zero-filled.
    pub skipped: bool,
}

impl StepResult {
    /// A zero-filled result for a step that could not be simulated.
    ///
    /// Only the bookkeeping fields are populated; the clock does not advance.
    pub fn skipped(mode: Mode, test_type: TestType, at_hours: f64) -> Self {
        Self {
            cycle: 0,
            step_index: 0,
            mode,
            test_type,
            voltage: None,
            current: None,
            c_rate: 0.0,
            actual_time_hours: 0.0,
            efficiency_fraction: 0.0,
            power_kw: 0.0,
            energy_kwh: 0.0,
            charge_ah: 0.0,
            soc_percent: 0.0,
            start_hours: at_hours,
            end_hours: at_hours,
            skipped: true,
        }
    }

    /// Duration of the step on the elapsed-time axis (h).
    pub fn duration_hours(&self) -> f64 {
        self.end_hours - self.start_hours
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        write!(
            f,
            "#{:<2} c{:<2} {:<9} {:<4} | V={:>5} I={:>7} C={:.3} | {:>7.3}h \
             eta={:>6.2}% | {:>9.2} kW {:>10.2} kWh | {:>7.2} Ah SoC={:>5.1}%{}",
            self.step_index + 1,
            self.cycle + 1,
            self.mode,
            self.test_type,
            opt(self.voltage),
            opt(self.current),
            self.c_rate,
            self.actual_time_hours,
            self.efficiency_fraction * 100.0,
            self.power_kw,
            self.energy_kwh,
            self.charge_ah,
            self.soc_percent,
            if self.skipped { " (skipped)" } else { "" },
        )
    }
}
