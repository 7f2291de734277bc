//! Per-step time resolution: Rest, constant current, constant power and CCCV.
//!
//! Every step resolves to one operating point (or, for CCCV, a blend of two),
//! runs until the first of its time limit, its one-C duration or the SoC bound,
//! and updates the shared [`SimulationState`].

use crate::equipment::{EfficiencyModel, EquipmentSpec, facility_power_w};
use crate::recipe::{CccvDetail, Mode, Step, TestType};

use super::types::{SimulationState, StepResult};

/// CC-phase voltage of a CCCV step without a declared voltage (V).
pub const DEFAULT_CCCV_CC_VOLTAGE: f64 = 3.8;

/// Simulates single steps against one equipment spec.
#[derive(Debug, Clone, Copy)]
pub struct StepSimulator<'a> {
    spec: &'a EquipmentSpec,
    model: EfficiencyModel,
}

/// Resolved electrical inputs shared by CC and CP steps.
#[derive(Debug, Clone, Copy)]
struct OperatingPoint {
    voltage: Option<f64>,
    current: f64,
}

impl<'a> StepSimulator<'a> {
    pub fn new(spec: &'a EquipmentSpec, model: EfficiencyModel) -> Self {
        Self { spec, model }
    }

    /// Runs one step, advancing `state` by the time and charge it consumed.
    ///
    /// Steps whose required inputs are missing or non-positive are not an
    /// error here: they yield a zero-filled result with `skipped` set and
    /// leave the state untouched. `cycle` and `step_index` are left at zero
    /// for the caller to fill in.
    pub fn simulate(&self, step: &Step, state: &mut SimulationState) -> StepResult {
        let result = match (step.mode, step.test_type) {
            (Mode::Rest, _) => Some(self.rest(step, state)),
            (Mode::Charge, TestType::Cccv) => self.cccv(step, state),
            (_, TestType::Cc) => {
                let point = OperatingPoint {
                    voltage: step.voltage,
                    current: step.current.map_or(0.0, f64::abs),
                };
                self.constant_current(step, point, state)
            }
            (_, TestType::Cp) => {
                let point = resolve_constant_power(step);
                self.constant_current(step, point, state)
            }
            _ => None,
        };

        result.unwrap_or_else(|| {
            tracing::warn!(
                mode = %step.mode,
                test_type = %step.test_type,
                "step is missing required inputs, zero-filling"
            );
            StepResult::skipped(step.mode, step.test_type, state.clock_hours())
        })
    }

    fn rest(&self, step: &Step, state: &mut SimulationState) -> StepResult {
        let actual = step.effective_time_limit().unwrap_or(0.0);
        let power_kw = facility_power_w(Mode::Rest, 0.0, self.spec) / 1000.0;
        self.finish(step, state, actual, FinishedStep {
            voltage: None,
            current: None,
            c_rate: 0.0,
            efficiency: 1.0,
            power_kw,
        })
    }

    /// CC logic shared by CC and resolved CP steps.
    fn constant_current(
        &self,
        step: &Step,
        point: OperatingPoint,
        state: &mut SimulationState,
    ) -> Option<StepResult> {
        let voltage = point.voltage?;
        let current = point.current;
        if current <= 0.0 {
            return None;
        }

        let capacity = state.capacity_ah();
        let c_rate_time = capacity / current;
        let soc_bound_time = match step.mode {
            Mode::Discharge => state.charge_ah() / current,
            _ => state.headroom_ah() / current,
        };
        let mut actual = c_rate_time.min(soc_bound_time);
        if let Some(limit) = step.effective_time_limit() {
            actual = actual.min(limit);
        }

        let efficiency = self.model.efficiency(step.mode, voltage, current, self.spec);
        if efficiency < 0.0 {
            tracing::warn!(efficiency, voltage, current, "negative discharge efficiency");
        }
        let per_channel_w = match step.mode {
            Mode::Discharge => voltage * current * efficiency,
            _ => input_power_w(voltage, current, efficiency),
        };
        let power_kw = facility_power_w(step.mode, per_channel_w, self.spec) / 1000.0;

        let delta = actual * current;
        state.apply_charge(if step.mode == Mode::Discharge { -delta } else { delta });

        Some(self.finish(step, state, actual, FinishedStep {
            voltage: Some(voltage),
            current: Some(current),
            c_rate: if capacity > 0.0 { current / capacity } else { 0.0 },
            efficiency,
            power_kw,
        }))
    }

    fn cccv(&self, step: &Step, state: &mut SimulationState) -> Option<StepResult> {
        let detail: &CccvDetail = step.cccv_detail()?;
        let cc_current = step.current.map_or(0.0, f64::abs);
        if cc_current <= 0.0 {
            return None;
        }
        let cc_voltage = step.voltage.unwrap_or(DEFAULT_CCCV_CC_VOLTAGE);
        let cv_voltage = detail.cv_voltage;
        let ratio = detail.transition_percent / 100.0;

        let chargeable = state.headroom_ah();
        let ah_cc = chargeable * ratio;
        let ah_cv = chargeable * (1.0 - ratio);
        let t_cc = ah_cc / cc_current;
        let cv_current = (cc_current + detail.cutoff_current) / 2.0;
        let t_cv = if cv_current > 0.0 { ah_cv / cv_current } else { 0.0 };

        let full = t_cc + t_cv;
        let actual = match step.effective_time_limit() {
            Some(limit) if limit < full => limit,
            _ => full,
        };

        let (time_cc, time_cv, delta) = if actual <= t_cc {
            (actual, 0.0, actual * cc_current)
        } else {
            let time_cv = actual - t_cc;
            (t_cc, time_cv, ah_cc + time_cv * cv_current)
        };

        let eta_cc = self.model.efficiency(Mode::Charge, cc_voltage, cc_current, self.spec);
        let eta_cv = self.model.efficiency(Mode::Charge, cv_voltage, cv_current, self.spec);
        let drawn_wh = input_power_w(cc_voltage, cc_current, eta_cc) * time_cc
            + input_power_w(cv_voltage, cv_current, eta_cv) * time_cv;
        let delivered_wh = cc_voltage * cc_current * time_cc + cv_voltage * cv_current * time_cv;

        let avg_input_w = if actual > 0.0 { drawn_wh / actual } else { 0.0 };
        let efficiency = if drawn_wh > 0.0 { delivered_wh / drawn_wh } else { eta_cc };
        let power_kw = facility_power_w(Mode::Charge, avg_input_w, self.spec) / 1000.0;

        tracing::debug!(t_cc, t_cv, actual, delta, "resolved CCCV step");

        let capacity = state.capacity_ah();
        state.apply_charge(delta);

        Some(self.finish(step, state, actual, FinishedStep {
            voltage: Some(cc_voltage),
            current: Some(cc_current),
            c_rate: if capacity > 0.0 { cc_current / capacity } else { 0.0 },
            efficiency,
            power_kw,
        }))
    }

    fn finish(
        &self,
        step: &Step,
        state: &mut SimulationState,
        actual_hours: f64,
        done: FinishedStep,
    ) -> StepResult {
        let start_hours = state.clock_hours();
        state.advance(actual_hours);
        StepResult {
            cycle: 0,
            step_index: 0,
            mode: step.mode,
            test_type: step.test_type,
            voltage: done.voltage,
            current: done.current,
            c_rate: done.c_rate,
            actual_time_hours: actual_hours,
            efficiency_fraction: done.efficiency,
            power_kw: done.power_kw,
            energy_kwh: done.power_kw * actual_hours,
            charge_ah: state.charge_ah(),
            soc_percent: state.soc_percent(),
            start_hours,
            end_hours: state.clock_hours(),
            skipped: false,
        }
    }
}

/// Step outputs computed before the state is advanced.
struct FinishedStep {
    voltage: Option<f64>,
    current: Option<f64>,
    c_rate: f64,
    efficiency: f64,
    power_kw: f64,
}

/// Grid-side power drawn by one charging channel (W); `0.0` for non-positive efficiency.
fn input_power_w(voltage: f64, current: f64, efficiency: f64) -> f64 {
    if efficiency > 0.0 {
        voltage * current / efficiency
    } else {
        0.0
    }
}

/// Resolves the voltage and current of a constant-power step.
///
/// The voltage comes from the ramp average if one is attached, else from
/// power over the declared current, else from the declared voltage.
fn resolve_constant_power(step: &Step) -> OperatingPoint {
    let power = step.power.unwrap_or(0.0);
    let ramp = step
        .cp_detail()
        .and_then(|d| d.average_voltage(step.mode))
        .filter(|v| *v > 0.0);

    let voltage = match (ramp, step.current) {
        (Some(v), _) => Some(v),
        (None, Some(i)) if i > 0.0 => Some(if power > 0.0 { (power / i).abs() } else { 0.0 }),
        _ => step.voltage,
    };
    let current = match voltage {
        Some(v) if power > 0.0 && v > 0.0 => (power / v).abs(),
        _ => 0.0,
    };
    OperatingPoint { voltage, current }
}
