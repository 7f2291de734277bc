//! Repeated execution of a recipe against one cell.

use serde::Serialize;

use crate::equipment::{EfficiencyModel, EquipmentSpec};
use crate::recipe::Step;

use super::step::StepSimulator;
use super::types::{SimulationState, StepResult};

/// Ordered step results of one recipe run `repetitions` times.
///
/// Cycles share one cell state, so later cycles start from wherever the
/// previous one left the charge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    results: Vec<StepResult>,
    cycle_len: usize,
    cycles: usize,
    final_charge_ah: f64,
    final_soc_percent: f64,
}

impl Timeline {
    /// All step results in execution order.
    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    /// Number of steps in one cycle.
    pub fn cycle_len(&self) -> usize {
        self.cycle_len
    }

    /// Number of executed repetitions.
    pub fn cycle_count(&self) -> usize {
        self.cycles
    }

    /// Results of repetition `n` (0-based), or `None` if out of range.
    pub fn cycle(&self, n: usize) -> Option<&[StepResult]> {
        if n >= self.cycles {
            return None;
        }
        let start = n * self.cycle_len;
        self.results.get(start..start + self.cycle_len)
    }

    /// Results of the first repetition; empty for an empty recipe.
    pub fn first_cycle(&self) -> &[StepResult] {
        self.cycle(0).unwrap_or(&[])
    }

    /// Elapsed time at the end of the last step (h).
    pub fn total_hours(&self) -> f64 {
        self.results.last().map_or(0.0, |r| r.end_hours)
    }

    /// Sum of step energies (kWh).
    pub fn total_energy_kwh(&self) -> f64 {
        self.results.iter().map(|r| r.energy_kwh).sum()
    }

    /// Cell charge after the last step (Ah).
    pub fn final_charge_ah(&self) -> f64 {
        self.final_charge_ah
    }

    /// State of charge after the last step (%).
    pub fn final_soc_percent(&self) -> f64 {
        self.final_soc_percent
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Builds timelines for one equipment spec and efficiency strategy.
#[derive(Debug, Clone, Copy)]
pub struct TimelineBuilder<'a> {
    spec: &'a EquipmentSpec,
    model: EfficiencyModel,
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(spec: &'a EquipmentSpec, model: EfficiencyModel) -> Self {
        Self { spec, model }
    }

    /// Executes `recipe` `repetitions` times from an empty cell.
    ///
    /// # Arguments
    ///
    /// * `recipe` - Steps of one cycle
    /// * `repetitions` - Number of cycles; `0` yields an empty timeline
    ///
    /// # Returns
    ///
    /// One [`StepResult`] per executed step, `recipe.len() * repetitions` in total.
    pub fn build(&self, recipe: &[Step], repetitions: usize) -> Timeline {
        let simulator = StepSimulator::new(self.spec, self.model);
        let mut state = SimulationState::new(self.spec.cell_capacity_ah);
        let mut results = Vec::with_capacity(recipe.len() * repetitions);

        for cycle in 0..repetitions {
            for (step_index, step) in recipe.iter().enumerate() {
                let mut result = simulator.simulate(step, &mut state);
                result.cycle = cycle;
                result.step_index = step_index;
                tracing::debug!(
                    cycle,
                    step = step_index + 1,
                    mode = %result.mode,
                    hours = result.actual_time_hours,
                    power_kw = result.power_kw,
                    "step resolved"
                );
                results.push(result);
            }
        }

        let timeline = Timeline {
            results,
            cycle_len: recipe.len(),
            cycles: repetitions,
            final_charge_ah: state.charge_ah(),
            final_soc_percent: state.soc_percent(),
        };
        tracing::info!(
            steps = timeline.results.len(),
            cycles = repetitions,
            hours = timeline.total_hours(),
            energy_kwh = timeline.total_energy_kwh(),
            "timeline built"
        );
        timeline
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::recipe::Mode;

    fn recipe() -> Vec<Step> {
        vec![
            Step::rest(1.0),
            Step::cc(Mode::Charge, 3.8, 100.0),
            Step::cc(Mode::Discharge, 3.6, 100.0),
        ]
    }

    #[test]
    fn repetitions_multiply_steps() {
        let spec = EquipmentSpec::default();
        let timeline = TimelineBuilder::new(&spec, EfficiencyModel::default()).build(&recipe(), 3);
        assert_eq!(timeline.results().len(), 9);
        assert_eq!(timeline.cycle_count(), 3);
        assert_eq!(timeline.cycle_len(), 3);
        assert_eq!(timeline.cycle(2).unwrap()[0].cycle, 2);
        assert!(timeline.cycle(3).is_none());
        assert_eq!(timeline.first_cycle().len(), 3);
    }

    #[test]
    fn clock_is_contiguous() {
        let spec = EquipmentSpec::default();
        let timeline = TimelineBuilder::new(&spec, EfficiencyModel::default()).build(&recipe(), 2);
        let results = timeline.results();
        assert_eq!(results[0].start_hours, 0.0);
        for pair in results.windows(2) {
            assert_eq!(pair[0].end_hours, pair[1].start_hours);
        }
        let expected: f64 = results.iter().map(|r| r.actual_time_hours).sum();
        assert_relative_eq!(timeline.total_hours(), expected, max_relative = 1e-12);
    }

    #[test]
    fn state_carries_across_cycles() {
        let spec = EquipmentSpec::default();
        let charge_only = vec![Step::cc(Mode::Charge, 3.8, 100.0).with_time_limit(1.0)];
        let timeline = TimelineBuilder::new(&spec, EfficiencyModel::default()).build(&charge_only, 3);
        let charges: Vec<f64> = timeline.results().iter().map(|r| r.charge_ah).collect();
        assert_relative_eq!(charges[0], 100.0, max_relative = 1e-12);
        assert_relative_eq!(charges[1], 200.0, max_relative = 1e-12);
        assert_relative_eq!(charges[2], 211.10, max_relative = 1e-12);
        assert_relative_eq!(timeline.final_soc_percent(), 100.0, max_relative = 1e-12);
    }

    #[test]
    fn zero_repetitions_is_empty() {
        let spec = EquipmentSpec::default();
        let timeline = TimelineBuilder::new(&spec, EfficiencyModel::default()).build(&recipe(), 0);
        assert!(timeline.is_empty());
        assert!(timeline.first_cycle().is_empty());
        assert_eq!(timeline.total_hours(), 0.0);
    }
}
