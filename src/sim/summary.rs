//! Post-hoc totals of a single timeline.

use std::fmt;

use serde::Serialize;

use super::timeline::Timeline;

/// Totals derived from a complete timeline.
///
/// Computed from the step results so the figures always match the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSummary {
    /// Elapsed time of the whole run (h).
    pub total_hours: f64,
    /// Net facility energy (kWh).
    pub total_energy_kwh: f64,
    /// Highest non-negative power of a step that took time (kW).
    pub peak_power_kw: f64,
    /// Share of elapsed time spent in Charge or Discharge steps (0.0 to 1.0).
    pub demand_factor: f64,
    /// Peak power weighted by the demand factor (kW).
    pub demand_peak_kw: f64,
    /// State of charge after the last step (%).
    pub final_soc_percent: f64,
    /// Executed repetitions.
    pub cycles: usize,
    /// Steps that were zero-filled.
    pub skipped_steps: usize,
}

impl TimelineSummary {
    pub fn from_timeline(timeline: &Timeline) -> Self {
        let results = timeline.results();
        let total_hours = timeline.total_hours();
        let active_hours: f64 = results
            .iter()
            .filter(|r| r.mode.is_active())
            .map(|r| r.actual_time_hours)
            .sum();
        // Zero-duration steps never show up in the power profile either.
        let peak_power_kw = results
            .iter()
            .filter(|r| r.duration_hours() > 0.0)
            .map(|r| r.power_kw)
            .fold(0.0, f64::max);
        let demand_factor = if total_hours > 0.0 {
            (active_hours / total_hours).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            total_hours,
            total_energy_kwh: timeline.total_energy_kwh(),
            peak_power_kw,
            demand_factor,
            demand_peak_kw: peak_power_kw * demand_factor,
            final_soc_percent: timeline.final_soc_percent(),
            cycles: timeline.cycle_count(),
            skipped_steps: results.iter().filter(|r| r.skipped).count(),
        }
    }
}

impl fmt::Display for TimelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cycles:                  {}", self.cycles)?;
        writeln!(f, "Total time:              {:.3} h", self.total_hours)?;
        writeln!(f, "Total energy:            {:.2} kWh", self.total_energy_kwh)?;
        writeln!(f, "Peak power:              {:.2} kW", self.peak_power_kw)?;
        writeln!(
            f,
            "Demand-adjusted peak:    {:.2} kW (factor {:.3})",
            self.demand_peak_kw, self.demand_factor
        )?;
        writeln!(f, "Final SoC:               {:.1} %", self.final_soc_percent)?;
        if self.skipped_steps > 0 {
            writeln!(f, "Skipped steps:           {}", self.skipped_steps)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::equipment::{EfficiencyModel, EquipmentSpec};
    use crate::recipe::{Mode, Step};
    use crate::sim::timeline::TimelineBuilder;

    #[test]
    fn rest_only_has_zero_demand_factor() {
        let spec = EquipmentSpec::default();
        let timeline =
            TimelineBuilder::new(&spec, EfficiencyModel::default()).build(&[Step::rest(2.0)], 1);
        let s = TimelineSummary::from_timeline(&timeline);
        assert_relative_eq!(s.total_energy_kwh, 157.2, max_relative = 1e-12);
        assert_relative_eq!(s.peak_power_kw, 78.6, max_relative = 1e-12);
        assert_eq!(s.demand_factor, 0.0);
        assert_eq!(s.demand_peak_kw, 0.0);
    }

    #[test]
    fn demand_factor_is_active_share() {
        let spec = EquipmentSpec::default();
        let recipe = vec![
            Step::rest(1.0),
            Step::cc(Mode::Charge, 3.8, 100.0).with_time_limit(1.0),
        ];
        let timeline = TimelineBuilder::new(&spec, EfficiencyModel::default()).build(&recipe, 2);
        let s = TimelineSummary::from_timeline(&timeline);
        assert_relative_eq!(s.total_hours, 4.0, max_relative = 1e-12);
        assert_relative_eq!(s.demand_factor, 0.5, max_relative = 1e-12);
        assert_relative_eq!(s.demand_peak_kw, s.peak_power_kw * 0.5, max_relative = 1e-12);
        assert_eq!(s.cycles, 2);
        assert_eq!(s.skipped_steps, 0);
    }

    #[test]
    fn empty_timeline_summary_is_zero() {
        let spec = EquipmentSpec::default();
        let timeline = TimelineBuilder::new(&spec, EfficiencyModel::default()).build(&[], 1);
        let s = TimelineSummary::from_timeline(&timeline);
        assert_eq!(s.total_hours, 0.0);
        assert_eq!(s.peak_power_kw, 0.0);
        assert!(!s.to_string().is_empty());
    }

    #[test]
    fn peak_ignores_steps_on_a_full_cell() {
        let spec = EquipmentSpec::default();
        let recipe = vec![
            Step::cc(Mode::Charge, 3.8, 100.0),
            Step::cc(Mode::Charge, 4.2, 300.0),
        ];
        let timeline = TimelineBuilder::new(&spec, EfficiencyModel::default()).build(&recipe, 1);
        let s = TimelineSummary::from_timeline(&timeline);

        assert_eq!(timeline.results()[1].actual_time_hours, 0.0);
        assert_eq!(s.peak_power_kw, timeline.results()[0].power_kw);

        let profile = crate::sim::superposition::combine(std::slice::from_ref(&timeline));
        assert_eq!(s.peak_power_kw, profile.individual_peaks_kw()[0]);
    }
}
