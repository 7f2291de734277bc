//! Conversion efficiency of a cycler channel.
//!
//! The measured tables describe the 300 A reference cycler on a 3 m / 150 mm²
//! cable. Other equipment is mapped onto them by scaling the current with
//! the rated-current ratio, then correcting for the actual cable resistance.

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::interpolate::{EfficiencyLookup, GridTable, ScatteredTable};
use super::spec::EquipmentSpec;
use super::table::MeasuredTable;
use crate::recipe::Mode;

/// Resistivity of copper (Ω·m).
pub const COPPER_RESISTIVITY: f64 = 1.72e-8;
/// Cable length the reference tables were measured with (m).
pub const REFERENCE_CABLE_LENGTH_M: f64 = 3.0;
/// Cable cross-section the reference tables were measured with (mm²).
pub const REFERENCE_CABLE_AREA_MM2: f64 = 150.0;
/// Reported when discharge cable losses exceed the reference model's range.
pub const OUT_OF_RANGE_EFFICIENCY: f64 = -1.0;

static SCATTERED_CHARGE: LazyLock<Option<ScatteredTable>> =
    LazyLock::new(|| MeasuredTable::for_mode(Mode::Charge).map(|t| ScatteredTable::from_measured(&t)));
static SCATTERED_DISCHARGE: LazyLock<Option<ScatteredTable>> = LazyLock::new(|| {
    MeasuredTable::for_mode(Mode::Discharge).map(|t| ScatteredTable::from_measured(&t))
});
static GRID_CHARGE: LazyLock<Option<GridTable>> =
    LazyLock::new(|| MeasuredTable::for_mode(Mode::Charge).map(GridTable::new));
static GRID_DISCHARGE: LazyLock<Option<GridTable>> =
    LazyLock::new(|| MeasuredTable::for_mode(Mode::Discharge).map(GridTable::new));

/// Interpolation strategy over the measured tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyStrategy {
    /// Delaunay-based piecewise-linear interpolation with nearest fallback.
    #[default]
    Scattered,
    /// Bilinear interpolation on the breakpoint grid.
    Grid,
}

impl fmt::Display for EfficiencyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scattered => write!(f, "scattered"),
            Self::Grid => write!(f, "grid"),
        }
    }
}

/// Round-trip resistance of a copper cable pair (Ω).
///
/// Returns `0.0` for a non-positive cross-section.
pub fn cable_resistance(length_m: f64, area_mm2: f64) -> f64 {
    if area_mm2 <= 0.0 {
        return 0.0;
    }
    COPPER_RESISTIVITY * (2.0 * length_m) / (area_mm2 * 1e-6)
}

/// Efficiency model bound to one interpolation strategy.
///
/// Cheap to copy; the underlying tables are built once per process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EfficiencyModel {
    strategy: EfficiencyStrategy,
}

impl EfficiencyModel {
    pub fn new(strategy: EfficiencyStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> EfficiencyStrategy {
        self.strategy
    }

    fn table(&self, mode: Mode) -> Option<&'static dyn EfficiencyLookup> {
        match (self.strategy, mode) {
            (_, Mode::Rest) => None,
            (EfficiencyStrategy::Scattered, Mode::Charge) => SCATTERED_CHARGE
                .as_ref()
                .map(|t| t as &dyn EfficiencyLookup),
            (EfficiencyStrategy::Scattered, Mode::Discharge) => SCATTERED_DISCHARGE
                .as_ref()
                .map(|t| t as &dyn EfficiencyLookup),
            (EfficiencyStrategy::Grid, Mode::Charge) => {
                GRID_CHARGE.as_ref().map(|t| t as &dyn EfficiencyLookup)
            }
            (EfficiencyStrategy::Grid, Mode::Discharge) => {
                GRID_DISCHARGE.as_ref().map(|t| t as &dyn EfficiencyLookup)
            }
        }
    }

    /// Efficiency fraction at an operating point.
    ///
    /// # Arguments
    ///
    /// * `mode` - Rest always yields `1.0`
    /// * `voltage` - Cell-side voltage (V)
    /// * `current` - Cell-side current (A); the sign is ignored
    /// * `spec` - Supplies the rated-current scaling and cable geometry
    ///
    /// Charge results lie in `[0, 1]`. Discharge results are capped at `1.0`
    /// and may be negative; [`OUT_OF_RANGE_EFFICIENCY`] is returned when the
    /// reference cable drop exceeds the voltage.
    pub fn efficiency(&self, mode: Mode, voltage: f64, current: f64, spec: &EquipmentSpec) -> f64 {
        let Some(table) = self.table(mode) else {
            return 1.0;
        };

        let current = current.abs();
        let equivalent_current = current / spec.scaling_factor();
        let eta_table = table.lookup(equivalent_current, voltage);

        let mut eta = eta_table;
        if voltage > 0.0 && current > 0.0 {
            let r_ref = cable_resistance(REFERENCE_CABLE_LENGTH_M, REFERENCE_CABLE_AREA_MM2);
            let r_new = cable_resistance(spec.cable_length_m, spec.cable_area_mm2);
            match mode {
                Mode::Charge => {
                    let intrinsic = eta_table * (1.0 + equivalent_current * r_ref / voltage);
                    eta = intrinsic / (1.0 + current * r_new / voltage);
                }
                Mode::Discharge => {
                    let denominator = 1.0 - equivalent_current * r_ref / voltage;
                    if denominator <= 0.0 {
                        tracing::warn!(
                            voltage,
                            current,
                            "discharge operating point outside the cable model, reporting sentinel efficiency"
                        );
                        return OUT_OF_RANGE_EFFICIENCY;
                    }
                    eta = eta_table / denominator * (1.0 - current * r_new / voltage);
                }
                Mode::Rest => {}
            }
        }

        match mode {
            Mode::Charge => eta.clamp(0.0, 1.0),
            _ => eta.min(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn models() -> [EfficiencyModel; 2] {
        [
            EfficiencyModel::new(EfficiencyStrategy::Scattered),
            EfficiencyModel::new(EfficiencyStrategy::Grid),
        ]
    }

    #[test]
    fn rest_is_lossless() {
        for model in models() {
            assert_eq!(model.efficiency(Mode::Rest, 3.7, 100.0, &EquipmentSpec::default()), 1.0);
        }
    }

    #[test]
    fn reference_equipment_reproduces_table() {
        let spec = EquipmentSpec::default();
        for model in models() {
            assert_relative_eq!(
                model.efficiency(Mode::Charge, 4.2, 100.0, &spec),
                0.8490,
                max_relative = 1e-9
            );
            assert_relative_eq!(
                model.efficiency(Mode::Discharge, 3.3, 150.0, &spec),
                0.8075,
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn scaled_equipment_uses_equivalent_current() {
        let big = EquipmentSpec {
            current_range_label: "120A - 600A".to_string(),
            ..EquipmentSpec::default()
        };
        let model = EfficiencyModel::new(EfficiencyStrategy::Grid);
        let raw = GRID_CHARGE.as_ref().unwrap().lookup(100.0, 4.2);
        let r = cable_resistance(3.0, 150.0);
        let expected = raw * (1.0 + 100.0 * r / 4.2) / (1.0 + 200.0 * r / 4.2);
        assert_relative_eq!(
            model.efficiency(Mode::Charge, 4.2, 200.0, &big),
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn longer_cable_lowers_charge_efficiency() {
        let long = EquipmentSpec {
            cable_length_m: 10.0,
            ..EquipmentSpec::default()
        };
        let model = EfficiencyModel::default();
        let reference = model.efficiency(Mode::Charge, 3.8, 200.0, &EquipmentSpec::default());
        assert!(model.efficiency(Mode::Charge, 3.8, 200.0, &long) < reference);
    }

    #[test]
    fn discharge_sentinel_when_reference_drop_exceeds_voltage() {
        let model = EfficiencyModel::default();
        // A tiny voltage makes I·R_ref/V exceed one.
        let eta = model.efficiency(Mode::Discharge, 0.001, 300.0, &EquipmentSpec::default());
        assert_eq!(eta, OUT_OF_RANGE_EFFICIENCY);
    }

    #[test]
    fn low_current_discharge_may_be_negative() {
        let model = EfficiencyModel::new(EfficiencyStrategy::Grid);
        let eta = model.efficiency(Mode::Discharge, 3.3, 10.0, &EquipmentSpec::default());
        assert!(eta < 0.0);
    }

    #[test]
    fn out_of_domain_inputs_are_clamped() {
        let spec = EquipmentSpec::default();
        for model in models() {
            let low = model.efficiency(Mode::Charge, 2.0, 5.0, &spec);
            assert!((0.0..=1.0).contains(&low));
            let high = model.efficiency(Mode::Charge, 6.0, 900.0, &spec);
            assert!((0.0..=1.0).contains(&high));
        }
    }

    #[test]
    fn cable_resistance_reference_value() {
        assert_relative_eq!(cable_resistance(3.0, 150.0), 6.88e-4, max_relative = 1e-12);
        assert_eq!(cable_resistance(3.0, 0.0), 0.0);
    }
}
