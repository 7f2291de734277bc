//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use cycler_sim::equipment::{EfficiencyModel, EfficiencyStrategy, EquipmentSpec};
use cycler_sim::recipe::{CccvDetail, CpDetail, Mode, Step};
use cycler_sim::sim::RecipeRun;

/// Reference floor: 211.10 Ah cells, 300 A units, 16 of 800 channels per unit, 1572 W standby.
pub fn reference_spec() -> EquipmentSpec {
    EquipmentSpec::default()
}

/// Reference floor on 600 A equipment (scaling factor 2.0).
pub fn high_current_spec() -> EquipmentSpec {
    EquipmentSpec {
        current_range_label: "120A - 600A".to_string(),
        ..EquipmentSpec::default()
    }
}

/// Both efficiency strategies.
pub fn models() -> [EfficiencyModel; 2] {
    [
        EfficiencyModel::new(EfficiencyStrategy::Scattered),
        EfficiencyModel::new(EfficiencyStrategy::Grid),
    ]
}

/// Default CCCV tail (4.2 V, 10 A cutoff, 80 % transition).
pub fn default_cccv() -> CccvDetail {
    CccvDetail {
        cv_voltage: 4.2,
        cutoff_current: 10.0,
        transition_percent: 80.0,
    }
}

/// Rest, CC charge, rest, CC discharge.
pub fn cc_formation() -> Vec<Step> {
    vec![
        Step::rest(1.0),
        Step::cc(Mode::Charge, 3.8, 100.0),
        Step::rest(0.5),
        Step::cc(Mode::Discharge, 3.6, 100.0),
    ]
}

/// Rest, CCCV charge, CP discharge down a 4.2 V to 3.0 V ramp.
pub fn cccv_formation() -> Vec<Step> {
    vec![
        Step::rest(0.5),
        Step::cccv(3.8, 100.0, default_cccv()),
        Step::cp(Mode::Discharge, 3.6, 300.0).with_cp_detail(CpDetail {
            start_voltage: None,
            end_voltage: 3.0,
        }),
    ]
}

/// Partial charges and discharges that push against both SoC bounds.
pub fn sawtooth() -> Vec<Step> {
    vec![
        Step::cc(Mode::Discharge, 3.6, 50.0),
        Step::cc(Mode::Charge, 3.8, 150.0).with_time_limit(1.0),
        Step::cc(Mode::Charge, 3.8, 200.0),
        Step::cc(Mode::Charge, 3.8, 60.0),
        Step::cc(Mode::Discharge, 3.6, 120.0).with_time_limit(0.75),
        Step::cp(Mode::Discharge, 3.5, 700.0),
        Step::cccv(3.8, 80.0, default_cccv()),
    ]
}

/// A named run on the reference floor.
pub fn run(name: &str, steps: Vec<Step>, repetitions: usize) -> RecipeRun {
    RecipeRun {
        name: name.to_string(),
        steps,
        repetitions,
        equipment: reference_spec(),
    }
}
