//! Scenario loading, presets and recipe import feeding the simulator.

mod common;

use std::path::Path;

use approx::assert_relative_eq;

use cycler_sim::config::ScenarioConfig;
use cycler_sim::equipment::EfficiencyStrategy;
use cycler_sim::io::export::{write_profile_csv, write_timelines_csv};
use cycler_sim::io::recipe_csv::import_recipe_csv;
use cycler_sim::recipe::{Mode, TestType, validate_recipe};
use cycler_sim::sim::{TimelineBuilder, simulate_all};

#[test]
fn every_preset_validates_and_runs() {
    for name in ScenarioConfig::PRESETS {
        let scenario = ScenarioConfig::from_preset(name).unwrap();
        let errors = scenario.validate();
        assert!(errors.is_empty(), "preset {name}: {errors:?}");

        let runs = scenario.recipe_runs();
        let batch = simulate_all(&runs, scenario.efficiency_model());
        for timeline in &batch.timelines {
            assert!(timeline.results().iter().all(|r| !r.skipped), "preset {name}");
            assert!(timeline.total_hours() > 0.0);
        }
        assert!(batch.profile.peak_kw() > 0.0);
    }
}

#[test]
fn mixed_floor_overrides_equipment_per_recipe() {
    let runs = ScenarioConfig::mixed_floor().recipe_runs();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].equipment.scaling_factor(), 1.0);
    assert_eq!(runs[1].equipment.scaling_factor(), 2.0);
    assert_eq!(runs[1].equipment.test_channels, 400);
}

#[test]
fn scenario_files_load_and_validate() {
    for path in ["scenarios/baseline.toml", "scenarios/staggered_floor.toml"] {
        let scenario = ScenarioConfig::from_toml_file(Path::new(path)).unwrap();
        let errors = scenario.validate();
        assert!(errors.is_empty(), "{path}: {errors:?}");
    }
}

#[test]
fn baseline_file_matches_builtin_preset() {
    let file = ScenarioConfig::from_toml_file(Path::new("scenarios/baseline.toml")).unwrap();
    let preset = ScenarioConfig::baseline();
    assert_eq!(file.recipe_runs(), preset.recipe_runs());
    assert_eq!(file.simulation.peak_after_hours, preset.simulation.peak_after_hours);
}

#[test]
fn staggered_floor_runs_on_grid_strategy() {
    let scenario =
        ScenarioConfig::from_toml_file(Path::new("scenarios/staggered_floor.toml")).unwrap();
    assert_eq!(scenario.simulation.efficiency_model, EfficiencyStrategy::Grid);

    let runs = scenario.recipe_runs();
    assert_eq!(runs[0].repetitions, 2);
    assert_eq!(runs[1].repetitions, 1);
    assert_eq!(runs[1].steps[1].test_type, TestType::Cp);
    assert!(runs[1].steps[1].cp_detail().is_some());

    let batch = simulate_all(&runs, scenario.efficiency_model());
    let summary = batch.profile.summary(scenario.simulation.peak_after_hours);
    assert!(summary.peak_after_kw.is_some());
    assert_eq!(summary.individual_peaks_kw.len(), 2);
}

#[test]
fn invalid_scenario_reports_field_paths() {
    let toml = r#"
[[recipe]]
name = "broken"
repetitions = 0

[[recipe.step]]
mode = "Charge"
test_type = "CC"
voltage = 3.8
power = 100.0
"#;
    let scenario = ScenarioConfig::from_toml_str(toml).unwrap();
    let fields: Vec<String> = scenario.validate().into_iter().map(|e| e.field).collect();
    assert!(fields.contains(&"recipe[0].repetitions".to_string()));
    assert!(fields.iter().filter(|f| *f == "recipe[0].step[0]").count() >= 2);
}

#[test]
fn imported_sheet_simulates_like_handwritten_recipe() {
    let steps = import_recipe_csv(Path::new("scenarios/formation_recipe.csv")).unwrap();
    assert_eq!(steps.len(), 5);
    assert!(validate_recipe(&steps).is_empty());
    assert_eq!(steps[4].mode, Mode::Charge);
    assert_eq!(steps[4].power, Some(400.0));

    let spec = common::reference_spec();
    let model = common::models()[0];
    let imported = TimelineBuilder::new(&spec, model).build(&steps, 1);
    let handwritten = TimelineBuilder::new(&spec, model).build(&common::cc_formation(), 1);
    for (a, b) in imported.results().iter().zip(handwritten.results()) {
        assert_eq!(a, b);
    }

    let cp = &imported.results()[4];
    assert_relative_eq!(cp.current.unwrap(), 400.0 / 3.8, max_relative = 1e-12);
    assert_relative_eq!(cp.actual_time_hours, 1.0, max_relative = 1e-12);
}

#[test]
fn exports_cover_every_step_and_breakpoint() {
    let runs = ScenarioConfig::cccv_formation().recipe_runs();
    let batch = simulate_all(&runs, common::models()[0]);

    let named: Vec<(&str, _)> = runs
        .iter()
        .map(|r| r.name.as_str())
        .zip(&batch.timelines)
        .collect();
    let mut buf = Vec::new();
    write_timelines_csv(&named, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 1 + batch.timelines[0].results().len());
    assert!(text.lines().nth(1).unwrap().starts_with("cccv_formation,1,1,Rest,"));

    let mut buf = Vec::new();
    write_profile_csv(batch.profile.points(), &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 1 + batch.profile.points().len());
    assert!(text.starts_with("time_h,power_kw"));
}
