//! TOML-based scenario configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::equipment::{EfficiencyModel, EfficiencyStrategy, EquipmentSpec};
use crate::recipe::{CccvDetail, CpDetail, Mode, Step, StepDetail, TestType, validate_recipe};
use crate::sim::RecipeRun;
use crate::sim::superposition::DEFAULT_PEAK_AFTER_HOURS;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Global simulation parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Equipment shared by every recipe without its own override.
    #[serde(default)]
    pub equipment: EquipmentConfig,
    /// Recipes to simulate side by side.
    #[serde(default, rename = "recipe")]
    pub recipes: Vec<RecipeConfig>,
}

/// Global simulation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Warm-up horizon excluded from the post-warm-up peak (h, >= 0).
    pub peak_after_hours: f64,
    /// Efficiency interpolation: `"scattered"` or `"grid"`.
    pub efficiency_model: EfficiencyStrategy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            peak_after_hours: DEFAULT_PEAK_AFTER_HOURS,
            efficiency_model: EfficiencyStrategy::Scattered,
        }
    }
}

/// Cell and cycler parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EquipmentConfig {
    /// Nominal cell capacity (Ah).
    pub cell_capacity_ah: f64,
    /// Current range label, e.g. `"60A - 300A"`.
    pub current_range: String,
    /// Channels per equipment unit.
    pub control_channels: u32,
    /// Channels under test.
    pub test_channels: u32,
    /// Standby draw per unit (W).
    pub standby_power_w: f64,
    /// One-way cable length (m).
    pub cable_length_m: f64,
    /// Cable cross-section (mm²).
    pub cable_area_mm2: f64,
}

impl Default for EquipmentConfig {
    fn default() -> Self {
        let spec = EquipmentSpec::default();
        Self {
            cell_capacity_ah: spec.cell_capacity_ah,
            current_range: spec.current_range_label,
            control_channels: spec.control_channels,
            test_channels: spec.test_channels,
            standby_power_w: spec.standby_power_w,
            cable_length_m: spec.cable_length_m,
            cable_area_mm2: spec.cable_area_mm2,
        }
    }
}

impl EquipmentConfig {
    pub fn to_spec(&self) -> EquipmentSpec {
        EquipmentSpec {
            cell_capacity_ah: self.cell_capacity_ah,
            current_range_label: self.current_range.clone(),
            control_channels: self.control_channels,
            test_channels: self.test_channels,
            standby_power_w: self.standby_power_w,
            cable_length_m: self.cable_length_m,
            cable_area_mm2: self.cable_area_mm2,
        }
    }

    fn validate(&self, prefix: &str, errors: &mut Vec<ConfigError>) {
        let positive = [
            ("cell_capacity_ah", self.cell_capacity_ah),
            ("cable_length_m", self.cable_length_m),
            ("cable_area_mm2", self.cable_area_mm2),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                errors.push(ConfigError::new(
                    format!("{prefix}.{name}"),
                    "must be a finite value > 0",
                ));
            }
        }
        if self.control_channels == 0 {
            errors.push(ConfigError::new(format!("{prefix}.control_channels"), "must be > 0"));
        }
        if self.test_channels == 0 {
            errors.push(ConfigError::new(format!("{prefix}.test_channels"), "must be > 0"));
        }
        if !self.standby_power_w.is_finite() || self.standby_power_w < 0.0 {
            errors.push(ConfigError::new(
                format!("{prefix}.standby_power_w"),
                "must be a finite value >= 0",
            ));
        }
    }
}

/// One named recipe.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeConfig {
    /// Unique recipe name.
    pub name: String,
    /// Number of back-to-back cycles (>= 1).
    #[serde(default = "default_repetitions")]
    pub repetitions: usize,
    /// Equipment override for this recipe.
    #[serde(default)]
    pub equipment: Option<EquipmentConfig>,
    /// Steps of one cycle.
    #[serde(default, rename = "step")]
    pub steps: Vec<StepConfig>,
}

fn default_repetitions() -> usize {
    1
}

/// One recipe step as written in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    pub mode: Mode,
    #[serde(default)]
    pub test_type: TestType,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub time_limit_hours: Option<f64>,
    /// CP voltage ramp.
    #[serde(default)]
    pub cp: Option<CpDetail>,
    /// CCCV tail settings.
    #[serde(default)]
    pub cccv: Option<CccvDetail>,
}

impl StepConfig {
    pub fn to_step(&self) -> Step {
        let detail = match (self.cp, self.cccv) {
            (Some(cp), _) => Some(StepDetail::Cp(cp)),
            (None, Some(cccv)) => Some(StepDetail::Cccv(cccv)),
            (None, None) => None,
        };
        Step {
            mode: self.mode,
            test_type: self.test_type,
            voltage: self.voltage,
            current: self.current,
            power: self.power,
            time_limit_hours: self.time_limit_hours,
            detail,
        }
    }
}

impl From<&Step> for StepConfig {
    fn from(step: &Step) -> Self {
        Self {
            mode: step.mode,
            test_type: step.test_type,
            voltage: step.voltage,
            current: step.current,
            power: step.power,
            time_limit_hours: step.time_limit_hours,
            cp: step.cp_detail().copied(),
            cccv: step.cccv_detail().copied(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"recipe[0].repetitions"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: one CC formation recipe on the reference floor.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            equipment: EquipmentConfig::default(),
            recipes: vec![RecipeConfig {
                name: "cc_formation".to_string(),
                repetitions: 1,
                equipment: None,
                steps: steps(&[
                    Step::rest(1.0),
                    Step::cc(Mode::Charge, 3.8, 100.0),
                    Step::rest(0.5),
                    Step::cc(Mode::Discharge, 3.6, 100.0),
                ]),
            }],
        }
    }

    /// Returns the CCCV formation preset: CCCV charge, CP discharge, three cycles.
    pub fn cccv_formation() -> Self {
        Self {
            recipes: vec![RecipeConfig {
                name: "cccv_formation".to_string(),
                repetitions: 3,
                equipment: None,
                steps: steps(&[
                    Step::rest(0.5),
                    Step::cccv(
                        3.8,
                        100.0,
                        CccvDetail {
                            cv_voltage: 4.2,
                            cutoff_current: 10.0,
                            transition_percent: 80.0,
                        },
                    ),
                    Step::rest(1.0),
                    Step::cp(Mode::Discharge, 3.6, 300.0).with_cp_detail(CpDetail {
                        start_voltage: None,
                        end_voltage: 3.0,
                    }),
                ]),
            }],
            ..Self::baseline()
        }
    }

    /// Returns the mixed-floor preset: two lines on different equipment,
    /// staggered so their peaks overlap after the warm-up horizon.
    pub fn mixed_floor() -> Self {
        let mut base = Self::baseline();
        base.recipes[0].repetitions = 3;
        base.recipes.push(RecipeConfig {
            name: "cp_high_current".to_string(),
            repetitions: 2,
            equipment: Some(EquipmentConfig {
                current_range: "120A - 600A".to_string(),
                test_channels: 400,
                cable_length_m: 5.0,
                ..EquipmentConfig::default()
            }),
            steps: steps(&[
                Step::rest(4.0),
                Step::cp(Mode::Charge, 3.7, 800.0).with_cp_detail(CpDetail {
                    start_voltage: Some(3.0),
                    end_voltage: 4.2,
                }),
                Step::rest(0.5),
                Step::cc(Mode::Discharge, 3.6, 200.0).with_time_limit(1.0),
            ]),
        });
        base
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "cccv_formation", "mixed_floor"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "cccv_formation" => Ok(Self::cccv_formation()),
            "mixed_floor" => Ok(Self::mixed_floor()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Efficiency model selected by `simulation.efficiency_model`.
    pub fn efficiency_model(&self) -> EfficiencyModel {
        EfficiencyModel::new(self.simulation.efficiency_model)
    }

    /// Validates all fields, including every recipe step, and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let h = self.simulation.peak_after_hours;
        if !h.is_finite() || h < 0.0 {
            errors.push(ConfigError::new(
                "simulation.peak_after_hours",
                "must be a finite value >= 0",
            ));
        }

        self.equipment.validate("equipment", &mut errors);

        if self.recipes.is_empty() {
            errors.push(ConfigError::new("recipe", "at least one recipe is required"));
        }

        let mut names = HashSet::new();
        for (i, recipe) in self.recipes.iter().enumerate() {
            let prefix = format!("recipe[{i}]");
            if recipe.name.trim().is_empty() {
                errors.push(ConfigError::new(format!("{prefix}.name"), "must not be empty"));
            } else if !names.insert(recipe.name.as_str()) {
                errors.push(ConfigError::new(
                    format!("{prefix}.name"),
                    format!("duplicate recipe name \"{}\"", recipe.name),
                ));
            }
            if recipe.repetitions == 0 {
                errors.push(ConfigError::new(format!("{prefix}.repetitions"), "must be >= 1"));
            }
            if let Some(eq) = &recipe.equipment {
                eq.validate(&format!("{prefix}.equipment"), &mut errors);
            }
            if recipe.steps.is_empty() {
                errors.push(ConfigError::new(format!("{prefix}.step"), "at least one step is required"));
            }
            for (j, step) in recipe.steps.iter().enumerate() {
                if step.cp.is_some() && step.cccv.is_some() {
                    errors.push(ConfigError::new(
                        format!("{prefix}.step[{j}]"),
                        "cp and cccv settings are mutually exclusive",
                    ));
                }
            }

            let domain: Vec<Step> = recipe.steps.iter().map(StepConfig::to_step).collect();
            for e in validate_recipe(&domain) {
                errors.push(ConfigError::new(
                    format!("{prefix}.step[{}]", e.step - 1),
                    e.kind.to_string(),
                ));
            }
        }

        errors
    }

    /// Converts the recipes into runnable domain types.
    pub fn recipe_runs(&self) -> Vec<RecipeRun> {
        self.recipes
            .iter()
            .map(|r| RecipeRun {
                name: r.name.clone(),
                steps: r.steps.iter().map(StepConfig::to_step).collect(),
                repetitions: r.repetitions,
                equipment: r.equipment.as_ref().unwrap_or(&self.equipment).to_spec(),
            })
            .collect()
    }
}

fn steps(steps: &[Step]) -> Vec<StepConfig> {
    steps.iter().map(StepConfig::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
peak_after_hours = 2.0
efficiency_model = "grid"

[equipment]
cell_capacity_ah = 100.0
current_range = "120A - 600A"
control_channels = 8
test_channels = 100
standby_power_w = 900.0
cable_length_m = 4.0
cable_area_mm2 = 95.0

[[recipe]]
name = "cccv"
repetitions = 2

[[recipe.step]]
mode = "Rest"
time_limit_hours = 0.5

[[recipe.step]]
mode = "Charge"
test_type = "CCCV"
voltage = 3.8
current = 100.0
cccv = { cv_voltage = 4.2, cutoff_current = 10.0, transition_percent = 80.0 }

[[recipe.step]]
mode = "Discharge"
test_type = "CP"
power = 300.0
cp = { end_voltage = 3.0 }
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.unwrap();
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
        assert_eq!(cfg.simulation.efficiency_model, EfficiencyStrategy::Grid);
        assert_eq!(cfg.recipes[0].steps.len(), 3);

        let runs = cfg.recipe_runs();
        assert_eq!(runs[0].repetitions, 2);
        assert_eq!(runs[0].equipment.control_channels, 8);
        assert!(runs[0].steps[1].cccv_detail().is_some());
        assert!(runs[0].steps[2].cp_detail().is_some());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
peak_after_hours = 5.0
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_efficiency_model_is_rejected() {
        let toml = r#"
[simulation]
efficiency_model = "cubic"
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[equipment]
test_channels = 64
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.equipment.test_channels, 64);
        assert_eq!(cfg.equipment.control_channels, 16);
        assert_eq!(cfg.simulation.peak_after_hours, 5.0);
        assert_eq!(cfg.simulation.efficiency_model, EfficiencyStrategy::Scattered);
    }

    #[test]
    fn validation_reports_step_errors_with_path() {
        let toml = r#"
[[recipe]]
name = "broken"

[[recipe.step]]
mode = "Charge"
test_type = "CC"
voltage = 3.8
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "recipe[0].step[0]");
        assert!(errors[0].message.contains("current"));
    }

    #[test]
    fn validation_catches_equipment_and_recipe_fields() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.equipment.control_channels = 0;
        cfg.equipment.cell_capacity_ah = -1.0;
        cfg.recipes[0].repetitions = 0;
        cfg.recipes.push(cfg.recipes[0].clone());
        let errors = cfg.validate();
        for field in [
            "equipment.control_channels",
            "equipment.cell_capacity_ah",
            "recipe[0].repetitions",
            "recipe[1].name",
        ] {
            assert!(errors.iter().any(|e| e.field == field), "missing {field}: {errors:?}");
        }
    }

    #[test]
    fn empty_scenario_needs_a_recipe() {
        let cfg = ScenarioConfig::from_toml_str("").unwrap();
        assert!(cfg.validate().iter().any(|e| e.field == "recipe"));
    }

    #[test]
    fn recipe_override_replaces_shared_equipment() {
        let cfg = ScenarioConfig::mixed_floor();
        let runs = cfg.recipe_runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].equipment.test_channels, 800);
        assert_eq!(runs[1].equipment.test_channels, 400);
        assert_eq!(runs[1].equipment.scaling_factor(), 2.0);
    }

    #[test]
    fn non_finite_values_fail_validation() {
        let toml = r#"
[equipment]
cable_length_m = inf

[[recipe]]
name = "nan"

[[recipe.step]]
mode = "Charge"
test_type = "CC"
voltage = nan
current = 100.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"equipment.cable_length_m".to_string()), "{fields:?}");
        assert!(fields.contains(&"recipe[0].step[0]".to_string()), "{fields:?}");
    }
}

