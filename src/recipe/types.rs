//! Recipe step types shared by validation, simulation and import.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating mode of a recipe step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Rest,
    Charge,
    Discharge,
}

impl Mode {
    /// Returns `true` for modes that draw or return power through the channels.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Charge | Self::Discharge)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rest => "Rest",
            Self::Charge => "Charge",
            Self::Discharge => "Discharge",
        })
    }
}

/// Control scheme of a Charge/Discharge step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    /// Constant current.
    #[serde(rename = "CC")]
    Cc,
    /// Constant power.
    #[serde(rename = "CP")]
    Cp,
    /// Constant current followed by constant voltage (Charge only).
    #[serde(rename = "CCCV")]
    Cccv,
    /// No control scheme (Rest steps).
    #[default]
    #[serde(rename = "None", alias = "-")]
    None,
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cc => "CC",
            Self::Cp => "CP",
            Self::Cccv => "CCCV",
            Self::None => "-",
        })
    }
}

/// Voltage ramp of a constant-power step.
///
/// The step runs at the average of the two bounds instead of its single
/// declared voltage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CpDetail {
    /// Ramp start voltage (V). Defaults per mode when absent.
    #[serde(default)]
    pub start_voltage: Option<f64>,
    /// Ramp end voltage (V).
    pub end_voltage: f64,
}

impl CpDetail {
    /// Start voltage used when none is given: 2.7 V when charging, 4.2 V when discharging.
    pub fn default_start_voltage(mode: Mode) -> f64 {
        match mode {
            Mode::Discharge => 4.2,
            _ => 2.7,
        }
    }

    /// Average operating voltage of the ramp, or `None` if neither bound is usable.
    pub fn average_voltage(&self, mode: Mode) -> Option<f64> {
        let given_start = self.start_voltage.filter(|v| *v > 0.0);
        let start = given_start.unwrap_or_else(|| Self::default_start_voltage(mode));
        if self.end_voltage > 0.0 {
            Some((start + self.end_voltage) / 2.0)
        } else {
            given_start
        }
    }
}

/// Constant-voltage tail of a CCCV charge step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CccvDetail {
    /// Constant-voltage setpoint (V).
    pub cv_voltage: f64,
    /// Current at which the CV phase terminates (A).
    pub cutoff_current: f64,
    /// Share of the chargeable capacity delivered in the CC phase (1–99 %).
    pub transition_percent: f64,
}

/// Advanced settings attached to a single step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDetail {
    Cp(CpDetail),
    Cccv(CccvDetail),
}

/// One row of a test recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub mode: Mode,
    pub test_type: TestType,
    /// Declared terminal voltage (V).
    pub voltage: Option<f64>,
    /// Declared current magnitude (A).
    pub current: Option<f64>,
    /// Declared power per channel (W).
    pub power: Option<f64>,
    /// Optional time limit (h). Non-positive values mean "no limit".
    pub time_limit_hours: Option<f64>,
    /// Sidecar settings for CP and CCCV steps.
    pub detail: Option<StepDetail>,
}

impl Step {
    /// A rest step of the given duration.
    pub fn rest(hours: f64) -> Self {
        Self {
            mode: Mode::Rest,
            test_type: TestType::None,
            voltage: None,
            current: None,
            power: None,
            time_limit_hours: Some(hours),
            detail: None,
        }
    }

    /// A constant-current step.
    pub fn cc(mode: Mode, voltage: f64, current: f64) -> Self {
        Self {
            mode,
            test_type: TestType::Cc,
            voltage: Some(voltage),
            current: Some(current),
            power: None,
            time_limit_hours: None,
            detail: None,
        }
    }

    /// A constant-power step.
    pub fn cp(mode: Mode, voltage: f64, power: f64) -> Self {
        Self {
            mode,
            test_type: TestType::Cp,
            voltage: Some(voltage),
            current: None,
            power: Some(power),
            time_limit_hours: None,
            detail: None,
        }
    }

    /// A CCCV charge step.
    pub fn cccv(voltage: f64, current: f64, detail: CccvDetail) -> Self {
        Self {
            mode: Mode::Charge,
            test_type: TestType::Cccv,
            voltage: Some(voltage),
            current: Some(current),
            power: None,
            time_limit_hours: None,
            detail: Some(StepDetail::Cccv(detail)),
        }
    }

    /// Sets the time limit.
    pub fn with_time_limit(mut self, hours: f64) -> Self {
        self.time_limit_hours = Some(hours);
        self
    }

    /// Attaches a CP voltage ramp.
    pub fn with_cp_detail(mut self, detail: CpDetail) -> Self {
        self.detail = Some(StepDetail::Cp(detail));
        self
    }

    /// Time limit if one is set and positive.
    pub fn effective_time_limit(&self) -> Option<f64> {
        self.time_limit_hours.filter(|h| *h > 0.0)
    }

    pub fn cp_detail(&self) -> Option<&CpDetail> {
        match &self.detail {
            Some(StepDetail::Cp(d)) => Some(d),
            _ => None,
        }
    }

    pub fn cccv_detail(&self) -> Option<&CccvDetail> {
        match &self.detail {
            Some(StepDetail::Cccv(d)) => Some(d),
            _ => None,
        }
    }
}

/// An ordered list of steps executed as one cycle.
pub type Recipe = Vec<Step>;
