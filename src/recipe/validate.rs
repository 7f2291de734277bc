//! Input-boundary validation of recipe steps.
//!
//! The simulator never fails on a malformed step; it zero-fills the result
//! instead. Callers run [`validate_recipe`] first and refuse to simulate when
//! it reports anything.

use thiserror::Error;

use super::types::{Mode, Step, TestType};

/// What is wrong with a single step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepErrorKind {
    #[error("{test_type} steps require `{field}`")]
    MissingField {
        test_type: TestType,
        field: &'static str,
    },
    #[error("{test_type} steps must leave `{field}` empty")]
    ConflictingField {
        test_type: TestType,
        field: &'static str,
    },
    #[error("Rest steps carry no electrical fields, found `{field}`")]
    RestWithElectricalField { field: &'static str },
    #[error("{mode} steps need a test type (CC, CP or CCCV)")]
    MissingTestType { mode: Mode },
    #[error("CCCV is only valid for Charge steps, found {mode}")]
    CccvOutsideCharge { mode: Mode },
    #[error("`{field}` must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },
    #[error("`{field}` must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("CCCV transition_percent must be within 1–99, got {0}")]
    TransitionOutOfRange(f64),
    #[error("CCCV cutoff current ({cutoff}) must not exceed the CC current ({current})")]
    CutoffAboveCurrent { cutoff: f64, current: f64 },
    #[error("{test_type} steps cannot carry {detail} settings")]
    MismatchedDetail {
        test_type: TestType,
        detail: &'static str,
    },
}

/// A validation failure tied to a 1-based step number.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("step {step}: {kind}")]
pub struct StepConfigError {
    pub step: usize,
    pub kind: StepErrorKind,
}

/// Validates every step and returns all problems found.
///
/// Returns an empty vector when the recipe can be simulated as written.
pub fn validate_recipe(steps: &[Step]) -> Vec<StepConfigError> {
    steps
        .iter()
        .enumerate()
        .flat_map(|(i, step)| {
            validate_step(step)
                .into_iter()
                .map(move |kind| StepConfigError { step: i + 1, kind })
        })
        .collect()
}

/// Validates a single step.
pub fn validate_step(step: &Step) -> Vec<StepErrorKind> {
    let mut errors = Vec::new();

    let cp = step.cp_detail();
    let cccv = step.cccv_detail();
    for (field, value) in [
        ("voltage", step.voltage),
        ("current", step.current),
        ("power", step.power),
        ("time_limit_hours", step.time_limit_hours),
        ("cp.start_voltage", cp.and_then(|d| d.start_voltage)),
        ("cp.end_voltage", cp.map(|d| d.end_voltage)),
        ("cccv.cv_voltage", cccv.map(|d| d.cv_voltage)),
        ("cccv.cutoff_current", cccv.map(|d| d.cutoff_current)),
    ] {
        match value {
            Some(v) if !v.is_finite() => {
                errors.push(StepErrorKind::NotFinite { field, value: v });
            }
            Some(v) if v < 0.0 => errors.push(StepErrorKind::Negative { field, value: v }),
            _ => {}
        }
    }

    if step.mode == Mode::Rest {
        for (field, present) in [
            ("voltage", step.voltage.is_some()),
            ("current", step.current.is_some()),
            ("power", step.power.is_some()),
            ("detail", step.detail.is_some()),
        ] {
            if present {
                errors.push(StepErrorKind::RestWithElectricalField { field });
            }
        }
        return errors;
    }

    let tt = step.test_type;
    match tt {
        TestType::None => errors.push(StepErrorKind::MissingTestType { mode: step.mode }),
        TestType::Cc => {
            require(&mut errors, tt, "current", step.current.is_some());
            require(&mut errors, tt, "voltage", step.voltage.is_some());
            if step.power.is_some() {
                errors.push(StepErrorKind::ConflictingField {
                    test_type: tt,
                    field: "power",
                });
            }
            if step.detail.is_some() {
                errors.push(StepErrorKind::MismatchedDetail {
                    test_type: tt,
                    detail: "advanced",
                });
            }
        }
        TestType::Cp => {
            require(&mut errors, tt, "power", step.power.is_some());
            // Voltage comes from the ramp, from power/current, or from the row itself.
            let has_voltage_source = step.voltage.is_some()
                || step.current.is_some_and(|c| c > 0.0)
                || step.cp_detail().is_some();
            require(&mut errors, tt, "voltage", has_voltage_source);
            if step.cccv_detail().is_some() {
                errors.push(StepErrorKind::MismatchedDetail {
                    test_type: tt,
                    detail: "CCCV",
                });
            }
        }
        TestType::Cccv => {
            if step.mode != Mode::Charge {
                errors.push(StepErrorKind::CccvOutsideCharge { mode: step.mode });
            }
            require(&mut errors, tt, "current", step.current.is_some());
            if step.power.is_some() {
                errors.push(StepErrorKind::ConflictingField {
                    test_type: tt,
                    field: "power",
                });
            }
            if step.cp_detail().is_some() {
                errors.push(StepErrorKind::MismatchedDetail {
                    test_type: tt,
                    detail: "CP",
                });
            }
            match step.cccv_detail() {
                None => errors.push(StepErrorKind::MissingField {
                    test_type: tt,
                    field: "cccv",
                }),
                Some(d) => {
                    if !(1.0..=99.0).contains(&d.transition_percent) {
                        errors.push(StepErrorKind::TransitionOutOfRange(d.transition_percent));
                    }
                    if let Some(current) = step.current
                        && d.cutoff_current > current
                    {
                        errors.push(StepErrorKind::CutoffAboveCurrent {
                            cutoff: d.cutoff_current,
                            current,
                        });
                    }
                }
            }
        }
    }

    errors
}

fn require(errors: &mut Vec<StepErrorKind>, test_type: TestType, field: &'static str, ok: bool) {
    if !ok {
        errors.push(StepErrorKind::MissingField { test_type, field });
    }
}
