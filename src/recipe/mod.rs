//! Test recipes: step definitions and input validation.

pub mod types;
pub mod validate;

pub use types::{CccvDetail, CpDetail, Mode, Recipe, Step, StepDetail, TestType};
pub use validate::{StepConfigError, StepErrorKind, validate_recipe};
