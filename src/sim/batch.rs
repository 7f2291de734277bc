//! Parallel simulation of independent recipes.

use rayon::prelude::*;
use serde::Serialize;

use crate::equipment::{EfficiencyModel, EquipmentSpec};
use crate::recipe::Step;

use super::superposition::{CombinedProfile, combine};
use super::timeline::{Timeline, TimelineBuilder};

/// A named recipe with its own equipment and repetition count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeRun {
    pub name: String,
    pub steps: Vec<Step>,
    pub repetitions: usize,
    pub equipment: EquipmentSpec,
}

impl RecipeRun {
    /// Builds this run's timeline.
    pub fn simulate(&self, model: EfficiencyModel) -> Timeline {
        let _span = tracing::info_span!("recipe", name = %self.name).entered();
        TimelineBuilder::new(&self.equipment, model).build(&self.steps, self.repetitions)
    }
}

/// Timelines of every run, in input order, plus their superposition.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub timelines: Vec<Timeline>,
    pub profile: CombinedProfile,
}

/// Simulates all runs in parallel and combines them.
///
/// Each run owns its own cell state, so results are identical to a
/// sequential build.
pub fn simulate_all(runs: &[RecipeRun], model: EfficiencyModel) -> BatchOutput {
    let timelines: Vec<Timeline> = runs.par_iter().map(|run| run.simulate(model)).collect();
    let profile = combine(&timelines);
    BatchOutput { timelines, profile }
}
