/// Parallel simulation of several recipes.
pub mod batch;
/// Per-step time resolution.
pub mod step;
/// Post-hoc timeline totals.
pub mod summary;
/// Multi-timeline power superposition and peak analysis.
pub mod superposition;
pub mod timeline;
pub mod types;

pub use batch::{BatchOutput, RecipeRun, simulate_all};
pub use step::StepSimulator;
pub use summary::TimelineSummary;
pub use superposition::{CombinedProfile, ProfilePoint, ProfileSummary, combine};
pub use timeline::{Timeline, TimelineBuilder};
pub use types::{SimulationState, StepResult};
