//! Read-only REST API over a finished simulation run.
//!
//! Provides three GET endpoints:
//! - `/state`: per-recipe totals and the combined peak summary
//! - `/timeline/{name}`: step records of one recipe, optionally a single cycle
//! - `/profile`: combined profile breakpoints with optional time window

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::sim::summary::TimelineSummary;
use crate::sim::superposition::{CombinedProfile, ProfileSummary};
use crate::sim::timeline::Timeline;
use crate::sim::{BatchOutput, RecipeRun};

/// One simulated recipe as exposed by the API.
pub struct RecipeEntry {
    pub name: String,
    pub timeline: Timeline,
    pub summary: TimelineSummary,
}

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the simulation run completes and wrapped in
/// `Arc`; no locks needed since all data is read-only.
pub struct AppState {
    /// Simulated recipes in scenario order.
    pub recipes: Vec<RecipeEntry>,
    /// Superposition of every recipe.
    pub profile: CombinedProfile,
    /// Peak figures of the combined profile.
    pub profile_summary: ProfileSummary,
}

impl AppState {
    /// Pairs each run with its timeline.
    ///
    /// `batch.timelines` must be in the same order as `runs`.
    pub fn new(runs: &[RecipeRun], batch: BatchOutput, peak_after_hours: f64) -> Self {
        let profile_summary = batch.profile.summary(peak_after_hours);
        let recipes = runs
            .iter()
            .zip(batch.timelines)
            .map(|(run, timeline)| RecipeEntry {
                name: run.name.clone(),
                summary: TimelineSummary::from_timeline(&timeline),
                timeline,
            })
            .collect();
        Self {
            recipes,
            profile: batch.profile,
            profile_summary,
        }
    }

    fn recipe(&self, name: &str) -> Option<&RecipeEntry> {
        self.recipes.iter().find(|r| r.name == name)
    }
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/timeline/{name}", get(handlers::get_timeline))
        .route("/profile", get(handlers::get_profile))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
