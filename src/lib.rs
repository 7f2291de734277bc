//! Power and energy simulator for battery cycler test recipes.
//!
//! A recipe is a list of Rest/Charge/Discharge steps. Running it against an
//! [`equipment::EquipmentSpec`] yields a [`sim::Timeline`] of per-step time,
//! efficiency, facility power, energy and state of charge. Several timelines
//! combine into a facility power profile for peak-demand analysis.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
/// Equipment spec, efficiency tables and facility power aggregation.
pub mod equipment;
pub mod io;
/// Recipe steps and input validation.
pub mod recipe;
/// Step simulation, timelines, superposition and reporting.
pub mod sim;
