//! Cycler equipment: spec, efficiency model and power aggregation.

pub mod aggregator;
pub mod efficiency;
pub mod interpolate;
pub mod spec;
pub mod table;

pub use aggregator::{aggregate, facility_power_w};
pub use efficiency::{EfficiencyModel, EfficiencyStrategy, OUT_OF_RANGE_EFFICIENCY, cable_resistance};
pub use interpolate::{EfficiencyLookup, GridTable, ScatteredTable};
pub use spec::EquipmentSpec;
pub use table::MeasuredTable;
