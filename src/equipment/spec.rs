//! Equipment and cell parameters for one simulation request.

use serde::Serialize;

/// Rated current of the reference equipment the efficiency tables were measured on (A).
pub const REFERENCE_RATED_CURRENT_A: f64 = 300.0;

/// Cell and cycler parameters.
///
/// Constructed from user configuration and validated at the input boundary
/// (see [`crate::config::ScenarioConfig::validate`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentSpec {
    /// Nominal cell capacity (Ah, > 0).
    pub cell_capacity_ah: f64,
    /// Equipment current range label, e.g. `"60A - 300A"`.
    pub current_range_label: String,
    /// Channels driven by one equipment unit (> 0).
    pub control_channels: u32,
    /// Channels under test across the floor (> 0).
    pub test_channels: u32,
    /// Standby draw of one equipment unit (W, >= 0).
    pub standby_power_w: f64,
    /// One-way cable length per channel (m, > 0).
    pub cable_length_m: f64,
    /// Cable cross-section (mm², > 0).
    pub cable_area_mm2: f64,
}

impl Default for EquipmentSpec {
    fn default() -> Self {
        Self {
            cell_capacity_ah: 211.10,
            current_range_label: "60A - 300A".to_string(),
            control_channels: 16,
            test_channels: 800,
            standby_power_w: 1572.0,
            cable_length_m: 3.0,
            cable_area_mm2: 150.0,
        }
    }
}

impl EquipmentSpec {
    /// Upper bound of the current range label, e.g. `600.0` for `"120A - 600A"`.
    ///
    /// Returns `None` if the label does not have the `"minA - maxA"` shape.
    pub fn max_rated_current(&self) -> Option<f64> {
        let (_, upper) = self.current_range_label.split_once('-')?;
        let upper = upper.trim();
        let upper = upper
            .strip_suffix('A')
            .or_else(|| upper.strip_suffix('a'))
            .unwrap_or(upper);
        upper.trim().parse::<f64>().ok()
    }

    /// Ratio of the rated current to the 300 A reference equipment.
    ///
    /// Falls back to `1.0` when the label cannot be parsed or yields a
    /// non-positive rating.
    pub fn scaling_factor(&self) -> f64 {
        match self.max_rated_current() {
            Some(max) if max > 0.0 && max.is_finite() => max / REFERENCE_RATED_CURRENT_A,
            _ => 1.0,
        }
    }

    /// Number of equipment units needed to host every test channel.
    pub fn required_equipment_units(&self) -> u32 {
        if self.control_channels == 0 {
            return 0;
        }
        self.test_channels.div_ceil(self.control_channels)
    }
}
