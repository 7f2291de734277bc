//! Facility-level power of a floor of cycler units.

use super::spec::EquipmentSpec;
use crate::recipe::Mode;

/// Total facility power (W) for a uniform per-channel load.
///
/// `test_channels / control_channels` full units each contribute
/// `per_channel_w · control_channels + standby_w`; a partially filled unit
/// contributes its occupied channels plus one standby draw.
///
/// `per_channel_w` is signed: recovered discharge power enters negated and
/// nets against the standby baseline.
///
/// Returns `0.0` when `control_channels` is zero.
pub fn aggregate(per_channel_w: f64, control_channels: u32, test_channels: u32, standby_w: f64) -> f64 {
    if control_channels == 0 {
        return 0.0;
    }
    let full_units = test_channels / control_channels;
    let remainder = test_channels % control_channels;

    let full = f64::from(full_units) * (per_channel_w * f64::from(control_channels) + standby_w);
    let partial = if remainder > 0 {
        per_channel_w * f64::from(remainder) + standby_w
    } else {
        0.0
    };
    full + partial
}

/// Facility power (W) for a per-channel magnitude in a given mode.
///
/// Charge draws `per_channel_w`, Discharge returns it to the grid, Rest
/// leaves only the standby baseline.
pub fn facility_power_w(mode: Mode, per_channel_w: f64, spec: &EquipmentSpec) -> f64 {
    let signed = match mode {
        Mode::Rest => 0.0,
        Mode::Charge => per_channel_w,
        Mode::Discharge => -per_channel_w,
    };
    aggregate(
        signed,
        spec.control_channels,
        spec.test_channels,
        spec.standby_power_w,
    )
}
