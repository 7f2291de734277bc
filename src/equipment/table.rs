//! Measured conversion efficiency of the 300 A reference cycler.
//!
//! Values are percentages as measured on the bench, one row per voltage
//! breakpoint and one column per current breakpoint. They are converted to
//! fractions when a [`MeasuredTable`] is built.

use crate::recipe::Mode;

/// Current breakpoints (A) shared by both tables.
const CURRENTS_A: [f64; 30] = [
    10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 130.0, 140.0,
    150.0, 160.0, 170.0, 180.0, 190.0, 200.0, 210.0, 220.0, 230.0, 240.0, 250.0, 260.0, 270.0,
    280.0, 290.0, 300.0,
];

/// Voltage breakpoints (V) shared by both tables.
const VOLTAGES_V: [f64; 3] = [3.3, 4.2, 5.0];

#[rustfmt::skip]
const CHARGE_PCT: [[f64; 30]; 3] = [
    [48.62, 63.88, 71.01, 75.43, 78.54, 80.64, 81.90, 82.71, 83.32, 83.78, 84.07, 84.25, 84.25, 84.09, 83.95,
     83.75, 83.63, 83.48, 83.33, 83.11, 82.81, 82.49, 82.17, 81.83, 81.51, 81.16, 80.78, 80.38, 79.99, 79.56],
    [49.46, 64.42, 72.12, 76.76, 79.58, 81.46, 82.81, 83.85, 84.56, 84.90, 85.15, 85.37, 85.44, 85.49, 85.38,
     85.25, 85.15, 85.02, 84.89, 84.71, 84.50, 84.28, 83.99, 83.70, 83.40, 83.09, 82.76, 82.42, 82.06, 81.68],
    [53.24, 67.85, 75.24, 79.30, 81.82, 83.63, 84.88, 85.71, 86.15, 86.55, 86.82, 87.01, 86.99, 86.95, 86.83,
     86.75, 86.68, 86.56, 86.36, 86.18, 85.94, 85.73, 85.48, 85.22, 84.94, 84.64, 84.32, 84.00, 83.65, 83.31],
];

// Low-current discharge goes negative: the cycler's own losses exceed what the cell returns.
#[rustfmt::skip]
const DISCHARGE_PCT: [[f64; 30]; 3] = [
    [-16.20, 39.95, 56.71, 65.99, 70.81, 74.11, 76.21, 77.63, 78.69, 79.58, 80.14, 80.52, 80.77, 80.78, 80.75,
     80.58, 80.47, 79.42, 79.99, 79.68, 79.31, 78.93, 78.55, 78.13, 77.62, 77.10, 76.61, 76.05, 75.40, 74.87],
    [-6.35, 45.02, 61.23, 70.32, 74.83, 77.77, 79.81, 81.19, 82.18, 82.85, 83.29, 83.56, 83.63, 83.72, 83.75,
     83.70, 83.56, 83.37, 83.16, 82.83, 82.59, 82.28, 81.93, 81.57, 81.17, 80.76, 80.33, 79.83, 79.36, 78.88],
    [9.00, 51.99, 65.99, 74.24, 78.26, 80.71, 82.37, 83.62, 84.36, 84.89, 85.24, 85.44, 85.63, 85.71, 85.66,
     85.60, 85.46, 85.27, 85.06, 84.83, 84.58, 84.27, 83.99, 83.65, 83.29, 82.92, 82.53, 82.10, 81.66, 81.23],
];

/// A rectangular table of efficiency samples.
///
/// `values[v][c]` is the efficiency fraction at `voltages[v]` and `currents[c]`.
/// Both axes are strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredTable {
    pub currents: Vec<f64>,
    pub voltages: Vec<f64>,
    pub values: Vec<Vec<f64>>,
}

impl MeasuredTable {
    /// Builds the reference table for a mode.
    ///
    /// Returns `None` for [`Mode::Rest`], which has no conversion loss.
    pub fn for_mode(mode: Mode) -> Option<Self> {
        let pct = match mode {
            Mode::Charge => &CHARGE_PCT,
            Mode::Discharge => &DISCHARGE_PCT,
            Mode::Rest => return None,
        };
        Some(Self {
            currents: CURRENTS_A.to_vec(),
            voltages: VOLTAGES_V.to_vec(),
            values: pct
                .iter()
                .map(|row| row.iter().map(|p| p / 100.0).collect())
                .collect(),
        })
    }

    /// Flattens the table into `(current, voltage, efficiency)` samples.
    pub fn samples(&self) -> Vec<(f64, f64, f64)> {
        let mut out = Vec::with_capacity(self.currents.len() * self.voltages.len());
        for (ci, &c) in self.currents.iter().enumerate() {
            for (vi, &v) in self.voltages.iter().enumerate() {
                out.push((c, v, self.values[vi][ci]));
            }
        }
        out
    }
}
