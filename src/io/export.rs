//! CSV export for timelines and combined power profiles.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::superposition::ProfilePoint;
use crate::sim::timeline::Timeline;

/// Column header for timeline export.
const TIMELINE_HEADER: &str = "recipe,cycle,step,mode,test_type,voltage_v,current_a,c_rate,\
                               actual_time_h,efficiency_pct,power_kw,energy_kwh,charge_ah,\
                               soc_pct,start_h,end_h,skipped";

/// Column header for profile export.
const PROFILE_HEADER: &str = "time_h,power_kw";

/// Exports named timelines to a CSV file at the given path.
///
/// One row per executed step, timelines in input order. Cycle and step
/// numbers are 1-based. Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_timelines_csv(timelines: &[(&str, &Timeline)], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_timelines_csv(timelines, io::BufWriter::new(file))
}

/// Writes named timelines as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_timelines_csv(timelines: &[(&str, &Timeline)], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(TIMELINE_HEADER.split(',').map(str::trim))?;

    let opt = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_default();
    for (name, timeline) in timelines {
        for r in timeline.results() {
            wtr.write_record(&[
                (*name).to_string(),
                (r.cycle + 1).to_string(),
                (r.step_index + 1).to_string(),
                r.mode.to_string(),
                r.test_type.to_string(),
                opt(r.voltage),
                opt(r.current),
                format!("{:.4}", r.c_rate),
                format!("{:.4}", r.actual_time_hours),
                format!("{:.2}", r.efficiency_fraction * 100.0),
                format!("{:.4}", r.power_kw),
                format!("{:.4}", r.energy_kwh),
                format!("{:.4}", r.charge_ah),
                format!("{:.2}", r.soc_percent),
                format!("{:.4}", r.start_hours),
                format!("{:.4}", r.end_hours),
                r.skipped.to_string(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Exports profile breakpoints to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_profile_csv(points: &[ProfilePoint], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_profile_csv(points, io::BufWriter::new(file))
}

/// Writes profile breakpoints as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_profile_csv(points: &[ProfilePoint], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(PROFILE_HEADER.split(','))?;
    for p in points {
        wtr.write_record(&[format!("{:.4}", p.time_hours), format!("{:.4}", p.power_kw)])?;
    }
    wtr.flush()?;
    Ok(())
}
