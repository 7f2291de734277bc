//! Superposition of several timelines into one facility power profile.
//!
//! Each timeline is a step function of elapsed time: it holds a step's power
//! from the step's start until the next breakpoint and drops to zero when its
//! last step ends. The combined profile sums those step functions on the
//! union of all breakpoints.

use std::fmt;

use serde::Serialize;

use super::timeline::Timeline;

/// Default warm-up horizon excluded from the post-warm-up peak (h).
pub const DEFAULT_PEAK_AFTER_HOURS: f64 = 5.0;

/// One breakpoint of a piecewise-constant power profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfilePoint {
    pub time_hours: f64,
    pub power_kw: f64,
}

/// Breakpoints of a single timeline, sorted by time.
///
/// Zero-duration steps are dropped; a terminal zero closes the profile.
pub fn breakpoints(timeline: &Timeline) -> Vec<ProfilePoint> {
    let mut points: Vec<ProfilePoint> = timeline
        .results()
        .iter()
        .filter(|r| r.duration_hours() > 0.0)
        .map(|r| ProfilePoint {
            time_hours: r.start_hours,
            power_kw: r.power_kw,
        })
        .collect();
    if !points.is_empty() {
        points.push(ProfilePoint {
            time_hours: timeline.total_hours(),
            power_kw: 0.0,
        });
    }
    points
}

/// Value of a step function at `t`: the last breakpoint at or before `t`, else `0.0`.
pub fn power_at(points: &[ProfilePoint], t: f64) -> f64 {
    let idx = points.partition_point(|p| p.time_hours <= t);
    if idx == 0 {
        0.0
    } else {
        points[idx - 1].power_kw
    }
}

/// Summed power of several timelines on a shared time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedProfile {
    points: Vec<ProfilePoint>,
    individual_peaks_kw: Vec<f64>,
}

impl CombinedProfile {
    /// Profile breakpoints sorted by time, starting at `0.0`.
    pub fn points(&self) -> &[ProfilePoint] {
        &self.points
    }

    /// Combined power at elapsed time `t` (h).
    pub fn power_at(&self, t: f64) -> f64 {
        power_at(&self.points, t)
    }

    /// Highest non-negative combined power, `0.0` if the profile never draws.
    pub fn peak_kw(&self) -> f64 {
        self.points.iter().map(|p| p.power_kw).fold(0.0, f64::max)
    }

    /// Highest combined power strictly after `after_hours`, or `None` if no
    /// breakpoint lies beyond it.
    pub fn peak_after(&self, after_hours: f64) -> Option<f64> {
        self.points
            .iter()
            .filter(|p| p.time_hours > after_hours)
            .map(|p| p.power_kw)
            .reduce(f64::max)
    }

    /// Peak of each input timeline in input order (non-negative).
    pub fn individual_peaks_kw(&self) -> &[f64] {
        &self.individual_peaks_kw
    }

    /// Points within `[from, to]` hours.
    pub fn window(&self, from: f64, to: f64) -> Vec<ProfilePoint> {
        self.points
            .iter()
            .copied()
            .filter(|p| p.time_hours >= from && p.time_hours <= to)
            .collect()
    }

    /// Peak figures for reporting.
    pub fn summary(&self, peak_after_hours: f64) -> ProfileSummary {
        ProfileSummary {
            peak_kw: self.peak_kw(),
            peak_after_hours,
            peak_after_kw: self.peak_after(peak_after_hours),
            individual_peaks_kw: self.individual_peaks_kw.clone(),
        }
    }
}

/// Sums timelines into a combined profile.
///
/// # Examples
///
/// ```
/// use cycler_sim::sim::superposition::combine;
///
/// let profile = combine(&[]);
/// assert!(profile.points().iter().all(|p| p.power_kw == 0.0));
/// assert_eq!(profile.peak_kw(), 0.0);
/// ```
pub fn combine(timelines: &[Timeline]) -> CombinedProfile {
    let per_timeline: Vec<Vec<ProfilePoint>> = timelines.iter().map(breakpoints).collect();

    let mut times: Vec<f64> = per_timeline
        .iter()
        .flatten()
        .map(|p| p.time_hours)
        .chain(std::iter::once(0.0))
        .collect();
    times.sort_by(f64::total_cmp);
    times.dedup();

    let points: Vec<ProfilePoint> = times
        .into_iter()
        .map(|t| ProfilePoint {
            time_hours: t,
            power_kw: per_timeline.iter().map(|pts| power_at(pts, t)).sum(),
        })
        .collect();

    let individual_peaks_kw = per_timeline
        .iter()
        .map(|pts| pts.iter().map(|p| p.power_kw).fold(0.0, f64::max))
        .collect();

    let profile = CombinedProfile {
        points,
        individual_peaks_kw,
    };
    tracing::info!(
        timelines = timelines.len(),
        breakpoints = profile.points.len(),
        peak_kw = profile.peak_kw(),
        "combined profile"
    );
    profile
}

/// Peak demand figures of a combined profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    /// Highest non-negative combined power (kW).
    pub peak_kw: f64,
    /// Warm-up horizon used for `peak_after_kw` (h).
    pub peak_after_hours: f64,
    /// Highest combined power strictly after the warm-up horizon (kW).
    pub peak_after_kw: Option<f64>,
    /// Per-timeline peaks in input order (kW).
    pub individual_peaks_kw: Vec<f64>,
}

impl fmt::Display for ProfileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Combined peak:           {:.2} kW", self.peak_kw)?;
        match self.peak_after_kw {
            Some(p) => writeln!(
                f,
                "Peak after {:>4.1} h:       {:.2} kW",
                self.peak_after_hours, p
            )?,
            None => writeln!(f, "Peak after {:>4.1} h:       n/a", self.peak_after_hours)?,
        }
        for (i, peak) in self.individual_peaks_kw.iter().enumerate() {
            writeln!(f, "  timeline {:<3}          {:.2} kW", i + 1, peak)?;
        }
        Ok(())
    }
}
