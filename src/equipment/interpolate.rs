//! Two-dimensional interpolation over measured efficiency samples.
//!
//! Two strategies share the [`EfficiencyLookup`] contract:
//! - [`GridTable`]: bilinear interpolation on the rectangular breakpoint grid.
//! - [`ScatteredTable`]: piecewise-linear interpolation over a Delaunay
//!   triangulation of an unstructured sample set, with nearest-sample fallback.
//!
//! Both clamp the query to the sample bounds and reproduce stored samples
//! at their own coordinates.

use super::table::MeasuredTable;

/// Tolerance on barycentric weights when deciding whether a point lies in a triangle.
const INSIDE_EPS: f64 = 1e-9;

/// Efficiency as a function of `(current, voltage)`.
pub trait EfficiencyLookup: Send + Sync {
    /// Returns the interpolated efficiency fraction.
    ///
    /// Queries outside the table domain are clamped, never rejected.
    fn lookup(&self, current: f64, voltage: f64) -> f64;
}

/// Linear blend that is exact at both ends (`t == 0` and `t == 1`).
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Index of the last breakpoint `<= x`, capped so that `idx + 1` is valid.
fn cell_index(axis: &[f64], x: f64) -> usize {
    let upper = axis.partition_point(|b| *b <= x);
    upper.saturating_sub(1).min(axis.len() - 2)
}

/// Bilinear lookup on a rectangular grid.
#[derive(Debug, Clone)]
pub struct GridTable {
    table: MeasuredTable,
}

impl GridTable {
    /// Wraps a measured table.
    ///
    /// # Panics
    ///
    /// Panics if either axis has fewer than two breakpoints.
    pub fn new(table: MeasuredTable) -> Self {
        assert!(table.currents.len() >= 2, "need at least two current breakpoints");
        assert!(table.voltages.len() >= 2, "need at least two voltage breakpoints");
        Self { table }
    }
}

impl EfficiencyLookup for GridTable {
    fn lookup(&self, current: f64, voltage: f64) -> f64 {
        let t = &self.table;
        let (c_lo, c_hi) = (t.currents[0], t.currents[t.currents.len() - 1]);
        let (v_lo, v_hi) = (t.voltages[0], t.voltages[t.voltages.len() - 1]);
        let c = current.clamp(c_lo, c_hi);
        let v = voltage.clamp(v_lo, v_hi);

        let ci = cell_index(&t.currents, c);
        let vi = cell_index(&t.voltages, v);
        let (c1, c2) = (t.currents[ci], t.currents[ci + 1]);
        let (v1, v2) = (t.voltages[vi], t.voltages[vi + 1]);

        // Along voltage at both current breakpoints, then along current.
        let tv = (v - v1) / (v2 - v1);
        let at_c1 = lerp(t.values[vi][ci], t.values[vi + 1][ci], tv);
        let at_c2 = lerp(t.values[vi][ci + 1], t.values[vi + 1][ci + 1], tv);

        let tc = (c - c1) / (c2 - c1);
        lerp(at_c1, at_c2, tc)
    }
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    v: [usize; 3],
    cx: f64,
    cy: f64,
    r2: f64,
}

impl Triangle {
    fn new(pts: &[(f64, f64)], v: [usize; 3]) -> Self {
        let (ax, ay) = pts[v[0]];
        let (bx, by) = pts[v[1]];
        let (cx, cy) = pts[v[2]];
        let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
        if d.abs() < f64::EPSILON {
            // Degenerate: an infinite circumcircle gets it replaced on the next insertion.
            return Self {
                v,
                cx: 0.0,
                cy: 0.0,
                r2: f64::INFINITY,
            };
        }
        let a2 = ax * ax + ay * ay;
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
        let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
        Self {
            v,
            cx: ux,
            cy: uy,
            r2: (ax - ux).powi(2) + (ay - uy).powi(2),
        }
    }

    fn circumcircle_contains(&self, (px, py): (f64, f64)) -> bool {
        let d2 = (px - self.cx).powi(2) + (py - self.cy).powi(2);
        d2 < self.r2 * (1.0 - 1e-12)
    }

    fn edges(&self) -> [[usize; 2]; 3] {
        let [a, b, c] = self.v;
        [sorted(a, b), sorted(b, c), sorted(c, a)]
    }
}

fn sorted(a: usize, b: usize) -> [usize; 2] {
    if a < b { [a, b] } else { [b, a] }
}

/// Barycentric weights of `p` in triangle `(a, b, c)`, or `None` if degenerate.
fn barycentric(
    (px, py): (f64, f64),
    (x1, y1): (f64, f64),
    (x2, y2): (f64, f64),
    (x3, y3): (f64, f64),
) -> Option<[f64; 3]> {
    let det = (y2 - y3) * (x1 - x3) + (x3 - x2) * (y1 - y3);
    if det.abs() < 1e-14 {
        return None;
    }
    let l1 = ((y2 - y3) * (px - x3) + (x3 - x2) * (py - y3)) / det;
    let l2 = ((y3 - y1) * (px - x3) + (x1 - x3) * (py - y3)) / det;
    Some([l1, l2, 1.0 - l1 - l2])
}

/// Piecewise-linear lookup over an unstructured sample set.
#[derive(Debug, Clone)]
pub struct ScatteredTable {
    /// Sample coordinates normalised to the unit square.
    points: Vec<(f64, f64)>,
    values: Vec<f64>,
    triangles: Vec<[usize; 3]>,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl ScatteredTable {
    /// Builds the triangulation from `(current, voltage, efficiency)` samples.
    ///
    /// Duplicate coordinates keep their first value. With fewer than three
    /// non-collinear samples every query falls back to the nearest sample,
    /// and an empty sample set yields `0.0` everywhere.
    pub fn new(samples: &[(f64, f64, f64)]) -> Self {
        let mut unique: Vec<(f64, f64, f64)> = Vec::with_capacity(samples.len());
        for &(x, y, z) in samples {
            if !unique.iter().any(|(ux, uy, _)| *ux == x && *uy == y) {
                unique.push((x, y, z));
            }
        }

        let bounds = |f: fn(&(f64, f64, f64)) -> f64| {
            unique.iter().map(f).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
        };
        let x_range = bounds(|s| s.0);
        let y_range = bounds(|s| s.1);

        let mut table = Self {
            points: Vec::with_capacity(unique.len()),
            values: unique.iter().map(|s| s.2).collect(),
            triangles: Vec::new(),
            x_range,
            y_range,
        };
        table.points = unique.iter().map(|s| table.normalise(s.0, s.1)).collect();
        table.triangles = triangulate(&table.points);
        table
    }

    /// Builds the scattered form of a rectangular table.
    pub fn from_measured(table: &MeasuredTable) -> Self {
        Self::new(&table.samples())
    }

    /// Number of triangles in the triangulation.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn normalise(&self, x: f64, y: f64) -> (f64, f64) {
        let span = |(lo, hi): (f64, f64)| if hi > lo { hi - lo } else { 1.0 };
        (
            (x - self.x_range.0) / span(self.x_range),
            (y - self.y_range.0) / span(self.y_range),
        )
    }

    fn nearest(&self, p: (f64, f64)) -> f64 {
        self.points
            .iter()
            .zip(&self.values)
            .min_by(|(a, _), (b, _)| {
                let da = (a.0 - p.0).powi(2) + (a.1 - p.1).powi(2);
                let db = (b.0 - p.0).powi(2) + (b.1 - p.1).powi(2);
                da.total_cmp(&db)
            })
            .map_or(0.0, |(_, v)| *v)
    }
}

impl EfficiencyLookup for ScatteredTable {
    fn lookup(&self, current: f64, voltage: f64) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        let x = current.clamp(self.x_range.0, self.x_range.1);
        let y = voltage.clamp(self.y_range.0, self.y_range.1);
        let p = self.normalise(x, y);

        for &[a, b, c] in &self.triangles {
            let Some(w) = barycentric(p, self.points[a], self.points[b], self.points[c]) else {
                continue;
            };
            if w.iter().all(|l| *l >= -INSIDE_EPS) {
                return w[0] * self.values[a] + w[1] * self.values[b] + w[2] * self.values[c];
            }
        }
        self.nearest(p)
    }
}

/// Bowyer–Watson Delaunay triangulation of points in the unit square.
fn triangulate(points: &[(f64, f64)]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let mut pts = points.to_vec();
    pts.extend([(-10.0, -10.0), (11.0, -10.0), (0.5, 30.0)]);
    let mut triangles = vec![Triangle::new(&pts, [n, n + 1, n + 2])];

    for i in 0..n {
        let p = pts[i];
        let (bad, good): (Vec<Triangle>, Vec<Triangle>) =
            triangles.into_iter().partition(|t| t.circumcircle_contains(p));

        // Cavity boundary: edges owned by exactly one bad triangle.
        let mut boundary: Vec<[usize; 2]> = Vec::new();
        for edge in bad.iter().flat_map(Triangle::edges) {
            if let Some(pos) = boundary.iter().position(|e| *e == edge) {
                boundary.swap_remove(pos);
            } else {
                boundary.push(edge);
            }
        }

        triangles = good;
        triangles.extend(
            boundary
                .into_iter()
                .map(|[a, b]| Triangle::new(&pts, [a, b, i])),
        );
    }

    triangles
        .into_iter()
        .filter(|t| t.v.iter().all(|&v| v < n))
        .map(|t| t.v)
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::recipe::Mode;

    fn charge_table() -> MeasuredTable {
        MeasuredTable::for_mode(Mode::Charge).unwrap()
    }

    fn square() -> MeasuredTable {
        MeasuredTable {
            currents: vec![0.0, 10.0],
            voltages: vec![0.0, 1.0],
            values: vec![vec![0.0, 1.0], vec![2.0, 3.0]],
        }
    }

    #[test]
    fn grid_reproduces_every_breakpoint() {
        let table = charge_table();
        let grid = GridTable::new(table.clone());
        for (c, v, eta) in table.samples() {
            assert_eq!(grid.lookup(c, v), eta, "at ({c} A, {v} V)");
        }
    }

    #[test]
    fn grid_bilinear_centre() {
        let grid = GridTable::new(square());
        // f = c/10 + 2v
        assert_relative_eq!(grid.lookup(5.0, 0.5), 1.5, max_relative = 1e-12);
        assert_relative_eq!(grid.lookup(2.5, 0.25), 0.75, max_relative = 1e-12);
    }

    #[test]
    fn grid_clamps_outside_domain() {
        let grid = GridTable::new(square());
        assert_eq!(grid.lookup(-5.0, -1.0), 0.0);
        assert_eq!(grid.lookup(50.0, 9.0), 3.0);
    }

    #[test]
    fn scattered_reproduces_every_sample() {
        let table = charge_table();
        let scattered = ScatteredTable::from_measured(&table);
        for (c, v, eta) in table.samples() {
            assert_relative_eq!(scattered.lookup(c, v), eta, max_relative = 1e-9);
        }
    }

    #[test]
    fn scattered_triangulates_full_grid() {
        // A 30 x 3 grid has 29 x 2 cells, two triangles each.
        let scattered = ScatteredTable::from_measured(&charge_table());
        assert_eq!(scattered.triangle_count(), 116);
    }

    #[test]
    fn scattered_is_linear_on_planar_data() {
        // Planar data is reproduced exactly whatever the triangulation.
        let samples: Vec<(f64, f64, f64)> = [(0.0, 0.0), (4.0, 0.0), (0.0, 2.0), (4.0, 2.0), (1.0, 1.5)]
            .iter()
            .map(|&(x, y)| (x, y, 3.0 * x - y + 1.0))
            .collect();
        let scattered = ScatteredTable::new(&samples);
        assert_relative_eq!(scattered.lookup(2.0, 1.0), 6.0, max_relative = 1e-9);
        assert_relative_eq!(scattered.lookup(3.5, 0.25), 11.25, max_relative = 1e-9);
    }

    #[test]
    fn scattered_falls_back_to_nearest_without_triangles() {
        let scattered = ScatteredTable::new(&[(0.0, 0.0, 0.5), (10.0, 10.0, 0.9)]);
        assert_eq!(scattered.triangle_count(), 0);
        assert_eq!(scattered.lookup(1.0, 1.0), 0.5);
        assert_eq!(scattered.lookup(9.0, 8.0), 0.9);
    }

    #[test]
    fn empty_sample_set_yields_zero() {
        let scattered = ScatteredTable::new(&[]);
        assert_eq!(scattered.triangle_count(), 0);
        assert_eq!(scattered.lookup(100.0, 3.8), 0.0);
    }

    #[test]
    fn strategies_agree_within_a_cell_edge() {
        let table = charge_table();
        let grid = GridTable::new(table.clone());
        let scattered = ScatteredTable::from_measured(&table);
        // Along a voltage breakpoint both strategies reduce to 1D linear interpolation.
        assert_relative_eq!(
            grid.lookup(105.0, 4.2),
            scattered.lookup(105.0, 4.2),
            max_relative = 1e-9
        );
    }
}
