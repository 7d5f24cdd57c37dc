//! Rectangularity checks for candidate quadrilaterals.
//!
//! [`is_rectangle`] asks whether some choice of per-vertex detection noise
//! within `±accuracy` turns the quad into the exact image of a rectangle with
//! the expected side ratio. Each vertex is replaced by the four corners of
//! its `accuracy` box and all 4⁴ = 256 combinations are restored as
//! parallelograms. The quad passes when the restored corner-angle cosines
//! straddle zero and the restored side ratios straddle the expected ratio.
//! A combination that cannot be restored at all also makes the quad pass:
//! the model cannot refute it.

use crate::{restore_parallelogram, RestoreError};
use log::{debug, trace};
use nalgebra::Point2;
use quad_rectify_core::Quad2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Number of candidate quads in one perturbation sweep.
pub const SWEEP_CANDIDATES: usize = 256;

/// Expected shape and allowed per-vertex noise for [`is_rectangle`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectangleCheckParams {
    /// `|ab| / |ad|` of the physical rectangle.
    pub expected_ratio: f64,
    /// Half-width of the square noise box around every vertex, in pixels.
    pub accuracy: f64,
}

impl Default for RectangleCheckParams {
    fn default() -> Self {
        Self {
            expected_ratio: 1.0,
            accuracy: 1.0,
        }
    }
}

/// Stopping rules for [`error_distance_with`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BisectionParams {
    /// Stop once the accuracy bracket is narrower than this.
    pub tolerance: f64,
    /// Hard cap on bisection steps.
    pub max_iterations: usize,
}

impl Default for BisectionParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_iterations: 64,
        }
    }
}

/// Corners of the square of half-width `delta` around `p`, in the order
/// up-left, down-left, down-right, up-right.
pub fn delta_neighborhood(p: Point2<f64>, delta: f64) -> [Point2<f64>; 4] {
    [
        Point2::new(p.x - delta, p.y - delta),
        Point2::new(p.x - delta, p.y + delta),
        Point2::new(p.x + delta, p.y + delta),
        Point2::new(p.x + delta, p.y - delta),
    ]
}

/// Extremes of the restored side ratio and corner cosine over one sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepRange {
    pub min_ratio: f64,
    pub max_ratio: f64,
    pub min_cos: f64,
    pub max_cos: f64,
    /// Candidates whose restoration failed.
    pub failed: usize,
}

impl SweepRange {
    fn empty() -> Self {
        Self {
            min_ratio: f64::INFINITY,
            max_ratio: f64::NEG_INFINITY,
            min_cos: f64::INFINITY,
            max_cos: f64::NEG_INFINITY,
            failed: 0,
        }
    }

    fn add(&mut self, ratio: f64, cos: f64) {
        if ratio < self.min_ratio {
            self.min_ratio = ratio;
        }
        if ratio > self.max_ratio {
            self.max_ratio = ratio;
        }
        if cos < self.min_cos {
            self.min_cos = cos;
        }
        if cos > self.max_cos {
            self.max_cos = cos;
        }
    }

    /// Whether a right angle and `expected_ratio` are both inside the range.
    pub fn contains_rectangle(&self, expected_ratio: f64) -> bool {
        self.min_cos <= 0.0
            && self.max_cos >= 0.0
            && self.min_ratio <= expected_ratio
            && self.max_ratio >= expected_ratio
    }

    /// Verdict of [`is_rectangle`] for this sweep.
    pub fn accepts(&self, expected_ratio: f64) -> bool {
        self.failed > 0 || self.contains_rectangle(expected_ratio)
    }
}

/// Restore all 256 perturbed versions of `prj` and collect their extremes.
pub fn perturbation_sweep(prj: &Quad2, flen: f64, accuracy: f64) -> SweepRange {
    let boxes = prj.vertices.map(|p| delta_neighborhood(p, accuracy));
    let mut range = SweepRange::empty();

    for idx in 0..SWEEP_CANDIDATES {
        let candidate = Quad2::new(
            boxes[0][(idx >> 6) & 3],
            boxes[1][(idx >> 4) & 3],
            boxes[2][(idx >> 2) & 3],
            boxes[3][idx & 3],
        );
        match restore_parallelogram(&candidate, flen) {
            Ok(par) => range.add(par.side_ratio(), par.cos_angle()),
            Err(_) => range.failed += 1,
        }
    }

    trace!(
        "sweep acc={accuracy:.5}: ratio [{:.5}, {:.5}] cos [{:.5}, {:.5}] failed {}",
        range.min_ratio,
        range.max_ratio,
        range.min_cos,
        range.max_cos,
        range.failed
    );
    range
}

/// Whether `prj` can be the image of a rectangle with side ratio
/// `expected_ratio`, allowing `accuracy` pixels of noise per vertex.
pub fn is_rectangle(prj: &Quad2, flen: f64, expected_ratio: f64, accuracy: f64) -> bool {
    perturbation_sweep(prj, flen, accuracy).accepts(expected_ratio)
}

/// Smallest accuracy at which [`is_rectangle`] accepts `prj`, found by
/// bisection with the default [`BisectionParams`].
pub fn error_distance(prj: &Quad2, flen: f64, expected_ratio: f64) -> f64 {
    error_distance_with(prj, flen, expected_ratio, &BisectionParams::default())
}

/// [`error_distance`] with explicit stopping rules.
///
/// The search bracket is `[0, |a - b| + 1]`; the last midpoint tried is
/// returned.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(prj, params)))]
pub fn error_distance_with(
    prj: &Quad2,
    flen: f64,
    expected_ratio: f64,
    params: &BisectionParams,
) -> f64 {
    let mut lo = 0.0;
    let mut hi = (prj.a() - prj.b()).norm() + 1.0;
    let mut accuracy = hi;
    let mut iterations = 0;

    while hi - lo > params.tolerance && iterations < params.max_iterations {
        accuracy = 0.5 * (lo + hi);
        let accepted = is_rectangle(prj, flen, expected_ratio, accuracy);
        trace!("bisection step {iterations}: acc={accuracy:.5} accepted={accepted}");
        if accepted {
            hi = accuracy;
        } else {
            lo = accuracy;
        }
        iterations += 1;
    }

    if iterations == params.max_iterations {
        debug!(
            "error distance stopped after {iterations} steps with bracket width {:e}",
            hi - lo
        );
    }
    accuracy
}

/// Reject quads whose restored plane is seen too obliquely.
///
/// Passes when `|n.z| / |n| > min_cos` for the diagonal normal
/// `n = (a - c) x (b - d)` of the restored parallelogram.
pub fn normal_check(prj: &Quad2, flen: f64, min_cos: f64) -> Result<bool, RestoreError> {
    let par = restore_parallelogram(prj, flen)?;
    let n = par.diagonal_normal();
    Ok(n.z.abs() / n.norm() > min_cos)
}

/// [`is_rectangle`] for every quad in `quads`.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(n = quads.len())))]
pub fn verify_batch(quads: &[Quad2], flen: f64, params: &RectangleCheckParams) -> Vec<bool> {
    let check = |q: &Quad2| is_rectangle(q, flen, params.expected_ratio, params.accuracy);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        quads.par_iter().map(check).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        quads.iter().map(check).collect()
    }
}

/// [`error_distance_with`] for every quad in `quads`.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(n = quads.len())))]
pub fn error_distances(
    quads: &[Quad2],
    flen: f64,
    expected_ratio: f64,
    params: &BisectionParams,
) -> Vec<f64> {
    let dist = |q: &Quad2| error_distance_with(q, flen, expected_ratio, params);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        quads.par_iter().map(dist).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        quads.iter().map(dist).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Quad2 {
        Quad2::new(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        )
    }

    #[test]
    fn neighborhood_order() {
        let n = delta_neighborhood(Point2::new(10.0, 20.0), 0.5);
        assert_eq!(
            n,
            [
                Point2::new(9.5, 19.5),
                Point2::new(9.5, 20.5),
                Point2::new(10.5, 20.5),
                Point2::new(10.5, 19.5),
            ]
        );
    }

    #[test]
    fn unit_square_is_a_square() {
        let q = unit_square();
        assert!(is_rectangle(&q, 2.0, 1.0, 0.01));
        let range = perturbation_sweep(&q, 2.0, 0.01);
        assert_eq!(range.failed, 0);
        assert!(range.contains_rectangle(1.0));
    }

    #[test]
    fn unit_square_is_not_a_two_to_one_rectangle() {
        assert!(!is_rectangle(&unit_square(), 2.0, 2.0, 0.01));
    }

    #[test]
    fn zero_accuracy_sweep_collapses_to_one_shape() {
        let range = perturbation_sweep(&unit_square(), 2.0, 0.0);
        assert_eq!(range.min_ratio, range.max_ratio);
        assert_eq!(range.min_cos, range.max_cos);
    }

    #[test]
    fn failed_candidates_force_acceptance() {
        let line = Quad2::new(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 0.0),
        );
        let range = perturbation_sweep(&line, 2.0, 0.0);
        assert_eq!(range.failed, SWEEP_CANDIDATES);
        assert!(is_rectangle(&line, 2.0, 5.0, 0.0));
    }

    #[test]
    fn bisection_respects_iteration_cap() {
        let params = BisectionParams {
            tolerance: 0.0,
            max_iterations: 5,
        };
        let d = error_distance_with(&unit_square(), 2.0, 1.0, &params);
        // bracket [0, 2] halves five times towards zero
        assert_eq!(d, 2.0 / 32.0);
    }

    #[test]
    fn fronto_parallel_square_passes_normal_check() {
        assert_eq!(normal_check(&unit_square(), 2.0, 0.99), Ok(true));
    }

    #[test]
    fn normal_check_propagates_restore_failure() {
        let q = unit_square();
        let crossed = Quad2::new(q.a(), q.c(), q.b(), q.d());
        assert!(matches!(
            normal_check(&crossed, 2.0, 0.5),
            Err(RestoreError::Inconsistent { .. })
        ));
    }

    #[test]
    fn bisection_params_fill_missing_fields() {
        let p: BisectionParams = serde_json::from_str(r#"{"max_iterations": 10}"#).expect("parse");
        assert_eq!(p.max_iterations, 10);
        assert_eq!(p.tolerance, 1e-4);
    }
}
