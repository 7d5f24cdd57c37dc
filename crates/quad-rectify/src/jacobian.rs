//! Sensitivity of the restored shape to the eight input coordinates.
//!
//! Both estimators differentiate `φ = (ratio², cos²)` of the restored
//! parallelogram, where `ratio = |a - b| / |a - d|` and `cos` is the cosine
//! of the corner angle at `a`. An exact rectangle image with side ratio `r`
//! has `φ = (r², 0)`, so a refinement loop can step the quad towards it.
//!
//! Rows are ordered `x_a, x_b, x_c, x_d, y_a, y_b, y_c, y_d`.

use crate::restore::{projective_depths, restore_parallelogram};
use crate::{JacobianError, RestoreError};
use nalgebra::{Point2, SMatrix, Vector3};
use quad_rectify_core::Quad2;
use serde::{Deserialize, Serialize};

/// Number of scalar input coordinates.
pub const COORDINATES: usize = 8;

/// `∂(ratio², cos²) / ∂coordinate` for each of the eight coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Jacobian {
    pub rows: [[f64; 2]; COORDINATES],
}

/// Row of the `axis` (0 = x, 1 = y) coordinate of `vertex` (0..4 = a..d).
#[inline]
pub fn coordinate_index(vertex: usize, axis: usize) -> usize {
    axis * 4 + vertex
}

impl Jacobian {
    /// `∂(ratio²)` with respect to `axis` of `vertex`.
    pub fn d_ratio_sq(&self, vertex: usize, axis: usize) -> f64 {
        self.rows[coordinate_index(vertex, axis)][0]
    }

    /// `∂(cos²)` with respect to `axis` of `vertex`.
    pub fn d_cos_sq(&self, vertex: usize, axis: usize) -> f64 {
        self.rows[coordinate_index(vertex, axis)][1]
    }

    pub fn to_matrix(&self) -> SMatrix<f64, COORDINATES, 2> {
        SMatrix::from_fn(|r, c| self.rows[r][c])
    }
}

/// Finite-difference settings for [`numerical_jacobian_with`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericalJacobianParams {
    /// Full width of the central difference; samples sit at `±step / 2`.
    pub step: f64,
}

impl Default for NumericalJacobianParams {
    fn default() -> Self {
        Self { step: 1e-3 }
    }
}

fn shape_metrics(prj: &Quad2, flen: f64) -> Result<[f64; 2], RestoreError> {
    let par = restore_parallelogram(prj, flen)?;
    let ratio = par.side_ratio();
    let cos = par.cos_angle();
    Ok([ratio * ratio, cos * cos])
}

/// Central-difference Jacobian with the default step.
pub fn numerical_jacobian(prj: &Quad2, flen: f64) -> Result<Jacobian, JacobianError> {
    numerical_jacobian_with(prj, flen, &NumericalJacobianParams::default())
}

/// Central-difference Jacobian.
///
/// Every row needs two restorations; if either fails the whole estimate is
/// rejected with [`JacobianError::UnreliableSample`] naming the coordinate.
pub fn numerical_jacobian_with(
    prj: &Quad2,
    flen: f64,
    params: &NumericalJacobianParams,
) -> Result<Jacobian, JacobianError> {
    let h = params.step;
    let mut rows = [[0.0; 2]; COORDINATES];

    for (coordinate, row) in rows.iter_mut().enumerate() {
        let (vertex, axis) = (coordinate % 4, coordinate / 4);
        let sample = |offset: f64| {
            let mut q = *prj;
            q[vertex][axis] += offset;
            shape_metrics(&q, flen)
                .map_err(|source| JacobianError::UnreliableSample { coordinate, source })
        };
        let plus = sample(h / 2.0)?;
        let minus = sample(-h / 2.0)?;
        *row = [(plus[0] - minus[0]) / h, (plus[1] - minus[1]) / h];
    }

    Ok(Jacobian { rows })
}

/// Twice the signed area of the triangle `(p, q, r)` and its gradient
/// in the row layout of [`Jacobian`].
fn signed_area(
    pts: &[Point2<f64>; 4],
    [i, j, k]: [usize; 3],
) -> (f64, [f64; COORDINATES]) {
    let (p, q, r) = (pts[i], pts[j], pts[k]);
    let value = (q - p).perp(&(r - p));
    let mut grad = [0.0; COORDINATES];
    grad[coordinate_index(i, 0)] = q.y - r.y;
    grad[coordinate_index(i, 1)] = r.x - q.x;
    grad[coordinate_index(j, 0)] = r.y - p.y;
    grad[coordinate_index(j, 1)] = p.x - r.x;
    grad[coordinate_index(k, 0)] = p.y - q.y;
    grad[coordinate_index(k, 1)] = q.x - p.x;
    (value, grad)
}

/// Closed-form Jacobian.
///
/// The projective depths of `a, b, d` are proportional to the signed
/// areas `k1 = [d c b]`, `k2 = [d c a]`, `k4 = [c b a]`. With
/// `P_i = (x_i, y_i, flen)`, `U = k1·P_a - k2·P_b` and `V = k1·P_a - k4·P_d`
/// the metrics are `ratio² = A / B` and `cos² = C² / (A·B)` for
/// `A = U·U`, `B = V·V`, `C = U·V`; everything else is the chain rule.
pub fn analytical_jacobian(prj: &Quad2, flen: f64) -> Result<Jacobian, JacobianError> {
    projective_depths(prj)?;

    let pts = &prj.vertices;
    let (k1, dk1) = signed_area(pts, [3, 2, 1]);
    let (k2, dk2) = signed_area(pts, [3, 2, 0]);
    let (k4, dk4) = signed_area(pts, [2, 1, 0]);

    let lift = |p: Point2<f64>| Vector3::new(p.x, p.y, flen);
    let (pa, pb, pd) = (lift(prj.a()), lift(prj.b()), lift(prj.d()));

    let u = pa * k1 - pb * k2;
    let v = pa * k1 - pd * k4;
    let a = u.dot(&u);
    let b = v.dot(&v);
    let c = u.dot(&v);
    if a < f64::EPSILON || b < f64::EPSILON {
        return Err(JacobianError::DegenerateForm);
    }

    let mut rows = [[0.0; 2]; COORDINATES];
    for (coordinate, row) in rows.iter_mut().enumerate() {
        let (vertex, axis) = (coordinate % 4, coordinate / 4);
        let mut unit = Vector3::zeros();
        unit[axis] = 1.0;
        // d(P_i)/d(coordinate) is `unit` for the moved vertex, zero otherwise.
        let dp = |i: usize| if i == vertex { unit } else { Vector3::zeros() };

        let du = pa * dk1[coordinate] + dp(0) * k1 - pb * dk2[coordinate] - dp(1) * k2;
        let dv = pa * dk1[coordinate] + dp(0) * k1 - pd * dk4[coordinate] - dp(3) * k4;

        let da = 2.0 * u.dot(&du);
        let db = 2.0 * v.dot(&dv);
        let dc = du.dot(&v) + u.dot(&dv);

        row[0] = (da * b - a * db) / (b * b);
        row[1] = (2.0 * c * dc * a * b - c * c * da * b - c * c * a * db) / (a * a * b * b);
    }

    Ok(Jacobian { rows })
}
