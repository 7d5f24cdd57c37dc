//! Lifting an image quadrilateral to the 3D parallelogram or rectangle it
//! projects from.
//!
//! All functions take the quadrilateral in principal-point-centered image
//! coordinates (see [`quad_rectify_core::PerspectiveModel::quad_to_centered`]).
//!
//! The four projective depths `λ1..λ4` are the scale factors that move each
//! image vertex `(x, y, f)` along its viewing ray so that the four 3D points
//! satisfy `A + C = B + D`. They follow from one cross product and are
//! normalized to `λ4 = 1`; the focal length does not enter.

use crate::RestoreError;
use log::trace;
use nalgebra::{Point3, Vector3};
use quad_rectify_core::{Quad2, Quad3};
use serde::{Deserialize, Serialize};

/// Below this `|m.z|` the projective-depth system is treated as singular.
pub const DEGENERATE_DET_EPS: f64 = 1e-9;

const UNOBSERVABLE_FOCAL_EPS: f64 = 1e-12;

/// Projective depths `[λ1, λ2, λ3, λ4]` of the vertices `a, b, c, d`, with
/// `λ4 = 1`.
///
/// Fails with [`RestoreError::Degenerate`] when the vertices do not admit a
/// parallelogram interpretation and with [`RestoreError::Inconsistent`] when
/// any depth is not positive.
pub fn projective_depths(prj: &Quad2) -> Result<[f64; 4], RestoreError> {
    let [a, b, c, d] = prj.vertices;
    let p = Vector3::new(a.x - b.x, c.x - b.x, b.x - d.x);
    let q = Vector3::new(a.y - b.y, c.y - b.y, b.y - d.y);
    let m = p.cross(&q);
    if m.z.abs() < DEGENERATE_DET_EPS {
        trace!("singular depth system, m = {m:?}");
        return Err(RestoreError::Degenerate { det: m.z });
    }

    let lambda1 = m.x / m.z;
    let lambda3 = m.y / m.z;
    let lambda2 = lambda1 + lambda3 - 1.0;
    let lambdas = [lambda1, lambda2, lambda3, 1.0];
    if lambdas[..3].iter().any(|&l| l <= 0.0) {
        trace!("non-positive projective depth in {lambdas:?}");
        return Err(RestoreError::Inconsistent { lambdas });
    }
    Ok(lambdas)
}

fn scale_rays(prj: &Quad2, lambdas: &[f64; 4], flen: f64) -> Quad3 {
    let mut res = prj.lift(flen);
    for (v, &l) in res.vertices.iter_mut().zip(lambdas) {
        *v = Point3::from(v.coords * l);
    }
    res
}

/// A 3D parallelogram recovered for a known focal length.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parallelogram {
    pub quad: Quad3,
    pub lambdas: [f64; 4],
    /// Angle in radians between the normal `(b - a) x (c - a)` and the
    /// optical axis.
    pub angle_to_normal: f64,
}

impl Parallelogram {
    /// `|a - b| / |a - d|` of the restored shape.
    pub fn side_ratio(&self) -> f64 {
        self.quad.side_ratio()
    }

    /// Cosine of the restored corner angle at `a`.
    pub fn cos_angle(&self) -> f64 {
        self.quad.cos_angle()
    }

    /// Plane normal from the diagonals, `(a - c) x (b - d)`.
    pub fn diagonal_normal(&self) -> Vector3<f64> {
        let q = &self.quad;
        (q.a() - q.c()).cross(&(q.b() - q.d()))
    }
}

/// Restore the 3D parallelogram whose projection at focal length `flen` is
/// `prj`.
///
/// The result is defined up to a global scale; `d` keeps its image position
/// on the plane `z = flen`.
pub fn restore_parallelogram(prj: &Quad2, flen: f64) -> Result<Parallelogram, RestoreError> {
    let lambdas = projective_depths(prj)?;
    let quad = scale_rays(prj, &lambdas, flen);

    let n = (quad.b() - quad.a()).cross(&(quad.c() - quad.a()));
    let angle_to_normal = (n.z / n.norm()).clamp(-1.0, 1.0).acos();

    Ok(Parallelogram {
        quad,
        lambdas,
        angle_to_normal,
    })
}

/// A 3D rectangle together with the focal length that makes it one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub quad: Quad3,
    pub lambdas: [f64; 4],
    pub focal_length: f64,
}

impl Rectangle {
    pub fn side_ratio(&self) -> f64 {
        self.quad.side_ratio()
    }
}

/// Assume `prj` is the image of a rectangle and solve for the focal length.
///
/// The right angle at `a` gives
/// `f² = -(u · v) / ((λ2 - λ1)(λ4 - λ1))` with `u = λ2·b - λ1·a`,
/// `v = λ4·d - λ1·a` taken in the image plane. Small negative `f²` caused by
/// detection noise is folded back with `abs`.
pub fn restore_rectangle(prj: &Quad2) -> Result<Rectangle, RestoreError> {
    let lambdas = projective_depths(prj)?;
    let [l1, l2, _, l4] = lambdas;
    let [a, b, _, d] = prj.vertices;

    let u = b.coords * l2 - a.coords * l1;
    let v = d.coords * l4 - a.coords * l1;
    let den = (l2 - l1) * (l4 - l1);
    if den.abs() < UNOBSERVABLE_FOCAL_EPS {
        return Err(RestoreError::FocalUnobservable);
    }
    let f2 = -u.dot(&v) / den;
    if f2 < 0.0 {
        trace!("negative squared focal length {f2}, using |f2|");
    }
    let focal_length = f2.abs().sqrt();

    let quad = scale_rays(prj, &lambdas, focal_length);
    Ok(Rectangle {
        quad,
        lambdas,
        focal_length,
    })
}

/// Focal length under which `prj` is the image of a rectangle.
pub fn restore_focal_length(prj: &Quad2) -> Result<f64, RestoreError> {
    restore_rectangle(prj).map(|r| r.focal_length)
}
