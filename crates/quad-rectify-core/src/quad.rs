use nalgebra::{Point, Point2, Point3, SVector, Vector2};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Quadrilateral `<a, b, c, d>` stored as a fixed array of four vertices.
///
/// Vertex order is part of the value: `a, b, c, d` are consecutive corners
/// of the quadrilateral. `[a, c, b, d]` describes a different (usually
/// self-intersecting) shape, and the restorers interpret it as such.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quad<P> {
    pub vertices: [P; 4],
}

/// Image-space quadrilateral.
pub type Quad2 = Quad<Point2<f64>>;
/// Quadrilateral in camera space.
pub type Quad3 = Quad<Point3<f64>>;

impl<P: Copy> Quad<P> {
    pub fn new(a: P, b: P, c: P, d: P) -> Self {
        Self {
            vertices: [a, b, c, d],
        }
    }

    #[inline]
    pub fn a(&self) -> P {
        self.vertices[0]
    }

    #[inline]
    pub fn b(&self) -> P {
        self.vertices[1]
    }

    #[inline]
    pub fn c(&self) -> P {
        self.vertices[2]
    }

    #[inline]
    pub fn d(&self) -> P {
        self.vertices[3]
    }

    /// Vertex `i`, or `None` when `i >= 4`.
    pub fn get(&self, i: usize) -> Option<&P> {
        self.vertices.get(i)
    }

    pub fn map<Q, F: FnMut(P) -> Q>(&self, f: F) -> Quad<Q> {
        Quad {
            vertices: self.vertices.map(f),
        }
    }

    /// `abcd -> dcba`
    pub fn reversed(&self) -> Self {
        let [a, b, c, d] = self.vertices;
        Self::new(d, c, b, a)
    }

    /// `abcd -> adcb`: same polygon, opposite winding, anchored at `a`.
    pub fn swapped_bd(&self) -> Self {
        let [a, b, c, d] = self.vertices;
        Self::new(a, d, c, b)
    }

    /// `abcd -> bcda`
    pub fn rotated(&self) -> Self {
        let [a, b, c, d] = self.vertices;
        Self::new(b, c, d, a)
    }
}

impl<P> Index<usize> for Quad<P> {
    type Output = P;

    fn index(&self, i: usize) -> &P {
        &self.vertices[i]
    }
}

impl<P> IndexMut<usize> for Quad<P> {
    fn index_mut(&mut self, i: usize) -> &mut P {
        &mut self.vertices[i]
    }
}

/// Cosine of the angle between `u` and `v`, clamped to `[-1, 1]`.
///
/// Zero-length input yields `NaN`.
#[inline]
pub fn cos_angle<const D: usize>(u: &SVector<f64, D>, v: &SVector<f64, D>) -> f64 {
    (u.dot(v) / (u.norm() * v.norm())).clamp(-1.0, 1.0)
}

impl<const D: usize> Quad<Point<f64, D>> {
    pub fn perimeter(&self) -> f64 {
        (0..4)
            .map(|i| (self.vertices[(i + 1) % 4] - self.vertices[i]).norm())
            .sum()
    }

    /// `|a - b| / |a - d|`: the side ratio used by the rectangle verifier.
    pub fn side_ratio(&self) -> f64 {
        (self.a() - self.b()).norm() / (self.a() - self.d()).norm()
    }

    /// Cosine of the corner angle at `a`.
    pub fn cos_angle(&self) -> f64 {
        cos_angle(&(self.a() - self.b()), &(self.a() - self.d()))
    }

    /// Short-to-long ratio of the opposite-side sums, in `(0, 1]`.
    pub fn sides_ratio(&self) -> f64 {
        let [a, b, c, d] = self.vertices;
        let len1 = (b - a).norm() + (c - d).norm();
        let len2 = (c - b).norm() + (d - a).norm();
        if len1.max(len2) < 1e-9 {
            return 1.0;
        }
        len1.min(len2) / len1.max(len2)
    }

    fn corner_cosines(&self) -> [f64; 4] {
        let v = &self.vertices;
        std::array::from_fn(|i| {
            let prev = v[(i + 3) % 4];
            let next = v[(i + 1) % 4];
            cos_angle(&(prev - v[i]), &(next - v[i]))
        })
    }

    pub fn max_cos_angle(&self) -> f64 {
        self.corner_cosines()
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min_cos_angle(&self) -> f64 {
        self.corner_cosines()
            .into_iter()
            .fold(f64::INFINITY, f64::min)
    }

    pub fn translate(&self, t: &SVector<f64, D>) -> Self {
        self.map(|p| p + *t)
    }

    pub fn scale(&self, s: f64) -> Self {
        self.map(|p| Point::from(p.coords * s))
    }
}

impl Quad2 {
    /// Area from the diagonals: `|(c - a) x (d - b)| / 2`.
    pub fn area(&self) -> f64 {
        let p: Vector2<f64> = self.c() - self.a();
        let q: Vector2<f64> = self.d() - self.b();
        (p.x * q.y - p.y * q.x).abs() / 2.0
    }

    /// Lift every vertex onto the plane `z = depth`.
    pub fn lift(&self, depth: f64) -> Quad3 {
        self.map(|p| Point3::new(p.x, p.y, depth))
    }
}

impl Quad3 {
    pub fn area(&self) -> f64 {
        (self.c() - self.a()).cross(&(self.d() - self.b())).norm() / 2.0
    }
}
