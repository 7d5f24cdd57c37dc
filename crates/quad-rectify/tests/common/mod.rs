#![allow(dead_code)]

use nalgebra::{Point2, Point3, Rotation3, Vector3};
use quad_rectify::core::Quad2;

/// A physical rectangle placed in front of a pinhole camera.
#[derive(Clone, Copy, Debug)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    /// Roll, pitch, yaw of the rectangle plane in radians.
    pub angles: (f64, f64, f64),
    pub center: Vector3<f64>,
    pub focal: f64,
}

impl Scene {
    /// An A4 page tilted about both image axes.
    pub fn a4_page() -> Self {
        Self {
            width: 297.0,
            height: 210.0,
            angles: (0.35, -0.4, 0.2),
            center: Vector3::new(20.0, -15.0, 650.0),
            focal: 900.0,
        }
    }

    pub fn ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Camera-space corners `a, b, c, d`; `|ab| = width`, `|ad| = height`.
    pub fn corners(&self) -> [Point3<f64>; 4] {
        let (roll, pitch, yaw) = self.angles;
        let rot = Rotation3::from_euler_angles(roll, pitch, yaw);
        let (w, h) = (self.width / 2.0, self.height / 2.0);
        [(-w, -h), (w, -h), (w, h), (-w, h)]
            .map(|(x, y)| Point3::from(rot * Vector3::new(x, y, 0.0) + self.center))
    }

    /// Principal-point-centered image of the rectangle.
    pub fn image(&self) -> Quad2 {
        Quad2 {
            vertices: self.corners().map(|p| {
                assert!(p.z > 0.0, "corner behind the camera");
                Point2::new(self.focal * p.x / p.z, self.focal * p.y / p.z)
            }),
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
