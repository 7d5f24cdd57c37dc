use crate::{Quad2, Quad3};
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Focal length as a multiple of the image width, for the default camera.
pub const FOCAL_FACTOR_DEFAULT: f64 = 0.625;
/// Focal length as a multiple of the image width, iPhone 4 back camera.
pub const FOCAL_FACTOR_IPHONE4: f64 = 0.838;
/// Focal length as a multiple of the image width, iPhone 4S back camera.
pub const FOCAL_FACTOR_IPHONE4S: f64 = 0.932;

/// Named focal-length guesses for an uncalibrated camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocalLengthPreset {
    /// Half of the image diagonal.
    #[default]
    Diagonal,
    /// `0.625 * width`
    Default,
    /// `0.838 * width`
    Iphone4,
    /// `0.932 * width`
    Iphone4s,
}

impl FocalLengthPreset {
    pub fn resolve(self, width: f64, height: f64) -> f64 {
        match self {
            FocalLengthPreset::Diagonal => 0.5 * (width * width + height * height).sqrt(),
            FocalLengthPreset::Default => FOCAL_FACTOR_DEFAULT * width,
            FocalLengthPreset::Iphone4 => FOCAL_FACTOR_IPHONE4 * width,
            FocalLengthPreset::Iphone4s => FOCAL_FACTOR_IPHONE4S * width,
        }
    }
}

/// Focal length in pixels, or a preset to derive it from the image size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocalLength {
    Explicit(f64),
    Preset(FocalLengthPreset),
}

impl Default for FocalLength {
    fn default() -> Self {
        FocalLength::Preset(FocalLengthPreset::default())
    }
}

impl FocalLength {
    pub fn resolve(self, width: f64, height: f64) -> f64 {
        match self {
            FocalLength::Explicit(f) => f,
            FocalLength::Preset(p) => p.resolve(width, height),
        }
    }
}

/// Pinhole camera looking down `+z` with the principal point at the image center.
///
/// 2D points are pixel coordinates with the origin in the top-left image
/// corner. 3D points live in camera space: `x, y` are measured from the
/// principal point and `z` is depth in pixel units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveModel {
    pub width: f64,
    pub height: f64,
    pub focal_length: f64,
}

impl PerspectiveModel {
    /// Model with the focal length defaulted to half of the image diagonal.
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_focal(width, height, FocalLength::default())
    }

    pub fn with_focal(width: f64, height: f64, focal: FocalLength) -> Self {
        Self {
            width,
            height,
            focal_length: focal.resolve(width, height),
        }
    }

    #[inline]
    pub fn principal_point(&self) -> Point2<f64> {
        Point2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Pixel position of the camera-space point `p`, ignoring depth.
    #[inline]
    pub fn to_2d(&self, p: &Point3<f64>) -> Point2<f64> {
        Point2::new(p.x + self.width / 2.0, p.y + self.height / 2.0)
    }

    /// Camera-space ray through pixel `p`, taken at depth `focal_length`.
    #[inline]
    pub fn to_3d(&self, p: &Point2<f64>) -> Point3<f64> {
        Point3::new(
            p.x - self.width / 2.0,
            p.y - self.height / 2.0,
            self.focal_length,
        )
    }

    /// Shift a pixel-space quad so that the principal point becomes the origin.
    ///
    /// The restorers expect their input in these centered coordinates.
    pub fn quad_to_centered(&self, quad: &Quad2) -> Quad2 {
        let c = self.principal_point();
        quad.map(|p| Point2::new(p.x - c.x, p.y - c.y))
    }

    pub fn quad_to_3d(&self, quad: &Quad2) -> Quad3 {
        quad.map(|p| self.to_3d(&p))
    }

    /// Pinhole projection of a camera-space point to pixel coordinates.
    ///
    /// Returns `None` for points on or behind the camera plane.
    pub fn project(&self, p: &Point3<f64>) -> Option<Point2<f64>> {
        if p.z <= 0.0 {
            return None;
        }
        let s = self.focal_length / p.z;
        Some(self.to_2d(&Point3::new(p.x * s, p.y * s, self.focal_length)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_focal_is_half_diagonal() {
        let m = PerspectiveModel::new(300.0, 400.0);
        assert_relative_eq!(m.focal_length, 250.0);
    }

    #[test]
    fn presets_scale_with_width() {
        assert_relative_eq!(FocalLengthPreset::Default.resolve(1000.0, 1.0), 625.0);
        assert_relative_eq!(FocalLengthPreset::Iphone4.resolve(1000.0, 1.0), 838.0);
        assert_relative_eq!(FocalLengthPreset::Iphone4s.resolve(1000.0, 1.0), 932.0);
        assert_relative_eq!(FocalLength::Explicit(17.0).resolve(1000.0, 1.0), 17.0);
    }

    #[test]
    fn to_3d_then_to_2d_is_identity() {
        let m = PerspectiveModel::with_focal(640.0, 480.0, FocalLength::Explicit(500.0));
        let p = Point2::new(12.5, 470.0);
        let r = m.to_3d(&p);
        assert_relative_eq!(r.x, 12.5 - 320.0);
        assert_relative_eq!(r.y, 470.0 - 240.0);
        assert_relative_eq!(r.z, 500.0);
        assert_eq!(m.to_2d(&r), p);
    }

    #[test]
    fn projection_divides_by_depth() {
        let m = PerspectiveModel::with_focal(200.0, 100.0, FocalLength::Explicit(50.0));
        let p = m.project(&Point3::new(10.0, -20.0, 100.0)).expect("in front");
        assert_relative_eq!(p.x, 105.0);
        assert_relative_eq!(p.y, 40.0);
        assert!(m.project(&Point3::new(1.0, 1.0, -1.0)).is_none());
    }

    #[test]
    fn focal_length_config_round_trips_through_json() {
        let f: FocalLength = serde_json::from_str(r#"{"preset":"iphone4s"}"#).expect("parse");
        assert_eq!(f, FocalLength::Preset(FocalLengthPreset::Iphone4s));
        let f: FocalLength = serde_json::from_str(r#"{"explicit":812.5}"#).expect("parse");
        assert_eq!(f, FocalLength::Explicit(812.5));
    }
}
