use crate::FourthSideError;
use nalgebra::{Point2, Point3, Vector3};
use quad_rectify_core::Quad2;

/// Complete the image of a rectangle from one side and the direction of the
/// two sides adjacent to it.
///
/// `a` and `b` are image vertices (centered coordinates), `direction` is the
/// camera-space direction of the sides `a -> d` and `b -> c` (e.g. from a
/// vanishing point), and `ratio = |ad| / |ab|`. Returns the quad `a, b, c, d`.
pub fn restore_fourth_side(
    a: Point2<f64>,
    b: Point2<f64>,
    direction: &Vector3<f64>,
    ratio: f64,
    flen: f64,
) -> Result<Quad2, FourthSideError> {
    let len = direction.norm();
    if len == 0.0 {
        return Err(FourthSideError::ZeroDirection);
    }
    let pp = direction / len;
    let aa = Vector3::new(a.x, a.y, flen);
    let mut bb = Vector3::new(b.x, b.y, flen);
    let ab = bb - aa;

    // Slide b along its ray until ab is orthogonal to the side direction.
    // qq is the point of line ab orthogonal to the side direction.
    let along = pp.dot(&ab);
    if along.abs() >= 1e-8 {
        let qq = aa - ab * (pp.dot(&aa) / along);
        let n = pp.cross(&qq);
        let nb = n.dot(&bb);
        if nb.abs() < 1e-12 {
            return Err(FourthSideError::InViewingPlane);
        }
        bb *= n.dot(&aa) / nb;
    }

    let t = ratio * (aa - bb).norm();
    let c = bb + pp * t;
    let d = aa + pp * t;

    Ok(Quad2::new(a, b, project(&c, flen)?, project(&d, flen)?))
}

fn project(p: &Vector3<f64>, flen: f64) -> Result<Point2<f64>, FourthSideError> {
    if p.z <= 0.0 {
        return Err(FourthSideError::BehindCamera);
    }
    let s = flen / p.z;
    let p = Point3::from(p * s);
    Ok(Point2::new(p.x, p.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    fn project_pt(p: &Point3<f64>, f: f64) -> Point2<f64> {
        Point2::new(f * p.x / p.z, f * p.y / p.z)
    }

    #[test]
    fn completes_a_tilted_rectangle() {
        let f = 700.0;
        let rot = Rotation3::from_euler_angles(0.3, -0.25, 0.1);
        let center = Vector3::new(15.0, -10.0, 900.0);
        let (w, h) = (300.0, 200.0);
        let corners = [(-w, -h), (w, -h), (w, h), (-w, h)]
            .map(|(x, y)| Point3::from(rot * Vector3::new(x / 2.0, y / 2.0, 0.0) + center));
        let img = corners.map(|p| project_pt(&p, f));

        let side = corners[3] - corners[0];
        let ratio = side.norm() / (corners[1] - corners[0]).norm();
        let q = restore_fourth_side(img[0], img[1], &side, ratio, f).expect("completable");

        for (got, want) in q.vertices.iter().zip(&img) {
            assert!((got - want).norm() < 1e-6, "got {got:?}, want {want:?}");
        }
    }

    #[test]
    fn side_direction_must_be_nonzero() {
        let r = restore_fourth_side(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            &Vector3::zeros(),
            1.0,
            10.0,
        );
        assert_eq!(r, Err(FourthSideError::ZeroDirection));
    }

    #[test]
    fn direction_towards_camera_can_leave_the_view() {
        let r = restore_fourth_side(
            Point2::new(-1.0, 0.0),
            Point2::new(1.0, 0.0),
            &Vector3::new(0.0, 0.0, -1.0),
            50.0,
            10.0,
        );
        assert_eq!(r, Err(FourthSideError::BehindCamera));
    }
}
