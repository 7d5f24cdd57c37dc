mod common;

use approx::assert_relative_eq;
use common::Scene;
use quad_rectify::{
    projective_depths, restore_focal_length, restore_fourth_side, restore_parallelogram,
    restore_rectangle, RestoreError,
};

#[test]
fn rectangle_recovers_focal_length_and_aspect() {
    common::init_logging();
    let scene = Scene::a4_page();
    let rect = restore_rectangle(&scene.image()).expect("restorable");

    assert_relative_eq!(rect.focal_length, scene.focal, max_relative = 1e-8);
    assert_relative_eq!(rect.side_ratio(), scene.ratio(), max_relative = 1e-8);
    assert!(rect.quad.cos_angle().abs() < 1e-9);

    // restored up to scale, with `d` on the image plane
    let corners = scene.corners();
    let s = scene.focal / corners[3].z;
    for (got, want) in rect.quad.vertices.iter().zip(&corners) {
        assert_relative_eq!(got.coords, want.coords * s, epsilon = 1e-6);
    }
}

#[test]
fn true_focal_gives_right_angle_and_wrong_focal_does_not() {
    let scene = Scene::a4_page();
    let img = scene.image();

    let exact = restore_parallelogram(&img, scene.focal).expect("restorable");
    assert_relative_eq!(exact.side_ratio(), scene.ratio(), max_relative = 1e-9);
    assert!(exact.cos_angle().abs() < 1e-9);

    let off = restore_parallelogram(&img, 600.0).expect("restorable");
    assert!(off.cos_angle().abs() > 1e-2, "cos {}", off.cos_angle());
    // the depths do not depend on the focal length
    assert_eq!(off.lambdas, exact.lambdas);
}

#[test]
fn opposite_winding_inverts_the_aspect() {
    let scene = Scene::a4_page();
    let img = scene.image();

    let flipped = restore_rectangle(&img.swapped_bd()).expect("restorable");
    assert_relative_eq!(flipped.focal_length, scene.focal, max_relative = 1e-8);
    assert_relative_eq!(flipped.side_ratio(), 1.0 / scene.ratio(), max_relative = 1e-8);

    let f = restore_focal_length(&img.rotated()).expect("restorable");
    assert_relative_eq!(f, scene.focal, max_relative = 1e-8);
}

#[test]
fn crossed_vertex_order_is_rejected() {
    let img = Scene::a4_page().image();
    let crossed = quad_rectify::core::Quad2::new(img.a(), img.c(), img.b(), img.d());
    assert!(matches!(
        projective_depths(&crossed),
        Err(RestoreError::Inconsistent { .. })
    ));
    assert!(restore_rectangle(&crossed).is_err());
}

#[test]
fn fourth_side_completes_the_projected_page() {
    let scene = Scene::a4_page();
    let corners = scene.corners();
    let img = scene.image();

    let side = corners[3] - corners[0];
    let ratio = 1.0 / scene.ratio();
    let q = restore_fourth_side(img.a(), img.b(), &side, ratio, scene.focal)
        .expect("completable");
    for (got, want) in q.vertices.iter().zip(&img.vertices) {
        assert!((got - want).norm() < 1e-6, "got {got:?}, want {want:?}");
    }
}
