//! Perspective restoration and rectangularity checks for quadrilaterals.
//!
//! Given the four image corners of something that should be a planar
//! rectangle (a photographed page, card or ID document), this crate
//!
//! - lifts them to the 3D parallelogram they project from for a known focal
//!   length ([`restore_parallelogram`]),
//! - solves the focal length under the right-angle assumption
//!   ([`restore_rectangle`], [`restore_focal_length`]),
//! - decides whether detection noise of a given size can explain the
//!   remaining deviation from a rectangle of known aspect
//!   ([`is_rectangle`], [`error_distance`], [`normal_check`]),
//! - differentiates the restored aspect and corner angle with respect to the
//!   input corners for refinement loops ([`analytical_jacobian`],
//!   [`numerical_jacobian`]).
//!
//! All inputs are principal-point-centered image coordinates; use
//! [`core::PerspectiveModel`] to convert from pixels.
//!
//! ## Quickstart
//!
//! ```
//! use nalgebra::Point2;
//! use quad_rectify::{is_rectangle, restore_parallelogram};
//! use quad_rectify::core::Quad2;
//!
//! let quad = Quad2::new(
//!     Point2::new(0.0, 0.0),
//!     Point2::new(1.0, 0.0),
//!     Point2::new(1.0, 1.0),
//!     Point2::new(0.0, 1.0),
//! );
//! let restored = restore_parallelogram(&quad, 2.0).expect("convex quad");
//! assert!((restored.side_ratio() - 1.0).abs() < 1e-9);
//! assert!(is_rectangle(&quad, 2.0, 1.0, 0.01));
//! ```
//!
//! ## Features
//! - `cli` (default): the `quad-rectify` command-line tool.
//! - `parallel`: batch helpers run on the rayon thread pool.
//! - `tracing`: spans around the batch and bisection entry points.

mod error;
mod fourth_side;
pub mod io;
mod jacobian;
mod restore;
mod verify;

pub use quad_rectify_core as core;

pub use error::{FourthSideError, JacobianError, RestoreError};
pub use fourth_side::restore_fourth_side;
pub use jacobian::{
    analytical_jacobian, coordinate_index, numerical_jacobian, numerical_jacobian_with, Jacobian,
    NumericalJacobianParams, COORDINATES,
};
pub use restore::{
    projective_depths, restore_focal_length, restore_parallelogram, restore_rectangle,
    Parallelogram, Rectangle, DEGENERATE_DET_EPS,
};
pub use verify::{
    delta_neighborhood, error_distance, error_distance_with, error_distances, is_rectangle,
    normal_check, perturbation_sweep, verify_batch, BisectionParams, RectangleCheckParams,
    SweepRange, SWEEP_CANDIDATES,
};
