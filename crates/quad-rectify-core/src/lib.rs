//! Core types for projective quadrilateral rectification.
//!
//! This crate only holds value types: the ordered quadrilaterals [`Quad2`] /
//! [`Quad3`] and the pinhole [`PerspectiveModel`] that fixes the coordinate
//! convention used by the restorers in `quad-rectify`. It knows nothing about
//! images or detectors.

mod logger;
mod perspective;
mod quad;

pub use perspective::{
    FocalLength, FocalLengthPreset, PerspectiveModel, FOCAL_FACTOR_DEFAULT, FOCAL_FACTOR_IPHONE4,
    FOCAL_FACTOR_IPHONE4S,
};
pub use quad::{cos_angle, Quad, Quad2, Quad3};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, LOG_ENV_VAR};
