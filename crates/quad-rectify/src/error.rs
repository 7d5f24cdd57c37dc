/// Why a quadrilateral could not be lifted to a 3D parallelogram or rectangle.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum RestoreError {
    /// The projective-depth system is singular (e.g. collinear vertices).
    #[error("degenerate vertex configuration (determinant {det:e})")]
    Degenerate { det: f64 },
    /// Some projective depth is not positive: the vertex order or winding is
    /// not that of a convex planar quadrilateral seen from the front.
    #[error("inconsistent projective depths {lambdas:?}")]
    Inconsistent { lambdas: [f64; 4] },
    /// The right-angle constraint does not involve the focal length, which
    /// happens when the rectangle is fronto-parallel along one of its sides.
    #[error("focal length is not observable from this quadrilateral")]
    FocalUnobservable,
}

/// Errors returned by the Jacobian estimators.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum JacobianError {
    #[error("restoration failed at the unperturbed quadrilateral: {0}")]
    Restore(#[from] RestoreError),
    /// A finite-difference sample around `coordinate` could not be restored,
    /// so the corresponding row would be meaningless.
    #[error("finite-difference sample for coordinate {coordinate} failed: {source}")]
    UnreliableSample {
        coordinate: usize,
        source: RestoreError,
    },
    #[error("side lengths of the restored shape vanish")]
    DegenerateForm,
}

/// Errors returned by [`crate::restore_fourth_side`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum FourthSideError {
    #[error("side direction has zero length")]
    ZeroDirection,
    #[error("side direction lies in the viewing plane of the known side")]
    InViewingPlane,
    #[error("completed vertex lies on or behind the camera plane")]
    BehindCamera,
}
