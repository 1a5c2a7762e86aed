//! Differential-drive mobile robot dynamics.
//!
//! Unicycle kinematics with a 3-dimensional state and 2-dimensional input:
//!
//! ```text
//! x = [p_x, p_y, θ]     u = [v, ω]
//!
//! ṗ_x = v cos θ
//! ṗ_y = v sin θ
//! θ̇   = ω
//! ```
//!
//! The Jacobians are analytic:
//!
//! ```text
//! A = df/dx = [0  0  -v sin θ]     B = df/du = [cos θ  0]
//!             [0  0   v cos θ]                 [sin θ  0]
//!             [0  0   0      ]                 [0      1]
//! ```
//!
//! The model has no free parameters.

use nalgebra::{Matrix3, SMatrix, Vector2, Vector3};

use trundle_core::model::ExplicitOde;

/// State dimension of the mobile robot.
pub const NX: usize = 3;
/// Input dimension of the mobile robot.
pub const NU: usize = 2;

/// Differential-drive mobile robot (unicycle) model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MobileRobot;

impl MobileRobot {
    /// Create a new mobile robot model.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ExplicitOde<NX, NU> for MobileRobot {
    fn rhs(&self, x: &Vector3<f64>, u: &Vector2<f64>) -> Vector3<f64> {
        let theta = x[2];
        let (v, omega) = (u[0], u[1]);
        Vector3::new(v * theta.cos(), v * theta.sin(), omega)
    }

    fn jacobians(
        &self,
        x: &Vector3<f64>,
        u: &Vector2<f64>,
    ) -> (Matrix3<f64>, SMatrix<f64, NX, NU>) {
        let theta = x[2];
        let v = u[0];
        let (st, ct) = theta.sin_cos();

        let mut a = Matrix3::zeros();
        a[(0, 2)] = -v * st;
        a[(1, 2)] = v * ct;

        let mut b = SMatrix::<f64, NX, NU>::zeros();
        b[(0, 0)] = ct;
        b[(1, 0)] = st;
        b[(2, 1)] = 1.0;

        (a, b)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "MobileRobot"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
