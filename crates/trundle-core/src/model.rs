use nalgebra::{SMatrix, SVector};

use crate::error::ModelError;
use crate::types::SimDims;

// ---------------------------------------------------------------------------
// ExplicitOde
// ---------------------------------------------------------------------------

/// An explicit, parameterized ODE model `xdot = f(x, u)`.
///
/// This is the seam between a dynamics model and the integrator: the
/// model supplies the vector field and its analytic Jacobians, and the
/// provided [`vde_forw`](Self::vde_forw) composes them into the forward
/// variational equation used for sensitivity propagation.
pub trait ExplicitOde<const NX: usize, const NU: usize> {
    /// Evaluate the vector field `f(x, u)`.
    fn rhs(&self, x: &SVector<f64, NX>, u: &SVector<f64, NU>) -> SVector<f64, NX>;

    /// Evaluate the Jacobians `A = df/dx` and `B = df/du`.
    fn jacobians(
        &self,
        x: &SVector<f64, NX>,
        u: &SVector<f64, NU>,
    ) -> (SMatrix<f64, NX, NX>, SMatrix<f64, NX, NU>);

    /// Forward variational equation: given the state and the current
    /// sensitivities `Sx = dx/dx0`, `Su = dx/du`, returns
    /// `(f(x, u), A·Sx, A·Su + B)`.
    fn vde_forw(
        &self,
        x: &SVector<f64, NX>,
        u: &SVector<f64, NU>,
        sx: &SMatrix<f64, NX, NX>,
        su: &SMatrix<f64, NX, NU>,
    ) -> (
        SVector<f64, NX>,
        SMatrix<f64, NX, NX>,
        SMatrix<f64, NX, NU>,
    ) {
        let (a, b) = self.jacobians(x, u);
        (self.rhs(x, u), a * sx, a * su + b)
    }

    /// Problem dimensions of this model.
    fn dims(&self) -> SimDims {
        SimDims::new(NX, NU).with_params(self.param_count())
    }

    /// Number of free model parameters.
    fn param_count(&self) -> usize {
        0
    }

    /// Push new parameter values into the model.
    ///
    /// Rejects a slice whose length differs from
    /// [`param_count`](Self::param_count). Models with parameters must
    /// override this to also store the values; the default only enforces
    /// the contract, which is exact for parameter-free models.
    fn set_params(&mut self, params: &[f64]) -> Result<(), ModelError> {
        if params.len() != self.param_count() {
            return Err(ModelError::ParamCountMismatch {
                expected: self.param_count(),
                got: params.len(),
            });
        }
        Ok(())
    }

    /// Human-readable name for this model.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
