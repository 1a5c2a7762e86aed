use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SimDims
// ---------------------------------------------------------------------------

/// Problem dimensions of a simulation model.
///
/// Immutable after creation; reported by the model and mirrored by the
/// session for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimDims {
    /// Number of differential states.
    pub nx: usize,
    /// Number of control inputs.
    pub nu: usize,
    /// Number of algebraic variables.
    pub nz: usize,
    /// Number of free model parameters.
    pub np: usize,
}

impl SimDims {
    /// Create dimensions for a plain ODE model (no algebraic variables,
    /// no parameters).
    #[must_use]
    pub const fn new(nx: usize, nu: usize) -> Self {
        Self {
            nx,
            nu,
            nz: 0,
            np: 0,
        }
    }

    /// Set the parameter count. Returns `self` for chaining.
    #[must_use]
    pub const fn with_params(mut self, np: usize) -> Self {
        self.np = np;
        self
    }

    /// Length of the flattened forward-sensitivity matrix `[Sx | Su]`,
    /// column-major: `nx * (nx + nu)`.
    #[must_use]
    pub const fn sensitivity_len(&self) -> usize {
        self.nx * (self.nx + self.nu)
    }
}

impl fmt::Display for SimDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nx={} nu={} nz={} np={}",
            self.nx, self.nu, self.nz, self.np
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
