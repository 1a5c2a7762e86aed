//! Fixed-step explicit Runge-Kutta integration with forward sensitivity
//! propagation.
//!
//! The integrator advances the state and the forward sensitivities
//! `Sx = dx/dx0`, `Su = dx/du` through the same quadrature: each stage
//! evaluates the model's forward variational equation, so the discrete
//! sensitivities are the exact derivatives of the discrete state map.
//!
//! Supported schemes (by stage count, matching the accepted option
//! values): explicit Euler (1), Heun (2) and the classical RK4 (4).

use nalgebra::{SMatrix, SVector};

use trundle_core::config::SimConfig;
use trundle_core::error::{ConfigError, SimError};
use trundle_core::model::ExplicitOde;

/// Largest supported stage count.
pub const MAX_STAGES: usize = 4;

// ---------------------------------------------------------------------------
// ButcherTableau
// ---------------------------------------------------------------------------

/// Butcher tableau of an explicit Runge-Kutta scheme.
///
/// Coefficients are stored in fixed `MAX_STAGES`-sized arrays; only the
/// leading `stages` entries are meaningful.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButcherTableau {
    a: [[f64; MAX_STAGES]; MAX_STAGES],
    b: [f64; MAX_STAGES],
    c: [f64; MAX_STAGES],
    stages: usize,
}

impl ButcherTableau {
    /// Explicit Euler (1 stage, order 1).
    #[must_use]
    pub const fn euler() -> Self {
        let mut b = [0.0; MAX_STAGES];
        b[0] = 1.0;
        Self {
            a: [[0.0; MAX_STAGES]; MAX_STAGES],
            b,
            c: [0.0; MAX_STAGES],
            stages: 1,
        }
    }

    /// Heun's method (2 stages, order 2).
    #[must_use]
    pub const fn heun() -> Self {
        let mut a = [[0.0; MAX_STAGES]; MAX_STAGES];
        a[1][0] = 1.0;
        let mut b = [0.0; MAX_STAGES];
        b[0] = 0.5;
        b[1] = 0.5;
        let mut c = [0.0; MAX_STAGES];
        c[1] = 1.0;
        Self { a, b, c, stages: 2 }
    }

    /// Classical Runge-Kutta (4 stages, order 4).
    #[must_use]
    pub const fn rk4() -> Self {
        let mut a = [[0.0; MAX_STAGES]; MAX_STAGES];
        a[1][0] = 0.5;
        a[2][1] = 0.5;
        a[3][2] = 1.0;
        let b = [1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0];
        let c = [0.0, 0.5, 0.5, 1.0];
        Self { a, b, c, stages: 4 }
    }

    /// Look up the tableau for a stage count.
    pub fn for_stages(stages: usize) -> Result<Self, ConfigError> {
        match stages {
            1 => Ok(Self::euler()),
            2 => Ok(Self::heun()),
            4 => Ok(Self::rk4()),
            other => Err(ConfigError::UnsupportedStageCount(other)),
        }
    }

    /// Number of stages.
    #[must_use]
    pub const fn stages(&self) -> usize {
        self.stages
    }

    /// Coupling coefficient `a[i][j]`.
    #[must_use]
    pub const fn coeff(&self, i: usize, j: usize) -> f64 {
        self.a[i][j]
    }

    /// Quadrature weight `b[i]`.
    #[must_use]
    pub const fn weight(&self, i: usize) -> f64 {
        self.b[i]
    }

    /// Stage node `c[i]`.
    #[must_use]
    pub const fn node(&self, i: usize) -> f64 {
        self.c[i]
    }
}

// ---------------------------------------------------------------------------
// ErkSolution
// ---------------------------------------------------------------------------

/// Result of one integration over the horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErkSolution<const NX: usize, const NU: usize> {
    /// Propagated state `x(T)`.
    pub x: SVector<f64, NX>,
    /// Propagated state sensitivity `Sx(T) = dx(T)/dx0`.
    pub sx: SMatrix<f64, NX, NX>,
    /// Propagated input sensitivity `Su(T) = dx(T)/du`.
    pub su: SMatrix<f64, NX, NU>,
}

// ---------------------------------------------------------------------------
// ErkIntegrator
// ---------------------------------------------------------------------------

/// Fixed-step explicit Runge-Kutta integrator.
///
/// Built once per session from a [`SimConfig`] (the precompute pass:
/// option validation and tableau construction), then reused across
/// repeated solves.
#[derive(Debug, Clone, PartialEq)]
pub struct ErkIntegrator {
    tableau: ButcherTableau,
    num_steps: usize,
}

impl ErkIntegrator {
    /// Build an integrator from validated configuration.
    pub fn new(config: &SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tableau: ButcherTableau::for_stages(config.num_stages)?,
            num_steps: config.num_steps,
        })
    }

    /// Number of integration steps per solve.
    #[must_use]
    pub const fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// The Butcher tableau in use.
    #[must_use]
    pub const fn tableau(&self) -> &ButcherTableau {
        &self.tableau
    }

    /// Integrate state and forward sensitivities over `horizon`.
    ///
    /// The control `u` is held constant over the horizon (zero-order
    /// hold). Returns [`SimError::StateNotFinite`] if the result
    /// contains NaN or infinity.
    #[allow(clippy::cast_precision_loss)]
    pub fn integrate<M, const NX: usize, const NU: usize>(
        &self,
        model: &M,
        horizon: f64,
        x0: &SVector<f64, NX>,
        u: &SVector<f64, NU>,
        sx0: &SMatrix<f64, NX, NX>,
        su0: &SMatrix<f64, NX, NU>,
    ) -> Result<ErkSolution<NX, NU>, SimError>
    where
        M: ExplicitOde<NX, NU>,
    {
        let h = horizon / self.num_steps as f64;
        let stages = self.tableau.stages;

        let mut x = *x0;
        let mut sx = *sx0;
        let mut su = *su0;

        let mut kx = [SVector::<f64, NX>::zeros(); MAX_STAGES];
        let mut ksx = [SMatrix::<f64, NX, NX>::zeros(); MAX_STAGES];
        let mut ksu = [SMatrix::<f64, NX, NU>::zeros(); MAX_STAGES];

        for _ in 0..self.num_steps {
            for i in 0..stages {
                let mut xi = x;
                let mut sxi = sx;
                let mut sui = su;
                for j in 0..i {
                    let a_ij = self.tableau.a[i][j];
                    if a_ij != 0.0 {
                        xi += h * a_ij * kx[j];
                        sxi += h * a_ij * ksx[j];
                        sui += h * a_ij * ksu[j];
                    }
                }
                let (fx, fsx, fsu) = model.vde_forw(&xi, u, &sxi, &sui);
                kx[i] = fx;
                ksx[i] = fsx;
                ksu[i] = fsu;
            }
            for i in 0..stages {
                let b_i = self.tableau.b[i];
                x += h * b_i * kx[i];
                sx += h * b_i * ksx[i];
                su += h * b_i * ksu[i];
            }
        }

        let finite = x.iter().all(|v| v.is_finite())
            && sx.iter().all(|v| v.is_finite())
            && su.iter().all(|v| v.is_finite());
        if !finite {
            return Err(SimError::StateNotFinite);
        }

        Ok(ErkSolution { x, sx, su })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
