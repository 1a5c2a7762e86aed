//! Simulation session lifecycle.
//!
//! A [`SimSession`] owns everything a solve needs: the dynamics model,
//! the solver configuration, the precomputed integrator and the
//! input/output buffers. Creation seeds the buffers with defaults
//! (zero state and control, identity-concat-zero sensitivity seed),
//! repeated solves reuse the integrator, and dropping the session
//! releases everything. Each session is independent; nothing is shared
//! between sessions.

use nalgebra::{SMatrix, SVector};

use trundle_core::config::SimConfig;
use trundle_core::error::{ConfigError, ModelError, SimError, TrundleError};
use trundle_core::model::ExplicitOde;
use trundle_core::types::SimDims;
use trundle_dynamics::MobileRobot;

use crate::erk::ErkIntegrator;

// ---------------------------------------------------------------------------
// SimIn
// ---------------------------------------------------------------------------

/// Input buffer read by each solve: integration horizon, current state,
/// current control and the forward sensitivity seed.
///
/// The seed is stored split as `Sx` (w.r.t. the initial state) and `Su`
/// (w.r.t. the control); the flattened column-major `[Sx | Su]` layout
/// is available through [`seed_flat`](Self::seed_flat).
#[derive(Debug, Clone, PartialEq)]
pub struct SimIn<const NX: usize, const NU: usize> {
    horizon: f64,
    x: SVector<f64, NX>,
    u: SVector<f64, NU>,
    sx: SMatrix<f64, NX, NX>,
    su: SMatrix<f64, NX, NU>,
}

impl<const NX: usize, const NU: usize> SimIn<NX, NU> {
    fn seeded(horizon: f64) -> Self {
        Self {
            horizon,
            x: SVector::zeros(),
            u: SVector::zeros(),
            sx: SMatrix::identity(),
            su: SMatrix::zeros(),
        }
    }

    /// Integration horizon in seconds.
    #[must_use]
    pub const fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Current state vector.
    #[must_use]
    pub const fn state(&self) -> &SVector<f64, NX> {
        &self.x
    }

    /// Current control vector.
    #[must_use]
    pub const fn control(&self) -> &SVector<f64, NU> {
        &self.u
    }

    /// Sensitivity seed w.r.t. the initial state.
    #[must_use]
    pub const fn seed_x(&self) -> &SMatrix<f64, NX, NX> {
        &self.sx
    }

    /// Sensitivity seed w.r.t. the control.
    #[must_use]
    pub const fn seed_u(&self) -> &SMatrix<f64, NX, NU> {
        &self.su
    }

    /// Set the state vector.
    pub fn set_state(&mut self, x: SVector<f64, NX>) {
        self.x = x;
    }

    /// Set the control vector.
    pub fn set_control(&mut self, u: SVector<f64, NU>) {
        self.u = u;
    }

    /// Set the integration horizon. Rejects non-finite or non-positive
    /// values.
    pub fn set_horizon(&mut self, horizon: f64) -> Result<(), ConfigError> {
        if !horizon.is_finite() || horizon <= 0.0 {
            return Err(ConfigError::InvalidHorizon(horizon));
        }
        self.horizon = horizon;
        Ok(())
    }

    /// Set the sensitivity seed.
    pub fn set_sensitivity_seed(
        &mut self,
        sx: SMatrix<f64, NX, NX>,
        su: SMatrix<f64, NX, NU>,
    ) {
        self.sx = sx;
        self.su = su;
    }

    /// Restore the default seed: identity w.r.t. the initial state,
    /// zero w.r.t. the control.
    pub fn reset_sensitivity_seed(&mut self) {
        self.sx = SMatrix::identity();
        self.su = SMatrix::zeros();
    }

    /// Flattened column-major `[Sx | Su]` seed, length `NX * (NX + NU)`.
    #[must_use]
    pub fn seed_flat(&self) -> Vec<f64> {
        self.sx.iter().chain(self.su.iter()).copied().collect()
    }
}

// ---------------------------------------------------------------------------
// SimOut
// ---------------------------------------------------------------------------

/// Output buffer overwritten by each solve: the propagated state and
/// sensitivities at the end of the horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct SimOut<const NX: usize, const NU: usize> {
    x: SVector<f64, NX>,
    sx: SMatrix<f64, NX, NX>,
    su: SMatrix<f64, NX, NU>,
}

impl<const NX: usize, const NU: usize> SimOut<NX, NU> {
    fn zeroed() -> Self {
        Self {
            x: SVector::zeros(),
            sx: SMatrix::zeros(),
            su: SMatrix::zeros(),
        }
    }

    /// Propagated state `x(T)`.
    #[must_use]
    pub const fn state(&self) -> &SVector<f64, NX> {
        &self.x
    }

    /// Propagated sensitivity `dx(T)/dx0`.
    #[must_use]
    pub const fn sensitivity_x(&self) -> &SMatrix<f64, NX, NX> {
        &self.sx
    }

    /// Propagated sensitivity `dx(T)/du`.
    #[must_use]
    pub const fn sensitivity_u(&self) -> &SMatrix<f64, NX, NU> {
        &self.su
    }

    /// Flattened column-major `[Sx | Su]`, length `NX * (NX + NU)`.
    #[must_use]
    pub fn sensitivity_flat(&self) -> Vec<f64> {
        self.sx.iter().chain(self.su.iter()).copied().collect()
    }
}

// ---------------------------------------------------------------------------
// SimSession
// ---------------------------------------------------------------------------

/// An owned simulation session around a dynamics model.
///
/// Create with [`SimSession::new`], drive with [`solve`](Self::solve)
/// and the input accessors, tear down by dropping. The lifecycle
/// `Uninitialized -> Created -> (Solving | Updating)* -> Freed` is
/// enforced by ownership: no operation exists on a session that has not
/// been created or has been dropped.
#[derive(Debug, Clone)]
pub struct SimSession<M, const NX: usize, const NU: usize>
where
    M: ExplicitOde<NX, NU>,
{
    model: M,
    config: SimConfig,
    dims: SimDims,
    integrator: ErkIntegrator,
    input: SimIn<NX, NU>,
    output: SimOut<NX, NU>,
}

impl<M, const NX: usize, const NU: usize> SimSession<M, NX, NU>
where
    M: ExplicitOde<NX, NU>,
{
    /// Create a session: validate the configuration, build the
    /// integrator and seed the input buffer with defaults (zero state
    /// and control, identity-concat-zero sensitivity seed).
    pub fn new(model: M, config: SimConfig) -> Result<Self, TrundleError> {
        let integrator = ErkIntegrator::new(&config).map_err(TrundleError::Config)?;
        let dims = model.dims();
        let input = SimIn::seeded(config.horizon);
        Ok(Self {
            model,
            config,
            dims,
            integrator,
            input,
            output: SimOut::zeroed(),
        })
    }

    /// Integrate from the current input buffer, writing the output
    /// buffer.
    ///
    /// On failure the error is logged and returned; the output buffer
    /// keeps its previous contents. Identical inputs produce
    /// bit-identical outputs.
    pub fn solve(&mut self) -> Result<(), SimError> {
        match self.integrator.integrate(
            &self.model,
            self.input.horizon,
            &self.input.x,
            &self.input.u,
            &self.input.sx,
            &self.input.su,
        ) {
            Ok(sol) => {
                self.output.x = sol.x;
                self.output.sx = sol.sx;
                self.output.su = sol.su;
                Ok(())
            }
            Err(e) => {
                tracing::error!("trundle-sim: solve failed for {}: {e}", self.model.name());
                Err(e)
            }
        }
    }

    /// Push new parameter values into the model. A slice whose length
    /// differs from the model's parameter count is rejected.
    pub fn update_params(&mut self, params: &[f64]) -> Result<(), ModelError> {
        self.model.set_params(params)
    }

    /// Solver configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Problem dimensions.
    #[must_use]
    pub const fn dims(&self) -> &SimDims {
        &self.dims
    }

    /// The dynamics model.
    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Read-only view of the input buffer.
    #[must_use]
    pub const fn sim_in(&self) -> &SimIn<NX, NU> {
        &self.input
    }

    /// Mutable access to the input buffer (all mutation goes through
    /// its validating setters).
    pub const fn sim_in_mut(&mut self) -> &mut SimIn<NX, NU> {
        &mut self.input
    }

    /// Read-only view of the output buffer.
    #[must_use]
    pub const fn sim_out(&self) -> &SimOut<NX, NU> {
        &self.output
    }

    /// Set the state in the input buffer.
    pub fn set_state(&mut self, x: SVector<f64, NX>) {
        self.input.set_state(x);
    }

    /// Set the control in the input buffer.
    pub fn set_control(&mut self, u: SVector<f64, NU>) {
        self.input.set_control(u);
    }
}

// ---------------------------------------------------------------------------
// Mobile robot session
// ---------------------------------------------------------------------------

/// Session type for the differential-drive mobile robot.
pub type MobileRobotSession = SimSession<MobileRobot, 3, 2>;

/// Create a pre-wired simulation session for the mobile robot model.
pub fn mobile_robot_session(config: SimConfig) -> Result<MobileRobotSession, TrundleError> {
    SimSession::new(MobileRobot::new(), config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector2, Vector3};

    fn session() -> MobileRobotSession {
        mobile_robot_session(SimConfig::default()).unwrap()
    }

    // ---- create ----

    #[test]
    fn create_seeds_defaults() {
        let s = session();
        assert_relative_eq!(*s.sim_in().state(), Vector3::zeros(), epsilon = 1e-15);
        assert_relative_eq!(*s.sim_in().control(), Vector2::zeros(), epsilon = 1e-15);
        assert!((s.sim_in().horizon() - 0.2).abs() < f64::EPSILON);

        // Column-major [Sx | Su]: 3x3 identity then 3x2 zeros
        let expected = [
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0, //
            0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0,
        ];
        assert_eq!(s.sim_in().seed_flat(), expected);
    }

    #[test]
    fn create_rejects_invalid_config() {
        let config = SimConfig {
            num_stages: 3,
            ..SimConfig::default()
        };
        let err = mobile_robot_session(config).unwrap_err();
        assert!(matches!(
            err,
            TrundleError::Config(ConfigError::UnsupportedStageCount(3))
        ));
    }

    #[test]
    fn create_reports_dims() {
        let s = session();
        assert_eq!(s.dims().nx, 3);
        assert_eq!(s.dims().nu, 2);
        assert_eq!(s.dims().nz, 0);
        assert_eq!(s.dims().np, 0);
    }

    #[test]
    fn sessions_are_independent() {
        let mut a = session();
        let mut b = session();
        a.set_control(Vector2::new(1.0, 0.0));
        a.solve().unwrap();
        b.solve().unwrap();
        assert!(a.sim_out().state()[0] > 0.1);
        assert_relative_eq!(*b.sim_out().state(), Vector3::zeros(), epsilon = 1e-15);
    }

    // ---- solve ----

    #[test]
    fn solve_at_rest_leaves_state_and_seed() {
        let mut s = session();
        s.solve().unwrap();

        // Zero control: the robot does not move and A = 0 along the
        // trajectory, so Sx stays exactly at the identity seed.
        assert_relative_eq!(*s.sim_out().state(), Vector3::zeros(), epsilon = 1e-15);
        assert_relative_eq!(
            *s.sim_out().sensitivity_x(),
            Matrix3::identity(),
            epsilon = 1e-15
        );

        // B is constant along the trajectory, so Su = B * T exactly:
        // dx/dv = T cos(0) = 0.2, dθ/dω = T = 0.2.
        let su = s.sim_out().sensitivity_u();
        assert_relative_eq!(su[(0, 0)], 0.2, epsilon = 1e-15);
        assert_relative_eq!(su[(1, 0)], 0.0, epsilon = 1e-15);
        assert_relative_eq!(su[(2, 1)], 0.2, epsilon = 1e-15);
        assert_relative_eq!(su[(0, 1)], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn solve_is_deterministic() {
        let mut s = session();
        s.set_state(Vector3::new(0.1, -0.3, 0.5));
        s.set_control(Vector2::new(0.8, -0.6));

        s.solve().unwrap();
        let first = s.sim_out().clone();
        s.solve().unwrap();

        // Bit-identical: solve reads the input buffer and does not feed
        // the output back.
        assert_eq!(*s.sim_out(), first);
    }

    #[test]
    fn solve_straight_line() {
        let mut s = session();
        s.set_control(Vector2::new(1.0, 0.0));
        s.solve().unwrap();

        // Heading constant at 0: integration is exact.
        let x = s.sim_out().state();
        assert_relative_eq!(x[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-15);
        assert_relative_eq!(x[2], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn solve_pure_rotation() {
        let mut s = session();
        s.set_control(Vector2::new(0.0, 1.0));
        s.solve().unwrap();

        let x = s.sim_out().state();
        assert_relative_eq!(x[0], 0.0, epsilon = 1e-15);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-15);
        assert_relative_eq!(x[2], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn solve_arc_matches_closed_form() {
        // v = ω = 1 from the origin: x(t) = sin t, y(t) = 1 - cos t,
        // θ(t) = t.
        let config = SimConfig {
            num_steps: 4,
            ..SimConfig::default()
        };
        let mut s = mobile_robot_session(config).unwrap();
        s.set_control(Vector2::new(1.0, 1.0));
        s.solve().unwrap();

        let t = 0.2_f64;
        let x = s.sim_out().state();
        assert_relative_eq!(x[0], t.sin(), epsilon = 1e-7);
        assert_relative_eq!(x[1], 1.0 - t.cos(), epsilon = 1e-7);
        assert_relative_eq!(x[2], t, epsilon = 1e-12);
    }

    #[test]
    fn solve_does_not_mutate_input() {
        let mut s = session();
        s.set_state(Vector3::new(0.3, 0.1, -0.2));
        s.set_control(Vector2::new(0.5, 0.5));
        let input_before = s.sim_in().clone();
        s.solve().unwrap();
        assert_eq!(*s.sim_in(), input_before);
    }

    // ---- update_params ----

    #[test]
    fn update_params_empty_is_ok() {
        let mut s = session();
        assert!(s.update_params(&[]).is_ok());
    }

    #[test]
    fn update_params_nonempty_is_rejected() {
        let mut s = session();
        let err = s.update_params(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ModelError::ParamCountMismatch {
                expected: 0,
                got: 2
            }
        );
    }

    // ---- input buffer accessors ----

    #[test]
    fn set_horizon_validates() {
        let mut s = session();
        assert!(s.sim_in_mut().set_horizon(0.5).is_ok());
        assert!((s.sim_in().horizon() - 0.5).abs() < f64::EPSILON);

        let err = s.sim_in_mut().set_horizon(-1.0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHorizon(_)));
        // Rejected value leaves the horizon untouched
        assert!((s.sim_in().horizon() - 0.5).abs() < f64::EPSILON);

        assert!(s.sim_in_mut().set_horizon(f64::NAN).is_err());
    }

    #[test]
    fn sensitivity_seed_roundtrip() {
        let mut s = session();
        let sx = Matrix3::new(2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0);
        let su = nalgebra::SMatrix::<f64, 3, 2>::zeros();
        s.sim_in_mut().set_sensitivity_seed(sx, su);
        assert_relative_eq!(*s.sim_in().seed_x(), sx, epsilon = 1e-15);

        s.sim_in_mut().reset_sensitivity_seed();
        assert_relative_eq!(
            *s.sim_in().seed_x(),
            Matrix3::identity(),
            epsilon = 1e-15
        );
        assert_relative_eq!(
            *s.sim_in().seed_u(),
            nalgebra::SMatrix::<f64, 3, 2>::zeros(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn scaled_seed_scales_sensitivities() {
        // Sensitivity propagation is linear in the seed.
        let mut s = session();
        s.set_control(Vector2::new(1.0, 0.3));
        s.solve().unwrap();
        let base = s.sim_out().sensitivity_x().clone_owned();

        s.sim_in_mut()
            .set_sensitivity_seed(Matrix3::identity() * 2.0, nalgebra::SMatrix::zeros());
        s.solve().unwrap();
        assert_relative_eq!(*s.sim_out().sensitivity_x(), base * 2.0, epsilon = 1e-13);
    }

    #[test]
    fn output_flat_layout() {
        let mut s = session();
        s.solve().unwrap();
        let flat = s.sim_out().sensitivity_flat();
        assert_eq!(flat.len(), 15);
        // Sx block first (identity at rest), then Su block
        assert_relative_eq!(flat[0], 1.0, epsilon = 1e-15);
        assert_relative_eq!(flat[4], 1.0, epsilon = 1e-15);
        assert_relative_eq!(flat[8], 1.0, epsilon = 1e-15);
        assert_relative_eq!(flat[9], 0.2, epsilon = 1e-15); // dx/dv
        assert_relative_eq!(flat[14], 0.2, epsilon = 1e-15); // dθ/dω
    }

    // ---- config access ----

    #[test]
    fn config_accessor_returns_creation_config() {
        let config = SimConfig {
            num_steps: 2,
            ..SimConfig::default()
        };
        let s = mobile_robot_session(config.clone()).unwrap();
        assert_eq!(*s.config(), config);
    }

    #[test]
    fn model_accessor() {
        let s = session();
        assert_eq!(s.model().name(), "MobileRobot");
    }
}
