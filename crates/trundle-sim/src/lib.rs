// trundle-sim: Fixed-step ERK simulation sessions with forward sensitivities.

pub mod erk;
pub mod session;

pub use erk::{ButcherTableau, ErkIntegrator, ErkSolution};
pub use session::{mobile_robot_session, MobileRobotSession, SimIn, SimOut, SimSession};

/// Common imports for driving a simulation session.
pub mod prelude {
    pub use crate::erk::{ErkIntegrator, ErkSolution};
    pub use crate::session::{
        mobile_robot_session, MobileRobotSession, SimIn, SimOut, SimSession,
    };
    pub use trundle_core::config::SimConfig;
    pub use trundle_core::error::{ConfigError, ModelError, SimError, TrundleError};
    pub use trundle_core::model::ExplicitOde;
    pub use trundle_core::types::SimDims;
    pub use trundle_dynamics::MobileRobot;
}
