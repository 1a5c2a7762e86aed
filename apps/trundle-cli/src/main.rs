//! Trundle simulation solver CLI.
//!
//! Provides two modes of operation:
//! - `rollout`: Integrate the mobile robot forward and print the trajectory
//! - `info`: Print workspace crate versions and the active configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nalgebra::Vector2;

use trundle_sim::prelude::*;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Trundle mobile robot simulation solver.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Integrate the mobile robot forward and print the trajectory.
    Rollout {
        /// Path to a TOML solver configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of solves to chain.
        #[arg(short = 'n', long, default_value_t = 10)]
        solves: u32,

        /// Forward velocity command v (m/s).
        #[arg(short = 'v', long, default_value_t = 1.0)]
        linear: f64,

        /// Angular velocity command ω (rad/s).
        #[arg(short = 'w', long, default_value_t = 0.0)]
        angular: f64,

        /// Also print the propagated sensitivities after each solve.
        #[arg(long)]
        sensitivities: bool,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_rollout(
    config: Option<PathBuf>,
    solves: u32,
    linear: f64,
    angular: f64,
    sensitivities: bool,
) -> Result<(), TrundleError> {
    let config = match config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    let horizon = config.horizon;

    let mut session = mobile_robot_session(config)?;
    session.set_control(Vector2::new(linear, angular));

    println!("# dims: {}", session.dims());
    println!("#     t        x          y          theta");

    let mut t = 0.0;
    let x0 = *session.sim_in().state();
    println!("{t:8.3}  {:9.5}  {:9.5}  {:9.5}", x0[0], x0[1], x0[2]);

    for _ in 0..solves {
        session.solve()?;
        t += horizon;
        let x = *session.sim_out().state();
        println!("{t:8.3}  {:9.5}  {:9.5}  {:9.5}", x[0], x[1], x[2]);
        if sensitivities {
            println!("#   S_forw = {:?}", session.sim_out().sensitivity_flat());
        }
        session.set_state(x);
    }

    Ok(())
}

fn run_info() {
    println!("trundle {}", env!("CARGO_PKG_VERSION"));
    println!("  model: MobileRobot (nx=3 nu=2 nz=0 np=0)");
    println!("  default config:");
    let cfg = SimConfig::default();
    println!("    horizon     = {}", cfg.horizon);
    println!("    num_stages  = {}", cfg.num_stages);
    println!("    num_steps   = {}", cfg.num_steps);
    println!("    newton_iter = {}", cfg.newton_iter);
    println!("    jac_reuse   = {}", cfg.jac_reuse);
}

fn main() -> Result<(), TrundleError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Rollout {
            config,
            solves,
            linear,
            angular,
            sensitivities,
        }) => run_rollout(config, solves, linear, angular, sensitivities),
        Some(Commands::Info) | None => {
            run_info();
            Ok(())
        }
    }
}
