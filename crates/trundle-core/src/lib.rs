// trundle-core: Types, traits, config and errors for the Trundle simulation solver.

pub mod config;
pub mod error;
pub mod model;
pub mod types;
