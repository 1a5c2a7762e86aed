// trundle-dynamics: Robot dynamics models for the Trundle simulation solver.

pub mod mobile_robot;

pub use mobile_robot::MobileRobot;
