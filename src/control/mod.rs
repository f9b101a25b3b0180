//! Hysteresis control loop and the station tuner seam.

pub mod state_machine;
pub mod tuner;
pub mod worker;

pub use state_machine::{ControlState, StateMachine, Stations, Transition, transition};
pub use tuner::{LogTuner, MockTuner, Tuner};
pub use worker::{StateMachineWorker, StateWorkerConfig};
