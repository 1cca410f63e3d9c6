//! Render → encode control loop and its state machine.

pub(crate) mod orchestrator;
pub(crate) mod state;
