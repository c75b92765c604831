//! Battle controller simulation — the combat core of the IR effects unit.
//!
//! `BattleController` owns the battle state machine, the fixed timer pool,
//! and the light-effect sequencer, and talks to the hardware through the
//! device traits in [`devices`]. Completely headless (no hardware
//! dependency), enabling deterministic testing against mock devices.

pub mod controller;
pub mod devices;
pub mod effects;
pub mod mock;

pub use controller::{BattleController, ControllerConfig};
pub use devices::Devices;

#[cfg(test)]
mod tests;
