//! Core types and definitions for the infrared battle controller.
//!
//! This crate defines the vocabulary shared across all other crates:
//! protocols, teams, weight classes, battle settings, commands, events,
//! and the per-tick state snapshot. It has no dependency on any device
//! or runtime code.

pub mod commands;
pub mod constants;
pub mod enums;
pub mod events;
pub mod settings;
pub mod state;
pub mod types;
