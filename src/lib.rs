//! Spellfire Arena simulation core
//!
//! A single-player wave-survival arena: the player casts one of three spells
//! at enemies that close in from a ring around them. The crate holds the
//! whole simulation and progression model; drawing, audio and input capture
//! live behind the traits in [`surface`].
//!
//! The `spellfire-arena` binary drives the loop headlessly with a simple
//! autopilot, which is mainly useful for soak runs and profiling.

pub mod config;
pub mod game;
pub mod persistence;
pub mod surface;
pub mod util;
