//! State module for tracking crawl phases
//!
//! Browse and harvest phases move through the same small state machine:
//! `Seeded -> Running -> {Paused <-> Running} -> Stopped`.

mod phase_state;

pub use phase_state::PhaseState;
