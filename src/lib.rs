//! ClimateBox enclosure controller library.
//!
//! The decision engine for an enclosure's climate: hysteresis band
//! controllers for the fans and the cooling loop, a danger guard, a
//! light/fog duty-cycle scheduler and the override gates, all wired
//! together by [`app::service::ControlLoopDriver`].  Hardware and remote
//! channels sit behind the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod gate;
pub mod safety;
pub mod scheduler;
pub mod telemetry;

pub mod adapters;

pub mod error;
