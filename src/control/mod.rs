//! Hysteresis band controllers.
//!
//! Pure functions over (reading, thresholds, prior state) with thin owning
//! wrappers.  Nothing here touches hardware.

pub mod band;
pub mod cooling;
pub mod fan;
