//! Pure effect logic: no surface, no timers

pub mod catalog;
pub mod chance;
pub mod corrupt;
pub mod escalation;
pub mod noise;
