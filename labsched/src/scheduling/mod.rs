//! The scheduling core: conflict detection and the schedule service built on it.

pub mod conflicts;
pub mod service;
