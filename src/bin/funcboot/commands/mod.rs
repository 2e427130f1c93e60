//! Command implementations

pub mod bootstrap;
pub mod completions;
pub mod doctor;
pub mod patch;
