//! High-level operations.
//!
//! This module contains the implementation of funcboot commands.

pub mod bootstrap;
pub mod doctor;
pub mod patch;

pub use bootstrap::{bootstrap, BootstrapConfig, BootstrapReport, EditRecord, LinkMode};
pub use doctor::{doctor, format_report, CheckResult, DoctorReport};
pub use patch::patch_manifest;
