#![forbid(unsafe_code)]

//! Core engine for the exercise-arm body-composition trial simulator.
//!
//! This crate provides:
//! - Domain types (arms, participants, protocols, output records)
//! - Participant factory, protocol catalog and weekly schedules
//! - The daily energy-balance transition
//! - The seeded cohort driver
//! - Output sinks (CSV table, run manifest)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod participant;
pub mod schedule;
pub mod transition;
pub mod driver;
pub mod output;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, protocol_for_arm, ProtocolCatalog, ProtocolSpec};
pub use config::Config;
pub use participant::{estimate_rmr, make_participant};
pub use schedule::{weekly_schedule, WeeklySchedule};
pub use transition::daily_update;
pub use driver::{run_trial, run_trial_with, select_day_protocol, DayProtocol};
pub use output::{output_file_name, CsvSink, RecordSink, RunManifest};
