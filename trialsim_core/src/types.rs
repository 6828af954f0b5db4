//! Core domain types for the trial simulation.
//!
//! This module defines the fundamental types used throughout the system:
//! - Arms and session types
//! - Participants and their body-composition state
//! - Protocols describing one day's energetic intervention
//! - Daily outcomes and the flat output record

use crate::{Error, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Arms and Session Types
// ============================================================================

/// A named experimental condition
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Arm {
    Control,
    #[serde(alias = "liss")]
    LowIntensity,
    #[serde(alias = "sit")]
    SprintInterval,
    Mixed,
}

impl Arm {
    /// Every recognised arm, in catalog order
    pub const ALL: [Arm; 4] = [
        Arm::Control,
        Arm::LowIntensity,
        Arm::SprintInterval,
        Arm::Mixed,
    ];

    /// Canonical label used in the output table
    pub fn as_str(&self) -> &'static str {
        match self {
            Arm::Control => "control",
            Arm::LowIntensity => "low-intensity",
            Arm::SprintInterval => "sprint-interval",
            Arm::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "control" => Ok(Arm::Control),
            "low-intensity" | "liss" => Ok(Arm::LowIntensity),
            "sprint-interval" | "sit" => Ok(Arm::SprintInterval),
            "mixed" => Ok(Arm::Mixed),
            other => Err(Error::Config(format!("Unknown arm: {}", other))),
        }
    }
}

/// Kind of session a protocol prescribes
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    Control,
    #[serde(alias = "liss")]
    LowIntensity,
    #[serde(alias = "sit")]
    SprintInterval,
    Mixed,
}

impl SessionType {
    /// Hard sessions trigger EPOC, NEAT compensation and the larger appetite bump
    pub fn is_hard(&self) -> bool {
        matches!(self, SessionType::SprintInterval | SessionType::Mixed)
    }
}

impl FromStr for SessionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "control" => Ok(SessionType::Control),
            "low-intensity" | "liss" => Ok(SessionType::LowIntensity),
            "sprint-interval" | "sit" => Ok(SessionType::SprintInterval),
            "mixed" => Ok(SessionType::Mixed),
            other => Err(Error::Config(format!("Unknown session type: {}", other))),
        }
    }
}

// ============================================================================
// Participant
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sex {
    Female,
    Male,
}

/// One virtual individual in the cohort.
///
/// `rmr` is derived from `ffm` and is refreshed by every daily update.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub id: usize,
    pub sex: Sex,
    /// kg
    pub weight: f64,
    /// kg
    pub fat_mass: f64,
    /// Fat-free mass, kg
    pub ffm: f64,
    /// Resting metabolic rate, kcal/day
    pub rmr: f64,
    /// 0..1, higher means more intake after hard sessions
    pub appetite_reactivity: f64,
    /// Non-exercise activity expenditure, kcal/day
    pub neat_baseline: f64,
    /// Probability that a scheduled session actually happens
    pub adherence: f64,
}

// ============================================================================
// Protocol
// ============================================================================

/// Session cost used when a protocol leaves it unset
pub const DEFAULT_SESSION_KCAL: f64 = 250.0;
/// EPOC used when a hard-session protocol leaves it unset
pub const DEFAULT_EPOC_KCAL: f64 = 30.0;
/// NEAT compensation used when a hard-session protocol leaves it unset
pub const DEFAULT_NEAT_COMPENSATION: f64 = 0.05;

/// Today's energetic intervention for one participant
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Protocol {
    pub session_type: SessionType,
    pub session_energy_cost: Option<f64>,
    pub excess_post_exercise_energy: Option<f64>,
    pub compensation_fraction: Option<f64>,
    /// Fixed per participant at cohort setup; `None` falls back to maintenance
    pub intended_daily_intake: Option<f64>,
}

impl Protocol {
    /// Protocol with every energetic parameter set explicitly
    pub fn new(session_type: SessionType, session_kcal: f64, epoc_kcal: f64, neat_comp: f64) -> Self {
        Self {
            session_type,
            session_energy_cost: Some(session_kcal),
            excess_post_exercise_energy: Some(epoc_kcal),
            compensation_fraction: Some(neat_comp),
            intended_daily_intake: None,
        }
    }

    pub fn session_kcal(&self) -> f64 {
        self.session_energy_cost.unwrap_or(DEFAULT_SESSION_KCAL)
    }

    pub fn epoc_kcal(&self) -> f64 {
        self.excess_post_exercise_energy.unwrap_or(DEFAULT_EPOC_KCAL)
    }

    pub fn neat_compensation(&self) -> f64 {
        self.compensation_fraction.unwrap_or(DEFAULT_NEAT_COMPENSATION)
    }

    /// Same protocol with a fixed intended intake
    pub fn with_intake(mut self, kcal: f64) -> Self {
        self.intended_daily_intake = Some(kcal);
        self
    }

    /// Match the session cost to the low-intensity session (no-op for control)
    pub fn energy_matched(mut self) -> Self {
        if self.session_type != SessionType::Control {
            self.session_energy_cost = Some(crate::catalog::ENERGY_MATCHED_SESSION_KCAL);
        }
        self
    }
}

// ============================================================================
// Outcomes and Records
// ============================================================================

/// Everything one daily update produced
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DailyOutcome {
    pub did_session: bool,
    pub diet_kcal: f64,
    pub tdee: f64,
    /// Intake minus expenditure; positive means surplus
    pub balance: f64,
    pub d_fat_mass: f64,
    pub d_ffm: f64,
    pub weight: f64,
    pub fat_mass: f64,
    pub ffm: f64,
}

/// One row of the output table
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TrialRecord {
    pub arm: Arm,
    pub pid: usize,
    /// 1-based day in trial
    pub day: u32,
    #[serde(serialize_with = "bool_as_int")]
    pub did_session: bool,
    pub weight: f64,
    pub fat_mass: f64,
    pub ffm: f64,
    pub balance: f64,
}

impl TrialRecord {
    pub fn from_outcome(arm: Arm, pid: usize, day: u32, outcome: &DailyOutcome) -> Self {
        Self {
            arm,
            pid,
            day,
            did_session: outcome.did_session,
            weight: outcome.weight,
            fat_mass: outcome.fat_mass,
            ffm: outcome.ffm,
            balance: outcome.balance,
        }
    }
}

fn bool_as_int<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

// ============================================================================
// Run Parameters
// ============================================================================

/// The engine's whole configuration surface
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunParams {
    pub weeks: u32,
    /// Cohort size per arm
    pub participants: usize,
    pub arms: Vec<Arm>,
    pub seed: u64,
    #[serde(default)]
    pub energy_matched: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            weeks: 8,
            participants: 100,
            arms: Arm::ALL.to_vec(),
            seed: 42,
            energy_matched: false,
        }
    }
}

impl RunParams {
    /// Total simulated days per participant
    pub fn days(&self) -> u32 {
        self.weeks * 7
    }

    /// Reject parameters that cannot describe a trial
    pub fn validate(&self) -> Result<()> {
        if self.weeks == 0 {
            return Err(Error::Config("weeks must be at least 1".into()));
        }
        if self.participants == 0 {
            return Err(Error::Config("cohort size must be at least 1".into()));
        }
        if self.arms.is_empty() {
            return Err(Error::Config("at least one arm is required".into()));
        }
        for (i, arm) in self.arms.iter().enumerate() {
            if self.arms[..i].contains(arm) {
                return Err(Error::Config(format!("Arm listed twice: {}", arm)));
            }
        }
        Ok(())
    }
}
