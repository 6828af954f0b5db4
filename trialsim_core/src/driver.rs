//! Cohort simulation driver.
//!
//! Runs arms × participants × days off a single seeded random stream.
//! Draw order is part of the output contract:
//! - arms in the order given
//! - within an arm, the whole cohort is drawn before any daily update
//! - then participant by participant, day by day
//!
//! Records come out grouped by arm, then participant, then ascending day.

use crate::catalog::build_default_catalog;
use crate::output::RecordSink;
use crate::participant::make_participant;
use crate::schedule::WeeklySchedule;
use crate::transition::daily_update;
use crate::{Arm, Protocol, ProtocolCatalog, Result, RunParams, SessionType, TrialRecord};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::borrow::Cow;

/// Which protocol applies on a given day
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayProtocol {
    /// The arm's base protocol, unmodified
    Base,
    /// Mixed arm, steady-state session day
    MixedLowIntensity,
    /// Mixed arm, interval session day
    MixedSprintInterval,
}

/// Select today's protocol variant.
///
/// Only the mixed arm alternates: weekdays 0 and 4 are steady state, any
/// other scheduled weekday is intervals. Rest days keep the base protocol.
pub fn select_day_protocol(arm: Arm, weekday: u32, is_session_day: bool) -> DayProtocol {
    match (arm, is_session_day) {
        (Arm::Mixed, true) => match weekday {
            0 | 4 => DayProtocol::MixedLowIntensity,
            _ => DayProtocol::MixedSprintInterval,
        },
        _ => DayProtocol::Base,
    }
}

impl DayProtocol {
    /// Build the protocol for today from the participant's base protocol.
    ///
    /// Variants keep the base intake.
    pub fn resolve(self, base: &Protocol, energy_matched: bool) -> Cow<'_, Protocol> {
        let variant = match self {
            DayProtocol::Base => return Cow::Borrowed(base),
            DayProtocol::MixedLowIntensity => {
                Protocol::new(SessionType::LowIntensity, 230.0, 0.0, 0.0)
            }
            DayProtocol::MixedSprintInterval => {
                Protocol::new(SessionType::SprintInterval, 170.0, 35.0, 0.05)
            }
        };

        let variant = Protocol {
            intended_daily_intake: base.intended_daily_intake,
            ..variant
        };

        if energy_matched {
            Cow::Owned(variant.energy_matched())
        } else {
            Cow::Owned(variant)
        }
    }
}

/// Run a full trial with the built-in catalog and collect every record
pub fn run_trial(params: &RunParams) -> Result<Vec<TrialRecord>> {
    let mut records = Vec::new();
    run_trial_with(params, &build_default_catalog(), &mut records)?;
    Ok(records)
}

/// Run a full trial, streaming records into `sink`.
///
/// Returns the number of records written.
pub fn run_trial_with<S: RecordSink>(
    params: &RunParams,
    catalog: &ProtocolCatalog,
    sink: &mut S,
) -> Result<usize> {
    params.validate()?;

    let catalog = catalog.for_run(params);

    tracing::info!(
        "Running trial: {} weeks, {} participants per arm, arms {:?}, seed {}",
        params.weeks,
        params.participants,
        params.arms,
        params.seed
    );

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut written = 0;

    for &arm in &params.arms {
        written += simulate_arm(arm, params, &catalog, &mut rng, sink)?;
    }

    tracing::info!("Trial complete: {} records", written);
    Ok(written)
}

fn simulate_arm<R: Rng, S: RecordSink>(
    arm: Arm,
    params: &RunParams,
    catalog: &ProtocolCatalog,
    rng: &mut R,
    sink: &mut S,
) -> Result<usize> {
    let base = catalog.protocol_for(arm);
    let schedule = WeeklySchedule::for_arm(arm);

    // Intake is fixed from each participant's initial state
    let mut cohort: Vec<_> = (0..params.participants)
        .map(|pid| {
            let participant = make_participant(pid, rng);
            let protocol = base.clone().with_intake(participant.maintenance_kcal());
            (participant, protocol)
        })
        .collect();

    tracing::debug!(
        "Arm {}: cohort of {} created, {} sessions/week",
        arm,
        cohort.len(),
        schedule.sessions_per_week()
    );

    let mut written = 0;
    let mut sessions = 0usize;

    for (participant, protocol) in cohort.iter_mut() {
        for day in 0..params.days() {
            let is_session_day = schedule.is_session_day(day);
            let today = select_day_protocol(arm, day % 7, is_session_day)
                .resolve(protocol, params.energy_matched);

            let outcome = daily_update(participant, &today, is_session_day, rng);
            if outcome.did_session {
                sessions += 1;
            }

            sink.append(&TrialRecord::from_outcome(
                arm,
                participant.id,
                day + 1,
                &outcome,
            ))?;
            written += 1;
        }
    }

    tracing::info!("Arm {}: {} records, {} sessions completed", arm, written, sessions);
    Ok(written)
}
