//! Daily energy-balance transition.
//!
//! One call advances one participant by one day:
//! 1. Resolve intake (protocol intake or maintenance default)
//! 2. Bernoulli adherence trial on scheduled days
//! 3. Expenditure: RMR + NEAT (+ session, + EPOC on hard days)
//! 4. Partition the signed balance into fat and fat-free mass
//! 5. Re-derive weight and RMR

use crate::participant::estimate_rmr;
use crate::{DailyOutcome, Participant, Protocol, SessionType};
use rand::Rng;

/// Share of the balance assigned to fat mass; the rest goes to FFM
pub const FAT_PARTITION: f64 = 0.85;
/// Energy density of fat tissue, kcal/kg
pub const KCAL_PER_KG_FAT: f64 = 7700.0;
/// Placeholder for lean tissue incl. glycogen and water, kcal/kg
pub const KCAL_PER_KG_FFM: f64 = 1800.0;

const HARD_SESSION_APPETITE_KCAL: f64 = 50.0;
const EASY_SESSION_APPETITE_KCAL: f64 = 20.0;

/// A scheduled session happens when the draw is strictly below adherence
pub fn session_attempt_succeeds(draw: f64, adherence: f64) -> bool {
    draw < adherence
}

/// Split a signed energy balance into (Δfat_mass, Δffm) in kg.
///
/// Surplus and deficit use the same split.
pub fn partition_balance(balance: f64) -> (f64, f64) {
    let d_fm = FAT_PARTITION * balance / KCAL_PER_KG_FAT;
    let d_ffm = (1.0 - FAT_PARTITION) * balance / KCAL_PER_KG_FFM;
    (d_fm, d_ffm)
}

/// Advance one participant by one day, mutating its body composition.
///
/// The uniform draw is consumed only on scheduled days, before the
/// session type is checked.
pub fn daily_update<R: Rng>(
    participant: &mut Participant,
    protocol: &Protocol,
    is_session_day: bool,
    rng: &mut R,
) -> DailyOutcome {
    let mut diet_kcal = protocol
        .intended_daily_intake
        .unwrap_or_else(|| participant.maintenance_kcal());
    let mut neat = participant.neat_baseline;
    let mut exercise_kcal = 0.0;
    let mut epoc = 0.0;

    let did_session = is_session_day
        && session_attempt_succeeds(rng.gen::<f64>(), participant.adherence)
        && protocol.session_type != SessionType::Control;

    if did_session {
        exercise_kcal = protocol.session_kcal();

        if protocol.session_type.is_hard() {
            neat *= 1.0 - protocol.neat_compensation();
            epoc = protocol.epoc_kcal();
        }

        let bump = if protocol.session_type.is_hard() {
            HARD_SESSION_APPETITE_KCAL
        } else {
            EASY_SESSION_APPETITE_KCAL
        };
        diet_kcal += participant.appetite_reactivity * bump;
    }

    let tdee = participant.rmr + neat + exercise_kcal + epoc;
    let balance = diet_kcal - tdee;
    let (d_fat_mass, d_ffm) = partition_balance(balance);

    participant.fat_mass = (participant.fat_mass + d_fat_mass).max(0.0);
    participant.ffm = (participant.ffm + d_ffm).max(0.0);
    participant.weight = participant.fat_mass + participant.ffm;
    participant.rmr = estimate_rmr(participant.ffm);

    tracing::trace!(
        pid = participant.id,
        did_session,
        balance,
        weight = participant.weight,
        "daily update"
    );

    DailyOutcome {
        did_session,
        diet_kcal,
        tdee,
        balance,
        d_fat_mass,
        d_ffm,
        weight: participant.weight,
        fat_mass: participant.fat_mass,
        ffm: participant.ffm,
    }
}
