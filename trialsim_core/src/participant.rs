//! Synthetic participant generation.
//!
//! Baseline traits are drawn from rough parametric distributions. The draw
//! order is fixed; changing it changes every cohort for a given seed.

use crate::{Participant, Sex};
use rand::Rng;
use rand_distr::StandardNormal;

/// Resting metabolic rate per kg of fat-free mass, kcal/day
pub const RMR_KCAL_PER_KG_FFM: f64 = 23.0;

/// Intake cushion on top of RMR + NEAT used as the maintenance estimate
pub const MAINTENANCE_CUSHION_KCAL: f64 = 300.0;

const FAT_MASS_FLOOR_KG: f64 = 5.0;
const FFM_FLOOR_KG: f64 = 30.0;

/// Very rough RMR estimate (kcal/day) from fat-free mass
pub fn estimate_rmr(ffm_kg: f64) -> f64 {
    RMR_KCAL_PER_KG_FFM * ffm_kg
}

fn normal<R: Rng>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + std_dev * z
}

/// Draw one participant from the shared random stream.
///
/// Draw order: sex, weight, fat fraction, appetite, NEAT, adherence.
///
/// `weight` keeps its raw draw even when the fat-mass or FFM floors kick
/// in, so it can disagree with `fat_mass + ffm` until the first daily
/// update re-derives it.
pub fn make_participant<R: Rng>(pid: usize, rng: &mut R) -> Participant {
    let sex = if rng.gen::<f64>() < 0.5 {
        Sex::Female
    } else {
        Sex::Male
    };

    let (weight_mean, fat_mean) = match sex {
        Sex::Female => (65.0, 0.30),
        Sex::Male => (78.0, 0.20),
    };

    let weight = normal(rng, weight_mean, 8.0);
    let fat_fraction = normal(rng, fat_mean, 0.05);
    let fat_mass = (weight * fat_fraction).max(FAT_MASS_FLOOR_KG);
    let ffm = (weight - fat_mass).max(FFM_FLOOR_KG);

    let appetite_reactivity = normal(rng, 0.4, 0.2).clamp(0.0, 1.0);
    let neat_baseline = normal(rng, 500.0, 120.0);
    let adherence = normal(rng, 0.9, 0.1).clamp(0.4, 1.0);

    Participant {
        id: pid,
        sex,
        weight,
        fat_mass,
        ffm,
        rmr: estimate_rmr(ffm),
        appetite_reactivity,
        neat_baseline,
        adherence,
    }
}

impl Participant {
    /// Maintenance-ish intake: RMR + NEAT + cushion
    pub fn maintenance_kcal(&self) -> f64 {
        self.rmr + self.neat_baseline + MAINTENANCE_CUSHION_KCAL
    }
}
