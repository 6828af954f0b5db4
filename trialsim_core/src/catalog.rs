//! Protocol catalog: the energetic parameters of each arm.
//!
//! The built-in table can be overridden per arm from raw protocol tables
//! (see [`ProtocolSpec`]), which is where malformed protocols are rejected.

use crate::types::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Session cost every non-control arm uses in energy-matched mode
pub const ENERGY_MATCHED_SESSION_KCAL: f64 = 250.0;

/// Arm → base protocol lookup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolCatalog {
    protocols: BTreeMap<Arm, Protocol>,
}

impl Default for ProtocolCatalog {
    fn default() -> Self {
        build_default_catalog()
    }
}

/// Builds the catalog with the built-in arm parameters
pub fn build_default_catalog() -> ProtocolCatalog {
    let mut protocols = BTreeMap::new();

    protocols.insert(
        Arm::Control,
        Protocol::new(SessionType::Control, 0.0, 0.0, 0.0),
    );

    // Roughly time-matched: ~45 min steady state vs ~15 min intervals
    protocols.insert(
        Arm::LowIntensity,
        Protocol::new(SessionType::LowIntensity, 250.0, 0.0, 0.0),
    );
    protocols.insert(
        Arm::SprintInterval,
        Protocol::new(SessionType::SprintInterval, 170.0, 40.0, 0.05),
    );

    // Only used on rest days; session days swap in a mixed-day variant
    protocols.insert(Arm::Mixed, Protocol::new(SessionType::Mixed, 220.0, 20.0, 0.03));

    ProtocolCatalog { protocols }
}

/// Look up the built-in protocol for an arm name
pub fn protocol_for_arm(name: &str) -> Result<Protocol> {
    let arm: Arm = name.parse()?;
    Ok(build_default_catalog().protocol_for(arm))
}

impl ProtocolCatalog {
    /// Base protocol for an arm
    ///
    /// Every arm has an entry: the catalog is built complete and overrides
    /// only replace entries.
    pub fn protocol_for(&self, arm: Arm) -> Protocol {
        self.protocols[&arm].clone()
    }

    /// Base protocol for an arm given by name
    pub fn lookup(&self, name: &str) -> Result<Protocol> {
        let arm: Arm = name.parse()?;
        Ok(self.protocol_for(arm))
    }

    /// Iterate arms and their protocols in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (&Arm, &Protocol)> {
        self.protocols.iter()
    }

    /// Replace catalog entries with raw protocol tables keyed by arm name.
    ///
    /// The mixed arm cannot be overridden: its session days always use the
    /// fixed mixed-day variants and its base protocol only covers rest days.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, ProtocolSpec>) -> Result<Self> {
        for (name, spec) in overrides {
            let arm: Arm = name.parse()?;
            if arm == Arm::Mixed {
                return Err(Error::Config(
                    "the mixed arm uses fixed per-day protocols and cannot be overridden".into(),
                ));
            }
            let protocol = Protocol::try_from(spec)
                .map_err(|e| Error::Config(format!("protocol for arm '{}': {}", name, e)))?;
            tracing::info!("Overriding protocol for arm {}: {:?}", arm, protocol);
            self.protocols.insert(arm, protocol);
        }
        Ok(self)
    }

    /// Match every non-control session cost to the low-intensity session.
    ///
    /// Applied after overrides, so it replaces any overridden session cost.
    pub fn energy_matched(mut self) -> Self {
        for protocol in self.protocols.values_mut() {
            *protocol = protocol.clone().energy_matched();
        }
        self
    }

    /// The catalog a run actually uses
    pub fn for_run(&self, params: &RunParams) -> Cow<'_, ProtocolCatalog> {
        if params.energy_matched {
            Cow::Owned(self.clone().energy_matched())
        } else {
            Cow::Borrowed(self)
        }
    }
}

/// Loosely-typed protocol table as written in a config file.
///
/// Only `session_type` is required; unset energetic fields fall back to
/// the engine defaults at use time.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct ProtocolSpec {
    pub session_type: Option<String>,
    pub session_energy_cost: Option<f64>,
    pub excess_post_exercise_energy: Option<f64>,
    pub compensation_fraction: Option<f64>,
}

impl TryFrom<&ProtocolSpec> for Protocol {
    type Error = Error;

    fn try_from(spec: &ProtocolSpec) -> Result<Self> {
        let session_type: SessionType = spec
            .session_type
            .as_deref()
            .ok_or_else(|| Error::Config("missing required key 'session_type'".into()))?
            .parse()?;

        for (key, value) in [
            ("session_energy_cost", spec.session_energy_cost),
            ("excess_post_exercise_energy", spec.excess_post_exercise_energy),
        ] {
            if let Some(kcal) = value {
                if !kcal.is_finite() || kcal < 0.0 {
                    return Err(Error::Config(format!(
                        "{} must be a finite, non-negative kcal value, got {}",
                        key, kcal
                    )));
                }
            }
        }

        if let Some(frac) = spec.compensation_fraction {
            if !(0.0..=1.0).contains(&frac) {
                return Err(Error::Config(format!(
                    "compensation_fraction must be within [0, 1], got {}",
                    frac
                )));
            }
        }

        Ok(Protocol {
            session_type,
            session_energy_cost: spec.session_energy_cost,
            excess_post_exercise_energy: spec.excess_post_exercise_energy,
            compensation_fraction: spec.compensation_fraction,
            intended_daily_intake: None,
        })
    }
}
