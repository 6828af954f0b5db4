//! Weekly session schedules.

use crate::Arm;
use serde::{Deserialize, Serialize};

/// Session days for one week, indexed by weekday 0..7; repeats all trial
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklySchedule([bool; 7]);

impl WeeklySchedule {
    /// Schedule for an arm.
    ///
    /// Every non-control arm trains three times a week on weekdays 0, 2
    /// and 4, so arms differ in session content and not in frequency.
    pub fn for_arm(arm: Arm) -> Self {
        match arm {
            Arm::Control => Self([false; 7]),
            _ => Self([true, false, true, false, true, false, false]),
        }
    }

    /// Whether a session is scheduled on a 0-based trial day
    pub fn is_session_day(&self, day_index: u32) -> bool {
        self.0[(day_index % 7) as usize]
    }

    pub fn sessions_per_week(&self) -> usize {
        self.0.iter().filter(|d| **d).count()
    }

    pub fn days(&self) -> &[bool; 7] {
        &self.0
    }
}

/// Schedule for an arm given by name
pub fn weekly_schedule(arm_name: &str) -> crate::Result<WeeklySchedule> {
    Ok(WeeklySchedule::for_arm(arm_name.parse()?))
}
