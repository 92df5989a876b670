//! Dissolve-state classification.
//!
//! Governance reports a raw `DissolveState`; this module turns it into one of
//! three states and answers which dissolve-related actions each one allows.
//! It never performs a transition itself.

use crate::cdk::spec::sns::governance::DissolveState;
use derive_more::Display;

///
/// DissolveStatus
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum DissolveStatus {
    /// Not dissolving; the countdown starts from `delay_seconds`.
    #[display("locked ({delay_seconds}s)")]
    Locked { delay_seconds: u64 },

    /// Counting down to `dissolve_at` (seconds since the epoch).
    #[display("dissolving (until {dissolve_at})")]
    Dissolving { dissolve_at: u64 },

    #[display("dissolved")]
    Dissolved,
}

impl DissolveStatus {
    /// Classify raw governance metadata at `now` (seconds since the epoch).
    #[must_use]
    pub const fn classify(raw: Option<DissolveState>, now: u64) -> Self {
        match raw {
            Some(DissolveState::DissolveDelaySeconds(delay)) if delay > 0 => Self::Locked {
                delay_seconds: delay,
            },
            Some(DissolveState::WhenDissolvedTimestampSeconds(at)) if at > now => {
                Self::Dissolving { dissolve_at: at }
            }
            _ => Self::Dissolved,
        }
    }

    /// Seconds left before the stake becomes withdrawable.
    #[must_use]
    pub const fn remaining_delay(self, now: u64) -> u64 {
        match self {
            Self::Locked { delay_seconds } => delay_seconds,
            Self::Dissolving { dissolve_at } => dissolve_at.saturating_sub(now),
            Self::Dissolved => 0,
        }
    }

    #[must_use]
    pub const fn permitted_actions(self) -> &'static [DissolveAction] {
        match self {
            Self::Locked { .. } => &[DissolveAction::StartDissolving, DissolveAction::IncreaseDelay],
            Self::Dissolving { .. } => {
                &[DissolveAction::StopDissolving, DissolveAction::IncreaseDelay]
            }
            Self::Dissolved => &[DissolveAction::Disburse, DissolveAction::IncreaseDelay],
        }
    }

    #[must_use]
    pub fn permits(self, action: DissolveAction) -> bool {
        self.permitted_actions().contains(&action)
    }
}

///
/// DissolveAction
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum DissolveAction {
    StartDissolving,
    StopDissolving,
    IncreaseDelay,
    Disburse,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn classifies_raw_states() {
        assert_eq!(
            DissolveStatus::classify(Some(DissolveState::DissolveDelaySeconds(60)), NOW),
            DissolveStatus::Locked { delay_seconds: 60 }
        );
        assert_eq!(
            DissolveStatus::classify(Some(DissolveState::WhenDissolvedTimestampSeconds(NOW + 5)), NOW),
            DissolveStatus::Dissolving {
                dissolve_at: NOW + 5
            }
        );
    }

    #[test]
    fn elapsed_zero_or_missing_states_are_dissolved() {
        for raw in [
            None,
            Some(DissolveState::DissolveDelaySeconds(0)),
            Some(DissolveState::WhenDissolvedTimestampSeconds(NOW)),
            Some(DissolveState::WhenDissolvedTimestampSeconds(0)),
        ] {
            assert_eq!(DissolveStatus::classify(raw, NOW), DissolveStatus::Dissolved);
        }
    }

    #[test]
    fn gates_actions_by_state() {
        let locked = DissolveStatus::Locked { delay_seconds: 1 };
        let dissolving = DissolveStatus::Dissolving { dissolve_at: NOW + 1 };

        assert!(locked.permits(DissolveAction::StartDissolving));
        assert!(!locked.permits(DissolveAction::Disburse));
        assert!(dissolving.permits(DissolveAction::StopDissolving));
        assert!(!dissolving.permits(DissolveAction::StartDissolving));
        assert!(DissolveStatus::Dissolved.permits(DissolveAction::Disburse));
        assert!(DissolveStatus::Dissolved.permits(DissolveAction::IncreaseDelay));
        assert!(!DissolveStatus::Dissolved.permits(DissolveAction::StopDissolving));
    }

    #[test]
    fn remaining_delay_counts_down_while_dissolving() {
        let dissolving = DissolveStatus::Dissolving { dissolve_at: NOW + 90 };

        assert_eq!(dissolving.remaining_delay(NOW), 90);
        assert_eq!(dissolving.remaining_delay(NOW + 100), 0);
        assert_eq!(DissolveStatus::Locked { delay_seconds: 7 }.remaining_delay(NOW), 7);
    }
}
