//! Dissolve and disbursement gating.

use crate::{
    domain::{
        dissolve::{DissolveAction, DissolveStatus},
        neuron::NeuronSnapshot,
        params::StakingParameters,
    },
    error::ValidationError,
};

pub fn validate_action(
    status: DissolveStatus,
    action: DissolveAction,
) -> Result<(), ValidationError> {
    if status.permits(action) {
        Ok(())
    } else {
        Err(ValidationError::ActionNotPermitted { action, status })
    }
}

/// Check a dissolve-delay increase; returns it narrowed to the wire width.
///
/// The resulting delay (remaining plus `additional`) may not pass the
/// nervous-system maximum.
pub fn validate_delay_increase(
    neuron: &NeuronSnapshot,
    now: u64,
    additional: u64,
    params: &StakingParameters,
) -> Result<u32, ValidationError> {
    if additional == 0 {
        return Err(ValidationError::ZeroDelayIncrease);
    }

    let status = neuron.dissolve_status(now);
    validate_action(status, DissolveAction::IncreaseDelay)?;

    let requested = status.remaining_delay(now).saturating_add(additional);
    let maximum = params.max_dissolve_delay_seconds;
    if requested > maximum {
        return Err(ValidationError::DelayAboveMaximum { requested, maximum });
    }

    u32::try_from(additional).map_err(|_| ValidationError::DelayAboveMaximum {
        requested,
        maximum: u64::from(u32::MAX),
    })
}

pub const fn validate_auto_stake(
    neuron: &NeuronSnapshot,
    requested: bool,
) -> Result<(), ValidationError> {
    if neuron.auto_stake_maturity == requested {
        Err(ValidationError::AutoStakeUnchanged(requested))
    } else {
        Ok(())
    }
}

pub const fn validate_disburse_maturity(
    neuron: &NeuronSnapshot,
    percentage: u32,
) -> Result<(), ValidationError> {
    if percentage == 0 || percentage > 100 {
        return Err(ValidationError::BadPercentage(percentage));
    }
    if neuron.maturity.e8s() == 0 {
        return Err(ValidationError::NoMaturity);
    }

    Ok(())
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdk::{
        spec::sns::governance::DissolveState,
        types::{Subaccount, Tokens},
    };

    const NOW: u64 = 1_000_000;

    fn neuron(dissolve_state: Option<DissolveState>) -> NeuronSnapshot {
        NeuronSnapshot {
            subaccount: Subaccount::default(),
            grants: Vec::new(),
            cached_stake: Tokens::from_e8s(500),
            neuron_fees: Tokens::ZERO,
            maturity: Tokens::ZERO,
            staked_maturity: Tokens::ZERO,
            dissolve_state,
            auto_stake_maturity: false,
            created_timestamp_seconds: 0,
            aging_since_timestamp_seconds: 0,
            pending_maturity: Vec::new(),
        }
    }

    fn params() -> StakingParameters {
        StakingParameters {
            minimum_stake: Tokens::from_e8s(100),
            transaction_fee: Tokens::from_e8s(1),
            min_dissolve_delay_to_vote_seconds: 0,
            max_dissolve_delay_seconds: 1_000,
            max_neuron_age_for_age_bonus_seconds: 0,
            max_dissolve_delay_bonus_percentage: 0,
            max_age_bonus_percentage: 0,
            grantable: None,
        }
    }

    #[test]
    fn delay_increase_respects_the_ceiling() {
        let locked = neuron(Some(DissolveState::DissolveDelaySeconds(600)));

        assert_eq!(validate_delay_increase(&locked, NOW, 400, &params()).unwrap(), 400);
        assert!(matches!(
            validate_delay_increase(&locked, NOW, 401, &params()),
            Err(ValidationError::DelayAboveMaximum { requested: 1_001, .. })
        ));
        assert!(matches!(
            validate_delay_increase(&locked, NOW, 0, &params()),
            Err(ValidationError::ZeroDelayIncrease)
        ));

        // dissolving neurons count only what is left
        let dissolving = neuron(Some(DissolveState::WhenDissolvedTimestampSeconds(NOW + 900)));
        assert!(validate_delay_increase(&dissolving, NOW + 500, 600, &params()).is_ok());
    }

    #[test]
    fn disbursing_stake_requires_dissolved() {
        let locked = neuron(Some(DissolveState::DissolveDelaySeconds(600)));

        assert!(matches!(
            validate_action(locked.dissolve_status(NOW), DissolveAction::Disburse),
            Err(ValidationError::ActionNotPermitted { .. })
        ));
        assert!(validate_action(neuron(None).dissolve_status(NOW), DissolveAction::Disburse).is_ok());
    }

    #[test]
    fn maturity_disbursement_bounds() {
        let mut n = neuron(None);
        assert!(matches!(
            validate_disburse_maturity(&n, 50),
            Err(ValidationError::NoMaturity)
        ));

        n.maturity = Tokens::from_e8s(10);
        assert!(validate_disburse_maturity(&n, 100).is_ok());
        assert!(matches!(
            validate_disburse_maturity(&n, 0),
            Err(ValidationError::BadPercentage(0))
        ));
        assert!(matches!(
            validate_disburse_maturity(&n, 101),
            Err(ValidationError::BadPercentage(101))
        ));
        assert!(matches!(
            validate_auto_stake(&n, false),
            Err(ValidationError::AutoStakeUnchanged(false))
        ));
    }
}
