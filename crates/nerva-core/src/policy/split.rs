//! Split bounds.
//!
//! The new neuron receives `amount` less the split fee and must still reach
//! the minimum stake, so `amount ≥ minimum stake + fee`. The source keeps
//! `current − amount`, which must stay at or above the minimum stake.

use crate::{
    cdk::types::Tokens,
    domain::params::StakingParameters,
    error::ValidationError,
};

/// Validate a split of `amount` from a neuron holding `current`; returns the
/// stake the source neuron keeps.
pub fn validate_split(
    current: Tokens,
    amount: Tokens,
    params: &StakingParameters,
) -> Result<Tokens, ValidationError> {
    let minimum = params.minimum_split();
    if amount < minimum {
        return Err(ValidationError::SplitBelowMinimum { amount, minimum });
    }

    let remainder = current.saturating_sub(amount);
    if current < amount || remainder < params.minimum_stake {
        return Err(ValidationError::SplitRemainderBelowMinimum {
            amount,
            remainder,
            minimum: params.minimum_stake,
        });
    }

    Ok(remainder)
}

///
/// TESTS
///
