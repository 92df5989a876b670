//! Funding rules for new stakes and top-ups.

use crate::{
    cdk::types::Tokens,
    domain::params::StakingParameters,
    error::ValidationError,
};

/// Parse a decimal token amount typed by a user; zero is rejected.
pub fn parse_amount(input: &str) -> Result<Tokens, ValidationError> {
    let amount: Tokens = input.parse()?;
    if amount == Tokens::ZERO {
        return Err(ValidationError::ZeroAmount);
    }

    Ok(amount)
}

/// Parse a nonce typed by a user.
pub fn parse_nonce(input: &str) -> Result<u64, ValidationError> {
    input
        .trim()
        .parse::<u64>()
        .map_err(|_| ValidationError::BadNonce(input.to_string()))
}

///
/// CreationPlan
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CreationPlan {
    /// Amount sent to the staking subaccount: the stake plus one fee.
    pub transfer_amount: Tokens,
    pub fee: Tokens,
    /// Requested delay, already narrowed to the wire width.
    pub dissolve_delay_seconds: u32,
}

/// Check a new stake and its initial dissolve delay.
pub fn validate_creation(
    stake: Tokens,
    dissolve_delay_seconds: u64,
    params: &StakingParameters,
) -> Result<CreationPlan, ValidationError> {
    if stake < params.minimum_stake {
        return Err(ValidationError::BelowMinimumStake {
            stake,
            minimum: params.minimum_stake,
        });
    }

    let dissolve_delay_seconds = validate_delay(dissolve_delay_seconds, params)?;
    let transfer_amount = stake
        .checked_add(params.transaction_fee)
        .ok_or(ValidationError::AmountOverflow(stake))?;

    Ok(CreationPlan {
        transfer_amount,
        fee: params.transaction_fee,
        dissolve_delay_seconds,
    })
}

/// Check a top-up amount.
pub const fn validate_top_up(amount: Tokens) -> Result<Tokens, ValidationError> {
    if amount.e8s() == 0 {
        return Err(ValidationError::ZeroAmount);
    }

    Ok(amount)
}

// total delay must fit both the nervous-system ceiling and the u32 wire field
fn validate_delay(seconds: u64, params: &StakingParameters) -> Result<u32, ValidationError> {
    let maximum = params
        .max_dissolve_delay_seconds
        .min(u64::from(u32::MAX));

    if seconds > maximum {
        return Err(ValidationError::DelayAboveMaximum {
            requested: seconds,
            maximum,
        });
    }

    u32::try_from(seconds).map_err(|_| ValidationError::DelayAboveMaximum {
        requested: seconds,
        maximum,
    })
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StakingParameters {
        StakingParameters {
            minimum_stake: Tokens::from_e8s(100),
            transaction_fee: Tokens::from_e8s(1),
            min_dissolve_delay_to_vote_seconds: 0,
            max_dissolve_delay_seconds: 20_000_000,
            max_neuron_age_for_age_bonus_seconds: 0,
            max_dissolve_delay_bonus_percentage: 0,
            max_age_bonus_percentage: 0,
            grantable: None,
        }
    }

    #[test]
    fn creation_adds_one_fee_to_the_transfer() {
        let plan = validate_creation(Tokens::from_e8s(500), 15_552_000, &params()).unwrap();

        assert_eq!(plan.transfer_amount.e8s(), 501);
        assert_eq!(plan.fee.e8s(), 1);
        assert_eq!(plan.dissolve_delay_seconds, 15_552_000);
    }

    #[test]
    fn creation_rejects_small_stakes_and_long_delays() {
        assert!(matches!(
            validate_creation(Tokens::from_e8s(99), 0, &params()),
            Err(ValidationError::BelowMinimumStake { .. })
        ));
        assert!(matches!(
            validate_creation(Tokens::from_e8s(100), 20_000_001, &params()),
            Err(ValidationError::DelayAboveMaximum {
                maximum: 20_000_000,
                ..
            })
        ));

        let mut wide = params();
        wide.max_dissolve_delay_seconds = u64::MAX;
        assert!(matches!(
            validate_creation(Tokens::from_e8s(100), u64::from(u32::MAX) + 1, &wide),
            Err(ValidationError::DelayAboveMaximum { .. })
        ));
    }

    #[test]
    fn creation_overflow_is_caught() {
        assert!(matches!(
            validate_creation(Tokens::from_e8s(u64::MAX), 0, &params()),
            Err(ValidationError::AmountOverflow(_))
        ));
    }

    #[test]
    fn parses_user_input() {
        assert_eq!(parse_amount("1.5").unwrap().e8s(), 150_000_000);
        assert!(matches!(parse_amount("0"), Err(ValidationError::ZeroAmount)));
        assert!(matches!(parse_amount("abc"), Err(ValidationError::BadAmount(_))));

        assert_eq!(parse_nonce(" 7 ").unwrap(), 7);
        assert!(matches!(parse_nonce("-1"), Err(ValidationError::BadNonce(_))));
        assert!(matches!(parse_nonce("1.5"), Err(ValidationError::BadNonce(_))));
    }

    #[test]
    fn top_up_must_move_something() {
        assert!(validate_top_up(Tokens::from_e8s(1)).is_ok());
        assert!(matches!(
            validate_top_up(Tokens::ZERO),
            Err(ValidationError::ZeroAmount)
        ));
    }
}
