use crate::{
    cdk::{spec::sns::governance::NervousSystemParameters, types::Tokens},
    domain::{DomainError, permission::CapabilitySet},
};

///
/// StakingParameters
/// The nervous-system bounds that staking, splitting and voting power
/// depend on, resolved from the optional wire fields.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StakingParameters {
    pub minimum_stake: Tokens,
    pub transaction_fee: Tokens,
    pub min_dissolve_delay_to_vote_seconds: u64,
    pub max_dissolve_delay_seconds: u64,
    pub max_neuron_age_for_age_bonus_seconds: u64,
    pub max_dissolve_delay_bonus_percentage: u64,
    pub max_age_bonus_percentage: u64,
    pub grantable: Option<CapabilitySet>,
}

impl StakingParameters {
    /// Smallest amount a split may carve off: the new neuron must reach the
    /// minimum stake after the split fee is taken.
    #[must_use]
    pub const fn minimum_split(&self) -> Tokens {
        Tokens::from_e8s(
            self.minimum_stake
                .e8s()
                .saturating_add(self.transaction_fee.e8s()),
        )
    }
}

impl TryFrom<&NervousSystemParameters> for StakingParameters {
    type Error = DomainError;

    fn try_from(p: &NervousSystemParameters) -> Result<Self, Self::Error> {
        let minimum_stake = p
            .neuron_minimum_stake_e8s
            .ok_or(DomainError::MissingParameter("neuron_minimum_stake_e8s"))?;
        let transaction_fee = p
            .transaction_fee_e8s
            .ok_or(DomainError::MissingParameter("transaction_fee_e8s"))?;
        let max_dissolve_delay_seconds = p
            .max_dissolve_delay_seconds
            .ok_or(DomainError::MissingParameter("max_dissolve_delay_seconds"))?;

        Ok(Self {
            minimum_stake: Tokens::from_e8s(minimum_stake),
            transaction_fee: Tokens::from_e8s(transaction_fee),
            min_dissolve_delay_to_vote_seconds: p
                .neuron_minimum_dissolve_delay_to_vote_seconds
                .unwrap_or(0),
            max_dissolve_delay_seconds,
            max_neuron_age_for_age_bonus_seconds: p.max_neuron_age_for_age_bonus.unwrap_or(0),
            max_dissolve_delay_bonus_percentage: p.max_dissolve_delay_bonus_percentage.unwrap_or(0),
            max_age_bonus_percentage: p.max_age_bonus_percentage.unwrap_or(0),
            grantable: p
                .neuron_grantable_permissions
                .as_ref()
                .map(CapabilitySet::from),
        })
    }
}

///
/// TESTS
///
