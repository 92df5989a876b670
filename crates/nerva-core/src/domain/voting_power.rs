//! Voting power.
//!
//! `vp = stake × (1 + delay bonus) × (1 + age bonus)`, each bonus growing
//! linearly up to its configured maximum and saturating there. A neuron whose
//! dissolve delay is below the voting threshold has no voting power.

use crate::{
    cdk::types::Tokens,
    domain::{neuron::NeuronSnapshot, params::StakingParameters},
};

///
/// VotingPowerInputs
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VotingPowerInputs {
    pub stake: Tokens,
    pub dissolve_delay_seconds: u64,
    pub age_seconds: u64,
}

impl VotingPowerInputs {
    /// Inputs for `neuron` at `now`: effective stake plus staked maturity.
    #[must_use]
    pub const fn for_neuron(neuron: &NeuronSnapshot, now: u64) -> Self {
        let stake = neuron
            .effective_stake()
            .e8s()
            .saturating_add(neuron.staked_maturity.e8s());

        Self {
            stake: Tokens::from_e8s(stake),
            dissolve_delay_seconds: neuron.dissolve_status(now).remaining_delay(now),
            age_seconds: neuron.age_seconds(now),
        }
    }
}

/// Effective voting weight in e8s.
#[must_use]
pub fn voting_power(inputs: VotingPowerInputs, params: &StakingParameters) -> u64 {
    if inputs.dissolve_delay_seconds < params.min_dissolve_delay_to_vote_seconds {
        return 0;
    }

    let stake = u128::from(inputs.stake.e8s());

    let delay_bonused = apply_bonus(
        stake,
        inputs.dissolve_delay_seconds,
        params.max_dissolve_delay_seconds,
        params.max_dissolve_delay_bonus_percentage,
    );
    let total = apply_bonus(
        delay_bonused,
        inputs.age_seconds,
        params.max_neuron_age_for_age_bonus_seconds,
        params.max_age_bonus_percentage,
    );

    u64::try_from(total).unwrap_or(u64::MAX)
}

/// Voting power of `neuron` at `now`.
#[must_use]
pub fn neuron_voting_power(neuron: &NeuronSnapshot, now: u64, params: &StakingParameters) -> u64 {
    voting_power(VotingPowerInputs::for_neuron(neuron, now), params)
}

// amount × (1 + min(x, max_x) / max_x × pct / 100)
fn apply_bonus(amount: u128, x: u64, max_x: u64, max_pct: u64) -> u128 {
    if max_x == 0 || max_pct == 0 {
        return amount;
    }

    let x = u128::from(x.min(max_x));
    let bonus = amount
        .checked_mul(x)
        .and_then(|v| v.checked_mul(u128::from(max_pct)))
        .map_or(u128::MAX, |v| v / (u128::from(max_x) * 100));

    amount.saturating_add(bonus)
}

///
/// TESTS
///
