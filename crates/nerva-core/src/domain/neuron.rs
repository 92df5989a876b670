use crate::{
    cdk::{
        candid::Principal,
        spec::sns::governance::{DissolveState, Neuron, NeuronId},
        types::{Subaccount, Tokens},
    },
    domain::{
        DomainError,
        dissolve::DissolveStatus,
        permission::{CapabilitySet, Grant, grants_from_permissions},
    },
};

///
/// PendingMaturity
/// A maturity disbursement waiting for its finalization time.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PendingMaturity {
    pub amount: Tokens,
    pub finalize_at: Option<u64>,
}

///
/// NeuronSnapshot
/// A decoded, validated view of a governance `Neuron` at one read.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NeuronSnapshot {
    pub subaccount: Subaccount,
    pub grants: Vec<Grant>,
    pub cached_stake: Tokens,
    pub neuron_fees: Tokens,
    pub maturity: Tokens,
    pub staked_maturity: Tokens,
    pub dissolve_state: Option<DissolveState>,
    pub auto_stake_maturity: bool,
    pub created_timestamp_seconds: u64,
    pub aging_since_timestamp_seconds: u64,
    pub pending_maturity: Vec<PendingMaturity>,
}

impl NeuronSnapshot {
    #[must_use]
    pub fn id(&self) -> NeuronId {
        NeuronId::from_subaccount(&self.subaccount)
    }

    /// Stake that counts for splitting and voting: cached stake less fees.
    #[must_use]
    pub const fn effective_stake(&self) -> Tokens {
        self.cached_stake.saturating_sub(self.neuron_fees)
    }

    #[must_use]
    pub const fn dissolve_status(&self, now: u64) -> DissolveStatus {
        DissolveStatus::classify(self.dissolve_state, now)
    }

    /// Seconds the neuron has been aging; zero while dissolving.
    #[must_use]
    pub const fn age_seconds(&self, now: u64) -> u64 {
        match self.dissolve_status(now) {
            DissolveStatus::Dissolving { .. } => 0,
            _ => now.saturating_sub(self.aging_since_timestamp_seconds),
        }
    }

    #[must_use]
    pub fn capabilities_of(&self, principal: &Principal) -> CapabilitySet {
        self.grants
            .iter()
            .filter(|g| &g.principal == principal)
            .fold(CapabilitySet::EMPTY, |acc, g| acc.union(g.capabilities))
    }

    /// Principals currently holding every capability.
    #[must_use]
    pub fn full_holders(&self) -> Vec<Principal> {
        self.grants
            .iter()
            .filter(|g| g.capabilities.is_full())
            .map(|g| g.principal)
            .collect()
    }

    /// Principals other than `principal` that hold at least one capability.
    #[must_use]
    pub fn other_holders(&self, principal: &Principal) -> Vec<Grant> {
        self.grants
            .iter()
            .filter(|g| &g.principal != principal && !g.capabilities.is_empty())
            .copied()
            .collect()
    }
}

impl TryFrom<Neuron> for NeuronSnapshot {
    type Error = DomainError;

    fn try_from(neuron: Neuron) -> Result<Self, Self::Error> {
        let id = neuron
            .id
            .as_ref()
            .ok_or_else(|| DomainError::MalformedNeuron("missing id".to_string()))?;
        let subaccount = id.subaccount().ok_or_else(|| {
            DomainError::MalformedNeuron(format!("id {id} is not a 32-byte subaccount"))
        })?;

        let pending_maturity = neuron
            .disburse_maturity_in_progress
            .iter()
            .map(|d| PendingMaturity {
                amount: Tokens::from_e8s(d.amount_e8s),
                finalize_at: d.finalize_disbursement_timestamp_seconds,
            })
            .collect();

        Ok(Self {
            subaccount,
            grants: grants_from_permissions(&neuron.permissions),
            cached_stake: Tokens::from_e8s(neuron.cached_neuron_stake_e8s),
            neuron_fees: Tokens::from_e8s(neuron.neuron_fees_e8s),
            maturity: Tokens::from_e8s(neuron.maturity_e8s_equivalent),
            staked_maturity: Tokens::from_e8s(neuron.staked_maturity_e8s_equivalent.unwrap_or(0)),
            dissolve_state: neuron.dissolve_state,
            auto_stake_maturity: neuron.auto_stake_maturity.unwrap_or(false),
            created_timestamp_seconds: neuron.created_timestamp_seconds,
            aging_since_timestamp_seconds: neuron.aging_since_timestamp_seconds,
            pending_maturity,
        })
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdk::spec::sns::governance::NeuronPermission;

    fn raw(id: Vec<u8>) -> Neuron {
        Neuron {
            id: Some(NeuronId { id }),
            permissions: vec![NeuronPermission {
                principal: Some(Principal::anonymous()),
                permission_type: CapabilitySet::FULL.to_codes(),
            }],
            cached_neuron_stake_e8s: 500,
            neuron_fees_e8s: 20,
            aging_since_timestamp_seconds: 100,
            dissolve_state: Some(DissolveState::DissolveDelaySeconds(60)),
            ..Default::default()
        }
    }

    #[test]
    fn decodes_a_well_formed_neuron() {
        let snap = NeuronSnapshot::try_from(raw(vec![5; 32])).unwrap();

        assert_eq!(snap.subaccount, [5; 32]);
        assert_eq!(snap.effective_stake().e8s(), 480);
        assert_eq!(snap.full_holders(), vec![Principal::anonymous()]);
        assert_eq!(snap.age_seconds(160), 60);
        assert!(snap.other_holders(&Principal::anonymous()).is_empty());
    }

    #[test]
    fn rejects_short_ids() {
        assert!(matches!(
            NeuronSnapshot::try_from(raw(vec![5; 4])),
            Err(DomainError::MalformedNeuron(_))
        ));
    }
}
