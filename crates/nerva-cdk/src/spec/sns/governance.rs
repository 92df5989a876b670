//!
//! SNS governance candid bindings.
//!
//! Only the records and variants Nerva sends or reads are modelled. Candid
//! record subtyping lets unknown wire fields be skipped, so newer governance
//! releases decode without changes here.
//!

use crate::spec::prelude::*;

///
/// NeuronId
/// An SNS neuron is addressed by the 32-byte subaccount holding its stake.
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct NeuronId {
    #[serde(with = "serde_bytes")]
    pub id: Vec<u8>,
}

impl NeuronId {
    #[must_use]
    pub fn from_subaccount(subaccount: &Subaccount) -> Self {
        Self {
            id: subaccount.to_vec(),
        }
    }

    /// Returns the subaccount form of the id, if it is exactly 32 bytes long.
    #[must_use]
    pub fn subaccount(&self) -> Option<Subaccount> {
        self.id.as_slice().try_into().ok()
    }
}

impl std::fmt::Display for NeuronId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(&self.id))
    }
}

///
/// NeuronPermission
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NeuronPermission {
    pub principal: Option<Principal>,
    pub permission_type: Vec<i32>,
}

///
/// NeuronPermissionList
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NeuronPermissionList {
    pub permissions: Vec<i32>,
}

///
/// DissolveState
///

#[derive(CandidType, Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum DissolveState {
    DissolveDelaySeconds(u64),
    WhenDissolvedTimestampSeconds(u64),
}

///
/// GovernanceSubaccount / GovernanceAccount
/// SNS governance wraps subaccounts in a record, unlike ICRC-1.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GovernanceSubaccount {
    #[serde(with = "serde_bytes")]
    pub subaccount: Vec<u8>,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GovernanceAccount {
    pub owner: Option<Principal>,
    pub subaccount: Option<GovernanceSubaccount>,
}

impl From<Account> for GovernanceAccount {
    fn from(account: Account) -> Self {
        Self {
            owner: Some(account.owner),
            subaccount: account.subaccount.map(|s| GovernanceSubaccount {
                subaccount: s.to_vec(),
            }),
        }
    }
}

///
/// DisburseMaturityInProgress
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DisburseMaturityInProgress {
    pub amount_e8s: u64,
    pub timestamp_of_disbursement_seconds: u64,
    pub finalize_disbursement_timestamp_seconds: Option<u64>,
    pub account_to_disburse_to: Option<GovernanceAccount>,
}

///
/// Neuron
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Neuron {
    pub id: Option<NeuronId>,
    pub permissions: Vec<NeuronPermission>,
    pub cached_neuron_stake_e8s: u64,
    pub neuron_fees_e8s: u64,
    pub created_timestamp_seconds: u64,
    pub aging_since_timestamp_seconds: u64,
    pub maturity_e8s_equivalent: u64,
    pub staked_maturity_e8s_equivalent: Option<u64>,
    pub auto_stake_maturity: Option<bool>,
    pub dissolve_state: Option<DissolveState>,
    pub voting_power_percentage_multiplier: u64,
    pub disburse_maturity_in_progress: Vec<DisburseMaturityInProgress>,
}

///
/// NervousSystemParameters
/// Read-only subset of the SNS parameters that bound staking operations.
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NervousSystemParameters {
    pub neuron_minimum_stake_e8s: Option<u64>,
    pub transaction_fee_e8s: Option<u64>,
    pub neuron_minimum_dissolve_delay_to_vote_seconds: Option<u64>,
    pub max_dissolve_delay_seconds: Option<u64>,
    pub max_neuron_age_for_age_bonus: Option<u64>,
    pub max_dissolve_delay_bonus_percentage: Option<u64>,
    pub max_age_bonus_percentage: Option<u64>,
    pub neuron_claimer_permissions: Option<NeuronPermissionList>,
    pub neuron_grantable_permissions: Option<NeuronPermissionList>,
    pub max_number_of_principals_per_neuron: Option<u64>,
}

///
/// GovernanceError
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GovernanceError {
    pub error_type: i32,
    pub error_message: String,
}

/// `GovernanceError::error_type` codes Nerva branches on.
pub mod error_type {
    pub const NOT_AUTHORIZED: i32 = 2;
    pub const NOT_FOUND: i32 = 3;
    pub const ACCESS_CONTROL_LIST: i32 = 8;
    pub const PRECONDITION_FAILED: i32 = 10;
}

// -----------------------------------------------------------------------------
// manage_neuron
// -----------------------------------------------------------------------------

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ManageNeuron {
    #[serde(with = "serde_bytes")]
    pub subaccount: Vec<u8>,
    pub command: Option<Command>,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Command {
    Configure(Configure),
    Disburse(Disburse),
    DisburseMaturity(DisburseMaturity),
    Split(Split),
    ClaimOrRefresh(ClaimOrRefresh),
    AddNeuronPermissions(AddNeuronPermissions),
    RemoveNeuronPermissions(RemoveNeuronPermissions),
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Configure {
    pub operation: Option<Operation>,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Operation {
    StartDissolving(StartDissolving),
    StopDissolving(StopDissolving),
    IncreaseDissolveDelay(IncreaseDissolveDelay),
    ChangeAutoStakeMaturity(ChangeAutoStakeMaturity),
}

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StartDissolving {}

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StopDissolving {}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IncreaseDissolveDelay {
    pub additional_dissolve_delay_seconds: u32,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChangeAutoStakeMaturity {
    pub requested_setting_for_auto_stake_maturity: bool,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Amount {
    pub e8s: u64,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Disburse {
    pub to_account: Option<GovernanceAccount>,
    pub amount: Option<Amount>,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DisburseMaturity {
    pub to_account: Option<GovernanceAccount>,
    pub percentage_to_disburse: u32,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Split {
    pub amount_e8s: u64,
    pub memo: u64,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClaimOrRefresh {
    pub by: Option<By>,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum By {
    MemoAndController(MemoAndController),
    NeuronId(Empty),
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MemoAndController {
    pub memo: u64,
    pub controller: Option<Principal>,
}

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Empty {}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AddNeuronPermissions {
    pub principal_id: Option<Principal>,
    pub permissions_to_add: Option<NeuronPermissionList>,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RemoveNeuronPermissions {
    pub principal_id: Option<Principal>,
    pub permissions_to_remove: Option<NeuronPermissionList>,
}

///
/// ManageNeuronResponse
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ManageNeuronResponse {
    pub command: Option<CommandResponse>,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum CommandResponse {
    Error(GovernanceError),
    Configure(Empty),
    Disburse(DisburseResponse),
    DisburseMaturity(DisburseMaturityResponse),
    Split(SplitResponse),
    ClaimOrRefresh(ClaimOrRefreshResponse),
    AddNeuronPermission(Empty),
    RemoveNeuronPermission(Empty),
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DisburseResponse {
    pub transfer_block_height: u64,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DisburseMaturityResponse {
    pub amount_disbursed_e8s: u64,
    pub amount_deducted_e8s: Option<u64>,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SplitResponse {
    pub created_neuron_id: Option<NeuronId>,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClaimOrRefreshResponse {
    pub refreshed_neuron_id: Option<NeuronId>,
}

// -----------------------------------------------------------------------------
// queries
// -----------------------------------------------------------------------------

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GetNeuron {
    pub neuron_id: Option<NeuronId>,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GetNeuronResponse {
    pub result: Option<GetNeuronResult>,
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GetNeuronResult {
    Error(GovernanceError),
    Neuron(Neuron),
}

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ListNeurons {
    pub of_principal: Option<Principal>,
    pub limit: u32,
    pub start_page_at: Option<NeuronId>,
}

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ListNeuronsResponse {
    pub neurons: Vec<Neuron>,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use candid::{Decode, Encode};

    #[test]
    fn neuron_id_round_trips_through_subaccount() {
        let sub = [7u8; 32];
        let id = NeuronId::from_subaccount(&sub);

        assert_eq!(id.subaccount(), Some(sub));
        assert_eq!(NeuronId { id: vec![1, 2] }.subaccount(), None);
        assert_eq!(NeuronId { id: vec![0xab, 0x01] }.to_string(), "ab01");
    }

    #[test]
    fn manage_neuron_claim_encodes_and_decodes() {
        let args = ManageNeuron {
            subaccount: vec![3; 32],
            command: Some(Command::ClaimOrRefresh(ClaimOrRefresh {
                by: Some(By::MemoAndController(MemoAndController {
                    memo: 3,
                    controller: Some(Principal::anonymous()),
                })),
            })),
        };

        let bytes = Encode!(&args).expect("encode manage_neuron");
        let decoded = Decode!(&bytes, ManageNeuron).expect("decode manage_neuron");

        assert_eq!(decoded, args);
    }
}
