//! Neuron staking subaccounts.
//!
//! A neuron's stake lives in a subaccount of the governance canister that is
//! derived from the claiming principal and a nonce:
//!
//! `SHA-256(0x0c ‖ "neuron-stake" ‖ principal ‖ nonce as u64 big-endian)`

use crate::cdk::{
    candid::Principal,
    spec::sns::governance::NeuronId,
    types::{Account, Subaccount},
};
use sha2::{Digest, Sha256};

/// Domain separator hashed ahead of the principal bytes.
pub const NEURON_STAKE_DOMAIN: &[u8] = b"neuron-stake";

// length prefix of NEURON_STAKE_DOMAIN
const DOMAIN_LENGTH_TAG: u8 = 0x0c;

const _: () = assert!(NEURON_STAKE_DOMAIN.len() == DOMAIN_LENGTH_TAG as usize);

/// Derive the staking subaccount for `(owner, nonce)`.
#[must_use]
pub fn neuron_subaccount(owner: &Principal, nonce: u64) -> Subaccount {
    let mut hasher = Sha256::new();
    hasher.update([DOMAIN_LENGTH_TAG]);
    hasher.update(NEURON_STAKE_DOMAIN);
    hasher.update(owner.as_slice());
    hasher.update(nonce.to_be_bytes());

    hasher.finalize().into()
}

/// The neuron id that a successful claim of `(owner, nonce)` registers.
#[must_use]
pub fn neuron_id(owner: &Principal, nonce: u64) -> NeuronId {
    NeuronId::from_subaccount(&neuron_subaccount(owner, nonce))
}

/// Ledger account the funding transfer for `(owner, nonce)` is sent to.
#[must_use]
pub fn staking_account(governance: Principal, owner: &Principal, nonce: u64) -> Account {
    Account {
        owner: governance,
        subaccount: Some(neuron_subaccount(owner, nonce)),
    }
}

/// Memo attached to the creation transfer.
#[must_use]
pub const fn creation_memo(nonce: u64) -> [u8; 8] {
    nonce.to_be_bytes()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn p(byte: u8) -> Principal {
        Principal::from_slice(&[byte; 29])
    }

    #[test]
    fn derivation_matches_known_vectors() {
        assert_eq!(
            hex::encode(neuron_subaccount(&Principal::anonymous(), 0)),
            "bf03d242b370d2126fcd94f229f6525891f28d07833d36005bfac6c224ffa651"
        );
        assert_eq!(
            hex::encode(neuron_subaccount(&p(1), 3)),
            "774d5ca00fd6f951e2e7f2a45bbfda09c2ebc836c5057f5941dc28f43aa39386"
        );
        assert_eq!(
            hex::encode(neuron_subaccount(&p(1), 4)),
            "97a19722b4f51e7c050ef8f0473096e14b3cc85bedaf3247767655a157992dbf"
        );
    }

    #[test]
    fn derivation_is_deterministic_and_nonce_sensitive() {
        let owner = p(9);

        for n in [0, 1, 17, 99, u64::MAX - 1] {
            assert_eq!(neuron_subaccount(&owner, n), neuron_subaccount(&owner, n));
            assert_ne!(neuron_subaccount(&owner, n), neuron_subaccount(&owner, n + 1));
        }
        assert_ne!(neuron_subaccount(&p(1), 0), neuron_subaccount(&p(2), 0));
    }

    #[test]
    fn memo_is_big_endian_nonce() {
        assert_eq!(creation_memo(3), [0, 0, 0, 0, 0, 0, 0, 3]);
        assert_eq!(creation_memo(0x0102), [0, 0, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn staking_account_targets_governance() {
        let gov = p(42);
        let account = staking_account(gov, &p(1), 3);

        assert_eq!(account.owner, gov);
        assert_eq!(account.subaccount, Some(neuron_subaccount(&p(1), 3)));
        assert_eq!(neuron_id(&p(1), 3).subaccount(), account.subaccount);
    }
}
