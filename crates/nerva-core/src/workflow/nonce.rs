//! Nonce allocation.
//!
//! A nonce is free when no neuron exists at the subaccount it derives for
//! the owner. The scan is bounded by the configured limit.

use crate::{
    Error,
    cdk::candid::Principal,
    domain::subaccount::neuron_subaccount,
    log,
    log::Topic,
    workflow::{Services, Session},
};

///
/// NonceSlot
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NonceSlot {
    Free,
    Taken,
}

/// Report whether `nonce` is free for `owner`.
pub async fn check_nonce(
    services: Services<'_>,
    session: &Session,
    owner: Principal,
    nonce: u64,
) -> Result<NonceSlot, Error> {
    let subaccount = neuron_subaccount(&owner, nonce);
    if session.is_known_taken(&subaccount) {
        return Ok(NonceSlot::Taken);
    }

    match services.governance_ops().get_neuron(&subaccount).await? {
        Some(_) => {
            session.mark_taken(subaccount);
            Ok(NonceSlot::Taken)
        }
        None => Ok(NonceSlot::Free),
    }
}

/// First free nonce in `0..nonce_scan_limit`.
pub async fn allocate_nonce(
    services: Services<'_>,
    session: &Session,
    owner: Principal,
) -> Result<u64, Error> {
    let limit = session.settings().nonce_scan_limit;

    for nonce in 0..limit {
        if check_nonce(services, session, owner, nonce).await? == NonceSlot::Free {
            log!(Topic::Nonce, Debug, "nonce {nonce} is free for {owner}");
            return Ok(nonce);
        }
    }

    log!(Topic::Nonce, Warn, "no free nonce below {limit} for {owner}");

    Err(Error::NonceExhausted { limit })
}
