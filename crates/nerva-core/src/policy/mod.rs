//! Pre-network validation. Every check here runs on values already in hand
//! and fails with a [`ValidationError`] before any call is made.

pub mod dissolve;
pub mod split;
pub mod stake;
pub mod transfer;

use crate::{
    cdk::candid::Principal,
    domain::{neuron::NeuronSnapshot, permission::Capability},
    error::ValidationError,
};

///
/// require_capability
/// Fail unless `principal` holds `capability` on `neuron`.
///

pub fn require_capability(
    neuron: &NeuronSnapshot,
    principal: Principal,
    capability: Capability,
) -> Result<(), ValidationError> {
    if neuron.capabilities_of(&principal).contains(capability) {
        Ok(())
    } else {
        Err(ValidationError::MissingCapability {
            principal,
            capability,
        })
    }
}
