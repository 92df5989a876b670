//! Entry points for canister code.
//!
//! Thin wrappers that build the IC clients named in the installed config and
//! run one workflow with them. No orchestration lives here.

pub mod neuron;

pub use neuron::NeuronApi;
