//! Pure neuron rules: no calls, no logging, no clocks (time is passed in).

pub mod dissolve;
pub mod neuron;
pub mod params;
pub mod permission;
pub mod subaccount;
pub mod voting_power;

use thiserror::Error as ThisError;

///
/// DomainError
///

#[derive(Debug, ThisError)]
pub enum DomainError {
    #[error("nervous system parameter '{0}' is not set")]
    MissingParameter(&'static str),

    #[error("malformed neuron: {0}")]
    MalformedNeuron(String),
}
