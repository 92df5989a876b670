//! Core Nerva library: SNS neuron staking, lifecycle and ownership transfer.
//!
//! ## Layering
//!
//! Nerva keeps the side-effect-free rules apart from the code that talks to
//! the ledger and governance canisters:
//! - `domain/` holds pure value types and rules (subaccount derivation,
//!   capability sets, dissolve classification, voting power).
//! - `policy/` owns pre-network validation; nothing there performs a call.
//! - `ops/` provides typed, mechanical ledger and governance operations.
//! - `infra/` defines the client seams and their raw IC implementations.
//! - `workflow/` orchestrates multi-step flows and reports typed progress.
//! - `api/` wires config-selected IC clients into workflows.
//!
//! The default flow is: api → workflow → policy → ops → infra.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod log;
pub mod policy;
pub mod workflow;

pub(crate) mod ops;

pub use {::nerva_cdk as cdk, error::Error};

///
/// Crate Version
///

pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// init and validate config
pub fn init_config(toml: &str) -> Result<(), String> {
    config::Config::init_from_toml(toml)
        .map(|cfg| {
            crate::log!(
                log::Topic::Config,
                Info,
                "config installed: settlement delay {}ms, nonce scan limit {}",
                cfg.workflow.settlement_delay_ms,
                cfg.workflow.nonce_scan_limit,
            );
        })
        .map_err(|err| err.to_string())
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogBuffer;

    #[test]
    fn init_config_installs_and_logs_once() {
        config::Config::reset_for_tests();
        LogBuffer::clear();

        assert_eq!(init_config("[workflow]\nnonce_scan_limit = 7\n"), Ok(()));
        assert_eq!(config::Config::get().map(|c| c.workflow.nonce_scan_limit).ok(), Some(7));
        assert!(
            LogBuffer::entries()
                .iter()
                .any(|e| e.topic.as_deref() == Some("Config"))
        );

        let err = init_config("[workflow]\nnonce_scan_limit = 7\n").unwrap_err();
        assert!(err.contains("already been initialized"));

        config::Config::reset_for_tests();
    }
}
