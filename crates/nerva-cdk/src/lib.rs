///
/// Unified façade over the Internet Computer SDK
///
/// This module re-exports the IC developer crates (`ic_cdk`, `candid`,
/// `ic_cdk_timers`, `icrc_ledger_types`) under one namespace, next to the
/// candid bindings for the ledger and SNS governance interfaces that Nerva
/// talks to.
///
/// Downstream code imports `nerva_cdk::*` instead of pulling in several IC SDK
/// crates directly, so the toolkit can follow SDK releases in one place.
///
pub use candid;
pub use ic_cdk::{api, call, eprintln, futures, println, trap};
pub use ic_cdk_timers as timers;
pub use icrc_ledger_types;

pub mod spec;
pub mod types;
pub mod utils;
