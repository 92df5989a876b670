use super::{ConfigSchemaError, Validate};
use serde::{Deserialize, Serialize};

///
/// Defaults
///

mod defaults {
    pub const fn settlement_delay_ms() -> u64 {
        5_000
    }

    pub const fn nonce_scan_limit() -> u64 {
        100
    }

    pub const fn list_limit() -> u32 {
        100
    }
}

pub const MAX_SETTLEMENT_DELAY_MS: u64 = 300_000;
pub const MAX_NONCE_SCAN_LIMIT: u64 = u16::MAX as u64;

///
/// WorkflowConfig
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Pause between the funding transfer and the claim.
    #[serde(default = "defaults::settlement_delay_ms")]
    pub settlement_delay_ms: u64,

    /// Nonces `0..nonce_scan_limit` are probed when allocating.
    #[serde(default = "defaults::nonce_scan_limit")]
    pub nonce_scan_limit: u64,

    #[serde(default = "defaults::list_limit")]
    pub list_limit: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            settlement_delay_ms: defaults::settlement_delay_ms(),
            nonce_scan_limit: defaults::nonce_scan_limit(),
            list_limit: defaults::list_limit(),
        }
    }
}

impl Validate for WorkflowConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if self.settlement_delay_ms > MAX_SETTLEMENT_DELAY_MS {
            return Err(ConfigSchemaError::ValidationError(format!(
                "workflow.settlement_delay_ms {} exceeds max {MAX_SETTLEMENT_DELAY_MS}",
                self.settlement_delay_ms
            )));
        }

        if self.nonce_scan_limit == 0 || self.nonce_scan_limit > MAX_NONCE_SCAN_LIMIT {
            return Err(ConfigSchemaError::ValidationError(format!(
                "workflow.nonce_scan_limit {} must be within 1..={MAX_NONCE_SCAN_LIMIT}",
                self.nonce_scan_limit
            )));
        }

        if self.list_limit == 0 {
            return Err(ConfigSchemaError::ValidationError(
                "workflow.list_limit must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
