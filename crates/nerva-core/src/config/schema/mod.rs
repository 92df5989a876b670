mod log;
mod workflow;

pub use log::*;
pub use workflow::*;

use crate::cdk::candid::Principal;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigSchemaError
///

#[derive(Debug, ThisError)]
pub enum ConfigSchemaError {
    #[error("validation error: {0}")]
    ValidationError(String),
}

///
/// Validate
///

pub trait Validate {
    fn validate(&self) -> Result<(), ConfigSchemaError>;
}

///
/// ConfigModel
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigModel {
    #[serde(default)]
    pub ledger: CanisterConfig,

    #[serde(default)]
    pub governance: CanisterConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl Validate for ConfigModel {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if let (Some(ledger), Some(governance)) = (self.ledger.canister, self.governance.canister)
            && ledger == governance
        {
            return Err(ConfigSchemaError::ValidationError(format!(
                "ledger and governance canisters must differ (both {ledger})"
            )));
        }

        self.workflow.validate()?;
        self.log.validate()?;

        Ok(())
    }
}

///
/// CanisterConfig
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CanisterConfig {
    #[serde(default)]
    pub canister: Option<Principal>,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_ledger_and_governance_is_rejected() {
        let pid = Principal::from_slice(&[3; 29]);
        let model = ConfigModel {
            ledger: CanisterConfig { canister: Some(pid) },
            governance: CanisterConfig { canister: Some(pid) },
            ..Default::default()
        };

        assert!(model.validate().is_err());
        assert!(ConfigModel::default().validate().is_ok());
    }
}
