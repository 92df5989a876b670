pub mod schema;

use schema::{ConfigSchemaError, Validate};
use std::{cell::RefCell, sync::Arc};
use thiserror::Error as ThisError;

pub use schema::ConfigModel;

//
// CONFIG
//
// Installed once per process (or canister) and shared as an `Arc` so host-side
// tools and tests can hand it across threads; the canister itself is
// single-threaded.
//

thread_local! {
    static CONFIG: RefCell<Option<Arc<ConfigModel>>> = const { RefCell::new(None) };
}

/// Errors related to configuration lifecycle and parsing.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("config has already been initialized")]
    AlreadyInitialized,

    #[error("config has not been initialized")]
    NotInitialized,

    #[error("no {0} canister is configured")]
    MissingCanister(&'static str),

    /// TOML could not be parsed into the expected structure.
    #[error("toml error: {0}")]
    CannotParseToml(String),

    /// Wrapper for data schema-level errors.
    #[error(transparent)]
    ConfigSchema(#[from] ConfigSchemaError),
}

///
/// Config
///

pub struct Config {}

impl Config {
    pub fn get() -> Result<Arc<ConfigModel>, ConfigError> {
        Self::try_get().ok_or(ConfigError::NotInitialized)
    }

    #[must_use]
    pub fn try_get() -> Option<Arc<ConfigModel>> {
        CONFIG.with(|cfg| cfg.borrow().clone())
    }

    /// Parse and validate a TOML document without installing it.
    pub fn parse(config_str: &str) -> Result<ConfigModel, ConfigError> {
        let config: ConfigModel =
            toml::from_str(config_str).map_err(|e| ConfigError::CannotParseToml(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Initialize the global configuration from a TOML string.
    pub fn init_from_toml(config_str: &str) -> Result<Arc<ConfigModel>, ConfigError> {
        let config = Self::parse(config_str)?;

        Self::install(config)
    }

    /// Install an already-built model, validating it first.
    pub fn install(config: ConfigModel) -> Result<Arc<ConfigModel>, ConfigError> {
        config.validate()?;

        CONFIG.with(|cfg| {
            let mut borrow = cfg.borrow_mut();
            if borrow.is_some() {
                return Err(ConfigError::AlreadyInitialized);
            }

            let arc = Arc::new(config);
            *borrow = Some(arc.clone());

            Ok(arc)
        })
    }

    /// Return the current config as a TOML string.
    pub fn to_toml() -> Result<String, ConfigError> {
        let cfg = Self::get()?;

        toml::to_string_pretty(&*cfg).map_err(|e| ConfigError::CannotParseToml(e.to_string()))
    }

    /// Clear the installed config so tests can reinitialize it.
    #[doc(hidden)]
    pub fn reset_for_tests() {
        CONFIG.with(|cfg| {
            *cfg.borrow_mut() = None;
        });
    }
}

///
/// TESTS
///
