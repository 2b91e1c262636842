use std::path::Path;
use std::time::Duration;

use bank_crypto::CredentialHasher;
use bank_gate::GateConfig;
use bank_ledger::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::error::{BankError, BankResult};

/// Runtime configuration for a [`crate::Bank`].
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BankConfig {
    /// Milliseconds an operation waits for an account lock.
    pub lock_timeout_ms: u64,
    /// Stretching rounds for newly hashed credentials.
    pub credential_rounds: u32,
    /// Skip gate rules on registration. For trusted callers only.
    pub permissive_inputs: bool,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 500,
            credential_rounds: CredentialHasher::DEFAULT_ROUNDS,
            permissive_inputs: false,
        }
    }
}

impl BankConfig {
    pub fn from_toml_str(source: &str) -> BankResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| BankError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> BankResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| BankError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> BankResult<String> {
        toml::to_string_pretty(self).map_err(|e| BankError::Config(e.to_string()))
    }

    fn validate(&self) -> BankResult<()> {
        if self.lock_timeout_ms == 0 {
            return Err(BankError::Config("lock_timeout_ms must be greater than zero".into()));
        }
        if self.credential_rounds == 0 {
            return Err(BankError::Config("credential_rounds must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            lock_timeout: self.lock_timeout(),
        }
    }

    pub fn gate(&self) -> GateConfig {
        GateConfig {
            permissive: self.permissive_inputs,
        }
    }

    pub fn hasher(&self) -> CredentialHasher {
        CredentialHasher::new(self.credential_rounds)
    }
}
