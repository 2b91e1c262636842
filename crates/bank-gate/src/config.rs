use serde::{Deserialize, Serialize};

/// Configuration for the input gate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// When `true`, every check passes without running its rule. Intended for
    /// trusted callers that have already validated their input.
    #[serde(default)]
    pub permissive: bool,
}

impl GateConfig {
    pub fn permissive() -> Self {
        Self { permissive: true }
    }
}
