/// Errors that can occur during gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// No rule is registered under the requested name.
    #[error("unknown validation rule: {0}")]
    UnknownRule(String),

    /// The input failed a rule.
    #[error("{rule}: {reason}")]
    Rejected { rule: String, reason: String },
}

impl GateError {
    pub fn rejected(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}
