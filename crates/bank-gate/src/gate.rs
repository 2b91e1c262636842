use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::GateConfig;
use crate::error::GateError;
use crate::rules::{self, Rule, RuleOutcome};

/// Recorded result from one rule evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleResult {
    pub rule: String,
    pub passed: bool,
    pub reason: Option<String>,
}

/// Final result of a gate evaluation.
#[derive(Clone, Debug)]
pub struct GateReport {
    /// Results for each rule that ran, in order.
    pub results: Vec<RuleResult>,
    pub elapsed: Duration,
}

impl GateReport {
    pub fn is_accepted(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// The first failing rule, if any.
    pub fn rejection(&self) -> Option<&RuleResult> {
        self.results.iter().find(|r| !r.passed)
    }

    /// Convert a rejected report into the matching error.
    pub fn into_result(self) -> Result<(), GateError> {
        match self.rejection() {
            Some(failed) => Err(GateError::rejected(
                failed.rule.clone(),
                failed.reason.clone().unwrap_or_default(),
            )),
            None => Ok(()),
        }
    }
}

/// Registry of named validation rules.
///
/// The pipeline is **fail-fast**: [`InputGate::evaluate`] stops at the first
/// failing rule.
pub struct InputGate {
    config: GateConfig,
    rules: BTreeMap<String, Rule>,
}

impl InputGate {
    /// Create a gate with no rules registered.
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            rules: BTreeMap::new(),
        }
    }

    /// Create a gate with the built-in identity and credential rules.
    pub fn with_default_rules(config: GateConfig) -> Self {
        let mut gate = Self::new(config);
        gate.register(rules::TAX_ID, rules::tax_id);
        gate.register(rules::PHONE, rules::phone);
        gate.register(rules::NAME, rules::name);
        gate.register(rules::CREDENTIAL, rules::credential);
        gate
    }

    /// Register (or replace) a rule under `name`.
    pub fn register(&mut self, name: impl Into<String>, rule: Rule) {
        self.rules.insert(name.into(), rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Run a single rule by name.
    pub fn check(&self, rule: &str, input: &str) -> Result<RuleOutcome, GateError> {
        let f = self
            .rules
            .get(rule)
            .ok_or_else(|| GateError::UnknownRule(rule.to_string()))?;
        if self.config.permissive {
            return Ok(RuleOutcome::Pass);
        }
        Ok(f(input))
    }

    /// Run a single rule, mapping a failure to [`GateError::Rejected`].
    pub fn require(&self, rule: &str, input: &str) -> Result<(), GateError> {
        match self.check(rule, input)? {
            RuleOutcome::Pass => Ok(()),
            RuleOutcome::Fail { reason } => Err(GateError::rejected(rule, reason)),
        }
    }

    /// Run `(rule, input)` pairs in order, stopping at the first failure.
    ///
    /// Unknown rule names are an error, not a rejection.
    pub fn evaluate(&self, checks: &[(&str, &str)]) -> Result<GateReport, GateError> {
        let start = Instant::now();
        let mut results = Vec::with_capacity(checks.len());

        for (rule, input) in checks {
            let outcome = self.check(rule, input)?;
            let (passed, reason) = match outcome {
                RuleOutcome::Pass => (true, None),
                RuleOutcome::Fail { reason } => (false, Some(reason)),
            };
            results.push(RuleResult {
                rule: rule.to_string(),
                passed,
                reason,
            });

            if !passed {
                debug!(rule = %rule, "input rejected by gate");
                break;
            }
        }

        Ok(GateReport {
            results,
            elapsed: start.elapsed(),
        })
    }
}

impl Default for InputGate {
    fn default() -> Self {
        Self::with_default_rules(GateConfig::default())
    }
}
