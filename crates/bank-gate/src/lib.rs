//! Input gate for the banking core.
//!
//! Raw identity input (tax number, phone, name, credential) passes through
//! the gate before it reaches the stores. The gate is a registry mapping a
//! rule name to a pure `&str -> RuleOutcome` function; checks are
//! dispatched by lookup and run fail-fast in the order requested.
//!
//! # Quick Start
//!
//! ```rust
//! use bank_gate::{rules, GateConfig, InputGate};
//!
//! let gate = InputGate::with_default_rules(GateConfig::default());
//! let report = gate
//!     .evaluate(&[(rules::TAX_ID, "123.456.789-09"), (rules::NAME, "Ana Souza")])
//!     .unwrap();
//! assert!(report.is_accepted());
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod normalize;
pub mod rules;

pub use config::GateConfig;
pub use error::GateError;
pub use gate::{GateReport, InputGate, RuleResult};
pub use normalize::{normalize_phone, normalize_tax_id};
pub use rules::{Rule, RuleOutcome};
