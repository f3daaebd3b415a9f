//! Feature-flag evaluation.
//!
//! Two decisions are delegated to an external policy: whether an
//! organisation type is accepted at all, and whether a profiling ambiguity
//! may proceed. [`StaticFlags`] is an in-process evaluator configured from
//! JSON, used by the CLI and tests.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

/// Flag gating which organisation types are processed.
/// Evaluated with context `{"org_type": <feed id>}`.
pub const ACCEPTED_ORG_TYPES: &str = "accepted_org_types";

/// Flag allowing updates when more than one primary service matches.
/// Evaluated with context `{"ods_code": <code>}`.
pub const TOLERATE_PROFILING_AMBIGUITY: &str = "tolerate_profiling_ambiguity";

/// Key/value context a flag is evaluated against.
pub type FlagContext = BTreeMap<String, String>;

/// Errors from a policy collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("unknown feature flag: {0}")]
    UnknownFlag(String),

    #[error("flag {flag} needs context key {key:?}")]
    MissingContext { flag: String, key: String },

    #[error("could not load flags: {0}")]
    Load(String),
}

/// Evaluates named feature flags.
pub trait FeatureFlags {
    fn evaluate(&self, name: &str, context: &FlagContext) -> Result<bool, PolicyError>;
}

/// How a [`StaticFlags`] flag decides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagRule {
    /// Always this value.
    Always(bool),
    /// True when the context value for `key` is one of `values`.
    ContextIn { key: String, values: Vec<String> },
}

/// A fixed set of flag rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct StaticFlags {
    rules: HashMap<String, FlagRule>,
}

impl StaticFlags {
    pub fn new(rules: HashMap<String, FlagRule>) -> Self {
        Self { rules }
    }

    /// Load rules from a JSON object of `{flag name: rule}`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PolicyError::Load(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&json)
            .map_err(|e| PolicyError::Load(format!("{}: {e}", path.display())))
    }

    /// Set or replace one flag.
    pub fn with(mut self, name: &str, rule: FlagRule) -> Self {
        self.rules.insert(name.to_string(), rule);
        self
    }
}

impl Default for StaticFlags {
    /// Pharmacies and dentists accepted; ambiguity not tolerated.
    fn default() -> Self {
        Self::new(HashMap::new())
            .with(
                ACCEPTED_ORG_TYPES,
                FlagRule::ContextIn {
                    key: "org_type".into(),
                    values: vec!["PHA".into(), "Dentist".into()],
                },
            )
            .with(TOLERATE_PROFILING_AMBIGUITY, FlagRule::Always(false))
    }
}

impl FeatureFlags for StaticFlags {
    fn evaluate(&self, name: &str, context: &FlagContext) -> Result<bool, PolicyError> {
        match self.rules.get(name) {
            None => Err(PolicyError::UnknownFlag(name.to_string())),
            Some(FlagRule::Always(value)) => Ok(*value),
            Some(FlagRule::ContextIn { key, values }) => {
                let value = context.get(key).ok_or_else(|| PolicyError::MissingContext {
                    flag: name.to_string(),
                    key: key.clone(),
                })?;
                Ok(values.contains(value))
            }
        }
    }
}

/// Build a one-entry context.
pub fn context(key: &str, value: &str) -> FlagContext {
    FlagContext::from([(key.to_string(), value.to_string())])
}
