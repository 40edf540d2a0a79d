//! Policy Configuration
//!
//! Policies are written as TOML or JSON and validated into an immutable
//! [`Policy`] before they are handed to the engine.
//!
//! ```toml
//! default_verdict = "pass"
//!
//! [[rules]]
//! name = "ssh"
//! protocol = "tcp"
//! dst_port = 22
//! verdict = "pass"
//!
//! [[rules]]
//! name = "tcp-deny"
//! protocol = "tcp"
//! verdict = "drop"
//! ```

use crate::error::{PolicyError, PolicyResult};
use crate::policy::Policy;
use crate::rules::{PortMatch, Rule, RuleSet};
use crate::verdict::Verdict;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// On-disk policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Verdict for inconclusive classification (fail-open when omitted)
    #[serde(default)]
    pub default_verdict: Verdict,
    /// Rules in evaluation order
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl PolicyConfig {
    /// Parse TOML
    pub fn from_toml_str(content: &str) -> PolicyResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse JSON
    pub fn from_json_str(content: &str) -> PolicyResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from file, format picked by extension
    pub fn load(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match ext.as_str() {
            "toml" => Self::from_toml_str(&content),
            "json" => Self::from_json_str(&content),
            _ => Err(PolicyError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check rule names, port ranges and address families
    pub fn validate(&self) -> PolicyResult<()> {
        let mut names = HashSet::with_capacity(self.rules.len());

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(PolicyError::EmptyRuleName { index });
            }
            if !names.insert(rule.name.as_str()) {
                return Err(PolicyError::DuplicateRule(rule.name.clone()));
            }

            for port in [rule.dst_port, rule.src_port].into_iter().flatten() {
                if let PortMatch::Range { from, to } = port {
                    if from > to {
                        return Err(PolicyError::InvertedPortRange {
                            rule: rule.name.clone(),
                            from,
                            to,
                        });
                    }
                }
            }

            if let (Some(src), Some(dst)) = (rule.src_net, rule.dst_net) {
                if src.is_ipv4() != dst.is_ipv4() {
                    return Err(PolicyError::MixedAddressFamilies(rule.name.clone()));
                }
            }
        }

        Ok(())
    }

    /// Validate and build the engine policy
    pub fn into_policy(self) -> PolicyResult<Policy> {
        if let Err(e) = self.validate() {
            warn!(error = %e, "policy rejected");
            return Err(e);
        }

        for (index, rule) in self.rules.iter().enumerate() {
            debug!(
                index,
                name = %rule.name,
                protocol = %rule.protocol,
                verdict = %rule.verdict,
                "rule loaded"
            );
        }

        Ok(Policy::new(RuleSet::new(self.rules), self.default_verdict))
    }
}

impl From<&Policy> for PolicyConfig {
    fn from(policy: &Policy) -> Self {
        Self {
            default_verdict: policy.default_verdict(),
            rules: policy.rules().iter().cloned().collect(),
        }
    }
}

/// Load, validate and build a policy from `path`
pub fn load_policy(path: impl AsRef<Path>) -> PolicyResult<Policy> {
    let path = path.as_ref();
    let policy = PolicyConfig::load(path)?.into_policy()?;
    info!(
        path = %path.display(),
        rules = policy.rules().len(),
        default_verdict = %policy.default_verdict(),
        "policy loaded"
    );
    Ok(policy)
}
