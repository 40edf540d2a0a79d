//! Error types for policy configuration
//!
//! Classification itself never fails; these only come out of loading and
//! validating a policy.

use thiserror::Error;

/// Policy configuration error
#[derive(Error, Debug)]
pub enum PolicyError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML syntax or schema error
    #[error("invalid TOML policy: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON syntax or schema error
    #[error("invalid JSON policy: {0}")]
    Json(#[from] serde_json::Error),

    /// Policy file extension not recognized
    #[error("unsupported policy format: {0:?} (expected .toml or .json)")]
    UnsupportedFormat(String),

    /// Rule without a name
    #[error("rule #{index} has an empty name")]
    EmptyRuleName {
        /// Position in the rule list
        index: usize,
    },

    /// Two rules share a name
    #[error("duplicate rule name: {0}")]
    DuplicateRule(String),

    /// Port range with `from > to`
    #[error("rule {rule}: port range {from}-{to} is inverted")]
    InvertedPortRange {
        /// Offending rule
        rule: String,
        /// Lower bound as written
        from: u16,
        /// Upper bound as written
        to: u16,
    },

    /// Source and destination prefixes of different IP versions
    #[error("rule {0}: src_net and dst_net use different address families")]
    MixedAddressFamilies(String),
}

/// Result type for policy configuration
pub type PolicyResult<T> = Result<T, PolicyError>;
