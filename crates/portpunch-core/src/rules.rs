//! Rule Set: ordered predicate -> verdict pairs
//!
//! Rules are evaluated top to bottom against the fields pulled out of one
//! packet; the first match decides. The set is immutable once built.

use crate::headers::Transport;
use crate::verdict::Verdict;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Port predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortMatch {
    /// Exactly this port
    Single(u16),
    /// Inclusive range
    Range {
        /// First port in range
        from: u16,
        /// Last port in range
        to: u16,
    },
}

impl PortMatch {
    /// Check whether `port` (host order) is covered
    #[inline(always)]
    pub fn contains(&self, port: u16) -> bool {
        match *self {
            Self::Single(p) => port == p,
            Self::Range { from, to } => port >= from && port <= to,
        }
    }

    /// Range bounds
    pub fn bounds(&self) -> (u16, u16) {
        match *self {
            Self::Single(p) => (p, p),
            Self::Range { from, to } => (from, to),
        }
    }
}

impl std::fmt::Display for PortMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(p) => write!(f, "{}", p),
            Self::Range { from, to } => write!(f, "{}-{}", from, to),
        }
    }
}

/// Fields extracted by a complete header walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketFields {
    /// Network-layer source
    pub src_addr: IpAddr,
    /// Network-layer destination
    pub dst_addr: IpAddr,
    /// Transport protocol
    pub protocol: Transport,
    /// Source port (host order)
    pub src_port: u16,
    /// Destination port (host order)
    pub dst_port: u16,
}

/// Single rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Rule name, unique within a policy
    pub name: String,
    /// Transport protocol the rule applies to
    pub protocol: Transport,
    /// Destination port (None = any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<PortMatch>,
    /// Source port (None = any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_port: Option<PortMatch>,
    /// Source prefix (None = any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_net: Option<IpNetwork>,
    /// Destination prefix (None = any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_net: Option<IpNetwork>,
    /// Verdict on match
    pub verdict: Verdict,
}

impl Rule {
    /// Rule matching every packet of `protocol`
    pub fn new(name: impl Into<String>, protocol: Transport, verdict: Verdict) -> Self {
        Self {
            name: name.into(),
            protocol,
            dst_port: None,
            src_port: None,
            src_net: None,
            dst_net: None,
            verdict,
        }
    }

    /// Restrict destination port
    pub fn dst_port(mut self, port: PortMatch) -> Self {
        self.dst_port = Some(port);
        self
    }

    /// Restrict source port
    pub fn src_port(mut self, port: PortMatch) -> Self {
        self.src_port = Some(port);
        self
    }

    /// Restrict source prefix
    pub fn src_net(mut self, net: IpNetwork) -> Self {
        self.src_net = Some(net);
        self
    }

    /// Restrict destination prefix
    pub fn dst_net(mut self, net: IpNetwork) -> Self {
        self.dst_net = Some(net);
        self
    }

    /// Match against extracted fields
    #[inline]
    pub fn matches(&self, fields: &PacketFields) -> bool {
        if self.protocol != fields.protocol {
            return false;
        }

        if let Some(port) = self.dst_port {
            if !port.contains(fields.dst_port) {
                return false;
            }
        }

        if let Some(port) = self.src_port {
            if !port.contains(fields.src_port) {
                return false;
            }
        }

        if let Some(net) = self.src_net {
            if !net.contains(fields.src_addr) {
                return false;
            }
        }

        if let Some(net) = self.dst_net {
            if !net.contains(fields.dst_addr) {
                return false;
            }
        }

        true
    }
}

/// Ordered, immutable rule table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
    tcp: bool,
    udp: bool,
}

impl RuleSet {
    /// Build from rules in evaluation order
    pub fn new(rules: Vec<Rule>) -> Self {
        let tcp = rules.iter().any(|r| r.protocol == Transport::Tcp);
        let udp = rules.iter().any(|r| r.protocol == Transport::Udp);
        Self { rules, tcp, udp }
    }

    /// Empty set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether any rule looks at `protocol`.
    ///
    /// Transport headers of untracked protocols are never read.
    #[inline(always)]
    pub fn tracks(&self, protocol: Transport) -> bool {
        match protocol {
            Transport::Tcp => self.tcp,
            Transport::Udp => self.udp,
        }
    }

    /// First matching rule and its index
    #[inline]
    pub fn first_match(&self, fields: &PacketFields) -> Option<(usize, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(fields))
    }

    /// Rule at `index`
    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Iterate in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}
