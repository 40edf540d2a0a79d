//! portpunch - Inline Packet Classifier
//!
//! Pure, allocation-free verdict engine for a fast ingress path. The host hands
//! over one raw frame at a time and enforces whatever [`Verdict`] comes back.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        classify(&[u8])                       │
//! │                                                              │
//! │  ┌──────────┐   ok   ┌───────────┐   ok   ┌─────────────┐    │
//! │  │ Ethernet │──────►│ IPv4/IPv6 │──────►│  TCP / UDP  │    │
//! │  │ (14 B)   │       │ (20/40 B) │       │  (20/8 B)   │    │
//! │  └────┬─────┘       └─────┬─────┘       └──────┬──────┘    │
//! │       │ short             │ short/untracked    │ ports     │
//! │       ▼                   ▼                    ▼           │
//! │   [DEFAULT]           [DEFAULT]         Rule Set (first    │
//! │                                         match) / DEFAULT   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every header is obtained through [`Cursor::read`], the single bounds check
//! of the crate. A header view cannot be built any other way.
//!
//! # Example
//!
//! ```
//! use portpunch_core::{Policy, Verdict};
//!
//! let policy = Policy::port_punch(22);
//! assert_eq!(policy.classify(&[]), Verdict::Pass);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod cursor;
pub mod error;
pub mod headers;
pub mod policy;
pub mod rules;
pub mod stats;
pub mod store;
pub mod verdict;

pub use config::{load_policy, PolicyConfig};
pub use cursor::{Checked, Cursor, Header};
pub use error::{PolicyError, PolicyResult};
pub use headers::{EthernetHeader, Ipv4Header, Ipv6Header, TcpHeader, Transport, UdpHeader};
pub use policy::{Decision, Layer, Policy, Reason};
pub use rules::{PacketFields, PortMatch, Rule, RuleSet};
pub use stats::{StatsSnapshot, VerdictStats};
pub use store::PolicyStore;
pub use verdict::Verdict;

/// Port opened by the stock port-punch policy (SSH)
pub const DEFAULT_PUNCH_PORT: u16 = 22;
