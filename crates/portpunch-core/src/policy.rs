//! Decision Engine
//!
//! Walks link -> network -> transport through the [`Cursor`] and reduces the
//! extracted fields to one [`Verdict`].
//!
//! ```text
//! AtLink ──eth ok──► AtNetwork ──ip ok, tracked──► AtTransport ──ports──► rules
//!   │                   │                             │                     │
//!   └── short ──────────┴── short/malformed/untracked ┴── short ──► Decided ◄┘
//! ```
//!
//! Each state is left at most once, so a call does at most three header reads
//! and one scan of the rule table. Every input, including an empty buffer,
//! ends in `Decided`.

use crate::cursor::Cursor;
use crate::headers::{
    EthernetHeader, Ipv4Header, Ipv6Header, TcpHeader, Transport, UdpHeader, ETHERTYPE_IPV4,
    ETHERTYPE_IPV6,
};
use crate::rules::{PacketFields, PortMatch, Rule, RuleSet};
use crate::verdict::Verdict;
use std::net::IpAddr;
use tracing::trace;

/// Header layer reached by the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Ethernet
    Link,
    /// IPv4 / IPv6
    Network,
    /// TCP / UDP
    Transport,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Link => "link",
            Self::Network => "network",
            Self::Transport => "transport",
        })
    }
}

/// Why a verdict was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// Buffer ended inside a header of this layer
    Truncated(Layer),
    /// EtherType is not IPv4 or IPv6
    UnsupportedLink(u16),
    /// Network header present but inconsistent (version, IHL)
    MalformedNetwork,
    /// Non-first IPv4 fragment, no transport header follows
    Fragment,
    /// Upper-layer protocol not referenced by any rule
    Untracked(u8),
    /// Rule at this index matched
    RuleMatch(usize),
    /// Full walk, no rule matched
    NoMatch,
}

impl Reason {
    /// Whether the default verdict was applied
    pub fn is_default(&self) -> bool {
        !matches!(self, Self::RuleMatch(_))
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated(layer) => write!(f, "truncated {} header", layer),
            Self::UnsupportedLink(ether_type) => write!(f, "unsupported ethertype 0x{:04x}", ether_type),
            Self::MalformedNetwork => f.write_str("malformed network header"),
            Self::Fragment => f.write_str("non-first fragment"),
            Self::Untracked(proto) => write!(f, "untracked protocol {}", proto),
            Self::RuleMatch(index) => write!(f, "rule #{}", index),
            Self::NoMatch => f.write_str("no rule matched"),
        }
    }
}

/// Verdict plus the reason behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Action for the host
    pub verdict: Verdict,
    /// How it was reached
    pub reason: Reason,
}

/// Network layer output handed to the transport step
struct Network<'a> {
    src: IpAddr,
    dst: IpAddr,
    protocol: u8,
    next: Cursor<'a>,
}

/// Immutable classification policy: rule table plus default verdict.
///
/// The default verdict applies to every inconclusive outcome: truncated or
/// unparsable frames, protocols no rule tracks, and fully parsed packets that
/// match no rule. `Pass` is fail-open, `Drop` is fail-closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    rules: RuleSet,
    default_verdict: Verdict,
}

impl Policy {
    /// Create policy
    pub fn new(rules: RuleSet, default_verdict: Verdict) -> Self {
        Self {
            rules,
            default_verdict,
        }
    }

    /// Let everything through
    pub fn pass_all() -> Self {
        Self::new(RuleSet::empty(), Verdict::Pass)
    }

    /// Allow TCP only to `port`; non-TCP and unparsable traffic passes
    pub fn port_punch(port: u16) -> Self {
        Self::new(
            RuleSet::new(vec![
                Rule::new(format!("allow-tcp-{}", port), Transport::Tcp, Verdict::Pass)
                    .dst_port(PortMatch::Single(port)),
                Rule::new("deny-tcp", Transport::Tcp, Verdict::Drop),
            ]),
            Verdict::Pass,
        )
    }

    /// Same rules, different default
    pub fn with_default_verdict(mut self, verdict: Verdict) -> Self {
        self.default_verdict = verdict;
        self
    }

    /// Rule table
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Verdict for inconclusive classification
    pub fn default_verdict(&self) -> Verdict {
        self.default_verdict
    }

    /// Classify one frame
    #[inline]
    pub fn classify(&self, packet: &[u8]) -> Verdict {
        self.decide(packet).verdict
    }

    /// Classify one frame and report why
    pub fn decide(&self, packet: &[u8]) -> Decision {
        let decision = match self.walk(packet) {
            Ok((index, verdict)) => Decision {
                verdict,
                reason: Reason::RuleMatch(index),
            },
            Err(reason) => Decision {
                verdict: self.default_verdict,
                reason,
            },
        };

        trace!(
            len = packet.len(),
            verdict = %decision.verdict,
            reason = %decision.reason,
            "packet classified"
        );
        decision
    }

    /// Header walk. `Err` carries the reason the default verdict applies.
    #[inline]
    fn walk(&self, packet: &[u8]) -> Result<(usize, Verdict), Reason> {
        let (eth, cursor) = Cursor::new(packet)
            .read::<EthernetHeader>()
            .ok_or(Reason::Truncated(Layer::Link))?;

        let network = match eth.ether_type() {
            ETHERTYPE_IPV4 => read_ipv4(cursor)?,
            ETHERTYPE_IPV6 => read_ipv6(cursor)?,
            other => return Err(Reason::UnsupportedLink(other)),
        };

        let protocol = Transport::from_ip_proto(network.protocol)
            .filter(|p| self.rules.tracks(*p))
            .ok_or(Reason::Untracked(network.protocol))?;

        let (src_port, dst_port) = match protocol {
            Transport::Tcp => network
                .next
                .read::<TcpHeader>()
                .map(|(tcp, _)| (tcp.src_port(), tcp.dst_port())),
            Transport::Udp => network
                .next
                .read::<UdpHeader>()
                .map(|(udp, _)| (udp.src_port(), udp.dst_port())),
        }
        .ok_or(Reason::Truncated(Layer::Transport))?;

        let fields = PacketFields {
            src_addr: network.src,
            dst_addr: network.dst,
            protocol,
            src_port,
            dst_port,
        };

        self.rules
            .first_match(&fields)
            .map(|(index, rule)| (index, rule.verdict))
            .ok_or(Reason::NoMatch)
    }
}

#[inline(always)]
fn read_ipv4(cursor: Cursor<'_>) -> Result<Network<'_>, Reason> {
    let (ip, cursor) = cursor
        .read::<Ipv4Header>()
        .ok_or(Reason::Truncated(Layer::Network))?;
    if ip.version() != 4 {
        return Err(Reason::MalformedNetwork);
    }
    let options = ip.options_len().ok_or(Reason::MalformedNetwork)?;
    if ip.fragment_offset() != 0 {
        return Err(Reason::Fragment);
    }
    let next = cursor
        .skip(options)
        .ok_or(Reason::Truncated(Layer::Network))?;

    Ok(Network {
        src: IpAddr::V4(ip.src()),
        dst: IpAddr::V4(ip.dst()),
        protocol: ip.protocol(),
        next,
    })
}

#[inline(always)]
fn read_ipv6(cursor: Cursor<'_>) -> Result<Network<'_>, Reason> {
    let (ip, next) = cursor
        .read::<Ipv6Header>()
        .ok_or(Reason::Truncated(Layer::Network))?;
    if ip.version() != 6 {
        return Err(Reason::MalformedNetwork);
    }

    Ok(Network {
        src: IpAddr::V6(ip.src()),
        dst: IpAddr::V6(ip.dst()),
        protocol: ip.next_header(),
        next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{IPPROTO_TCP, IPPROTO_UDP};

    const ICMP: u8 = 1;

    fn ipv4_frame(proto: u8, dst_port: u16) -> Vec<u8> {
        let mut p = vec![0u8; 14 + 20 + 20];
        // Ethernet
        p[12] = 0x08;
        p[13] = 0x00;
        // IPv4
        p[14] = 0x45;
        p[22] = 64;
        p[23] = proto;
        p[26..30].copy_from_slice(&[192, 168, 1, 1]);
        p[30..34].copy_from_slice(&[10, 0, 0, 1]);
        // Transport ports
        p[34..36].copy_from_slice(&12345u16.to_be_bytes());
        p[36..38].copy_from_slice(&dst_port.to_be_bytes());
        if proto == IPPROTO_UDP {
            p.truncate(14 + 20 + 8);
        }
        p
    }

    fn ipv6_tcp_frame(dst_port: u16) -> Vec<u8> {
        let mut p = vec![0u8; 14 + 40 + 20];
        p[12] = 0x86;
        p[13] = 0xDD;
        p[14] = 0x60;
        p[20] = IPPROTO_TCP;
        p[21] = 64;
        p[37] = 1; // src ::1
        p[53] = 2; // dst ::2
        p[54..56].copy_from_slice(&50000u16.to_be_bytes());
        p[56..58].copy_from_slice(&dst_port.to_be_bytes());
        p
    }

    #[test]
    fn test_empty_buffer_gets_default() {
        let policy = Policy::port_punch(22);
        let decision = policy.decide(&[]);
        assert_eq!(decision.verdict, Verdict::Pass);
        assert_eq!(decision.reason, Reason::Truncated(Layer::Link));
    }

    #[test]
    fn test_shorter_than_link_header() {
        let policy = Policy::port_punch(22);
        for len in 0..14 {
            let buf = vec![0u8; len];
            assert_eq!(policy.decide(&buf).reason, Reason::Truncated(Layer::Link));
            assert_eq!(policy.classify(&buf), Verdict::Pass);
        }
    }

    #[test]
    fn test_ssh_passes() {
        let policy = Policy::port_punch(22);
        let decision = policy.decide(&ipv4_frame(IPPROTO_TCP, 22));
        assert_eq!(decision.verdict, Verdict::Pass);
        assert_eq!(decision.reason, Reason::RuleMatch(0));
    }

    #[test]
    fn test_http_dropped() {
        let policy = Policy::port_punch(22);
        let decision = policy.decide(&ipv4_frame(IPPROTO_TCP, 80));
        assert_eq!(decision.verdict, Verdict::Drop);
        assert_eq!(decision.reason, Reason::RuleMatch(1));
    }

    #[test]
    fn test_udp_gets_default() {
        let policy = Policy::port_punch(22);
        for port in [22, 53, 80] {
            let decision = policy.decide(&ipv4_frame(IPPROTO_UDP, port));
            assert_eq!(decision.verdict, Verdict::Pass);
            assert_eq!(decision.reason, Reason::Untracked(IPPROTO_UDP));
        }
    }

    #[test]
    fn test_non_transport_protocol_gets_default() {
        let policy = Policy::port_punch(22).with_default_verdict(Verdict::Drop);
        let decision = policy.decide(&ipv4_frame(ICMP, 22));
        assert_eq!(decision.verdict, Verdict::Drop);
        assert_eq!(decision.reason, Reason::Untracked(ICMP));
    }

    #[test]
    fn test_missing_transport_header() {
        let policy = Policy::port_punch(22);
        let mut frame = ipv4_frame(IPPROTO_TCP, 80);
        frame.truncate(14 + 20);
        let decision = policy.decide(&frame);
        assert_eq!(decision.verdict, Verdict::Pass);
        assert_eq!(decision.reason, Reason::Truncated(Layer::Transport));

        // One byte short of a full TCP header
        let mut frame = ipv4_frame(IPPROTO_TCP, 80);
        frame.pop();
        assert_eq!(policy.decide(&frame).reason, Reason::Truncated(Layer::Transport));
    }

    #[test]
    fn test_missing_network_header() {
        let policy = Policy::port_punch(22);
        let mut frame = ipv4_frame(IPPROTO_TCP, 80);
        frame.truncate(14 + 19);
        assert_eq!(policy.decide(&frame).reason, Reason::Truncated(Layer::Network));
    }

    #[test]
    fn test_fail_closed_default() {
        let policy = Policy::port_punch(22).with_default_verdict(Verdict::Drop);
        assert_eq!(policy.classify(&[]), Verdict::Drop);

        let mut frame = ipv4_frame(IPPROTO_TCP, 22);
        frame.truncate(20);
        assert_eq!(policy.classify(&frame), Verdict::Drop);

        // Rule verdicts are unaffected by the default
        assert_eq!(policy.classify(&ipv4_frame(IPPROTO_TCP, 22)), Verdict::Pass);
    }

    #[test]
    fn test_port_byte_order() {
        let policy = Policy::port_punch(22);

        // 22 stored big-endian: 0x00 0x16
        let frame = ipv4_frame(IPPROTO_TCP, 22);
        assert_eq!(&frame[36..38], &[0x00, 0x16]);
        assert_eq!(policy.classify(&frame), Verdict::Pass);

        // Same bytes swapped read as 0x1600 = 5632
        let mut swapped = frame.clone();
        swapped[36] = 0x16;
        swapped[37] = 0x00;
        assert_eq!(policy.classify(&swapped), Verdict::Drop);
    }

    #[test]
    fn test_unsupported_ethertype() {
        let policy = Policy::port_punch(22);
        let mut frame = ipv4_frame(IPPROTO_TCP, 80);
        frame[12] = 0x08;
        frame[13] = 0x06; // ARP
        let decision = policy.decide(&frame);
        assert_eq!(decision.verdict, Verdict::Pass);
        assert_eq!(decision.reason, Reason::UnsupportedLink(0x0806));
    }

    #[test]
    fn test_ipv4_options_skipped() {
        let policy = Policy::port_punch(22);

        // IHL 6: four option bytes between IPv4 and TCP
        let mut frame = ipv4_frame(IPPROTO_TCP, 22);
        frame[14] = 0x46;
        frame.splice(34..34, [0x01, 0x01, 0x01, 0x00]);
        assert_eq!(policy.decide(&frame).reason, Reason::RuleMatch(0));

        // Options cut short
        frame.truncate(14 + 22);
        assert_eq!(policy.decide(&frame).reason, Reason::Truncated(Layer::Network));
    }

    #[test]
    fn test_malformed_ipv4() {
        let policy = Policy::port_punch(22);

        let mut frame = ipv4_frame(IPPROTO_TCP, 80);
        frame[14] = 0x44; // IHL below minimum
        assert_eq!(policy.decide(&frame).reason, Reason::MalformedNetwork);

        let mut frame = ipv4_frame(IPPROTO_TCP, 80);
        frame[14] = 0x65; // version 6 under IPv4 ethertype
        assert_eq!(policy.decide(&frame).reason, Reason::MalformedNetwork);
        assert_eq!(policy.classify(&frame), Verdict::Pass);
    }

    #[test]
    fn test_later_fragment_gets_default() {
        let policy = Policy::port_punch(22);

        // Offset 185 with MF set; payload bytes sit where the ports would be
        let mut frame = ipv4_frame(IPPROTO_TCP, 0x1234);
        frame[20] = 0x20;
        frame[21] = 0xb9;
        let decision = policy.decide(&frame);
        assert_eq!(decision.verdict, Verdict::Pass);
        assert_eq!(decision.reason, Reason::Fragment);

        let closed = policy.with_default_verdict(Verdict::Drop);
        assert_eq!(closed.decide(&frame).reason, Reason::Fragment);
        assert_eq!(closed.classify(&frame), Verdict::Drop);
    }

    #[test]
    fn test_first_fragment_is_classified() {
        let policy = Policy::port_punch(22);

        // MF set, offset 0: transport header is present
        let mut frame = ipv4_frame(IPPROTO_TCP, 22);
        frame[20] = 0x20;
        assert_eq!(policy.decide(&frame).reason, Reason::RuleMatch(0));

        let mut frame = ipv4_frame(IPPROTO_TCP, 80);
        frame[20] = 0x20;
        assert_eq!(policy.decide(&frame).reason, Reason::RuleMatch(1));
    }

    #[test]
    fn test_ipv6_tcp() {
        let policy = Policy::port_punch(22);
        assert_eq!(policy.classify(&ipv6_tcp_frame(22)), Verdict::Pass);
        assert_eq!(policy.classify(&ipv6_tcp_frame(443)), Verdict::Drop);

        let mut short = ipv6_tcp_frame(22);
        short.truncate(14 + 39);
        assert_eq!(policy.decide(&short).reason, Reason::Truncated(Layer::Network));
    }

    #[test]
    fn test_address_predicates() {
        let policy = Policy::new(
            RuleSet::new(vec![
                Rule::new("lan-ssh", Transport::Tcp, Verdict::Pass)
                    .dst_port(PortMatch::Single(22))
                    .src_net("192.168.1.0/24".parse().unwrap()),
                Rule::new("v6-web", Transport::Tcp, Verdict::Redirect)
                    .dst_net("::/64".parse().unwrap()),
            ]),
            Verdict::Drop,
        );

        assert_eq!(policy.decide(&ipv4_frame(IPPROTO_TCP, 22)).reason, Reason::RuleMatch(0));
        assert_eq!(policy.classify(&ipv6_tcp_frame(22)), Verdict::Redirect);

        let decision = policy.decide(&ipv4_frame(IPPROTO_TCP, 80));
        assert_eq!(decision.verdict, Verdict::Drop);
        assert_eq!(decision.reason, Reason::NoMatch);
    }

    #[test]
    fn test_pass_all() {
        let policy = Policy::pass_all();
        assert!(policy.rules().is_empty());
        assert_eq!(policy.classify(&[]), Verdict::Pass);
        assert_eq!(policy.classify(&ipv4_frame(IPPROTO_TCP, 80)), Verdict::Pass);
        assert_eq!(
            policy.decide(&ipv4_frame(IPPROTO_TCP, 80)).reason,
            Reason::Untracked(IPPROTO_TCP)
        );
    }

    #[test]
    fn test_idempotent() {
        let policy = Policy::port_punch(22);
        let frame = ipv4_frame(IPPROTO_TCP, 80);
        assert_eq!(policy.decide(&frame), policy.decide(&frame));
        assert_eq!(frame, ipv4_frame(IPPROTO_TCP, 80));
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(Reason::Truncated(Layer::Transport).to_string(), "truncated transport header");
        assert_eq!(Reason::UnsupportedLink(0x0806).to_string(), "unsupported ethertype 0x0806");
        assert_eq!(Reason::RuleMatch(3).to_string(), "rule #3");
        assert_eq!(Reason::Fragment.to_string(), "non-first fragment");
        assert!(Reason::Fragment.is_default());
        assert!(Reason::NoMatch.is_default());
        assert!(!Reason::RuleMatch(0).is_default());
    }
}
