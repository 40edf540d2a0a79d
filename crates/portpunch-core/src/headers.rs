//! Protocol header views
//!
//! Fixed-size views over link, network and transport headers. Multi-byte
//! fields are stored big-endian on the wire and converted to host order by
//! the accessors.

use crate::cursor::{sealed::Sealed, Checked, Header};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

/// EtherType for IPv4
pub const ETHERTYPE_IPV4: u16 = 0x0800;
/// EtherType for IPv6
pub const ETHERTYPE_IPV6: u16 = 0x86DD;

/// IP protocol number for TCP
pub const IPPROTO_TCP: u8 = 6;
/// IP protocol number for UDP
pub const IPPROTO_UDP: u8 = 17;

/// Transport protocols that carry ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Connection-oriented
    Tcp,
    /// Datagram
    Udp,
}

impl Transport {
    /// Map an IP protocol number
    #[inline(always)]
    pub const fn from_ip_proto(proto: u8) -> Option<Self> {
        match proto {
            IPPROTO_TCP => Some(Self::Tcp),
            IPPROTO_UDP => Some(Self::Udp),
            _ => None,
        }
    }

    /// IP protocol number
    #[inline(always)]
    pub const fn ip_proto(self) -> u8 {
        match self {
            Self::Tcp => IPPROTO_TCP,
            Self::Udp => IPPROTO_UDP,
        }
    }

    /// Lowercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// Link layer
// ============================================================================

/// Ethernet II header (14 bytes)
#[derive(Debug, Clone, Copy)]
pub struct EthernetHeader<'a> {
    raw: Checked<'a>,
}

impl Sealed for EthernetHeader<'_> {}

impl<'a> Header<'a> for EthernetHeader<'a> {
    const LEN: usize = 14;

    #[inline(always)]
    fn from_checked(raw: Checked<'a>) -> Self {
        Self { raw }
    }
}

impl EthernetHeader<'_> {
    /// Encapsulated protocol
    #[inline(always)]
    pub fn ether_type(&self) -> u16 {
        self.raw.be_u16_at(12)
    }
}

// ============================================================================
// Network layer
// ============================================================================

/// IPv4 header, fixed part (20 bytes)
#[derive(Debug, Clone, Copy)]
pub struct Ipv4Header<'a> {
    raw: Checked<'a>,
}

impl Sealed for Ipv4Header<'_> {}

impl<'a> Header<'a> for Ipv4Header<'a> {
    const LEN: usize = 20;

    #[inline(always)]
    fn from_checked(raw: Checked<'a>) -> Self {
        Self { raw }
    }
}

impl Ipv4Header<'_> {
    /// Version nibble (4 for a valid header)
    #[inline(always)]
    pub fn version(&self) -> u8 {
        self.raw.u8_at(0) >> 4
    }

    /// Header length in 32-bit words
    #[inline(always)]
    pub fn ihl(&self) -> u8 {
        self.raw.u8_at(0) & 0x0F
    }

    /// Header length in bytes, options included
    #[inline(always)]
    pub fn header_len(&self) -> usize {
        self.ihl() as usize * 4
    }

    /// Bytes of options following the fixed part, `None` if IHL < 5
    #[inline(always)]
    pub fn options_len(&self) -> Option<usize> {
        self.header_len().checked_sub(Self::LEN)
    }

    /// Fragment offset in 8-byte units, zero for unfragmented and first fragments
    #[inline(always)]
    pub fn fragment_offset(&self) -> u16 {
        self.raw.be_u16_at(6) & 0x1FFF
    }

    /// Upper-layer protocol number
    #[inline(always)]
    pub fn protocol(&self) -> u8 {
        self.raw.u8_at(9)
    }

    /// Source address
    #[inline(always)]
    pub fn src(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.raw.array_at::<4>(12))
    }

    /// Destination address
    #[inline(always)]
    pub fn dst(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.raw.array_at::<4>(16))
    }
}

/// IPv6 header (40 bytes)
#[derive(Debug, Clone, Copy)]
pub struct Ipv6Header<'a> {
    raw: Checked<'a>,
}

impl Sealed for Ipv6Header<'_> {}

impl<'a> Header<'a> for Ipv6Header<'a> {
    const LEN: usize = 40;

    #[inline(always)]
    fn from_checked(raw: Checked<'a>) -> Self {
        Self { raw }
    }
}

impl Ipv6Header<'_> {
    /// Version nibble (6 for a valid header)
    #[inline(always)]
    pub fn version(&self) -> u8 {
        self.raw.u8_at(0) >> 4
    }

    /// Next header (upper-layer protocol number when no extension follows)
    #[inline(always)]
    pub fn next_header(&self) -> u8 {
        self.raw.u8_at(6)
    }

    /// Source address
    #[inline(always)]
    pub fn src(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.raw.array_at::<16>(8))
    }

    /// Destination address
    #[inline(always)]
    pub fn dst(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.raw.array_at::<16>(24))
    }
}

// ============================================================================
// Transport layer
// ============================================================================

/// TCP header, fixed part (20 bytes)
#[derive(Debug, Clone, Copy)]
pub struct TcpHeader<'a> {
    raw: Checked<'a>,
}

impl Sealed for TcpHeader<'_> {}

impl<'a> Header<'a> for TcpHeader<'a> {
    const LEN: usize = 20;

    #[inline(always)]
    fn from_checked(raw: Checked<'a>) -> Self {
        Self { raw }
    }
}

impl TcpHeader<'_> {
    /// Source port
    #[inline(always)]
    pub fn src_port(&self) -> u16 {
        self.raw.be_u16_at(0)
    }

    /// Destination port
    #[inline(always)]
    pub fn dst_port(&self) -> u16 {
        self.raw.be_u16_at(2)
    }
}

/// UDP header (8 bytes)
#[derive(Debug, Clone, Copy)]
pub struct UdpHeader<'a> {
    raw: Checked<'a>,
}

impl Sealed for UdpHeader<'_> {}

impl<'a> Header<'a> for UdpHeader<'a> {
    const LEN: usize = 8;

    #[inline(always)]
    fn from_checked(raw: Checked<'a>) -> Self {
        Self { raw }
    }
}

impl UdpHeader<'_> {
    /// Source port
    #[inline(always)]
    pub fn src_port(&self) -> u16 {
        self.raw.be_u16_at(0)
    }

    /// Destination port
    #[inline(always)]
    pub fn dst_port(&self) -> u16 {
        self.raw.be_u16_at(2)
    }
}
