//! Verdict vocabulary shared with the host

use serde::{Deserialize, Serialize};

/// Terminal action for one packet.
///
/// Discriminants are the host action codes (`XDP_ABORTED` .. `XDP_REDIRECT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum Verdict {
    /// Processing error, packet discarded with a trace event on the host
    Abort = 0,
    /// Discard
    Drop = 1,
    /// Continue up the stack
    Pass = 2,
    /// Bounce out of the receiving interface
    Transmit = 3,
    /// Forward to another interface or socket
    Redirect = 4,
}

impl Default for Verdict {
    fn default() -> Self {
        Self::Pass
    }
}

impl Verdict {
    /// Every verdict, in action-code order
    pub const ALL: [Verdict; 5] = [
        Verdict::Abort,
        Verdict::Drop,
        Verdict::Pass,
        Verdict::Transmit,
        Verdict::Redirect,
    ];

    /// Action code the host understands
    #[inline(always)]
    pub const fn action_code(self) -> u32 {
        self as u32
    }

    /// Inverse of [`Verdict::action_code`]
    pub const fn from_action_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Abort),
            1 => Some(Self::Drop),
            2 => Some(Self::Pass),
            3 => Some(Self::Transmit),
            4 => Some(Self::Redirect),
            _ => None,
        }
    }

    /// Lowercase name, as used in policy files
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Drop => "drop",
            Self::Pass => "pass",
            Self::Transmit => "transmit",
            Self::Redirect => "redirect",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}
