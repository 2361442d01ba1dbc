//! Interaction triggers.
//!
//! A bar host relays clicks on a segment to the owning applet process as
//! POSIX signals. Exactly two triggers exist; the OS signal numbers are
//! isolated behind the one mapping in this module.

use std::fmt;
use tokio::signal::unix::SignalKind;

/// Interaction source for a bar segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Conventionally a left click, delivered as SIGUSR1.
    Primary,
    /// Conventionally a right click, delivered as SIGUSR2.
    Secondary,
}

impl Trigger {
    /// The OS signal that carries this trigger.
    pub(crate) fn signal_kind(self) -> SignalKind {
        match self {
            Trigger::Primary => SignalKind::user_defined1(),
            Trigger::Secondary => SignalKind::user_defined2(),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Primary => write!(f, "primary"),
            Trigger::Secondary => write!(f, "secondary"),
        }
    }
}
