use crate::config::ButtonLabels;
use std::fmt;

/// Relationship state inferred from a profile's primary action label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    /// Already connected; a message can be written
    Message,

    /// A connection request can be sent directly
    Connect,

    /// Connecting is only offered through the overflow menu
    Follow,

    Unknown,
}

impl Affordance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Connect => "connect",
            Self::Follow => "follow",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Affordance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a visible button label onto an [`Affordance`]
///
/// Surrounding whitespace is ignored; otherwise the label must equal one
/// of the configured texts exactly.
pub fn classify_affordance(label: &str, labels: &ButtonLabels) -> Affordance {
    let label = label.trim();
    if label.is_empty() {
        Affordance::Unknown
    } else if label == labels.message.trim() {
        Affordance::Message
    } else if label == labels.connect.trim() {
        Affordance::Connect
    } else if label == labels.follow.trim() {
        Affordance::Follow
    } else {
        Affordance::Unknown
    }
}
