//! Chat message model and the delivery seam between the pipeline and
//! whatever renders the conversation.

use chrono::{DateTime, Local};

/// Callsign shown for pipeline status notices.
pub const SYSTEM_CALLSIGN: &str = "***";

/// Who a rendered line is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sent by the local operator.
    Me,
    /// Decoded off the air.
    Them,
    /// Pipeline status notice.
    System,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub callsign: String,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn incoming(callsign: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Them,
            callsign: callsign.into(),
            text: text.into(),
            timestamp: Local::now(),
        }
    }

    pub fn outgoing(callsign: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Me,
            callsign: callsign.into(),
            text: text.into(),
            timestamp: Local::now(),
        }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            callsign: SYSTEM_CALLSIGN.to_string(),
            text: text.into(),
            timestamp: Local::now(),
        }
    }
}

/// Where decoded and locally echoed messages end up.
///
/// The terminal renderer implements this in the binary; tests record
/// into a buffer instead.
pub trait MessageSink: Send {
    fn deliver(&mut self, message: ChatMessage);
}
