//! Conversation channels shared between the shell and its collaborators.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Conversation classification, distinguishing one-to-one chats from
/// multi-party rooms. The discriminants are the values published to
/// external observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ChatType {
    /// One-to-one conversation.
    PeerToPeer = 0,
    /// Multi-party room.
    Room = 2,
}

impl From<ChatType> for u32 {
    fn from(value: ChatType) -> Self {
        value as u32
    }
}

/// One conversation between a local account and a remote party.
///
/// Channels are handed out as `Arc`s by the [`GroupManager`]; the shell
/// keeps non-owning clones and compares them by pointer identity.
///
/// [`GroupManager`]: crate::GroupManager
#[derive(Debug)]
pub struct ConversationChannel {
    local_uid: String,
    remote_uid: String,
    contact_id: u32,
    chat_type: ChatType,
    /// Unix timestamp in milliseconds of the last activity.
    last_activity_ms: AtomicI64,
}

impl ConversationChannel {
    pub(crate) fn new(local_uid: String, remote_uid: String, contact_id: u32) -> Self {
        Self {
            local_uid,
            remote_uid,
            contact_id,
            chat_type: ChatType::PeerToPeer,
            last_activity_ms: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    /// The local account uid this conversation belongs to.
    pub fn local_uid(&self) -> &str {
        &self.local_uid
    }

    /// The canonicalized remote party uid.
    pub fn remote_uid(&self) -> &str {
        &self.remote_uid
    }

    /// Resolved numeric contact id of the remote party.
    pub fn contact_id(&self) -> u32 {
        self.contact_id
    }

    pub fn chat_type(&self) -> ChatType {
        self.chat_type
    }

    /// Unix timestamp in milliseconds of the last recorded activity.
    pub fn last_activity_ms(&self) -> i64 {
        self.last_activity_ms.load(Ordering::Relaxed)
    }

    /// Record activity now. Called when the conversation is brought on
    /// screen; the groups list orders by this.
    pub fn touch(&self) {
        self.last_activity_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_type_wire_values() {
        assert_eq!(u32::from(ChatType::PeerToPeer), 0);
        assert_eq!(u32::from(ChatType::Room), 2);
    }

    #[test]
    fn test_touch_advances_activity() {
        let channel = ConversationChannel::new("acct".into(), "5551234567".into(), 1);
        let created = channel.last_activity_ms();

        channel
            .last_activity_ms
            .store(created - 1000, Ordering::Relaxed);
        channel.touch();

        assert!(channel.last_activity_ms() >= created);
    }
}
