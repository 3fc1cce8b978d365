//! Conversation group management for the Nemo messages shell.
//!
//! The shell asks for a channel per (local account, remote party) pair;
//! channels are created on first use and reused for the lifetime of the
//! process. The [`GroupModel`] exposes the known channels to UI layers,
//! ordered by recency.

pub mod channel;
pub mod contacts;

pub use channel::{ChatType, ConversationChannel};
pub use contacts::{canonicalize_address, is_address_valid, ContactRegistry};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Failure to resolve a conversation for an identity pair.
#[derive(Debug, Error)]
pub enum GroupError {
    /// The local account uid was empty.
    #[error("local uid is empty")]
    EmptyLocalUid,
    /// The remote uid is neither a usable phone number nor an IM uid.
    #[error("invalid remote uid {0:?}")]
    InvalidRemoteUid(String),
}

/// Get-or-create store of conversation channels.
///
/// Channels are keyed by (local uid, canonicalized remote uid), so a
/// conversation requested under different address formatting resolves to
/// the same channel instance.
#[derive(Default)]
pub struct GroupManager {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    channels: HashMap<(String, String), Arc<ConversationChannel>>,
    contacts: ContactRegistry,
}

impl GroupManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel for the given identity pair, created on first use.
    ///
    /// Repeated calls with the same pair (under any formatting of the
    /// remote uid) return the same `Arc`.
    pub fn get_conversation(
        &self,
        local_uid: &str,
        remote_uid: &str,
    ) -> Result<Arc<ConversationChannel>, GroupError> {
        if local_uid.is_empty() {
            return Err(GroupError::EmptyLocalUid);
        }
        if !is_address_valid(remote_uid) {
            return Err(GroupError::InvalidRemoteUid(remote_uid.to_owned()));
        }

        let key = (local_uid.to_owned(), canonicalize_address(remote_uid));
        let mut inner = self.lock();
        if let Some(existing) = inner.channels.get(&key) {
            return Ok(Arc::clone(existing));
        }

        let contact_id = inner.contacts.resolve_or_assign(remote_uid);
        let channel = Arc::new(ConversationChannel::new(
            key.0.clone(),
            key.1.clone(),
            contact_id,
        ));
        tracing::debug!(local_uid, remote_uid, contact_id, "created conversation channel");
        inner.channels.insert(key, Arc::clone(&channel));
        Ok(channel)
    }

    /// Data model over this manager's channels, for injection into a UI
    /// evaluation context.
    pub fn model(self: &Arc<Self>) -> GroupModel {
        GroupModel {
            manager: Arc::clone(self),
        }
    }

    /// All known channels, most recently active first.
    pub fn groups(&self) -> Vec<Arc<ConversationChannel>> {
        let inner = self.lock();
        let mut groups: Vec<_> = inner.channels.values().cloned().collect();
        groups.sort_by(|a, b| b.last_activity_ms().cmp(&a.last_activity_ms()));
        groups
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live, ordered view over a [`GroupManager`]'s channels.
#[derive(Clone)]
pub struct GroupModel {
    manager: Arc<GroupManager>,
}

impl GroupModel {
    /// Channels ordered most recently active first.
    pub fn groups(&self) -> Vec<Arc<ConversationChannel>> {
        self.manager.groups()
    }

    pub fn len(&self) -> usize {
        self.manager.lock().channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
