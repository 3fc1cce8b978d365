//! Context property provider for shell-level conversation awareness.
//!
//! The desktop shell's context framework subscribes to the
//! `Messaging.ObservedConversation` key to learn which conversation is
//! on screen. The provider serves a small read surface on the session
//! bus; values are lists, and an empty list means the key is unset.

use messages_groups::{ChatType, ConversationChannel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use zbus::object_server::SignalEmitter;
use zbus::zvariant::Type;
use zbus::Connection;

/// Well-known name of the context provider.
pub const SERVICE_NAME: &str = "org.nemomobile.qmlmessages.context";
/// Object path the provider serves.
pub const OBJECT_PATH: &str = "/org/nemomobile/qmlmessages/context";
/// Context key for the currently observed conversation.
pub const OBSERVED_CONVERSATION: &str = "Messaging.ObservedConversation";

/// The published conversation tuple: local account uid, resolved contact
/// id, and the chat-type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct ObservedConversation {
    pub local_uid: String,
    pub contact_id: u32,
    chat_type: u32,
}

impl ObservedConversation {
    /// Tuple for a one-to-one conversation on `channel`. Published
    /// conversations always carry the peer-to-peer tag.
    pub fn peer_to_peer(channel: &ConversationChannel) -> Self {
        Self {
            local_uid: channel.local_uid().to_owned(),
            contact_id: channel.contact_id(),
            chat_type: ChatType::PeerToPeer.into(),
        }
    }

    /// Wire value of the chat-type tag.
    pub fn chat_type(&self) -> u32 {
        self.chat_type
    }
}

/// Publish seam for the observed conversation, keeping the broadcast
/// mechanism swappable.
pub trait ObservationPublisher {
    /// Publish a new tuple, or clear with `None`.
    fn publish(&self, observed: Option<ObservedConversation>);
}

type Values = Arc<Mutex<HashMap<String, ObservedConversation>>>;

/// One value-or-unset update for a context key.
struct Update {
    key: &'static str,
    value: Option<ObservedConversation>,
}

/// Serves the context interface and applies queued property updates.
pub struct Provider {
    updates: mpsc::UnboundedSender<Update>,
}

impl Provider {
    /// Register the provider on the session bus and start its update
    /// task. The task holds the connection; it ends once every
    /// [`Property`] handle is dropped.
    pub async fn serve() -> zbus::Result<Self> {
        let values: Values = Arc::new(Mutex::new(HashMap::new()));
        let service = ContextService {
            values: Arc::clone(&values),
        };
        let connection = zbus::connection::Builder::session()?
            .name(SERVICE_NAME)?
            .serve_at(OBJECT_PATH, service)?
            .build()
            .await?;

        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        tokio::spawn(apply_updates(connection, values, updates_rx));
        Ok(Self {
            updates: updates_tx,
        })
    }

    /// Handle for publishing `key`.
    pub fn property(&self, key: &'static str) -> Property {
        Property {
            key,
            updates: Some(self.updates.clone()),
        }
    }
}

/// Handle for one context key.
pub struct Property {
    key: &'static str,
    updates: Option<mpsc::UnboundedSender<Update>>,
}

impl Property {
    /// A property with no provider behind it; publishes are dropped.
    /// Used when the context service could not be brought up.
    pub fn detached(key: &'static str) -> Self {
        Self { key, updates: None }
    }

    /// Publish a value for this key.
    pub fn set_value(&self, value: ObservedConversation) {
        self.send(Some(value));
    }

    /// Clear this key. A no-op on the wire when nothing was set.
    pub fn unset(&self) {
        self.send(None);
    }

    fn send(&self, value: Option<ObservedConversation>) {
        let Some(updates) = &self.updates else {
            return;
        };
        let update = Update {
            key: self.key,
            value,
        };
        if updates.send(update).is_err() {
            tracing::warn!(key = self.key, "context provider is gone, dropping update");
        }
    }
}

impl ObservationPublisher for Property {
    fn publish(&self, observed: Option<ObservedConversation>) {
        match observed {
            Some(value) => self.set_value(value),
            None => self.unset(),
        }
    }
}

async fn apply_updates(
    connection: Connection,
    values: Values,
    mut updates: mpsc::UnboundedReceiver<Update>,
) {
    while let Some(update) = updates.recv().await {
        let changed = {
            let mut values = values.lock().unwrap_or_else(PoisonError::into_inner);
            match &update.value {
                Some(value) => values
                    .insert(update.key.to_owned(), value.clone())
                    .as_ref()
                    != Some(value),
                None => values.remove(update.key).is_some(),
            }
        };
        if !changed {
            continue;
        }

        let value: Vec<ObservedConversation> = update.value.into_iter().collect();
        if let Err(err) = emit_changed(&connection, update.key, &value).await {
            tracing::warn!(%err, key = update.key, "failed to emit context change");
        }
    }
}

async fn emit_changed(
    connection: &Connection,
    key: &str,
    value: &[ObservedConversation],
) -> zbus::Result<()> {
    let iface = connection
        .object_server()
        .interface::<_, ContextService>(OBJECT_PATH)
        .await?;
    ContextService::changed(iface.signal_emitter(), key, value).await
}

/// The D-Bus face of the provider.
struct ContextService {
    values: Values,
}

#[zbus::interface(name = "org.nemomobile.qmlmessages.Context")]
impl ContextService {
    /// Current value list for `key`; empty when the key is unset.
    #[zbus(name = "Get")]
    fn get(&self, key: &str) -> Vec<ObservedConversation> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned().into_iter().collect()
    }

    /// Keys this provider publishes.
    #[zbus(name = "Keys")]
    fn keys(&self) -> Vec<String> {
        vec![OBSERVED_CONVERSATION.to_owned()]
    }

    /// Emitted when a key's value changes; an empty list means unset.
    #[zbus(signal, name = "Changed")]
    async fn changed(
        emitter: &SignalEmitter<'_>,
        key: &str,
        value: &[ObservedConversation],
    ) -> zbus::Result<()>;
}
