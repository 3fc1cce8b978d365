//! Session-bus adaptor for remote show requests.
//!
//! The adaptor only enqueues; requests are handled sequentially by the
//! shell's event loop, so remote and in-process callers go through the
//! same path. Callers get no failure indication beyond the call
//! completing, matching the shell's log-and-continue policy.

use tokio::sync::mpsc::UnboundedSender;
use zbus::Connection;

/// Well-known name of the shell service.
pub const SERVICE_NAME: &str = "org.nemomobile.qmlmessages";
/// Object path of the adaptor.
pub const OBJECT_PATH: &str = "/";

/// Requests forwarded into the shell's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bring up the groups list window.
    ShowGroupsWindow,
    /// Bring up the conversation for an identity pair.
    ShowConversation {
        local_uid: String,
        remote_uid: String,
        chat_type: u32,
    },
}

/// D-Bus face of the shell.
pub struct MessagesService {
    commands: UnboundedSender<Command>,
}

impl MessagesService {
    pub fn new(commands: UnboundedSender<Command>) -> Self {
        Self { commands }
    }

    fn forward(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("shell loop is gone, dropping remote command");
        }
    }
}

#[zbus::interface(name = "org.nemomobile.qmlmessages")]
impl MessagesService {
    /// Show the groups list.
    #[zbus(name = "showGroupsWindow")]
    fn show_groups_window(&self) {
        self.forward(Command::ShowGroupsWindow);
    }

    /// Show the conversation for `(local_uid, remote_uid)`.
    #[zbus(name = "showConversation")]
    fn show_conversation(&self, local_uid: &str, remote_uid: &str, chat_type: u32) {
        self.forward(Command::ShowConversation {
            local_uid: local_uid.to_owned(),
            remote_uid: remote_uid.to_owned(),
            chat_type,
        });
    }
}

/// Register the adaptor on the session bus. The returned connection must
/// stay alive for the lifetime of the service.
pub async fn register(commands: UnboundedSender<Command>) -> zbus::Result<Connection> {
    zbus::connection::Builder::session()?
        .name(SERVICE_NAME)?
        .serve_at(OBJECT_PATH, MessagesService::new(commands))?
        .build()
        .await
}
