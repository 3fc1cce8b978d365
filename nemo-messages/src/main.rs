//! Messages shell entry point.
//!
//! Wires the window manager to the session bus and runs the shell's
//! single event loop.

use anyhow::Result;
use messages_groups::GroupManager;
use nemo_messages::config::Config;
use nemo_messages::context::{ObservationPublisher, Property, Provider, OBSERVED_CONVERSATION};
use nemo_messages::i18n;
use nemo_messages::manager::WindowManager;
use nemo_messages::service::{self, Command};
use nemo_messages::views::MainViewFactory;
use nemo_messages::window::ShellWindowSystem;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nemo_messages=debug".parse()?),
        )
        .init();

    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();
    i18n::init(&requested_languages);

    tracing::info!("starting messages shell");

    let config = Config::load();
    let groups = Arc::new(GroupManager::new());

    let (commands_tx, mut commands_rx) = mpsc::unbounded_channel();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    // The connection must outlive the loop; a failed registration leaves
    // the shell running unregistered.
    let _service_connection = match service::register(commands_tx).await {
        Ok(connection) => Some(connection),
        Err(err) => {
            tracing::warn!(%err, "cannot register DBus service");
            None
        }
    };

    let observation: Box<dyn ObservationPublisher> = match Provider::serve().await {
        Ok(provider) => Box::new(provider.property(OBSERVED_CONVERSATION)),
        Err(err) => {
            tracing::warn!(%err, "cannot serve context properties");
            Box::new(Property::detached(OBSERVED_CONVERSATION))
        }
    };

    let mut manager = WindowManager::new(
        config.clone(),
        Arc::clone(&groups),
        Box::new(MainViewFactory),
        Box::new(ShellWindowSystem),
        observation,
        events_tx,
    );

    loop {
        tokio::select! {
            Some(command) = commands_rx.recv() => match command {
                Command::ShowGroupsWindow => manager.show_groups_window(),
                Command::ShowConversation { local_uid, remote_uid, chat_type } => {
                    manager.show_conversation(&local_uid, &remote_uid, chat_type);
                }
            },
            Some(event) = events_rx.recv() => manager.handle_event(event),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    if let Err(err) = config.save() {
        tracing::debug!(%err, "could not persist config");
    }

    Ok(())
}
