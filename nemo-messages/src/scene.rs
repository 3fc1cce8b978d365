//! Seam between the window manager and the UI engine.
//!
//! The shell renders nothing itself. A [`SceneFactory`] loads the main
//! document once and hands back its root object as a [`SceneRoot`]; the
//! two entry points are capabilities resolved when the scene is built,
//! so any UI layer substituted here is checked at bind time.

use crate::manager::ShellEvent;
use messages_groups::{ConversationChannel, GroupManager, GroupModel};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Failure in the UI surface.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The main document could not be loaded.
    #[error("failed to load scene document {resource:?}: {reason}")]
    Document { resource: String, reason: String },
    /// An entry point on the root object failed or is missing.
    #[error("{name} call failed: {reason}")]
    EntryPoint {
        name: &'static str,
        reason: String,
    },
}

/// References injected into the scene's evaluation context: a channel
/// back to the shell, the group-management collaborator, and that
/// collaborator's data model.
pub struct SceneContext {
    /// Events flowing from the surface back into the shell loop.
    pub events: UnboundedSender<ShellEvent>,
    /// Conversation get-or-create collaborator.
    pub groups: Arc<GroupManager>,
    /// Groups listing for the conversation list view.
    pub model: GroupModel,
}

/// Loads the main UI document.
pub trait SceneFactory {
    /// Build the scene and return its root object. Called at most once
    /// per manager; the root lives for the rest of the process.
    fn load(&self, ctx: SceneContext) -> Result<Box<dyn SceneRoot>, SceneError>;
}

/// Capabilities of the root visual object of the main document.
pub trait SceneRoot {
    /// Switch the surface to the groups list view.
    fn show_groups_list(&mut self) -> Result<(), SceneError>;

    /// Switch the surface to the given conversation.
    fn show_conversation(&mut self, group: Arc<ConversationChannel>) -> Result<(), SceneError>;

    /// Natural size of the root object, used to size a fresh window.
    /// `(0, 0)` when the surface has no opinion.
    fn size(&self) -> (u32, u32);
}
