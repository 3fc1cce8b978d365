//! Built-in surface: view state for the main document.
//!
//! [`MainView`] is the root object the shell drives when no external
//! renderer binds the [`SceneRoot`] seam. It tracks which view is on
//! screen and reports focus changes back through the shell channel;
//! drawing is the renderer's business.

use crate::manager::ShellEvent;
use crate::scene::{SceneContext, SceneError, SceneFactory, SceneRoot};
use messages_groups::ConversationChannel;
use std::sync::Arc;

/// Natural size of the main view, portrait handset layout.
const NATURAL_WIDTH: u32 = 480;
const NATURAL_HEIGHT: u32 = 854;

/// Which view the surface is showing.
enum ActiveView {
    GroupsList,
    Conversation(Arc<ConversationChannel>),
}

/// Factory for [`MainView`].
#[derive(Debug, Default)]
pub struct MainViewFactory;

impl SceneFactory for MainViewFactory {
    fn load(&self, ctx: SceneContext) -> Result<Box<dyn SceneRoot>, SceneError> {
        Ok(Box::new(MainView {
            ctx,
            active: ActiveView::GroupsList,
        }))
    }
}

/// Root object of the built-in main document. Starts on the groups list.
pub struct MainView {
    ctx: SceneContext,
    active: ActiveView,
}

impl MainView {
    fn focus(
        &self,
        entry_point: &'static str,
        group: Option<Arc<ConversationChannel>>,
    ) -> Result<(), SceneError> {
        self.ctx
            .events
            .send(ShellEvent::ConversationFocused(group))
            .map_err(|err| SceneError::EntryPoint {
                name: entry_point,
                reason: err.to_string(),
            })
    }
}

impl SceneRoot for MainView {
    fn show_groups_list(&mut self) -> Result<(), SceneError> {
        if matches!(self.active, ActiveView::GroupsList) {
            return Ok(());
        }
        tracing::debug!(groups = self.ctx.model.len(), "switching to groups list");
        self.active = ActiveView::GroupsList;
        self.focus("showGroupsList", None)
    }

    fn show_conversation(&mut self, group: Arc<ConversationChannel>) -> Result<(), SceneError> {
        if let ActiveView::Conversation(current) = &self.active {
            if Arc::ptr_eq(current, &group) {
                return Ok(());
            }
        }
        tracing::debug!(remote_uid = group.remote_uid(), "switching to conversation");
        group.touch();
        self.active = ActiveView::Conversation(Arc::clone(&group));
        self.focus("showConversation", Some(group))
    }

    fn size(&self) -> (u32, u32) {
        (NATURAL_WIDTH, NATURAL_HEIGHT)
    }
}
