//! Window and scene lifecycle for the messages shell.
//!
//! [`WindowManager`] owns the scene, the window, and the currently
//! observed conversation. Everything runs on the shell's event loop:
//! the D-Bus adaptor and the UI surface only enqueue, so no method here
//! races with another.

use crate::config::Config;
use crate::context::{ObservationPublisher, ObservedConversation};
use crate::fl;
use crate::scene::{SceneContext, SceneError, SceneFactory, SceneRoot};
use crate::window::{WindowError, WindowHandle, WindowOptions, WindowSystem};
use messages_groups::{ConversationChannel, GroupManager};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// Events flowing from the surface and the window host into the shell
/// loop.
#[derive(Debug)]
pub enum ShellEvent {
    /// The surface focused a conversation, or none.
    ConversationFocused(Option<Arc<ConversationChannel>>),
    /// The window was closed from outside the shell.
    WindowClosed,
}

/// Failure to bring up the window and its scene.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Window(#[from] WindowError),
}

pub struct WindowManager {
    config: Config,
    groups: Arc<GroupManager>,
    scene_factory: Box<dyn SceneFactory>,
    window_system: Box<dyn WindowSystem>,
    observation: Box<dyn ObservationPublisher>,
    events: mpsc::UnboundedSender<ShellEvent>,
    scene: Option<Box<dyn SceneRoot>>,
    window: Option<Box<dyn WindowHandle>>,
    current_group: Option<Arc<ConversationChannel>>,
    current_group_tx: watch::Sender<Option<Arc<ConversationChannel>>>,
}

impl WindowManager {
    /// Construct the manager with its collaborators. Clears any stale
    /// observed-conversation value left over from a previous run.
    pub fn new(
        config: Config,
        groups: Arc<GroupManager>,
        scene_factory: Box<dyn SceneFactory>,
        window_system: Box<dyn WindowSystem>,
        observation: Box<dyn ObservationPublisher>,
        events: mpsc::UnboundedSender<ShellEvent>,
    ) -> Self {
        observation.publish(None);
        let (current_group_tx, _) = watch::channel(None);
        Self {
            config,
            groups,
            scene_factory,
            window_system,
            observation,
            events,
            scene: None,
            window: None,
            current_group: None,
            current_group_tx,
        }
    }

    /// The conversation the surface currently has focused, if any.
    pub fn current_group(&self) -> Option<&Arc<ConversationChannel>> {
        self.current_group.as_ref()
    }

    /// Watch current-conversation changes.
    pub fn subscribe_current_group(
        &self,
    ) -> watch::Receiver<Option<Arc<ConversationChannel>>> {
        self.current_group_tx.subscribe()
    }

    /// Show the groups list, creating the window if needed.
    pub fn show_groups_window(&mut self) {
        if let Err(err) = self.ensure_window() {
            tracing::warn!(%err, "cannot create window");
            return;
        }
        if let Some(scene) = &mut self.scene {
            if let Err(err) = scene.show_groups_list() {
                tracing::warn!(%err, "showGroupsList call failed");
            }
        }
        self.present_window();
    }

    /// Show the conversation for an identity pair, creating it on first
    /// use. A pair the group manager cannot resolve leaves the surface
    /// untouched; the window may still have been created by then.
    pub fn show_conversation(&mut self, local_uid: &str, remote_uid: &str, chat_type: u32) {
        if let Err(err) = self.ensure_window() {
            tracing::warn!(%err, "cannot create window");
            return;
        }

        tracing::debug!(local_uid, remote_uid, chat_type, "show conversation");
        let group = match self.groups.get_conversation(local_uid, remote_uid) {
            Ok(group) => group,
            Err(err) => {
                tracing::warn!(%err, "could not create group");
                return;
            }
        };

        if let Some(scene) = &mut self.scene {
            if let Err(err) = scene.show_conversation(group) {
                tracing::warn!(%err, "showConversation call failed");
            }
        }
        self.present_window();
    }

    /// Track the conversation the surface focused and mirror it to the
    /// observation publisher. The same reference again is a no-op.
    pub fn update_current_group(&mut self, group: Option<Arc<ConversationChannel>>) {
        let unchanged = match (&self.current_group, &group) {
            (Some(current), Some(new)) => Arc::ptr_eq(current, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        self.current_group = group.clone();
        self.current_group_tx.send_replace(group.clone());
        self.observation
            .publish(group.map(|group| ObservedConversation::peer_to_peer(&group)));
    }

    /// Route one shell event.
    pub fn handle_event(&mut self, event: ShellEvent) {
        match event {
            ShellEvent::ConversationFocused(group) => self.update_current_group(group),
            ShellEvent::WindowClosed => self.window_closed(),
        }
    }

    /// Drop the window after external closure. Nothing is focused in a
    /// window that no longer exists, so the observed conversation clears
    /// with it.
    pub fn window_closed(&mut self) {
        if self.window.take().is_some() {
            tracing::debug!("window closed");
            self.update_current_group(None);
        }
    }

    /// Build the scene once. Subsequent calls are no-ops.
    fn ensure_scene(&mut self) -> Result<(), SceneError> {
        if self.scene.is_some() {
            return Ok(());
        }
        let ctx = SceneContext {
            events: self.events.clone(),
            groups: Arc::clone(&self.groups),
            model: self.groups.model(),
        };
        self.scene = Some(self.scene_factory.load(ctx)?);
        Ok(())
    }

    /// Make sure a live window exists. One that was closed externally is
    /// replaced; otherwise an existing window is kept as-is.
    fn ensure_window(&mut self) -> Result<(), ShellError> {
        if self.window.as_ref().is_some_and(|window| window.is_closed()) {
            self.window_closed();
        }
        if self.window.is_some() {
            return Ok(());
        }

        self.ensure_scene()?;
        let (mut width, mut height) = match &self.scene {
            Some(scene) => scene.size(),
            None => (0, 0),
        };
        if width == 0 || height == 0 {
            width = self.config.window_width;
            height = self.config.window_height;
        }

        let options = WindowOptions {
            title: fl!("window-title"),
            frameless: true,
        };
        let mut window = self
            .window_system
            .create_window(options, self.events.clone())?;
        window.resize(width, height);
        self.window = Some(window);
        Ok(())
    }

    fn present_window(&mut self) {
        if let Some(window) = &mut self.window {
            if self.config.fullscreen {
                window.show_full_screen();
            } else {
                window.show();
            }
            window.activate();
            window.raise();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::MainViewFactory;
    use std::sync::Mutex;

    /// Observations recorded by the fake publisher, oldest first.
    #[derive(Clone, Default)]
    struct PublishProbe(Arc<Mutex<Vec<Option<ObservedConversation>>>>);

    impl PublishProbe {
        fn published(&self) -> Vec<Option<ObservedConversation>> {
            self.0.lock().unwrap().clone()
        }

        fn last(&self) -> Option<Option<ObservedConversation>> {
            self.0.lock().unwrap().last().cloned()
        }
    }

    impl ObservationPublisher for PublishProbe {
        fn publish(&self, observed: Option<ObservedConversation>) {
            self.0.lock().unwrap().push(observed);
        }
    }

    #[derive(Default)]
    struct SceneCalls {
        loads: usize,
        groups_list: usize,
        conversations: Vec<Arc<ConversationChannel>>,
        ctx_groups: Option<Arc<GroupManager>>,
    }

    /// Scene seam fake recording entry-point invocations.
    #[derive(Clone, Default)]
    struct SceneProbe(Arc<Mutex<SceneCalls>>);

    struct FakeScene {
        probe: SceneProbe,
        size: (u32, u32),
    }

    impl SceneFactory for SceneProbe {
        fn load(&self, ctx: SceneContext) -> Result<Box<dyn SceneRoot>, SceneError> {
            let mut calls = self.0.lock().unwrap();
            calls.loads += 1;
            calls.ctx_groups = Some(ctx.groups);
            Ok(Box::new(FakeScene {
                probe: self.clone(),
                size: (0, 0),
            }))
        }
    }

    impl SceneRoot for FakeScene {
        fn show_groups_list(&mut self) -> Result<(), SceneError> {
            self.probe.0.lock().unwrap().groups_list += 1;
            Ok(())
        }

        fn show_conversation(&mut self, group: Arc<ConversationChannel>) -> Result<(), SceneError> {
            self.probe.0.lock().unwrap().conversations.push(group);
            Ok(())
        }

        fn size(&self) -> (u32, u32) {
            self.size
        }
    }

    #[derive(Default)]
    struct WindowCalls {
        created: usize,
        resized: Option<(u32, u32)>,
        full_screen: usize,
        activated: usize,
        raised: usize,
        closed: bool,
    }

    /// Window seam fake; `closed` simulates external closure.
    #[derive(Clone, Default)]
    struct WindowProbe(Arc<Mutex<WindowCalls>>);

    struct FakeWindow {
        probe: WindowProbe,
    }

    impl WindowSystem for WindowProbe {
        fn create_window(
            &self,
            _options: WindowOptions,
            _events: mpsc::UnboundedSender<ShellEvent>,
        ) -> Result<Box<dyn WindowHandle>, WindowError> {
            let mut calls = self.0.lock().unwrap();
            calls.created += 1;
            calls.closed = false;
            Ok(Box::new(FakeWindow {
                probe: self.clone(),
            }))
        }
    }

    impl WindowHandle for FakeWindow {
        fn resize(&mut self, width: u32, height: u32) {
            self.probe.0.lock().unwrap().resized = Some((width, height));
        }

        fn show_full_screen(&mut self) {
            self.probe.0.lock().unwrap().full_screen += 1;
        }

        fn show(&mut self) {}

        fn activate(&mut self) {
            self.probe.0.lock().unwrap().activated += 1;
        }

        fn raise(&mut self) {
            self.probe.0.lock().unwrap().raised += 1;
        }

        fn is_closed(&self) -> bool {
            self.probe.0.lock().unwrap().closed
        }
    }

    struct Fixture {
        manager: WindowManager,
        events: mpsc::UnboundedReceiver<ShellEvent>,
        publish: PublishProbe,
        windows: WindowProbe,
    }

    impl Fixture {
        /// Apply queued surface events, as the shell loop would.
        fn drain_events(&mut self) {
            while let Ok(event) = self.events.try_recv() {
                self.manager.handle_event(event);
            }
        }
    }

    fn fixture_with_scene(scene_factory: Box<dyn SceneFactory>) -> Fixture {
        let publish = PublishProbe::default();
        let windows = WindowProbe::default();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let manager = WindowManager::new(
            Config::default(),
            Arc::new(GroupManager::new()),
            scene_factory,
            Box::new(windows.clone()),
            Box::new(publish.clone()),
            events_tx,
        );
        Fixture {
            manager,
            events: events_rx,
            publish,
            windows,
        }
    }

    fn fixture() -> (Fixture, SceneProbe) {
        let scenes = SceneProbe::default();
        (fixture_with_scene(Box::new(scenes.clone())), scenes)
    }

    fn channel(fixture: &Fixture, remote_uid: &str) -> Arc<ConversationChannel> {
        fixture
            .manager
            .groups
            .get_conversation("acct1", remote_uid)
            .unwrap()
    }

    #[test]
    fn test_window_created_once() {
        let (mut fixture, scenes) = fixture();

        fixture.manager.show_groups_window();
        fixture.manager.show_groups_window();

        assert_eq!(fixture.windows.0.lock().unwrap().created, 1);
        assert_eq!(scenes.0.lock().unwrap().loads, 1);
    }

    #[test]
    fn test_groups_window_shown_fullscreen() {
        let (mut fixture, scenes) = fixture();

        fixture.manager.show_groups_window();

        let windows = fixture.windows.0.lock().unwrap();
        assert_eq!(windows.created, 1);
        assert_eq!(windows.full_screen, 1);
        assert_eq!(windows.activated, 1);
        assert_eq!(windows.raised, 1);
        assert_eq!(scenes.0.lock().unwrap().groups_list, 1);
    }

    #[test]
    fn test_window_sized_from_config_when_scene_has_no_size() {
        let (mut fixture, _scenes) = fixture();

        fixture.manager.show_groups_window();

        let config = Config::default();
        assert_eq!(
            fixture.windows.0.lock().unwrap().resized,
            Some((config.window_width, config.window_height))
        );
    }

    #[test]
    fn test_scene_context_carries_the_group_manager() {
        let (mut fixture, scenes) = fixture();

        fixture.manager.show_groups_window();

        let calls = scenes.0.lock().unwrap();
        let injected = calls.ctx_groups.as_ref().unwrap();
        assert!(Arc::ptr_eq(injected, &fixture.manager.groups));
    }

    #[test]
    fn test_show_conversation_invokes_scene_once() {
        let (mut fixture, scenes) = fixture();

        fixture.manager.show_conversation("acct1", "5551234567", 0);

        let expected = channel(&fixture, "5551234567");
        let calls = scenes.0.lock().unwrap();
        assert_eq!(calls.conversations.len(), 1);
        assert!(Arc::ptr_eq(&calls.conversations[0], &expected));
        assert_eq!(calls.groups_list, 0);
    }

    #[test]
    fn test_unresolvable_pair_leaves_scene_untouched() {
        let (mut fixture, scenes) = fixture();

        fixture.manager.show_conversation("acct1", "", 0);
        fixture.drain_events();

        let calls = scenes.0.lock().unwrap();
        assert!(calls.conversations.is_empty());
        assert_eq!(calls.groups_list, 0);
        // Only the construction-time clear was published.
        assert_eq!(fixture.publish.published(), vec![None]);
        // The window stays up even though nothing was resolved.
        assert_eq!(fixture.windows.0.lock().unwrap().created, 1);
    }

    #[test]
    fn test_update_current_group_publishes_transitions() {
        let (mut fixture, _scenes) = fixture();
        let g1 = channel(&fixture, "5551234567");
        let g2 = channel(&fixture, "5557654321");
        let mut watcher = fixture.manager.subscribe_current_group();
        assert!(!watcher.has_changed().unwrap());

        fixture.manager.update_current_group(Some(Arc::clone(&g1)));
        assert!(watcher.has_changed().unwrap());
        watcher.mark_unchanged();

        fixture.manager.update_current_group(Some(Arc::clone(&g2)));
        assert!(watcher.has_changed().unwrap());

        let published = fixture.publish.published();
        // Initial clear plus one entry per transition.
        assert_eq!(published.len(), 3);
        assert_eq!(
            published[2],
            Some(ObservedConversation::peer_to_peer(&g2))
        );
        assert!(Arc::ptr_eq(fixture.manager.current_group().unwrap(), &g2));
    }

    #[test]
    fn test_same_reference_is_a_noop() {
        let (mut fixture, _scenes) = fixture();
        let g1 = channel(&fixture, "5551234567");

        fixture.manager.update_current_group(Some(Arc::clone(&g1)));
        let mut watcher = fixture.manager.subscribe_current_group();
        watcher.mark_unchanged();

        fixture.manager.update_current_group(Some(Arc::clone(&g1)));

        assert!(!watcher.has_changed().unwrap());
        assert_eq!(fixture.publish.published().len(), 2);
    }

    #[test]
    fn test_clearing_unsets_the_property() {
        let (mut fixture, _scenes) = fixture();
        let g1 = channel(&fixture, "5551234567");

        fixture.manager.update_current_group(Some(g1));
        fixture.manager.update_current_group(None);

        assert_eq!(fixture.publish.last(), Some(None));
        assert!(fixture.manager.current_group().is_none());
    }

    #[test]
    fn test_closed_window_is_recreated() {
        let (mut fixture, _scenes) = fixture();
        let g1 = channel(&fixture, "5551234567");

        fixture.manager.show_groups_window();
        fixture.manager.update_current_group(Some(g1));
        fixture.windows.0.lock().unwrap().closed = true;

        fixture.manager.show_groups_window();

        assert_eq!(fixture.windows.0.lock().unwrap().created, 2);
        // Nothing is focused in the replacement window.
        assert_eq!(fixture.publish.last(), Some(None));
        assert!(fixture.manager.current_group().is_none());
    }

    #[test]
    fn test_window_closed_event_clears_observation() {
        let (mut fixture, _scenes) = fixture();
        let g1 = channel(&fixture, "5551234567");

        fixture.manager.show_groups_window();
        fixture.manager.update_current_group(Some(g1));
        fixture.manager.handle_event(ShellEvent::WindowClosed);

        assert_eq!(fixture.publish.last(), Some(None));

        fixture.manager.show_groups_window();
        assert_eq!(fixture.windows.0.lock().unwrap().created, 2);
    }

    #[test]
    fn test_main_view_reports_focus_to_the_publisher() {
        let mut fixture = fixture_with_scene(Box::new(MainViewFactory));

        fixture.manager.show_conversation("acct1", "5551234567", 0);
        fixture.drain_events();

        let expected = channel(&fixture, "5551234567");
        assert_eq!(
            fixture.publish.last(),
            Some(Some(ObservedConversation::peer_to_peer(&expected)))
        );

        fixture.manager.show_groups_window();
        fixture.drain_events();
        assert_eq!(fixture.publish.last(), Some(None));

        // The window was sized to the view's natural dimensions.
        assert_eq!(
            fixture.windows.0.lock().unwrap().resized,
            Some((480, 854))
        );
    }

    #[test]
    fn test_fresh_groups_window_publishes_nothing() {
        let mut fixture = fixture_with_scene(Box::new(MainViewFactory));

        fixture.manager.show_groups_window();
        fixture.drain_events();

        assert_eq!(fixture.publish.published(), vec![None]);
    }

    #[test]
    fn test_repeated_conversation_focus_is_stable() {
        let mut fixture = fixture_with_scene(Box::new(MainViewFactory));

        fixture.manager.show_conversation("acct1", "5551234567", 0);
        fixture.drain_events();
        fixture.manager.show_conversation("acct1", "(555) 123-4567", 0);
        fixture.drain_events();

        // Two publishes total: the construction clear and one focus.
        assert_eq!(fixture.publish.published().len(), 2);
    }
}
