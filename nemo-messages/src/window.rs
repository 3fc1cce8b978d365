//! Window host seam and the built-in window system.
//!
//! The window is an explicitly owned resource of the manager; external
//! closure arrives as [`ShellEvent::WindowClosed`] through the shell's
//! event channel rather than by a handle silently going stale.

use crate::manager::ShellEvent;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Failure to allocate a window.
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window system unavailable: {0}")]
    Unavailable(String),
}

/// Creation-time parameters the shell decides.
#[derive(Debug, Clone)]
pub struct WindowOptions {
    /// Window title.
    pub title: String,
    /// Chrome-less presentation.
    pub frameless: bool,
}

/// Allocates windows for the shell.
pub trait WindowSystem {
    /// Create a window. `events` receives [`ShellEvent::WindowClosed`]
    /// when the window is closed from outside the shell.
    fn create_window(
        &self,
        options: WindowOptions,
        events: UnboundedSender<ShellEvent>,
    ) -> Result<Box<dyn WindowHandle>, WindowError>;
}

/// An on-screen window owned by the shell.
pub trait WindowHandle {
    fn resize(&mut self, width: u32, height: u32);

    /// Present full-screen.
    fn show_full_screen(&mut self);

    /// Present at the current size.
    fn show(&mut self);

    /// Give the window input focus.
    fn activate(&mut self);

    /// Bring the window to the front of the stack.
    fn raise(&mut self);

    /// Whether the window was closed externally.
    fn is_closed(&self) -> bool;
}

/// Window system used when no compositor integration binds the seam.
/// Tracks presentation state and logs transitions.
#[derive(Debug, Default)]
pub struct ShellWindowSystem;

impl WindowSystem for ShellWindowSystem {
    fn create_window(
        &self,
        options: WindowOptions,
        _events: UnboundedSender<ShellEvent>,
    ) -> Result<Box<dyn WindowHandle>, WindowError> {
        tracing::debug!(
            title = %options.title,
            frameless = options.frameless,
            "creating window"
        );
        Ok(Box::new(ShellWindow {
            width: 0,
            height: 0,
            closed: false,
        }))
    }
}

#[derive(Debug)]
struct ShellWindow {
    width: u32,
    height: u32,
    closed: bool,
}

impl WindowHandle for ShellWindow {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn show_full_screen(&mut self) {
        tracing::debug!("window shown full-screen");
    }

    fn show(&mut self) {
        tracing::debug!(width = self.width, height = self.height, "window shown");
    }

    fn activate(&mut self) {
        tracing::debug!("window activated");
    }

    fn raise(&mut self) {
        tracing::debug!("window raised");
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
