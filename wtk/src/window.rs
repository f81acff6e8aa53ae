//! Window description, identity and the state visible to callbacks.

use std::fmt;

use crate::config::ConfigTemplate;
use crate::event::Event;

/// Width used when the requested one isn't positive.
pub const DEFAULT_WIDTH: i32 = 640;

/// Height used when the requested one isn't positive.
pub const DEFAULT_HEIGHT: i32 = 480;

slotmap::new_key_type! {
    /// Identifier of a window owned by a [`Wtk`](crate::Wtk).
    ///
    /// Identifiers are never reused, so one that outlived its window is
    /// simply rejected by every operation.
    pub struct WindowId;
}

/// The callback receiving the events of a window.
pub type EventCallback = Box<dyn FnMut(&mut WindowState, &Event)>;

/// Position and size of a window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

/// The part of a window a callback may look at and change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    pub(crate) title: String,
    pub(crate) rect: Rect,
    pub(crate) should_close: bool,
}

impl WindowState {
    pub(crate) fn new(title: String, rect: Rect) -> Self {
        Self { title, rect, should_close: false }
    }

    /// The current title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The last known position and size of the window.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Whether a close was requested.
    pub fn should_close(&self) -> bool {
        self.should_close
    }

    /// Raise or clear the close request flag.
    ///
    /// Clearing it from the callback of a [`Event::WindowClose`] cancels the
    /// request as far as the toolkit is concerned.
    pub fn set_should_close(&mut self, should_close: bool) {
        self.should_close = should_close;
    }
}

/// Attributes used to create a window.
pub struct WindowAttributes {
    pub(crate) callback: Option<EventCallback>,
    pub(crate) title: String,
    pub(crate) rect: Rect,
    pub(crate) config: ConfigTemplate,
}

impl WindowAttributes {
    /// Attributes of an untitled window at the origin with the default size.
    pub fn new() -> Self {
        Self {
            callback: None,
            title: String::new(),
            rect: Rect::new(0, 0, DEFAULT_WIDTH, DEFAULT_HEIGHT),
            config: ConfigTemplate::default(),
        }
    }

    /// The callback receiving the window events. Without one the events are
    /// consumed silently.
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut WindowState, &Event) + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// The initial title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// The initial position of the window on the screen.
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.rect.x = x;
        self.rect.y = y;
        self
    }

    /// The initial size of the drawable area. Non-positive values fall back
    /// to [`DEFAULT_WIDTH`] and [`DEFAULT_HEIGHT`].
    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.rect.width = width;
        self.rect.height = height;
        self
    }

    /// The framebuffer and context configuration.
    pub fn with_config(mut self, config: ConfigTemplate) -> Self {
        self.config = config;
        self
    }

    /// The title to set on creation.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The requested geometry, with defaults applied.
    pub fn rect(&self) -> Rect {
        let mut rect = self.rect;
        if rect.width <= 0 {
            rect.width = DEFAULT_WIDTH;
        }
        if rect.height <= 0 {
            rect.height = DEFAULT_HEIGHT;
        }
        rect
    }

    /// The requested configuration.
    pub fn config(&self) -> &ConfigTemplate {
        &self.config
    }
}

impl Default for WindowAttributes {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WindowAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowAttributes")
            .field("callback", &self.callback.as_ref().map(|_| ".."))
            .field("title", &self.title)
            .field("rect", &self.rect)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_sizes_fall_back_to_defaults() {
        let attrs = WindowAttributes::new().with_position(10, 20).with_size(0, -5);
        assert_eq!(attrs.rect(), Rect::new(10, 20, DEFAULT_WIDTH, DEFAULT_HEIGHT));

        let attrs = WindowAttributes::new().with_size(800, 0);
        assert_eq!(attrs.rect(), Rect::new(0, 0, 800, DEFAULT_HEIGHT));
    }

    #[test]
    fn state_flag() {
        let mut state = WindowState::new("Hi".into(), Rect::new(0, 0, 1, 1));
        assert!(!state.should_close());
        state.set_should_close(true);
        assert!(state.should_close());
        assert_eq!(state.title(), "Hi");
    }
}
