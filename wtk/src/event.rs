//! The canonical event model shared by every backend.
//!
//! Backends turn their native records into [`NativeEvent`]s, normalizing key
//! codes, buttons and modifiers on the way. The toolkit then finishes the
//! translation: it computes motion deltas, applies the side effects that the
//! callback must be able to observe (new size, should-close flag) and hands
//! the resulting [`Event`] to the window callback.

use bitflags::bitflags;

use crate::window::WindowState;

/// A key identifier.
///
/// Printable keys use their character code, e.g. `KeyCode::from('w')`.
/// Non-printable keys live in a reserved range starting at `0x80`. Native
/// codes the backends don't know about pass through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const BACKSPACE: KeyCode = KeyCode(0x08);
    pub const TAB: KeyCode = KeyCode(0x09);
    pub const ENTER: KeyCode = KeyCode(0x0a);
    pub const ESCAPE: KeyCode = KeyCode(0x1b);

    pub const UP: KeyCode = KeyCode(0x80);
    pub const DOWN: KeyCode = KeyCode(0x81);
    pub const LEFT: KeyCode = KeyCode(0x82);
    pub const RIGHT: KeyCode = KeyCode(0x83);
    pub const F1: KeyCode = KeyCode(0x84);
    pub const F2: KeyCode = KeyCode(0x85);
    pub const F3: KeyCode = KeyCode(0x86);
    pub const F4: KeyCode = KeyCode(0x87);
    pub const F5: KeyCode = KeyCode(0x88);
    pub const F6: KeyCode = KeyCode(0x89);
    pub const F7: KeyCode = KeyCode(0x8a);
    pub const F8: KeyCode = KeyCode(0x8b);
    pub const F9: KeyCode = KeyCode(0x8c);
    pub const F10: KeyCode = KeyCode(0x8d);
    pub const F11: KeyCode = KeyCode(0x8e);
    pub const F12: KeyCode = KeyCode(0x8f);
    pub const LEFT_SHIFT: KeyCode = KeyCode(0x90);
    pub const LEFT_CTRL: KeyCode = KeyCode(0x91);
    pub const LEFT_SUPER: KeyCode = KeyCode(0x92);
    pub const LEFT_ALT: KeyCode = KeyCode(0x93);
    pub const RIGHT_SHIFT: KeyCode = KeyCode(0x94);
    pub const RIGHT_CTRL: KeyCode = KeyCode(0x95);
    pub const RIGHT_SUPER: KeyCode = KeyCode(0x96);
    pub const RIGHT_ALT: KeyCode = KeyCode(0x97);
    pub const CAPS_LOCK: KeyCode = KeyCode(0x98);
    pub const PAGE_UP: KeyCode = KeyCode(0x99);
    pub const PAGE_DOWN: KeyCode = KeyCode(0x9a);
    pub const HOME: KeyCode = KeyCode(0x9b);
    pub const END: KeyCode = KeyCode(0x9c);
    pub const INSERT: KeyCode = KeyCode(0x9d);
    pub const DELETE: KeyCode = KeyCode(0x9e);

    /// The function key `F<n>`, for `n` in `1..=12`.
    pub fn function(n: u8) -> Option<KeyCode> {
        (1..=12).contains(&n).then(|| KeyCode(Self::F1.0 + u32::from(n) - 1))
    }

    /// Whether the code is one of the reserved non-printable constants.
    pub fn is_reserved(self) -> bool {
        (Self::UP.0..=Self::DELETE.0).contains(&self.0)
    }

    /// The character for printable codes.
    pub fn to_char(self) -> Option<char> {
        if self.is_reserved() {
            return None;
        }

        char::from_u32(self.0).filter(|c| !c.is_control())
    }
}

impl From<char> for KeyCode {
    fn from(c: char) -> Self {
        KeyCode(c as u32)
    }
}

/// A zero-based mouse button index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Button(pub u8);

impl Button {
    pub const LEFT: Button = Button(0);
    pub const MIDDLE: Button = Button(1);
    pub const RIGHT: Button = Button(2);
    pub const BACK: Button = Button(3);
    pub const FORWARD: Button = Button(4);

    /// The bit of this button in a [`ButtonMask`].
    pub fn mask(self) -> ButtonMask {
        ButtonMask::from_bits_retain(1u32.checked_shl(u32::from(self.0)).unwrap_or(0))
    }
}

bitflags! {
    /// The set of mouse buttons held during a motion.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ButtonMask: u32 {
        const LEFT    = 0b0000_0001;
        const MIDDLE  = 0b0000_0010;
        const RIGHT   = 0b0000_0100;
        const BACK    = 0b0000_1000;
        const FORWARD = 0b0001_0000;
    }
}

bitflags! {
    /// The modifier keys held when an event happened.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const SHIFT     = 0b0000_0001;
        const CTRL      = 0b0000_0010;
        const ALT       = 0b0000_0100;
        const SUPER     = 0b0000_1000;
        const CAPS_LOCK = 0b0001_0000;
    }
}

/// An event delivered to a window callback.
///
/// Only the payload of the matched variant exists, so there's no way to read
/// fields that don't belong to the event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The user asked to close the window. The window stays alive until it's
    /// deleted.
    WindowClose,

    /// The drawable area changed size.
    WindowResize { width: i32, height: i32 },

    /// The window gained keyboard focus.
    WindowFocusIn,

    /// The window lost keyboard focus.
    WindowFocusOut,

    /// The cursor moved inside the window.
    MouseMotion { x: i32, y: i32, dx: i32, dy: i32, buttons: ButtonMask, mods: Modifiers },

    /// The wheel or the touchpad scrolled.
    MouseScroll { dx: i32, dy: i32 },

    /// The cursor entered the window.
    MouseEnter,

    /// The cursor left the window.
    MouseLeave,

    /// A mouse button was pressed.
    MouseDown { button: Button, x: i32, y: i32, mods: Modifiers },

    /// A mouse button was released.
    MouseUp { button: Button, x: i32, y: i32, mods: Modifiers },

    /// A key was pressed.
    KeyDown { keycode: KeyCode, scancode: u32, mods: Modifiers },

    /// A key was released.
    KeyUp { keycode: KeyCode, scancode: u32, mods: Modifiers },
}

/// Whether a key or a button went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementState {
    Pressed,
    Released,
}

/// A native event record, already normalized by the backend.
///
/// Positions are absolute and window relative; the deltas are computed by
/// the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEvent {
    /// The window manager asked to close the window.
    CloseRequested,

    /// The window moved. It isn't reported to the callback.
    Moved { x: i32, y: i32 },

    /// The drawable area was resized.
    Resized { width: i32, height: i32 },

    FocusIn,

    FocusOut,

    CursorMoved { x: i32, y: i32, buttons: ButtonMask, mods: Modifiers },

    Scroll { dx: i32, dy: i32 },

    CursorEntered,

    CursorLeft,

    Button { state: ElementState, button: Button, x: i32, y: i32, mods: Modifiers },

    /// A key event. Platforms that report the cursor position along with key
    /// events pass it in `position`.
    Key {
        state: ElementState,
        keycode: KeyCode,
        scancode: u32,
        mods: Modifiers,
        position: Option<(i32, i32)>,
    },
}

/// The previous cursor position of a single window.
///
/// It's updated by every event that carries a position, whatever the kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MotionTracker {
    last: (i32, i32),
}

impl MotionTracker {
    /// Record the new position and return the delta from the previous one.
    pub(crate) fn track(&mut self, x: i32, y: i32) -> (i32, i32) {
        let delta = (x.wrapping_sub(self.last.0), y.wrapping_sub(self.last.1));
        self.last = (x, y);
        delta
    }
}

/// Finish translating a native record for the window owning `state`.
///
/// Resizes and close requests are applied to the state before the event is
/// returned, so the callback already observes them.
pub(crate) fn translate(
    state: &mut WindowState,
    tracker: &mut MotionTracker,
    native: NativeEvent,
) -> Option<Event> {
    let event = match native {
        NativeEvent::CloseRequested => {
            state.set_should_close(true);
            Event::WindowClose
        },
        NativeEvent::Moved { x, y } => {
            state.rect.x = x;
            state.rect.y = y;
            return None;
        },
        NativeEvent::Resized { width, height } => {
            state.rect.width = width;
            state.rect.height = height;
            Event::WindowResize { width, height }
        },
        NativeEvent::FocusIn => Event::WindowFocusIn,
        NativeEvent::FocusOut => Event::WindowFocusOut,
        NativeEvent::CursorMoved { x, y, buttons, mods } => {
            let (dx, dy) = tracker.track(x, y);
            Event::MouseMotion { x, y, dx, dy, buttons, mods }
        },
        NativeEvent::Scroll { dx, dy } => Event::MouseScroll { dx, dy },
        NativeEvent::CursorEntered => Event::MouseEnter,
        NativeEvent::CursorLeft => Event::MouseLeave,
        NativeEvent::Button { state: element, button, x, y, mods } => {
            tracker.track(x, y);
            match element {
                ElementState::Pressed => Event::MouseDown { button, x, y, mods },
                ElementState::Released => Event::MouseUp { button, x, y, mods },
            }
        },
        NativeEvent::Key { state: element, keycode, scancode, mods, position } => {
            if let Some((x, y)) = position {
                tracker.track(x, y);
            }

            match element {
                ElementState::Pressed => Event::KeyDown { keycode, scancode, mods },
                ElementState::Released => Event::KeyUp { keycode, scancode, mods },
            }
        },
    };

    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::Rect;

    fn state() -> WindowState {
        WindowState::new(String::new(), Rect::new(0, 0, 640, 480))
    }

    fn motion(x: i32, y: i32) -> NativeEvent {
        NativeEvent::CursorMoved { x, y, buttons: ButtonMask::empty(), mods: Modifiers::empty() }
    }

    #[test]
    fn motion_delta_from_previous_position() {
        let mut state = state();
        let mut tracker = MotionTracker::default();

        translate(&mut state, &mut tracker, motion(10, 10));
        let event = translate(&mut state, &mut tracker, motion(15, 12));

        assert!(matches!(event, Some(Event::MouseMotion { x: 15, y: 12, dx: 5, dy: 2, .. })));
    }

    #[test]
    fn extreme_coordinates_wrap() {
        let mut tracker = MotionTracker::default();
        tracker.track(1, 0);
        assert_eq!(tracker.track(i32::MIN, 0), (i32::MAX, 0));
    }

    #[test]
    fn button_events_move_the_tracked_position() {
        let mut state = state();
        let mut tracker = MotionTracker::default();

        translate(&mut state, &mut tracker, motion(10, 10));
        translate(
            &mut state,
            &mut tracker,
            NativeEvent::Button {
                state: ElementState::Pressed,
                button: Button::LEFT,
                x: 40,
                y: 30,
                mods: Modifiers::empty(),
            },
        );
        let event = translate(&mut state, &mut tracker, motion(41, 30));

        assert!(matches!(event, Some(Event::MouseMotion { dx: 1, dy: 0, .. })));
    }

    #[test]
    fn resize_is_applied_before_the_event() {
        let mut state = state();
        let mut tracker = MotionTracker::default();

        let event =
            translate(&mut state, &mut tracker, NativeEvent::Resized { width: 800, height: 600 });

        assert_eq!(event, Some(Event::WindowResize { width: 800, height: 600 }));
        assert_eq!(state.rect(), Rect::new(0, 0, 800, 600));
    }

    #[test]
    fn close_request_sets_the_flag() {
        let mut state = state();
        let mut tracker = MotionTracker::default();

        let event = translate(&mut state, &mut tracker, NativeEvent::CloseRequested);

        assert_eq!(event, Some(Event::WindowClose));
        assert!(state.should_close());
    }

    #[test]
    fn moves_are_silent() {
        let mut state = state();
        let mut tracker = MotionTracker::default();

        assert_eq!(translate(&mut state, &mut tracker, NativeEvent::Moved { x: 5, y: 7 }), None);
        assert_eq!(state.rect(), Rect::new(5, 7, 640, 480));
    }

    #[test]
    fn key_codes() {
        assert_eq!(KeyCode::function(1), Some(KeyCode::F1));
        assert_eq!(KeyCode::function(12), Some(KeyCode::F12));
        assert_eq!(KeyCode::function(13), None);
        assert_eq!(KeyCode::from('w').to_char(), Some('w'));
        assert_eq!(KeyCode::UP.to_char(), None);
        assert_eq!(KeyCode::ESCAPE.to_char(), None);
        assert!(KeyCode::CAPS_LOCK.is_reserved());
        assert!(!KeyCode::from('~').is_reserved());
    }

    #[test]
    fn button_masks() {
        assert_eq!(Button::LEFT.mask(), ButtonMask::LEFT);
        assert_eq!(Button::RIGHT.mask(), ButtonMask::RIGHT);
        assert_eq!(Button::FORWARD.mask(), ButtonMask::FORWARD);
        assert_eq!(Button(40).mask(), ButtonMask::empty());
    }
}
