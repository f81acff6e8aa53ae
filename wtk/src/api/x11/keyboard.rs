//! Translation of X11 key symbols, modifier state and button numbers.

use std::os::raw::c_uint;

use x11_dl::keysym;
use x11_dl::xlib;

use crate::event::{Button, ButtonMask, KeyCode, Modifiers};

/// Map a key symbol to the canonical key code.
///
/// Latin-1 symbols already are their character code, so anything not listed
/// is passed through.
pub(crate) fn keysym_to_keycode(sym: c_uint) -> KeyCode {
    match sym {
        keysym::XK_BackSpace => KeyCode::BACKSPACE,
        keysym::XK_Tab => KeyCode::TAB,
        keysym::XK_Return | keysym::XK_KP_Enter => KeyCode::ENTER,
        keysym::XK_Escape => KeyCode::ESCAPE,
        keysym::XK_Up => KeyCode::UP,
        keysym::XK_Down => KeyCode::DOWN,
        keysym::XK_Left => KeyCode::LEFT,
        keysym::XK_Right => KeyCode::RIGHT,
        keysym::XK_Page_Up => KeyCode::PAGE_UP,
        keysym::XK_Page_Down => KeyCode::PAGE_DOWN,
        keysym::XK_Home => KeyCode::HOME,
        keysym::XK_End => KeyCode::END,
        keysym::XK_Insert => KeyCode::INSERT,
        keysym::XK_Delete => KeyCode::DELETE,
        keysym::XK_Shift_L => KeyCode::LEFT_SHIFT,
        keysym::XK_Shift_R => KeyCode::RIGHT_SHIFT,
        keysym::XK_Control_L => KeyCode::LEFT_CTRL,
        keysym::XK_Control_R => KeyCode::RIGHT_CTRL,
        keysym::XK_Super_L => KeyCode::LEFT_SUPER,
        keysym::XK_Super_R => KeyCode::RIGHT_SUPER,
        keysym::XK_Alt_L => KeyCode::LEFT_ALT,
        keysym::XK_Alt_R => KeyCode::RIGHT_ALT,
        keysym::XK_Caps_Lock => KeyCode::CAPS_LOCK,
        sym @ keysym::XK_F1..=keysym::XK_F12 => KeyCode(KeyCode::F1.0 + (sym - keysym::XK_F1)),
        sym => KeyCode(sym),
    }
}

/// Normalize the modifier bits of an event state.
pub(crate) fn modifiers(state: c_uint) -> Modifiers {
    let mut mods = Modifiers::empty();
    mods.set(Modifiers::SHIFT, state & xlib::ShiftMask != 0);
    mods.set(Modifiers::CTRL, state & xlib::ControlMask != 0);
    mods.set(Modifiers::ALT, state & xlib::Mod1Mask != 0);
    mods.set(Modifiers::SUPER, state & xlib::Mod4Mask != 0);
    mods.set(Modifiers::CAPS_LOCK, state & xlib::LockMask != 0);
    mods
}

/// Buttons held according to an event state. The wheel buttons never count
/// as held.
pub(crate) fn held_buttons(state: c_uint) -> ButtonMask {
    let mut buttons = ButtonMask::empty();
    buttons.set(ButtonMask::LEFT, state & xlib::Button1Mask != 0);
    buttons.set(ButtonMask::MIDDLE, state & xlib::Button2Mask != 0);
    buttons.set(ButtonMask::RIGHT, state & xlib::Button3Mask != 0);
    buttons
}

/// What an X11 button number stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ButtonAction {
    Press(Button),
    Scroll { dx: i32, dy: i32 },
}

/// Split X11 button numbers into real buttons and the emulated wheel.
///
/// Buttons 1 to 3 are left, middle and right, 4 to 7 are the wheel and the
/// side buttons start at 8.
pub(crate) fn button_action(button: c_uint) -> ButtonAction {
    match button {
        4 => ButtonAction::Scroll { dx: 0, dy: 1 },
        5 => ButtonAction::Scroll { dx: 0, dy: -1 },
        6 => ButtonAction::Scroll { dx: 1, dy: 0 },
        7 => ButtonAction::Scroll { dx: -1, dy: 0 },
        0..=3 => ButtonAction::Press(Button(button.saturating_sub(1) as u8)),
        _ => ButtonAction::Press(Button(u8::try_from(button - 5).unwrap_or(u8::MAX))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_keys() {
        assert_eq!(keysym_to_keycode(keysym::XK_Up), KeyCode::UP);
        assert_eq!(keysym_to_keycode(keysym::XK_Escape), KeyCode::ESCAPE);
        assert_eq!(keysym_to_keycode(keysym::XK_F1), KeyCode::F1);
        assert_eq!(keysym_to_keycode(keysym::XK_F12), KeyCode::F12);
        assert_eq!(keysym_to_keycode(keysym::XK_Control_R), KeyCode::RIGHT_CTRL);
        assert_eq!(keysym_to_keycode(keysym::XK_Page_Down), KeyCode::PAGE_DOWN);
    }

    #[test]
    fn printable_keys_pass_through() {
        assert_eq!(keysym_to_keycode(keysym::XK_a), KeyCode::from('a'));
        assert_eq!(keysym_to_keycode(keysym::XK_A), KeyCode::from('A'));
        assert_eq!(keysym_to_keycode(keysym::XK_space), KeyCode::from(' '));
    }

    #[test]
    fn state_bits() {
        let state = xlib::ShiftMask | xlib::Mod4Mask | xlib::Button1Mask | xlib::Button4Mask;
        assert_eq!(modifiers(state), Modifiers::SHIFT | Modifiers::SUPER);
        assert_eq!(held_buttons(state), ButtonMask::LEFT);
        assert_eq!(modifiers(xlib::LockMask | xlib::Mod1Mask), Modifiers::CAPS_LOCK | Modifiers::ALT);
    }

    #[test]
    fn buttons_and_wheel() {
        assert_eq!(button_action(1), ButtonAction::Press(Button::LEFT));
        assert_eq!(button_action(2), ButtonAction::Press(Button::MIDDLE));
        assert_eq!(button_action(3), ButtonAction::Press(Button::RIGHT));
        assert_eq!(button_action(4), ButtonAction::Scroll { dx: 0, dy: 1 });
        assert_eq!(button_action(5), ButtonAction::Scroll { dx: 0, dy: -1 });
        assert_eq!(button_action(6), ButtonAction::Scroll { dx: 1, dy: 0 });
        assert_eq!(button_action(7), ButtonAction::Scroll { dx: -1, dy: 0 });
        assert_eq!(button_action(8), ButtonAction::Press(Button::BACK));
        assert_eq!(button_action(9), ButtonAction::Press(Button::FORWARD));
    }
}
