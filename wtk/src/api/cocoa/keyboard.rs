//! Translation of AppKit virtual keys, mouse buttons and modifier flags.

use objc2_app_kit::NSEventModifierFlags;

use crate::event::{Button, ButtonMask, KeyCode, Modifiers};

// Virtual key codes of the ANSI layout, from `Carbon/HIToolbox/Events.h`.
const KVK_RETURN: u16 = 0x24;
const KVK_TAB: u16 = 0x30;
const KVK_DELETE: u16 = 0x33;
const KVK_ESCAPE: u16 = 0x35;
const KVK_RIGHT_COMMAND: u16 = 0x36;
const KVK_COMMAND: u16 = 0x37;
const KVK_SHIFT: u16 = 0x38;
const KVK_CAPS_LOCK: u16 = 0x39;
const KVK_OPTION: u16 = 0x3a;
const KVK_CONTROL: u16 = 0x3b;
const KVK_RIGHT_SHIFT: u16 = 0x3c;
const KVK_RIGHT_OPTION: u16 = 0x3d;
const KVK_RIGHT_CONTROL: u16 = 0x3e;
const KVK_KEYPAD_ENTER: u16 = 0x4c;
const KVK_F5: u16 = 0x60;
const KVK_F6: u16 = 0x61;
const KVK_F7: u16 = 0x62;
const KVK_F3: u16 = 0x63;
const KVK_F8: u16 = 0x64;
const KVK_F9: u16 = 0x65;
const KVK_F11: u16 = 0x67;
const KVK_F10: u16 = 0x6d;
const KVK_F12: u16 = 0x6f;
const KVK_HELP: u16 = 0x72;
const KVK_HOME: u16 = 0x73;
const KVK_PAGE_UP: u16 = 0x74;
const KVK_FORWARD_DELETE: u16 = 0x75;
const KVK_F4: u16 = 0x76;
const KVK_END: u16 = 0x77;
const KVK_F2: u16 = 0x78;
const KVK_PAGE_DOWN: u16 = 0x79;
const KVK_F1: u16 = 0x7a;
const KVK_LEFT_ARROW: u16 = 0x7b;
const KVK_RIGHT_ARROW: u16 = 0x7c;
const KVK_DOWN_ARROW: u16 = 0x7d;
const KVK_UP_ARROW: u16 = 0x7e;

/// Map a virtual key to the canonical key code.
///
/// Keys producing text aren't in the table, their code comes from the
/// characters of the event instead.
pub(crate) fn virtual_key_to_keycode(key: u16) -> Option<KeyCode> {
    let keycode = match key {
        KVK_RETURN | KVK_KEYPAD_ENTER => KeyCode::ENTER,
        KVK_TAB => KeyCode::TAB,
        KVK_DELETE => KeyCode::BACKSPACE,
        KVK_ESCAPE => KeyCode::ESCAPE,
        KVK_FORWARD_DELETE => KeyCode::DELETE,
        KVK_HELP => KeyCode::INSERT,
        KVK_HOME => KeyCode::HOME,
        KVK_END => KeyCode::END,
        KVK_PAGE_UP => KeyCode::PAGE_UP,
        KVK_PAGE_DOWN => KeyCode::PAGE_DOWN,
        KVK_LEFT_ARROW => KeyCode::LEFT,
        KVK_RIGHT_ARROW => KeyCode::RIGHT,
        KVK_DOWN_ARROW => KeyCode::DOWN,
        KVK_UP_ARROW => KeyCode::UP,
        KVK_F1 => KeyCode::F1,
        KVK_F2 => KeyCode::F2,
        KVK_F3 => KeyCode::F3,
        KVK_F4 => KeyCode::F4,
        KVK_F5 => KeyCode::F5,
        KVK_F6 => KeyCode::F6,
        KVK_F7 => KeyCode::F7,
        KVK_F8 => KeyCode::F8,
        KVK_F9 => KeyCode::F9,
        KVK_F10 => KeyCode::F10,
        KVK_F11 => KeyCode::F11,
        KVK_F12 => KeyCode::F12,
        KVK_SHIFT => KeyCode::LEFT_SHIFT,
        KVK_RIGHT_SHIFT => KeyCode::RIGHT_SHIFT,
        KVK_CONTROL => KeyCode::LEFT_CTRL,
        KVK_RIGHT_CONTROL => KeyCode::RIGHT_CTRL,
        KVK_OPTION => KeyCode::LEFT_ALT,
        KVK_RIGHT_OPTION => KeyCode::RIGHT_ALT,
        KVK_COMMAND => KeyCode::LEFT_SUPER,
        KVK_RIGHT_COMMAND => KeyCode::RIGHT_SUPER,
        KVK_CAPS_LOCK => KeyCode::CAPS_LOCK,
        _ => return None,
    };

    Some(keycode)
}

/// The modifier flag driven by a modifier key, if `key` is one.
///
/// AppKit reports modifier keys with `NSEventType::FlagsChanged`, whether the
/// key went down is only known from the flag.
pub(crate) fn modifier_of_key(key: u16) -> Option<Modifiers> {
    match key {
        KVK_SHIFT | KVK_RIGHT_SHIFT => Some(Modifiers::SHIFT),
        KVK_CONTROL | KVK_RIGHT_CONTROL => Some(Modifiers::CTRL),
        KVK_OPTION | KVK_RIGHT_OPTION => Some(Modifiers::ALT),
        KVK_COMMAND | KVK_RIGHT_COMMAND => Some(Modifiers::SUPER),
        KVK_CAPS_LOCK => Some(Modifiers::CAPS_LOCK),
        _ => None,
    }
}

pub(crate) fn modifiers(flags: NSEventModifierFlags) -> Modifiers {
    let mut mods = Modifiers::empty();
    mods.set(Modifiers::SHIFT, flags.contains(NSEventModifierFlags::Shift));
    mods.set(Modifiers::CTRL, flags.contains(NSEventModifierFlags::Control));
    mods.set(Modifiers::ALT, flags.contains(NSEventModifierFlags::Option));
    mods.set(Modifiers::SUPER, flags.contains(NSEventModifierFlags::Command));
    mods.set(Modifiers::CAPS_LOCK, flags.contains(NSEventModifierFlags::CapsLock));
    mods
}

/// Whether a key event may trigger a menu key equivalent such as Cmd+Q.
pub(crate) fn is_menu_chord(mods: Modifiers) -> bool {
    mods.contains(Modifiers::SUPER)
}

/// AppKit numbers the right button 1 and the middle one 2.
pub(crate) fn button(number: isize) -> Option<Button> {
    match number {
        0 => Some(Button::LEFT),
        1 => Some(Button::RIGHT),
        2 => Some(Button::MIDDLE),
        n @ 3..=31 => Some(Button(n as u8)),
        _ => None,
    }
}

/// Buttons held according to `NSEvent::pressedMouseButtons`.
pub(crate) fn held_buttons(pressed: usize) -> ButtonMask {
    (0..5)
        .filter(|bit| pressed & (1 << bit) != 0)
        .filter_map(|bit| button(bit as isize))
        .fold(ButtonMask::empty(), |mask, button| mask | button.mask())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_keys() {
        assert_eq!(virtual_key_to_keycode(KVK_UP_ARROW), Some(KeyCode::UP));
        assert_eq!(virtual_key_to_keycode(KVK_DELETE), Some(KeyCode::BACKSPACE));
        assert_eq!(virtual_key_to_keycode(KVK_F3), Some(KeyCode::F3));
        assert_eq!(virtual_key_to_keycode(KVK_RIGHT_SHIFT), Some(KeyCode::RIGHT_SHIFT));
        // `kVK_ANSI_A` produces text.
        assert_eq!(virtual_key_to_keycode(0x00), None);
    }

    #[test]
    fn modifier_keys() {
        assert_eq!(modifier_of_key(KVK_RIGHT_OPTION), Some(Modifiers::ALT));
        assert_eq!(modifier_of_key(KVK_CAPS_LOCK), Some(Modifiers::CAPS_LOCK));
        assert_eq!(modifier_of_key(KVK_ESCAPE), None);

        let flags = NSEventModifierFlags::Shift | NSEventModifierFlags::Command;
        assert_eq!(modifiers(flags), Modifiers::SHIFT | Modifiers::SUPER);
    }

    #[test]
    fn command_chords_reach_the_menu() {
        assert!(is_menu_chord(modifiers(NSEventModifierFlags::Command)));
        assert!(is_menu_chord(Modifiers::SUPER | Modifiers::SHIFT));
        assert!(!is_menu_chord(modifiers(NSEventModifierFlags::Control)));
        assert!(!is_menu_chord(Modifiers::empty()));
    }

    #[test]
    fn buttons_are_swapped() {
        assert_eq!(button(1), Some(Button::RIGHT));
        assert_eq!(button(2), Some(Button::MIDDLE));
        assert_eq!(button(4), Some(Button::FORWARD));
        assert_eq!(held_buttons(0b110), ButtonMask::RIGHT | ButtonMask::MIDDLE);
    }
}
