//! Translation of virtual keys, mouse flags and modifier state.

use windows_sys::Win32::UI::Input::KeyboardAndMouse::{self as kbm, VIRTUAL_KEY};

use crate::event::{ButtonMask, KeyCode, Modifiers};

/// Scancode of the right shift key. Both shift keys share one virtual key.
const RIGHT_SHIFT_SCANCODE: u32 = 0x36;

// Flags of the `wparam` of mouse messages.
const MK_LBUTTON: usize = 0x0001;
const MK_RBUTTON: usize = 0x0002;
const MK_MBUTTON: usize = 0x0010;
const MK_XBUTTON1: usize = 0x0020;
const MK_XBUTTON2: usize = 0x0040;

/// Virtual keys without a table entry or a character land above the last
/// Unicode scalar value.
const UNMAPPED_BASE: u32 = 0x11_0000;

/// Map a virtual key to the canonical key code.
///
/// `scancode` and `extended` come from the `lparam` of the key message and
/// tell the left and right variants of the modifiers apart. Keys outside the
/// table are resolved to their character through the keyboard layout.
pub(crate) fn virtual_key_to_keycode(
    vk: VIRTUAL_KEY,
    scancode: u32,
    extended: bool,
    shift: bool,
) -> KeyCode {
    table_keycode(vk, scancode, extended).unwrap_or_else(|| {
        let mapped = unsafe { kbm::MapVirtualKeyW(u32::from(vk), kbm::MAPVK_VK_TO_CHAR) };
        character_keycode(vk, mapped, shift)
    })
}

fn table_keycode(vk: VIRTUAL_KEY, scancode: u32, extended: bool) -> Option<KeyCode> {
    let keycode = match vk {
        kbm::VK_BACK => KeyCode::BACKSPACE,
        kbm::VK_TAB => KeyCode::TAB,
        kbm::VK_RETURN => KeyCode::ENTER,
        kbm::VK_ESCAPE => KeyCode::ESCAPE,
        kbm::VK_UP => KeyCode::UP,
        kbm::VK_DOWN => KeyCode::DOWN,
        kbm::VK_LEFT => KeyCode::LEFT,
        kbm::VK_RIGHT => KeyCode::RIGHT,
        kbm::VK_PRIOR => KeyCode::PAGE_UP,
        kbm::VK_NEXT => KeyCode::PAGE_DOWN,
        kbm::VK_HOME => KeyCode::HOME,
        kbm::VK_END => KeyCode::END,
        kbm::VK_INSERT => KeyCode::INSERT,
        kbm::VK_DELETE => KeyCode::DELETE,
        kbm::VK_CAPITAL => KeyCode::CAPS_LOCK,
        kbm::VK_SHIFT if scancode == RIGHT_SHIFT_SCANCODE => KeyCode::RIGHT_SHIFT,
        kbm::VK_SHIFT | kbm::VK_LSHIFT => KeyCode::LEFT_SHIFT,
        kbm::VK_RSHIFT => KeyCode::RIGHT_SHIFT,
        kbm::VK_CONTROL if extended => KeyCode::RIGHT_CTRL,
        kbm::VK_CONTROL | kbm::VK_LCONTROL => KeyCode::LEFT_CTRL,
        kbm::VK_RCONTROL => KeyCode::RIGHT_CTRL,
        kbm::VK_MENU if extended => KeyCode::RIGHT_ALT,
        kbm::VK_MENU | kbm::VK_LMENU => KeyCode::LEFT_ALT,
        kbm::VK_RMENU => KeyCode::RIGHT_ALT,
        kbm::VK_LWIN => KeyCode::LEFT_SUPER,
        kbm::VK_RWIN => KeyCode::RIGHT_SUPER,
        vk @ kbm::VK_F1..=kbm::VK_F12 => KeyCode(KeyCode::F1.0 + u32::from(vk - kbm::VK_F1)),
        _ => return None,
    };

    Some(keycode)
}

/// The code of a key outside the table, given the result of
/// `MapVirtualKeyW(vk, MAPVK_VK_TO_CHAR)`.
///
/// Letters are reported upper case by the layout and follow the shift state.
fn character_keycode(vk: VIRTUAL_KEY, mapped: u32, shift: bool) -> KeyCode {
    // The top bit marks dead keys.
    let character = char::from_u32(mapped & 0x7fff_ffff).filter(|c| !c.is_control());
    match character {
        Some(c) if shift => KeyCode::from(c),
        Some(c) => KeyCode::from(c.to_lowercase().next().unwrap_or(c)),
        None => KeyCode(UNMAPPED_BASE + u32::from(vk)),
    }
}

/// Buttons held according to the `wparam` of a mouse message.
pub(crate) fn held_buttons(wparam: usize) -> ButtonMask {
    let mut buttons = ButtonMask::empty();
    buttons.set(ButtonMask::LEFT, wparam & MK_LBUTTON != 0);
    buttons.set(ButtonMask::MIDDLE, wparam & MK_MBUTTON != 0);
    buttons.set(ButtonMask::RIGHT, wparam & MK_RBUTTON != 0);
    buttons.set(ButtonMask::BACK, wparam & MK_XBUTTON1 != 0);
    buttons.set(ButtonMask::FORWARD, wparam & MK_XBUTTON2 != 0);
    buttons
}

/// The modifiers currently held, from the keyboard state of the thread.
pub(crate) fn current_modifiers() -> Modifiers {
    let pressed = |vk: VIRTUAL_KEY| unsafe { kbm::GetKeyState(i32::from(vk)) } < 0;
    let toggled = |vk: VIRTUAL_KEY| unsafe { kbm::GetKeyState(i32::from(vk)) } & 1 != 0;

    let mut mods = Modifiers::empty();
    mods.set(Modifiers::SHIFT, pressed(kbm::VK_SHIFT));
    mods.set(Modifiers::CTRL, pressed(kbm::VK_CONTROL));
    mods.set(Modifiers::ALT, pressed(kbm::VK_MENU));
    mods.set(Modifiers::SUPER, pressed(kbm::VK_LWIN) || pressed(kbm::VK_RWIN));
    mods.set(Modifiers::CAPS_LOCK, toggled(kbm::VK_CAPITAL));
    mods
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_keys() {
        assert_eq!(virtual_key_to_keycode(kbm::VK_UP, 0x48, true, false), KeyCode::UP);
        assert_eq!(virtual_key_to_keycode(kbm::VK_ESCAPE, 0x01, false, false), KeyCode::ESCAPE);
        assert_eq!(virtual_key_to_keycode(kbm::VK_F5, 0x3f, false, false), KeyCode::F5);
        assert_eq!(virtual_key_to_keycode(kbm::VK_RETURN, 0x1c, false, false), KeyCode::ENTER);
    }

    #[test]
    fn sided_modifiers() {
        assert_eq!(virtual_key_to_keycode(kbm::VK_SHIFT, 0x2a, false, true), KeyCode::LEFT_SHIFT);
        assert_eq!(virtual_key_to_keycode(kbm::VK_SHIFT, 0x36, false, true), KeyCode::RIGHT_SHIFT);
        assert_eq!(virtual_key_to_keycode(kbm::VK_CONTROL, 0x1d, false, false), KeyCode::LEFT_CTRL);
        assert_eq!(virtual_key_to_keycode(kbm::VK_CONTROL, 0x1d, true, false), KeyCode::RIGHT_CTRL);
        assert_eq!(virtual_key_to_keycode(kbm::VK_MENU, 0x38, true, false), KeyCode::RIGHT_ALT);
    }

    #[test]
    fn letters_follow_shift() {
        assert_eq!(character_keycode(0x57, u32::from('W'), false), KeyCode::from('w'));
        assert_eq!(character_keycode(0x57, u32::from('W'), true), KeyCode::from('W'));
        assert_eq!(character_keycode(0x31, u32::from('1'), false), KeyCode::from('1'));
    }

    #[test]
    fn keys_outside_the_table_use_their_character() {
        assert_eq!(character_keycode(kbm::VK_NUMPAD1, u32::from('1'), false), KeyCode::from('1'));
        assert_eq!(character_keycode(kbm::VK_OEM_1, u32::from(';'), false), KeyCode::from(';'));
        // Dead keys carry the top bit.
        assert_eq!(character_keycode(kbm::VK_OEM_7, 0x8000_0027, false), KeyCode::from('\''));
    }

    #[test]
    fn keys_without_character_stay_distinct() {
        let num_lock = virtual_key_to_keycode(kbm::VK_NUMLOCK, 0x45, false, false);
        assert_ne!(num_lock, KeyCode::LEFT_SHIFT);
        assert!(!num_lock.is_reserved());
        assert_eq!(num_lock.to_char(), None);

        let scroll = virtual_key_to_keycode(kbm::VK_SCROLL, 0x46, false, false);
        assert_ne!(scroll, KeyCode::LEFT_CTRL);
        assert_ne!(scroll, num_lock);

        for vk in kbm::VK_F17..=kbm::VK_F24 {
            assert!(!virtual_key_to_keycode(vk, 0, false, false).is_reserved());
        }
    }

    #[test]
    fn mouse_flags() {
        assert_eq!(held_buttons(MK_LBUTTON | MK_RBUTTON), ButtonMask::LEFT | ButtonMask::RIGHT);
        assert_eq!(held_buttons(MK_XBUTTON2), ButtonMask::FORWARD);
        assert_eq!(held_buttons(0), ButtonMask::empty());
    }
}
