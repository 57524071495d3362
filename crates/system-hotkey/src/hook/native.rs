//! Translation from the engine's key space to the native descriptors
//! registered with the OS.
//!
//! The key set is closed, so the table is a single exhaustive match and
//! translation cannot fail at runtime.

use global_hotkey::hotkey::{Code, HotKey, Modifiers as NativeModifiers};

use crate::{Hotkey, Key, Modifiers};

/// Convert a hotkey identity into the descriptor handed to the OS
/// registration API.
pub(crate) fn to_native(hotkey: Hotkey) -> HotKey {
    HotKey::new(native_modifiers(hotkey.modifiers), native_code(hotkey.key))
}

fn native_modifiers(modifiers: Modifiers) -> Option<NativeModifiers> {
    if modifiers.is_empty() {
        return None;
    }
    let mut native = NativeModifiers::empty();
    if modifiers.contains(Modifiers::CONTROL) {
        native |= NativeModifiers::CONTROL;
    }
    if modifiers.contains(Modifiers::SHIFT) {
        native |= NativeModifiers::SHIFT;
    }
    if modifiers.contains(Modifiers::ALT) {
        native |= NativeModifiers::ALT;
    }
    if modifiers.contains(Modifiers::SUPER) {
        native |= NativeModifiers::SUPER;
    }
    Some(native)
}

fn native_code(key: Key) -> Code {
    match key {
        Key::A => Code::KeyA,
        Key::B => Code::KeyB,
        Key::C => Code::KeyC,
        Key::D => Code::KeyD,
        Key::E => Code::KeyE,
        Key::F => Code::KeyF,
        Key::G => Code::KeyG,
        Key::H => Code::KeyH,
        Key::I => Code::KeyI,
        Key::J => Code::KeyJ,
        Key::K => Code::KeyK,
        Key::L => Code::KeyL,
        Key::M => Code::KeyM,
        Key::N => Code::KeyN,
        Key::O => Code::KeyO,
        Key::P => Code::KeyP,
        Key::Q => Code::KeyQ,
        Key::R => Code::KeyR,
        Key::S => Code::KeyS,
        Key::T => Code::KeyT,
        Key::U => Code::KeyU,
        Key::V => Code::KeyV,
        Key::W => Code::KeyW,
        Key::X => Code::KeyX,
        Key::Y => Code::KeyY,
        Key::Z => Code::KeyZ,
        Key::Num0 => Code::Digit0,
        Key::Num1 => Code::Digit1,
        Key::Num2 => Code::Digit2,
        Key::Num3 => Code::Digit3,
        Key::Num4 => Code::Digit4,
        Key::Num5 => Code::Digit5,
        Key::Num6 => Code::Digit6,
        Key::Num7 => Code::Digit7,
        Key::Num8 => Code::Digit8,
        Key::Num9 => Code::Digit9,
        Key::F1 => Code::F1,
        Key::F2 => Code::F2,
        Key::F3 => Code::F3,
        Key::F4 => Code::F4,
        Key::F5 => Code::F5,
        Key::F6 => Code::F6,
        Key::F7 => Code::F7,
        Key::F8 => Code::F8,
        Key::F9 => Code::F9,
        Key::F10 => Code::F10,
        Key::F11 => Code::F11,
        Key::F12 => Code::F12,
        Key::Up => Code::ArrowUp,
        Key::Down => Code::ArrowDown,
        Key::Left => Code::ArrowLeft,
        Key::Right => Code::ArrowRight,
        Key::Space => Code::Space,
        Key::Enter => Code::Enter,
        Key::Escape => Code::Escape,
        Key::Tab => Code::Tab,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_key_has_no_native_modifiers() {
        let native = to_native(Hotkey::new(Modifiers::empty(), Key::F9));
        assert_eq!(native.mods, NativeModifiers::empty());
        assert_eq!(native.key, Code::F9);
    }

    #[test]
    fn test_modifier_translation() {
        let native = to_native(Hotkey::new(
            Modifiers::CONTROL | Modifiers::SHIFT | Modifiers::SUPER,
            Key::A,
        ));
        assert_eq!(
            native.mods,
            NativeModifiers::CONTROL | NativeModifiers::SHIFT | NativeModifiers::SUPER
        );
        assert_eq!(native.key, Code::KeyA);
    }

    #[test]
    fn test_equal_identities_share_a_native_id() {
        let a = to_native(Hotkey::new(Modifiers::CONTROL | Modifiers::ALT, Key::Tab));
        let b = to_native(Hotkey::new(Modifiers::ALT | Modifiers::CONTROL, Key::Tab));
        assert_eq!(a.id(), b.id());
    }
}
