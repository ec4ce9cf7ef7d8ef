//! Host keyboard to CHIP-8 keypad mapping
//!
//! The 4x4 block under `1`..`4` stands in for the hex pad:
//!
//! ```text
//! 1 2 3 4      1 2 3 C
//! Q W E R  ->  4 5 6 D
//! A S D F      7 8 9 E
//! Z X C V      A 0 B F
//! ```

use minifb::Key;

/// Host key for each keypad index 0x0..=0xF
pub const KEYPAD: [Key; 16] = [
    Key::X,    // 0
    Key::Key1, // 1
    Key::Key2, // 2
    Key::Key3, // 3
    Key::Q,    // 4
    Key::W,    // 5
    Key::E,    // 6
    Key::A,    // 7
    Key::S,    // 8
    Key::D,    // 9
    Key::Z,    // A
    Key::C,    // B
    Key::Key4, // C
    Key::R,    // D
    Key::F,    // E
    Key::V,    // F
];

pub fn keypad_index(key: Key) -> Option<u8> {
    KEYPAD.iter().position(|&k| k == key).map(|i| i as u8)
}

/// Keypad state from the keys currently held. Empty while Ctrl is down so
/// hotkeys like Ctrl+S do not also press a pad key.
pub fn keypad_state(held: &[Key]) -> [bool; 16] {
    let mut pressed = [false; 16];
    if ctrl_held(held) {
        return pressed;
    }
    for &key in held {
        if let Some(index) = keypad_index(key) {
            pressed[index as usize] = true;
        }
    }
    pressed
}

pub fn ctrl_held(held: &[Key]) -> bool {
    held.iter()
        .any(|&k| k == Key::LeftCtrl || k == Key::RightCtrl)
}

/// Label of the host key for a pad index, for the help overlay
pub fn key_label(index: u8) -> &'static str {
    const LABELS: [&str; 16] = [
        "X", "1", "2", "3", "Q", "W", "E", "A", "S", "D", "Z", "C", "4", "R", "F", "V",
    ];
    LABELS[(index & 0xF) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypad_layout() {
        assert_eq!(keypad_index(Key::Key1), Some(0x1));
        assert_eq!(keypad_index(Key::Key4), Some(0xC));
        assert_eq!(keypad_index(Key::R), Some(0xD));
        assert_eq!(keypad_index(Key::X), Some(0x0));
        assert_eq!(keypad_index(Key::Z), Some(0xA));
        assert_eq!(keypad_index(Key::V), Some(0xF));
        assert_eq!(keypad_index(Key::P), None);
    }

    #[test]
    fn test_every_pad_key_mapped_once() {
        for index in 0..16u8 {
            assert_eq!(keypad_index(KEYPAD[index as usize]), Some(index));
        }
    }

    #[test]
    fn test_keypad_state() {
        let pressed = keypad_state(&[Key::W, Key::V, Key::Space]);
        assert!(pressed[0x5]);
        assert!(pressed[0xF]);
        assert_eq!(pressed.iter().filter(|&&p| p).count(), 2);
    }

    #[test]
    fn test_ctrl_suppresses_keypad() {
        let pressed = keypad_state(&[Key::LeftCtrl, Key::S]);
        assert!(pressed.iter().all(|&p| !p));
    }

    #[test]
    fn test_key_labels_match_table() {
        assert_eq!(key_label(0x0), "X");
        assert_eq!(key_label(0xC), "4");
        assert_eq!(key_label(0xF), "V");
    }
}
