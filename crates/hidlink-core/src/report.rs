//! USB HID report shapes carried over the wire.
//!
//! Both interfaces speak boot protocol: the keyboard report is always
//! 8 bytes, the mouse report is 3 to 5 bytes depending on whether the
//! source device reports wheel and pan axes.

// ── Report sizes ──────────────────────────────────────────────────────────────

/// Boot keyboard report length in bytes.
pub const KEYBOARD_REPORT_LEN: usize = 8;

/// Shortest legal mouse report: buttons, dx, dy.
pub const MOUSE_REPORT_MIN_LEN: usize = 3;

/// Longest mouse report: buttons, dx, dy, wheel, pan.
pub const MOUSE_REPORT_MAX_LEN: usize = 5;

// ── Modifier bitmask ──────────────────────────────────────────────────────────

/// Modifier bitmask; the first byte of a boot keyboard report.
///
/// Bit layout (USB HID boot protocol):
/// - Bit 0: Left Ctrl
/// - Bit 1: Left Shift
/// - Bit 2: Left Alt
/// - Bit 3: Left GUI
/// - Bit 4: Right Ctrl
/// - Bit 5: Right Shift
/// - Bit 6: Right Alt
/// - Bit 7: Right GUI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierFlags(pub u8);

impl ModifierFlags {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_GUI: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_GUI: u8 = 1 << 7;

    /// Both shift keys together; the operator command chord.
    pub const BOTH_SHIFTS: u8 = Self::LEFT_SHIFT | Self::RIGHT_SHIFT;

    /// Returns `true` if either Ctrl modifier is active.
    pub fn ctrl(&self) -> bool {
        self.0 & (Self::LEFT_CTRL | Self::RIGHT_CTRL) != 0
    }

    /// Returns `true` if either Shift modifier is active.
    pub fn shift(&self) -> bool {
        self.0 & (Self::LEFT_SHIFT | Self::RIGHT_SHIFT) != 0
    }

    /// Returns `true` if either Alt modifier is active.
    pub fn alt(&self) -> bool {
        self.0 & (Self::LEFT_ALT | Self::RIGHT_ALT) != 0
    }

    /// Returns `true` if either GUI (Win/Cmd/Super) modifier is active.
    pub fn gui(&self) -> bool {
        self.0 & (Self::LEFT_GUI | Self::RIGHT_GUI) != 0
    }

    /// Returns `true` when exactly both shifts are held and nothing else.
    pub fn is_both_shifts_only(&self) -> bool {
        self.0 == Self::BOTH_SHIFTS
    }
}

// ── Keyboard report ───────────────────────────────────────────────────────────

/// Boot-protocol keyboard report: modifier byte, reserved byte, six key
/// slots. Exactly [`KEYBOARD_REPORT_LEN`] bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardReport {
    /// Held modifier keys.
    pub modifiers: ModifierFlags,
    /// Reserved byte; always zero in boot protocol.
    pub reserved: u8,
    /// Up to six concurrently held key usage IDs; 0x00 marks an empty slot.
    pub keys: [u8; 6],
}

impl KeyboardReport {
    /// Parses an exactly-8-byte payload; `None` for any other length.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KEYBOARD_REPORT_LEN {
            return None;
        }
        let mut keys = [0u8; 6];
        keys.copy_from_slice(&bytes[2..8]);
        Some(Self {
            modifiers: ModifierFlags(bytes[0]),
            reserved: bytes[1],
            keys,
        })
    }

    /// Serializes back to the 8-byte wire shape.
    pub fn as_bytes(&self) -> [u8; KEYBOARD_REPORT_LEN] {
        let mut out = [0u8; KEYBOARD_REPORT_LEN];
        out[0] = self.modifiers.0;
        out[1] = self.reserved;
        out[2..8].copy_from_slice(&self.keys);
        out
    }

    /// True when no modifier and no key is held; the all-clear report every
    /// keyboard sends on release.
    pub fn is_empty(&self) -> bool {
        self.modifiers.0 == 0 && self.keys.iter().all(|k| *k == 0)
    }

    /// The first pressed key slot, 0x00 when none.
    pub fn first_key(&self) -> u8 {
        self.keys[0]
    }
}

// ── Mouse report ──────────────────────────────────────────────────────────────

/// Mouse report: buttons, relative X/Y movement, wheel, and horizontal pan.
///
/// On the wire the report is [`MOUSE_REPORT_MIN_LEN`] to
/// [`MOUSE_REPORT_MAX_LEN`] bytes; wheel and pan are zero when the source
/// device omits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseReport {
    /// Button bitmask: bit 0 left, bit 1 right, bit 2 middle.
    pub buttons: u8,
    /// Relative X movement since the previous report.
    pub dx: i8,
    /// Relative Y movement since the previous report.
    pub dy: i8,
    /// Vertical wheel detents; positive is away from the user.
    pub wheel: i8,
    /// Horizontal pan detents; positive is right.
    pub pan: i8,
}

impl MouseReport {
    /// Parses a 3-to-5-byte payload, treating missing wheel/pan bytes as
    /// zero. `None` for lengths outside that range.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        if !(MOUSE_REPORT_MIN_LEN..=MOUSE_REPORT_MAX_LEN).contains(&payload.len()) {
            return None;
        }
        let mut padded = [0u8; MOUSE_REPORT_MAX_LEN];
        padded[..payload.len()].copy_from_slice(payload);
        Some(Self {
            buttons: padded[0],
            dx: padded[1] as i8,
            dy: padded[2] as i8,
            wheel: padded[3] as i8,
            pan: padded[4] as i8,
        })
    }

    /// Serializes to the full 5-byte wire shape.
    pub fn as_bytes(&self) -> [u8; MOUSE_REPORT_MAX_LEN] {
        [
            self.buttons,
            self.dx as u8,
            self.dy as u8,
            self.wheel as u8,
            self.pan as u8,
        ]
    }
}

// ── LED state ─────────────────────────────────────────────────────────────────

/// Keyboard LED bitfield carried by LED update frames and SET_REPORT
/// requests from the PC.
///
/// Bit layout:
/// - Bit 0: Num Lock
/// - Bit 1: Caps Lock
/// - Bit 2: Scroll Lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedState(pub u8);

impl LedState {
    pub const NUM_LOCK: u8 = 1 << 0;
    pub const CAPS_LOCK: u8 = 1 << 1;
    pub const SCROLL_LOCK: u8 = 1 << 2;

    /// Returns `true` if the Num Lock LED is lit.
    pub fn num_lock(&self) -> bool {
        self.0 & Self::NUM_LOCK != 0
    }

    /// Returns `true` if the Caps Lock LED is lit.
    pub fn caps_lock(&self) -> bool {
        self.0 & Self::CAPS_LOCK != 0
    }

    /// Returns `true` if the Scroll Lock LED is lit.
    pub fn scroll_lock(&self) -> bool {
        self.0 & Self::SCROLL_LOCK != 0
    }
}

// ── Key usage IDs ─────────────────────────────────────────────────────────────

/// HID usage IDs (page 0x07) for the keys the device-side command filter
/// recognizes.
pub mod keys {
    pub const ENTER: u8 = 0x28;
    pub const ESCAPE: u8 = 0x29;
    pub const SPACE: u8 = 0x2C;
    pub const EQUAL: u8 = 0x2E;
    pub const F12: u8 = 0x45;
    pub const PRINT_SCREEN: u8 = 0x46;
    pub const INSERT: u8 = 0x49;
    pub const HOME: u8 = 0x4A;
    pub const DELETE: u8 = 0x4C;
    pub const END: u8 = 0x4D;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── KeyboardReport ────────────────────────────────────────────────────────

    #[test]
    fn test_keyboard_report_parses_eight_bytes() {
        // Arrange – left shift + 'a'
        let bytes = [0x02, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00];

        // Act
        let report = KeyboardReport::from_bytes(&bytes).expect("valid length");

        // Assert
        assert_eq!(report.modifiers, ModifierFlags(0x02));
        assert_eq!(report.reserved, 0x00);
        assert_eq!(report.first_key(), 0x04);
        assert_eq!(report.as_bytes(), bytes);
    }

    #[test]
    fn test_keyboard_report_rejects_wrong_lengths() {
        assert!(KeyboardReport::from_bytes(&[0u8; 7]).is_none());
        assert!(KeyboardReport::from_bytes(&[0u8; 9]).is_none());
        assert!(KeyboardReport::from_bytes(&[]).is_none());
    }

    #[test]
    fn test_keyboard_report_is_empty_ignores_reserved_byte() {
        // Arrange
        let empty = KeyboardReport::from_bytes(&[0, 0x01, 0, 0, 0, 0, 0, 0]).expect("valid");
        let held = KeyboardReport::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 0x1D]).expect("valid");

        // Assert – reserved is not key state; a key in the last slot is
        assert!(empty.is_empty());
        assert!(!held.is_empty());
    }

    // ── ModifierFlags ─────────────────────────────────────────────────────────

    #[test]
    fn test_modifier_predicates_cover_both_sides() {
        assert!(ModifierFlags(ModifierFlags::LEFT_CTRL).ctrl());
        assert!(ModifierFlags(ModifierFlags::RIGHT_CTRL).ctrl());
        assert!(ModifierFlags(ModifierFlags::LEFT_SHIFT).shift());
        assert!(ModifierFlags(ModifierFlags::RIGHT_SHIFT).shift());
        assert!(ModifierFlags(ModifierFlags::LEFT_ALT).alt());
        assert!(ModifierFlags(ModifierFlags::RIGHT_ALT).alt());
        assert!(ModifierFlags(ModifierFlags::LEFT_GUI).gui());
        assert!(ModifierFlags(ModifierFlags::RIGHT_GUI).gui());
        assert!(!ModifierFlags(0).ctrl());
    }

    #[test]
    fn test_both_shifts_chord_detection_is_exact() {
        // Exactly both shifts
        assert!(ModifierFlags(0x22).is_both_shifts_only());
        // One shift, or both shifts plus ctrl, is not the chord
        assert!(!ModifierFlags(ModifierFlags::LEFT_SHIFT).is_both_shifts_only());
        assert!(!ModifierFlags(0x22 | ModifierFlags::LEFT_CTRL).is_both_shifts_only());
        assert!(!ModifierFlags(0).is_both_shifts_only());
    }

    // ── MouseReport ───────────────────────────────────────────────────────────

    #[test]
    fn test_mouse_report_pads_short_payloads_with_zero() {
        // Arrange – left button, dx +5, dy -3, no wheel bytes
        let report = MouseReport::from_payload(&[0x01, 0x05, 0xFD]).expect("valid length");

        // Assert
        assert_eq!(report.buttons, 0x01);
        assert_eq!(report.dx, 5);
        assert_eq!(report.dy, -3);
        assert_eq!(report.wheel, 0);
        assert_eq!(report.pan, 0);
    }

    #[test]
    fn test_mouse_report_keeps_wheel_and_pan_when_present() {
        let report =
            MouseReport::from_payload(&[0x00, 0x00, 0x00, 0xFF, 0x02]).expect("valid length");

        assert_eq!(report.wheel, -1);
        assert_eq!(report.pan, 2);
        assert_eq!(report.as_bytes(), [0x00, 0x00, 0x00, 0xFF, 0x02]);
    }

    #[test]
    fn test_mouse_report_rejects_out_of_range_lengths() {
        assert!(MouseReport::from_payload(&[0x01, 0x00]).is_none());
        assert!(MouseReport::from_payload(&[0u8; 6]).is_none());
        assert!(MouseReport::from_payload(&[]).is_none());
    }

    // ── LedState ──────────────────────────────────────────────────────────────

    #[test]
    fn test_led_state_predicates() {
        let state = LedState(LedState::NUM_LOCK | LedState::SCROLL_LOCK);

        assert!(state.num_lock());
        assert!(!state.caps_lock());
        assert!(state.scroll_lock());
        assert!(!LedState::default().num_lock());
    }
}
