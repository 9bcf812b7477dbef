//! HID report descriptors for the composite keyboard-and-mouse function.
//!
//! Interface 0 is a boot keyboard, interface 1 is a mouse. The descriptors
//! describe exactly the report layouts in `hidlink_core::report`: the
//! 8-byte keyboard report with a 1-byte LED OUTPUT report coming back, and
//! the 5-byte mouse report whose fifth byte is AC Pan (horizontal scroll).

/// Interface index of the boot keyboard.
pub const KEYBOARD_INTERFACE: u8 = 0;

/// Interface index of the mouse.
pub const MOUSE_INTERFACE: u8 = 1;

/// `SET_REPORT` / `GET_REPORT` report type field for an OUTPUT report.
pub const REPORT_TYPE_OUTPUT: u8 = 2;

/// Boot keyboard report descriptor: 8 modifier bits, one reserved byte,
/// a 6-slot key code array, and 5 LED OUTPUT bits.
#[rustfmt::skip]
pub const KEYBOARD_REPORT_DESC: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (Left Ctrl)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Var, Abs)      -- modifier bits
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)            -- reserved byte
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x65, //   Logical Maximum (101)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x65, //   Usage Maximum (101)
    0x81, 0x00, //   Input (Data, Array)         -- key slots
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x91, 0x02, //   Output (Data, Var, Abs)     -- LED bits
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x03, //   Output (Constant)           -- LED padding
    0xC0,       // End Collection
];

/// Mouse report descriptor: 5 buttons, relative X/Y/wheel, and an AC Pan
/// byte for horizontal scroll.
#[rustfmt::skip]
pub const MOUSE_REPORT_DESC: &[u8] = &[
    0x05, 0x01,       // Usage Page (Generic Desktop)
    0x09, 0x02,       // Usage (Mouse)
    0xA1, 0x01,       // Collection (Application)
    0x09, 0x01,       //   Usage (Pointer)
    0xA1, 0x00,       //   Collection (Physical)
    0x05, 0x09,       //     Usage Page (Buttons)
    0x19, 0x01,       //     Usage Minimum (1)
    0x29, 0x05,       //     Usage Maximum (5)
    0x15, 0x00,       //     Logical Minimum (0)
    0x25, 0x01,       //     Logical Maximum (1)
    0x95, 0x05,       //     Report Count (5)
    0x75, 0x01,       //     Report Size (1)
    0x81, 0x02,       //     Input (Data, Var, Abs)  -- button bits
    0x95, 0x01,       //     Report Count (1)
    0x75, 0x03,       //     Report Size (3)
    0x81, 0x01,       //     Input (Constant)        -- button padding
    0x05, 0x01,       //     Usage Page (Generic Desktop)
    0x09, 0x30,       //     Usage (X)
    0x09, 0x31,       //     Usage (Y)
    0x09, 0x38,       //     Usage (Wheel)
    0x15, 0x81,       //     Logical Minimum (-127)
    0x25, 0x7F,       //     Logical Maximum (127)
    0x75, 0x08,       //     Report Size (8)
    0x95, 0x03,       //     Report Count (3)
    0x81, 0x06,       //     Input (Data, Var, Rel)  -- dx, dy, wheel
    0x05, 0x0C,       //     Usage Page (Consumer)
    0x0A, 0x38, 0x02, //     Usage (AC Pan)
    0x15, 0x81,       //     Logical Minimum (-127)
    0x25, 0x7F,       //     Logical Maximum (127)
    0x75, 0x08,       //     Report Size (8)
    0x95, 0x01,       //     Report Count (1)
    0x81, 0x06,       //     Input (Data, Var, Rel)  -- pan
    0xC0,             //   End Collection
    0xC0,             // End Collection
];

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_keyboard_descriptor_is_a_keyboard_application_collection() {
        assert_eq!(
            &KEYBOARD_REPORT_DESC[..6],
            &[0x05, 0x01, 0x09, 0x06, 0xA1, 0x01]
        );
        assert_eq!(KEYBOARD_REPORT_DESC.last(), Some(&0xC0));
    }

    #[test]
    fn test_keyboard_descriptor_declares_the_led_output_report() {
        // Arrange / Assert – LED usage page followed somewhere by a
        // variable OUTPUT item
        assert!(contains(KEYBOARD_REPORT_DESC, &[0x05, 0x08]));
        assert!(contains(KEYBOARD_REPORT_DESC, &[0x91, 0x02]));
    }

    #[test]
    fn test_mouse_descriptor_declares_five_buttons_and_pan() {
        assert!(contains(MOUSE_REPORT_DESC, &[0x19, 0x01, 0x29, 0x05]));
        assert!(contains(MOUSE_REPORT_DESC, &[0x0A, 0x38, 0x02]));
        assert_eq!(MOUSE_REPORT_DESC.last(), Some(&0xC0));
    }
}
