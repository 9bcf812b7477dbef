//! Frame constants, the frame-kind discriminant, and the decoded frame type.

// ── Wire constants ────────────────────────────────────────────────────────────

/// Start-of-frame marker; the first byte of every frame and the anchor the
/// decoder hunts for when resynchronizing.
pub const START_BYTE: u8 = 0xAA;

/// Largest payload a single frame may carry, in bytes.
pub const MAX_PAYLOAD: usize = 256;

/// Framing bytes around the payload: start, kind, two length bytes, checksum.
pub const FRAME_OVERHEAD: usize = 5;

/// Size of the largest legal frame on the wire.
pub const MAX_FRAME: usize = MAX_PAYLOAD + FRAME_OVERHEAD;

// ── Frame kinds ───────────────────────────────────────────────────────────────

/// Frame kind discriminant; the second byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    /// 8-byte boot keyboard report, host → device.
    KeyboardReport = 0x01,
    /// 3-to-5-byte mouse report, host → device.
    MouseReport = 0x02,
    /// 1-byte keyboard LED bitfield, device → host.
    LedUpdate = 0x03,
    /// Human-readable UTF-8 status text, either direction.
    Status = 0x04,
    /// Reserved for delivery confirmation; never sent, tolerated on receive.
    Ack = 0x05,
}

impl TryFrom<u8> for FrameKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(FrameKind::KeyboardReport),
            0x02 => Ok(FrameKind::MouseReport),
            0x03 => Ok(FrameKind::LedUpdate),
            0x04 => Ok(FrameKind::Status),
            0x05 => Ok(FrameKind::Ack),
            _ => Err(()),
        }
    }
}

// ── Decoded frame ─────────────────────────────────────────────────────────────

/// One decoded frame.
///
/// The payload lives in a fixed buffer inside the struct, so receiving a
/// frame allocates nothing on the heap.  Use [`Frame::payload`] to see only
/// the bytes that were actually on the wire.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    kind: FrameKind,
    len: u16,
    data: [u8; MAX_PAYLOAD],
}

impl Frame {
    /// Builds a frame from a kind and payload slice.
    ///
    /// Returns `None` if the payload exceeds [`MAX_PAYLOAD`].
    pub fn new(kind: FrameKind, payload: &[u8]) -> Option<Self> {
        if payload.len() > MAX_PAYLOAD {
            return None;
        }
        let mut data = [0u8; MAX_PAYLOAD];
        data[..payload.len()].copy_from_slice(payload);
        Some(Self {
            kind,
            len: payload.len() as u16,
            data,
        })
    }

    /// Crate-internal constructor used by the decoder, which reads payload
    /// bytes straight into the fixed buffer.
    pub(crate) fn from_raw(kind: FrameKind, data: [u8; MAX_PAYLOAD], len: u16) -> Self {
        Self { kind, len, data }
    }

    /// The frame kind.
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// The payload bytes that were on the wire.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// Payload length in bytes.
    pub fn payload_len(&self) -> usize {
        self.len as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_kind_try_from_known_values() {
        // Arrange / Act / Assert
        assert_eq!(FrameKind::try_from(0x01), Ok(FrameKind::KeyboardReport));
        assert_eq!(FrameKind::try_from(0x02), Ok(FrameKind::MouseReport));
        assert_eq!(FrameKind::try_from(0x03), Ok(FrameKind::LedUpdate));
        assert_eq!(FrameKind::try_from(0x04), Ok(FrameKind::Status));
        assert_eq!(FrameKind::try_from(0x05), Ok(FrameKind::Ack));
    }

    #[test]
    fn test_frame_kind_try_from_rejects_unknown_values() {
        assert_eq!(FrameKind::try_from(0x00), Err(()));
        assert_eq!(FrameKind::try_from(0x06), Err(()));
        assert_eq!(FrameKind::try_from(0xAA), Err(()));
        assert_eq!(FrameKind::try_from(0xFF), Err(()));
    }

    #[test]
    fn test_frame_new_stores_payload() {
        // Arrange
        let payload = [0x01, 0x02, 0x03];

        // Act
        let frame = Frame::new(FrameKind::MouseReport, &payload).expect("payload fits");

        // Assert
        assert_eq!(frame.kind(), FrameKind::MouseReport);
        assert_eq!(frame.payload(), &payload);
        assert_eq!(frame.payload_len(), 3);
    }

    #[test]
    fn test_frame_new_accepts_empty_and_max_payloads() {
        let empty = Frame::new(FrameKind::Status, &[]).expect("empty payload is legal");
        assert_eq!(empty.payload(), &[] as &[u8]);

        let max = Frame::new(FrameKind::Status, &[0x55; MAX_PAYLOAD]).expect("max payload fits");
        assert_eq!(max.payload_len(), MAX_PAYLOAD);
    }

    #[test]
    fn test_frame_new_rejects_oversize_payload() {
        let too_big = vec![0u8; MAX_PAYLOAD + 1];
        assert!(Frame::new(FrameKind::Status, &too_big).is_none());
    }
}
