//! Wire codec for encoding and decoding frames on the serial link.
//!
//! Wire format:
//! ```text
//! [start:1][kind:1][len_lo:1][len_hi:1][payload:N][checksum:1]
//! ```
//! The payload length is little-endian. The checksum byte is the XOR of every
//! preceding frame byte, so a well-formed frame XORs to zero in its entirety.
//!
//! The decoder is stateless across calls: each [`recv_frame`] hunts for the
//! start byte, reads one frame, and returns. Corruption costs at most the
//! frame it landed in; the next call locks onto the next start byte.

use std::sync::Mutex;

use crate::link::{Deadline, LinkError, LinkRead, LinkWrite};
use crate::protocol::frame::{Frame, FrameKind, FRAME_OVERHEAD, MAX_FRAME, MAX_PAYLOAD, START_BYTE};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while sending or receiving frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Encode-side payload larger than [`MAX_PAYLOAD`]; a caller bug.
    #[error("payload too large: {len} bytes exceeds the {max}-byte maximum", max = MAX_PAYLOAD)]
    PayloadTooLarge { len: usize },

    /// The link accepted fewer bytes than the whole frame.
    #[error("short write: link accepted {written} of {expected} bytes")]
    TransportShort { written: usize, expected: usize },

    /// Link-level I/O failure underneath the codec.
    #[error("transport failure: {0}")]
    Transport(#[source] LinkError),

    /// The deadline expired before a start byte arrived. Benign when idle.
    #[error("timed out waiting for a frame")]
    Timeout,

    /// The stream went quiet mid-frame; the partial frame is discarded.
    #[error("truncated frame while reading {0}")]
    Truncated(&'static str),

    /// The header declares a payload longer than [`MAX_PAYLOAD`].
    #[error("invalid length: frame declares {declared} payload bytes")]
    LengthInvalid { declared: usize },

    /// XOR over the received frame was nonzero.
    #[error("checksum mismatch: calculated 0x{expected:02X}, received 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The kind byte is not a recognized discriminant. The frame body has
    /// already been consumed, so the stream stays aligned.
    #[error("unknown frame kind: 0x{0:02X}")]
    UnknownKind(u8),

    /// The peer is gone; no more frames will ever arrive.
    #[error("link closed")]
    LinkClosed,
}

/// Splits [`LinkError::Closed`] out of transport failures so receive loops
/// can tell "peer gone" apart from "frame lost".
fn map_link(err: LinkError) -> FrameError {
    match err {
        LinkError::Closed => FrameError::LinkClosed,
        other => FrameError::Transport(other),
    }
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Serializes one frame into a caller-provided buffer.
///
/// Returns the total number of bytes written (`payload.len() + 5`).
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLarge`] if the payload exceeds
/// [`MAX_PAYLOAD`]; the buffer is untouched in that case.
///
/// # Examples
///
/// ```rust
/// use hidlink_core::protocol::{encode_frame_into, FrameKind, MAX_FRAME};
///
/// let mut buf = [0u8; MAX_FRAME];
/// let n = encode_frame_into(FrameKind::LedUpdate, &[0x02], &mut buf).unwrap();
/// assert_eq!(&buf[..n], &[0xAA, 0x03, 0x01, 0x00, 0x02, 0xAA ^ 0x03 ^ 0x01 ^ 0x02]);
/// ```
pub fn encode_frame_into(
    kind: FrameKind,
    payload: &[u8],
    out: &mut [u8; MAX_FRAME],
) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge { len: payload.len() });
    }

    let len = payload.len() as u16;
    out[0] = START_BYTE;
    out[1] = kind as u8;
    out[2..4].copy_from_slice(&len.to_le_bytes());
    out[4..4 + payload.len()].copy_from_slice(payload);

    let mut checksum = 0u8;
    for byte in &out[..4 + payload.len()] {
        checksum ^= *byte;
    }
    out[4 + payload.len()] = checksum;

    Ok(payload.len() + FRAME_OVERHEAD)
}

/// Encodes one frame on the stack and hands it to the link as a single write.
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLarge`] for oversize payloads,
/// [`FrameError::TransportShort`] if the link accepted fewer bytes than the
/// whole frame, and [`FrameError::Transport`] / [`FrameError::LinkClosed`]
/// for link failures. Nothing is retried.
pub fn send_frame<W: LinkWrite>(
    link: &mut W,
    kind: FrameKind,
    payload: &[u8],
) -> Result<(), FrameError> {
    let mut buf = [0u8; MAX_FRAME];
    let total = encode_frame_into(kind, payload, &mut buf)?;

    let written = link.write(&buf[..total]).map_err(map_link)?;
    if written != total {
        return Err(FrameError::TransportShort {
            written,
            expected: total,
        });
    }
    Ok(())
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Reads exactly one frame from the link, returning within `deadline`.
///
/// The decode runs in phases: hunt for the start byte (discarding anything
/// else), read the 3-byte header, validate the declared length, read the
/// payload and checksum, verify the XOR, and finally map the kind byte.
/// A start byte inside a payload is just data; the decoder never re-hunts
/// once it has entered the header phase.
///
/// # Errors
///
/// - [`FrameError::Timeout`] – the deadline expired before a start byte
///   arrived; nothing was lost.
/// - [`FrameError::Truncated`] – the stream went quiet mid-frame.
/// - [`FrameError::LengthInvalid`] – the header declares more than
///   [`MAX_PAYLOAD`] bytes; no payload is consumed, so the following bytes
///   are re-examined by the next call.
/// - [`FrameError::ChecksumMismatch`] – the frame failed integrity.
/// - [`FrameError::UnknownKind`] – well-formed frame with an unrecognized
///   kind byte; the body was consumed and the stream stays aligned.
/// - [`FrameError::LinkClosed`] – the peer is gone.
///
/// # Examples
///
/// ```rust
/// use hidlink_core::link::{Deadline, MemoryLink};
/// use hidlink_core::protocol::{recv_frame, send_frame, FrameKind};
///
/// let (mut a, mut b) = MemoryLink::pair();
/// send_frame(&mut a, FrameKind::Status, b"ready").unwrap();
///
/// let frame = recv_frame(&mut b, Deadline::never()).unwrap();
/// assert_eq!(frame.kind(), FrameKind::Status);
/// assert_eq!(frame.payload(), b"ready");
/// ```
pub fn recv_frame<R: LinkRead>(link: &mut R, deadline: Deadline) -> Result<Frame, FrameError> {
    // Phase 1: hunt for the start byte, discarding anything else.
    let mut skipped = 0usize;
    let mut byte = [0u8; 1];
    loop {
        let n = link.read_until(&mut byte, deadline).map_err(map_link)?;
        if n == 0 {
            if skipped > 0 {
                debug!("discarded {skipped} bytes without finding a start byte");
            }
            return Err(FrameError::Timeout);
        }
        if byte[0] == START_BYTE {
            break;
        }
        skipped += 1;
    }
    if skipped > 0 {
        debug!("resynchronized after discarding {skipped} bytes");
    }

    // Phase 2: kind byte plus little-endian payload length.
    let mut header = [0u8; 3];
    let n = link.read_until(&mut header, deadline).map_err(map_link)?;
    if n < header.len() {
        return Err(FrameError::Truncated("header"));
    }
    let kind_byte = header[0];
    let declared = u16::from_le_bytes([header[1], header[2]]) as usize;

    // Phase 3: reject oversize lengths before consuming any payload, so the
    // bytes that would have been payload are re-examined as fresh stream.
    if declared > MAX_PAYLOAD {
        return Err(FrameError::LengthInvalid { declared });
    }

    // Phase 4: payload plus the trailing checksum byte.
    let mut data = [0u8; MAX_PAYLOAD];
    let n = link
        .read_until(&mut data[..declared], deadline)
        .map_err(map_link)?;
    if n < declared {
        return Err(FrameError::Truncated("payload"));
    }
    let mut checksum = [0u8; 1];
    let n = link.read_until(&mut checksum, deadline).map_err(map_link)?;
    if n < 1 {
        return Err(FrameError::Truncated("checksum"));
    }

    // Phase 5: XOR over the whole frame, checksum included, must be zero.
    let mut acc = START_BYTE ^ kind_byte ^ header[1] ^ header[2] ^ checksum[0];
    for b in &data[..declared] {
        acc ^= *b;
    }
    if acc != 0 {
        return Err(FrameError::ChecksumMismatch {
            expected: checksum[0] ^ acc,
            actual: checksum[0],
        });
    }

    // Phase 6: the body is consumed either way, so an unknown kind costs only
    // this frame.
    let kind =
        FrameKind::try_from(kind_byte).map_err(|()| FrameError::UnknownKind(kind_byte))?;
    Ok(Frame::from_raw(kind, data, declared as u16))
}

// ── Shared sender ─────────────────────────────────────────────────────────────

/// Serializes whole-frame writes from multiple producers onto one link.
///
/// The writer lock is held for the duration of a frame, so two frames sent
/// concurrently can never interleave their bytes on the wire.
pub struct FrameSender<W: LinkWrite> {
    writer: Mutex<W>,
}

impl<W: LinkWrite> FrameSender<W> {
    /// Wraps the write half of a link.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Encodes and writes one frame under the writer lock.
    ///
    /// # Errors
    ///
    /// Same as [`send_frame`].
    pub fn send(&self, kind: FrameKind, payload: &[u8]) -> Result<(), FrameError> {
        let mut writer = self.writer.lock().expect("lock poisoned");
        send_frame(&mut *writer, kind, payload)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
