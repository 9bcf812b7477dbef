//! Protocol module containing the frame types and the wire codec.

pub mod codec;
pub mod frame;

pub use codec::{encode_frame_into, recv_frame, send_frame, FrameError, FrameSender};
pub use frame::*;
