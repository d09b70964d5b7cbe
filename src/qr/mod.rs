//! Multipart QR frame protocol
//!
//! A signing request too large for one optical capture is split into frames
//! and scanned as an animated QR sequence. This module owns the bit-exact
//! frame wire format and the reassembly engine, including tracking of
//! frames the scanner skipped so the caller can prompt a re-scan.
//!
//! # Wire format
//! - byte 0: multipart marker (`0x00`)
//! - bytes 1-2: total frame count, big-endian u16
//! - bytes 3-4: current frame index, big-endian u16
//! - remaining bytes: fragment payload
//!
//! Frame 0's fragment payload must not begin with the multipart marker or
//! the JSON opening brace; both first bytes are reserved for whole-payload
//! envelopes and indicate a malformed capture.

pub mod assembler;
pub mod frames;

pub use assembler::{AssemblyOutcome, FrameAssembler};
pub use frames::{encode_frames, MultipartFrame};

use thiserror::Error;

/// Reserved first byte marking a blob as a multipart fragment.
pub const MULTIPART_MARKER: u8 = 0x00;

/// Reserved first byte opening a JSON envelope.
pub const JSON_ENVELOPE_OPEN: u8 = 0x7b;

/// Length of the multipart frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 5;

/// Frame protocol errors; all are fatal to the current scan session.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FramingError {
    #[error("frame of {0} bytes is shorter than the frame header")]
    TruncatedFrame(usize),

    #[error("first byte {0:#04x} is not the multipart marker")]
    MissingMarker(u8),

    #[error("frame header declares zero frames")]
    ZeroFrameCount,

    #[error("frame index {index} out of range for {total} frames")]
    IndexOutOfRange { index: u16, total: u16 },

    #[error("frame count {got} does not match this session's count {expected}")]
    MismatchedFrameCount { got: u16, expected: u16 },

    #[error("reserved byte {0:#04x} at the start of frame 0's payload")]
    ReservedPayloadByte(u8),

    #[error("payload of {got} bytes exceeds the {max}-frame limit")]
    PayloadTooLarge { got: usize, max: usize },
}
