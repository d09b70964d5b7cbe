//! Frame wire format
//!
//! Parsing and encoding of individual multipart frames. Assembly of a frame
//! sequence lives in [`super::assembler`].

use super::{FramingError, FRAME_HEADER_LEN, JSON_ENVELOPE_OPEN, MULTIPART_MARKER};

/// One optically captured fragment of a multipart payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFrame {
    /// 0-based frame index
    pub index: u16,
    /// Total number of frames in the sequence
    pub total: u16,
    /// Fragment payload
    pub payload: Vec<u8>,
}

impl MultipartFrame {
    pub fn new(index: u16, total: u16, payload: Vec<u8>) -> Self {
        Self { index, total, payload }
    }

    /// Parse a raw scanned blob as a multipart frame.
    pub fn parse(raw: &[u8]) -> Result<Self, FramingError> {
        if raw.len() < FRAME_HEADER_LEN {
            return Err(FramingError::TruncatedFrame(raw.len()));
        }
        if raw[0] != MULTIPART_MARKER {
            return Err(FramingError::MissingMarker(raw[0]));
        }

        let total = u16::from_be_bytes([raw[1], raw[2]]);
        let index = u16::from_be_bytes([raw[3], raw[4]]);

        if total == 0 {
            return Err(FramingError::ZeroFrameCount);
        }
        if index >= total {
            return Err(FramingError::IndexOutOfRange { index, total });
        }

        Ok(Self {
            index,
            total,
            payload: raw[FRAME_HEADER_LEN..].to_vec(),
        })
    }

    /// Wire header for a frame with the given counters.
    pub fn header(total: u16, index: u16) -> [u8; FRAME_HEADER_LEN] {
        let total = total.to_be_bytes();
        let index = index.to_be_bytes();
        [MULTIPART_MARKER, total[0], total[1], index[0], index[1]]
    }

    /// Encode this frame to its wire form.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FRAME_HEADER_LEN + self.payload.len());
        out.extend_from_slice(&Self::header(self.total, self.index));
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Split a payload into wire-encoded multipart frames for display.
///
/// The payload's first byte lands at the start of frame 0, so the reserved
/// first bytes are rejected here with the same error the receiver would
/// raise.
pub fn encode_frames(payload: &[u8], fragment_size: usize) -> Result<Vec<Vec<u8>>, FramingError> {
    let first = *payload.first().ok_or(FramingError::TruncatedFrame(0))?;
    if first == MULTIPART_MARKER || first == JSON_ENVELOPE_OPEN {
        return Err(FramingError::ReservedPayloadByte(first));
    }

    let fragment_size = fragment_size.max(1);
    let total = payload.len().div_ceil(fragment_size);
    if total > u16::MAX as usize {
        return Err(FramingError::PayloadTooLarge {
            got: payload.len(),
            max: u16::MAX as usize,
        });
    }

    let frames = payload
        .chunks(fragment_size)
        .enumerate()
        .map(|(i, chunk)| {
            MultipartFrame::new(i as u16, total as u16, chunk.to_vec()).encode()
        })
        .collect();
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        let frame = MultipartFrame::new(3, 7, vec![0xAA, 0xBB]);
        let parsed = MultipartFrame::parse(&frame.encode()).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn header_layout_is_big_endian() {
        let raw = MultipartFrame::new(0x0102, 0x0304, vec![0x55]).encode();
        assert_eq!(raw, vec![0x00, 0x03, 0x04, 0x01, 0x02, 0x55]);
    }

    #[test]
    fn truncated_frame_rejected() {
        assert_eq!(
            MultipartFrame::parse(&[0x00, 0x00, 0x01]),
            Err(FramingError::TruncatedFrame(3))
        );
    }

    #[test]
    fn missing_marker_rejected() {
        assert_eq!(
            MultipartFrame::parse(&[0x53, 0x00, 0x01, 0x00, 0x00]),
            Err(FramingError::MissingMarker(0x53))
        );
    }

    #[test]
    fn zero_count_and_bad_index_rejected() {
        assert_eq!(
            MultipartFrame::parse(&[0x00, 0x00, 0x00, 0x00, 0x00]),
            Err(FramingError::ZeroFrameCount)
        );
        assert_eq!(
            MultipartFrame::parse(&[0x00, 0x00, 0x02, 0x00, 0x02]),
            Err(FramingError::IndexOutOfRange { index: 2, total: 2 })
        );
    }

    #[test]
    fn encode_frames_splits_and_rejoins() {
        let payload: Vec<u8> = std::iter::once(0x53)
            .chain((1..100).map(|i| i as u8))
            .collect();
        let frames = encode_frames(&payload, 16).unwrap();
        assert_eq!(frames.len(), 7);

        let mut rejoined = Vec::new();
        for raw in &frames {
            rejoined.extend_from_slice(&MultipartFrame::parse(raw).unwrap().payload);
        }
        assert_eq!(rejoined, payload);
    }

    #[test]
    fn encode_frames_rejects_reserved_first_byte() {
        assert_eq!(
            encode_frames(&[0x00, 0x01], 8),
            Err(FramingError::ReservedPayloadByte(0x00))
        );
        assert_eq!(
            encode_frames(&[0x7b, 0x7d], 8),
            Err(FramingError::ReservedPayloadByte(0x7b))
        );
    }
}
