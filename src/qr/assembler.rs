//! Frame reassembly engine
//!
//! Accumulates scanned frames into one contiguous blob. Arrival order does
//! not matter; concatenation is keyed by frame index. Frames the scanner
//! jumped over are tracked so the caller can prompt for a re-scan instead
//! of silently proceeding with partial data.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{FramingError, JSON_ENVELOPE_OPEN, MultipartFrame, MULTIPART_MARKER};

/// Result of submitting one frame to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyOutcome {
    /// The session is still missing frames.
    NeedMoreFrames { received: usize, total: usize },
    /// Every frame arrived; the payload was reassembled into one blob,
    /// re-wrapped with a synthetic frame-0 header.
    Completed(Vec<u8>),
}

/// Reassembly state for one scan session.
///
/// Lives from the first frame to completion or [`reset`](Self::reset);
/// a single logical writer submits frames serially.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    total: Option<u16>,
    latest: Option<u16>,
    frames: BTreeMap<u16, Vec<u8>>,
    missed: BTreeSet<u16>,
    complete: bool,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit one scanned frame.
    ///
    /// Rejection leaves the session state untouched. Completion fires at
    /// most once per session; once complete, further submissions are
    /// reported as [`AssemblyOutcome::NeedMoreFrames`] without re-running
    /// the completion transition.
    pub fn submit_frame(&mut self, frame: MultipartFrame) -> Result<AssemblyOutcome, FramingError> {
        if self.complete {
            let total = self.total.unwrap_or(0) as usize;
            return Ok(AssemblyOutcome::NeedMoreFrames {
                received: self.frames.len(),
                total,
            });
        }

        if let Some(expected) = self.total {
            if frame.total != expected {
                return Err(FramingError::MismatchedFrameCount {
                    got: frame.total,
                    expected,
                });
            }
        }
        if frame.total == 0 {
            return Err(FramingError::ZeroFrameCount);
        }
        if frame.index >= frame.total {
            return Err(FramingError::IndexOutOfRange {
                index: frame.index,
                total: frame.total,
            });
        }

        // Frame 0 carries the start of the payload envelope; the reserved
        // single-capture prefixes must not appear there.
        if frame.index == 0 {
            if let Some(&first) = frame.payload.first() {
                if first == MULTIPART_MARKER || first == JSON_ENVELOPE_OPEN {
                    return Err(FramingError::ReservedPayloadByte(first));
                }
            }
        }

        let total = *self.total.get_or_insert(frame.total);
        let index = frame.index;
        let already_seen = self.frames.contains_key(&index);

        self.frames.insert(index, frame.payload);
        self.missed.remove(&index);

        // Record every index the scanner jumped over between the previous
        // frame and this one, wrapping modulo the frame count. Re-submitting
        // an already-seen frame is a no-op for missed tracking.
        if !already_seen {
            if let Some(latest) = self.latest {
                let span = (u32::from(index) + u32::from(total) - u32::from(latest) - 1)
                    % u32::from(total);
                for step in 1..=span {
                    let skipped = ((u32::from(latest) + step) % u32::from(total)) as u16;
                    if !self.frames.contains_key(&skipped) {
                        self.missed.insert(skipped);
                    }
                }
            }
        }
        self.latest = Some(index);

        debug!(
            index,
            received = self.frames.len(),
            total,
            missed = self.missed.len(),
            "frame received"
        );

        if self.frames.len() == total as usize {
            self.complete = true;
            return Ok(AssemblyOutcome::Completed(self.reassemble(total, index)));
        }

        Ok(AssemblyOutcome::NeedMoreFrames {
            received: self.frames.len(),
            total: total as usize,
        })
    }

    /// Concatenate fragments in ascending index order, re-wrapped with a
    /// synthetic frame-0 header so the blob can be decoded through the
    /// same path as a single-frame capture.
    fn reassemble(&self, total: u16, current: u16) -> Vec<u8> {
        let body_len: usize = self.frames.values().map(Vec::len).sum();
        let mut blob = Vec::with_capacity(super::FRAME_HEADER_LEN + body_len);
        blob.extend_from_slice(&MultipartFrame::header(total, current));
        for payload in self.frames.values() {
            blob.extend_from_slice(payload);
        }
        blob
    }

    /// Frame indexes the scanner skipped that have not been filled yet.
    pub fn missed_frames(&self) -> impl Iterator<Item = u16> + '_ {
        self.missed.iter().copied()
    }

    /// Number of distinct frames received so far.
    pub fn received(&self) -> usize {
        self.frames.len()
    }

    /// Total frame count, once the first frame has fixed it.
    pub fn total(&self) -> Option<u16> {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Clear all session state back to its initial empty values. Safe to
    /// call at any time, including mid-session.
    pub fn reset(&mut self) {
        self.total = None;
        self.latest = None;
        self.frames.clear();
        self.missed.clear();
        self.complete = false;
    }
}
