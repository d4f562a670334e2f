use super::ErrorStatus;

/// Counters kept by [`Protocol::read`](super::Protocol::read).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadStats {
    /// Frames decoded and dispatched
    pub frames_decoded: u64,
    /// Bytes belonging to dispatched frames
    pub bytes_consumed: u64,
    /// Bytes dropped while resynchronizing
    pub bytes_discarded: u64,
    /// Resynchronizations after a terminal error
    pub resyncs: u64,
    /// Frames dropped because the message was invalid
    pub invalid_messages: u64,
    /// Frames dropped because a framing layer rejected them
    pub protocol_errors: u64,
}

impl ReadStats {
    #[inline]
    pub(crate) fn record_frame(&mut self, len: usize) {
        self.frames_decoded += 1;
        self.bytes_consumed += to_u64(len);
    }

    #[inline]
    pub(crate) fn record_discard(&mut self, status: ErrorStatus, len: usize) {
        self.resyncs += 1;
        self.bytes_discarded += to_u64(len);
        match status {
            ErrorStatus::InvalidMsgData => self.invalid_messages += 1,
            ErrorStatus::ProtocolError | ErrorStatus::NotEnoughData => self.protocol_errors += 1,
            ErrorStatus::Success | ErrorStatus::BufferOverflow => {}
        }
    }

    /// Average dispatched frame length in bytes.
    #[must_use]
    pub fn avg_frame_len(&self) -> Option<u64> {
        if self.frames_decoded == 0 {
            return None;
        }
        Some(self.bytes_consumed / self.frames_decoded)
    }

    /// Clear all counters, returning their previous values.
    pub fn reset(&mut self) -> Self {
        std::mem::take(self)
    }
}

fn to_u64(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}
