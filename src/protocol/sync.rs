//! Frame synchronizer (C3): recovers frame boundaries on the byte stream
//! pulled from the receive ring after a dropped byte, a forced ring
//! flush, or a fresh boot mid-stream.
//!
//! Three states:
//! - `Searching` — no known frame boundary; scans up to
//!   [`SYNC_SEARCH_LIMIT`] bytes ahead for an offset whose next 4 bytes
//!   pass CRC8, then jumps straight there.
//! - `Synced` — trusts the ring's front 4 bytes to be a frame. A single
//!   CRC failure drops one byte and immediately demotes to
//!   `Recovering` rather than waiting for repeated failures.
//! - `Recovering` — same byte-at-a-time strategy as `Synced`, but
//!   requires [`SYNC_RECOVER_LIMIT`] consecutive valid frames before
//!   trusting the stream again; [`SYNC_INVALID_LIMIT`] consecutive
//!   invalid frames (counted from the first failure that demoted out
//!   of `Synced`) escalates further to `Searching`.

use crate::config::{PACKET_LEN, SYNC_FORCED_DISCARD, SYNC_INVALID_LIMIT, SYNC_RECOVER_LIMIT, SYNC_SEARCH_LIMIT};
use crate::protocol::packet::{crc_valid, decode, Packet};
use crate::protocol::ring::RxRing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub enum SyncState {
    Searching,
    Synced,
    Recovering,
}

/// Byte-stream-to-frame-boundary state machine sitting between the
/// receive ring and the protocol router.
pub struct FrameSync {
    state: SyncState,
    invalid_streak: u8,
    valid_streak: u8,
    forced_resyncs: u32,
}

impl FrameSync {
    pub const fn new() -> Self {
        Self {
            state: SyncState::Searching,
            invalid_streak: 0,
            valid_streak: 0,
            forced_resyncs: 0,
        }
    }

    #[inline]
    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// Number of times the synchronizer has discarded bytes after
    /// exhausting its search window or its recovery attempts.
    #[inline]
    pub const fn forced_resyncs(&self) -> u32 {
        self.forced_resyncs
    }

    /// Attempts to pull one packet out of `ring`. Returns `None` if
    /// there isn't yet enough buffered data to make progress, or if the
    /// bytes examined this call turned out not to frame a packet.
    pub fn poll(&mut self, ring: &mut RxRing) -> Option<Packet> {
        match self.state {
            SyncState::Searching => self.poll_searching(ring),
            SyncState::Synced => self.poll_trusting(ring, false),
            SyncState::Recovering => self.poll_trusting(ring, true),
        }
    }

    fn read_frame_at(ring: &RxRing, offset: usize) -> Option<[u8; PACKET_LEN]> {
        let mut frame = [0u8; PACKET_LEN];
        for (i, slot) in frame.iter_mut().enumerate() {
            *slot = ring.peek_at(offset + i)?;
        }
        Some(frame)
    }

    fn poll_searching(&mut self, ring: &mut RxRing) -> Option<Packet> {
        if ring.len() < PACKET_LEN {
            return None;
        }
        let max_offset = core::cmp::min(SYNC_SEARCH_LIMIT, ring.len() - PACKET_LEN);
        for offset in 0..=max_offset {
            if let Some(frame) = Self::read_frame_at(ring, offset) {
                if crc_valid(&frame) {
                    ring.consume(offset);
                    ring.consume(PACKET_LEN);
                    self.state = SyncState::Synced;
                    self.invalid_streak = 0;
                    return decode(&frame).ok();
                }
            }
        }
        if ring.len() >= SYNC_SEARCH_LIMIT {
            ring.consume(SYNC_FORCED_DISCARD);
            self.forced_resyncs = self.forced_resyncs.wrapping_add(1);
        }
        None
    }

    fn poll_trusting(&mut self, ring: &mut RxRing, recovering: bool) -> Option<Packet> {
        if ring.len() < PACKET_LEN {
            return None;
        }
        let frame = Self::read_frame_at(ring, 0)?;
        if crc_valid(&frame) {
            ring.consume(PACKET_LEN);
            self.invalid_streak = 0;
            let packet = decode(&frame).ok();
            if recovering {
                self.valid_streak += 1;
                if self.valid_streak >= SYNC_RECOVER_LIMIT {
                    self.state = SyncState::Synced;
                    self.valid_streak = 0;
                }
            }
            return packet;
        }

        ring.consume(1);
        self.valid_streak = 0;
        self.invalid_streak += 1;

        if !recovering {
            // A single CRC failure is enough to lose trust in SYNCED.
            self.state = SyncState::Recovering;
        }

        if self.invalid_streak >= SYNC_INVALID_LIMIT {
            self.invalid_streak = 0;
            self.forced_resyncs = self.forced_resyncs.wrapping_add(1);
            self.state = SyncState::Searching;
        }
        None
    }
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::packet::{encode, Kind};

    #[test]
    fn locks_onto_clean_stream_from_boot() {
        let mut sync = FrameSync::new();
        let mut ring = RxRing::new();
        assert_eq!(sync.state(), SyncState::Searching);

        ring.push(&encode(Kind::Button, 0x01, 0x00, 0x00));
        let packet = sync.poll(&mut ring).expect("frame should decode");
        assert_eq!(packet.kind, Kind::Button);
        assert_eq!(sync.state(), SyncState::Synced);
    }

    #[test]
    fn skips_garbage_prefix_while_searching() {
        let mut sync = FrameSync::new();
        let mut ring = RxRing::new();
        ring.push(&[0xFF, 0x00, 0x11]);
        ring.push(&encode(Kind::Power, 0x00, 0x05, 0x00));

        let packet = sync.poll(&mut ring).expect("frame should be found after garbage");
        assert_eq!(packet.kind, Kind::Power);
        assert_eq!(packet.data0, 0x05);
        assert_eq!(sync.state(), SyncState::Synced);
    }

    #[test]
    fn single_drop_demotes_immediately_then_resyncs() {
        let mut sync = FrameSync::new();
        let mut ring = RxRing::new();
        ring.push(&encode(Kind::Button, 0x00, 0x00, 0x00));
        sync.poll(&mut ring).unwrap();
        assert_eq!(sync.state(), SyncState::Synced);

        // A single corrupted frame must demote out of SYNCED right away.
        let mut corrupt = encode(Kind::Led, 0x00, 0x01, 0x00);
        corrupt[1] ^= 0xFF;
        ring.push(&corrupt);
        ring.push(&encode(Kind::Led, 0x00, 0x02, 0x00));

        assert!(sync.poll(&mut ring).is_none());
        assert_eq!(sync.state(), SyncState::Recovering);

        // Shed the rest of the corrupt frame one byte at a time, hunting
        // the next boundary.
        let mut found = None;
        for _ in 0..8 {
            if let Some(p) = sync.poll(&mut ring) {
                found = Some(p);
                break;
            }
        }
        let packet = found.expect("should eventually resync onto the next good frame");
        assert_eq!(packet.data0, 0x02);
    }

    #[test]
    fn repeated_corruption_demotes_to_recovering_then_searching() {
        let mut sync = FrameSync::new();
        let mut ring = RxRing::new();
        ring.push(&encode(Kind::Button, 0x00, 0x00, 0x00));
        sync.poll(&mut ring).unwrap();
        assert_eq!(sync.state(), SyncState::Synced);

        // Feed pure garbage far longer than the invalid-streak limit.
        ring.push(&[0x55; 32]);
        for _ in 0..32 {
            sync.poll(&mut ring);
        }
        assert_eq!(sync.state(), SyncState::Searching);
        assert!(sync.forced_resyncs() >= 1);
    }

    #[test]
    fn exhausting_search_window_forces_discard() {
        let mut sync = FrameSync::new();
        let mut ring = RxRing::new();
        ring.push(&[0x5A; SYNC_SEARCH_LIMIT + PACKET_LEN]);
        let before = sync.forced_resyncs();
        assert!(sync.poll(&mut ring).is_none());
        assert_eq!(sync.forced_resyncs(), before + 1);
    }
}
