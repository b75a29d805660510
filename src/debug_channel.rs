//! Debug channel (C10): level/category-filtered logging with a bounded
//! local ring plus the `DEBUG_CODE`/`DEBUG_TEXT` wire encodings used to
//! forward records to the host.

use crate::config::{DEBUG_MESSAGE_MAX_LEN, DEBUG_RING_LEN, DEBUG_TEXT_MAX_CHUNKS};
use crate::protocol::packet::{encode, Kind};
use heapless::{String, Vec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub enum Level {
    Off,
    Error,
    Info,
    Verbose,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Category: u8 {
        const PROTOCOL = 0b0001;
        const LED      = 0b0010;
        const POWER    = 0b0100;
        const DISPLAY  = 0b1000;
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub struct DebugRecord {
    pub timestamp_ms: u32,
    pub level: Level,
    pub category: Category,
    pub message: String<DEBUG_MESSAGE_MAX_LEN>,
}

/// Per-level and per-category message counters, kept only while
/// `enable_statistics` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub by_level: [u32; 4],
    pub by_category: [u32; 4],
}

/// Filtered, ring-bounded log sink. `level` is the maximum verbosity
/// let through; `categories` is the set of categories let through.
pub struct DebugChannel {
    level: Level,
    categories: Category,
    ring: Vec<DebugRecord, DEBUG_RING_LEN>,
    enable_statistics: bool,
    stats: Stats,
}

impl DebugChannel {
    pub const fn new() -> Self {
        Self {
            level: Level::Info,
            categories: Category::all(),
            ring: Vec::new(),
            enable_statistics: false,
            stats: Stats {
                by_level: [0; 4],
                by_category: [0; 4],
            },
        }
    }

    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    pub fn set_categories(&mut self, categories: Category) {
        self.categories = categories;
    }

    pub fn set_statistics_enabled(&mut self, enabled: bool) {
        self.enable_statistics = enabled;
    }

    #[inline]
    pub const fn stats(&self) -> Stats {
        self.stats
    }

    #[inline]
    pub fn ring(&self) -> &[DebugRecord] {
        &self.ring
    }

    /// Records `message` if it passes the level and category filters.
    /// Returns `true` if it was kept. The ring drops its oldest entry
    /// to make room rather than rejecting new records.
    pub fn log(&mut self, level: Level, category: Category, message: &str, timestamp_ms: u32) -> bool {
        if level == Level::Off || level > self.level {
            return false;
        }
        if !self.categories.intersects(category) {
            return false;
        }

        if self.enable_statistics {
            self.stats.by_level[level as usize] += 1;
            for (idx, bit) in [
                Category::PROTOCOL,
                Category::LED,
                Category::POWER,
                Category::DISPLAY,
            ]
            .into_iter()
            .enumerate()
            {
                if category.contains(bit) {
                    self.stats.by_category[idx] += 1;
                }
            }
        }

        let mut text = String::new();
        let _ = text.push_str(message);
        let record = DebugRecord {
            timestamp_ms,
            level,
            category,
            message: text,
        };
        if self.ring.is_full() {
            self.ring.remove(0);
        }
        let _ = self.ring.push(record);
        true
    }
}

impl Default for DebugChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes a numeric `DEBUG_CODE` as a single little-endian `TYPE_DEBUG_CODE`
/// frame.
pub fn encode_debug_code(code: u16) -> [u8; 4] {
    let [lo, hi] = code.to_le_bytes();
    encode(Kind::DebugCode, 0x00, lo, hi)
}

const DEBUG_TEXT_FIRST_FLAG: u8 = 0x10;
const DEBUG_TEXT_IDX_MASK: u8 = 0x0F;

/// Splits `message` into `TYPE_DEBUG_TEXT` frames, 2 bytes of payload
/// per frame. `sub_flags` bit 4 marks the first chunk; bits 0-3 carry
/// the chunk index modulo 16 so the host can detect a dropped frame.
/// Truncates to [`DEBUG_MESSAGE_MAX_LEN`] bytes and pads the final
/// chunk's missing byte with `0x00`.
pub fn encode_debug_text(message: &[u8]) -> Vec<[u8; 4], DEBUG_TEXT_MAX_CHUNKS> {
    let message = if message.len() > DEBUG_MESSAGE_MAX_LEN {
        &message[..DEBUG_MESSAGE_MAX_LEN]
    } else {
        message
    };

    let mut frames = Vec::new();
    let mut idx: u8 = 0;
    let mut first = true;
    for chunk in message.chunks(2) {
        let data0 = chunk[0];
        let data1 = if chunk.len() > 1 { chunk[1] } else { 0x00 };
        let mut sub_flags = idx & DEBUG_TEXT_IDX_MASK;
        if first {
            sub_flags |= DEBUG_TEXT_FIRST_FLAG;
            first = false;
        }
        if frames.push(encode(Kind::DebugText, sub_flags, data0, data1)).is_err() {
            break;
        }
        idx = idx.wrapping_add(1);
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_level_never_logs() {
        let mut channel = DebugChannel::new();
        channel.set_level(Level::Off);
        assert!(!channel.log(Level::Error, Category::PROTOCOL, "boom", 0));
    }

    #[test]
    fn verbose_message_suppressed_under_info_threshold() {
        let mut channel = DebugChannel::new();
        channel.set_level(Level::Info);
        assert!(!channel.log(Level::Verbose, Category::LED, "chatty", 0));
        assert!(channel.log(Level::Info, Category::LED, "ok", 0));
    }

    #[test]
    fn category_filter_excludes_unselected_categories() {
        let mut channel = DebugChannel::new();
        channel.set_categories(Category::LED);
        assert!(!channel.log(Level::Error, Category::POWER, "nope", 0));
        assert!(channel.log(Level::Error, Category::LED, "yes", 0));
    }

    #[test]
    fn ring_drops_oldest_once_full() {
        let mut channel = DebugChannel::new();
        for i in 0..(DEBUG_RING_LEN + 5) {
            channel.log(Level::Error, Category::PROTOCOL, "x", i as u32);
        }
        assert_eq!(channel.ring().len(), DEBUG_RING_LEN);
        assert_eq!(channel.ring()[0].timestamp_ms, 5);
    }

    #[test]
    fn statistics_only_tracked_when_enabled() {
        let mut channel = DebugChannel::new();
        channel.log(Level::Error, Category::LED, "x", 0);
        assert_eq!(channel.stats(), Stats::default());

        channel.set_statistics_enabled(true);
        channel.log(Level::Error, Category::LED, "x", 0);
        assert_eq!(channel.stats().by_level[Level::Error as usize], 1);
        assert_eq!(channel.stats().by_category[1], 1); // LED is index 1
    }

    #[test]
    fn debug_code_round_trips_little_endian() {
        let frame = encode_debug_code(0x1234);
        assert_eq!(frame[1], 0x34);
        assert_eq!(frame[2], 0x12);
    }

    #[test]
    fn debug_text_chunks_mark_first_and_index() {
        let frames = encode_debug_text(b"hello!");
        assert_eq!(frames.len(), 3); // 6 bytes / 2 per chunk
        assert_eq!(frames[0][0] & 0x10, 0x10);
        assert_eq!(frames[1][0] & 0x10, 0x00);
        assert_eq!(frames[1][0] & 0x0F, 1);
        assert_eq!(frames[2][0] & 0x0F, 2);
    }

    #[test]
    fn debug_text_pads_odd_trailing_byte() {
        let frames = encode_debug_text(b"abc");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1][2], 0x00);
    }
}
