//! Addressable RGB LED animation engine (C6).
//!
//! Owns the 7-pixel strip's logical state and renders it on demand;
//! hardware push over the WS2812 SPI bus lives in the binary crate's
//! peripheral driver, which calls [`LedEngine::render`] once per frame
//! and writes the result out.

use crate::config::{LED_BROADCAST_ID, LED_QUEUE_DEPTH, LED_STRIP_LEN, LED_TIME_TABLE_MS};
use crate::errors::errors::LedCommandError;
use crate::protocol::packet::{encode, Kind};
use heapless::spsc::Queue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub enum Mode {
    Static,
    Blink,
    Fade,
    Rainbow,
}

impl Mode {
    const fn from_bits(bits: u8) -> Self {
        match bits {
            0b00 => Mode::Static,
            0b01 => Mode::Blink,
            0b10 => Mode::Fade,
            _ => Mode::Rainbow,
        }
    }
}

/// A parsed `TYPE_LED` packet: which pixel(s) it targets, whether it
/// should apply immediately or wait in the queue, and the animation to
/// run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub struct LedCommand {
    pub led_id: u8,
    pub execute: bool,
    pub mode: Mode,
    pub time_idx: u8,
    pub color: [u8; 3],
}

/// Expands a 4-bit RGB444 channel to its 8-bit RGB888 equivalent.
/// `0..=15` maps onto `0..=255` in steps of 17, the same scaling the
/// upstream Python reference used.
pub const fn rgb444_to_rgb888(nibble: u8) -> u8 {
    (nibble & 0x0F) * 17
}

/// Parses the sub-flags/data0/data1 of a `TYPE_LED` packet into a
/// [`LedCommand`].
///
/// Layout: `sub_flags` bit 4 is the execute flag, bits 0-3 are the
/// target led id (`0..=6`, or [`LED_BROADCAST_ID`] for all seven).
/// `data0` packs `r4:4 | g4:4`; `data1` packs `b4:4 | mode:2 | time_idx:2`.
///
/// # Errors
/// Returns `LedCommandError::InvalidMode` if `led_id` names neither a
/// physical pixel nor the broadcast id.
pub fn parse_command(sub_flags: u8, data0: u8, data1: u8) -> Result<LedCommand, LedCommandError> {
    let led_id = sub_flags & 0x0F;
    if led_id != LED_BROADCAST_ID && (led_id as usize) >= LED_STRIP_LEN {
        return Err(LedCommandError::InvalidMode);
    }
    let execute = sub_flags & 0x10 != 0;
    let r = rgb444_to_rgb888((data0 >> 4) & 0x0F);
    let g = rgb444_to_rgb888(data0 & 0x0F);
    let b = rgb444_to_rgb888((data1 >> 4) & 0x0F);
    let mode = Mode::from_bits((data1 >> 2) & 0x03);
    let time_idx = data1 & 0x03;
    Ok(LedCommand {
        led_id,
        execute,
        mode,
        time_idx,
        color: [r, g, b],
    })
}

/// Builds the `TYPE_LED` acknowledgement for a command that was
/// applied successfully: `type_flags = LED | EXECUTE | led_id`,
/// `data0 = 0xFF`, `data1 = count_executed`.
pub fn completion_packet(led_id: u8, count_executed: u8) -> [u8; 4] {
    encode(Kind::Led, 0x10 | (led_id & 0x0F), 0xFF, count_executed)
}

/// Builds the `TYPE_LED` error acknowledgement: `data0 = 0xFE`,
/// `data1` clamped to `1..=255` so it never collides with the
/// completion/status sentinels.
pub fn error_packet(code: u8) -> [u8; 4] {
    let clamped = core::cmp::max(code, 1);
    encode(Kind::Led, 0x00, 0xFE, clamped)
}

/// Builds a `TYPE_LED` progress status: `data0` clamped to `0..=0xFD`
/// so it never collides with the completion/error sentinels.
pub fn status_packet(progress: u8, led_id: u8) -> [u8; 4] {
    let clamped = core::cmp::min(progress, 0xFD);
    encode(Kind::Led, 0x00, clamped, led_id)
}

#[derive(Clone, Copy)]
struct PixelAnim {
    mode: Mode,
    color: [u8; 3],
    period_ms: u32,
    phase_start_ms: u32,
}

impl PixelAnim {
    const fn off() -> Self {
        Self {
            mode: Mode::Static,
            color: [0, 0, 0],
            period_ms: LED_TIME_TABLE_MS[0],
            phase_start_ms: 0,
        }
    }

    fn render(&self, now_ms: u32) -> [u8; 3] {
        let elapsed = now_ms.wrapping_sub(self.phase_start_ms);
        match self.mode {
            Mode::Static => self.color,
            Mode::Blink => {
                let half = core::cmp::max(self.period_ms / 2, 1);
                if (elapsed / half) % 2 == 0 {
                    self.color
                } else {
                    [0, 0, 0]
                }
            }
            Mode::Fade => {
                let period = core::cmp::max(self.period_ms, 1);
                let phase = elapsed % period;
                let half = period / 2;
                let triangle = if phase < half {
                    phase * 255 / core::cmp::max(half, 1)
                } else {
                    255 - (phase - half) * 255 / core::cmp::max(period - half, 1)
                };
                [
                    (self.color[0] as u32 * triangle / 255) as u8,
                    (self.color[1] as u32 * triangle / 255) as u8,
                    (self.color[2] as u32 * triangle / 255) as u8,
                ]
            }
            Mode::Rainbow => {
                let period = core::cmp::max(self.period_ms, 1);
                let hue = ((elapsed % period) * 255 / period) as u8;
                hsv_to_rgb(hue, 255, 255)
            }
        }
    }
}

/// Integer HSV-to-RGB for `hue: 0..=255` standing in for `0..=359`
/// degrees; full saturation/value callers get the usual six-sector
/// rainbow wheel.
fn hsv_to_rgb(hue: u8, sat: u8, val: u8) -> [u8; 3] {
    if sat == 0 {
        return [val, val, val];
    }
    let region = hue / 43;
    let remainder = (hue - region * 43) * 6;
    let p = (val as u16 * (255 - sat as u16) / 255) as u8;
    let q = (val as u16 * (255 - (sat as u16 * remainder as u16) / 255) / 255) as u8;
    let t = (val as u16 * (255 - (sat as u16 * (255 - remainder as u16)) / 255) / 255) as u8;
    match region {
        0 => [val, t, p],
        1 => [q, val, p],
        2 => [p, val, t],
        3 => [p, q, val],
        4 => [t, p, val],
        _ => [val, p, q],
    }
}

/// Owns the logical state of the 7-pixel strip: a FIFO of queued
/// commands and each pixel's currently running animation.
pub struct LedEngine {
    pending: Queue<LedCommand, LED_QUEUE_DEPTH>,
    pixels: [PixelAnim; LED_STRIP_LEN],
    last_completed_led_id: Option<u8>,
    last_sequence_length: u8,
}

impl LedEngine {
    pub const fn new() -> Self {
        Self {
            pending: Queue::new(),
            pixels: [PixelAnim::off(); LED_STRIP_LEN],
            last_completed_led_id: None,
            last_sequence_length: 0,
        }
    }

    #[inline]
    pub const fn last_completed_led_id(&self) -> Option<u8> {
        self.last_completed_led_id
    }

    #[inline]
    pub const fn last_sequence_length(&self) -> u8 {
        self.last_sequence_length
    }

    /// Queues `cmd`. If `cmd.execute` is set, immediately applies every
    /// command accumulated so far (including this one) and returns the
    /// completion acknowledgement to send back to the host.
    ///
    /// # Errors
    /// Returns `LedCommandError::QueueFull` if the pending queue is at
    /// [`LED_QUEUE_DEPTH`].
    pub fn submit(&mut self, cmd: LedCommand, now_ms: u32) -> Result<Option<[u8; 4]>, LedCommandError> {
        let execute = cmd.execute;
        let led_id = cmd.led_id;
        self.pending
            .enqueue(cmd)
            .map_err(|_| LedCommandError::QueueFull)?;
        if execute {
            let applied = self.drain_queue(now_ms);
            self.last_sequence_length = applied;
            self.last_completed_led_id = Some(led_id);
            Ok(Some(completion_packet(led_id, applied)))
        } else {
            Ok(None)
        }
    }

    fn drain_queue(&mut self, now_ms: u32) -> u8 {
        let mut applied = 0u8;
        while let Some(cmd) = self.pending.dequeue() {
            self.apply(cmd, now_ms);
            applied = applied.saturating_add(1);
        }
        applied
    }

    fn apply(&mut self, cmd: LedCommand, now_ms: u32) {
        let anim = PixelAnim {
            mode: cmd.mode,
            color: cmd.color,
            period_ms: LED_TIME_TABLE_MS[cmd.time_idx as usize],
            phase_start_ms: now_ms,
        };
        if cmd.led_id == LED_BROADCAST_ID {
            self.pixels = [anim; LED_STRIP_LEN];
        } else {
            self.pixels[cmd.led_id as usize] = anim;
        }
    }

    /// Renders every pixel's current color at `now_ms`, for the strip
    /// driver to push out over SPI.
    pub fn render(&self, now_ms: u32) -> [[u8; 3]; LED_STRIP_LEN] {
        let mut out = [[0u8; 3]; LED_STRIP_LEN];
        for (slot, pixel) in out.iter_mut().zip(self.pixels.iter()) {
            *slot = pixel.render(now_ms);
        }
        out
    }
}

impl Default for LedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_static_command_bit_layout() {
        // r=0xF, g=0xA -> data0 = 0xFA; b=0x5, mode=Static(00), time_idx=01 -> data1 = 0x51
        let data0 = 0xFAu8;
        let data1 = 0x51u8;
        let cmd = parse_command(0x10 | 0x03, data0, data1).unwrap();
        assert_eq!(cmd.led_id, 3);
        assert!(cmd.execute);
        assert_eq!(cmd.mode, Mode::Static);
        assert_eq!(cmd.time_idx, 1);
        assert_eq!(cmd.color, [0xF * 17, 0xA * 17, 0x5 * 17]);
    }

    #[test]
    fn rejects_out_of_range_led_id() {
        // led_id 7 is neither a physical pixel (0..=6) nor broadcast (15).
        assert_eq!(
            parse_command(0x07, 0x00, 0x00),
            Err(LedCommandError::InvalidMode)
        );
    }

    #[test]
    fn queue_without_execute_does_not_apply() {
        let mut engine = LedEngine::new();
        let cmd = parse_command(0x02, 0b00_00_1111, 0x00).unwrap();
        assert!(!cmd.execute);
        let ack = engine.submit(cmd, 0).unwrap();
        assert!(ack.is_none());
        // Pixel 2 must stay off until an execute-flagged command drains the queue.
        assert_eq!(engine.render(0)[2], [0, 0, 0]);
    }

    #[test]
    fn execute_applies_and_acks_with_led_id() {
        let mut engine = LedEngine::new();
        let cmd = parse_command(0x10 | 0x04, 0xF0, 0x00).unwrap();
        let ack = engine.submit(cmd, 0).unwrap().expect("execute acks");
        assert_eq!(ack, completion_packet(4, 1));
        assert_eq!(engine.last_completed_led_id(), Some(4));
        assert_eq!(engine.render(0)[4], [255, 0, 0]);
    }

    #[test]
    fn broadcast_sets_every_pixel() {
        let mut engine = LedEngine::new();
        let cmd = parse_command(0x10 | LED_BROADCAST_ID, 0xFF, 0xF0).unwrap();
        engine.submit(cmd, 0).unwrap();
        for pixel in engine.render(0) {
            assert_eq!(pixel, [255, 255, 255]);
        }
    }

    #[test]
    fn blink_toggles_between_color_and_off() {
        let mut engine = LedEngine::new();
        let cmd = parse_command(0x10 | 0x00, 0xF0, 0x04).unwrap();
        engine.submit(cmd, 0).unwrap();
        let period = LED_TIME_TABLE_MS[0];
        assert_eq!(engine.render(0)[0], [255, 0, 0]);
        assert_eq!(engine.render(period / 2 + 1)[0], [0, 0, 0]);
        assert_eq!(engine.render(period + 1)[0], [255, 0, 0]);
    }

    #[test]
    fn queue_full_is_reported() {
        let mut engine = LedEngine::new();
        // Queue-only (non-executing) commands so the backlog actually
        // accumulates; heapless::spsc::Queue<_, N> holds at most N-1.
        let mut submitted = 0usize;
        loop {
            let cmd = parse_command(0x00, 0x00, 0x00).unwrap();
            match engine.submit(cmd, 0) {
                Ok(_) => {
                    submitted += 1;
                    assert!(submitted <= LED_QUEUE_DEPTH, "queue never reported full");
                }
                Err(LedCommandError::QueueFull) => break,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn error_and_status_packets_clamp_sentinels() {
        let err = error_packet(0);
        assert_eq!(err[1], 0xFE);
        assert_eq!(err[2], 1); // clamped away from 0
        let status = status_packet(0xFF, 2);
        assert_eq!(status[1], 0xFD); // clamped below the error/completion sentinels
    }
}
