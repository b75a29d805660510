//! Diagnostic RGB pixel.
//!
//! A single WS2812 addressable pixel, separate from the 7-pixel strip,
//! taking over the role the discrete blue (heartbeat) and red (Morse
//! error code) LEDs played in earlier revisions: blue on/off maps onto
//! a dim blue pulse, and the red Morse sequence onto a bright red
//! pulse on the same physical pixel.

use crate::config::MAX_MORSE_LENGTH;
use crate::errors::errors::LedError;
use crate::utils::morse::number_to_morse;
use embedded_hal::spi::SpiBus;
use smart_leds::{SmartLedsWrite, RGB8};
use ws2812_spi::Ws2812;

const HEARTBEAT_COLOR: RGB8 = RGB8::new(0, 0, 32);
const ERROR_COLOR: RGB8 = RGB8::new(64, 0, 0);
const OFF: RGB8 = RGB8::new(0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorseState {
    Idle,
    Signal,
    Pause,
}

/// Drives the diagnostic pixel and owns the Morse sequencing state
/// that decides what it should currently be showing.
pub struct DiagnosticLed<SPI> {
    driver: Ws2812<SPI>,
    heartbeat_on: bool,
    morse_sequence: Option<[u8; MAX_MORSE_LENGTH]>,
    morse_length: usize,
    morse_index: usize,
    morse_state: MorseState,
    last_toggle_ms: u32,
}

impl<SPI, E> DiagnosticLed<SPI>
where
    SPI: SpiBus<u8, Error = E>,
{
    pub fn new(spi: SPI) -> Self {
        Self {
            driver: Ws2812::new(spi),
            heartbeat_on: false,
            morse_sequence: None,
            morse_length: 0,
            morse_index: 0,
            morse_state: MorseState::Idle,
            last_toggle_ms: 0,
        }
    }

    /// Begins showing `code` as a Morse sequence on the pixel, taking
    /// over from the heartbeat until the sequence completes.
    ///
    /// # Errors
    /// Returns `LedError::SetStateError` if `code` converts to a
    /// sequence longer than [`MAX_MORSE_LENGTH`].
    pub fn start_morse_sequence(&mut self, code: u16, buffer: &mut [u8]) -> Result<(), LedError> {
        let length = number_to_morse(code, buffer).map_err(|_| LedError::SetStateError)?;
        if length > MAX_MORSE_LENGTH {
            return Err(LedError::SetStateError);
        }
        let mut sequence = [0u8; MAX_MORSE_LENGTH];
        sequence[..length].copy_from_slice(&buffer[..length]);
        self.morse_sequence = Some(sequence);
        self.morse_length = length;
        self.morse_index = 0;
        self.morse_state = MorseState::Signal;
        self.last_toggle_ms = 0;
        Ok(())
    }

    pub fn reset_morse_state(&mut self) {
        self.morse_sequence = None;
        self.morse_length = 0;
        self.morse_index = 0;
        self.morse_state = MorseState::Idle;
    }

    #[inline]
    pub const fn morse_active(&self) -> bool {
        !matches!(self.morse_state, MorseState::Idle)
    }

    pub fn current_symbol(&self) -> Option<char> {
        self.morse_sequence
            .as_ref()
            .and_then(|seq| seq.get(self.morse_index))
            .map(|&b| b as char)
    }

    pub fn advance_morse(&mut self) {
        if self.morse_index + 1 < self.morse_length {
            self.morse_index += 1;
        } else {
            self.reset_morse_state();
        }
    }

    /// Pushes the appropriate color: a Morse dot/dash if a sequence is
    /// active, otherwise the heartbeat toggle.
    pub fn push_frame(&mut self) -> Result<(), LedError> {
        let color = if self.morse_active() {
            match self.current_symbol() {
                Some('.') | Some('-') => ERROR_COLOR,
                _ => OFF,
            }
        } else {
            self.heartbeat_on = !self.heartbeat_on;
            if self.heartbeat_on {
                HEARTBEAT_COLOR
            } else {
                OFF
            }
        };
        self.driver
            .write([color].into_iter())
            .map_err(|_| LedError::SetStateError)
    }
}
