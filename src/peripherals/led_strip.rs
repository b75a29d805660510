//! 7-pixel addressable RGB strip driver, pushing frames rendered by
//! [`crate::led::LedEngine`].

use crate::config::LED_STRIP_LEN;
use crate::errors::errors::LedCommandError;
use embedded_hal::spi::SpiBus;
use smart_leds::{SmartLedsWrite, RGB8};
use ws2812_spi::Ws2812;

pub struct LedStrip<SPI> {
    driver: Ws2812<SPI>,
}

impl<SPI, E> LedStrip<SPI>
where
    SPI: SpiBus<u8, Error = E>,
{
    pub fn new(spi: SPI) -> Self {
        Self {
            driver: Ws2812::new(spi),
        }
    }

    /// Pushes one rendered frame (as produced by
    /// `LedEngine::render`) out to the physical strip.
    ///
    /// # Errors
    /// Returns `LedCommandError::StrandWriteFailed` if the underlying
    /// SPI write fails.
    pub fn push_frame(&mut self, pixels: [[u8; 3]; LED_STRIP_LEN]) -> Result<(), LedCommandError> {
        let frame = pixels.map(|[r, g, b]| RGB8::new(r, g, b));
        self.driver
            .write(frame.into_iter())
            .map_err(|_| LedCommandError::StrandWriteFailed)
    }
}
