//! Discrete GPIO control lines: the e-ink mux select, its power rail
//! enable, and the USB data-mux switch the button combo can trigger.

use crate::errors::errors::DisplayError;
use embedded_hal::digital::OutputPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxOwner {
    Mcu,
    Host,
}

/// Owns the e-ink mux select line and its power enable line as a pair,
/// so the two can never be driven into an inconsistent combination.
pub struct DisplayMux<SEL, PWR> {
    select: SEL,
    power: PWR,
    owner: MuxOwner,
}

impl<SEL, PWR, E> DisplayMux<SEL, PWR>
where
    SEL: OutputPin<Error = E>,
    PWR: OutputPin<Error = E>,
{
    pub fn new(select: SEL, power: PWR) -> Self {
        Self {
            select,
            power,
            owner: MuxOwner::Mcu,
        }
    }

    #[inline]
    pub const fn owner(&self) -> MuxOwner {
        self.owner
    }

    /// Flips the mux to point the panel at the host. Must only be
    /// called after the MCU's own SPI driver has released the bus.
    pub fn switch_to_host(&mut self) -> Result<(), DisplayError> {
        self.select
            .set_high()
            .map_err(|_| DisplayError::SpiWriteFailed)?;
        self.owner = MuxOwner::Host;
        Ok(())
    }

    pub fn switch_to_mcu(&mut self) -> Result<(), DisplayError> {
        self.select
            .set_low()
            .map_err(|_| DisplayError::SpiWriteFailed)?;
        self.owner = MuxOwner::Mcu;
        Ok(())
    }

    pub fn set_panel_power(&mut self, on: bool) -> Result<(), DisplayError> {
        if on {
            self.power.set_high()
        } else {
            self.power.set_low()
        }
        .map_err(|_| DisplayError::SpiWriteFailed)
    }
}

/// USB data-mux line the long UP+SELECT hold toggles.
pub struct UsbSwitch<PIN> {
    pin: PIN,
    routed_to_host: bool,
}

impl<PIN, E> UsbSwitch<PIN>
where
    PIN: OutputPin<Error = E>,
{
    pub fn new(pin: PIN) -> Self {
        Self {
            pin,
            routed_to_host: true,
        }
    }

    #[inline]
    pub const fn routed_to_host(&self) -> bool {
        self.routed_to_host
    }

    pub fn toggle(&mut self) -> Result<(), DisplayError> {
        self.routed_to_host = !self.routed_to_host;
        if self.routed_to_host {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
        .map_err(|_| DisplayError::SpiWriteFailed)
    }
}
