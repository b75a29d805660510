//! E-ink display ownership FSM (C7).
//!
//! The MCU owns the SPI bus and the boot-animation asset only while in
//! `BootAnim`; once `HostOwned`, the mux line points the panel at the
//! Linux host and the MCU must never touch the bus again. `Releasing`
//! is the one-tick gap between tri-stating the MCU's own SPI pins and
//! flipping the mux — modeled explicitly so the mux flip and the SPI
//! tri-state can never observably happen out of order.

use crate::config::BOOT_ANIM_YIELD_EVERY;
use crate::errors::errors::DisplayError;
use crate::protocol::packet::{encode, Kind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub enum DisplayState {
    BootAnim,
    Releasing,
    HostOwned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub enum DisplayAction {
    RenderFrame(u32),
    YieldToScheduler,
    BeginRelease,
    CompleteRelease,
    None,
}

/// Builds the `TYPE_DISPLAY` error acknowledgement, mirroring the LED
/// engine's `error_packet` convention: `data0 = 0xFE`, `data1` the
/// clamped error code.
pub fn error_packet(code: u8) -> [u8; 4] {
    let clamped = core::cmp::max(code, 1);
    encode(Kind::Display, 0x00, 0xFE, clamped)
}

/// Builds the `TYPE_DISPLAY` release-completion acknowledgement, sent
/// once the executor has actually finished handing the bus to the
/// host: `sub_flags = 0x01`, `data0 = 0xFF`.
pub fn completion_packet() -> [u8; 4] {
    encode(Kind::Display, 0x01, 0xFF, 0x00)
}

/// Drives the handoff of the e-ink bus from the MCU's own boot
/// animation to full host ownership.
pub struct DisplayFsm {
    state: DisplayState,
    frame: u32,
    total_frames: u32,
}

impl DisplayFsm {
    pub const fn new(total_frames: u32) -> Self {
        Self {
            state: DisplayState::BootAnim,
            frame: 0,
            total_frames,
        }
    }

    #[inline]
    pub const fn state(&self) -> DisplayState {
        self.state
    }

    /// Boot animation asset failed to load: skip straight to
    /// `HostOwned` rather than looping forever on a broken frame.
    pub fn asset_missing(&mut self) -> DisplayState {
        self.state = DisplayState::HostOwned;
        self.state
    }

    /// Advances the FSM by one animation tick.
    pub fn tick(&mut self) -> DisplayAction {
        match self.state {
            DisplayState::BootAnim => {
                self.frame += 1;
                if self.frame >= self.total_frames {
                    self.state = DisplayState::Releasing;
                    DisplayAction::BeginRelease
                } else if self.frame % BOOT_ANIM_YIELD_EVERY == 0 {
                    DisplayAction::YieldToScheduler
                } else {
                    DisplayAction::RenderFrame(self.frame)
                }
            }
            DisplayState::Releasing => {
                self.state = DisplayState::HostOwned;
                DisplayAction::CompleteRelease
            }
            DisplayState::HostOwned => DisplayAction::None,
        }
    }

    /// Consumes a `release` sub-flag from a `TYPE_DISPLAY` packet,
    /// letting the host cut the boot animation short.
    ///
    /// # Errors
    /// Returns `DisplayError::BusContention` if the host asks to
    /// release a bus that is already theirs.
    pub fn handle_release_flag(&mut self, release: bool) -> Result<(), DisplayError> {
        if !release {
            return Ok(());
        }
        match self.state {
            DisplayState::BootAnim => {
                self.state = DisplayState::Releasing;
                Ok(())
            }
            DisplayState::Releasing => Ok(()),
            DisplayState::HostOwned => Err(DisplayError::BusContention),
        }
    }

    /// Invariant guard: the MCU's own SPI driver may only be active
    /// while it still owns the bus.
    pub fn assert_mcu_may_drive_spi(&self) -> Result<(), DisplayError> {
        match self.state {
            DisplayState::HostOwned => Err(DisplayError::BusContention),
            DisplayState::BootAnim | DisplayState::Releasing => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_animation_yields_every_n_frames() {
        let mut fsm = DisplayFsm::new(100);
        for _ in 0..(BOOT_ANIM_YIELD_EVERY - 1) {
            assert!(matches!(fsm.tick(), DisplayAction::RenderFrame(_)));
        }
        assert_eq!(fsm.tick(), DisplayAction::YieldToScheduler);
    }

    #[test]
    fn completes_animation_then_releases_then_host_owned() {
        let mut fsm = DisplayFsm::new(2);
        assert!(matches!(fsm.tick(), DisplayAction::RenderFrame(1)));
        assert_eq!(fsm.tick(), DisplayAction::BeginRelease);
        assert_eq!(fsm.state(), DisplayState::Releasing);
        assert_eq!(fsm.tick(), DisplayAction::CompleteRelease);
        assert_eq!(fsm.state(), DisplayState::HostOwned);
        assert_eq!(fsm.tick(), DisplayAction::None);
    }

    #[test]
    fn asset_missing_skips_straight_to_host_owned() {
        let mut fsm = DisplayFsm::new(1000);
        assert_eq!(fsm.asset_missing(), DisplayState::HostOwned);
        assert_eq!(fsm.tick(), DisplayAction::None);
    }

    #[test]
    fn host_can_cut_boot_animation_short() {
        let mut fsm = DisplayFsm::new(1000);
        fsm.tick();
        fsm.handle_release_flag(true).unwrap();
        assert_eq!(fsm.state(), DisplayState::Releasing);
        assert_eq!(fsm.tick(), DisplayAction::CompleteRelease);
    }

    #[test]
    fn releasing_bus_twice_once_host_owned_is_contention() {
        let mut fsm = DisplayFsm::new(1);
        fsm.tick();
        fsm.tick();
        assert_eq!(fsm.state(), DisplayState::HostOwned);
        assert_eq!(
            fsm.handle_release_flag(true),
            Err(DisplayError::BusContention)
        );
    }

    #[test]
    fn error_packet_clamps_sentinel() {
        let frame = error_packet(0);
        assert_eq!(frame[1], 0xFE);
        assert_eq!(frame[2], 1);
    }

    #[test]
    fn completion_packet_matches_wire_shape() {
        let frame = completion_packet();
        assert_eq!(frame[0] & 0x1F, 0x01);
        assert_eq!(frame[1], 0xFF);
    }

    #[test]
    fn mcu_may_not_drive_spi_once_host_owned() {
        let mut fsm = DisplayFsm::new(1);
        assert!(fsm.assert_mcu_may_drive_spi().is_ok());
        fsm.tick();
        fsm.tick();
        assert_eq!(
            fsm.assert_mcu_may_drive_spi(),
            Err(DisplayError::BusContention)
        );
    }
}
