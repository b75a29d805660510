//! Host-testable core of the companion controller firmware.
//!
//! Everything in this crate is hardware-independent: the packet codec,
//! receive ring, frame synchronizer, protocol router, task scheduler, LED
//! animation engine, display ownership FSM, power reporter, button
//! debouncer and debug channel. Hardware glue (GPIO, USART/DMA, I2C, SPI,
//! the RTIC `#[app]`) lives in the `sam-companion-fw` binary crate and
//! talks to these types through the traits they expose.
#![cfg_attr(not(test), no_std)]

#[macro_use]
pub mod macros;

pub mod config;
pub mod errors;

pub mod protocol;
pub mod scheduler;

pub mod button;
pub mod debug_channel;
pub mod display;
pub mod led;
pub mod power;

pub mod utils;
