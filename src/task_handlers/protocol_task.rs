//! # Protocol Pipeline
//!
//! Bridges the raw DMA byte ring (`data_structures::ring_buffer::RingBuffer`)
//! to the host-testable protocol core in the `sam_fw` library crate: bytes
//! flow into the frame-boundary-aware [`sam_fw::protocol::ring::RxRing`],
//! [`sam_fw::protocol::sync::FrameSync`] lifts out complete packets, and
//! [`sam_fw::protocol::router::route`] classifies each one into a priority
//! and a [`RoutedEvent`] queued on the two-tier scheduler.
//!
//! Two drain points mirror the scheduler's Core-1/Core-0 split:
//! - [`service_critical`] drains whatever lands in the Critical queue,
//!   which is reserved exclusively for the UART service loop itself —
//!   no `RoutedEvent` is ever submitted there.
//! - [`service_core0`] drains High/Normal/Low in priority order, applying
//!   each event to its owning subsystem (including the link-health ping
//!   reply) and queuing any reply frame.

use crate::data_structures::ring_buffer::RingBuffer;
use crate::errors::errors::DisplayError;
use crate::peripherals::lines::UsbSwitch;
use embedded_hal::digital::OutputPin;
use sam_fw::button::{button_status_packet, ButtonEvent, ButtonInput};
use sam_fw::debug_channel::{Category, DebugChannel, Level};
use sam_fw::display::{self, DisplayFsm};
use sam_fw::led::{self, LedEngine};
use sam_fw::power::{FuelGauge, PowerReporter};
use sam_fw::protocol::ring::RxRing;
use sam_fw::protocol::router::{pong_packet, route, RoutedEvent};
use sam_fw::protocol::sync::FrameSync;
use sam_fw::scheduler::{Core0Handle, Core1Handle, Scheduler};

/// Moves whatever bytes the USART DMA has landed in `byte_rx` into
/// `proto_ring`, 64 bytes at a time. Returns the total moved.
pub fn feed_protocol_ring(byte_rx: &mut RingBuffer, proto_ring: &mut RxRing) -> usize {
    let mut chunk = [0u8; 64];
    let mut total = 0usize;
    loop {
        let n = byte_rx.pop(&mut chunk);
        if n == 0 {
            break;
        }
        proto_ring.push(&chunk[..n]);
        total += n;
        if n < chunk.len() {
            break;
        }
    }
    total
}

/// Pulls every frame currently extractable from `proto_ring`, routing
/// each onto `scheduler`. Returns the number routed; a task dropped
/// because its priority queue was already full is not retried here —
/// the host's own link-health retry covers it.
pub fn drain_frames(
    proto_ring: &mut RxRing,
    sync: &mut FrameSync,
    scheduler: &mut Scheduler<RoutedEvent>,
) -> u32 {
    let mut routed = 0u32;
    while let Some(packet) = sync.poll(proto_ring) {
        match route(packet) {
            Some((priority, event)) => {
                if scheduler.submit(priority, event).is_ok() {
                    routed += 1;
                }
            }
            None => {
                // EXTENDED/unknown kind: dropped and counted at the router.
            }
        }
    }
    routed
}

/// Drains whatever lands in the Critical queue. Reserved exclusively
/// for the UART service loop itself (spec §4.5) — no `RoutedEvent` is
/// ever submitted at Critical priority, so this is normally a no-op
/// that still feeds the watchdog once per service iteration.
pub fn service_critical(core1: &mut Core1Handle<'_, RoutedEvent>, _byte_tx: &mut RingBuffer) -> u8 {
    let mut handled = 0u8;
    while core1.dequeue().is_some() {
        handled = handled.saturating_add(1);
    }
    handled
}

/// Drains Core-0's High/Normal/Low queues in that order, dispatching
/// each event to its subsystem and queuing any reply onto `byte_tx`.
/// Returns the number of tasks handled.
#[allow(clippy::too_many_arguments)]
pub fn service_core0<G: FuelGauge>(
    core0: &mut Core0Handle<'_, RoutedEvent>,
    led_engine: &mut LedEngine,
    display_fsm: &mut DisplayFsm,
    power_reporter: &mut PowerReporter,
    gauge: &mut G,
    debug_channel: &mut DebugChannel,
    button_input: &ButtonInput,
    byte_tx: &mut RingBuffer,
    now_ms: u32,
) -> u8 {
    let mut handled = 0u8;
    while let Some(task) = core0.dequeue() {
        match task.payload {
            RoutedEvent::ButtonQuery { .. } => {
                let _ = byte_tx.push(&button_status_packet(button_input.settled()));
            }
            RoutedEvent::LedCommand {
                sub_flags,
                data0,
                data1,
            } => match led::parse_command(sub_flags, data0, data1) {
                Ok(cmd) => match led_engine.submit(cmd, now_ms) {
                    Ok(Some(ack)) => {
                        let _ = byte_tx.push(&ack);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        let _ = byte_tx.push(&led::error_packet(e.code() as u8));
                    }
                },
                Err(e) => {
                    let _ = byte_tx.push(&led::error_packet(e.code() as u8));
                }
            },
            RoutedEvent::PowerRequest { sub_flags, .. } => {
                for frame in power_reporter.handle_request(sub_flags, gauge, now_ms / 1000) {
                    let _ = byte_tx.push(&frame);
                }
            }
            RoutedEvent::DisplayCommand { sub_flags, .. } => {
                // Bit 0 is the only sub-flag currently defined: the host
                // asking to cut the boot animation short.
                let release = sub_flags & 0x01 != 0;
                if let Err(e) = display_fsm.handle_release_flag(release) {
                    let _ = byte_tx.push(&display::error_packet(e.code() as u8));
                }
            }
            RoutedEvent::DebugCode { data0, data1 } => {
                let _ = (data0, data1);
                debug_channel.log(Level::Info, Category::PROTOCOL, "host debug code", now_ms);
            }
            RoutedEvent::DebugText { .. } => {
                debug_channel.log(Level::Info, Category::PROTOCOL, "host debug text", now_ms);
            }
            RoutedEvent::SystemPing => {
                let _ = byte_tx.push(&pong_packet());
            }
            RoutedEvent::SystemPong | RoutedEvent::SystemOther { .. } => {}
        }
        handled = handled.saturating_add(1);
    }
    handled
}

/// Applies a debounced button event to the USB data mux: the long
/// UP+SELECT hold is the only event that acts here, everything else is
/// the protocol router's concern via `RoutedEvent::ButtonQuery`.
///
/// # Errors
/// Returns whatever `UsbSwitch::toggle` returns on a GPIO write failure.
pub fn apply_mux_switch_hold<PIN, E>(
    event: ButtonEvent,
    usb_switch: &mut UsbSwitch<PIN>,
) -> Result<bool, DisplayError>
where
    PIN: OutputPin<Error = E>,
{
    if matches!(event, ButtonEvent::MuxSwitchHold) {
        usb_switch.toggle()?;
        Ok(true)
    } else {
        Ok(false)
    }
}
