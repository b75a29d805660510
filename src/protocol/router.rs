//! Protocol router (C4): the pure mapping from a decoded [`Packet`] to
//! the scheduler priority and payload that should carry it forward.
//!
//! This module never touches the ring, the wire, or any peripheral — it
//! is a total function over `Packet`, which is what makes it directly
//! host-testable against the protocol's priority table.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::protocol::packet::{encode, Kind, Packet};
use crate::scheduler::Priority;

/// Count of `EXTENDED`/unknown-kind packets dropped at the router
/// (spec §4.4/§7: these never reach the scheduler).
static DROPPED_PACKETS: AtomicU32 = AtomicU32::new(0);

/// Current drop counter value, for diagnostics/debug reporting.
pub fn dropped_packet_count() -> u32 {
    DROPPED_PACKETS.load(Ordering::Relaxed)
}

/// What a decoded packet means to the rest of the firmware, stripped of
/// its wire encoding. This is the payload type the scheduler carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub enum RoutedEvent {
    ButtonQuery { sub_flags: u8 },
    LedCommand { sub_flags: u8, data0: u8, data1: u8 },
    PowerRequest { sub_flags: u8, data0: u8 },
    DisplayCommand { sub_flags: u8, data0: u8, data1: u8 },
    DebugCode { data0: u8, data1: u8 },
    DebugText { sub_flags: u8, data0: u8, data1: u8 },
    SystemPing,
    SystemPong,
    SystemOther { sub_flags: u8, data0: u8, data1: u8 },
}

/// Priority table (spec §4.4): CRITICAL is reserved exclusively for the
/// UART service loop itself, never for a routed event — SYSTEM ping,
/// POWER, and DISPLAY release are all executed inline and HIGH
/// priority. LED animation is cooperative NORMAL work; the debug
/// channel is LOW since it is never latency-sensitive.
pub const fn priority_for(kind: Kind) -> Priority {
    match kind {
        Kind::System | Kind::Button | Kind::Power | Kind::Display => Priority::High,
        Kind::Led => Priority::Normal,
        Kind::DebugCode | Kind::DebugText | Kind::Extended => Priority::Low,
    }
}

/// System sub-flags distinguishing ping from pong within `Kind::System`
/// (mirrors the `TYPE_SYSTEM` sub-flag layout used by the LED/Button
/// packet kinds: low bits select the specific message).
const SYSTEM_PING: u8 = 0x00;
const SYSTEM_PONG: u8 = 0x01;

/// Builds the `TYPE_SYSTEM` pong reply the Critical-priority keep-alive
/// handler sends back for every ping it observes.
pub fn pong_packet() -> [u8; 4] {
    encode(Kind::System, SYSTEM_PONG, 0x00, 0x00)
}

/// Classifies a decoded packet into a [`RoutedEvent`] plus its
/// scheduling [`Priority`]. `EXTENDED`/unknown-kind packets are dropped
/// here (counted, never submitted to the scheduler).
pub fn route(packet: Packet) -> Option<(Priority, RoutedEvent)> {
    if matches!(packet.kind, Kind::Extended) {
        DROPPED_PACKETS.fetch_add(1, Ordering::Relaxed);
        return None;
    }
    let priority = priority_for(packet.kind);
    let event = match packet.kind {
        Kind::Button => RoutedEvent::ButtonQuery {
            sub_flags: packet.sub_flags,
        },
        Kind::Led => RoutedEvent::LedCommand {
            sub_flags: packet.sub_flags,
            data0: packet.data0,
            data1: packet.data1,
        },
        Kind::Power => RoutedEvent::PowerRequest {
            sub_flags: packet.sub_flags,
            data0: packet.data0,
        },
        Kind::Display => RoutedEvent::DisplayCommand {
            sub_flags: packet.sub_flags,
            data0: packet.data0,
            data1: packet.data1,
        },
        Kind::DebugCode => RoutedEvent::DebugCode {
            data0: packet.data0,
            data1: packet.data1,
        },
        Kind::DebugText => RoutedEvent::DebugText {
            sub_flags: packet.sub_flags,
            data0: packet.data0,
            data1: packet.data1,
        },
        Kind::System => match packet.sub_flags {
            SYSTEM_PING => RoutedEvent::SystemPing,
            SYSTEM_PONG => RoutedEvent::SystemPong,
            _ => RoutedEvent::SystemOther {
                sub_flags: packet.sub_flags,
                data0: packet.data0,
                data1: packet.data1,
            },
        },
        Kind::Extended => unreachable!("dropped above"),
    };
    Some((priority, event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_ping_is_high_priority() {
        let packet = Packet {
            kind: Kind::System,
            sub_flags: 0x00,
            data0: 0x00,
            data1: 0x00,
        };
        let (priority, event) = route(packet).unwrap();
        assert_eq!(priority, Priority::High);
        assert_eq!(event, RoutedEvent::SystemPing);
    }

    #[test]
    fn button_query_is_high_priority() {
        let packet = Packet {
            kind: Kind::Button,
            sub_flags: 0x01,
            data0: 0x00,
            data1: 0x00,
        };
        let (priority, event) = route(packet).unwrap();
        assert_eq!(priority, Priority::High);
        assert_eq!(event, RoutedEvent::ButtonQuery { sub_flags: 0x01 });
    }

    #[test]
    fn led_is_normal_power_and_display_are_high_priority() {
        assert_eq!(priority_for(Kind::Led), Priority::Normal);
        assert_eq!(priority_for(Kind::Power), Priority::High);
        assert_eq!(priority_for(Kind::Display), Priority::High);
    }

    #[test]
    fn debug_channel_is_low_priority() {
        assert_eq!(priority_for(Kind::DebugCode), Priority::Low);
        assert_eq!(priority_for(Kind::DebugText), Priority::Low);
        assert_eq!(priority_for(Kind::Extended), Priority::Low);
    }

    #[test]
    fn pong_packet_carries_pong_sub_flag() {
        let frame = pong_packet();
        assert_eq!(frame[0] & 0x1F, SYSTEM_PONG);
    }

    #[test]
    fn extended_kind_is_dropped_and_counted() {
        let before = dropped_packet_count();
        let packet = Packet {
            kind: Kind::Extended,
            sub_flags: 0x1F,
            data0: 0x00,
            data1: 0x00,
        };
        assert_eq!(route(packet), None);
        assert_eq!(dropped_packet_count(), before + 1);
    }
}
