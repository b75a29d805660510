//! End-to-end pipeline: raw bytes on the wire -> `RxRing` -> `FrameSync`
//! -> `router::route` -> `Scheduler` -> per-core drain. Each module's
//! own invariants are covered by its inline unit tests; this exercises
//! the composition the way the firmware actually wires it.

use sam_fw::protocol::packet::{encode, Kind};
use sam_fw::protocol::ring::RxRing;
use sam_fw::protocol::router::{route, RoutedEvent};
use sam_fw::protocol::sync::FrameSync;
use sam_fw::scheduler::{Priority, Scheduler};

fn drain_into_scheduler(
    ring: &mut RxRing,
    sync: &mut FrameSync,
    scheduler: &mut Scheduler<RoutedEvent>,
) -> u32 {
    let mut routed = 0u32;
    while let Some(packet) = sync.poll(ring) {
        if let Some((priority, event)) = route(packet) {
            scheduler.submit(priority, event).unwrap();
            routed += 1;
        }
    }
    routed
}

#[test]
fn host_ping_round_trip_ends_up_on_core0_high_queue() {
    let mut ring = RxRing::new();
    let mut sync = FrameSync::new();
    let mut scheduler: Scheduler<RoutedEvent> = Scheduler::new();

    ring.push(&encode(Kind::System, 0x00, 0x00, 0x00));
    let routed = drain_into_scheduler(&mut ring, &mut sync, &mut scheduler);
    assert_eq!(routed, 1);

    let (mut core1, mut core0) = scheduler.split();
    assert!(
        core1.dequeue().is_none(),
        "Critical is reserved for the UART service loop itself, never a RoutedEvent"
    );
    let task = core0.dequeue().expect("ping should be queued High on Core 0");
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.payload, RoutedEvent::SystemPing);
}

#[test]
fn mixed_burst_drains_in_priority_order_on_core0() {
    let mut ring = RxRing::new();
    let mut sync = FrameSync::new();
    let mut scheduler: Scheduler<RoutedEvent> = Scheduler::new();

    // Normal, then High priority packets land in the ring in that
    // order; Core 0 must still drain High first.
    ring.push(&encode(Kind::Led, 0x10, 0x00, 0x00));
    ring.push(&encode(Kind::Button, 0x00, 0x00, 0x00));
    ring.push(&encode(Kind::Power, 0x10, 0x00, 0x00));

    drain_into_scheduler(&mut ring, &mut sync, &mut scheduler);

    let (_core1, mut core0) = scheduler.split();
    let first = core0.dequeue().unwrap();
    assert_eq!(first.priority, Priority::High);
    assert!(matches!(first.payload, RoutedEvent::ButtonQuery { .. }));

    let second = core0.dequeue().unwrap();
    assert_eq!(second.priority, Priority::High);
    assert!(matches!(second.payload, RoutedEvent::PowerRequest { .. }));

    let third = core0.dequeue().unwrap();
    assert_eq!(third.priority, Priority::Normal);
    assert!(matches!(third.payload, RoutedEvent::LedCommand { .. }));

    assert!(core0.dequeue().is_none());
}

#[test]
fn extended_packets_are_dropped_before_reaching_the_scheduler() {
    let mut ring = RxRing::new();
    let mut sync = FrameSync::new();
    let mut scheduler: Scheduler<RoutedEvent> = Scheduler::new();

    ring.push(&encode(Kind::Extended, 0x1F, 0x00, 0x00));
    let routed = drain_into_scheduler(&mut ring, &mut sync, &mut scheduler);
    assert_eq!(routed, 0);
    assert_eq!(scheduler.pending_count(), 0);
}

#[test]
fn stream_interleaved_with_garbage_still_recovers_every_frame() {
    let mut ring = RxRing::new();
    let mut sync = FrameSync::new();
    let mut scheduler: Scheduler<RoutedEvent> = Scheduler::new();

    ring.push(&encode(Kind::Button, 0x00, 0x01, 0x00));
    ring.push(&[0x00, 0xFF, 0x11]); // noise, no valid CRC in here
    ring.push(&encode(Kind::Led, 0x10, 0x00, 0x00));

    let mut routed = 0u32;
    for _ in 0..16 {
        routed += drain_into_scheduler(&mut ring, &mut sync, &mut scheduler);
        if ring.is_empty() {
            break;
        }
    }
    assert_eq!(routed, 2);
    assert_eq!(scheduler.pending_count(), 2);
}
