//! End-to-end LED pipeline: wire bytes -> `parse_command` -> `LedEngine`
//! -> rendered strip, covering the queue-then-execute handshake a real
//! host session drives over several packets.

use sam_fw::led::{self, LedEngine, Mode};
use sam_fw::protocol::packet::{decode, encode, Kind};

fn led_packet(sub_flags: u8, data0: u8, data1: u8) -> [u8; 4] {
    encode(Kind::Led, sub_flags, data0, data1)
}

#[test]
fn host_queues_three_pixels_then_executes_all_at_once() {
    let mut engine = LedEngine::new();

    // Queue pixels 0 (static red) and 1 (blink, black) without executing.
    // data0 = rrrr_gggg, data1 = bbbb_mmtt.
    for (led_id, data0, data1) in [(0u8, 0xF0u8, 0x00u8), (1u8, 0x00u8, 0x04u8)] {
        let packet = decode(&led_packet(led_id, data0, data1)).unwrap();
        let cmd = led::parse_command(packet.sub_flags, packet.data0, packet.data1).unwrap();
        assert!(!cmd.execute);
        assert!(engine.submit(cmd, 0).unwrap().is_none());
    }

    // Render before execute: both pixels must still be off.
    let frame = engine.render(0);
    assert_eq!(frame[0], [0, 0, 0]);
    assert_eq!(frame[1], [0, 0, 0]);

    // Third command (pixel 2, static red) carries the execute flag and
    // drains the whole backlog in one shot.
    let packet = decode(&led_packet(0x10 | 2, 0xF0, 0x00)).unwrap();
    let cmd = led::parse_command(packet.sub_flags, packet.data0, packet.data1).unwrap();
    assert!(cmd.execute);
    let ack = engine.submit(cmd, 1_000).unwrap().expect("execute must ack");
    assert_eq!(ack, led::completion_packet(2, 3));
    assert_eq!(engine.last_sequence_length(), 3);

    let frame = engine.render(1_000);
    assert_eq!(frame[0], [255, 0, 0]);
    assert_eq!(frame[1], [0, 0, 0]); // blink mode, but queued color is black
    assert_eq!(frame[2], [255, 0, 0]);
}

#[test]
fn malformed_led_id_never_reaches_the_engine() {
    // led_id 9 is neither a physical pixel (0..=6) nor the broadcast id.
    let packet = decode(&led_packet(0x10 | 9, 0x00, 0x00)).unwrap();
    let err = led::parse_command(packet.sub_flags, packet.data0, packet.data1).unwrap_err();
    let frame = led::error_packet(err.code() as u8);
    assert_eq!(frame[1], 0xFE);
}

#[test]
fn broadcast_execute_overrides_every_pixel_immediately() {
    let mut engine = LedEngine::new();
    let packet = decode(&led_packet(0x10 | 0x0F, 0xF0, 0xF0)).unwrap();
    let cmd = led::parse_command(packet.sub_flags, packet.data0, packet.data1).unwrap();
    assert_eq!(cmd.mode, Mode::Static);
    engine.submit(cmd, 500).unwrap();
    for pixel in engine.render(500) {
        assert_eq!(pixel, [255, 0, 255]);
    }
}
