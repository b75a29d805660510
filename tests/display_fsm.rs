//! End-to-end display handoff: decoded `TYPE_DISPLAY` packets drive
//! `DisplayFsm` the way `service_core0` does, rather than calling
//! `handle_release_flag` directly with a bare bool.

use sam_fw::display::{DisplayAction, DisplayFsm, DisplayState};
use sam_fw::protocol::packet::{decode, encode, Kind};

fn display_release_packet(release: bool) -> [u8; 4] {
    encode(Kind::Display, if release { 0x01 } else { 0x00 }, 0x00, 0x00)
}

#[test]
fn host_release_packet_cuts_boot_animation_short() {
    let mut fsm = DisplayFsm::new(1_000);
    fsm.tick();
    assert_eq!(fsm.state(), DisplayState::BootAnim);

    let packet = decode(&display_release_packet(true)).unwrap();
    let release = packet.sub_flags & 0x01 != 0;
    fsm.handle_release_flag(release).unwrap();
    assert_eq!(fsm.state(), DisplayState::Releasing);
    assert_eq!(fsm.tick(), DisplayAction::CompleteRelease);
    assert_eq!(fsm.state(), DisplayState::HostOwned);
}

#[test]
fn non_release_display_packet_is_a_no_op() {
    let mut fsm = DisplayFsm::new(1_000);
    let packet = decode(&display_release_packet(false)).unwrap();
    let release = packet.sub_flags & 0x01 != 0;
    fsm.handle_release_flag(release).unwrap();
    assert_eq!(fsm.state(), DisplayState::BootAnim);
}

#[test]
fn full_boot_animation_then_host_release_is_rejected() {
    let mut fsm = DisplayFsm::new(2);
    // Run the animation to completion on its own.
    loop {
        match fsm.tick() {
            DisplayAction::CompleteRelease => break,
            _ => continue,
        }
    }
    assert_eq!(fsm.state(), DisplayState::HostOwned);

    let packet = decode(&display_release_packet(true)).unwrap();
    let release = packet.sub_flags & 0x01 != 0;
    let err = fsm.handle_release_flag(release).unwrap_err();
    let reply = sam_fw::display::error_packet(err.code() as u8);
    assert_eq!(reply[1], 0xFE);
}
