//! Button input debouncer (C9).
//!
//! Physical reads land on `sample()` every scheduler tick; this module
//! only ever emits an event when the debounced, settled state actually
//! changes, plus separately tracks the reserved UP+SELECT combo used to
//! trigger a host-initiated USB-mux switch after a long hold.

use crate::config::{BUTTON_LONG_PRESS_MS, BUTTON_MUX_SWITCH_HOLD_MS, BUTTON_SETTLE_MS};
use crate::protocol::packet::{encode, Kind};

bitflags::bitflags! {
    /// Raw physical button mask, matching the protocol's `TYPE_BUTTON`
    /// sub-flag bit assignment.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Buttons: u8 {
        const UP     = 0b0001;
        const DOWN   = 0b0010;
        const SELECT = 0b0100;
        const POWER  = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub enum ButtonEvent {
    Changed(Buttons),
    MuxSwitchHold,
}

/// Builds the `TYPE_BUTTON` status reply: `data0` carries the settled
/// mask, `data1` unused.
pub fn button_status_packet(buttons: Buttons) -> [u8; 4] {
    encode(Kind::Button, 0x00, buttons.bits(), 0x00)
}

/// Debounces the raw GPIO read and emits change-only events.
pub struct ButtonInput {
    settled: Buttons,
    candidate: Buttons,
    candidate_since_ms: u32,
    combo_since_ms: Option<u32>,
    mux_switch_fired: bool,
}

impl ButtonInput {
    pub const fn new() -> Self {
        Self {
            settled: Buttons::empty(),
            candidate: Buttons::empty(),
            candidate_since_ms: 0,
            combo_since_ms: None,
            mux_switch_fired: false,
        }
    }

    #[inline]
    pub const fn settled(&self) -> Buttons {
        self.settled
    }

    /// Feeds one raw GPIO read at `now_ms`, returning an event if the
    /// debounced state just changed or the mux-switch combo hold just
    /// completed.
    pub fn sample(&mut self, raw: Buttons, now_ms: u32) -> Option<ButtonEvent> {
        if raw != self.candidate {
            self.candidate = raw;
            self.candidate_since_ms = now_ms;
        }

        let mut event = None;
        if raw != self.settled
            && now_ms.wrapping_sub(self.candidate_since_ms) >= BUTTON_SETTLE_MS
        {
            self.settled = raw;
            event = Some(ButtonEvent::Changed(self.settled));
        }

        let combo = Buttons::UP | Buttons::SELECT;
        if self.settled.contains(combo) {
            let since = *self.combo_since_ms.get_or_insert(now_ms);
            let held_ms = now_ms.wrapping_sub(since);
            if !self.mux_switch_fired && held_ms >= BUTTON_MUX_SWITCH_HOLD_MS {
                self.mux_switch_fired = true;
                event = Some(ButtonEvent::MuxSwitchHold);
            }
        } else {
            self.combo_since_ms = None;
            self.mux_switch_fired = false;
        }

        event
    }

    /// `true` once the settled state has held continuously for at
    /// least [`BUTTON_LONG_PRESS_MS`].
    pub fn is_long_press(&self, buttons: Buttons, now_ms: u32) -> bool {
        self.settled.contains(buttons)
            && now_ms.wrapping_sub(self.candidate_since_ms) >= BUTTON_LONG_PRESS_MS
    }
}

impl Default for ButtonInput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_state_starts_empty() {
        let input = ButtonInput::new();
        assert_eq!(input.settled(), Buttons::empty());
    }

    #[test]
    fn no_event_until_settle_delay_elapses() {
        let mut input = ButtonInput::new();
        assert_eq!(input.sample(Buttons::UP, 0), None);
        assert_eq!(input.sample(Buttons::UP, BUTTON_SETTLE_MS - 1), None);
    }

    #[test]
    fn emits_change_once_settled() {
        let mut input = ButtonInput::new();
        input.sample(Buttons::UP, 0);
        let event = input.sample(Buttons::UP, BUTTON_SETTLE_MS);
        assert_eq!(event, Some(ButtonEvent::Changed(Buttons::UP)));
    }

    #[test]
    fn bouncing_before_settle_resets_the_candidate_timer() {
        let mut input = ButtonInput::new();
        input.sample(Buttons::UP, 0);
        // Bounces back to empty before settling, restarting the clock.
        input.sample(Buttons::empty(), 1);
        let still_nothing = input.sample(Buttons::empty(), BUTTON_SETTLE_MS);
        assert_eq!(still_nothing, None);
    }

    #[test]
    fn repeated_identical_reads_emit_no_further_events() {
        let mut input = ButtonInput::new();
        input.sample(Buttons::DOWN, 0);
        assert!(input.sample(Buttons::DOWN, BUTTON_SETTLE_MS).is_some());
        assert_eq!(input.sample(Buttons::DOWN, BUTTON_SETTLE_MS + 10), None);
    }

    #[test]
    fn up_select_combo_held_long_enough_fires_mux_switch() {
        let mut input = ButtonInput::new();
        let combo = Buttons::UP | Buttons::SELECT;
        input.sample(combo, 0);
        input.sample(combo, BUTTON_SETTLE_MS);
        let event = input.sample(combo, BUTTON_SETTLE_MS + BUTTON_MUX_SWITCH_HOLD_MS);
        assert_eq!(event, Some(ButtonEvent::MuxSwitchHold));
        // Firing again while still held must not repeat.
        let again = input.sample(combo, BUTTON_SETTLE_MS + BUTTON_MUX_SWITCH_HOLD_MS + 100);
        assert_eq!(again, None);
    }

    #[test]
    fn status_packet_carries_settled_mask() {
        let frame = button_status_packet(Buttons::UP | Buttons::POWER);
        assert_eq!(frame[1], (Buttons::UP | Buttons::POWER).bits());
    }

    #[test]
    fn releasing_combo_rearms_mux_switch_detection() {
        let mut input = ButtonInput::new();
        let combo = Buttons::UP | Buttons::SELECT;
        input.sample(combo, 0);
        input.sample(combo, BUTTON_SETTLE_MS + BUTTON_MUX_SWITCH_HOLD_MS);
        input.sample(Buttons::empty(), BUTTON_SETTLE_MS + BUTTON_MUX_SWITCH_HOLD_MS + 50);
        assert!(!input.mux_switch_fired);
    }
}
