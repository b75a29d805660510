//! Physical button GPIO reads, packed into the protocol's
//! [`crate::button::Buttons`] bitmask.

use embedded_hal::digital::InputPin;
use sam_fw::button::Buttons;

pub struct ButtonPins<UP, DOWN, SELECT, POWER> {
    up: UP,
    down: DOWN,
    select: SELECT,
    power: POWER,
}

impl<UP, DOWN, SELECT, POWER, E> ButtonPins<UP, DOWN, SELECT, POWER>
where
    UP: InputPin<Error = E>,
    DOWN: InputPin<Error = E>,
    SELECT: InputPin<Error = E>,
    POWER: InputPin<Error = E>,
{
    pub fn new(up: UP, down: DOWN, select: SELECT, power: POWER) -> Self {
        Self {
            up,
            down,
            select,
            power,
        }
    }

    /// Reads all four lines (active-low, per the reference hardware)
    /// into a single mask. A read failure is treated as "not pressed"
    /// for that line rather than propagated, since a stuck button
    /// should never be able to wedge the rest of the report.
    pub fn read(&mut self) -> Buttons {
        let mut mask = Buttons::empty();
        if self.up.is_low().unwrap_or(false) {
            mask |= Buttons::UP;
        }
        if self.down.is_low().unwrap_or(false) {
            mask |= Buttons::DOWN;
        }
        if self.select.is_low().unwrap_or(false) {
            mask |= Buttons::SELECT;
        }
        if self.power.is_low().unwrap_or(false) {
            mask |= Buttons::POWER;
        }
        mask
    }
}
