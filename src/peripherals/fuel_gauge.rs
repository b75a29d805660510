//! BQ27441 fuel gauge driver over I2C, implementing
//! [`crate::power::FuelGauge`] so [`crate::power::PowerReporter`] can
//! fall back to its synthetic readings transparently on any I2C
//! failure.

use embedded_hal::i2c::I2c;
use sam_fw::errors::errors::PowerError;
use sam_fw::power::{FuelGauge, Metrics};

const BQ27441_ADDR: u8 = 0x55;

// Standard command register offsets (BQ27441 Technical Reference Manual).
const CMD_TEMPERATURE: u8 = 0x02;
const CMD_VOLTAGE: u8 = 0x04;
const CMD_AVERAGE_CURRENT: u8 = 0x10;
const CMD_STATE_OF_CHARGE: u8 = 0x1C;

pub struct FuelGaugeBq27441<I2C> {
    i2c: I2C,
}

impl<I2C, E> FuelGaugeBq27441<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    fn read_word(&mut self, command: u8) -> Result<u16, PowerError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(BQ27441_ADDR, &[command], &mut buf)
            .map_err(|_| PowerError::I2cError)?;
        Ok(u16::from_le_bytes(buf))
    }
}

impl<I2C, E> FuelGauge for FuelGaugeBq27441<I2C>
where
    I2C: I2c<Error = E>,
{
    fn read(&mut self) -> Result<Metrics, PowerError> {
        let current_raw = self.read_word(CMD_AVERAGE_CURRENT)? as i16;
        let battery_percent = self.read_word(CMD_STATE_OF_CHARGE)? as u8;
        let temperature_01k = self.read_word(CMD_TEMPERATURE)?;
        // BQ27441 reports temperature in 0.1 K; convert to deci-Celsius.
        let temperature_deci_c = (temperature_01k as i32 - 2731) as i16;
        let voltage_mv = self.read_word(CMD_VOLTAGE)?;

        Ok(Metrics {
            current_ma: current_raw,
            battery_percent,
            temperature_deci_c,
            voltage_mv,
        })
    }
}
