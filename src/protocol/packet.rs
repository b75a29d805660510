//! Fixed 4-byte packet codec (C1): `(type_flags, data0, data1, checksum)`
//! with an 8-bit CRC over the first three bytes.
//!
//! Pure, stateless and allocation-free by construction: every function
//! here takes its input by value or `&[u8; N]` and returns a plain
//! struct, so the codec never touches the ring buffer or the wire.

use crate::config::CRC8_POLY;
use crate::errors::errors::CrcError;

/// High 3 bits of `type_flags`: which of the ten packet kinds this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub enum Kind {
    Button,
    Led,
    Power,
    Display,
    DebugCode,
    DebugText,
    System,
    Extended,
}

impl Kind {
    /// Decodes the kind from the top 3 bits of a `type_flags` byte.
    pub const fn from_high3(type_flags: u8) -> Self {
        match type_flags >> 5 {
            0b000 => Kind::Button,
            0b001 => Kind::Led,
            0b010 => Kind::Power,
            0b011 => Kind::Display,
            0b100 => Kind::DebugCode,
            0b101 => Kind::DebugText,
            0b110 => Kind::System,
            _ => Kind::Extended,
        }
    }

    /// Encodes the kind into the top 3 bits of a `type_flags` byte.
    pub const fn high3(self) -> u8 {
        (match self {
            Kind::Button => 0b000,
            Kind::Led => 0b001,
            Kind::Power => 0b010,
            Kind::Display => 0b011,
            Kind::DebugCode => 0b100,
            Kind::DebugText => 0b101,
            Kind::System => 0b110,
            Kind::Extended => 0b111,
        }) << 5
    }
}

/// A decoded, CRC-verified 4-byte protocol frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub struct Packet {
    pub kind: Kind,
    /// Low 5 bits of `type_flags`; meaning depends on `kind`.
    pub sub_flags: u8,
    pub data0: u8,
    pub data1: u8,
}

impl Packet {
    /// Raw `type_flags` byte (kind in the high 3 bits, sub-flags in the
    /// low 5).
    pub const fn type_flags(&self) -> u8 {
        self.kind.high3() | (self.sub_flags & 0x1F)
    }
}

/// Computes CRC8 (poly 0x07, init 0x00, no reflection, no final XOR) over
/// `bytes`.
pub fn crc8(bytes: &[u8]) -> u8 {
    let mut crc: u8 = 0x00;
    for &byte in bytes {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Encodes a packet into its 4-byte wire representation, computing the
/// trailing CRC8 automatically.
pub fn encode(kind: Kind, sub_flags: u8, data0: u8, data1: u8) -> [u8; 4] {
    let type_flags = kind.high3() | (sub_flags & 0x1F);
    let checksum = crc8(&[type_flags, data0, data1]);
    [type_flags, data0, data1, checksum]
}

/// Decodes and CRC-validates a 4-byte wire frame.
///
/// # Errors
/// Returns `CrcError::Mismatch` if the trailing byte does not match the
/// CRC8 of the first three bytes.
pub fn decode(frame: &[u8; 4]) -> Result<Packet, CrcError> {
    let [type_flags, data0, data1, checksum] = *frame;
    if crc8(&[type_flags, data0, data1]) != checksum {
        return Err(CrcError::Mismatch);
    }
    Ok(Packet {
        kind: Kind::from_high3(type_flags),
        sub_flags: type_flags & 0x1F,
        data0,
        data1,
    })
}

/// `true` if `frame`'s trailing byte is a valid CRC8 of the first three.
pub fn crc_valid(frame: &[u8; 4]) -> bool {
    crc8(&frame[..3]) == frame[3]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc8_known_vector() {
        // CRC8/SMBUS-style poly 0x07 over a single zero byte is 0x00.
        assert_eq!(crc8(&[0x00]), 0x00);
    }

    #[test]
    fn round_trip_all_kinds() {
        let kinds = [
            Kind::Button,
            Kind::Led,
            Kind::Power,
            Kind::Display,
            Kind::DebugCode,
            Kind::DebugText,
            Kind::System,
            Kind::Extended,
        ];
        for kind in kinds {
            for sub in [0x00u8, 0x01, 0x1F, 0x07] {
                let frame = encode(kind, sub, 0xAB, 0xCD);
                let decoded = decode(&frame).expect("valid frame must decode");
                assert_eq!(decoded.kind, kind);
                assert_eq!(decoded.sub_flags, sub & 0x1F);
                assert_eq!(decoded.data0, 0xAB);
                assert_eq!(decoded.data1, 0xCD);
            }
        }
    }

    #[test]
    fn mutating_any_byte_breaks_crc_almost_always() {
        let frame = encode(Kind::System, 0x00, 0x00, 0x00);
        let mut failures = 0u32;
        let mut total = 0u32;
        for byte_idx in 0..4 {
            for bit in 0..8u8 {
                let mut mutated = frame;
                mutated[byte_idx] ^= 1 << bit;
                total += 1;
                if decode(&mutated).is_err() {
                    failures += 1;
                }
            }
        }
        // Single-bit corruption over an 8-bit CRC must be caught every time.
        assert_eq!(failures, total);
    }

    #[test]
    fn ping_pong_s1_shape() {
        // Host ping / MCU pong both carry TYPE_SYSTEM with sub-flags 0x00
        // and 0x01 respectively (spec.md S1); the CRC is whatever crc8()
        // computes for that frame, not a fixed literal.
        let ping = encode(Kind::System, 0x00, 0x00, 0x00);
        let decoded = decode(&ping).expect("ping frame is valid");
        assert_eq!(decoded.kind, Kind::System);
        assert_eq!(decoded.sub_flags, 0x00);

        let pong = encode(Kind::System, 0x00, 0x01, 0x00);
        let decoded = decode(&pong).expect("pong frame is valid");
        assert_eq!(decoded.kind, Kind::System);
        assert_eq!(decoded.data0, 0x01);
    }

    #[test]
    fn crc8_smbus_check_value() {
        // Reference check value for CRC-8/SMBUS (poly 0x07, init 0x00,
        // no reflection, no xorout) over ASCII "123456789" is 0xF4.
        assert_eq!(crc8(b"123456789"), 0xF4);
    }

    #[test]
    fn extended_kind_is_reserved() {
        let frame = encode(Kind::Extended, 0x1F, 0x00, 0x00);
        let decoded = decode(&frame).unwrap();
        assert_eq!(decoded.kind, Kind::Extended);
    }
}
