//! Rolling checksum and counter primitives handed to the generic RX auditor.

use crate::{
    signal::{AP_CHECKSUM, AP_COUNTER},
    CanPacket,
};

pub const CHECKSUM_SEED: u8 = 0xFF;

/// Payload offset of the checksum byte, excluded from its own computation
pub const CHECKSUM_BYTE: usize = 4;

/// Order-significant lookup, indexed by the low five bits of
/// `checksum ^ byte`.
pub const CRC_LOOKUP: [u8; 32] = [
    0x00, 0x1D, 0x3A, 0x27, 0x74, 0x69, 0x4E, 0x53, 0xE8, 0xF5, 0xD2, 0xCF, 0x9C, 0x81, 0xA6, 0xBB,
    0xCD, 0xD0, 0xF7, 0xEA, 0xB9, 0xA4, 0x83, 0x9E, 0x25, 0x38, 0x1F, 0x02, 0x51, 0x4C, 0x6B, 0x76,
];

/// Checksum over every payload byte except [`CHECKSUM_BYTE`].
pub fn compute_checksum(packet: &CanPacket) -> u8 {
    checksum_of(packet.data())
}

pub(crate) fn checksum_of(data: &[u8]) -> u8 {
    data.iter()
        .enumerate()
        .filter(|(i, _)| *i != CHECKSUM_BYTE)
        .fold(CHECKSUM_SEED, |checksum, (_, byte)| {
            CRC_LOOKUP[((checksum ^ byte) & 0x1F) as usize]
        })
}

/// The checksum as transmitted, byte 4 verbatim
pub fn get_checksum(packet: &CanPacket) -> u8 {
    AP_CHECKSUM.extract(packet) as u8
}

/// 4-bit rolling counter, high nibble of byte 3
pub fn get_counter(packet: &CanPacket) -> u8 {
    AP_COUNTER.extract(packet) as u8
}
