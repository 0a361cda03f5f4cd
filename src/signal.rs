/*!
 * Bit layouts of every signal the safety hooks read or write. Each signal is a
 * constant descriptor, checked for consistency at compile time, so no call
 * site does its own shifting and masking.
 */

use crate::CanPacket;

/// One contiguous span of bits within a single byte of the payload.
///
/// Describes a mapping: "take `num_bits` consecutive bits starting at
/// `bit_offset` in `data[byte_index]`, and place them at `value_shift`
/// in the raw value."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitSpan {
    pub byte_index: usize,
    /// Lowest bit position within the byte (0..=7)
    pub bit_offset: u8,
    /// How many consecutive bits in this span (1..=8)
    pub num_bits: u8,
    /// Where these bits land in the raw value, LSB-relative
    pub value_shift: u8,
}

impl BitSpan {
    pub const fn new(byte_index: usize, bit_offset: u8, num_bits: u8, value_shift: u8) -> Self {
        Self {
            byte_index,
            bit_offset,
            num_bits,
            value_shift,
        }
    }

    /// A whole byte landing at `value_shift`
    pub const fn byte(byte_index: usize, value_shift: u8) -> Self {
        Self::new(byte_index, 0, 8, value_shift)
    }

    const fn mask(&self) -> u8 {
        ((1u16 << self.num_bits) - 1) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signedness {
    Unsigned,
    /// Two's complement over `Signal::size` bits
    Signed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Signal {
    pub name: &'static str,
    pub spans: &'static [BitSpan],
    /// Width of the raw value in bits (1..=32)
    pub size: u8,
    pub signedness: Signedness,
}

impl Signal {
    /// Checks that the spans stay inside their bytes, do not overlap in the
    /// raw value, and together cover exactly `size` bits.
    pub const fn is_well_formed(&self) -> bool {
        if self.size == 0 || self.size > 32 || self.spans.is_empty() {
            return false;
        }

        let mut covered = 0u64;
        let mut i = 0;
        while i < self.spans.len() {
            let span = self.spans[i];
            if span.num_bits == 0 || span.bit_offset as u16 + span.num_bits as u16 > 8 {
                return false;
            }
            if span.value_shift as u16 + span.num_bits as u16 > self.size as u16 {
                return false;
            }

            let bits = (span.mask() as u64) << span.value_shift;
            if covered & bits != 0 {
                return false;
            }
            covered |= bits;
            i += 1;
        }

        covered == (1u64 << self.size) - 1
    }

    /// Extract the raw unsigned value from the packet.
    ///
    /// Bytes past the packet's length read as zero.
    pub fn extract(&self, packet: &CanPacket) -> u32 {
        self.spans.iter().fold(0, |raw, span| {
            let bits = (packet.byte(span.byte_index) >> span.bit_offset) & span.mask();
            raw | ((bits as u32) << span.value_shift)
        })
    }

    /// Extract the value, sign-extended when the signal is signed
    pub fn decode(&self, packet: &CanPacket) -> i32 {
        let raw = self.extract(packet);

        match self.signedness {
            Signedness::Unsigned => raw as i32,
            Signedness::Signed => sign_extend(raw, self.size),
        }
    }

    /// Pack a raw value into `data`, clearing the target bits first. Spans
    /// beyond the end of `data` are skipped.
    pub fn pack(&self, data: &mut [u8], raw: u32) {
        for span in self.spans {
            if let Some(byte) = data.get_mut(span.byte_index) {
                let bits = ((raw >> span.value_shift) as u8) & span.mask();
                *byte &= !(span.mask() << span.bit_offset);
                *byte |= bits << span.bit_offset;
            }
        }
    }

    /// Largest value the raw field can hold
    pub const fn raw_max(&self) -> u32 {
        ((1u64 << self.size) - 1) as u32
    }

    /// Inclusive range of decoded values
    pub const fn range(&self) -> (i32, i32) {
        match self.signedness {
            Signedness::Unsigned => (0, self.raw_max() as i32),
            Signedness::Signed => {
                let half = 1i64 << (self.size - 1);
                (-half as i32, (half - 1) as i32)
            }
        }
    }
}

/// Sign-extends the low `size` bits of `raw` using two's complement.
pub const fn sign_extend(raw: u32, size: u8) -> i32 {
    let shift = 32 - size as u32;
    ((raw << shift) as i32) >> shift
}

/* STEER_AND_AP_STALK */

/// Driver steering torque, bytes 3 and 4 read as one big-endian word. Sign
/// handling is left to the torque sampler.
pub const STEERING_TORQUE: Signal = Signal {
    name: "STEERING_TORQUE",
    spans: &[BitSpan::byte(3, 8), BitSpan::byte(4, 0)],
    size: 16,
    signedness: Signedness::Unsigned,
};

/* SPEED */

/// Byte 7 of the speed frame. Any nonzero value means the vehicle is moving.
pub const VEHICLE_SPEED: Signal = Signal {
    name: "SPEED",
    spans: &[BitSpan::byte(7, 0)],
    size: 8,
    signedness: Signedness::Unsigned,
};

/* CAR_OVERALL_SIGNALS2 */

pub const GAS_POSITION: Signal = Signal {
    name: "GAS_POSITION",
    spans: &[BitSpan::byte(9, 0)],
    size: 8,
    signedness: Signedness::Unsigned,
};

/// Payload bit 86: byte 10, bit 6
pub const BRAKE_SIGNAL: Signal = Signal {
    name: "BRAKE_SIGNAL",
    spans: &[BitSpan::new(86 / 8, 86 % 8, 1, 0)],
    size: 1,
    signedness: Signedness::Unsigned,
};

/* AUTOPILOT */

/// Bits 2-3 of byte 2. Nonzero means engaged / steering requested.
pub const AP_STATE: Signal = Signal {
    name: "AP_STATE",
    spans: &[BitSpan::new(2, 2, 2, 0)],
    size: 2,
    signedness: Signedness::Unsigned,
};

/// Commanded steering torque. Byte 1 holds the high eight bits, the top three
/// bits of byte 0 the low three.
pub const AP_STEERING_COMMAND: Signal = Signal {
    name: "AP_STEERING_UNDEFINED_SIGNAL1",
    spans: &[BitSpan::byte(1, 3), BitSpan::new(0, 5, 3, 0)],
    size: 11,
    signedness: Signedness::Signed,
};

/// Rolling counter in the high nibble of byte 3
pub const AP_COUNTER: Signal = Signal {
    name: "AP_COUNTER",
    spans: &[BitSpan::new(3, 4, 4, 0)],
    size: 4,
    signedness: Signedness::Unsigned,
};

pub const AP_CHECKSUM: Signal = Signal {
    name: "AP_CHECKSUM",
    spans: &[BitSpan::byte(4, 0)],
    size: 8,
    signedness: Signedness::Unsigned,
};

pub const ALL_SIGNALS: &[Signal] = &[
    STEERING_TORQUE,
    VEHICLE_SPEED,
    GAS_POSITION,
    BRAKE_SIGNAL,
    AP_STATE,
    AP_STEERING_COMMAND,
    AP_COUNTER,
    AP_CHECKSUM,
];

const _: () = {
    let mut i = 0;
    while i < ALL_SIGNALS.len() {
        assert!(ALL_SIGNALS[i].is_well_formed());
        i += 1;
    }
};

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(data: &[u8]) -> CanPacket {
        CanPacket::new(0x12B, 0, data).unwrap()
    }

    #[test]
    fn malformed_layouts_are_rejected() {
        const OVERLAPPING: Signal = Signal {
            name: "overlapping",
            spans: &[BitSpan::byte(0, 0), BitSpan::new(1, 0, 4, 4)],
            size: 12,
            signedness: Signedness::Unsigned,
        };
        assert!(!OVERLAPPING.is_well_formed());

        const GAP: Signal = Signal {
            name: "gap",
            spans: &[BitSpan::new(0, 0, 4, 0), BitSpan::new(1, 0, 4, 8)],
            size: 12,
            signedness: Signedness::Unsigned,
        };
        assert!(!GAP.is_well_formed());

        const OUTSIDE_BYTE: Signal = Signal {
            name: "outside_byte",
            spans: &[BitSpan::new(0, 6, 4, 0)],
            size: 4,
            signedness: Signedness::Unsigned,
        };
        assert!(!OUTSIDE_BYTE.is_well_formed());
    }

    #[test]
    fn sign_extension() {
        assert_eq!(sign_extend(0x7FF, 11), -1);
        assert_eq!(sign_extend(0x000, 11), 0);
        assert_eq!(sign_extend(0x400, 11), -1024);
        assert_eq!(sign_extend(0x3FF, 11), 1023);
        assert_eq!(AP_STEERING_COMMAND.range(), (-1024, 1023));
    }

    #[test]
    fn steering_command_layout() {
        // 0x7FF: byte 1 = 0xFF, byte 0 top bits = 0b111
        assert_eq!(AP_STEERING_COMMAND.decode(&packet(&[0xE0, 0xFF, 0, 0, 0, 0, 0, 0])), -1);
        // 0x400: only the MSB of byte 1
        assert_eq!(AP_STEERING_COMMAND.decode(&packet(&[0x00, 0x80, 0, 0, 0, 0, 0, 0])), -1024);
        // low bits of byte 0 are not part of the field
        assert_eq!(AP_STEERING_COMMAND.decode(&packet(&[0x1F, 0x00, 0, 0, 0, 0, 0, 0])), 0);
        // 0x005: byte 0 = 0b101_00000
        assert_eq!(AP_STEERING_COMMAND.decode(&packet(&[0xA0, 0x00, 0, 0, 0, 0, 0, 0])), 5);
    }

    #[test]
    fn ap_state_layout() {
        assert_eq!(AP_STATE.extract(&packet(&[0, 0, 0b0000_0100, 0, 0, 0, 0, 0])), 1);
        assert_eq!(AP_STATE.extract(&packet(&[0, 0, 0b0000_1100, 0, 0, 0, 0, 0])), 3);
        assert_eq!(AP_STATE.extract(&packet(&[0, 0, 0b1111_0011, 0, 0, 0, 0, 0])), 0);
    }

    #[test]
    fn steering_torque_is_big_endian_word() {
        let data = [0, 0, 0, 0x12, 0x34, 0, 0, 0];
        assert_eq!(STEERING_TORQUE.extract(&packet(&data)), 0x1234);
    }

    #[test]
    fn brake_bit_position() {
        let mut data = [0u8; 12];
        data[10] = 1 << 6;
        assert_eq!(BRAKE_SIGNAL.extract(&packet(&data)), 1);

        data[10] = !(1 << 6);
        assert_eq!(BRAKE_SIGNAL.extract(&packet(&data)), 0);
    }

    #[test]
    fn fields_past_length_read_zero() {
        assert_eq!(GAS_POSITION.extract(&packet(&[0xFF; 8])), 0);
        assert_eq!(BRAKE_SIGNAL.extract(&packet(&[0xFF; 8])), 0);
    }

    #[test]
    fn pack_preserves_neighbouring_bits() {
        let mut data = [0xFFu8; 8];
        AP_STEERING_COMMAND.pack(&mut data, 0);

        assert_eq!(data[0], 0x1F);
        assert_eq!(data[1], 0x00);
        assert_eq!(data[2], 0xFF);

        AP_COUNTER.pack(&mut data, 0xA);
        assert_eq!(data[3], 0xAF);
    }
}
