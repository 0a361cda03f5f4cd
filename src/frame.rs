use embedded_can::{Id, StandardId};
use heapless::Vec;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::MAX_DATA_LENGTH;

/// Bus identifiers as numbered by the safety runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = FrameError, constructor = FrameError::UnknownBus))]
#[repr(u8)]
pub enum Bus {
    /// Vehicle powertrain CAN, where the stock ECUs live
    Powertrain = 0,
    /// Forward camera / compute CAN
    Camera = 2,
}

/// Represents all the possible DLC values for CAN FD frames.
///
/// The integer value of the enum maps to the DLC used in the CAN protocol and
/// not the actual number of bytes associated with each variant. To obtain
/// that, see [`FdDataLengthCode::get_num_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FdDataLengthCode {
    Bytes0 = 0,
    Bytes1 = 1,
    Bytes2 = 2,
    Bytes3 = 3,
    Bytes4 = 4,
    Bytes5 = 5,
    Bytes6 = 6,
    Bytes7 = 7,
    Bytes8 = 8,
    Bytes12 = 9,
    Bytes16 = 10,
    Bytes20 = 11,
    Bytes24 = 12,
    Bytes32 = 13,
    Bytes48 = 14,
    Bytes64 = 15,
}

impl FdDataLengthCode {
    /// Returns the DLC whose byte count is exactly `length`. Lengths that fall
    /// between two FD sizes (e.g. 10) or exceed 64 return `None`.
    pub fn for_exact_length(length: usize) -> Option<Self> {
        Some(match length {
            x @ 0..=8 => Self::try_from(x as u8).ok()?,
            12 => Self::Bytes12,
            16 => Self::Bytes16,
            20 => Self::Bytes20,
            24 => Self::Bytes24,
            32 => Self::Bytes32,
            48 => Self::Bytes48,
            64 => Self::Bytes64,
            _ => return None,
        })
    }

    /// Returns the number of bytes that this variant can hold, which is
    /// different from the enum's integer value.
    pub fn get_num_bytes(&self) -> usize {
        match self {
            Self::Bytes0 => 0,
            Self::Bytes1 => 1,
            Self::Bytes2 => 2,
            Self::Bytes3 => 3,
            Self::Bytes4 => 4,
            Self::Bytes5 => 5,
            Self::Bytes6 => 6,
            Self::Bytes7 => 7,
            Self::Bytes8 => 8,
            Self::Bytes12 => 12,
            Self::Bytes16 => 16,
            Self::Bytes20 => 20,
            Self::Bytes24 => 24,
            Self::Bytes32 => 32,
            Self::Bytes48 => 48,
            Self::Bytes64 => 64,
        }
    }
}

/// A single CAN frame as seen by the safety hooks: an 11-bit address, the bus
/// it was received on (or is destined for), and up to 64 data bytes.
///
/// Packets are immutable once built. All byte and bit accessors are bounded by
/// the payload length, reads past it yield zero.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanPacket {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    id: StandardId,
    bus: u8,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    data: Vec<u8, MAX_DATA_LENGTH>,
}

impl CanPacket {
    /// Creates a new packet. `data` must have one of the lengths allowed for
    /// CAN FD and `addr` must fit in 11 bits.
    pub fn new(addr: u16, bus: u8, data: &[u8]) -> Result<Self, FrameError> {
        let id = StandardId::new(addr).ok_or(FrameError::StandardIdOutOfRange(addr))?;

        Self::with_id(id, bus, data)
    }

    pub fn with_id(id: StandardId, bus: u8, data: &[u8]) -> Result<Self, FrameError> {
        if data.len() > MAX_DATA_LENGTH {
            return Err(FrameError::DataTooLong(data.len()));
        }

        FdDataLengthCode::for_exact_length(data.len())
            .ok_or(FrameError::InvalidDataLength(data.len()))?;

        Ok(Self {
            id,
            bus,
            data: Vec::from_slice(data).map_err(|_| FrameError::DataTooLong(data.len()))?,
        })
    }

    /// Consumes self and returns the same packet addressed to another bus
    pub fn with_bus(mut self, bus: u8) -> Self {
        self.bus = bus;
        self
    }

    /// The 11-bit message address
    pub fn addr(&self) -> u16 {
        self.id.as_raw()
    }

    pub fn standard_id(&self) -> StandardId {
        self.id
    }

    /// The raw bus number
    pub fn bus(&self) -> u8 {
        self.bus
    }

    pub fn on_bus(&self, bus: Bus) -> bool {
        self.bus == u8::from(bus)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn length_code(&self) -> Option<FdDataLengthCode> {
        FdDataLengthCode::for_exact_length(self.data.len())
    }

    /// Gets the data associated with the packet
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Byte at `index`, or 0 if the payload is shorter than that
    pub fn byte(&self, index: usize) -> u8 {
        self.data.get(index).copied().unwrap_or(0)
    }

    /// Bit `index` counting from payload bit 0, least significant bit first
    /// within each byte.
    pub fn bit(&self, index: usize) -> bool {
        (self.byte(index / 8) >> (index % 8)) & 1 == 1
    }
}

impl embedded_can::Frame for CanPacket {
    /// Only standard ids are accepted. The packet is placed on bus 0.
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Standard(id) => Self::with_id(id, Bus::Powertrain.into(), data).ok(),
            Id::Extended(_) => None,
        }
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        false
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        Id::Standard(self.id)
    }

    fn dlc(&self) -> usize {
        self.data.len()
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    #[error("Received a CAN Standard ID ({0:?}) that was out of the valid range (0..=0x7FF)")]
    StandardIdOutOfRange(u16),
    #[error("Received ({0:?}) bytes of data, more than a CAN FD frame can carry")]
    DataTooLong(usize),
    #[error("Received ({0:?}) bytes of data, which is not a valid CAN FD length")]
    InvalidDataLength(usize),
    #[error("Bus number ({0:?}) is not part of the bus topology")]
    UnknownBus(u8),
    #[error("Address ({0:#x}) is not a known message")]
    UnknownMessage(u16),
}

#[cfg(test)]
mod tests {
    use embedded_can::{ExtendedId, Frame, StandardId};

    use crate::{Bus, CanPacket, FdDataLengthCode, FrameError};

    #[test]
    fn packet_construction_errors() {
        assert_eq!(
            CanPacket::new(0x800, 0, &[]),
            Err(FrameError::StandardIdOutOfRange(0x800))
        );

        assert_eq!(
            CanPacket::new(0x12B, 0, &[0; 9]),
            Err(FrameError::InvalidDataLength(9))
        );

        assert_eq!(
            CanPacket::new(0x12B, 0, &[0; 65]),
            Err(FrameError::DataTooLong(65))
        );

        assert_eq!(Bus::try_from(1u8), Err(FrameError::UnknownBus(1)));
    }

    #[test]
    fn fd_lengths() {
        assert!(CanPacket::new(0x60, 0, &[0; 12]).is_ok());
        assert!(CanPacket::new(0x60, 0, &[0; 64]).is_ok());
        assert_eq!(FdDataLengthCode::for_exact_length(13), None);
        assert_eq!(
            FdDataLengthCode::for_exact_length(48).map(|dlc| dlc.get_num_bytes()),
            Some(48)
        );
    }

    #[test]
    fn accessors_stay_within_length() {
        let packet = CanPacket::new(0x103, 0, &[0x01, 0x80, 0xFF]).unwrap();

        assert_eq!(packet.addr(), 0x103);
        assert_eq!(packet.len(), 3);
        assert_eq!(packet.byte(2), 0xFF);
        assert_eq!(packet.byte(3), 0);
        assert_eq!(packet.byte(63), 0);

        assert!(packet.bit(0));
        assert!(!packet.bit(1));
        assert!(packet.bit(15));
        assert!(!packet.bit(14));
        assert!(!packet.bit(24));
    }

    #[test]
    fn bus_matching() {
        let packet = CanPacket::new(0x12B, 2, &[0; 8]).unwrap();

        assert!(packet.on_bus(Bus::Camera));
        assert!(!packet.on_bus(Bus::Powertrain));
        assert!(packet.with_bus(0).on_bus(Bus::Powertrain));
    }

    #[test]
    fn embedded_can_frame() {
        let packet = <CanPacket as Frame>::new(StandardId::MAX, &[1, 2]).unwrap();

        assert_eq!(packet.bus(), 0);
        assert_eq!(Frame::dlc(&packet), 2);
        assert!(packet.is_standard());
        assert!(packet.is_data_frame());

        assert_eq!(<CanPacket as Frame>::new(ExtendedId::MAX, &[]), None);
        assert_eq!(CanPacket::new_remote(StandardId::ZERO, 0), None);
    }
}
