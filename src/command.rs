use crate::{
    checksum::{checksum_of, CHECKSUM_BYTE},
    config::MessageId,
    signal::{AP_COUNTER, AP_STATE, AP_STEERING_COMMAND},
    Bus, CanPacket, FrameError,
};

/// Payload length of the AUTOPILOT message
pub const AUTOPILOT_LEN: usize = 8;

/// Contents of one AUTOPILOT steering command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SteerCommand {
    /// Signed steering torque, -1024..=1023
    pub torque: i32,
    /// AP state, 0..=3. Nonzero requests steering.
    pub steer_req: u8,
    /// Rolling counter, 0..=15
    pub counter: u8,
}

impl SteerCommand {
    pub fn new(torque: i32, steer_req: u8, counter: u8) -> Self {
        Self {
            torque,
            steer_req,
            counter,
        }
    }

    /// Packs the command into an AUTOPILOT packet for `bus` with its checksum
    /// filled in.
    pub fn to_packet(&self, bus: Bus) -> Result<CanPacket, EncodeError> {
        let (min, max) = AP_STEERING_COMMAND.range();
        if !(min..=max).contains(&self.torque) {
            return Err(EncodeError::TorqueOutOfRange(self.torque));
        }

        if self.steer_req as u32 > AP_STATE.raw_max() {
            return Err(EncodeError::SteerRequestOutOfRange(self.steer_req));
        }

        if self.counter as u32 > AP_COUNTER.raw_max() {
            return Err(EncodeError::CounterOutOfRange(self.counter));
        }

        let mut data = [0u8; AUTOPILOT_LEN];

        AP_STEERING_COMMAND.pack(&mut data, self.torque as u32);
        AP_STATE.pack(&mut data, self.steer_req as u32);
        AP_COUNTER.pack(&mut data, self.counter as u32);
        data[CHECKSUM_BYTE] = checksum_of(&data);

        Ok(CanPacket::new(MessageId::Autopilot.addr(), bus.into(), &data)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    #[error("Steering torque ({0:?}) does not fit the 11-bit command field")]
    TorqueOutOfRange(i32),
    #[error("Steer request ({0:?}) does not fit the 2-bit AP state field")]
    SteerRequestOutOfRange(u8),
    #[error("Counter ({0:?}) does not fit the 4-bit counter field")]
    CounterOutOfRange(u8),
    #[error("Failed to build the packet")]
    InvalidPacket(#[from] FrameError),
}
