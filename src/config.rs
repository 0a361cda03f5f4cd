use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{Bus, CanPacket, FrameError};

/// Addresses of the messages the safety hooks care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = FrameError, constructor = FrameError::UnknownMessage))]
#[repr(u16)]
pub enum MessageId {
    /// Pedal and brake bits
    CarOverallSignals2 = 0x60,
    /// Driver steering torque and AP stalk
    SteerAndApStalk = 0xA1,
    Speed = 0x103,
    /// Actuation heartbeat: AP state and the commanded steering torque
    Autopilot = 0x12B,
    Brake = 0x137,
}

impl MessageId {
    pub fn addr(self) -> u16 {
        self.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TorqueLimitType {
    /// Allowed torque is bounded relative to the measured driver torque
    DriverLimited,
    /// Allowed torque is bounded relative to the measured motor torque
    MotorLimited,
}

/// Limits handed to the steering torque checker. Never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SteeringLimits {
    pub max_torque: i32,
    pub dynamic_max_torque: bool,
    pub max_rate_up: i32,
    pub max_rate_down: i32,
    pub max_rt_delta: i32,
    pub limit_type: TorqueLimitType,
    pub driver_torque_allowance: i32,
    pub driver_torque_multiplier: i32,
    pub max_torque_error: i32,
    pub min_valid_request_frames: u32,
    pub max_invalid_request_frames: u32,
    /// Microseconds
    pub min_valid_request_rt_interval: u32,
    pub has_steer_req_tolerance: bool,
}

/// Acceleration limits in 0.001 m/s^2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LongitudinalLimits {
    pub max_accel: i32,
    pub min_accel: i32,
    pub inactive_accel: i32,
}

/// An entry of the transmit allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanMsg {
    pub addr: u16,
    pub bus: Bus,
    pub len: usize,
    /// Seeing this address from a stock ECU on this bus means the relay failed
    pub check_relay: bool,
}

/// A message the RX auditor expects to see at a fixed rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxCheck {
    pub addr: u16,
    pub bus: Bus,
    pub len: usize,
    /// Hz
    pub frequency: u32,
}

/// Static tables returned from `init`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SafetyConfig {
    pub rx_checks: &'static [RxCheck],
    pub tx_msgs: &'static [CanMsg],
    pub disable_forwarding: bool,
}

impl SafetyConfig {
    /// Looks the packet up in the transmit allow-list by address, bus and
    /// length.
    pub fn tx_allowed(&self, packet: &CanPacket) -> Option<&'static CanMsg> {
        self.tx_msgs.iter().find(|msg| {
            msg.addr == packet.addr() && packet.on_bus(msg.bus) && msg.len == packet.len()
        })
    }

    /// The RX check covering this packet's address and bus, if any
    pub fn rx_check(&self, packet: &CanPacket) -> Option<&'static RxCheck> {
        self.rx_checks
            .iter()
            .find(|check| check.addr == packet.addr() && packet.on_bus(check.bus))
    }
}

pub const GWM_STEERING_LIMITS: SteeringLimits = SteeringLimits {
    max_torque: 1023,
    dynamic_max_torque: false,
    max_rate_up: 15,
    max_rate_down: 25,
    max_rt_delta: 112,
    limit_type: TorqueLimitType::DriverLimited,
    driver_torque_allowance: 50,
    driver_torque_multiplier: 1,
    max_torque_error: 350,
    min_valid_request_frames: 1,
    max_invalid_request_frames: 1,
    min_valid_request_rt_interval: 170_000,
    has_steer_req_tolerance: false,
};

/// Not enforced by any transmit check yet, no longitudinal message is sent.
pub const GWM_LONG_LIMITS: LongitudinalLimits = LongitudinalLimits {
    max_accel: 2000,
    min_accel: -3500,
    inactive_accel: 0,
};

pub const GWM_TX_MSGS: [CanMsg; 2] = [
    CanMsg {
        addr: MessageId::Autopilot as u16,
        bus: Bus::Powertrain,
        len: 8,
        check_relay: true,
    },
    CanMsg {
        addr: MessageId::Autopilot as u16,
        bus: Bus::Camera,
        len: 8,
        check_relay: false,
    },
];

const fn rx_check(id: MessageId) -> RxCheck {
    RxCheck {
        addr: id as u16,
        bus: Bus::Powertrain,
        len: 8,
        frequency: 50,
    }
}

pub const GWM_RX_CHECKS: [RxCheck; 4] = [
    rx_check(MessageId::SteerAndApStalk),
    rx_check(MessageId::Speed),
    rx_check(MessageId::CarOverallSignals2),
    rx_check(MessageId::Autopilot),
];

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: SafetyConfig = SafetyConfig {
        rx_checks: &GWM_RX_CHECKS,
        tx_msgs: &GWM_TX_MSGS,
        disable_forwarding: false,
    };

    #[test]
    fn message_ids() {
        assert_eq!(MessageId::try_from(0x12B_u16), Ok(MessageId::Autopilot));
        assert_eq!(MessageId::Brake.addr(), 0x137);
        assert_eq!(
            MessageId::try_from(0x7FF_u16),
            Err(FrameError::UnknownMessage(0x7FF))
        );
    }

    #[test]
    fn allow_list_lookup() {
        let on_camera = CanPacket::new(0x12B, 2, &[0; 8]).unwrap();
        let msg = CONFIG.tx_allowed(&on_camera).unwrap();
        assert_eq!(msg.bus, Bus::Camera);
        assert!(!msg.check_relay);

        let on_powertrain = on_camera.clone().with_bus(0);
        assert!(CONFIG.tx_allowed(&on_powertrain).unwrap().check_relay);

        // wrong length, unknown bus, unknown address
        assert_eq!(CONFIG.tx_allowed(&CanPacket::new(0x12B, 2, &[0; 4]).unwrap()), None);
        assert_eq!(CONFIG.tx_allowed(&on_camera.with_bus(1)), None);
        assert_eq!(CONFIG.tx_allowed(&CanPacket::new(0xA1, 0, &[0; 8]).unwrap()), None);
    }

    #[test]
    fn rx_check_lookup() {
        let speed = CanPacket::new(0x103, 0, &[0; 8]).unwrap();
        assert_eq!(CONFIG.rx_check(&speed).map(|check| check.frequency), Some(50));
        assert_eq!(CONFIG.rx_check(&speed.with_bus(2)), None);

        // the brake message is decoded nowhere and not audited
        assert_eq!(CONFIG.rx_check(&CanPacket::new(0x137, 0, &[0; 8]).unwrap()), None);
    }
}
