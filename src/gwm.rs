//! Safety mode for the GWM Haval H6 PHEV.
//!
//! The vehicle sits on the powertrain bus (0) and the forward camera on bus 2.
//! Everything is relayed between the two except the camera's own AUTOPILOT
//! message, which is replaced by ours.

use log::{debug, trace, warn};

use crate::{
    checksum,
    config::{MessageId, GWM_RX_CHECKS, GWM_STEERING_LIMITS, GWM_TX_MSGS},
    signal::{
        AP_STATE, AP_STEERING_COMMAND, BRAKE_SIGNAL, GAS_POSITION, STEERING_TORQUE, VEHICLE_SPEED,
    },
    Bus, CanPacket, SafetyConfig, SafetyHooks, SafetyRuntime, SafetyState,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GwmSafety;

impl GwmSafety {
    pub const fn new() -> Self {
        Self
    }
}

impl SafetyHooks for GwmSafety {
    fn init(&self, param: u16) -> SafetyConfig {
        debug!("gwm safety init, param {:#06x} unused", param);

        SafetyConfig {
            rx_checks: &GWM_RX_CHECKS,
            tx_msgs: &GWM_TX_MSGS,
            disable_forwarding: false,
        }
    }

    fn rx(&self, state: &mut SafetyState, runtime: &mut dyn SafetyRuntime, packet: &CanPacket) {
        let from_vehicle = packet.on_bus(Bus::Powertrain);
        let message = MessageId::try_from(packet.addr()).ok();

        match message {
            Some(MessageId::SteerAndApStalk) if from_vehicle => {
                state.torque_driver.update(STEERING_TORQUE.decode(packet));
            }
            Some(MessageId::Speed) if from_vehicle => {
                let moving = VEHICLE_SPEED.extract(packet) > 0;
                if moving != state.vehicle_moving {
                    debug!("vehicle moving: {}", moving);
                }
                state.vehicle_moving = moving;
            }
            Some(MessageId::CarOverallSignals2) if from_vehicle => {
                let gas_pressed = GAS_POSITION.extract(packet) > 0;
                let brake_pressed = BRAKE_SIGNAL.extract(packet) == 1;
                if gas_pressed != state.gas_pressed || brake_pressed != state.brake_pressed {
                    debug!("gas pressed: {}, brake pressed: {}", gas_pressed, brake_pressed);
                }
                state.gas_pressed = gas_pressed;
                state.brake_pressed = brake_pressed;
            }
            Some(MessageId::Autopilot) if from_vehicle => {
                runtime.pcm_cruise_check(AP_STATE.extract(packet) != 0);
            }
            _ => {}
        }

        runtime.generic_rx_checks(message == Some(MessageId::Autopilot) && from_vehicle);
    }

    fn tx(
        &self,
        state: &SafetyState,
        runtime: &mut dyn SafetyRuntime,
        packet: &CanPacket,
    ) -> bool {
        if packet.addr() != MessageId::Autopilot.addr() {
            return true;
        }

        // relay malfunction: never inject the actuation message on the vehicle side
        if packet.on_bus(Bus::Powertrain) {
            warn!("blocked AUTOPILOT on powertrain bus");
            return false;
        }

        let steer_req = AP_STATE.extract(packet) != 0;
        let desired_torque = AP_STEERING_COMMAND.decode(packet);

        let violation =
            runtime.steer_torque_cmd_checks(state, desired_torque, steer_req, &GWM_STEERING_LIMITS);

        if violation {
            warn!(
                "blocked steering command: torque {}, steer_req {}",
                desired_torque, steer_req
            );
            return false;
        }

        true
    }

    fn fwd(&self, bus_num: u8, addr: u16) -> Option<Bus> {
        match Bus::try_from(bus_num).ok()? {
            Bus::Powertrain => Some(Bus::Camera),
            Bus::Camera if addr == MessageId::Autopilot.addr() => {
                trace!("dropping camera AUTOPILOT");
                None
            }
            Bus::Camera => Some(Bus::Powertrain),
        }
    }

    fn get_counter(&self, packet: &CanPacket) -> u8 {
        checksum::get_counter(packet)
    }

    fn get_checksum(&self, packet: &CanPacket) -> u32 {
        checksum::get_checksum(packet).into()
    }

    fn compute_checksum(&self, packet: &CanPacket) -> u32 {
        checksum::compute_checksum(packet).into()
    }
}
