use crate::{Bus, CanPacket, SafetyConfig, SafetyState, SteeringLimits};

/// The seven operations a vehicle safety mode provides to the host runtime.
///
/// Hooks are called once per frame from a single dispatch loop and must not
/// block. `rx` is the only operation that mutates [`SafetyState`].
pub trait SafetyHooks {
    /// Returns the static RX/TX tables. `param` is the mode's opaque
    /// parameter word.
    fn init(&self, param: u16) -> SafetyConfig;

    /// Inspects a received packet and updates the safety state.
    fn rx(&self, state: &mut SafetyState, runtime: &mut dyn SafetyRuntime, packet: &CanPacket);

    /// Returns whether the packet may be transmitted.
    fn tx(
        &self,
        state: &SafetyState,
        runtime: &mut dyn SafetyRuntime,
        packet: &CanPacket,
    ) -> bool;

    /// Returns the bus a packet received on `bus_num` is relayed to, if any.
    fn fwd(&self, bus_num: u8, addr: u16) -> Option<Bus>;

    fn get_counter(&self, packet: &CanPacket) -> u8;

    fn get_checksum(&self, packet: &CanPacket) -> u32;

    fn compute_checksum(&self, packet: &CanPacket) -> u32;
}

/// Shared safety infrastructure owned by the host and called from the hooks
pub trait SafetyRuntime {
    /// Cruise engagement tracker, fed with the engagement state read from the
    /// vehicle.
    fn pcm_cruise_check(&mut self, cruise_engaged: bool);

    /// Frequency, counter and checksum auditor. Called after every received
    /// packet. `stock_ecu_detected` is set when the actuation message was seen
    /// coming from the vehicle side.
    fn generic_rx_checks(&mut self, stock_ecu_detected: bool);

    /// Steering torque state machine: magnitude, rate, real-time delta and
    /// driver override. Returns `true` when the command violates the limits.
    fn steer_torque_cmd_checks(
        &mut self,
        state: &SafetyState,
        desired_torque: i32,
        steer_req: bool,
        limits: &SteeringLimits,
    ) -> bool;
}
