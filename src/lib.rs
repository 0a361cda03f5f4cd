#![no_std]

pub mod checksum;
mod command;
pub mod config;
mod frame;
mod gwm;
mod hooks;
pub mod signal;
mod state;

/// Largest payload a CAN FD frame can carry
pub const MAX_DATA_LENGTH: usize = 64;

pub use command::*;
pub use config::{
    CanMsg, LongitudinalLimits, MessageId, RxCheck, SafetyConfig, SteeringLimits, TorqueLimitType,
};
pub use frame::*;
pub use gwm::*;
pub use hooks::*;
pub use state::*;

pub use embedded_can::StandardId;
