use heapless::HistoryBuffer;

/// Number of driver torque readings kept in the rolling window
pub const SAMPLE_LEN: usize = 6;

/// Rolling window over the most recent driver torque readings, tracking the
/// window's extremes. Starts out filled with zeros.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TorqueSample {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    values: HistoryBuffer<i32, SAMPLE_LEN>,
    min: i32,
    max: i32,
}

impl Default for TorqueSample {
    fn default() -> Self {
        Self {
            values: HistoryBuffer::new_with(0),
            min: 0,
            max: 0,
        }
    }
}

impl TorqueSample {
    pub fn update(&mut self, value: i32) {
        self.values.write(value);

        let window = self.values.as_slice();
        self.min = window.iter().copied().min().unwrap_or(0);
        self.max = window.iter().copied().max().unwrap_or(0);
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// The most recent reading
    pub fn latest(&self) -> i32 {
        self.values.recent().copied().unwrap_or(0)
    }
}

/// Safety-relevant vehicle state observed on the receive path.
///
/// Only the receive hook mutates it. Transmit checks and the host read it
/// between frames. A host that processes buses on separate threads must
/// synchronize access itself.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SafetyState {
    pub(crate) torque_driver: TorqueSample,
    pub(crate) vehicle_moving: bool,
    pub(crate) gas_pressed: bool,
    pub(crate) brake_pressed: bool,
}

impl SafetyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn torque_driver(&self) -> &TorqueSample {
        &self.torque_driver
    }

    pub fn vehicle_moving(&self) -> bool {
        self.vehicle_moving
    }

    pub fn gas_pressed(&self) -> bool {
        self.gas_pressed
    }

    pub fn brake_pressed(&self) -> bool {
        self.brake_pressed
    }
}
