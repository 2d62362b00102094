//! Contract with the sensor-module hardware hosting the thermistor channels.

/// Logical sensing channel on the module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorChannel {
    A,
    B,
}

impl SensorChannel {
    pub const fn index(self) -> usize {
        match self {
            SensorChannel::A => 0,
            SensorChannel::B => 1,
        }
    }
}

/// Bias applied to a sensing line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None,
    Up4k7,
}

/// Sensor-module control surface.
pub trait SensorModule {
    type Error;

    /// Ready the module and its shared analog front end. Idempotent.
    fn init(&self) -> Result<(), Self::Error>;

    /// Switch the bias resistor on a sensing line.
    fn set_pull(&self, channel: SensorChannel, pull: Pull);
}
