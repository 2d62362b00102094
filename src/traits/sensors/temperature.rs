use crate::domain::temperature::{Temperature, TemperatureScale};

/// A source of temperature readings on some scale.
pub trait TemperatureSensor<S: TemperatureScale> {
    type Error;

    fn temperature(&self) -> Result<Temperature<S>, Self::Error>;
}
