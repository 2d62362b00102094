//! Contract with the analog front end shared by the sensor channels.

/// ADC input the front end can sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcChannel {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
}

/// Alignment of the raw conversion result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleFormat {
    Bits8,
    Bits16,
    Bits24,
    Bits32,
}

/// Outcome of one asynchronous conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcEvent {
    Done,
    Error,
}

/// Receiver for conversion outcomes, bound to whatever context it captures.
pub trait AdcEventHandler {
    fn on_adc_event(&self, channel: AdcChannel, event: AdcEvent);
}

/// Asynchronous analog front end.
///
/// `start_read` returns immediately; the front end delivers exactly one
/// [`AdcEvent`] to the subscribed handler for every started conversion.
pub trait AnalogFrontEnd {
    /// Configure a channel for the given result format.
    fn init(&self, channel: AdcChannel, format: SampleFormat);

    /// Subscribe a completion handler for a channel, replacing any previous one.
    fn set_event_handler(&self, channel: AdcChannel, handler: &'static dyn AdcEventHandler);

    /// Begin an asynchronous conversion.
    fn start_read(&self, channel: AdcChannel);

    /// Fetch the raw result of the last completed conversion.
    fn result(&self, channel: AdcChannel) -> i16;

    /// Momentary analog supply-rail voltage, in volts.
    fn supply_voltage(&self) -> f32;
}
