//! Driver for the NTC thermistors on the sensor-module channels.
//!
//! Each channel runs a small measurement machine: a periodic interval task
//! requests a conversion, the measurement task connects the pull-up bias and
//! starts an asynchronous read, and the front end's completion event releases
//! the bias, captures the raw code and notifies the registered monitor. The
//! raw code is turned into degrees Celsius on demand through a calibrated
//! lookup table.

mod table;

use core::cell::Cell;

use embassy_time::Duration;

use crate::domain::temperature::{Celsius, Temperature};
use crate::traits::adc::{AdcChannel, AdcEvent, AdcEventHandler, AnalogFrontEnd, SampleFormat};
use crate::traits::scheduler::{Scheduler, Task, TaskId};
use crate::traits::sensor_module::{Pull, SensorChannel, SensorModule};
use crate::traits::sensors::temperature::TemperatureSensor;

/// Supply voltage the conversion table was calibrated against.
const CALIBRATION_VOLTAGE: f32 = 3.3;

/// Notification delivered to a [`ThermistorMonitor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThermistorEvent {
    /// A conversion finished and the raw code was captured.
    Update,
    /// The front end reported a failed conversion.
    Error,
}

/// Receiver for per-channel measurement events.
pub trait ThermistorMonitor {
    fn on_event(&self, channel: SensorChannel, event: ThermistorEvent);
}

#[derive(Debug, PartialEq)]
pub enum ThermistorError<E> {
    /// Readying the shared front end failed.
    Init(E),
    /// A conversion is already in flight on this channel.
    Busy,
    /// The channel was never initialized.
    Uninitialized,
    /// The corrected code falls outside the calibrated span.
    OutOfRange,
}

impl<E> From<E> for ThermistorError<E> {
    fn from(e: E) -> Self {
        ThermistorError::Init(e)
    }
}

/// Per-channel record. All mutable state lives in `Cell`s: every path that
/// touches it runs on the one cooperative thread of control.
struct ChannelState {
    channel: SensorChannel,
    adc_channel: AdcChannel,
    task_interval: Cell<Option<TaskId>>,
    task_measure: Cell<Option<TaskId>>,
    monitor: Cell<Option<&'static dyn ThermistorMonitor>>,
    raw_code: Cell<i16>,
    update_interval: Cell<Option<Duration>>,
    initialized: Cell<bool>,
    busy: Cell<bool>,
}

impl ChannelState {
    const fn new(channel: SensorChannel, adc_channel: AdcChannel) -> Self {
        Self {
            channel,
            adc_channel,
            task_interval: Cell::new(None),
            task_measure: Cell::new(None),
            monitor: Cell::new(None),
            raw_code: Cell::new(0),
            update_interval: Cell::new(None),
            initialized: Cell::new(false),
            busy: Cell::new(false),
        }
    }
}

/// Two-channel thermistor driver.
///
/// The driver registers itself with the scheduler and the front end, so it
/// must live in a `'static` location (a `static`, a `StaticCell`, or a leaked
/// allocation in tests).
pub struct Thermistor<A, S, M>
where
    A: AnalogFrontEnd + 'static,
    S: Scheduler + 'static,
    M: SensorModule + 'static,
{
    adc: &'static A,
    scheduler: &'static S,
    module: &'static M,
    channels: [ChannelState; 2],
}

impl<A, S, M> Thermistor<A, S, M>
where
    A: AnalogFrontEnd + 'static,
    S: Scheduler + 'static,
    M: SensorModule + 'static,
{
    pub fn new(adc: &'static A, scheduler: &'static S, module: &'static M) -> Self {
        Self {
            adc,
            scheduler,
            module,
            channels: [
                ChannelState::new(SensorChannel::A, AdcChannel::A4),
                ChannelState::new(SensorChannel::B, AdcChannel::A5),
            ],
        }
    }

    fn state(&self, channel: SensorChannel) -> &ChannelState {
        &self.channels[channel.index()]
    }

    /// Bring a channel up: ready the shared module, configure its ADC channel
    /// for 16-bit results, subscribe for completions and register the two
    /// tasks dormant. Idempotent; on failure nothing is committed.
    pub fn init(&'static self, channel: SensorChannel) -> Result<(), ThermistorError<M::Error>> {
        let state = self.state(channel);

        if state.initialized.get() {
            return Ok(());
        }

        self.module.init()?;

        self.adc.init(state.adc_channel, SampleFormat::Bits16);
        self.adc.set_event_handler(state.adc_channel, self);

        state.task_interval.set(Some(self.scheduler.register(self)));
        state.task_measure.set(Some(self.scheduler.register(self)));

        state.initialized.set(true);

        trace!("thermistor: channel {:?} initialized", channel);

        Ok(())
    }

    /// Replace the monitor for a channel. Safe at any time; a measurement in
    /// flight reports to the monitor registered when it completes.
    pub fn set_event_handler(&self, channel: SensorChannel, monitor: &'static dyn ThermistorMonitor) {
        self.state(channel).monitor.set(Some(monitor));
    }

    /// Set the measurement cadence. `None` disarms periodic triggering;
    /// `Some(interval)` arms the interval task to fire `interval` from now.
    pub fn set_update_interval(&self, channel: SensorChannel, interval: Option<Duration>) {
        let state = self.state(channel);

        state.update_interval.set(interval);

        if let Some(id) = state.task_interval.get() {
            match interval {
                Some(delay) => self.scheduler.schedule_after(id, delay),
                None => self.scheduler.schedule_at(id, None),
            }
        }
    }

    /// Request a one-shot measurement. Fails with [`ThermistorError::Busy`]
    /// while a conversion is in flight; the request is dropped, not queued.
    pub fn measure(&self, channel: SensorChannel) -> Result<(), ThermistorError<M::Error>> {
        self.trigger(self.state(channel))
    }

    /// Convert the last captured raw code into degrees Celsius.
    ///
    /// Pure query over already-captured state; it never starts a conversion.
    /// The code is rescaled to the table's calibration voltage (saturating at
    /// full scale) and mirrored, since the module samples the divider from
    /// the pull-up side.
    pub fn temperature(
        &self,
        channel: SensorChannel,
    ) -> Result<Temperature<Celsius>, ThermistorError<M::Error>> {
        let code = self.state(channel).raw_code.get() as u16;

        let scaled = (f32::from(code) * (CALIBRATION_VOLTAGE / self.adc.supply_voltage())) as u16;
        let corrected = 0xFFFF - scaled;

        match table::lookup(corrected) {
            Some(tenths) => Ok(Temperature::new(f32::from(tenths) / 10.0)),
            None => Err(ThermistorError::OutOfRange),
        }
    }

    /// A handle for one channel, usable wherever a generic
    /// [`TemperatureSensor`] is expected.
    pub fn sensor(&'static self, channel: SensorChannel) -> ThermistorSensor<A, S, M> {
        ThermistorSensor {
            driver: self,
            channel,
        }
    }

    fn trigger(&self, state: &ChannelState) -> Result<(), ThermistorError<M::Error>> {
        let id = state
            .task_measure
            .get()
            .ok_or(ThermistorError::Uninitialized)?;

        if state.busy.get() {
            return Err(ThermistorError::Busy);
        }

        state.busy.set(true);

        self.scheduler.schedule_now(id);

        Ok(())
    }

    fn interval_elapsed(&self, state: &ChannelState) {
        // A busy channel simply skips this tick.
        let _ = self.trigger(state);

        if let Some(interval) = state.update_interval.get() {
            self.scheduler.schedule_self_after(interval);
        }
    }

    fn measure_scheduled(&self, state: &ChannelState) {
        self.module.set_pull(state.channel, Pull::Up4k7);

        self.adc.start_read(state.adc_channel);
    }

    fn conversion_complete(&self, state: &ChannelState, event: AdcEvent) {
        state.busy.set(false);

        // The bias is only there to form the divider during the conversion;
        // release it on the error path as well.
        self.module.set_pull(state.channel, Pull::None);

        let event = match event {
            AdcEvent::Done => {
                state.raw_code.set(self.adc.result(state.adc_channel));
                ThermistorEvent::Update
            }
            AdcEvent::Error => {
                warn!("thermistor: conversion error on channel {:?}", state.channel);
                ThermistorEvent::Error
            }
        };

        if let Some(monitor) = state.monitor.get() {
            monitor.on_event(state.channel, event);
        }
    }
}

impl<A, S, M> Task for Thermistor<A, S, M>
where
    A: AnalogFrontEnd + 'static,
    S: Scheduler + 'static,
    M: SensorModule + 'static,
{
    fn run(&self, id: TaskId) {
        for state in &self.channels {
            if state.task_interval.get() == Some(id) {
                self.interval_elapsed(state);
                return;
            }
            if state.task_measure.get() == Some(id) {
                self.measure_scheduled(state);
                return;
            }
        }
    }
}

impl<A, S, M> AdcEventHandler for Thermistor<A, S, M>
where
    A: AnalogFrontEnd + 'static,
    S: Scheduler + 'static,
    M: SensorModule + 'static,
{
    fn on_adc_event(&self, channel: AdcChannel, event: AdcEvent) {
        for state in &self.channels {
            if state.initialized.get() && state.adc_channel == channel {
                self.conversion_complete(state, event);
                return;
            }
        }
    }
}

/// Single-channel view of a [`Thermistor`].
pub struct ThermistorSensor<A, S, M>
where
    A: AnalogFrontEnd + 'static,
    S: Scheduler + 'static,
    M: SensorModule + 'static,
{
    driver: &'static Thermistor<A, S, M>,
    channel: SensorChannel,
}

impl<A, S, M> TemperatureSensor<Celsius> for ThermistorSensor<A, S, M>
where
    A: AnalogFrontEnd + 'static,
    S: Scheduler + 'static,
    M: SensorModule + 'static,
{
    type Error = ThermistorError<M::Error>;

    fn temperature(&self) -> Result<Temperature<Celsius>, Self::Error> {
        self.driver.temperature(self.channel)
    }
}
