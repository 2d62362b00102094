//! Deterministic stand-ins for the collaborator contracts, for exercising
//! drivers on the host.

use core::cell::{Cell, RefCell};

use embassy_time::{Duration, Instant};

use crate::drivers::sensors::thermistor::{ThermistorEvent, ThermistorMonitor};
use crate::traits::adc::{AdcChannel, AdcEvent, AdcEventHandler, AnalogFrontEnd, SampleFormat};
use crate::traits::scheduler::{Scheduler, Task, TaskId};
use crate::traits::sensor_module::{Pull, SensorChannel, SensorModule};

/// Error produced by the scriptable doubles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestError;

/// Scriptable analog front end.
///
/// Conversions do not complete on their own; a test fires the outcome through
/// [`TestAdc::complete`].
pub struct TestAdc {
    configured: RefCell<Vec<(AdcChannel, SampleFormat)>>,
    handlers: RefCell<Vec<(AdcChannel, &'static dyn AdcEventHandler)>>,
    reads: RefCell<Vec<AdcChannel>>,
    result: Cell<i16>,
    supply: Cell<f32>,
}

impl TestAdc {
    pub fn new() -> Self {
        Self {
            configured: RefCell::new(Vec::new()),
            handlers: RefCell::new(Vec::new()),
            reads: RefCell::new(Vec::new()),
            result: Cell::new(0),
            supply: Cell::new(3.3),
        }
    }

    /// Script the raw code the next `result` fetch returns.
    pub fn set_result(&self, value: i16) {
        self.result.set(value);
    }

    /// Script the measured supply-rail voltage.
    pub fn set_supply_voltage(&self, volts: f32) {
        self.supply.set(volts);
    }

    /// Channel configurations seen so far.
    pub fn configured(&self) -> Vec<(AdcChannel, SampleFormat)> {
        self.configured.borrow().clone()
    }

    /// Number of conversions started so far.
    pub fn reads(&self) -> usize {
        self.reads.borrow().len()
    }

    /// Deliver a conversion outcome to the handler subscribed on `channel`.
    pub fn complete(&self, channel: AdcChannel, event: AdcEvent) {
        let handler = self
            .handlers
            .borrow()
            .iter()
            .rev()
            .find(|(subscribed, _)| *subscribed == channel)
            .map(|(_, handler)| *handler)
            .expect("no handler subscribed for channel");

        handler.on_adc_event(channel, event);
    }
}

impl AnalogFrontEnd for TestAdc {
    fn init(&self, channel: AdcChannel, format: SampleFormat) {
        self.configured.borrow_mut().push((channel, format));
    }

    fn set_event_handler(&self, channel: AdcChannel, handler: &'static dyn AdcEventHandler) {
        self.handlers.borrow_mut().push((channel, handler));
    }

    fn start_read(&self, channel: AdcChannel) {
        self.reads.borrow_mut().push(channel);
    }

    fn result(&self, _channel: AdcChannel) -> i16 {
        self.result.get()
    }

    fn supply_voltage(&self) -> f32 {
        self.supply.get()
    }
}

struct TestTask {
    task: &'static dyn Task,
    deadline: Option<Instant>,
}

/// Virtual-time cooperative scheduler.
///
/// Time only moves through [`TestScheduler::advance`]; due tasks dispatch in
/// deadline order (registration order breaking ties), each running to
/// completion before the next, like the real dispatch loop.
pub struct TestScheduler {
    tasks: RefCell<Vec<TestTask>>,
    now: Cell<Instant>,
    running: Cell<Option<TaskId>>,
}

impl TestScheduler {
    pub fn new() -> Self {
        Self {
            tasks: RefCell::new(Vec::new()),
            now: Cell::new(Instant::from_ticks(0)),
            running: Cell::new(None),
        }
    }

    pub fn now(&self) -> Instant {
        self.now.get()
    }

    /// Number of registrations seen so far.
    pub fn registered(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Dispatch everything due right now, without moving time.
    pub fn run_until_idle(&self) {
        self.advance(Duration::from_ticks(0));
    }

    /// Move time forward, dispatching every task that comes due on the way.
    pub fn advance(&self, period: Duration) {
        let horizon = self.now.get() + period;

        loop {
            let due = self
                .tasks
                .borrow()
                .iter()
                .enumerate()
                .filter_map(|(index, entry)| entry.deadline.map(|deadline| (deadline, index)))
                .filter(|(deadline, _)| *deadline <= horizon)
                .min();

            let Some((deadline, index)) = due else {
                break;
            };

            if deadline > self.now.get() {
                self.now.set(deadline);
            }

            let id = TaskId::new(index);
            let task = {
                let mut tasks = self.tasks.borrow_mut();
                tasks[index].deadline = None;
                tasks[index].task
            };

            self.running.set(Some(id));
            task.run(id);
            self.running.set(None);
        }

        if horizon > self.now.get() {
            self.now.set(horizon);
        }
    }
}

impl Scheduler for TestScheduler {
    fn register(&self, task: &'static dyn Task) -> TaskId {
        let mut tasks = self.tasks.borrow_mut();
        tasks.push(TestTask {
            task,
            deadline: None,
        });

        TaskId::new(tasks.len() - 1)
    }

    fn schedule_at(&self, id: TaskId, deadline: Option<Instant>) {
        self.tasks.borrow_mut()[id.index()].deadline = deadline;
    }

    fn schedule_after(&self, id: TaskId, delay: Duration) {
        self.schedule_at(id, Some(self.now.get() + delay));
    }

    fn schedule_now(&self, id: TaskId) {
        self.schedule_at(id, Some(self.now.get()));
    }

    fn schedule_self_after(&self, delay: Duration) {
        let id = self
            .running
            .get()
            .expect("schedule_self_after called outside a running task");

        self.schedule_after(id, delay);
    }
}

/// Recording sensor-module control, with a scriptable init outcome.
pub struct TestModule {
    init_result: Cell<Result<(), TestError>>,
    inits: Cell<usize>,
    pull: [Cell<Pull>; 2],
}

impl TestModule {
    pub fn new() -> Self {
        Self {
            init_result: Cell::new(Ok(())),
            inits: Cell::new(0),
            pull: [Cell::new(Pull::None), Cell::new(Pull::None)],
        }
    }

    /// Make every subsequent `init` fail.
    pub fn fail_init(&self) {
        self.init_result.set(Err(TestError));
    }

    /// Number of init calls seen so far.
    pub fn inits(&self) -> usize {
        self.inits.get()
    }

    /// Bias currently applied to a sensing line.
    pub fn pull(&self, channel: SensorChannel) -> Pull {
        self.pull[channel.index()].get()
    }
}

impl SensorModule for TestModule {
    type Error = TestError;

    fn init(&self) -> Result<(), TestError> {
        self.inits.set(self.inits.get() + 1);
        self.init_result.get()
    }

    fn set_pull(&self, channel: SensorChannel, pull: Pull) {
        self.pull[channel.index()].set(pull);
    }
}

/// Monitor that records every delivered event.
pub struct TestMonitor {
    events: RefCell<Vec<(SensorChannel, ThermistorEvent)>>,
}

impl TestMonitor {
    pub fn new() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<(SensorChannel, ThermistorEvent)> {
        self.events.borrow().clone()
    }
}

impl ThermistorMonitor for TestMonitor {
    fn on_event(&self, channel: SensorChannel, event: ThermistorEvent) {
        self.events.borrow_mut().push((channel, event));
    }
}
