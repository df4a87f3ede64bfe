//! Fluent builder for constructing a [`Scheduler`].

use std::collections::VecDeque;

use rp_bus::{EventBus, HandlerResult};
use rp_core::{ReplayConfig, TimerQueue, VirtualTime, WallTime};
use rp_data::ChunkFetcher;
use rp_entity::{EntityRegistry, Renderer};

use crate::{ReplayEvent, Scheduler, SimResult, Topic};

/// Fluent builder for [`Scheduler<F, R>`].
///
/// # Required inputs
///
/// - `F: ChunkFetcher`, where the manifest and chunks are read from
/// - `R: Renderer`, what markers and traces are drawn with
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                      |
/// |---------------------|------------------------------|
/// | `.config(c)`        | `ReplayConfig::default()`    |
/// | `.on(topic, h)`     | no handlers                  |
///
/// # Example
///
/// ```rust,ignore
/// let mut scheduler = SchedulerBuilder::new(DirFetcher::new("data"), NoopRenderer)
///     .config(config)
///     .on(Topic::Clock, |e| { println!("{e:?}"); Ok(()) })
///     .build()?;
/// scheduler.load_data()?;
/// scheduler.start();
/// scheduler.run_to_end()?;
/// ```
pub struct SchedulerBuilder<F: ChunkFetcher, R: Renderer> {
    config:   ReplayConfig,
    bus:      EventBus<Topic, ReplayEvent>,
    fetcher:  F,
    renderer: R,
}

impl<F: ChunkFetcher, R: Renderer> SchedulerBuilder<F, R> {
    pub fn new(fetcher: F, renderer: R) -> Self {
        Self {
            config: ReplayConfig::default(),
            bus: EventBus::new(),
            fetcher,
            renderer,
        }
    }

    pub fn config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Subscribe a handler before the scheduler exists, so it sees the
    /// events `load_data` publishes.
    pub fn on<H>(mut self, topic: Topic, handler: H) -> Self
    where
        H: FnMut(&ReplayEvent) -> HandlerResult + 'static,
    {
        self.bus.subscribe(topic, handler);
        self
    }

    /// Validate the config and return a stopped scheduler with no data.
    pub fn build(self) -> SimResult<Scheduler<F, R>> {
        self.config.validate()?;

        Ok(Scheduler {
            registry:  EntityRegistry::new(self.config.merge_policy),
            config:    self.config,
            counter:   VirtualTime::ZERO,
            running:   false,
            tick_task: None,
            timers:    TimerQueue::new(),
            wall_now:  WallTime::ZERO,
            loader:    None,
            in_flight: VecDeque::new(),
            bus:       self.bus,
            errors:    Vec::new(),
            renderer:  self.renderer,
            fetcher:   self.fetcher,
        })
    }
}
