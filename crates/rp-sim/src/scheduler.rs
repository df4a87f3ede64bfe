//! The `Scheduler`: virtual clock, chunk prefetch, and entity wakeups.

use std::collections::VecDeque;

use rp_bus::{EventBus, HandlerResult, SubscriptionId};
use rp_core::{EntityId, ReplayConfig, TaskId, TimerQueue, TimerTarget, VirtualTime, WallTime};
use rp_data::{ChunkData, ChunkDescriptor, ChunkFetcher, ChunkLoader, EntityMovements};
use rp_entity::{EntityRegistry, EntitySummary, MoveContext, Renderer};
use tracing::{debug, info, trace, warn};

use crate::{ReplayEvent, SimError, SimResult, Topic};

/// The replay context.
///
/// Owns the virtual clock (`counter`), the entity registry, the chunk
/// loader, the event bus, every timer task, the renderer and the fetcher.
///
/// # Tick
///
/// 1. **Wake**: every entity due at `counter` (ascending id) is woken.
/// 2. **Advance**: `counter += step_size`.  Each counter assignment may
///    request the next chunk (prefetch window) and stops the replay once
///    `counter` reaches the final chunk's `lastTime`.
/// 3. **Notify**: publish [`ReplayEvent::Clock`].
///
/// Requested chunks are fetched and merged at the next completion point,
/// i.e. right after the tick that requested them, never during one.
///
/// # Wall clock
///
/// Scheduler ticks and animation sub-steps are tasks in one [`TimerQueue`]
/// keyed on [`WallTime`].  Nothing moves until the queue is pumped with
/// [`pump_until`][Self::pump_until], [`run_to_end`][Self::run_to_end] or
/// [`run_realtime`][Self::run_realtime].
///
/// Create via [`SchedulerBuilder`][crate::SchedulerBuilder].
pub struct Scheduler<F: ChunkFetcher, R: Renderer> {
    pub(crate) config:    ReplayConfig,
    pub(crate) counter:   VirtualTime,
    pub(crate) running:   bool,
    pub(crate) tick_task: Option<TaskId>,
    pub(crate) timers:    TimerQueue,
    pub(crate) wall_now:  WallTime,
    pub(crate) registry:  EntityRegistry,
    pub(crate) loader:    Option<ChunkLoader>,
    /// Requested chunks awaiting fetch, in request order.
    pub(crate) in_flight: VecDeque<ChunkDescriptor>,
    pub(crate) bus:       EventBus<Topic, ReplayEvent>,
    pub(crate) errors:    Vec<SimError>,
    pub(crate) renderer:  R,
    pub(crate) fetcher:   F,
}

impl<F: ChunkFetcher, R: Renderer> Scheduler<F, R> {
    // ── Data ──────────────────────────────────────────────────────────────

    /// Fetch the manifest, position the clock just before the first chunk
    /// and load that chunk.
    ///
    /// Manifest errors, and a failure of the first chunk, are returned.
    pub fn load_data(&mut self) -> SimResult<()> {
        let manifest = ChunkLoader::fetch_manifest(&mut self.fetcher, &self.config.manifest_resource)?;
        let first = manifest.first_start_time().ok_or(SimError::NotLoaded)?;
        let chunks = manifest.time_chunks.len();
        self.loader = Some(ChunkLoader::new(manifest));

        let requested = self.in_flight.len();
        self.set_counter(self.config.initial_counter(first));
        if self.in_flight.len() == requested {
            self.request_next_chunk();
        }
        info!(chunks, counter = %self.counter, "manifest loaded");

        let failed_before = self.errors.len();
        self.complete_pending_loads();
        if self.errors.len() > failed_before {
            return Err(self.errors.remove(failed_before));
        }
        Ok(())
    }

    /// Fetch and merge every requested chunk, in request order.
    ///
    /// A chunk that fails leaves the registry untouched: the failure is
    /// published as [`ReplayEvent::FetchFailed`] and kept for
    /// [`take_errors`][Self::take_errors].  Returns how many chunks were
    /// merged.
    pub fn complete_pending_loads(&mut self) -> usize {
        let mut loaded = 0;
        while let Some(descriptor) = self.in_flight.pop_front() {
            let resource = descriptor.file_name.clone();
            match ChunkLoader::fetch_chunk(&mut self.fetcher, descriptor) {
                Ok(chunk) => {
                    self.apply_chunk(chunk);
                    loaded += 1;
                }
                Err(e) => {
                    warn!(%resource, error = %e, "chunk load failed");
                    self.bus.publish(
                        &Topic::FetchFailed,
                        &ReplayEvent::FetchFailed { resource, reason: e.to_string() },
                    );
                    self.errors.push(e.into());
                }
            }
        }
        loaded
    }

    /// Drain the errors recorded since the last call.
    pub fn take_errors(&mut self) -> Vec<SimError> {
        std::mem::take(&mut self.errors)
    }

    fn request_next_chunk(&mut self) {
        if let Some(descriptor) = self.loader.as_mut().and_then(ChunkLoader::begin_next) {
            self.in_flight.push_back(descriptor);
        }
    }

    fn apply_chunk(&mut self, chunk: ChunkData) {
        let file_name = chunk.descriptor.file_name;
        let entities = chunk.entities.len();
        for EntityMovements { id, movements } in chunk.entities {
            self.registry.upsert(id, movements);
        }
        debug!(%file_name, entities, total = self.registry.len(), "chunk merged");
        self.bus.publish(&Topic::LoadedChunk, &ReplayEvent::LoadedChunk { file_name, entities });
    }

    // ── Clock ─────────────────────────────────────────────────────────────

    /// Every counter assignment goes through here.
    fn set_counter(&mut self, value: VirtualTime) {
        self.counter = value;

        let Some(loader) = &self.loader else {
            return;
        };
        if loader.should_prefetch(value, self.config.lookahead()) {
            self.request_next_chunk();
        }
        if self.is_finished() {
            if self.running {
                info!(counter = %value, "end of recorded data");
            }
            self.stop();
        }
    }

    /// One scheduler tick.  Returns how many entities were woken.
    pub fn tick(&mut self) -> usize {
        let now = self.counter;
        let mut ctx = MoveContext {
            config:   &self.config,
            renderer: &mut self.renderer,
            timers:   &mut self.timers,
            now:      self.wall_now,
        };

        let mut woken = 0;
        for entity in self.registry.iter_mut() {
            if entity.is_due(now) {
                entity.wakeup(now, &mut ctx);
                woken += 1;
            }
        }

        self.set_counter(now + self.config.step_size);
        trace!(counter = %self.counter, woken, "tick");

        let counter = self.counter;
        self.bus.publish(
            &Topic::Clock,
            &ReplayEvent::Clock { counter, timestamp: counter.to_datetime() },
        );
        woken
    }

    /// Start the clock: one immediate tick, then one every `speed_ms`.
    /// No-op while running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        info!(counter = %self.counter, speed_ms = self.config.speed_ms, "replay started");

        self.tick();
        self.complete_pending_loads();

        // The first tick may already have reached the end.
        if self.running {
            let interval = self.config.tick_interval();
            self.tick_task = Some(self.timers.schedule_repeating(
                self.wall_now + interval,
                interval,
                TimerTarget::SchedulerTick,
            ));
        }
    }

    /// Stop the clock.  Moves already in flight still finish.  No-op while
    /// stopped.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(task) = self.tick_task.take() {
            self.timers.cancel(task);
        }
        info!(counter = %self.counter, "replay stopped");
    }

    // ── Wall-clock pump ───────────────────────────────────────────────────

    /// Fire every timer task due at or before `until`, in time order, then
    /// leave the wall clock at `until`.  Returns how many tasks fired.
    pub fn pump_until(&mut self, until: WallTime) -> usize {
        let mut fired = 0;
        while let Some((at, _task, target)) = self.timers.pop_due(until) {
            self.wall_now = at;
            match target {
                TimerTarget::SchedulerTick => {
                    self.tick();
                    self.complete_pending_loads();
                }
                TimerTarget::Animation(id) => {
                    if let Some(entity) = self.registry.get_mut(id) {
                        entity.animation_step(&mut self.timers);
                    }
                }
            }
            fired += 1;
        }
        self.wall_now = self.wall_now.max(until);
        fired
    }

    /// Pump the next `delta` of wall time.
    pub fn advance_wall(&mut self, delta: WallTime) -> usize {
        self.pump_until(self.wall_now + delta)
    }

    /// Pump, as fast as possible, until the clock has stopped and every move
    /// has finished.  Returns the wall time reached.
    pub fn run_to_end(&mut self) -> SimResult<WallTime> {
        if self.loader.is_none() {
            return Err(SimError::NotLoaded);
        }
        while let Some(next) = self.timers.next_due() {
            self.stop_if_stalled();
            self.pump_until(next);
        }
        Ok(self.wall_now)
    }

    /// Like [`run_to_end`][Self::run_to_end], but sleeps until each task is
    /// due.
    pub fn run_realtime(&mut self) -> SimResult<WallTime> {
        if self.loader.is_none() {
            return Err(SimError::NotLoaded);
        }
        while let Some(next) = self.timers.next_due() {
            self.stop_if_stalled();
            if self.timers.is_empty() {
                break;
            }
            std::thread::sleep(next.saturating_sub(self.wall_now).as_duration());
            self.pump_until(next);
        }
        Ok(self.wall_now)
    }

    /// A manifest whose final `lastTime` is not positive gives no end
    /// bound; stop once every chunk is in and every entity is done.
    fn stop_if_stalled(&mut self) {
        let unbounded = self
            .loader
            .as_ref()
            .is_some_and(|l| l.is_drained() && !l.last_time().is_some_and(VirtualTime::is_scheduled));
        if !self.running || !unbounded || !self.in_flight.is_empty() {
            return;
        }
        let done = self
            .registry
            .iter()
            .all(|e| !e.is_moving() && !e.next_wakeup_time().is_scheduled());
        if done {
            info!(counter = %self.counter, "nothing left to replay");
            self.stop();
        }
    }

    // ── Entities and rendering ────────────────────────────────────────────

    /// Discard every waypoint older than `time` from every entity.
    pub fn prune(&mut self, time: VirtualTime) -> usize {
        let dropped = self.registry.prune(time);
        debug!(%time, dropped, "pruned history");
        dropped
    }

    /// Clear every path trace.  Markers and cursors are untouched.
    pub fn clear_lines(&mut self) {
        self.renderer.clear_traces();
    }

    /// Publish [`ReplayEvent::EntitySelected`] with the entity's trip list.
    pub fn select_entity(&mut self, id: EntityId) -> SimResult<EntitySummary> {
        let summary = self
            .registry
            .get(id)
            .map(|e| e.summary())
            .ok_or(SimError::EntityNotFound(id))?;
        self.bus.publish(&Topic::EntitySelected, &ReplayEvent::EntitySelected(summary.clone()));
        Ok(summary)
    }

    // ── Events ────────────────────────────────────────────────────────────

    pub fn subscribe<H>(&mut self, topic: Topic, handler: H) -> SubscriptionId
    where
        H: FnMut(&ReplayEvent) -> HandlerResult + 'static,
    {
        self.bus.subscribe(topic, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn counter(&self) -> VirtualTime {
        self.counter
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// `true` once the clock has passed the final chunk's `lastTime`.
    pub fn is_finished(&self) -> bool {
        self.loader
            .as_ref()
            .and_then(ChunkLoader::last_time)
            .is_some_and(|last| last.is_scheduled() && self.counter >= last)
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// `None` until [`load_data`][Self::load_data] succeeded.
    pub fn loader(&self) -> Option<&ChunkLoader> {
        self.loader.as_ref()
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    #[inline]
    pub fn wall_now(&self) -> WallTime {
        self.wall_now
    }

    /// Chunks requested but not yet fetched.
    pub fn pending_loads(&self) -> usize {
        self.in_flight.len()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }
}

impl<F: ChunkFetcher, R: Renderer> std::fmt::Debug for Scheduler<F, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("counter", &self.counter)
            .field("running", &self.running)
            .field("wall_now", &self.wall_now)
            .field("entities", &self.registry.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
