//! Integration tests for rp-sim.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};

use rp_core::{EntityId, GeoPoint, MergePolicy, ReplayConfig, VirtualTime, WallTime};
use rp_data::{ChunkFetcher, DataError, MemoryFetcher};
use rp_entity::{EntityState, RecordingRenderer, RenderCommand, RenderLog, Renderer};

use crate::{ReplayEvent, Scheduler, SchedulerBuilder, SimError, Topic};

// ── Helpers ───────────────────────────────────────────────────────────────────

type TestScheduler = Scheduler<MemoryFetcher, RecordingRenderer>;

fn pos(t: i64) -> GeoPoint {
    GeoPoint::new(11.5 + t as f64 * 1e-4, 48.1)
}

fn manifest(chunks: &[(&str, i64, i64)]) -> Vec<u8> {
    let v = json!({
        "timeChunks": chunks
            .iter()
            .map(|(name, start, last)| json!({ "fileName": name, "startTime": start, "lastTime": last }))
            .collect::<Vec<_>>()
    });
    serde_json::to_vec(&v).unwrap()
}

fn movement(times: &[i64]) -> Value {
    let first = times[0];
    let last = times[times.len() - 1];
    json!({
        "from": { "time": first },
        "to": { "time": last },
        "duration": last - first,
        "waypoints": times
            .iter()
            .map(|&t| { let p = pos(t); json!({ "time": t, "lng": p.lng, "lat": p.lat }) })
            .collect::<Vec<_>>()
    })
}

/// `entities`: `(id, [movement waypoint times])`.
fn chunk(entities: &[(u32, &[&[i64]])]) -> Vec<u8> {
    let bikes: Vec<Value> = entities
        .iter()
        .map(|(id, movements)| {
            json!({ "id": id, "movements": movements.iter().map(|m| movement(m)).collect::<Vec<_>>() })
        })
        .collect();
    serde_json::to_vec(&json!({ "bikes": bikes })).unwrap()
}

fn build(fetcher: MemoryFetcher, config: ReplayConfig) -> (TestScheduler, RenderLog) {
    let renderer = RecordingRenderer::new();
    let log = renderer.log();
    let scheduler = SchedulerBuilder::new(fetcher, renderer)
        .config(config)
        .build()
        .unwrap();
    (scheduler, log)
}

/// One chunk `[1000, 2000]` holding entity 5 with waypoints at 1000 and 1100.
fn scenario_fetcher() -> MemoryFetcher {
    MemoryFetcher::new()
        .with("data.json", manifest(&[("chunk-0.json", 1_000, 2_000)]))
        .with("chunk-0.json", chunk(&[(5, &[&[1_000, 1_100]])]))
}

fn capture<F: ChunkFetcher, R: Renderer>(
    scheduler: &mut Scheduler<F, R>,
    topic: Topic,
) -> Rc<RefCell<Vec<ReplayEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    scheduler.subscribe(topic, move |event| {
        sink.borrow_mut().push(event.clone());
        Ok(())
    });
    seen
}

fn clock_counters(events: &[ReplayEvent]) -> Vec<i64> {
    events
        .iter()
        .filter_map(|e| match e {
            ReplayEvent::Clock { counter, .. } => Some(counter.0),
            _ => None,
        })
        .collect()
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_stopped_and_empty() {
        let (s, _) = build(MemoryFetcher::new(), ReplayConfig::default());
        assert!(!s.is_running());
        assert!(s.loader().is_none());
        assert!(s.registry().is_empty());
        assert_eq!(s.wall_now(), WallTime::ZERO);
    }

    #[test]
    fn invalid_config_rejected() {
        let result = SchedulerBuilder::new(MemoryFetcher::new(), RecordingRenderer::new())
            .config(ReplayConfig { step_size: 0, ..ReplayConfig::default() })
            .build();
        assert!(matches!(result, Err(SimError::Core(_))));
    }

    #[test]
    fn builder_handlers_see_load_events() {
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        let mut s = SchedulerBuilder::new(scenario_fetcher(), RecordingRenderer::new())
            .on(Topic::LoadedChunk, move |_| {
                *sink.borrow_mut() += 1;
                Ok(())
            })
            .build()
            .unwrap();
        s.load_data().unwrap();
        assert_eq!(*seen.borrow(), 1);
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loading {
    use super::*;

    #[test]
    fn load_data_positions_clock_and_loads_first_chunk() {
        let (mut s, _) = build(scenario_fetcher(), ReplayConfig::default());
        let loaded = capture(&mut s, Topic::LoadedChunk);

        s.load_data().unwrap();

        assert_eq!(s.counter(), VirtualTime(1_000 - 15 - 1));
        assert_eq!(s.registry().len(), 1);
        assert_eq!(s.pending_loads(), 0);
        assert_eq!(s.fetcher().requests(), ["data.json", "chunk-0.json"]);
        assert_eq!(s.loader().and_then(|l| l.last_time()), Some(VirtualTime(2_000)));
        assert_eq!(
            *loaded.borrow(),
            vec![ReplayEvent::LoadedChunk { file_name: "chunk-0.json".into(), entities: 1 }]
        );
    }

    #[test]
    fn missing_manifest_is_returned() {
        let (mut s, _) = build(MemoryFetcher::new(), ReplayConfig::default());
        assert!(matches!(s.load_data(), Err(SimError::Data(DataError::Fetch { .. }))));
        assert!(s.loader().is_none());
    }

    #[test]
    fn missing_first_chunk_is_returned() {
        let fetcher = MemoryFetcher::new().with("data.json", manifest(&[("gone.json", 10, 20)]));
        let (mut s, _) = build(fetcher, ReplayConfig::default());
        let failed = capture(&mut s, Topic::FetchFailed);

        let err = s.load_data().unwrap_err();
        assert!(matches!(err, SimError::Data(DataError::Fetch { ref resource, .. }) if resource == "gone.json"));
        assert_eq!(failed.borrow().len(), 1);
        assert!(s.take_errors().is_empty(), "returned error is not stored twice");
    }

    #[test]
    fn custom_manifest_resource() {
        let fetcher = MemoryFetcher::new()
            .with("index.json", manifest(&[("c.json", 100, 200)]))
            .with("c.json", chunk(&[]));
        let config = ReplayConfig { manifest_resource: "index.json".into(), ..ReplayConfig::default() };
        let (mut s, _) = build(fetcher, config);
        s.load_data().unwrap();
        assert_eq!(s.counter(), VirtualTime(84));
    }

    #[test]
    fn prefetch_fires_at_lookahead() {
        let fetcher = MemoryFetcher::new()
            .with("data.json", manifest(&[("a.json", 1_000, 2_000), ("b.json", 5_000, 6_000)]))
            .with("a.json", chunk(&[]))
            .with("b.json", chunk(&[]));
        let (mut s, _) = build(fetcher, ReplayConfig::default());
        s.load_data().unwrap();

        // lookahead = 10 steps * 15 s * (1000 / 100) = 1 500 s → b at counter >= 3 500.
        loop {
            let before = s.counter();
            s.tick();
            if s.pending_loads() > 0 {
                assert!(before < VirtualTime(3_500));
                assert!(s.counter() >= VirtualTime(3_500));
                assert_eq!(s.counter(), VirtualTime(3_504));
                break;
            }
        }
        assert_eq!(s.complete_pending_loads(), 1);
        assert_eq!(s.fetcher().requests(), ["data.json", "a.json", "b.json"]);
    }

    #[test]
    fn later_chunk_merges_into_existing_entity() {
        let fetcher = MemoryFetcher::new()
            .with("data.json", manifest(&[("a.json", 1_000, 1_200), ("b.json", 1_200, 1_500)]))
            .with("a.json", chunk(&[(5, &[&[1_000, 1_100]])]))
            .with("b.json", chunk(&[(5, &[&[1_300, 1_400]]), (6, &[&[1_250]])]));
        let (mut s, _) = build(fetcher, ReplayConfig::default());
        s.load_data().unwrap();
        s.tick();
        assert_eq!(s.complete_pending_loads(), 1);

        let e = s.registry().get(EntityId(5)).unwrap();
        let starts: Vec<i64> = e.cursor().movements().iter().map(|m| m.start_time().0).collect();
        assert_eq!(starts, vec![1_000, 1_300]);
        assert_eq!(s.registry().len(), 2);
    }

    #[test]
    fn chunk_missing_at_request_time_is_reported() {
        let fetcher = MemoryFetcher::new()
            .with("data.json", manifest(&[("a.json", 1_000, 1_200), ("b.json", 1_200, 1_500)]))
            .with("a.json", chunk(&[(5, &[&[1_000, 1_100]])]))
            .with("b.json", chunk(&[(6, &[&[1_250]])]));
        let (mut s, _) = build(fetcher, ReplayConfig::default());
        s.load_data().unwrap();
        assert!(s.fetcher_mut().remove("b.json").is_some());

        s.tick();
        assert_eq!(s.complete_pending_loads(), 0);
        assert!(s.registry().get(EntityId(6)).is_none());
        let errors = s.take_errors();
        assert!(matches!(
            errors.as_slice(),
            [SimError::Data(DataError::Fetch { resource, .. })] if resource == "b.json"
        ));
    }

    #[test]
    fn failed_chunk_leaves_registry_untouched() {
        let fetcher = MemoryFetcher::new()
            .with("data.json", manifest(&[("a.json", 1_000, 1_200), ("b.json", 1_200, 1_500)]))
            .with("a.json", chunk(&[(5, &[&[1_000]])]))
            .with(
                "b.json",
                serde_json::to_vec(&json!({ "bikes": [
                    { "id": 7, "movements": [movement(&[1_300, 1_310])] },
                    { "id": 8, "movements": [{ "from": { "time": 1 } }] },
                ]}))
                .unwrap(),
            );
        let (mut s, _) = build(fetcher, ReplayConfig::default());
        s.load_data().unwrap();
        let failed = capture(&mut s, Topic::FetchFailed);

        s.tick();
        assert_eq!(s.complete_pending_loads(), 0);

        assert_eq!(s.registry().len(), 1);
        assert!(s.registry().get(EntityId(7)).is_none());
        assert!(matches!(
            failed.borrow().as_slice(),
            [ReplayEvent::FetchFailed { resource, .. }] if resource == "b.json"
        ));
        let errors = s.take_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SimError::Data(DataError::MalformedChunk { .. })));
        assert!(s.take_errors().is_empty());
        assert!(s.loader().unwrap().is_drained(), "failed chunk is not retried");
    }
}

// ── Clock ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod clock {
    use super::*;

    #[test]
    fn start_ticks_immediately_then_periodically() {
        let (mut s, _) = build(scenario_fetcher(), ReplayConfig::default());
        s.load_data().unwrap();
        let clock = capture(&mut s, Topic::Clock);

        s.start();
        assert!(s.is_running());
        assert_eq!(clock_counters(&clock.borrow()), vec![999]);

        s.pump_until(WallTime::from_millis(250));
        assert_eq!(clock_counters(&clock.borrow()), vec![999, 1_014, 1_029]);
        assert_eq!(s.wall_now(), WallTime::from_millis(250));
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let (mut s, _) = build(scenario_fetcher(), ReplayConfig::default());
        s.load_data().unwrap();
        let clock = capture(&mut s, Topic::Clock);

        s.start();
        s.start();
        assert_eq!(clock.borrow().len(), 1);

        s.stop();
        s.stop();
        assert!(!s.is_running());
        s.advance_wall(WallTime::from_millis(1_000));
        assert_eq!(clock.borrow().len(), 1, "no ticks while stopped");

        s.start();
        assert_eq!(clock.borrow().len(), 2);
    }

    #[test]
    fn clock_is_monotonic_and_stops_at_last_time() {
        let (mut s, _) = build(scenario_fetcher(), ReplayConfig::default());
        s.load_data().unwrap();
        let clock = capture(&mut s, Topic::Clock);

        s.start();
        let end = s.run_to_end().unwrap();

        let counters = clock_counters(&clock.borrow());
        assert!(counters.windows(2).all(|w| w[1] - w[0] == 15));
        // 984 + 15·68 = 2004 is the first counter >= 2000.
        assert_eq!(counters.len(), 68);
        assert_eq!(counters.last().copied(), Some(2_004));
        assert!(!s.is_running());
        assert!(s.is_finished());
        assert_eq!(end, WallTime::from_millis(6_700));
    }

    #[test]
    fn clock_event_carries_timestamp() {
        let (mut s, _) = build(scenario_fetcher(), ReplayConfig::default());
        s.load_data().unwrap();
        let clock = capture(&mut s, Topic::Clock);
        s.tick();
        let events = clock.borrow();
        let ReplayEvent::Clock { counter, timestamp } = &events[0] else {
            panic!("expected a clock event");
        };
        assert_eq!(timestamp.timestamp(), counter.0);
    }

    #[test]
    fn run_requires_data() {
        let (mut s, _) = build(scenario_fetcher(), ReplayConfig::default());
        assert!(matches!(s.run_to_end(), Err(SimError::NotLoaded)));
    }

    #[test]
    fn unsubscribed_handler_stops_receiving() {
        let (mut s, _) = build(scenario_fetcher(), ReplayConfig::default());
        s.load_data().unwrap();
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        let id = s.subscribe(Topic::Clock, move |_| {
            *sink.borrow_mut() += 1;
            Ok(())
        });
        s.tick();
        assert!(s.unsubscribe(id));
        s.tick();
        assert_eq!(*seen.borrow(), 1);
    }
}

// ── End-to-end replay ─────────────────────────────────────────────────────────

#[cfg(test)]
mod replay {
    use super::*;

    #[test]
    fn single_trip_scenario() {
        let (mut s, log) = build(scenario_fetcher(), ReplayConfig::default());
        let id = EntityId(5);
        s.load_data().unwrap();
        s.start();

        // Tick at 200 ms sees counter 1014: first wakeup places the marker.
        s.pump_until(WallTime::from_millis(250));
        let e = s.registry().get(id).unwrap();
        assert_eq!(e.state(), EntityState::Idle);
        assert_eq!(e.next_wakeup_time(), VirtualTime(1_000));
        assert_eq!(log.marker(id).map(|m| (m.position, m.visible)), Some((pos(1_000), true)));
        assert!(!log.commands_for(id).iter().any(|c| matches!(c, RenderCommand::MoveMarker { .. })));

        // Tick at 300 ms sees counter 1029: a 100 s move over 50 sub-steps.
        s.pump_until(WallTime::from_millis(300));
        assert_eq!(s.registry().get(id).unwrap().state(), EntityState::Moving);

        // Sub-steps are 100·100/15/50 ms = 13.333 ms apart.
        s.pump_until(WallTime(300_000 + 13_333 * 25));
        let halfway = log.marker(id).unwrap().position;
        assert_eq!(halfway, pos(1_000).lerp(pos(1_100), 0.5));

        s.pump_until(WallTime(300_000 + 13_333 * 50));
        let e = s.registry().get(id).unwrap();
        assert_eq!(e.state(), EntityState::Idle);
        assert_eq!(e.position(), Some(pos(1_100)));
        assert!(e.cursor().has_finished_history());
        assert_eq!(log.trace(id), vec![pos(1_000), pos(1_100)]);

        // Next tick wakes it into Finished.
        s.pump_until(WallTime::from_millis(1_000));
        let e = s.registry().get(id).unwrap();
        assert_eq!(e.state(), EntityState::Finished);
        assert_eq!(e.next_wakeup_time(), VirtualTime::NEVER);
        assert_eq!(log.marker(id).map(|m| m.visible), Some(false));
    }

    /// Entity 5 rides `[1000, 1100]` in the first chunk and `[4500, 4600]` in
    /// the second, which is only fetched after the first trip has finished.
    fn two_chunk_fetcher() -> MemoryFetcher {
        MemoryFetcher::new()
            .with("data.json", manifest(&[("a.json", 1_000, 4_000), ("b.json", 4_000, 6_000)]))
            .with("a.json", chunk(&[(5, &[&[1_000, 1_100]])]))
            .with("b.json", chunk(&[(5, &[&[4_500, 4_600]])]))
    }

    fn replay_two_chunks(policy: MergePolicy) -> TestScheduler {
        let config = ReplayConfig { merge_policy: policy, ..ReplayConfig::default() };
        let (mut s, _) = build(two_chunk_fetcher(), config);
        s.load_data().unwrap();
        s.start();
        s.run_to_end().unwrap();
        s
    }

    #[test]
    fn time_ordered_replays_trip_from_later_chunk() {
        let s = replay_two_chunks(MergePolicy::TimeOrdered);
        let e = s.registry().get(EntityId(5)).unwrap();
        assert_eq!(e.cursor().movements().len(), 2);
        assert_eq!(e.cursor().remaining(), 0);
        assert_eq!(e.position(), Some(pos(4_600)));
        assert_eq!(e.state(), EntityState::Finished);
    }

    #[test]
    fn append_drops_trip_merged_after_finish() {
        let s = replay_two_chunks(MergePolicy::Append);
        let e = s.registry().get(EntityId(5)).unwrap();
        assert_eq!(e.cursor().movements().len(), 2);
        assert_eq!(e.position(), Some(pos(1_100)));
        assert_eq!(e.state(), EntityState::Finished);
    }

    #[test]
    fn stop_lets_moves_finish() {
        let (mut s, _) = build(scenario_fetcher(), ReplayConfig::default());
        s.load_data().unwrap();
        s.start();
        s.pump_until(WallTime::from_millis(300));
        s.stop();

        let counter = s.counter();
        s.run_to_end().unwrap();
        assert_eq!(s.counter(), counter);
        let e = s.registry().get(EntityId(5)).unwrap();
        assert!(!e.is_moving());
        assert_eq!(e.position(), Some(pos(1_100)));
    }

    #[test]
    fn instant_moves_at_one_ms() {
        let config = ReplayConfig { speed_ms: 1, ..ReplayConfig::default() };
        let (mut s, log) = build(scenario_fetcher(), config);
        s.load_data().unwrap();
        s.start();
        s.pump_until(WallTime::from_millis(3));
        assert!(!s.registry().get(EntityId(5)).unwrap().is_moving());
        assert_eq!(log.marker(EntityId(5)).unwrap().position, pos(1_100));
    }

    #[test]
    fn select_entity_publishes_summary() {
        let (mut s, _) = build(scenario_fetcher(), ReplayConfig::default());
        s.load_data().unwrap();
        let selected = capture(&mut s, Topic::EntitySelected);

        let summary = s.select_entity(EntityId(5)).unwrap();
        assert_eq!(summary.trips.len(), 1);
        assert_eq!(summary.trips[0].to_string(), "Trip 1 : 100");
        assert_eq!(*selected.borrow(), vec![ReplayEvent::EntitySelected(summary)]);

        assert!(matches!(
            s.select_entity(EntityId(99)),
            Err(SimError::EntityNotFound(EntityId(99)))
        ));
    }

    #[test]
    fn clear_lines_only_touches_traces() {
        let (mut s, log) = build(scenario_fetcher(), ReplayConfig::default());
        s.load_data().unwrap();
        s.start();
        s.pump_until(WallTime::from_millis(400));
        assert!(!log.trace(EntityId(5)).is_empty());

        s.clear_lines();
        assert!(log.trace(EntityId(5)).is_empty());
        assert_eq!(log.commands().last(), Some(&RenderCommand::ClearTraces));
        assert!(log.marker(EntityId(5)).unwrap().visible);
        assert!(s.is_running());
    }

    #[test]
    fn prune_discards_old_waypoints() {
        let fetcher = MemoryFetcher::new()
            .with("data.json", manifest(&[("a.json", 1_000, 2_000)]))
            .with("a.json", chunk(&[(1, &[&[1_000, 1_100, 1_200]]), (2, &[&[1_500]])]));
        let (mut s, _) = build(fetcher, ReplayConfig::default());
        s.load_data().unwrap();
        assert_eq!(s.prune(VirtualTime(1_150)), 2);
        assert_eq!(s.registry().get(EntityId(1)).unwrap().cursor().remaining(), 1);
    }
}
