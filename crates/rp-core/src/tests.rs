//! Unit tests for rp-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EntityId, TaskId};

    #[test]
    fn ordering() {
        assert!(EntityId(0) < EntityId(1));
        assert!(TaskId(100) > TaskId(99));
    }

    #[test]
    fn display() {
        assert_eq!(EntityId(7).to_string(), "EntityId(7)");
    }

    #[test]
    fn from_raw() {
        assert_eq!(EntityId::from(5u32), EntityId(5));
    }
}

#[cfg(test)]
mod geo {
    use crate::GeoPoint;

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(11.574599, 48.132988);
        assert!(p.distance_m(p) < 0.01);
    }

    #[test]
    fn one_degree_of_latitude() {
        // ~1 degree of latitude ≈ 111 km
        let a = GeoPoint::new(11.5, 48.0);
        let b = GeoPoint::new(11.5, 49.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 500.0, "got {d}");
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = GeoPoint::new(10.0, 40.0);
        let b = GeoPoint::new(12.0, 44.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), GeoPoint::new(11.0, 42.0));
    }
}

#[cfg(test)]
mod time {
    use crate::{VirtualTime, WallTime};

    #[test]
    fn virtual_time_arithmetic() {
        let t = VirtualTime(1_000);
        assert_eq!(t + 15, VirtualTime(1_015));
        assert_eq!(t - 16, VirtualTime(984));
        assert_eq!(VirtualTime(1_100) - VirtualTime(1_000), 100);
        assert_eq!(VirtualTime(1_000).since(VirtualTime(1_100)), -100);
    }

    #[test]
    fn never_is_not_scheduled() {
        assert!(!VirtualTime::NEVER.is_scheduled());
        assert!(!VirtualTime::ZERO.is_scheduled());
        assert!(VirtualTime(1).is_scheduled());
    }

    #[test]
    fn datetime_conversion() {
        let dt = VirtualTime(1_420_070_400).to_datetime();
        assert_eq!(dt.to_rfc3339(), "2015-01-01T00:00:00+00:00");
    }

    #[test]
    fn wall_time_rounding() {
        assert_eq!(WallTime::from_millis(100), WallTime(100_000));
        assert_eq!(WallTime::from_millis_f64(13.3333), WallTime(13_333));
        // Never collapses to zero.
        assert_eq!(WallTime::from_millis_f64(0.0), WallTime(1));
    }
}

#[cfg(test)]
mod config {
    use crate::{MergePolicy, ReplayConfig, WallTime};

    #[test]
    fn defaults_match_reference_deployment() {
        let c = ReplayConfig::default();
        assert_eq!(c.speed_ms, 100);
        assert_eq!(c.step_size, 15);
        assert_eq!(c.smoothing_ticks(), 50);
        assert_eq!(c.merge_policy, MergePolicy::Append);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn lookahead_is_ten_steps_of_render_time() {
        let c = ReplayConfig::default();
        assert_eq!(c.lookahead(), 1_500);
    }

    #[test]
    fn smoothing_ticks_never_zero() {
        let c = ReplayConfig { speed_ms: 1, ..ReplayConfig::default() };
        assert_eq!(c.smoothing_ticks(), 1);
        assert!(c.is_instant());
    }

    #[test]
    fn sub_step_interval_spans_the_move() {
        // 100 s move at 100 ms / 15 s per tick = 666.67 ms, over 50 sub-steps.
        let c = ReplayConfig::default();
        assert_eq!(c.sub_step_interval(100), WallTime(13_333));
        assert_eq!(c.tick_interval(), WallTime(100_000));
    }

    #[test]
    fn from_json_fills_defaults() {
        let c = ReplayConfig::from_json_str(r#"{"speed_ms": 50, "merge_policy": "time_ordered"}"#)
            .unwrap();
        assert_eq!(c.speed_ms, 50);
        assert_eq!(c.step_size, 15);
        assert_eq!(c.smoothing_ticks(), 25);
        assert_eq!(c.merge_policy, MergePolicy::TimeOrdered);
    }

    #[test]
    fn from_json_rejects_invalid() {
        assert!(ReplayConfig::from_json_str(r#"{"step_size": 0}"#).is_err());
        assert!(ReplayConfig::from_json_str(r#"{"speed_ms": 0}"#).is_err());
        assert!(ReplayConfig::from_json_str(r#"{"bogus": 1}"#).is_err());
        assert!(ReplayConfig::from_json_str("not json").is_err());
    }
}

#[cfg(test)]
mod timer {
    use crate::{EntityId, TaskId, TimerQueue, TimerTarget, WallTime};

    /// Long enough that nothing re-arms inside the windows these tests pop.
    const SLOW: WallTime = WallTime(1_000);

    fn at(q: &mut TimerQueue, when: u64, target: TimerTarget) -> TaskId {
        q.schedule_repeating(WallTime(when), SLOW, target)
    }

    #[test]
    fn pops_in_time_order() {
        let mut q = TimerQueue::new();
        at(&mut q, 30, TimerTarget::Animation(EntityId(3)));
        at(&mut q, 10, TimerTarget::Animation(EntityId(1)));
        at(&mut q, 20, TimerTarget::Animation(EntityId(2)));

        let order: Vec<_> = std::iter::from_fn(|| q.pop_due(WallTime(100)))
            .map(|(at, _, target)| (at, target))
            .collect();
        assert_eq!(
            order,
            vec![
                (WallTime(10), TimerTarget::Animation(EntityId(1))),
                (WallTime(20), TimerTarget::Animation(EntityId(2))),
                (WallTime(30), TimerTarget::Animation(EntityId(3))),
            ]
        );
        assert_eq!(q.next_due(), Some(WallTime(1_010)));
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn same_instant_is_fifo() {
        let mut q = TimerQueue::new();
        let a = at(&mut q, 5, TimerTarget::SchedulerTick);
        let b = at(&mut q, 5, TimerTarget::Animation(EntityId(0)));
        assert_eq!(q.pop_due(WallTime(5)).map(|p| p.1), Some(a));
        assert_eq!(q.pop_due(WallTime(5)).map(|p| p.1), Some(b));
    }

    #[test]
    fn nothing_due_before_time() {
        let mut q = TimerQueue::new();
        at(&mut q, 50, TimerTarget::SchedulerTick);
        assert!(q.pop_due(WallTime(49)).is_none());
        assert_eq!(q.next_due(), Some(WallTime(50)));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn repeating_rearms_until_cancelled() {
        let mut q = TimerQueue::new();
        let id = q.schedule_repeating(WallTime(10), WallTime(10), TimerTarget::SchedulerTick);
        let fired: Vec<WallTime> = std::iter::from_fn(|| q.pop_due(WallTime(35)))
            .map(|(at, _, _)| at)
            .collect();
        assert_eq!(fired, vec![WallTime(10), WallTime(20), WallTime(30)]);
        assert_eq!(q.next_due(), Some(WallTime(40)));

        assert!(q.cancel(id));
        assert!(!q.is_scheduled(id));
        assert!(q.next_due().is_none());
        assert!(!q.cancel(id), "double cancel reports false");
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut q = TimerQueue::new();
        q.schedule_repeating(WallTime(7), WallTime(0), TimerTarget::SchedulerTick);
        q.pop_due(WallTime(7)).unwrap();
        assert_eq!(q.next_due(), Some(WallTime(8)));
    }

    #[test]
    fn cancel_from_inside_handler() {
        let mut q = TimerQueue::new();
        let id = q.schedule_repeating(WallTime(1), WallTime(1), TimerTarget::SchedulerTick);
        let (_, popped, _) = q.pop_due(WallTime(1)).unwrap();
        assert_eq!(popped, id);
        assert!(q.cancel(popped));
        assert!(q.pop_due(WallTime(100)).is_none());
        assert!(q.is_empty());
    }
}
