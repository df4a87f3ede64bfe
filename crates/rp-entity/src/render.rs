//! Rendering capabilities consumed by the replay.
//!
//! Map drawing and projection live outside this workspace.  The replay only
//! needs to create a marker per entity, show/hide/move it, and extend a path
//! trace behind it.  Implement [`Renderer`] to plug in a real map.

use rp_core::{EntityId, GeoPoint};

/// A point symbol for one entity.
pub trait Marker {
    fn show(&mut self);
    fn hide(&mut self);
    fn move_to(&mut self, position: GeoPoint);
}

/// A polyline following one entity.
///
/// Each move appends a point equal to the entity's position, then overwrites
/// that last point on every interpolation sub-step, so the line always ends
/// where the marker is drawn.
pub trait PathTrace {
    fn append_point(&mut self, position: GeoPoint);
    fn update_last_point(&mut self, position: GeoPoint);
}

/// Factory for markers and traces, plus the global trace reset.
pub trait Renderer {
    /// Create a marker at `at`.  The replay hides it immediately.
    fn create_marker(&mut self, entity: EntityId, at: GeoPoint) -> Box<dyn Marker>;

    /// Create a trace whose first point is `at`.
    fn create_trace(&mut self, entity: EntityId, at: GeoPoint) -> Box<dyn PathTrace>;

    /// Remove every drawn trace.  Markers and replay state are untouched.
    fn clear_traces(&mut self);
}

/// A [`Renderer`] that draws nothing.  Use for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

struct NoopShape;

impl Marker for NoopShape {
    fn show(&mut self) {}
    fn hide(&mut self) {}
    fn move_to(&mut self, _position: GeoPoint) {}
}

impl PathTrace for NoopShape {
    fn append_point(&mut self, _position: GeoPoint) {}
    fn update_last_point(&mut self, _position: GeoPoint) {}
}

impl Renderer for NoopRenderer {
    fn create_marker(&mut self, _entity: EntityId, _at: GeoPoint) -> Box<dyn Marker> {
        Box::new(NoopShape)
    }

    fn create_trace(&mut self, _entity: EntityId, _at: GeoPoint) -> Box<dyn PathTrace> {
        Box::new(NoopShape)
    }

    fn clear_traces(&mut self) {}
}
