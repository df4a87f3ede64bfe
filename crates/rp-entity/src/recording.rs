//! `RecordingRenderer`: a [`Renderer`] that keeps everything in memory.
//!
//! Every call is appended to a command log, and the resulting scene (marker
//! position and visibility, trace polylines) is kept up to date alongside.
//! Tests assert against the scene; the demo prints from it.
//!
//! The log is shared through [`RenderLog`] (an `Rc` handle), because the
//! renderer itself is moved into the scheduler.
//!
//! After [`Renderer::clear_traces`] a trace starts over from the next point
//! its entity appends.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rp_core::{EntityId, GeoPoint};

use crate::{Marker, PathTrace, Renderer};

/// One renderer call.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    CreateMarker { entity: EntityId, at: GeoPoint },
    Show(EntityId),
    Hide(EntityId),
    MoveMarker { entity: EntityId, to: GeoPoint },
    CreateTrace { entity: EntityId, at: GeoPoint },
    AppendPoint { entity: EntityId, at: GeoPoint },
    UpdateLastPoint { entity: EntityId, to: GeoPoint },
    ClearTraces,
}

/// Current state of one marker.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarkerView {
    pub position: GeoPoint,
    pub visible:  bool,
}

#[derive(Debug, Default)]
struct Scene {
    commands: Vec<RenderCommand>,
    markers:  BTreeMap<EntityId, MarkerView>,
    traces:   BTreeMap<EntityId, Vec<GeoPoint>>,
}

impl Scene {
    fn apply(&mut self, command: RenderCommand) {
        match &command {
            RenderCommand::CreateMarker { entity, at } => {
                self.markers.insert(*entity, MarkerView { position: *at, visible: true });
            }
            RenderCommand::Show(entity) => {
                if let Some(m) = self.markers.get_mut(entity) {
                    m.visible = true;
                }
            }
            RenderCommand::Hide(entity) => {
                if let Some(m) = self.markers.get_mut(entity) {
                    m.visible = false;
                }
            }
            RenderCommand::MoveMarker { entity, to } => {
                if let Some(m) = self.markers.get_mut(entity) {
                    m.position = *to;
                }
            }
            RenderCommand::CreateTrace { entity, at } => {
                self.traces.insert(*entity, vec![*at]);
            }
            RenderCommand::AppendPoint { entity, at } => {
                self.traces.entry(*entity).or_default().push(*at);
            }
            RenderCommand::UpdateLastPoint { entity, to } => {
                let line = self.traces.entry(*entity).or_default();
                match line.last_mut() {
                    Some(last) => *last = *to,
                    None => line.push(*to),
                }
            }
            RenderCommand::ClearTraces => self.traces.clear(),
        }
        self.commands.push(command);
    }
}

/// Shared, cloneable view of a [`RecordingRenderer`]'s output.
#[derive(Clone, Debug, Default)]
pub struct RenderLog(Rc<RefCell<Scene>>);

impl RenderLog {
    /// Every command received so far, in order.
    pub fn commands(&self) -> Vec<RenderCommand> {
        self.0.borrow().commands.clone()
    }

    /// Commands concerning `entity` (plus global clears), in order.
    pub fn commands_for(&self, entity: EntityId) -> Vec<RenderCommand> {
        self.0
            .borrow()
            .commands
            .iter()
            .filter(|c| command_entity(c).is_none_or(|e| e == entity))
            .cloned()
            .collect()
    }

    pub fn marker(&self, entity: EntityId) -> Option<MarkerView> {
        self.0.borrow().markers.get(&entity).copied()
    }

    /// The polyline currently drawn for `entity` (empty if none).
    pub fn trace(&self, entity: EntityId) -> Vec<GeoPoint> {
        self.0.borrow().traces.get(&entity).cloned().unwrap_or_default()
    }

    /// Number of markers currently visible.
    pub fn visible_markers(&self) -> usize {
        self.0.borrow().markers.values().filter(|m| m.visible).count()
    }

    /// Forget the command history; the scene is kept.
    pub fn clear_commands(&self) {
        self.0.borrow_mut().commands.clear();
    }

    fn push(&self, command: RenderCommand) {
        self.0.borrow_mut().apply(command);
    }
}

fn command_entity(command: &RenderCommand) -> Option<EntityId> {
    match command {
        RenderCommand::CreateMarker { entity, .. }
        | RenderCommand::MoveMarker { entity, .. }
        | RenderCommand::CreateTrace { entity, .. }
        | RenderCommand::AppendPoint { entity, .. }
        | RenderCommand::UpdateLastPoint { entity, .. } => Some(*entity),
        RenderCommand::Show(entity) | RenderCommand::Hide(entity) => Some(*entity),
        RenderCommand::ClearTraces => None,
    }
}

/// A [`Renderer`] that records into a [`RenderLog`].
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    log: RenderLog,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that stays valid after the renderer is moved away.
    pub fn log(&self) -> RenderLog {
        self.log.clone()
    }
}

struct RecordingShape {
    entity: EntityId,
    log:    RenderLog,
}

impl Marker for RecordingShape {
    fn show(&mut self) {
        self.log.push(RenderCommand::Show(self.entity));
    }

    fn hide(&mut self) {
        self.log.push(RenderCommand::Hide(self.entity));
    }

    fn move_to(&mut self, position: GeoPoint) {
        self.log.push(RenderCommand::MoveMarker { entity: self.entity, to: position });
    }
}

impl PathTrace for RecordingShape {
    fn append_point(&mut self, position: GeoPoint) {
        self.log.push(RenderCommand::AppendPoint { entity: self.entity, at: position });
    }

    fn update_last_point(&mut self, position: GeoPoint) {
        self.log.push(RenderCommand::UpdateLastPoint { entity: self.entity, to: position });
    }
}

impl Renderer for RecordingRenderer {
    fn create_marker(&mut self, entity: EntityId, at: GeoPoint) -> Box<dyn Marker> {
        self.log.push(RenderCommand::CreateMarker { entity, at });
        Box::new(RecordingShape { entity, log: self.log.clone() })
    }

    fn create_trace(&mut self, entity: EntityId, at: GeoPoint) -> Box<dyn PathTrace> {
        self.log.push(RenderCommand::CreateTrace { entity, at });
        Box::new(RecordingShape { entity, log: self.log.clone() })
    }

    fn clear_traces(&mut self) {
        self.log.push(RenderCommand::ClearTraces);
    }
}
