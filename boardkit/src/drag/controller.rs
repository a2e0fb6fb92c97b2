//! Gesture state machine for one drag surface.

use super::geometry::Point;
use super::targets::DropTargets;
use super::{DragEvent, DragIntent, DragItem, DropTarget, InputSource, PointerInput, PointerPhase};
use crate::config::DragConfig;
use std::time::Duration;
use tracing::trace;

/// A press on a draggable item that has not become a drag yet
#[derive(Debug, Clone, PartialEq)]
pub struct ArmedGesture {
    pub item: DragItem,
    pub source: InputSource,
    pub start: Point,
    pub pressed_at: Duration,
}

/// An active drag
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub item: DragItem,
    pub source: InputSource,
    pub origin: DropTarget,
    /// Last resolved drop target
    pub target: Option<DropTarget>,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Armed(ArmedGesture),
    Dragging(DragSession),
}

/// Coarse view of [`DragState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Armed,
    Dragging,
}

/// Turns pointer and touch input into [`DragEvent`]s.
///
/// The controller holds no clock and no view handles. Callers feed it
/// timestamped input plus the current [`DropTargets`], and call
/// [`tick`](Self::tick) while a touch press is held so the long press can
/// fire without further movement.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    config: DragConfig,
    state: DragState,
}

impl DragController {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            state: DragState::Idle,
        }
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn phase(&self) -> DragPhase {
        phase_of(&self.state)
    }

    /// The active drag, if any
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            _ => None,
        }
    }

    /// Whether the surface should stop native scrolling. True for the rest of
    /// a touch gesture once it has become a drag.
    pub fn suppress_scroll(&self) -> bool {
        matches!(
            &self.state,
            DragState::Dragging(DragSession {
                source: InputSource::Touch,
                ..
            })
        )
    }

    /// Feed one input event
    pub fn handle(&mut self, input: &PointerInput, targets: &DropTargets) -> Vec<DragEvent> {
        match input.phase {
            PointerPhase::Down => self.on_down(input, targets),
            PointerPhase::Move => self.on_move(input, targets),
            PointerPhase::Up => self.on_up(input, targets),
            PointerPhase::Cancel => self.cancel().into_iter().collect(),
        }
    }

    /// Fire the long press for a held touch once its time has come
    pub fn tick(&mut self, now: Duration, targets: &DropTargets) -> Vec<DragEvent> {
        match &self.state {
            DragState::Armed(gesture) if self.long_press_elapsed(gesture, now) => {
                let gesture = gesture.clone();
                let start = gesture.start;
                self.start_drag(gesture, start, targets)
            }
            _ => Vec::new(),
        }
    }

    /// Abandon the current gesture. Emits `Cancelled` unless already idle.
    pub fn cancel(&mut self) -> Option<DragEvent> {
        match std::mem::take(&mut self.state) {
            DragState::Idle => None,
            previous => {
                trace!(from = ?phase_of(&previous), "drag cancelled");
                Some(DragEvent::Cancelled)
            }
        }
    }

    fn on_down(&mut self, input: &PointerInput, targets: &DropTargets) -> Vec<DragEvent> {
        if !matches!(self.state, DragState::Idle) {
            // Extra pointers during a gesture are ignored.
            return Vec::new();
        }
        let Some(item) = targets.item_at(input.position) else {
            return Vec::new();
        };

        trace!(?item, source = ?input.source, "drag armed");
        self.state = DragState::Armed(ArmedGesture {
            item: item.clone(),
            source: input.source,
            start: input.position,
            pressed_at: input.at,
        });
        vec![DragEvent::Armed { item }]
    }

    fn on_move(&mut self, input: &PointerInput, targets: &DropTargets) -> Vec<DragEvent> {
        match &self.state {
            DragState::Idle => Vec::new(),
            DragState::Armed(gesture) => {
                let gesture = gesture.clone();
                let moved = gesture.start.distance(&input.position);
                match gesture.source {
                    InputSource::Mouse if moved > self.config.mouse_threshold_px => {
                        self.start_drag(gesture, input.position, targets)
                    }
                    InputSource::Mouse => Vec::new(),
                    InputSource::Touch if self.long_press_elapsed(&gesture, input.at) => {
                        let start = gesture.start;
                        let mut events = self.start_drag(gesture, start, targets);
                        events.extend(self.hover(input.position, targets));
                        events
                    }
                    InputSource::Touch if moved > self.config.touch_slop_px => {
                        trace!(moved, "touch moved before long press, treating as scroll");
                        self.state = DragState::Idle;
                        vec![DragEvent::Scroll]
                    }
                    InputSource::Touch => Vec::new(),
                }
            }
            DragState::Dragging(_) => {
                self.hover(input.position, targets).into_iter().collect()
            }
        }
    }

    fn on_up(&mut self, input: &PointerInput, targets: &DropTargets) -> Vec<DragEvent> {
        match std::mem::take(&mut self.state) {
            DragState::Idle => Vec::new(),
            DragState::Armed(gesture) => {
                if gesture.source == InputSource::Touch
                    && self.long_press_elapsed(&gesture, input.at)
                {
                    // The long press fired without a tick; it is a drag that
                    // ends where it started.
                    let start = gesture.start;
                    let mut events = self.start_drag(gesture, start, targets);
                    if let DragState::Dragging(session) = std::mem::take(&mut self.state) {
                        events.push(drop_at(session, input.position, targets));
                    }
                    return events;
                }
                trace!(item = ?gesture.item, "released before drag, click");
                vec![DragEvent::Click { item: gesture.item }]
            }
            DragState::Dragging(session) => vec![drop_at(session, input.position, targets)],
        }
    }

    fn long_press_elapsed(&self, gesture: &ArmedGesture, now: Duration) -> bool {
        gesture.source == InputSource::Touch
            && now.saturating_sub(gesture.pressed_at) >= self.config.long_press()
    }

    fn start_drag(
        &mut self,
        gesture: ArmedGesture,
        position: Point,
        targets: &DropTargets,
    ) -> Vec<DragEvent> {
        let Some(origin) = targets.origin_of(&gesture.item) else {
            // The item is no longer laid out.
            self.state = DragState::Idle;
            return vec![DragEvent::Cancelled];
        };

        trace!(item = ?gesture.item, ?origin, "drag started");
        let started = DragEvent::Started {
            item: gesture.item.clone(),
            origin: origin.clone(),
        };
        self.state = DragState::Dragging(DragSession {
            item: gesture.item,
            source: gesture.source,
            origin: origin.clone(),
            target: Some(origin),
            position: gesture.start,
        });

        let mut events = vec![started];
        events.extend(self.hover(position, targets));
        events
    }

    fn hover(&mut self, position: Point, targets: &DropTargets) -> Option<DragEvent> {
        let DragState::Dragging(session) = &mut self.state else {
            return None;
        };
        session.position = position;
        let target = targets.resolve(&session.item, position);
        if target == session.target {
            return None;
        }
        trace!(?target, "hover target changed");
        session.target = target.clone();
        Some(DragEvent::Hover { target })
    }
}

/// End a drag with the pointer released at `position`
fn drop_at(session: DragSession, position: Point, targets: &DropTargets) -> DragEvent {
    let intent = targets
        .resolve(&session.item, position)
        .and_then(|target| DragIntent::between(&session.item, &session.origin, &target));

    match intent {
        Some(intent) => {
            trace!(?intent, "dropped");
            DragEvent::Dropped(intent)
        }
        None => {
            trace!("released over the origin or no target");
            DragEvent::Cancelled
        }
    }
}

fn phase_of(state: &DragState) -> DragPhase {
    match state {
        DragState::Idle => DragPhase::Idle,
        DragState::Armed(_) => DragPhase::Armed,
        DragState::Dragging(_) => DragPhase::Dragging,
    }
}
