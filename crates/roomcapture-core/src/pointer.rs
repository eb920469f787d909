//! Pointer input from the document viewer.
//!
//! [`GestureRecognizer`] turns raw down/move/up samples into taps and
//! long-presses. [`PointerCoordinator`] resolves those gestures against the
//! overlay: a tap on a room pin selects the room, a long-press anywhere asks
//! for a new room to be placed there.

use crate::coords::{NormalizedPoint, to_normalized};
use crate::model::{Room, RoomId};
use crate::store::CaptureStore;
use crate::viewer::{DocumentViewer, MarkerTag};
use kurbo::Point;
use std::time::{Duration, Instant};

/// Default hold time before a press becomes a long-press.
pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(500);
/// Default pointer travel (page points) still counted as holding still.
pub const DEFAULT_TAP_SLOP: f64 = 8.0;

/// A gesture raised by the viewer, positioned in page points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Tap { position: Point },
    /// Long-press or context-menu activation.
    ContextActivate { position: Point },
}

/// A raw pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPointer {
    Down { position: Point, at: Instant },
    Move { position: Point, at: Instant },
    Up { position: Point, at: Instant },
    /// The platform took the pointer away (e.g. a scroll gesture began).
    Cancel,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Point,
    started: Instant,
    /// Pointer wandered beyond the slop; this press is a drag, not a gesture.
    moved: bool,
    /// The long-press already fired while the pointer was held.
    fired: bool,
}

/// Classifies raw pointer samples into [`PointerEvent`]s.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    long_press: Duration,
    slop: f64,
    press: Option<Press>,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_PRESS, DEFAULT_TAP_SLOP)
    }
}

impl GestureRecognizer {
    pub fn new(long_press: Duration, slop: f64) -> Self {
        Self {
            long_press,
            slop,
            press: None,
        }
    }

    /// Feed a raw sample, returning a gesture when one completes.
    pub fn handle(&mut self, raw: RawPointer) -> Option<PointerEvent> {
        match raw {
            RawPointer::Down { position, at } => {
                self.press = Some(Press {
                    origin: position,
                    started: at,
                    moved: false,
                    fired: false,
                });
                None
            }
            RawPointer::Move { position, .. } => {
                if let Some(press) = self.press.as_mut() {
                    if (position - press.origin).hypot() > self.slop {
                        press.moved = true;
                    }
                }
                None
            }
            RawPointer::Up { position, at } => {
                let press = self.press.take()?;
                if press.moved || press.fired || (position - press.origin).hypot() > self.slop {
                    return None;
                }
                let position = press.origin;
                if at.saturating_duration_since(press.started) >= self.long_press {
                    Some(PointerEvent::ContextActivate { position })
                } else {
                    Some(PointerEvent::Tap { position })
                }
            }
            RawPointer::Cancel => {
                self.press = None;
                None
            }
        }
    }

    /// Fire a long-press while the pointer is still held.
    ///
    /// Call periodically (e.g. each frame). Fires at most once per press.
    pub fn poll(&mut self, now: Instant) -> Option<PointerEvent> {
        let press = self.press.as_mut()?;
        if press.moved || press.fired {
            return None;
        }
        if now.saturating_duration_since(press.started) < self.long_press {
            return None;
        }
        press.fired = true;
        Some(PointerEvent::ContextActivate {
            position: press.origin,
        })
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }
}

/// Result of resolving a gesture against the overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// A room pin was tapped. Presenting the room is up to the caller.
    RoomSelected(Room),
    /// Empty-space long-press: a room may be placed here.
    PlacementRequested(NormalizedPoint),
}

/// State of the current interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    /// Terminal for the interaction that produced it.
    Selected(RoomId),
}

/// Resolves viewer gestures into capture events.
#[derive(Debug, Clone, Default)]
pub struct PointerCoordinator {
    state: Interaction,
}

impl PointerCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Interaction {
        self.state
    }

    /// Return to idle, e.g. when the room detail the selection opened closes.
    pub fn reset(&mut self) {
        self.state = Interaction::Idle;
    }

    /// Resolve a gesture. Every gesture starts a new interaction.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        viewer: &dyn DocumentViewer,
        store: &CaptureStore,
    ) -> Option<CaptureEvent> {
        self.state = Interaction::Idle;

        match event {
            PointerEvent::Tap { position } => {
                let room_id = match viewer.hit_test(position) {
                    Some(MarkerTag::Room(id)) => id,
                    _ => return None,
                };
                let Some(room) = store.room(room_id) else {
                    log::debug!("Tapped marker for missing room {}", room_id);
                    return None;
                };
                self.state = Interaction::Selected(room_id);
                Some(CaptureEvent::RoomSelected(room.clone()))
            }
            PointerEvent::ContextActivate { position } => {
                let at = to_normalized(position, viewer.current_page_size());
                Some(CaptureEvent::PlacementRequested(at))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::viewer::MemoryViewer;
    use kurbo::Size;
    use pollster::block_on;
    use std::sync::Arc;

    const PAGE: Size = Size::new(600.0, 400.0);

    fn setup() -> (CaptureStore, MemoryViewer, Room) {
        let mut store = CaptureStore::new(Arc::new(MemoryStorage::new()));
        let project = store.create_project("Site 1", "J. Doe").unwrap();
        let drawing = block_on(store.add_drawing(b"%PDF", "Level 1", project.id)).unwrap();
        let room = store
            .create_room(project.id, drawing.id, "Closet", NormalizedPoint::clamped(0.5, 0.5))
            .unwrap();

        let mut viewer = MemoryViewer::new(PAGE);
        viewer.add_marker(room.pin, MarkerTag::Room(room.id));
        (store, viewer, room)
    }

    #[test]
    fn test_tap_on_pin_selects_room() {
        let (store, viewer, room) = setup();
        let mut coordinator = PointerCoordinator::new();

        let event = coordinator.handle(
            PointerEvent::Tap {
                position: Point::new(302.0, 199.0),
            },
            &viewer,
            &store,
        );
        assert_eq!(event, Some(CaptureEvent::RoomSelected(room.clone())));
        assert_eq!(coordinator.state(), Interaction::Selected(room.id));
    }

    #[test]
    fn test_tap_on_empty_space_does_nothing() {
        let (store, viewer, _) = setup();
        let mut coordinator = PointerCoordinator::new();

        let event = coordinator.handle(
            PointerEvent::Tap {
                position: Point::new(10.0, 10.0),
            },
            &viewer,
            &store,
        );
        assert_eq!(event, None);
        assert_eq!(coordinator.state(), Interaction::Idle);
    }

    #[test]
    fn test_tap_on_placement_marker_does_nothing() {
        let (store, mut viewer, _) = setup();
        viewer.add_marker(NormalizedPoint::clamped(0.1, 0.1), MarkerTag::Placement);
        let mut coordinator = PointerCoordinator::new();

        let event = coordinator.handle(
            PointerEvent::Tap {
                position: Point::new(60.0, 40.0),
            },
            &viewer,
            &store,
        );
        assert_eq!(event, None);
    }

    #[test]
    fn test_tap_on_stale_marker_does_nothing() {
        let (mut store, viewer, room) = setup();
        store.delete_room(room.id).unwrap();
        let mut coordinator = PointerCoordinator::new();

        let event = coordinator.handle(
            PointerEvent::Tap {
                position: Point::new(300.0, 200.0),
            },
            &viewer,
            &store,
        );
        assert_eq!(event, None);
        assert_eq!(coordinator.state(), Interaction::Idle);
    }

    #[test]
    fn test_context_activate_requests_placement() {
        let (store, viewer, _) = setup();
        let mut coordinator = PointerCoordinator::new();

        let event = coordinator.handle(
            PointerEvent::ContextActivate {
                position: Point::new(150.0, 300.0),
            },
            &viewer,
            &store,
        );
        match event {
            Some(CaptureEvent::PlacementRequested(at)) => {
                assert!(at.approx_eq(&NormalizedPoint::clamped(0.25, 0.75)));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_context_activate_off_page_clamps() {
        let (store, viewer, _) = setup();
        let mut coordinator = PointerCoordinator::new();

        let event = coordinator.handle(
            PointerEvent::ContextActivate {
                position: Point::new(600.4, -0.2),
            },
            &viewer,
            &store,
        );
        assert_eq!(
            event,
            Some(CaptureEvent::PlacementRequested(NormalizedPoint::clamped(1.0, 0.0)))
        );
    }

    #[test]
    fn test_new_gesture_leaves_selected() {
        let (store, viewer, _) = setup();
        let mut coordinator = PointerCoordinator::new();
        coordinator.handle(
            PointerEvent::Tap {
                position: Point::new(300.0, 200.0),
            },
            &viewer,
            &store,
        );
        coordinator.handle(
            PointerEvent::Tap {
                position: Point::new(1.0, 1.0),
            },
            &viewer,
            &store,
        );
        assert_eq!(coordinator.state(), Interaction::Idle);
    }

    #[test]
    fn test_quick_press_is_tap() {
        let mut gestures = GestureRecognizer::default();
        let t0 = Instant::now();
        let p = Point::new(100.0, 100.0);

        assert_eq!(gestures.handle(RawPointer::Down { position: p, at: t0 }), None);
        let event = gestures.handle(RawPointer::Up {
            position: Point::new(102.0, 101.0),
            at: t0 + Duration::from_millis(120),
        });
        assert_eq!(event, Some(PointerEvent::Tap { position: p }));
    }

    #[test]
    fn test_long_hold_is_context_activate_on_release() {
        let mut gestures = GestureRecognizer::default();
        let t0 = Instant::now();
        let p = Point::new(100.0, 100.0);

        gestures.handle(RawPointer::Down { position: p, at: t0 });
        let event = gestures.handle(RawPointer::Up {
            position: p,
            at: t0 + Duration::from_millis(800),
        });
        assert_eq!(event, Some(PointerEvent::ContextActivate { position: p }));
    }

    #[test]
    fn test_poll_fires_long_press_once() {
        let mut gestures = GestureRecognizer::default();
        let t0 = Instant::now();
        let p = Point::new(100.0, 100.0);

        gestures.handle(RawPointer::Down { position: p, at: t0 });
        assert_eq!(gestures.poll(t0 + Duration::from_millis(100)), None);
        assert_eq!(
            gestures.poll(t0 + Duration::from_millis(600)),
            Some(PointerEvent::ContextActivate { position: p })
        );
        assert_eq!(gestures.poll(t0 + Duration::from_millis(700)), None);
        assert_eq!(
            gestures.handle(RawPointer::Up {
                position: p,
                at: t0 + Duration::from_millis(900)
            }),
            None
        );
    }

    #[test]
    fn test_drag_is_not_a_gesture() {
        let mut gestures = GestureRecognizer::default();
        let t0 = Instant::now();

        gestures.handle(RawPointer::Down {
            position: Point::new(100.0, 100.0),
            at: t0,
        });
        gestures.handle(RawPointer::Move {
            position: Point::new(160.0, 100.0),
            at: t0 + Duration::from_millis(50),
        });
        let event = gestures.handle(RawPointer::Up {
            position: Point::new(100.0, 100.0),
            at: t0 + Duration::from_millis(100),
        });
        assert_eq!(event, None);
        assert!(!gestures.is_pressed());
    }

    #[test]
    fn test_cancel_discards_press() {
        let mut gestures = GestureRecognizer::default();
        let t0 = Instant::now();
        gestures.handle(RawPointer::Down {
            position: Point::ZERO,
            at: t0,
        });
        gestures.handle(RawPointer::Cancel);
        assert_eq!(gestures.poll(t0 + Duration::from_secs(2)), None);
    }
}
