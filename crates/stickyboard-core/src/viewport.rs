//! Board-level viewport controller.
//!
//! Owns everything that happens between the shapes: panning the
//! background, wheel and pinch zoom, trackpad gesture zoom,
//! fit-to-screen, selection, and the context menu with copy/paste.
//! The controller never touches notes directly; every state change goes
//! through the [`Store`], and per-shape drag/resize stays with
//! [`crate::interaction::ShapeInteractions`].

use crate::clipboard;
use crate::input::{PointerButton, PointerEvent, PointerTarget};
use crate::model::NoteId;
use crate::store::Store;
use crate::zoom::{clamp_zoom, screen_to_board, zoom_around_point};
use kurbo::{Point, Rect, Vec2};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Wheel zoom step per notch, in and out.
pub const WHEEL_ZOOM_IN: f64 = 1.1;
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Exponent damping pinch ratio into zoom ratio. Raw finger distance is
/// too twitchy; the square root halves the gesture's gain.
pub const PINCH_SENSITIVITY: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
struct PanSession {
    pointer: u64,
    start: Point,
    start_offset: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct PinchSession {
    ids: [u64; 2],
    start_distance: f64,
    start_zoom: f64,
    center: Point,
}

/// An open context menu: where it was opened and what it targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextMenu {
    pub position: Point,
    pub target: Option<NoteId>,
}

/// Pan/zoom/selection controller for one board view.
pub struct ViewportController {
    store: Rc<Store>,
    viewport: Rect,
    selected: Rc<Cell<Option<NoteId>>>,
    pan: Option<PanSession>,
    touches: HashMap<u64, Point>,
    pinch: Option<PinchSession>,
    gesture_start_zoom: Option<f64>,
    context_menu: Option<ContextMenu>,
}

impl ViewportController {
    /// Create a controller for the given viewport bounds (absolute
    /// screen coordinates of the board element).
    pub fn new(store: Rc<Store>, viewport: Rect) -> Self {
        Self {
            store,
            viewport,
            selected: Rc::new(Cell::new(None)),
            pan: None,
            touches: HashMap::new(),
            pinch: None,
            gesture_start_zoom: None,
            context_menu: None,
        }
    }

    /// Update the viewport bounds after a layout change.
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// The shared selection slot. Hand this to the shortcut watcher so
    /// copy targets whatever is selected here.
    pub fn selection_handle(&self) -> Rc<Cell<Option<NoteId>>> {
        Rc::clone(&self.selected)
    }

    pub fn selected_note(&self) -> Option<NoteId> {
        self.selected.get()
    }

    /// Select a note. Selection always raises the note to the front.
    pub fn select_note(&mut self, id: NoteId) {
        self.selected.set(Some(id));
        self.store.bring_note_to_front(id);
    }

    pub fn clear_selection(&mut self) {
        self.selected.set(None);
    }

    pub fn context_menu(&self) -> Option<ContextMenu> {
        self.context_menu
    }

    pub fn close_context_menu(&mut self) {
        self.context_menu = None;
    }

    fn canvas(&self) -> (Vec2, f64) {
        let state = self.store.get_state();
        match state.current_workspace() {
            Some(ws) => (ws.canvas.offset, ws.canvas.zoom),
            None => (Vec2::ZERO, 1.0),
        }
    }

    fn local(&self, position: Point) -> Point {
        Point::new(position.x - self.viewport.x0, position.y - self.viewport.y0)
    }

    /// Feed one pointer event through the controller.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down {
                id,
                position,
                button,
                target,
            } => self.pointer_down(id, position, button, target),
            PointerEvent::Move { id, position } => self.pointer_move(id, position),
            PointerEvent::Up { id, .. } | PointerEvent::Cancel { id } => self.pointer_end(id),
            PointerEvent::Wheel { position, delta } => self.wheel(position, delta),
        }
    }

    fn pointer_down(
        &mut self,
        id: u64,
        position: Point,
        button: PointerButton,
        target: PointerTarget,
    ) {
        self.context_menu = None;
        self.touches.insert(id, position);

        if button == PointerButton::Secondary {
            let target = match target {
                PointerTarget::Note(note) => Some(note),
                PointerTarget::Background => None,
            };
            self.open_context_menu(position, target);
            return;
        }

        if self.touches.len() == 2 {
            self.begin_pinch();
            return;
        }

        match target {
            PointerTarget::Note(note) => {
                self.select_note(note);
            }
            PointerTarget::Background => {
                self.clear_selection();
                let (offset, _) = self.canvas();
                self.pan = Some(PanSession {
                    pointer: id,
                    start: position,
                    start_offset: offset,
                });
            }
        }
    }

    fn pointer_move(&mut self, id: u64, position: Point) {
        if let Some(touch) = self.touches.get_mut(&id) {
            *touch = position;
        }

        if self.pinch.is_some() {
            self.pinch_move();
            return;
        }

        match self.pan {
            Some(pan) if pan.pointer == id => {
                let delta = position - pan.start;
                self.store.set_offset(pan.start_offset + delta);
            }
            _ => {}
        }
    }

    fn pointer_end(&mut self, id: u64) {
        self.touches.remove(&id);
        if matches!(self.pinch, Some(pinch) if pinch.ids.contains(&id)) {
            self.pinch = None;
        }
        if matches!(self.pan, Some(pan) if pan.pointer == id) {
            self.pan = None;
        }
    }

    fn begin_pinch(&mut self) {
        // A second contact always wins over a background pan.
        self.pan = None;
        let mut ids = self.touches.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        let (a, b) = (self.touches[&ids[0]], self.touches[&ids[1]]);
        let (_, zoom) = self.canvas();
        self.pinch = Some(PinchSession {
            ids: [ids[0], ids[1]],
            start_distance: a.distance(b).max(f64::EPSILON),
            start_zoom: zoom,
            center: a.midpoint(b),
        });
    }

    fn pinch_move(&mut self) {
        let Some(session) = self.pinch else {
            return;
        };
        let (Some(&a), Some(&b)) = (
            self.touches.get(&session.ids[0]),
            self.touches.get(&session.ids[1]),
        ) else {
            return;
        };

        let distance = a.distance(b).max(f64::EPSILON);
        let centroid = a.midpoint(b);
        let ratio = distance / session.start_distance;
        let (offset, zoom) = self.canvas();
        let next = clamp_zoom(session.start_zoom * ratio.powf(PINCH_SENSITIVITY));

        // Zoom around where the gesture started, then pan by however far
        // the fingers traveled together.
        let mut next_offset = zoom_around_point(self.viewport, session.center, zoom, next, offset);
        next_offset += centroid - session.center;

        self.store.set_zoom(next);
        self.store.set_offset(next_offset);

        // Re-snapshot so the next move works from the state just applied
        // rather than compounding against a stale baseline.
        self.pinch = Some(PinchSession {
            ids: session.ids,
            start_distance: distance,
            start_zoom: next,
            center: centroid,
        });
    }

    fn wheel(&mut self, position: Point, delta: Vec2) {
        if delta.y == 0.0 {
            return;
        }
        let factor = if delta.y < 0.0 {
            WHEEL_ZOOM_IN
        } else {
            WHEEL_ZOOM_OUT
        };
        let (offset, zoom) = self.canvas();
        let next = clamp_zoom(zoom * factor);
        if next == zoom {
            return;
        }
        let next_offset = zoom_around_point(self.viewport, position, zoom, next, offset);
        self.store.set_zoom(next);
        self.store.set_offset(next_offset);
    }

    /// Begin a trackpad magnification gesture. Snapshots the zoom the
    /// whole gesture scales against.
    pub fn gesture_begin(&mut self) {
        let (_, zoom) = self.canvas();
        self.gesture_start_zoom = Some(zoom);
    }

    /// Apply a trackpad magnification update. `scale` is cumulative
    /// since [`ViewportController::gesture_begin`].
    pub fn gesture_change(&mut self, scale: f64, position: Point) {
        let Some(start_zoom) = self.gesture_start_zoom else {
            return;
        };
        let (offset, zoom) = self.canvas();
        let next = clamp_zoom(start_zoom * scale);
        if next == zoom {
            return;
        }
        let next_offset = zoom_around_point(self.viewport, position, zoom, next, offset);
        self.store.set_zoom(next);
        self.store.set_offset(next_offset);
    }

    pub fn gesture_end(&mut self) {
        self.gesture_start_zoom = None;
    }

    /// Zoom and pan so every visible note fits in the viewport. An empty
    /// board resets to the identity view.
    pub fn fit_to_screen(&mut self) {
        let state = self.store.get_state();
        let bounds = state.current_workspace().and_then(|ws| ws.visible_bounds());
        let Some(bounds) = bounds else {
            self.store.set_zoom(1.0);
            self.store.set_offset(Vec2::ZERO);
            return;
        };

        let (vw, vh) = (self.viewport.width(), self.viewport.height());
        let zoom = clamp_zoom((vw / bounds.width()).min(vh / bounds.height()));
        let offset = Vec2::new(
            (vw - bounds.width() * zoom) / 2.0 - bounds.x0 * zoom,
            (vh - bounds.height() * zoom) / 2.0 - bounds.y0 * zoom,
        );
        self.store.set_zoom(zoom);
        self.store.set_offset(offset);
    }

    /// Open the context menu at a screen position, optionally targeting
    /// a note (which also selects it).
    pub fn open_context_menu(&mut self, position: Point, target: Option<NoteId>) {
        if let Some(note) = target {
            self.select_note(note);
        }
        self.context_menu = Some(ContextMenu { position, target });
    }

    /// Copy the selected note to the clipboard.
    pub fn copy_selected(&mut self) {
        let Some(id) = self.selected.get() else {
            return;
        };
        let state = self.store.get_state();
        if let Some(note) = state.current_workspace().and_then(|ws| ws.note(id)) {
            clipboard::copy_note(note);
        }
        self.context_menu = None;
    }

    /// Whether paste is currently possible.
    pub fn can_paste(&self) -> bool {
        clipboard::has_note()
    }

    /// Paste the clipboard note at a screen position and select it once
    /// it exists.
    pub fn paste_at(&mut self, position: Point) {
        let (offset, zoom) = self.canvas();
        let board = screen_to_board(self.local(position), offset, zoom);
        let Some(draft) = clipboard::paste_note(Some(board)) else {
            return;
        };
        let selected = Rc::clone(&self.selected);
        self.store
            .insert_note_detached(draft, Some(Rc::new(move |id| selected.set(Some(id)))));
        self.context_menu = None;
    }

    /// Paste from the open context menu, at the spot it was opened.
    pub fn paste_from_menu(&mut self) {
        if let Some(menu) = self.context_menu {
            self.paste_at(menu.position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::model::NotePatch;
    use crate::store::Spawner;
    use crate::zoom::{MAX_ZOOM, board_to_screen};

    fn immediate_spawner() -> Spawner {
        Box::new(|fut| pollster::block_on(fut))
    }

    fn setup() -> (Rc<Store>, ViewportController) {
        let backend = Rc::new(MemoryBackend::new());
        let store = Rc::new(Store::new(backend, immediate_spawner()));
        let controller =
            ViewportController::new(Rc::clone(&store), Rect::new(0.0, 0.0, 800.0, 600.0));
        (store, controller)
    }

    fn canvas(store: &Store) -> (Vec2, f64) {
        let state = store.get_state();
        let ws = state.current_workspace().unwrap();
        (ws.canvas.offset, ws.canvas.zoom)
    }

    fn down_background(id: u64, position: Point) -> PointerEvent {
        PointerEvent::Down {
            id,
            position,
            button: PointerButton::Primary,
            target: PointerTarget::Background,
        }
    }

    #[test]
    fn test_background_drag_pans() {
        let (store, mut controller) = setup();

        controller.handle_pointer(down_background(0, Point::new(100.0, 100.0)));
        controller.handle_pointer(PointerEvent::Move {
            id: 0,
            position: Point::new(150.0, 130.0),
        });

        let (offset, _) = canvas(&store);
        assert!((offset.x - 50.0).abs() < f64::EPSILON);
        assert!((offset.y - 30.0).abs() < f64::EPSILON);

        controller.handle_pointer(PointerEvent::Up {
            id: 0,
            position: Point::new(150.0, 130.0),
        });
        controller.handle_pointer(PointerEvent::Move {
            id: 0,
            position: Point::new(500.0, 500.0),
        });
        let (offset, _) = canvas(&store);
        assert!((offset.x - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wheel_zoom_keeps_cursor_point() {
        let (store, mut controller) = setup();
        let cursor = Point::new(200.0, 150.0);
        let (offset, zoom) = canvas(&store);
        let board = crate::zoom::screen_to_board(cursor, offset, zoom);

        controller.handle_pointer(PointerEvent::Wheel {
            position: cursor,
            delta: Vec2::new(0.0, -1.0),
        });

        let (offset, zoom) = canvas(&store);
        assert!((zoom - 1.1).abs() < f64::EPSILON);
        let after = board_to_screen(board, offset, zoom);
        assert!((after.x - cursor.x).abs() < 1e-10);
        assert!((after.y - cursor.y).abs() < 1e-10);
    }

    #[test]
    fn test_wheel_zoom_clamps_at_max() {
        let (store, mut controller) = setup();
        store.set_zoom(MAX_ZOOM);
        let (offset_before, _) = canvas(&store);

        controller.handle_pointer(PointerEvent::Wheel {
            position: Point::new(100.0, 100.0),
            delta: Vec2::new(0.0, -1.0),
        });

        let (offset, zoom) = canvas(&store);
        assert!((zoom - MAX_ZOOM).abs() < f64::EPSILON);
        assert!((offset.x - offset_before.x).abs() < f64::EPSILON);
    }

    #[test]
    fn test_note_click_selects_and_raises() {
        let (store, mut controller) = setup();
        let a = pollster::block_on(store.add_note()).unwrap();
        let b = pollster::block_on(store.add_note()).unwrap();

        controller.handle_pointer(PointerEvent::Down {
            id: 0,
            position: Point::new(100.0, 100.0),
            button: PointerButton::Primary,
            target: PointerTarget::Note(a),
        });

        assert_eq!(controller.selected_note(), Some(a));
        let state = store.get_state();
        let ws = state.current_workspace().unwrap();
        assert!(ws.note(a).unwrap().z_index > ws.note(b).unwrap().z_index);

        controller.handle_pointer(PointerEvent::Up {
            id: 0,
            position: Point::new(100.0, 100.0),
        });
        controller.handle_pointer(down_background(0, Point::new(400.0, 400.0)));
        assert_eq!(controller.selected_note(), None);
    }

    #[test]
    fn test_pinch_spread_zooms_around_gesture_center() {
        let (store, mut controller) = setup();

        controller.handle_pointer(down_background(1, Point::new(300.0, 300.0)));
        controller.handle_pointer(down_background(2, Point::new(500.0, 300.0)));

        let center = Point::new(400.0, 300.0);
        let board = crate::zoom::screen_to_board(center, Vec2::ZERO, 1.0);

        controller.handle_pointer(PointerEvent::Move {
            id: 1,
            position: Point::new(200.0, 300.0),
        });
        controller.handle_pointer(PointerEvent::Move {
            id: 2,
            position: Point::new(600.0, 300.0),
        });

        let (offset, zoom) = canvas(&store);
        // Distance doubled; the damping exponent turns that into sqrt(2).
        assert!((zoom - 2.0_f64.powf(PINCH_SENSITIVITY)).abs() < 1e-9);
        let after = board_to_screen(board, offset, zoom);
        assert!((after.x - center.x).abs() < 1e-9);
        assert!((after.y - center.y).abs() < 1e-9);
    }

    #[test]
    fn test_second_touch_cancels_pan() {
        let (store, mut controller) = setup();

        controller.handle_pointer(down_background(1, Point::new(100.0, 100.0)));
        controller.handle_pointer(down_background(2, Point::new(300.0, 100.0)));

        // Moving the first contact must drive the pinch, not the pan.
        controller.handle_pointer(PointerEvent::Move {
            id: 1,
            position: Point::new(50.0, 100.0),
        });

        let (_, zoom) = canvas(&store);
        assert!(zoom > 1.0);
    }

    #[test]
    fn test_gesture_scale_zooms_from_snapshot() {
        let (store, mut controller) = setup();

        controller.gesture_begin();
        controller.gesture_change(1.5, Point::new(400.0, 300.0));
        controller.gesture_change(2.0, Point::new(400.0, 300.0));
        controller.gesture_end();

        let (_, zoom) = canvas(&store);
        // Cumulative scale, not compounded per event.
        assert!((zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_screen_centers_content() {
        let (store, mut controller) = setup();
        let id = pollster::block_on(store.add_note()).unwrap();
        store.update_note(id, NotePatch::place(0.0, 0.0, 400.0, 300.0));

        controller.fit_to_screen();

        let (offset, zoom) = canvas(&store);
        assert!((zoom - 2.0).abs() < f64::EPSILON);
        let center = board_to_screen(Point::new(200.0, 150.0), offset, zoom);
        assert!((center.x - 400.0).abs() < 1e-10);
        assert!((center.y - 300.0).abs() < 1e-10);
    }

    #[test]
    fn test_fit_to_screen_empty_board_resets() {
        let (store, mut controller) = setup();
        store.set_zoom(2.5);
        store.set_offset(Vec2::new(300.0, 300.0));

        controller.fit_to_screen();

        let (offset, zoom) = canvas(&store);
        assert!((zoom - 1.0).abs() < f64::EPSILON);
        assert!((offset.x).abs() < f64::EPSILON);
    }

    #[test]
    fn test_context_menu_copy_paste_round_trip() {
        clipboard::clear();
        let (store, mut controller) = setup();
        let id = pollster::block_on(store.add_note()).unwrap();
        store.update_note(
            id,
            NotePatch {
                content: Some("plan".to_string()),
                ..NotePatch::default()
            },
        );

        controller.open_context_menu(Point::new(50.0, 50.0), Some(id));
        controller.copy_selected();
        assert!(controller.can_paste());

        controller.open_context_menu(Point::new(300.0, 200.0), None);
        controller.paste_from_menu();

        let state = store.get_state();
        let ws = state.current_workspace().unwrap();
        assert_eq!(ws.notes.len(), 2);
        let pasted = ws.notes.iter().find(|n| n.id != id).unwrap();
        assert_eq!(pasted.content, "plan");
        assert!((pasted.x - 300.0).abs() < f64::EPSILON);
        assert!((pasted.y - 200.0).abs() < f64::EPSILON);
        assert_eq!(controller.selected_note(), Some(pasted.id));
        assert!(controller.context_menu().is_none());
    }
}
