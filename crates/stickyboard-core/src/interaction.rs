//! Per-shape drag/resize gesture engine.
//!
//! One `ShapeInteractions` instance lives alongside each rendered note.
//! It is a small imperative state machine kept outside any reactive
//! rendering state: the rendering layer feeds it raw pointer events and
//! applies the returned updates to the store. All position math happens
//! in board coordinates; the engine only needs the current pan/zoom to
//! invert the viewport transform.

use crate::model::{MIN_NOTE_HEIGHT, MIN_NOTE_WIDTH, Note, NoteId, NotePatch};
use crate::snap::{
    EdgeCandidates, SNAP_THRESHOLD, SnapLines, snap_drag_axis, snap_resize_axis,
};
use crate::zoom::screen_to_board;
use kurbo::{Point, Vec2};

/// Inputs for a shape's interaction engine.
///
/// Rebuilt by the rendering layer on every re-render; swap it in with
/// [`ShapeInteractions::update_options`] so an in-flight gesture keeps
/// its captured state while tracking fresh geometry.
#[derive(Debug, Clone)]
pub struct InteractionOptions {
    /// The shape this engine manipulates.
    pub shape: Note,
    /// Every note in the same workspace (the engine skips the target
    /// itself when collecting snap candidates).
    pub siblings: Vec<Note>,
    /// Current viewport zoom.
    pub zoom: f64,
    /// Current viewport pan offset (screen space).
    pub offset: Vec2,
    /// Whether edge snapping is enabled.
    pub snap_to_edges: bool,
}

/// Active gesture, with the state captured at pointer-down.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Dragging {
        /// Pointer position relative to the shape origin, in board units.
        grab: Vec2,
    },
    Resizing {
        /// Pointer position at gesture start, in board units.
        start: Point,
        /// Shape size at gesture start.
        width: f64,
        height: f64,
    },
}

/// A geometry update produced by a gesture step.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionUpdate {
    pub id: NoteId,
    pub patch: NotePatch,
    pub snap_lines: SnapLines,
}

/// Drag/resize state machine for a single shape.
#[derive(Debug, Clone)]
pub struct ShapeInteractions {
    opts: InteractionOptions,
    gesture: Gesture,
}

impl ShapeInteractions {
    /// Create an idle engine for a shape.
    pub fn new(opts: InteractionOptions) -> Self {
        Self {
            opts,
            gesture: Gesture::Idle,
        }
    }

    /// Replace the inputs without resetting an in-flight gesture.
    pub fn update_options(&mut self, opts: InteractionOptions) {
        self.opts = opts;
    }

    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    fn to_board(&self, screen: Point) -> Point {
        screen_to_board(screen, self.opts.offset, self.opts.zoom)
    }

    /// Start a gesture. `on_resize_handle` is true when the pointer went
    /// down on the shape's resize handle. Locked shapes ignore input
    /// entirely.
    pub fn pointer_down(&mut self, screen: Point, on_resize_handle: bool) {
        if self.opts.shape.locked {
            return;
        }
        let pos = self.to_board(screen);
        self.gesture = if on_resize_handle {
            Gesture::Resizing {
                start: pos,
                width: self.opts.shape.width,
                height: self.opts.shape.height,
            }
        } else {
            Gesture::Dragging {
                grab: pos - self.opts.shape.position(),
            }
        };
    }

    /// Advance the active gesture. Returns the geometry patch to apply,
    /// or `None` while idle or locked.
    pub fn pointer_move(&mut self, screen: Point) -> Option<InteractionUpdate> {
        if self.opts.shape.locked {
            return None;
        }
        let pos = self.to_board(screen);
        match self.gesture {
            Gesture::Idle => None,
            Gesture::Dragging { grab } => Some(self.drag_update(pos, grab)),
            Gesture::Resizing {
                start,
                width,
                height,
            } => Some(self.resize_update(pos, start, width, height)),
        }
    }

    /// End the gesture. Returns cleared snap lines so the rendering
    /// layer drops any visible guides.
    pub fn pointer_up(&mut self) -> SnapLines {
        self.gesture = Gesture::Idle;
        SnapLines::none()
    }

    /// Abort the gesture (pointer capture lost, touch cancelled).
    pub fn pointer_cancel(&mut self) -> SnapLines {
        self.gesture = Gesture::Idle;
        SnapLines::none()
    }

    fn drag_update(&self, pos: Point, grab: Vec2) -> InteractionUpdate {
        let shape = &self.opts.shape;
        let mut new_x = pos.x - grab.x;
        let mut new_y = pos.y - grab.y;
        let mut lines = SnapLines::none();

        if self.opts.snap_to_edges {
            let threshold = SNAP_THRESHOLD / self.opts.zoom;
            let candidates = EdgeCandidates::from_siblings(&self.opts.siblings, shape.id);

            let sx = snap_drag_axis(new_x, shape.width, &candidates.x, threshold);
            new_x = sx.value;
            lines.x = sx.guide;

            let sy = snap_drag_axis(new_y, shape.height, &candidates.y, threshold);
            new_y = sy.value;
            lines.y = sy.guide;
        }

        InteractionUpdate {
            id: shape.id,
            patch: NotePatch::move_to(new_x, new_y),
            snap_lines: lines,
        }
    }

    fn resize_update(&self, pos: Point, start: Point, width: f64, height: f64) -> InteractionUpdate {
        let shape = &self.opts.shape;
        let mut new_x = shape.x;
        let mut new_y = shape.y;
        let mut new_width = (width + (pos.x - start.x)).max(MIN_NOTE_WIDTH);
        let mut new_height = (height + (pos.y - start.y)).max(MIN_NOTE_HEIGHT);
        let mut lines = SnapLines::none();

        if self.opts.snap_to_edges {
            let threshold = SNAP_THRESHOLD / self.opts.zoom;
            let candidates = EdgeCandidates::from_siblings(&self.opts.siblings, shape.id);

            let sx = snap_resize_axis(new_x, new_width, MIN_NOTE_WIDTH, &candidates.x, threshold);
            new_x = sx.leading;
            new_width = sx.extent;
            lines.x = sx.guide;

            let sy = snap_resize_axis(new_y, new_height, MIN_NOTE_HEIGHT, &candidates.y, threshold);
            new_y = sy.leading;
            new_height = sy.extent;
            lines.y = sy.guide;
        }

        InteractionUpdate {
            id: shape.id,
            patch: NotePatch::place(new_x, new_y, new_width, new_height),
            snap_lines: lines,
        }
    }
}
