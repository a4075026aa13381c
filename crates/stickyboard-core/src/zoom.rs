//! Pure zoom and coordinate-space utilities.
//!
//! The board lives in its own coordinate space; the viewport maps it to
//! screen pixels with `screen = board * zoom + offset` (offset relative to
//! the viewport origin). Everything here is a stateless function so the
//! viewport controller, the interaction engine and tests share one
//! transform definition.

use kurbo::{Point, Rect, Vec2};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 3.0;

/// Clamp a zoom level to the closed interval `[MIN_ZOOM, MAX_ZOOM]`.
pub fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Clamp a zoom level to a caller-provided interval.
pub fn clamp_zoom_to(zoom: f64, min: f64, max: f64) -> f64 {
    zoom.clamp(min, max)
}

/// Convert a screen point (relative to the viewport origin) to board
/// coordinates.
pub fn screen_to_board(screen: Point, offset: Vec2, zoom: f64) -> Point {
    Point::new((screen.x - offset.x) / zoom, (screen.y - offset.y) / zoom)
}

/// Convert a board point to screen coordinates (relative to the viewport
/// origin).
pub fn board_to_screen(board: Point, offset: Vec2, zoom: f64) -> Point {
    Point::new(board.x * zoom + offset.x, board.y * zoom + offset.y)
}

/// Compute the pan offset that keeps the board point currently under
/// `pivot` (an absolute screen point) at the same screen pixel after a
/// zoom change.
///
/// The pivot is first converted to board coordinates with the previous
/// transform, then the offset is solved so that the same board point maps
/// back to the pivot at the next zoom.
pub fn zoom_around_point(
    viewport: Rect,
    pivot: Point,
    prev_zoom: f64,
    next_zoom: f64,
    offset: Vec2,
) -> Vec2 {
    let local = Point::new(pivot.x - viewport.x0, pivot.y - viewport.y0);
    let board = screen_to_board(local, offset, prev_zoom);
    Vec2::new(local.x - board.x * next_zoom, local.y - board.y * next_zoom)
}

/// [`zoom_around_point`] specialized with the viewport center as pivot.
/// Used for button- and slider-driven zoom.
pub fn zoom_around_center(viewport: Rect, prev_zoom: f64, next_zoom: f64, offset: Vec2) -> Vec2 {
    zoom_around_point(viewport, viewport.center(), prev_zoom, next_zoom, offset)
}
