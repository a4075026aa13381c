//! Edge snapping for drag and resize gestures.
//!
//! Snapping is evaluated per axis against the edges of sibling notes in
//! the same workspace. The x and y axes are fully decoupled: a shape may
//! snap on one axis and move freely on the other. When an edge is pulled
//! into alignment, the aligned coordinate is reported as a guide line for
//! the rendering layer.

use crate::model::{Note, NoteId};

/// Maximum snap distance in screen pixels; divide by the current zoom to
/// get the threshold in board units.
pub const SNAP_THRESHOLD: f64 = 10.0;

/// Guide lines produced by a snapped gesture, one optional aligned
/// coordinate per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapLines {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl SnapLines {
    /// No guide lines on either axis.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether any axis snapped.
    pub fn is_snapped(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }
}

/// Candidate edges collected from sibling notes: leading and trailing
/// edge per axis for every other shape in the workspace.
#[derive(Debug, Clone, Default)]
pub struct EdgeCandidates {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl EdgeCandidates {
    /// Collect edges from every note except `exclude`.
    pub fn from_siblings<'a>(notes: impl IntoIterator<Item = &'a Note>, exclude: NoteId) -> Self {
        let mut candidates = Self::default();
        for note in notes {
            if note.id == exclude {
                continue;
            }
            candidates.x.push(note.x);
            candidates.x.push(note.x + note.width);
            candidates.y.push(note.y);
            candidates.y.push(note.y + note.height);
        }
        candidates
    }
}

/// Return the first candidate within `threshold` of `value`, or `value`
/// unchanged.
fn snap_value(value: f64, candidates: &[f64], threshold: f64) -> f64 {
    for &c in candidates {
        if (value - c).abs() <= threshold {
            return c;
        }
    }
    value
}

/// Result of snapping one axis of a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragAxisSnap {
    /// The (possibly shifted) leading-edge coordinate.
    pub value: f64,
    /// Aligned coordinate for the guide line, if a snap occurred.
    pub guide: Option<f64>,
}

/// Snap one axis of a dragged shape.
///
/// Both the leading edge (`leading`) and the trailing edge
/// (`leading + extent`) are evaluated against the candidates; whichever
/// snaps over the smaller distance wins, and the shape is shifted by
/// exactly the delta that aligns that edge.
pub fn snap_drag_axis(leading: f64, extent: f64, candidates: &[f64], threshold: f64) -> DragAxisSnap {
    let trailing = leading + extent;
    let snapped_leading = snap_value(leading, candidates, threshold);
    let snapped_trailing = snap_value(trailing, candidates, threshold);

    if (snapped_trailing - trailing).abs() < (snapped_leading - leading).abs() {
        let guide = (snapped_trailing != trailing).then_some(snapped_trailing);
        DragAxisSnap {
            value: leading + (snapped_trailing - trailing),
            guide,
        }
    } else if snapped_leading != leading {
        DragAxisSnap {
            value: snapped_leading,
            guide: Some(snapped_leading),
        }
    } else {
        DragAxisSnap {
            value: leading,
            guide: None,
        }
    }
}

/// Result of snapping one axis of a resize gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeAxisSnap {
    /// The (possibly shifted) leading-edge coordinate.
    pub leading: f64,
    /// The (possibly adjusted) extent along the axis.
    pub extent: f64,
    /// Aligned coordinate for the guide line, if a snap occurred.
    pub guide: Option<f64>,
}

/// Snap one axis of a resized shape.
///
/// A leading-edge snap shifts the position and grows the extent to keep
/// the trailing edge put; a trailing-edge snap adjusts the extent only.
/// The extent never drops below `min_extent`.
pub fn snap_resize_axis(
    leading: f64,
    extent: f64,
    min_extent: f64,
    candidates: &[f64],
    threshold: f64,
) -> ResizeAxisSnap {
    let mut result = ResizeAxisSnap {
        leading,
        extent,
        guide: None,
    };

    let snapped_leading = snap_value(result.leading, candidates, threshold);
    if snapped_leading != result.leading {
        let shift = result.leading - snapped_leading;
        result.guide = Some(snapped_leading);
        result.leading = snapped_leading;
        result.extent = (result.extent + shift).max(min_extent);
    }

    let trailing = result.leading + result.extent;
    let snapped_trailing = snap_value(trailing, candidates, threshold);
    if snapped_trailing != trailing {
        result.guide = Some(snapped_trailing);
        result.extent = (snapped_trailing - result.leading).max(min_extent);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_value_picks_first_within_threshold() {
        assert!((snap_value(93.0, &[100.0, 150.0], 10.0) - 100.0).abs() < f64::EPSILON);
        assert!((snap_value(93.0, &[120.0, 150.0], 10.0) - 93.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_axis_leading_wins_ties() {
        // Leading at 93 is 7 away from 100; trailing at 143 is 7 away
        // from 150. The tie goes to the leading edge.
        let snap = snap_drag_axis(93.0, 50.0, &[100.0, 150.0], 10.0);
        assert!((snap.value - 100.0).abs() < f64::EPSILON);
        assert_eq!(snap.guide, Some(100.0));
    }

    #[test]
    fn test_drag_axis_trailing_edge_shifts_position() {
        // Trailing edge at 96 is 4 away from 100; leading at 46 has no
        // candidate in range.
        let snap = snap_drag_axis(46.0, 50.0, &[100.0], 10.0);
        assert!((snap.value - 50.0).abs() < f64::EPSILON);
        assert_eq!(snap.guide, Some(100.0));
    }

    #[test]
    fn test_drag_axis_no_candidates_in_range() {
        let snap = snap_drag_axis(0.0, 50.0, &[200.0, 300.0], 10.0);
        assert!((snap.value - 0.0).abs() < f64::EPSILON);
        assert_eq!(snap.guide, None);
    }

    #[test]
    fn test_resize_axis_trailing_snap_adjusts_extent() {
        let snap = snap_resize_axis(0.0, 96.0, 80.0, &[100.0], 10.0);
        assert!((snap.leading - 0.0).abs() < f64::EPSILON);
        assert!((snap.extent - 100.0).abs() < f64::EPSILON);
        assert_eq!(snap.guide, Some(100.0));
    }

    #[test]
    fn test_resize_axis_leading_snap_preserves_trailing() {
        // Leading at 103 snaps to 100; extent grows by the shift so the
        // trailing edge stays at 203.
        let snap = snap_resize_axis(103.0, 100.0, 80.0, &[100.0], 10.0);
        assert!((snap.leading - 100.0).abs() < f64::EPSILON);
        assert!((snap.extent - 103.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_axis_respects_floor() {
        let snap = snap_resize_axis(0.0, 85.0, 80.0, &[75.0], 10.0);
        // Trailing edge at 85 snaps to 75, but extent may not drop
        // below the floor.
        assert!((snap.extent - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_edge_candidates_skip_self() {
        let mk = |id: i64, x: f64| Note {
            id,
            x,
            y: 0.0,
            width: 50.0,
            height: 50.0,
            rotation: 0.0,
            z_index: 0,
            color: String::new(),
            pinned: false,
            locked: false,
            archived: false,
            content: String::new(),
        };
        let notes = [mk(1, 0.0), mk(2, 100.0)];
        let candidates = EdgeCandidates::from_siblings(&notes, 1);
        assert_eq!(candidates.x, vec![100.0, 150.0]);
        assert_eq!(candidates.y, vec![0.0, 50.0]);
    }
}
