//! Data model for notes, workspaces and canvas state.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Identifier for a note within a workspace. Assigned at creation time
/// (backend id or client temp id) and never reused.
pub type NoteId = i64;

/// Identifier for a workspace.
pub type WorkspaceId = i64;

/// The default workspace. It always exists and can be neither renamed
/// nor deleted.
pub const DEFAULT_WORKSPACE_ID: WorkspaceId = 1;

/// Minimum note width in board units, enforced by every resize path.
pub const MIN_NOTE_WIDTH: f64 = 80.0;
/// Minimum note height in board units, enforced by every resize path.
pub const MIN_NOTE_HEIGHT: f64 = 60.0;

/// Default size for a freshly created note.
pub const DEFAULT_NOTE_WIDTH: f64 = 150.0;
/// Default size for a freshly created note.
pub const DEFAULT_NOTE_HEIGHT: f64 = 120.0;

/// Default note color (pale yellow).
pub const DEFAULT_NOTE_COLOR: &str = "#fef08a";

/// A sticky note on the board.
///
/// Geometry is stored in board coordinates, independent of pan/zoom.
/// `z_index` orders notes for rendering; it is generated from the
/// workspace's monotonic z-counter when a note is brought to front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees (around center).
    #[serde(default)]
    pub rotation: f64,
    pub z_index: i64,
    /// Fill color as a hex string.
    pub color: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub archived: bool,
    /// Freeform text/markdown content.
    #[serde(default)]
    pub content: String,
}

impl Note {
    /// Top-left position in board coordinates.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Bounding box in board coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Merge a partial update into this note. Size fields are clamped to
    /// the minimum note dimensions so the invariant holds on every path.
    pub fn apply(&mut self, patch: &NotePatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width.max(MIN_NOTE_WIDTH);
        }
        if let Some(height) = patch.height {
            self.height = height.max(MIN_NOTE_HEIGHT);
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(z_index) = patch.z_index {
            self.z_index = z_index;
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(pinned) = patch.pinned {
            self.pinned = pinned;
        }
        if let Some(locked) = patch.locked {
            self.locked = locked;
        }
        if let Some(archived) = patch.archived {
            self.archived = archived;
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
    }
}

/// Partial note update. `None` fields are left untouched by [`Note::apply`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NotePatch {
    /// Patch that only moves a note.
    pub fn move_to(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch that moves and resizes a note.
    pub fn place(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Patch that only flips the archived flag.
    pub fn archived(archived: bool) -> Self {
        Self {
            archived: Some(archived),
            ..Self::default()
        }
    }
}

/// Per-workspace canvas view state.
///
/// `offset` is the pan translation in screen space; `zoom` is clamped to
/// the bounds in [`crate::zoom`]. `z_counter` only ever increases and
/// generates z-indices for bring-to-front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    pub offset: Vec2,
    pub zoom: f64,
    pub z_counter: i64,
    pub snap_to_edges: bool,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            z_counter: 0,
            snap_to_edges: false,
        }
    }
}

/// An authenticated user, as reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A named workspace holding notes and its own canvas state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub contributor_ids: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub canvas: CanvasState,
}

impl Workspace {
    /// Create the default workspace (id 1).
    pub fn default_workspace() -> Self {
        Self {
            id: DEFAULT_WORKSPACE_ID,
            name: "Default".to_string(),
            owner_id: None,
            contributor_ids: Vec::new(),
            notes: Vec::new(),
            canvas: CanvasState::default(),
        }
    }

    /// Look up a note by id.
    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Look up a note by id, mutably.
    pub fn note_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    /// Notes that are not archived, i.e. the default board view.
    pub fn visible_notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|n| !n.archived)
    }

    /// Bounding box of all visible notes, if any.
    pub fn visible_bounds(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for note in self.visible_notes() {
            let bounds = note.bounds();
            result = Some(match result {
                Some(r) => r.union(bounds),
                None => bounds,
            });
        }
        result
    }
}

/// Backend-shaped workspace record: what the CRUD API exchanges, without
/// the client-only notes list and canvas state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub contributor_ids: Vec<String>,
}

impl From<WorkspaceRecord> for Workspace {
    fn from(record: WorkspaceRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            owner_id: record.owner_id,
            contributor_ids: record.contributor_ids,
            notes: Vec::new(),
            canvas: CanvasState::default(),
        }
    }
}

/// The whole application state owned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub user: Option<User>,
    pub workspaces: Vec<Workspace>,
    pub current_workspace_id: WorkspaceId,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            user: None,
            workspaces: vec![Workspace::default_workspace()],
            current_workspace_id: DEFAULT_WORKSPACE_ID,
        }
    }
}

impl AppState {
    /// The active workspace, falling back to the first one when the
    /// current id is stale.
    pub fn current_workspace(&self) -> Option<&Workspace> {
        self.workspaces
            .iter()
            .find(|w| w.id == self.current_workspace_id)
            .or_else(|| self.workspaces.first())
    }

    /// Mutable access to the active workspace.
    pub fn current_workspace_mut(&mut self) -> Option<&mut Workspace> {
        let id = self.current_workspace_id;
        if self.workspaces.iter().any(|w| w.id == id) {
            self.workspaces.iter_mut().find(|w| w.id == id)
        } else {
            self.workspaces.first_mut()
        }
    }
}
