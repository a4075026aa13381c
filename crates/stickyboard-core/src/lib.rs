//! StickyBoard Core Library
//!
//! Platform-agnostic state and interaction logic for the StickyBoard
//! multi-user sticky-notes whiteboard.

pub mod api;
pub mod clipboard;
pub mod input;
pub mod interaction;
pub mod model;
pub mod shortcuts;
pub mod snap;
pub mod store;
pub mod viewport;
pub mod zoom;

pub use api::{ApiError, ApiResult, BackendApi, BoxFuture, MemoryBackend};
pub use input::{KeyPress, Modifiers, PointerButton, PointerEvent, PointerTarget};
pub use interaction::{InteractionOptions, InteractionUpdate, ShapeInteractions};
pub use model::{AppState, CanvasState, Note, NoteId, NotePatch, User, Workspace, WorkspaceId};
pub use shortcuts::KeyWatcher;
pub use snap::{SNAP_THRESHOLD, SnapLines};
pub use store::{Spawner, Store, SubscriptionId};
pub use viewport::{ContextMenu, ViewportController};
pub use zoom::{MAX_ZOOM, MIN_ZOOM, clamp_zoom, zoom_around_center, zoom_around_point};
