//! Backend collaborator contract.
//!
//! The store talks to the outside world only through [`BackendApi`]. The
//! trait is object-safe and async via boxed futures so the composition
//! root can plug in an HTTP client, an in-memory double, or anything
//! else without the core knowing. The core is single-threaded by
//! construction (the store hands out `Rc` handles), so implementations
//! are not required to be `Send`.

mod memory;

pub use memory::MemoryBackend;

use crate::model::{Note, NoteId, NotePatch, User, WorkspaceId, WorkspaceRecord};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Backend errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session; the caller should start the external login flow.
    #[error("Not authenticated")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}

/// Result type for backend operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Persistence and session operations the store depends on.
///
/// Every mutation on the backend mirrors an optimistic local mutation
/// that has already happened; the store fires these and logs failures
/// without rolling back.
pub trait BackendApi {
    /// The authenticated user for the current session, if any.
    fn fetch_current_user(&self) -> BoxFuture<'_, ApiResult<Option<User>>>;

    /// All workspaces visible to the current user.
    fn list_workspaces(&self) -> BoxFuture<'_, ApiResult<Vec<WorkspaceRecord>>>;

    /// Create a workspace and return the stored record with its id.
    fn create_workspace(&self, name: &str) -> BoxFuture<'_, ApiResult<WorkspaceRecord>>;

    fn rename_workspace(&self, id: WorkspaceId, name: &str) -> BoxFuture<'_, ApiResult<()>>;

    fn delete_workspace(&self, id: WorkspaceId) -> BoxFuture<'_, ApiResult<()>>;

    /// All notes of a workspace, archived ones included.
    fn list_notes(&self, workspace: WorkspaceId) -> BoxFuture<'_, ApiResult<Vec<Note>>>;

    /// Create a note and return the stored note with its server id.
    fn create_note(&self, workspace: WorkspaceId, note: &Note) -> BoxFuture<'_, ApiResult<Note>>;

    /// Apply a partial update to a stored note.
    fn update_note(
        &self,
        workspace: WorkspaceId,
        id: NoteId,
        patch: &NotePatch,
    ) -> BoxFuture<'_, ApiResult<()>>;
}
