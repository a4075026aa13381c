//! In-memory backend for tests and offline composition roots.

use super::{ApiError, ApiResult, BackendApi, BoxFuture};
use crate::model::{
    DEFAULT_WORKSPACE_ID, Note, NoteId, NotePatch, User, WorkspaceId, WorkspaceRecord,
};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Inner {
    user: Option<User>,
    workspaces: Vec<WorkspaceRecord>,
    notes: HashMap<WorkspaceId, Vec<Note>>,
    next_workspace_id: WorkspaceId,
    next_note_id: NoteId,
    fail_writes: bool,
}

/// A `BackendApi` backed by process memory.
///
/// Ids are assigned from per-kind counters, like the real backend.
/// `fail_writes` turns every mutation into a server error, which tests
/// use to check that optimistic local state survives persistence
/// failures.
#[derive(Debug)]
pub struct MemoryBackend {
    inner: RefCell<Inner>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let inner = Inner {
            workspaces: vec![WorkspaceRecord {
                id: DEFAULT_WORKSPACE_ID,
                name: "Default".to_string(),
                owner_id: None,
                contributor_ids: Vec::new(),
            }],
            next_workspace_id: DEFAULT_WORKSPACE_ID + 1,
            next_note_id: 1,
            ..Inner::default()
        };
        Self {
            inner: RefCell::new(inner),
        }
    }

    /// Set the user returned by `fetch_current_user`.
    pub fn set_user(&self, user: Option<User>) {
        self.inner.borrow_mut().user = user;
    }

    /// Make every write return a server error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Stored notes of a workspace, for test assertions.
    pub fn stored_notes(&self, workspace: WorkspaceId) -> Vec<Note> {
        self.inner
            .borrow()
            .notes
            .get(&workspace)
            .cloned()
            .unwrap_or_default()
    }

    /// Stored workspace records, for test assertions.
    pub fn stored_workspaces(&self) -> Vec<WorkspaceRecord> {
        self.inner.borrow().workspaces.clone()
    }

    fn write_guard(&self) -> ApiResult<()> {
        if self.inner.borrow().fail_writes {
            Err(ApiError::Server {
                status: 500,
                message: "simulated failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl BackendApi for MemoryBackend {
    fn fetch_current_user(&self) -> BoxFuture<'_, ApiResult<Option<User>>> {
        Box::pin(async move { Ok(self.inner.borrow().user.clone()) })
    }

    fn list_workspaces(&self) -> BoxFuture<'_, ApiResult<Vec<WorkspaceRecord>>> {
        Box::pin(async move { Ok(self.inner.borrow().workspaces.clone()) })
    }

    fn create_workspace(&self, name: &str) -> BoxFuture<'_, ApiResult<WorkspaceRecord>> {
        let name = name.to_string();
        Box::pin(async move {
            self.write_guard()?;
            let mut inner = self.inner.borrow_mut();
            let record = WorkspaceRecord {
                id: inner.next_workspace_id,
                name,
                owner_id: inner.user.as_ref().map(|u| u.id.clone()),
                contributor_ids: Vec::new(),
            };
            inner.next_workspace_id += 1;
            inner.workspaces.push(record.clone());
            Ok(record)
        })
    }

    fn rename_workspace(&self, id: WorkspaceId, name: &str) -> BoxFuture<'_, ApiResult<()>> {
        let name = name.to_string();
        Box::pin(async move {
            self.write_guard()?;
            let mut inner = self.inner.borrow_mut();
            match inner.workspaces.iter_mut().find(|w| w.id == id) {
                Some(record) => {
                    record.name = name;
                    Ok(())
                }
                None => Err(ApiError::NotFound(format!("workspace {id}"))),
            }
        })
    }

    fn delete_workspace(&self, id: WorkspaceId) -> BoxFuture<'_, ApiResult<()>> {
        Box::pin(async move {
            self.write_guard()?;
            let mut inner = self.inner.borrow_mut();
            let before = inner.workspaces.len();
            inner.workspaces.retain(|w| w.id != id);
            if inner.workspaces.len() == before {
                return Err(ApiError::NotFound(format!("workspace {id}")));
            }
            inner.notes.remove(&id);
            Ok(())
        })
    }

    fn list_notes(&self, workspace: WorkspaceId) -> BoxFuture<'_, ApiResult<Vec<Note>>> {
        Box::pin(async move {
            Ok(self
                .inner
                .borrow()
                .notes
                .get(&workspace)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn create_note(&self, workspace: WorkspaceId, note: &Note) -> BoxFuture<'_, ApiResult<Note>> {
        let mut note = note.clone();
        Box::pin(async move {
            self.write_guard()?;
            let mut inner = self.inner.borrow_mut();
            note.id = inner.next_note_id;
            inner.next_note_id += 1;
            inner.notes.entry(workspace).or_default().push(note.clone());
            Ok(note)
        })
    }

    fn update_note(
        &self,
        workspace: WorkspaceId,
        id: NoteId,
        patch: &NotePatch,
    ) -> BoxFuture<'_, ApiResult<()>> {
        let patch = patch.clone();
        Box::pin(async move {
            self.write_guard()?;
            let mut inner = self.inner.borrow_mut();
            let note = inner
                .notes
                .get_mut(&workspace)
                .and_then(|notes| notes.iter_mut().find(|n| n.id == id));
            match note {
                Some(note) => {
                    note.apply(&patch);
                    Ok(())
                }
                None => Err(ApiError::NotFound(format!("note {id}"))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_NOTE_COLOR, DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH};

    fn note() -> Note {
        Note {
            id: 0,
            x: 0.0,
            y: 0.0,
            width: DEFAULT_NOTE_WIDTH,
            height: DEFAULT_NOTE_HEIGHT,
            rotation: 0.0,
            z_index: 1,
            color: DEFAULT_NOTE_COLOR.to_string(),
            pinned: false,
            locked: false,
            archived: false,
            content: String::new(),
        }
    }

    #[test]
    fn test_create_note_assigns_ids() {
        let backend = MemoryBackend::new();
        let a = pollster::block_on(backend.create_note(1, &note())).unwrap();
        let b = pollster::block_on(backend.create_note(1, &note())).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(backend.stored_notes(1).len(), 2);
    }

    #[test]
    fn test_update_unknown_note_is_not_found() {
        let backend = MemoryBackend::new();
        let result = pollster::block_on(backend.update_note(1, 42, &NotePatch::move_to(1.0, 2.0)));
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_delete_workspace_drops_notes() {
        let backend = MemoryBackend::new();
        let ws = pollster::block_on(backend.create_workspace("scratch")).unwrap();
        pollster::block_on(backend.create_note(ws.id, &note())).unwrap();

        pollster::block_on(backend.delete_workspace(ws.id)).unwrap();

        assert!(backend.stored_notes(ws.id).is_empty());
        assert!(backend.stored_workspaces().iter().all(|w| w.id != ws.id));
    }

    #[test]
    fn test_fail_writes_rejects_mutations() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true);
        let result = pollster::block_on(backend.create_workspace("nope"));
        assert!(matches!(result, Err(ApiError::Server { status: 500, .. })));
    }
}
