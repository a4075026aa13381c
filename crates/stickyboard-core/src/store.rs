//! Application state store.
//!
//! The store owns the whole [`AppState`], mutates it synchronously and
//! optimistically, notifies subscribers after every change, and pushes
//! the change to the backend in the background. Persistence failures are
//! logged and never rolled back; the local state is the source of truth
//! for the UI and the last write wins between collaborators.
//!
//! The store is a plain constructible value. The composition root
//! decides which [`BackendApi`] it talks to and which executor runs the
//! fire-and-forget persistence futures, via the injected [`Spawner`].

use crate::api::{ApiResult, BackendApi, BoxFuture};
use crate::model::{
    AppState, CanvasState, DEFAULT_NOTE_COLOR, DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH,
    DEFAULT_WORKSPACE_ID, Note, NoteId, NotePatch, User, Workspace, WorkspaceId,
};
use crate::zoom::clamp_zoom;
use kurbo::Vec2;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Margin from the viewport origin where new notes appear, in screen
/// pixels before the viewport transform.
pub const SPAWN_MARGIN: f64 = 40.0;

/// Runs a persistence future to completion on the platform executor.
pub type Spawner = Box<dyn Fn(BoxFuture<'static, ()>)>;

/// State change callback. Receives a snapshot taken after the mutation.
pub type Listener = Rc<dyn Fn(&AppState)>;

/// Handle returned by [`Store::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// The application state store.
pub struct Store {
    state: RefCell<AppState>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_subscription: Cell<u64>,
    api: Rc<dyn BackendApi>,
    spawner: Spawner,
}

impl Store {
    pub fn new(api: Rc<dyn BackendApi>, spawner: Spawner) -> Self {
        Self {
            state: RefCell::new(AppState::default()),
            listeners: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
            api,
            spawner,
        }
    }

    /// A detached snapshot of the current state. Mutating the returned
    /// value has no effect on the store.
    pub fn get_state(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Register a change listener. It fires after every mutation with a
    /// snapshot of the new state.
    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    fn emit(&self) {
        // Snapshot the state and the listener list before invoking
        // anything, so listeners can freely call back into the store,
        // including subscribe/unsubscribe on themselves.
        let snapshot = self.state.borrow().clone();
        let listeners: Vec<(SubscriptionId, Listener)> = self.listeners.borrow().clone();
        for (_, listener) in listeners {
            listener(&snapshot);
        }
    }

    fn spawn_logged(&self, what: &'static str, fut: BoxFuture<'static, ApiResult<()>>) {
        (self.spawner)(Box::pin(async move {
            if let Err(err) = fut.await {
                log::error!("Failed to persist {what}: {err}");
            }
        }));
    }

    // --- session ---

    /// Set the session user. Gaining a user kicks off workspace
    /// hydration in the background; losing one touches nothing remote.
    pub fn set_user(self: &Rc<Self>, user: Option<User>) {
        let logged_in = user.is_some();
        self.state.borrow_mut().user = user;
        self.emit();

        if logged_in {
            let store = Rc::clone(self);
            (self.spawner)(Box::pin(async move {
                if let Err(err) = store.load_workspaces().await {
                    log::error!("Failed to hydrate workspaces: {err}");
                }
            }));
        }
    }

    // --- workspaces ---

    /// Replace the workspace list from the backend. Notes are not
    /// hydrated here; call [`Store::load_notes`] for the workspace you
    /// are about to show.
    pub async fn load_workspaces(&self) -> ApiResult<()> {
        let records = self.api.list_workspaces().await?;
        {
            let mut state = self.state.borrow_mut();
            state.workspaces = records.into_iter().map(Workspace::from).collect();
            if state.workspaces.is_empty() {
                state.workspaces.push(Workspace::default_workspace());
            }
            state.current_workspace_id = state.workspaces[0].id;
        }
        log::debug!("Hydrated {} workspaces", self.state.borrow().workspaces.len());
        self.emit();
        Ok(())
    }

    /// Hydrate the notes of a workspace and recompute its z-counter
    /// from the highest stored z-index.
    pub async fn load_notes(&self, workspace: WorkspaceId) -> ApiResult<()> {
        let notes = self.api.list_notes(workspace).await?;
        {
            let mut state = self.state.borrow_mut();
            let Some(ws) = state.workspaces.iter_mut().find(|w| w.id == workspace) else {
                log::warn!("Loaded notes for unknown workspace {workspace}");
                return Ok(());
            };
            ws.canvas.z_counter = notes.iter().map(|n| n.z_index).max().unwrap_or(0);
            ws.notes = notes;
        }
        self.emit();
        Ok(())
    }

    /// Create a workspace on the backend, add it locally and switch to
    /// it. Creation needs the server-assigned id, so this one write is
    /// awaited rather than fire-and-forget.
    pub async fn create_workspace(&self, name: &str) -> ApiResult<WorkspaceId> {
        let record = self.api.create_workspace(name).await?;
        let id = record.id;
        {
            let mut state = self.state.borrow_mut();
            state.workspaces.push(Workspace::from(record));
            state.current_workspace_id = id;
        }
        self.emit();
        Ok(id)
    }

    /// Rename a workspace. The default workspace keeps its name.
    pub fn rename_workspace(&self, id: WorkspaceId, name: &str) {
        if id == DEFAULT_WORKSPACE_ID {
            log::warn!("Ignoring rename of the default workspace");
            return;
        }
        {
            let mut state = self.state.borrow_mut();
            let Some(ws) = state.workspaces.iter_mut().find(|w| w.id == id) else {
                return;
            };
            ws.name = name.to_string();
        }
        self.emit();

        let api = Rc::clone(&self.api);
        let name = name.to_string();
        self.spawn_logged(
            "workspace rename",
            Box::pin(async move { api.rename_workspace(id, &name).await }),
        );
    }

    /// Make a workspace current and hydrate its notes in the
    /// background. Unknown ids are ignored.
    pub fn switch_workspace(self: &Rc<Self>, id: WorkspaceId) {
        {
            let mut state = self.state.borrow_mut();
            if !state.workspaces.iter().any(|w| w.id == id) {
                log::warn!("Ignoring switch to unknown workspace {id}");
                return;
            }
            state.current_workspace_id = id;
        }
        self.emit();

        let store = Rc::clone(self);
        (self.spawner)(Box::pin(async move {
            if let Err(err) = store.load_notes(id).await {
                log::error!("Failed to hydrate notes for workspace {id}: {err}");
            }
        }));
    }

    /// Delete a workspace locally and on the backend. The default
    /// workspace cannot be deleted; deleting the last workspace
    /// re-creates the default one so there is always a board to show.
    pub fn delete_workspace(&self, id: WorkspaceId) {
        if id == DEFAULT_WORKSPACE_ID {
            log::warn!("Ignoring delete of the default workspace");
            return;
        }
        {
            let mut state = self.state.borrow_mut();
            let before = state.workspaces.len();
            state.workspaces.retain(|w| w.id != id);
            if state.workspaces.len() == before {
                return;
            }
            if state.workspaces.is_empty() {
                state.workspaces.push(Workspace::default_workspace());
            }
            if state.current_workspace_id == id {
                state.current_workspace_id = state.workspaces[0].id;
            }
        }
        self.emit();

        let api = Rc::clone(&self.api);
        self.spawn_logged(
            "workspace delete",
            Box::pin(async move { api.delete_workspace(id).await }),
        );
    }

    // --- notes ---

    /// Create a note with default geometry near the viewport origin of
    /// the current workspace. Awaited because the note's identity is the
    /// server-assigned id.
    pub async fn add_note(&self) -> ApiResult<NoteId> {
        let draft = {
            let state = self.state.borrow();
            let canvas = state
                .current_workspace()
                .map(|w| w.canvas.clone())
                .unwrap_or_default();
            Note {
                id: 0,
                x: (-canvas.offset.x + SPAWN_MARGIN) / canvas.zoom,
                y: (-canvas.offset.y + SPAWN_MARGIN) / canvas.zoom,
                width: DEFAULT_NOTE_WIDTH,
                height: DEFAULT_NOTE_HEIGHT,
                rotation: 0.0,
                z_index: 0,
                color: DEFAULT_NOTE_COLOR.to_string(),
                pinned: false,
                locked: false,
                archived: false,
                content: String::new(),
            }
        };
        self.insert_note(draft).await
    }

    /// Create a fully specified note (used by paste). The z-index is
    /// always taken from the workspace z-counter, so new notes land on
    /// top regardless of what the draft says.
    pub async fn insert_note(&self, mut draft: Note) -> ApiResult<NoteId> {
        let workspace = {
            let mut state = self.state.borrow_mut();
            let Some(ws) = state.current_workspace_mut() else {
                return Err(crate::api::ApiError::NotFound("current workspace".into()));
            };
            ws.canvas.z_counter += 1;
            draft.z_index = ws.canvas.z_counter;
            ws.id
        };

        let stored = self.api.create_note(workspace, &draft).await?;
        let id = stored.id;
        {
            let mut state = self.state.borrow_mut();
            if let Some(ws) = state.workspaces.iter_mut().find(|w| w.id == workspace) {
                ws.notes.push(stored);
            }
        }
        self.emit();
        Ok(id)
    }

    /// Like [`Store::insert_note`], but fire-and-forget: the note is
    /// created in the background and `on_created` runs with its id once
    /// the backend has answered. Used by the paste paths, which have no
    /// await point of their own.
    pub fn insert_note_detached(
        self: &Rc<Self>,
        draft: Note,
        on_created: Option<Rc<dyn Fn(NoteId)>>,
    ) {
        let store = Rc::clone(self);
        (self.spawner)(Box::pin(async move {
            match store.insert_note(draft).await {
                Ok(id) => {
                    if let Some(on_created) = on_created {
                        on_created(id);
                    }
                }
                Err(err) => log::error!("Failed to create note: {err}"),
            }
        }));
    }

    /// Apply a patch to a note in the current workspace, optimistically.
    pub fn update_note(&self, id: NoteId, patch: NotePatch) {
        let workspace = {
            let mut state = self.state.borrow_mut();
            let Some(ws) = state.current_workspace_mut() else {
                return;
            };
            let workspace = ws.id;
            let Some(note) = ws.note_mut(id) else {
                log::warn!("Ignoring update of unknown note {id}");
                return;
            };
            note.apply(&patch);
            workspace
        };
        self.emit();

        let api = Rc::clone(&self.api);
        self.spawn_logged(
            "note update",
            Box::pin(async move { api.update_note(workspace, id, &patch).await }),
        );
    }

    /// Raise a note above everything else by taking the next z-counter
    /// value. The counter only ever grows, and an unknown id leaves it
    /// untouched.
    pub fn bring_note_to_front(&self, id: NoteId) {
        let z = {
            let mut state = self.state.borrow_mut();
            let Some(ws) = state.current_workspace_mut() else {
                return;
            };
            if ws.note(id).is_none() {
                log::warn!("Ignoring bring-to-front of unknown note {id}");
                return;
            }
            ws.canvas.z_counter += 1;
            ws.canvas.z_counter
        };
        self.update_note(
            id,
            NotePatch {
                z_index: Some(z),
                ..NotePatch::default()
            },
        );
    }

    /// Drop a note below everything else: one less than the lowest
    /// z-index currently in the workspace.
    pub fn send_note_to_back(&self, id: NoteId) {
        let z = {
            let state = self.state.borrow();
            let Some(ws) = state.current_workspace() else {
                return;
            };
            ws.notes.iter().map(|n| n.z_index).min().unwrap_or(0) - 1
        };
        self.update_note(
            id,
            NotePatch {
                z_index: Some(z),
                ..NotePatch::default()
            },
        );
    }

    /// Pinning drops the note to the back (it becomes a backdrop);
    /// unpinning raises it back to the front. The flag and the z-index
    /// change land in one mutation, so subscribers never see a pinned
    /// note that has not moved yet.
    pub fn set_note_pinned(&self, id: NoteId, pinned: bool) {
        let z = {
            let mut state = self.state.borrow_mut();
            let Some(ws) = state.current_workspace_mut() else {
                return;
            };
            if ws.note(id).is_none() {
                log::warn!("Ignoring pin of unknown note {id}");
                return;
            }
            if pinned {
                ws.notes.iter().map(|n| n.z_index).min().unwrap_or(0) - 1
            } else {
                ws.canvas.z_counter += 1;
                ws.canvas.z_counter
            }
        };
        self.update_note(
            id,
            NotePatch {
                pinned: Some(pinned),
                z_index: Some(z),
                ..NotePatch::default()
            },
        );
    }

    pub fn set_note_locked(&self, id: NoteId, locked: bool) {
        self.update_note(
            id,
            NotePatch {
                locked: Some(locked),
                ..NotePatch::default()
            },
        );
    }

    /// Hide a note from the board without deleting it, or restore it.
    pub fn archive_note(&self, id: NoteId, archived: bool) {
        self.update_note(id, NotePatch::archived(archived));
    }

    /// Remove a note locally. The backend has no hard delete, so the
    /// stored note is archived instead.
    pub fn delete_note(&self, id: NoteId) {
        let workspace = {
            let mut state = self.state.borrow_mut();
            let Some(ws) = state.current_workspace_mut() else {
                return;
            };
            let workspace = ws.id;
            let before = ws.notes.len();
            ws.notes.retain(|n| n.id != id);
            if ws.notes.len() == before {
                return;
            }
            workspace
        };
        self.emit();

        let api = Rc::clone(&self.api);
        self.spawn_logged(
            "note delete",
            Box::pin(async move { api.update_note(workspace, id, &NotePatch::archived(true)).await }),
        );
    }

    // --- canvas view state (client-only, not persisted) ---

    pub fn set_offset(&self, offset: Vec2) {
        self.with_canvas(|canvas| canvas.offset = offset);
    }

    /// Set the zoom level, clamped to the allowed range.
    pub fn set_zoom(&self, zoom: f64) {
        self.with_canvas(|canvas| canvas.zoom = clamp_zoom(zoom));
    }

    pub fn set_snap_to_edges(&self, snap: bool) {
        self.with_canvas(|canvas| canvas.snap_to_edges = snap);
    }

    fn with_canvas(&self, f: impl FnOnce(&mut CanvasState)) {
        {
            let mut state = self.state.borrow_mut();
            let Some(ws) = state.current_workspace_mut() else {
                return;
            };
            f(&mut ws.canvas);
        }
        self.emit();
    }
}
