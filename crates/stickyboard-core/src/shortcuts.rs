//! Global keyboard shortcuts.
//!
//! `KeyWatcher` layers Ctrl/Cmd+C and Ctrl/Cmd+V on top of the store and
//! the clipboard. It shares the selection slot with the viewport
//! controller, so copy targets whatever the user last selected. Presses
//! inside editable elements are left alone; the browser/native text
//! clipboard owns those.

use crate::clipboard;
use crate::input::KeyPress;
use crate::model::NoteId;
use crate::store::Store;
use std::cell::Cell;
use std::rc::Rc;

/// Copy/paste key binding watcher.
pub struct KeyWatcher {
    store: Rc<Store>,
    selection: Rc<Cell<Option<NoteId>>>,
}

impl KeyWatcher {
    /// `selection` is usually
    /// [`ViewportController::selection_handle`](crate::viewport::ViewportController::selection_handle).
    pub fn new(store: Rc<Store>, selection: Rc<Cell<Option<NoteId>>>) -> Self {
        Self { store, selection }
    }

    /// Handle one key press. Returns true when the press was consumed,
    /// so the embedder can suppress the platform default.
    pub fn handle_key(&self, press: &KeyPress) -> bool {
        if press.editable_target || !press.modifiers.command() {
            return false;
        }
        match press.key.as_str() {
            "c" => self.copy_selected(),
            "v" => self.paste(),
            _ => false,
        }
    }

    fn copy_selected(&self) -> bool {
        let Some(id) = self.selection.get() else {
            return false;
        };
        let state = self.store.get_state();
        match state.current_workspace().and_then(|ws| ws.note(id)) {
            Some(note) => {
                clipboard::copy_note(note);
                true
            }
            None => false,
        }
    }

    fn paste(&self) -> bool {
        let Some(draft) = clipboard::paste_note(None) else {
            return false;
        };
        // Select the pasted note once the backend hands out its id.
        let selection = Rc::clone(&self.selection);
        self.store
            .insert_note_detached(draft, Some(Rc::new(move |id| selection.set(Some(id)))));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::input::Modifiers;
    use crate::model::NotePatch;
    use crate::store::Spawner;

    fn immediate_spawner() -> Spawner {
        Box::new(|fut| pollster::block_on(fut))
    }

    fn setup() -> (Rc<Store>, Rc<Cell<Option<NoteId>>>, KeyWatcher) {
        let backend = Rc::new(MemoryBackend::new());
        let store = Rc::new(Store::new(backend, immediate_spawner()));
        let selection = Rc::new(Cell::new(None));
        let watcher = KeyWatcher::new(Rc::clone(&store), Rc::clone(&selection));
        (store, selection, watcher)
    }

    fn ctrl() -> Modifiers {
        Modifiers {
            ctrl: true,
            ..Modifiers::default()
        }
    }

    fn meta() -> Modifiers {
        Modifiers {
            meta: true,
            ..Modifiers::default()
        }
    }

    #[test]
    fn test_copy_then_paste_duplicates_selected_note() {
        clipboard::clear();
        let (store, selection, watcher) = setup();
        let id = pollster::block_on(store.add_note()).unwrap();
        store.update_note(
            id,
            NotePatch {
                content: Some("todo".to_string()),
                ..NotePatch::default()
            },
        );
        selection.set(Some(id));

        assert!(watcher.handle_key(&KeyPress::new("c", ctrl())));
        assert!(watcher.handle_key(&KeyPress::new("v", meta())));

        let state = store.get_state();
        let ws = state.current_workspace().unwrap();
        assert_eq!(ws.notes.len(), 2);

        let original = ws.note(id).unwrap();
        let pasted = ws.notes.iter().find(|n| n.id != id).unwrap();
        assert_eq!(pasted.content, "todo");
        assert!((pasted.x - original.x - clipboard::PASTE_OFFSET).abs() < f64::EPSILON);
        assert!((pasted.y - original.y - clipboard::PASTE_OFFSET).abs() < f64::EPSILON);
        assert_eq!(selection.get(), Some(pasted.id));
    }

    #[test]
    fn test_editable_target_is_ignored() {
        clipboard::clear();
        let (store, selection, watcher) = setup();
        let id = pollster::block_on(store.add_note()).unwrap();
        selection.set(Some(id));

        let mut press = KeyPress::new("c", ctrl());
        press.editable_target = true;

        assert!(!watcher.handle_key(&press));
        assert!(!clipboard::has_note());
    }

    #[test]
    fn test_copy_without_selection_is_not_consumed() {
        clipboard::clear();
        let (_, _, watcher) = setup();
        assert!(!watcher.handle_key(&KeyPress::new("c", ctrl())));
    }

    #[test]
    fn test_paste_with_empty_clipboard_is_not_consumed() {
        clipboard::clear();
        let (_, _, watcher) = setup();
        assert!(!watcher.handle_key(&KeyPress::new("v", ctrl())));
    }

    #[test]
    fn test_plain_keys_pass_through() {
        clipboard::clear();
        let (store, selection, watcher) = setup();
        let id = pollster::block_on(store.add_note()).unwrap();
        selection.set(Some(id));

        assert!(!watcher.handle_key(&KeyPress::new("c", Modifiers::default())));
        assert!(!watcher.handle_key(&KeyPress::new("x", ctrl())));
    }
}
