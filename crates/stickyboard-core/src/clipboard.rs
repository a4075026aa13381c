//! Process-wide note clipboard.
//!
//! A single thread-local slot holds the last copied note. Copying
//! replaces the slot; pasting produces a fresh draft (id unset, flags
//! cleared) without consuming the slot, so one copy can be pasted many
//! times. Change listeners let toolbars enable their paste button.

use crate::model::Note;
use kurbo::Point;
use std::cell::RefCell;

/// Offset applied per axis when pasting without an explicit target.
pub const PASTE_OFFSET: f64 = 20.0;

type ChangeListener = Box<dyn Fn(bool)>;

thread_local! {
    static SLOT: RefCell<Option<Note>> = const { RefCell::new(None) };
    static LISTENERS: RefCell<Vec<(u64, ChangeListener)>> = const { RefCell::new(Vec::new()) };
    static NEXT_LISTENER: RefCell<u64> = const { RefCell::new(0) };
}

fn notify(has_note: bool) {
    LISTENERS.with(|listeners| {
        for (_, listener) in listeners.borrow().iter() {
            listener(has_note);
        }
    });
}

/// Put a copy of `note` on the clipboard.
pub fn copy_note(note: &Note) {
    SLOT.with(|slot| *slot.borrow_mut() = Some(note.clone()));
    notify(true);
}

/// Whether the clipboard holds a note.
pub fn has_note() -> bool {
    SLOT.with(|slot| slot.borrow().is_some())
}

/// Empty the clipboard.
pub fn clear() {
    let had = SLOT.with(|slot| slot.borrow_mut().take()).is_some();
    if had {
        notify(false);
    }
}

/// Build a paste draft from the clipboard, or `None` when empty.
///
/// Every field of the copied note is preserved except its identity and
/// position: the id and z-index are unset (the store assigns both on
/// insert). Without a `target` the draft lands offset by
/// [`PASTE_OFFSET`] from the copied position; with one, at that board
/// point.
pub fn paste_note(target: Option<Point>) -> Option<Note> {
    SLOT.with(|slot| {
        let slot = slot.borrow();
        let copied = slot.as_ref()?;
        let mut draft = copied.clone();
        draft.id = 0;
        draft.z_index = 0;
        match target {
            Some(point) => {
                draft.x = point.x;
                draft.y = point.y;
            }
            None => {
                draft.x += PASTE_OFFSET;
                draft.y += PASTE_OFFSET;
            }
        }
        Some(draft)
    })
}

/// Register a listener fired whenever clipboard availability changes.
pub fn on_clipboard_change(listener: ChangeListener) -> u64 {
    let id = NEXT_LISTENER.with(|next| {
        let mut next = next.borrow_mut();
        let id = *next;
        *next += 1;
        id
    });
    LISTENERS.with(|listeners| listeners.borrow_mut().push((id, listener)));
    id
}

/// Remove a listener registered with [`on_clipboard_change`].
pub fn remove_clipboard_listener(id: u64) {
    LISTENERS.with(|listeners| listeners.borrow_mut().retain(|(lid, _)| *lid != id));
}
