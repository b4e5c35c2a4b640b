//! # Inline Search State Machine
//!
//! ```text
//!              trigger at valid boundary
//!   Closed ───────────────────────────────► Open { key, trigger, spaces }
//!     ▲                                        │ typing extends the query
//!     │  escape / blur / caret leaves node     │ arrows move the highlight
//!     ├────────── collapse to literal text ────┤
//!     │  enter / tab with a highlighted item   │
//!     ├────────── remove node, apply item ─────┤
//!     │  backspace / delete over the node      │
//!     └────────── remove node ─────────────────┘
//! ```
//!
//! The machine intercepts the core key and text commands at high
//! priority and lets them fall through to the default handlers whenever
//! no search is open. Only one inline search node exists per editor.
//!
//! A space while open bumps a counter. The second consecutive space
//! closes the menu unless the query typed so far still has results, in
//! which case spaces keep extending the query like any other character.

use crate::actions::apply_item;
use crate::menu::{MenuCoordinator, MenuItem};
use crate::trigger::{caret_neighbours, is_valid_boundary};
use crate::TypeaheadConfig;
use folio_common::Subscription;
use folio_editor::{
    CommandPriority, Editor, EditorError, EditorResult, Transaction, Unregister, UpdateInfo,
    WeakEditor, BLUR, INSERT_TEXT, KEY_ARROW_DOWN, KEY_ARROW_UP, KEY_BACKSPACE, KEY_DELETE,
    KEY_ENTER, KEY_ESCAPE, KEY_TAB,
};
use folio_model::{InlineSearch, NodeKey, NodeKind, NodeType, Trigger};
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    #[default]
    Closed,
    Open {
        key: NodeKey,
        trigger: Trigger,
        /// Consecutive spaces typed into the query
        spaces: u8,
    },
}

impl SearchState {
    pub fn is_open(&self) -> bool {
        matches!(self, SearchState::Open { .. })
    }

    pub fn key(&self) -> Option<NodeKey> {
        match self {
            SearchState::Open { key, .. } => Some(*key),
            SearchState::Closed => None,
        }
    }
}

enum DeleteOutcome {
    Removed,
    Edited(String),
    Gone,
    Pass,
}

struct Machine {
    config: TypeaheadConfig,
    coordinator: MenuCoordinator,
    state: Cell<SearchState>,
}

fn search_of(tx: &Transaction<'_>, key: NodeKey) -> Option<InlineSearch> {
    tx.node(key).and_then(|n| n.as_inline_search().cloned())
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

impl Machine {
    fn on_insert_text(&self, editor: &Editor, text: &str) -> bool {
        match self.state.get() {
            SearchState::Open {
                key,
                trigger,
                spaces,
            } => self.extend(editor, key, trigger, spaces, text),
            SearchState::Closed => self.try_open(editor, text),
        }
    }

    fn try_open(&self, editor: &Editor, text: &str) -> bool {
        let Some(trigger) = single_char(text).and_then(Trigger::from_char) else {
            return false;
        };
        if !self.config.is_enabled(trigger) || !self.coordinator.has_menu(trigger) {
            return false;
        }

        let opened = editor.try_update(|tx| {
            let Some(caret) = tx.caret() else {
                return Ok(None);
            };
            let view = tx.view();
            if view.nodes_of_type(NodeType::InlineSearch).next().is_some() {
                return Ok(None);
            }
            let Some(node) = view.get(caret.key) else {
                return Ok(None);
            };
            let in_code = std::iter::once(node)
                .chain(view.ancestors(caret.key))
                .any(|n| n.node_type() == NodeType::Code);
            if in_code {
                return Ok(None);
            }
            let (before, after) = caret_neighbours(&view, caret);
            if !is_valid_boundary(trigger, before, after) {
                trace!(trigger = %trigger.as_char(), ?before, ?after, "Trigger not at a boundary");
                return Ok(None);
            }
            let key = tx.insert_inline(NodeKind::InlineSearch(InlineSearch::new(trigger)))?;
            tx.set_caret(key, 1);
            Ok(Some(key))
        });

        match opened {
            Ok(Some(key)) => {
                debug!(key = %key, trigger = %trigger.as_char(), "Opened inline search");
                self.state.set(SearchState::Open {
                    key,
                    trigger,
                    spaces: 0,
                });
                self.coordinator.open_menu(trigger);
                true
            }
            Ok(None) => false,
            Err(err) => {
                debug!(error = %err, "Could not open inline search");
                false
            }
        }
    }

    fn extend(
        &self,
        editor: &Editor,
        key: NodeKey,
        trigger: Trigger,
        spaces: u8,
        text: &str,
    ) -> bool {
        let spaces = if !text.is_empty() && text.chars().all(|c| c == ' ') {
            spaces.saturating_add(text.chars().count().min(u8::MAX as usize) as u8)
        } else {
            0
        };
        if spaces >= 2 {
            let query = editor
                .read(|s| s.get(key).and_then(|n| n.as_inline_search().map(|q| q.query.clone())))
                .unwrap_or_default();
            if self.coordinator.lookup(&query).is_empty() {
                debug!(key = %key, "Second space without results closes the search");
                self.collapse(editor);
                return false;
            }
        }

        let extended = editor.try_update(|tx| {
            let (Some(caret), Some(search)) = (tx.caret(), search_of(tx, key)) else {
                return Ok(None);
            };
            if caret.key != key || caret.offset == 0 {
                return Ok(None);
            }
            let mut chars: Vec<char> = search.query.chars().collect();
            let at = (caret.offset - 1).min(chars.len());
            chars.splice(at..at, text.chars());
            let query: String = chars.into_iter().collect();
            tx.set_kind(
                key,
                NodeKind::InlineSearch(InlineSearch {
                    trigger: search.trigger,
                    query: query.clone(),
                }),
            )?;
            tx.set_caret(key, at + 1 + text.chars().count());
            Ok(Some(query))
        });

        match extended {
            Ok(Some(query)) => {
                self.state.set(SearchState::Open {
                    key,
                    trigger,
                    spaces,
                });
                self.coordinator.set_search_term(query);
                true
            }
            Ok(None) => {
                self.collapse(editor);
                false
            }
            Err(err) => {
                debug!(error = %err, "Could not extend inline search");
                false
            }
        }
    }

    /// Turn the open node back into literal text and close the menu.
    /// Does nothing when no search is open.
    fn collapse(&self, editor: &Editor) {
        let state = self.state.replace(SearchState::Closed);
        self.coordinator.close_menu();
        let SearchState::Open { key, .. } = state else {
            return;
        };

        let result = editor.try_update(|tx| {
            let Some(search) = search_of(tx, key) else {
                return Ok(());
            };
            let text = tx.replace(key, NodeKind::text(search.text()))?;
            tx.merge_adjacent_text(text);
            Ok(())
        });
        match result {
            Ok(()) => debug!(key = %key, "Collapsed inline search to text"),
            Err(err) => debug!(key = %key, error = %err, "Could not collapse inline search"),
        }
    }

    fn select_item(&self, editor: &Editor, item: MenuItem) -> bool {
        let state = self.state.replace(SearchState::Closed);
        let SearchState::Open { key, .. } = state else {
            return false;
        };
        self.coordinator.close_menu();

        let item_key = item.key.clone();
        let result = editor.try_update(|tx| {
            if !tx.contains(key) {
                return Err(EditorError::Aborted(format!("inline search {} is gone", key)));
            }
            tx.set_caret(key, 0);
            tx.remove(key)?;
            apply_item(tx, item.action)
        });
        match result {
            Ok(()) => {
                debug!(key = %key, item = %item_key, "Applied menu item");
                true
            }
            Err(err) => {
                debug!(key = %key, item = %item_key, error = %err, "Menu item failed");
                self.state.set(state);
                self.collapse(editor);
                false
            }
        }
    }

    fn on_confirm(&self, editor: &Editor) -> bool {
        if !self.state.get().is_open() {
            return false;
        }
        self.coordinator.flush();
        match self.coordinator.highlighted_item() {
            Some(item) => self.select_item(editor, item),
            None => {
                self.collapse(editor);
                false
            }
        }
    }

    fn on_arrow(&self, delta: isize) -> bool {
        if !self.state.get().is_open() {
            return false;
        }
        self.coordinator.flush();
        self.coordinator.move_highlight(delta);
        true
    }

    fn on_delete(&self, editor: &Editor, backward: bool) -> bool {
        let SearchState::Open { key, trigger, .. } = self.state.get() else {
            return false;
        };

        let outcome = editor.try_update(|tx| {
            let Some(search) = search_of(tx, key) else {
                return Ok(DeleteOutcome::Gone);
            };
            let Some(selection) = tx.selection() else {
                return Ok(DeleteOutcome::Pass);
            };
            let len = search.query.chars().count() + 1;

            if !selection.is_collapsed() {
                let (a, f) = (selection.anchor.offset, selection.focus.offset);
                if selection.is_within(key) && a.min(f) == 0 && a.max(f) >= len {
                    tx.remove(key)?;
                    return Ok(DeleteOutcome::Removed);
                }
                return Ok(DeleteOutcome::Pass);
            }

            let caret = selection.focus;
            if caret.key != key {
                return Ok(DeleteOutcome::Pass);
            }
            let target = if backward {
                caret.offset.checked_sub(1)
            } else {
                Some(caret.offset)
            };
            match target {
                Some(0) if search.is_bare() => {
                    tx.remove(key)?;
                    Ok(DeleteOutcome::Removed)
                }
                Some(at) if at > 0 && at < len => {
                    let mut chars: Vec<char> = search.query.chars().collect();
                    chars.remove(at - 1);
                    let query: String = chars.into_iter().collect();
                    tx.set_kind(
                        key,
                        NodeKind::InlineSearch(InlineSearch {
                            trigger: search.trigger,
                            query: query.clone(),
                        }),
                    )?;
                    tx.set_caret(key, at);
                    Ok(DeleteOutcome::Edited(query))
                }
                _ => Ok(DeleteOutcome::Pass),
            }
        });

        match outcome {
            Ok(DeleteOutcome::Removed) => {
                debug!(key = %key, "Removed inline search");
                self.state.set(SearchState::Closed);
                self.coordinator.close_menu();
                true
            }
            Ok(DeleteOutcome::Edited(query)) => {
                self.state.set(SearchState::Open {
                    key,
                    trigger,
                    spaces: 0,
                });
                self.coordinator.set_search_term(query);
                true
            }
            Ok(DeleteOutcome::Gone) => {
                self.state.set(SearchState::Closed);
                self.coordinator.close_menu();
                false
            }
            Ok(DeleteOutcome::Pass) => {
                self.collapse(editor);
                false
            }
            Err(err) => {
                debug!(key = %key, error = %err, "Delete inside inline search failed");
                false
            }
        }
    }

    fn on_commit(&self, editor: &Editor, info: &UpdateInfo) {
        let SearchState::Open { key, .. } = self.state.get() else {
            return;
        };
        if !info.snapshot.contains(key) {
            trace!(key = %key, "Inline search node removed externally");
            self.state.set(SearchState::Closed);
            self.coordinator.close_menu();
            return;
        }
        let inside = info
            .snapshot
            .selection()
            .map_or(false, |selection| selection.is_within(key));
        if !inside {
            debug!(key = %key, "Selection left the inline search");
            self.collapse(editor);
        }
    }
}

/// Handle for a registered inline search machine. Dropping it removes
/// every handler and closes the menu.
pub struct Typeahead {
    machine: Rc<Machine>,
    editor: WeakEditor,
    registrations: Option<Unregister>,
    _open_subscription: Subscription,
}

impl Typeahead {
    pub fn coordinator(&self) -> &MenuCoordinator {
        &self.machine.coordinator
    }

    pub fn state(&self) -> SearchState {
        self.machine.state.get()
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Apply the result at `index`, as if it had been clicked
    pub fn select(&self, index: usize) -> EditorResult<bool> {
        let editor = self.editor()?;
        let Some(item) = self.machine.coordinator.results().get(index).cloned() else {
            return Ok(false);
        };
        Ok(self.machine.select_item(&editor, item))
    }

    /// Collapse any open search to literal text
    pub fn close(&self) -> EditorResult<()> {
        let editor = self.editor()?;
        self.machine.collapse(&editor);
        Ok(())
    }

    fn editor(&self) -> EditorResult<Editor> {
        self.editor
            .upgrade()
            .ok_or_else(|| EditorError::Aborted("editor dropped".to_string()))
    }
}

impl Drop for Typeahead {
    fn drop(&mut self) {
        if let Some(registrations) = self.registrations.take() {
            registrations.call();
        }
        self.machine.state.set(SearchState::Closed);
        self.machine.coordinator.close_menu();
    }
}

impl fmt::Debug for Typeahead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typeahead")
            .field("state", &self.state())
            .field("coordinator", &self.machine.coordinator)
            .finish()
    }
}

fn key_handler(
    machine: &Rc<Machine>,
    f: fn(&Machine, &Editor) -> bool,
) -> impl Fn(&Editor, &()) -> bool + 'static {
    let machine = Rc::clone(machine);
    move |editor, _| f(&machine, editor)
}

/// Attach the inline search machine to an editor
pub fn register_typeahead(
    editor: &Editor,
    coordinator: MenuCoordinator,
    config: TypeaheadConfig,
) -> Typeahead {
    let machine = Rc::new(Machine {
        config,
        coordinator,
        state: Cell::new(SearchState::Closed),
    });

    let on = |f: fn(&Machine, &Editor) -> bool| key_handler(&machine, f);

    let text_machine = Rc::clone(&machine);
    let commit_machine = Rc::clone(&machine);
    let registrations = Unregister::merge([
        editor.register_command(&INSERT_TEXT, CommandPriority::High, move |editor, text| {
            text_machine.on_insert_text(editor, text)
        }),
        editor.register_command(&KEY_ESCAPE, CommandPriority::Critical, on(|m, editor| {
            if !m.state.get().is_open() {
                return false;
            }
            m.collapse(editor);
            true
        })),
        editor.register_command(&KEY_ENTER, CommandPriority::Critical, on(Machine::on_confirm)),
        editor.register_command(&KEY_TAB, CommandPriority::Critical, on(Machine::on_confirm)),
        editor.register_command(&KEY_ARROW_UP, CommandPriority::Critical, on(|m, _| m.on_arrow(-1))),
        editor.register_command(&KEY_ARROW_DOWN, CommandPriority::Critical, on(|m, _| m.on_arrow(1))),
        editor.register_command(&KEY_BACKSPACE, CommandPriority::Critical, on(|m, editor| {
            m.on_delete(editor, true)
        })),
        editor.register_command(&KEY_DELETE, CommandPriority::Critical, on(|m, editor| {
            m.on_delete(editor, false)
        })),
        editor.register_command(&BLUR, CommandPriority::Critical, on(|m, editor| {
            m.collapse(editor);
            false
        })),
        editor.register_update_listener(move |editor, info| commit_machine.on_commit(editor, info)),
    ]);

    // A menu closed from the outside collapses the node it was bound to.
    let weak_machine: Weak<Machine> = Rc::downgrade(&machine);
    let weak_editor = editor.downgrade();
    let open_subscription = machine.coordinator.subscribe_open(move |open| {
        if *open {
            return;
        }
        let (Some(machine), Some(editor)) = (weak_machine.upgrade(), weak_editor.upgrade()) else {
            return;
        };
        if machine.state.get().is_open() {
            machine.collapse(&editor);
        }
    });

    Typeahead {
        machine,
        editor: editor.downgrade(),
        registrations: Some(registrations),
        _open_subscription: open_subscription,
    }
}
