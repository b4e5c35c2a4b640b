//! # Editor Session
//!
//! One [`Editor`] owns one document: the committed snapshot, the pending
//! draft, the command bus and the listener lists.
//!
//! ```text
//!   update(f) ──► draft ──► commit ──► snapshot N+1
//!      │                       │
//!      └─ nested update(g) ────┘   (same draft, one commit)
//!                              │
//!                              ├─► mutation listeners (per node type)
//!                              └─► update listeners
//! ```
//!
//! The editor is single-threaded. Handlers and listeners receive `&Editor`
//! and may call back into it freely; no internal borrow is held while
//! foreign code runs, except the draft borrow a single transaction
//! operation takes.

use crate::commands::{Command, CommandPriority, CommandRegistry, Unregister};
use crate::mutations::{diff_dirty, ListenerOptions, MutationSet, NodeMutations};
use crate::transaction::{Draft, Transaction};
use crate::{EditorConfig, EditorError, EditorResult};
use folio_model::{
    KeyGenerator, NodeKey, NodeKind, NodeType, Selection, Snapshot, SnapshotBuilder,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

/// Markers attached to an update, read by listeners such as history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateTag {
    /// Produced by undo/redo itself
    Historic,
    /// Must not create an undo entry
    SkipHistory,
    /// Fold into the previous undo entry
    MergeHistory,
}

/// Everything an update listener learns about one commit
#[derive(Debug, Clone)]
pub struct UpdateInfo {
    pub snapshot: Snapshot,
    pub previous: Snapshot,
    pub tags: BTreeSet<UpdateTag>,
    pub dirty: BTreeSet<NodeKey>,
    pub mutations: MutationSet,
}

impl UpdateInfo {
    pub fn has_tag(&self, tag: UpdateTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Snapshots around a batch of mutation records
#[derive(Debug, Clone, Copy)]
pub struct MutationContext<'a> {
    pub previous: &'a Snapshot,
    pub snapshot: &'a Snapshot,
    pub tags: &'a BTreeSet<UpdateTag>,
}

type UpdateListener = Rc<dyn Fn(&Editor, &UpdateInfo)>;
type MutationListener = Rc<dyn Fn(&Editor, &NodeMutations, &MutationContext<'_>)>;

struct MutationRegistration {
    id: u64,
    node_type: NodeType,
    options: ListenerOptions,
    listener: MutationListener,
}

pub(crate) struct EditorInner {
    config: EditorConfig,
    current: RefCell<Snapshot>,
    pub(crate) draft: RefCell<Draft>,
    pub(crate) keys: RefCell<KeyGenerator>,
    depth: Cell<usize>,
    editable: Cell<bool>,
    commands: RefCell<CommandRegistry>,
    mutation_listeners: RefCell<Vec<MutationRegistration>>,
    update_listeners: RefCell<Vec<(u64, UpdateListener)>>,
    next_listener: Cell<u64>,
}

impl EditorInner {
    fn listener_id(&self) -> u64 {
        let id = self.next_listener.get() + 1;
        self.next_listener.set(id);
        id
    }
}

/// Handle to a document session. Clones share the same session.
#[derive(Clone)]
pub struct Editor {
    pub(crate) inner: Rc<EditorInner>,
}

/// Non-owning handle, for callbacks stored inside objects the editor owns
#[derive(Clone)]
pub struct WeakEditor {
    inner: Weak<EditorInner>,
}

impl WeakEditor {
    pub fn upgrade(&self) -> Option<Editor> {
        self.inner.upgrade().map(|inner| Editor { inner })
    }
}

impl fmt::Debug for WeakEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEditor")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

struct DepthGuard<'a>(&'a Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl Editor {
    /// New editor holding a single empty paragraph
    pub fn new(config: EditorConfig) -> Self {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let paragraph = builder.append(root, NodeKind::Paragraph);
        if let Ok(paragraph) = paragraph {
            builder.select(Selection::caret(paragraph, 0));
        }
        let (snapshot, keys) = builder.finish();
        Self::from_parts(config, snapshot, keys)
    }

    /// Editor adopting an existing snapshot. New keys continue after its largest key.
    pub fn with_snapshot(config: EditorConfig, snapshot: Snapshot) -> Self {
        let keys = KeyGenerator::after(snapshot.max_key());
        Self::from_parts(config, snapshot, keys)
    }

    fn from_parts(config: EditorConfig, snapshot: Snapshot, keys: KeyGenerator) -> Self {
        debug!(
            namespace = %config.namespace,
            nodes = snapshot.len(),
            "Creating editor"
        );
        let editable = config.editable;
        Self {
            inner: Rc::new(EditorInner {
                config,
                draft: RefCell::new(Draft::from_snapshot(&snapshot)),
                current: RefCell::new(snapshot),
                keys: RefCell::new(keys),
                depth: Cell::new(0),
                editable: Cell::new(editable),
                commands: RefCell::new(CommandRegistry::default()),
                mutation_listeners: RefCell::new(Vec::new()),
                update_listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakEditor {
        WeakEditor {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.inner.config
    }

    /// The last committed snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.inner.current.borrow().clone()
    }

    /// Run a read-only closure against the last committed snapshot
    pub fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> R {
        let snapshot = self.snapshot();
        f(&snapshot)
    }

    pub fn is_editable(&self) -> bool {
        self.inner.editable.get()
    }

    pub fn set_editable(&self, editable: bool) {
        if self.inner.editable.replace(editable) != editable {
            debug!(namespace = %self.inner.config.namespace, editable, "Editable changed");
        }
    }

    /// Whether an update is currently running
    pub fn is_updating(&self) -> bool {
        self.inner.depth.get() > 0
    }

    /// Run `f` against the pending draft. Nested calls join the outer update
    /// and everything commits once, when the outermost call returns.
    ///
    /// `f` cannot fail: whatever it returns, including an `Err` of its own,
    /// is handed back after its edits commit. Use
    /// [`try_update`](Self::try_update) when an error must discard the edits.
    pub fn update<R>(&self, f: impl FnOnce(&mut Transaction<'_>) -> R) -> EditorResult<R> {
        self.try_update(|tx| Ok(f(tx)))
    }

    /// [`update`](Self::update) with a tag attached to the resulting commit.
    /// Edits commit regardless of what `f` returns.
    pub fn update_tagged<R>(
        &self,
        tag: UpdateTag,
        f: impl FnOnce(&mut Transaction<'_>) -> R,
    ) -> EditorResult<R> {
        self.try_update(|tx| {
            tx.add_tag(tag);
            Ok(f(tx))
        })
    }

    /// Fallible update. An error discards every change `f` made; an outer
    /// update survives the failure of a nested one.
    pub fn try_update<R>(
        &self,
        f: impl FnOnce(&mut Transaction<'_>) -> EditorResult<R>,
    ) -> EditorResult<R> {
        if !self.inner.editable.get() {
            warn!(namespace = %self.inner.config.namespace, "Update rejected, editor is read-only");
            return Err(EditorError::ReadOnly);
        }

        let depth = self.inner.depth.get();
        let checkpoint = if depth == 0 {
            let fresh = Draft::from_snapshot(&self.inner.current.borrow());
            *self.inner.draft.borrow_mut() = fresh;
            None
        } else {
            Some(self.inner.draft.borrow().clone())
        };

        let result = {
            self.inner.depth.set(depth + 1);
            let _guard = DepthGuard(&self.inner.depth);
            let mut tx = Transaction::new(self);
            f(&mut tx)
        };

        match result {
            Ok(value) => {
                if depth == 0 {
                    self.commit();
                }
                Ok(value)
            }
            Err(err) => {
                debug!(depth, error = %err, "Update rolled back");
                let restored = match checkpoint {
                    Some(draft) => draft,
                    None => Draft::from_snapshot(&self.inner.current.borrow()),
                };
                *self.inner.draft.borrow_mut() = restored;
                Err(err)
            }
        }
    }

    fn commit(&self) {
        let draft = self.inner.draft.borrow().clone();
        if draft.is_clean() {
            trace!("Nothing to commit");
            return;
        }

        let previous = self.snapshot();
        let snapshot = Snapshot::from_parts(
            previous.generation() + 1,
            draft.root,
            draft.nodes,
            draft.selection,
        );
        let mutations = diff_dirty(&previous, &snapshot, &draft.dirty);

        *self.inner.current.borrow_mut() = snapshot.clone();
        *self.inner.draft.borrow_mut() = Draft::from_snapshot(&snapshot);

        debug!(
            namespace = %self.inner.config.namespace,
            generation = snapshot.generation(),
            dirty = draft.dirty.len(),
            mutations = mutations.len(),
            "Committed update"
        );

        let info = UpdateInfo {
            snapshot,
            previous,
            tags: draft.tags,
            dirty: draft.dirty,
            mutations,
        };
        self.notify_mutations(&info);
        self.notify_updates(&info);
    }

    fn notify_mutations(&self, info: &UpdateInfo) {
        if info.mutations.is_empty() {
            return;
        }
        let listeners: Vec<(NodeType, ListenerOptions, MutationListener)> = self
            .inner
            .mutation_listeners
            .borrow()
            .iter()
            .map(|r| (r.node_type, r.options, Rc::clone(&r.listener)))
            .collect();
        let context = MutationContext {
            previous: &info.previous,
            snapshot: &info.snapshot,
            tags: &info.tags,
        };
        for (node_type, options, listener) in listeners {
            let Some(records) = info.mutations.get(node_type) else {
                continue;
            };
            let records = options.filter(records);
            if !records.is_empty() {
                trace!(
                    node_type = node_type.as_str(),
                    records = records.len(),
                    "Notifying mutation listener"
                );
                listener(self, &records, &context);
            }
        }
    }

    fn notify_updates(&self, info: &UpdateInfo) {
        let listeners: Vec<UpdateListener> = self
            .inner
            .update_listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(self, info);
        }
    }

    /// Register a handler on the command bus
    pub fn register_command<P: 'static>(
        &self,
        command: &Command<P>,
        priority: CommandPriority,
        handler: impl Fn(&Editor, &P) -> bool + 'static,
    ) -> Unregister {
        let id = self
            .inner
            .commands
            .borrow_mut()
            .register(command, priority, Rc::new(handler));
        trace!(command = command.name(), ?priority, "Registered command handler");

        let weak: Weak<EditorInner> = Rc::downgrade(&self.inner);
        let command = *command;
        Unregister::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.commands.borrow_mut().unregister(&command, id);
            }
        })
    }

    /// Run handlers from highest to lowest priority until one reports the
    /// command handled.
    pub fn dispatch<P: 'static>(&self, command: &Command<P>, payload: P) -> bool {
        let handlers = self.inner.commands.borrow().handlers_for(command);
        trace!(command = command.name(), handlers = handlers.len(), "Dispatching command");
        for handler in handlers {
            if handler(self, &payload) {
                return true;
            }
        }
        false
    }

    pub fn command_handler_count<P: 'static>(&self, command: &Command<P>) -> usize {
        self.inner.commands.borrow().count(command)
    }

    /// Listen for created/destroyed (and optionally updated) records of one node type
    pub fn register_mutation_listener(
        &self,
        node_type: NodeType,
        options: ListenerOptions,
        listener: impl Fn(&Editor, &NodeMutations, &MutationContext<'_>) + 'static,
    ) -> Unregister {
        let id = self.inner.listener_id();
        self.inner
            .mutation_listeners
            .borrow_mut()
            .push(MutationRegistration {
                id,
                node_type,
                options,
                listener: Rc::new(listener),
            });

        let weak = Rc::downgrade(&self.inner);
        Unregister::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.mutation_listeners.borrow_mut().retain(|r| r.id != id);
            }
        })
    }

    /// Listen for every commit
    pub fn register_update_listener(
        &self,
        listener: impl Fn(&Editor, &UpdateInfo) + 'static,
    ) -> Unregister {
        let id = self.inner.listener_id();
        self.inner
            .update_listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));

        let weak = Rc::downgrade(&self.inner);
        Unregister::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.update_listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("namespace", &self.inner.config.namespace)
            .field("generation", &self.inner.current.borrow().generation())
            .field("editable", &self.inner.editable.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_editor_has_empty_paragraph() {
        let editor = Editor::default();
        let snapshot = editor.snapshot();

        let root = snapshot.root_node().unwrap();
        assert_eq!(root.children.len(), 1);
        let paragraph = snapshot.get(root.children[0]).unwrap();
        assert_eq!(paragraph.node_type(), NodeType::Paragraph);
        assert_eq!(
            snapshot.selection().copied(),
            Some(Selection::caret(paragraph.key, 0))
        );
    }

    #[test]
    fn test_empty_update_does_not_bump_generation() {
        let editor = Editor::default();
        let before = editor.snapshot().generation();
        editor.update(|_| ()).unwrap();
        assert_eq!(editor.snapshot().generation(), before);
    }

    #[test]
    fn test_read_only_rejects_updates() {
        let editor = Editor::new(EditorConfig {
            editable: false,
            ..EditorConfig::default()
        });
        let result = editor.update(|tx| tx.insert_text("x"));
        assert_eq!(result.unwrap_err(), EditorError::ReadOnly);

        editor.set_editable(true);
        assert!(editor.update(|tx| tx.insert_text("x")).is_ok());
    }

    #[test]
    fn test_update_commits_regardless_of_returned_value() {
        let editor = Editor::default();

        let returned = editor
            .update(|tx| {
                tx.insert_text("kept")?;
                Err::<(), _>(EditorError::Aborted("late".to_string()))
            })
            .unwrap();
        assert!(returned.is_err());
        assert_eq!(editor.read(|s| s.text_content(s.root())), "kept");

        let result = editor.try_update(|tx| {
            tx.insert_text(" dropped")?;
            Err::<(), _>(EditorError::Aborted("late".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(editor.read(|s| s.text_content(s.root())), "kept");
    }

    #[test]
    fn test_with_snapshot_continues_keys() {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let p = builder.append(root, NodeKind::Paragraph).unwrap();
        let snapshot = builder.build();

        let editor = Editor::with_snapshot(EditorConfig::default(), snapshot);
        let key = editor
            .update(|tx| tx.append(p, NodeKind::text("x")))
            .unwrap()
            .unwrap();
        assert!(key > p);
    }
}
