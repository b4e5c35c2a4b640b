//! # Command Bus
//!
//! Typed, prioritized dispatch with short-circuiting.
//!
//! Handlers for a command run from `Critical` down to `Low`; within one
//! priority they run in registration order. The first handler returning
//! `true` stops the dispatch. Plugins that never heard of each other can
//! share a command and rely on priority alone.

use crate::Editor;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandPriority {
    Low,
    Normal,
    High,
    Critical,
}

/// A typed command tag. The payload type is part of the identity.
pub struct Command<P> {
    name: &'static str,
    _payload: PhantomData<fn(&P)>,
}

impl<P> Command<P> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _payload: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<P> Clone for Command<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Command<P> {}

impl<P> fmt::Debug for Command<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({})", self.name)
    }
}

pub type CommandHandler<P> = Rc<dyn Fn(&Editor, &P) -> bool>;

type CommandId = (TypeId, &'static str);

struct Registration {
    id: u64,
    priority: CommandPriority,
    // Always a `CommandHandler<P>` for the `P` in the map key.
    handler: Box<dyn Any>,
}

#[derive(Default)]
pub(crate) struct CommandRegistry {
    handlers: HashMap<CommandId, Vec<Registration>>,
    next_id: u64,
}

impl CommandRegistry {
    pub(crate) fn register<P: 'static>(
        &mut self,
        command: &Command<P>,
        priority: CommandPriority,
        handler: CommandHandler<P>,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        let list = self
            .handlers
            .entry((TypeId::of::<P>(), command.name))
            .or_default();
        // Highest priority first, registration order within a priority.
        let index = list
            .iter()
            .position(|r| r.priority < priority)
            .unwrap_or(list.len());
        list.insert(
            index,
            Registration {
                id,
                priority,
                handler: Box::new(handler),
            },
        );
        id
    }

    pub(crate) fn unregister<P: 'static>(&mut self, command: &Command<P>, id: u64) {
        let key = (TypeId::of::<P>(), command.name);
        if let Some(list) = self.handlers.get_mut(&key) {
            list.retain(|r| r.id != id);
            if list.is_empty() {
                self.handlers.remove(&key);
            }
        }
    }

    /// Handlers in invocation order, cloned so none of them runs under a borrow
    pub(crate) fn handlers_for<P: 'static>(&self, command: &Command<P>) -> Vec<CommandHandler<P>> {
        self.handlers
            .get(&(TypeId::of::<P>(), command.name))
            .map(|list| {
                list.iter()
                    .filter_map(|r| r.handler.downcast_ref::<CommandHandler<P>>().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn count<P: 'static>(&self, command: &Command<P>) -> usize {
        self.handlers
            .get(&(TypeId::of::<P>(), command.name))
            .map_or(0, Vec::len)
    }
}

/// Removes a registration when called
pub struct Unregister(Option<Box<dyn FnOnce()>>);

impl Unregister {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    /// Combine several registrations into one handle
    pub fn merge(items: impl IntoIterator<Item = Unregister>) -> Self {
        let items: Vec<_> = items.into_iter().collect();
        Self::new(move || {
            for item in items {
                item.call();
            }
        })
    }

    pub fn call(mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl fmt::Debug for Unregister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unregister").field(&self.0.is_some()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditorConfig;
    use std::cell::RefCell;

    const PING: Command<u32> = Command::new("PING");

    fn recorder(
        editor: &Editor,
        log: &Rc<RefCell<Vec<&'static str>>>,
        priority: CommandPriority,
        tag: &'static str,
        handled: bool,
    ) -> Unregister {
        let log = Rc::clone(log);
        editor.register_command(&PING, priority, move |_, _| {
            log.borrow_mut().push(tag);
            handled
        })
    }

    #[test]
    fn test_critical_handled_suppresses_low() {
        let editor = Editor::new(EditorConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let _low = recorder(&editor, &log, CommandPriority::Low, "low", true);
        let _critical = recorder(&editor, &log, CommandPriority::Critical, "critical", true);

        assert!(editor.dispatch(&PING, 1));
        assert_eq!(*log.borrow(), vec!["critical"]);
    }

    #[test]
    fn test_priority_order_beats_registration_order() {
        let editor = Editor::new(EditorConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let _a = recorder(&editor, &log, CommandPriority::Low, "low", false);
        let _b = recorder(&editor, &log, CommandPriority::Normal, "normal-1", false);
        let _c = recorder(&editor, &log, CommandPriority::High, "high", false);
        let _d = recorder(&editor, &log, CommandPriority::Normal, "normal-2", false);

        assert!(!editor.dispatch(&PING, 1));
        assert_eq!(*log.borrow(), vec!["high", "normal-1", "normal-2", "low"]);
    }

    #[test]
    fn test_unregister_removes_handler() {
        let editor = Editor::new(EditorConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let unregister = recorder(&editor, &log, CommandPriority::High, "high", true);

        unregister.call();
        assert!(!editor.dispatch(&PING, 1));
        assert!(log.borrow().is_empty());
        assert_eq!(editor.command_handler_count(&PING), 0);
    }

    #[test]
    fn test_same_name_different_payload_is_distinct() {
        const PING_STR: Command<String> = Command::new("PING");
        let editor = Editor::new(EditorConfig::default());
        let _h = editor.register_command(&PING_STR, CommandPriority::Low, |_, _| true);

        assert!(!editor.dispatch(&PING, 1));
        assert!(editor.dispatch(&PING_STR, "x".to_string()));
    }
}
