//! # Menu Coordinator
//!
//! The contract between the inline search state machine and whatever menu
//! is bound to the active trigger:
//!
//! ```text
//!   machine ── open_menu(trigger) ──► coordinator ◄── set_is_open(false) ── UI
//!           ── set_search_term ──►       │
//!                                        ├─ debounce + lower-case
//!                                        └─ results() from the bound MenuSource
//! ```
//!
//! Every menu (mentions, slash actions, emoji) is a [`MenuSource`]; only the
//! items differ. State transitions are synchronous. Only the term used for
//! filtering lags behind the typed term by the debounce delay.

use crate::TypeaheadConfig;
use folio_common::{Debouncer, Memo, Observable, Subscription};
use folio_model::{Mention, Trigger};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;
use tracing::trace;

/// Block-level transformations offered by the slash menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashAction {
    Heading(u8),
    BulletList,
    NumberedList,
    Quote,
    Code,
    Divider,
    Table { rows: usize, columns: usize },
    Date,
}

/// What selecting a menu item does
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    Mention(Mention),
    Emoji(String),
    Slash(SlashAction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub action: MenuAction,
}

impl MenuItem {
    pub fn new(key: impl Into<String>, label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            action,
        }
    }
}

/// Candidate list behind one trigger
pub trait MenuSource {
    fn trigger(&self) -> Trigger;

    /// Items matching an already lower-cased term, best first
    fn items(&self, term: &str) -> Vec<MenuItem>;
}

type Sources = Rc<RefCell<BTreeMap<Trigger, Rc<dyn MenuSource>>>>;

struct CoordinatorInner {
    is_open: Observable<bool>,
    search_term: Observable<String>,
    filter_term: Observable<String>,
    active: Cell<Option<Trigger>>,
    highlighted: Cell<usize>,
    debouncer: RefCell<Debouncer<String>>,
    sources: Sources,
    results: Memo<(Option<Trigger>, String), Vec<MenuItem>>,
}

/// Shared open/close/search-term state for the active menu
#[derive(Clone)]
pub struct MenuCoordinator {
    inner: Rc<CoordinatorInner>,
}

impl MenuCoordinator {
    pub fn new(config: &TypeaheadConfig) -> Self {
        let sources: Sources = Rc::new(RefCell::new(BTreeMap::new()));
        let lookup = Rc::clone(&sources);
        let max_results = config.max_results;
        let results = Memo::new(move |(trigger, term): &(Option<Trigger>, String)| {
            let source = trigger.and_then(|t| lookup.borrow().get(&t).cloned());
            let mut items = source.map(|s| s.items(term)).unwrap_or_default();
            items.truncate(max_results);
            items
        });

        Self {
            inner: Rc::new(CoordinatorInner {
                is_open: Observable::new(false),
                search_term: Observable::new(String::new()),
                filter_term: Observable::new(String::new()),
                active: Cell::new(None),
                highlighted: Cell::new(0),
                debouncer: RefCell::new(Debouncer::new(config.debounce())),
                sources,
                results,
            }),
        }
    }

    /// Bind a menu to its trigger, replacing any previous one
    pub fn register_menu(&self, source: Rc<dyn MenuSource>) {
        self.inner
            .sources
            .borrow_mut()
            .insert(source.trigger(), source);
        self.inner.results.invalidate();
    }

    pub fn has_menu(&self, trigger: Trigger) -> bool {
        self.inner.sources.borrow().contains_key(&trigger)
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open.get()
    }

    pub fn set_is_open(&self, open: bool) {
        self.inner.is_open.set(open);
    }

    pub fn active_menu(&self) -> Option<Trigger> {
        self.inner.active.get()
    }

    /// The term as typed, updated synchronously
    pub fn search_term(&self) -> String {
        self.inner.search_term.get()
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.set_search_term_at(term, Instant::now());
    }

    pub fn set_search_term_at(&self, term: impl Into<String>, now: Instant) {
        let term = term.into();
        if self.inner.search_term.set(term.clone()) {
            self.inner.debouncer.borrow_mut().push(term, now);
        }
    }

    /// The debounced, lower-cased term used for filtering
    pub fn filter_term(&self) -> String {
        self.inner.filter_term.get()
    }

    pub fn open_menu(&self, trigger: Trigger) {
        trace!(trigger = %trigger.as_char(), "Opening menu");
        self.inner.active.set(Some(trigger));
        self.inner.debouncer.borrow_mut().cancel();
        self.inner.search_term.set(String::new());
        self.inner.filter_term.set(String::new());
        self.inner.highlighted.set(0);
        self.inner.is_open.set(true);
    }

    /// Close the menu. Closing a closed menu does nothing.
    pub fn close_menu(&self) {
        if self.inner.active.take().is_some() {
            trace!("Closing menu");
        }
        self.inner.debouncer.borrow_mut().cancel();
        self.inner.search_term.set(String::new());
        self.inner.filter_term.set(String::new());
        self.inner.highlighted.set(0);
        self.inner.is_open.set(false);
    }

    /// Apply the debounced term if its delay has passed
    pub fn poll(&self, now: Instant) -> bool {
        let due = self.inner.debouncer.borrow_mut().poll(now);
        due.map_or(false, |term| self.apply_filter(term))
    }

    /// Apply the pending term immediately
    pub fn flush(&self) -> bool {
        let pending = self.inner.debouncer.borrow_mut().flush();
        pending.map_or(false, |term| self.apply_filter(term))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.debouncer.borrow().deadline()
    }

    fn apply_filter(&self, term: String) -> bool {
        let changed = self.inner.filter_term.set(term.to_lowercase());
        if changed {
            self.inner.highlighted.set(0);
        }
        changed
    }

    /// Results for the active menu and the current filter term
    pub fn results(&self) -> Rc<Vec<MenuItem>> {
        if !self.is_open() {
            return Rc::new(Vec::new());
        }
        self.inner
            .results
            .get(&(self.active_menu(), self.filter_term()))
    }

    /// Items the active menu offers for `term`, bypassing debounce and cache
    pub fn lookup(&self, term: &str) -> Vec<MenuItem> {
        let source = self
            .active_menu()
            .and_then(|t| self.inner.sources.borrow().get(&t).cloned());
        source.map_or_else(Vec::new, |s| s.items(&term.to_lowercase()))
    }

    /// Drop cached results, e.g. after the candidate list changed
    pub fn refresh(&self) {
        self.inner.results.invalidate();
    }

    pub fn highlighted(&self) -> usize {
        self.inner.highlighted.get()
    }

    pub fn highlighted_item(&self) -> Option<MenuItem> {
        self.results().get(self.highlighted()).cloned()
    }

    /// Move the highlight, wrapping at both ends
    pub fn move_highlight(&self, delta: isize) -> bool {
        let count = self.results().len();
        if count == 0 {
            return false;
        }
        let current = self.inner.highlighted.get().min(count - 1) as isize;
        let next = (current + delta).rem_euclid(count as isize) as usize;
        self.inner.highlighted.set(next);
        true
    }

    pub fn subscribe_open(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.inner.is_open.subscribe(callback)
    }

    pub fn subscribe_filter_term(&self, callback: impl Fn(&String) + 'static) -> Subscription {
        self.inner.filter_term.subscribe(callback)
    }
}

impl fmt::Debug for MenuCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuCoordinator")
            .field("is_open", &self.is_open())
            .field("active", &self.active_menu())
            .field("search_term", &self.search_term())
            .finish()
    }
}
