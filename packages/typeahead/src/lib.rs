//! # Folio Typeahead
//!
//! Inline trigger search for the editor: `@` mentions, `/` block actions
//! and `:` emoji.
//!
//! ```text
//!   INSERT_TEXT("@") ──► machine ──► InlineSearch node in the document
//!                           │
//!                           ├─► coordinator.open_menu(trigger)
//!                           │      └─ debounced term ─► MenuSource::items
//!                           │
//!   KEY_ENTER ──────────────┴─► remove node + apply MenuAction
//! ```
//!
//! The machine, the coordinator and the menus are separate pieces so a
//! host can drive the coordinator from its own UI and swap menus freely.

mod actions;
mod config;
mod machine;
mod mentions;
mod menu;
mod menus;
mod trigger;

pub use config::{TypeaheadConfig, MAX_DEBOUNCE_MS, MIN_DEBOUNCE_MS};
pub use machine::{register_typeahead, SearchState, Typeahead};
pub use mentions::{
    refresh_mention_names, register_mention_commands, register_mention_tracking,
    ContactMentionPayload, DateMentionPayload, DocumentMentionPayload, MentionTracker,
    NameResolver, RefreshSummary, ResolveError, UserMentionPayload, INSERT_CONTACT_MENTION,
    INSERT_DATE_MENTION, INSERT_DOCUMENT_MENTION, INSERT_USER_MENTION, UPDATE_DOCUMENT_NAME,
    UPDATE_MENTION_ACCESS,
};
pub use menu::{MenuAction, MenuCoordinator, MenuItem, MenuSource, SlashAction};
pub use menus::{CandidateSource, EmojiMenu, MentionMenu, SlashMenu};
pub use trigger::{caret_neighbours, is_valid_boundary};
