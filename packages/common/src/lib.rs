pub mod observe;
pub mod timer;
pub mod visitor;

pub use observe::{Memo, Observable, Subscription};
pub use timer::Debouncer;
pub use visitor::*;
