//! Recomputing positions when layout inputs change

use crate::{compute_position, FloatingConfig, Position, Reference};
use folio_common::{Observable, Subscription};
use kurbo::{Rect, Size};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

/// Layout inputs a floating panel depends on.
///
/// Hosts push new values as things move: the reference rect on ancestor
/// scroll, the boundary on resize, the panel size when its content changes.
#[derive(Debug, Clone)]
pub struct LayoutSources {
    pub reference: Observable<Reference>,
    pub floating: Observable<Size>,
    pub boundary: Observable<Rect>,
}

impl LayoutSources {
    pub fn new(reference: Reference, floating: Size, boundary: Rect) -> Self {
        Self {
            reference: Observable::new(reference),
            floating: Observable::new(floating),
            boundary: Observable::new(boundary),
        }
    }

    pub fn compute(&self, config: &FloatingConfig) -> Option<Position> {
        self.reference.with(|reference| {
            compute_position(reference, self.floating.get(), self.boundary.get(), config)
        })
    }
}

/// Live positioning for one mounted panel. Dropping it (or calling
/// [`AutoUpdate::stop`]) unsubscribes from every source.
#[derive(Debug)]
pub struct AutoUpdate {
    subscriptions: Vec<Subscription>,
    updates: Rc<Cell<usize>>,
}

impl AutoUpdate {
    /// Number of positions delivered so far, the initial one included
    pub fn updates(&self) -> usize {
        self.updates.get()
    }

    pub fn stop(self) {
        debug!(updates = self.updates.get(), "Stopping floating auto-update");
    }
}

/// Position the panel now and again whenever a source changes
pub fn auto_update(
    sources: &LayoutSources,
    config: FloatingConfig,
    on_position: impl Fn(Option<Position>) + 'static,
) -> AutoUpdate {
    let updates = Rc::new(Cell::new(0));

    // The closure holds clones of the sources; tearing the subscriptions
    // down releases them again.
    let update: Rc<dyn Fn()> = {
        let sources = sources.clone();
        let updates = Rc::clone(&updates);
        Rc::new(move || {
            updates.set(updates.get() + 1);
            on_position(sources.compute(&config));
        })
    };

    update();

    let subscriptions = vec![
        {
            let update = Rc::clone(&update);
            sources.reference.subscribe(move |_| update())
        },
        {
            let update = Rc::clone(&update);
            sources.floating.subscribe(move |_| update())
        },
        sources.boundary.subscribe(move |_| update()),
    ];

    AutoUpdate {
        subscriptions,
        updates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_releases_sources() {
        let sources = LayoutSources::new(
            Reference::Element(Rect::new(0.0, 0.0, 10.0, 10.0)),
            Size::new(5.0, 5.0),
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        let handle = auto_update(&sources, FloatingConfig::default(), |_| {});
        assert_eq!(sources.boundary.subscriber_count(), 1);
        assert_eq!(handle.subscriptions.len(), 3);

        handle.stop();
        assert_eq!(sources.reference.subscriber_count(), 0);
        assert_eq!(sources.floating.subscriber_count(), 0);
        assert_eq!(sources.boundary.subscriber_count(), 0);
    }
}
