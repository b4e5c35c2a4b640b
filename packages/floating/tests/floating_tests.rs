//! Flip, shift, hide and live updates

use folio_floating::{
    auto_update, compute_position, FloatingConfig, LayoutSources, Placement, Position, Reference,
    Side,
};
use kurbo::{Point, Rect, Size, Vec2};
use std::cell::RefCell;
use std::rc::Rc;

const VIEWPORT: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

fn config(placement: &str) -> FloatingConfig {
    FloatingConfig {
        placement: placement.parse().unwrap(),
        offset: 4.0,
        padding: 8.0,
        ..FloatingConfig::default()
    }
}

#[test]
fn test_flips_when_clipped_below() {
    let reference = Reference::Element(Rect::new(100.0, 560.0, 200.0, 580.0));
    let position =
        compute_position(&reference, Size::new(120.0, 200.0), VIEWPORT, &config("bottom-start"))
            .unwrap();

    assert_eq!(position.placement.side, Side::Top);
    assert_eq!(position.origin, Point::new(100.0, 356.0));
    assert!(!position.hidden);
}

#[test]
fn test_keeps_side_when_flip_is_worse() {
    // Neither side fits; the bottom is the lesser evil
    let reference = Reference::Element(Rect::new(100.0, 100.0, 200.0, 120.0));
    let position =
        compute_position(&reference, Size::new(120.0, 560.0), VIEWPORT, &config("bottom-start"))
            .unwrap();
    assert_eq!(position.placement, "bottom-start".parse::<Placement>().unwrap());
}

#[test]
fn test_flip_disabled() {
    let reference = Reference::Element(Rect::new(100.0, 560.0, 200.0, 580.0));
    let mut options = config("bottom-start");
    options.flip = false;
    let position =
        compute_position(&reference, Size::new(120.0, 200.0), VIEWPORT, &options).unwrap();
    assert_eq!(position.placement.side, Side::Bottom);
}

#[test]
fn test_shifts_inside_padding() {
    let reference = Reference::Element(Rect::new(760.0, 100.0, 790.0, 120.0));
    let position =
        compute_position(&reference, Size::new(200.0, 100.0), VIEWPORT, &config("bottom-start"))
            .unwrap();

    assert_eq!(position.shift, Vec2::new(-168.0, 0.0));
    let rect = position.rect(Size::new(200.0, 100.0));
    assert_eq!(rect.x1, 792.0);
}

#[test]
fn test_hidden_when_reference_scrolled_away() {
    let reference = Reference::Element(Rect::new(100.0, -80.0, 200.0, -60.0));
    let position =
        compute_position(&reference, Size::new(100.0, 50.0), VIEWPORT, &config("bottom")).unwrap();
    assert!(position.hidden);

    let mut options = config("bottom");
    options.hide = false;
    let position =
        compute_position(&reference, Size::new(100.0, 50.0), VIEWPORT, &options).unwrap();
    assert!(!position.hidden);
}

#[test]
fn test_selection_reference() {
    let selection = Reference::Selection(vec![
        Rect::new(300.0, 100.0, 500.0, 120.0),
        Rect::new(40.0, 120.0, 120.0, 140.0),
    ]);
    assert_eq!(selection.rect(), Some(Rect::new(40.0, 100.0, 500.0, 140.0)));

    let position =
        compute_position(&selection, Size::new(100.0, 40.0), VIEWPORT, &config("bottom-start"))
            .unwrap();
    assert_eq!(position.origin, Point::new(40.0, 144.0));

    let empty = Reference::Selection(Vec::new());
    assert_eq!(
        compute_position(&empty, Size::new(1.0, 1.0), VIEWPORT, &config("top")),
        None
    );
}

#[test]
fn test_auto_update_follows_sources_until_dropped() {
    let sources = LayoutSources::new(
        Reference::Element(Rect::new(100.0, 100.0, 200.0, 120.0)),
        Size::new(100.0, 50.0),
        VIEWPORT,
    );
    let seen: Rc<RefCell<Vec<Option<Position>>>> = Rc::new(RefCell::new(Vec::new()));

    let handle = {
        let seen = Rc::clone(&seen);
        auto_update(&sources, config("bottom-start"), move |position| {
            seen.borrow_mut().push(position)
        })
    };
    assert_eq!(handle.updates(), 1);

    // Ancestor scroll moves the reference
    sources
        .reference
        .set(Reference::Element(Rect::new(100.0, 80.0, 200.0, 100.0)));
    // Content growth changes the panel size
    sources.floating.set(Size::new(100.0, 80.0));
    // Setting an equal value is not a change
    sources.floating.set(Size::new(100.0, 80.0));
    assert_eq!(handle.updates(), 3);
    assert_eq!(
        seen.borrow().last().copied().flatten().map(|p| p.origin),
        Some(Point::new(100.0, 104.0))
    );

    drop(handle);
    sources.boundary.set(Rect::new(0.0, 0.0, 400.0, 300.0));
    assert_eq!(seen.borrow().len(), 3);
}
