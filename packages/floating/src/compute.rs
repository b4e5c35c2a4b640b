//! Placement arithmetic
//!
//! All rectangles share one coordinate space, typically the viewport.
//! The pipeline is place, then flip on the main axis, then shift on the
//! cross axis, then the visibility check.

use crate::{Alignment, FloatingConfig, Placement, Side};
use kurbo::{Point, Rect, Size, Vec2};
use tracing::trace;

/// What a floating panel is anchored to
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Element(Rect),
    /// Client rects of a text selection, one per line fragment
    Selection(Vec<Rect>),
}

impl Reference {
    /// Bounding rect of the reference, `None` for an empty selection
    pub fn rect(&self) -> Option<Rect> {
        match self {
            Reference::Element(rect) => Some(*rect),
            Reference::Selection(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
        }
    }
}

/// Result of one positioning pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Top-left corner of the panel
    pub origin: Point,
    /// Placement actually used, after flipping
    pub placement: Placement,
    /// Cross-axis correction applied by shifting
    pub shift: Vec2,
    /// The reference is entirely outside the boundary
    pub hidden: bool,
}

impl Position {
    pub fn rect(&self, size: Size) -> Rect {
        Rect::from_origin_size(self.origin, size)
    }
}

fn place(anchor: Rect, size: Size, placement: Placement, offset: f64) -> Point {
    let x = match placement.alignment {
        Alignment::Start => anchor.x0,
        Alignment::Center => anchor.center().x - size.width / 2.0,
        Alignment::End => anchor.x1 - size.width,
    };
    let y = match placement.alignment {
        Alignment::Start => anchor.y0,
        Alignment::Center => anchor.center().y - size.height / 2.0,
        Alignment::End => anchor.y1 - size.height,
    };
    match placement.side {
        Side::Top => Point::new(x, anchor.y0 - offset - size.height),
        Side::Bottom => Point::new(x, anchor.y1 + offset),
        Side::Left => Point::new(anchor.x0 - offset - size.width, y),
        Side::Right => Point::new(anchor.x1 + offset, y),
    }
}

/// How far `rect` pokes past `bounds` on the given side. Negative means
/// there is room left.
fn overflow(rect: Rect, bounds: Rect, side: Side) -> f64 {
    match side {
        Side::Top => bounds.y0 - rect.y0,
        Side::Bottom => rect.y1 - bounds.y1,
        Side::Left => bounds.x0 - rect.x0,
        Side::Right => rect.x1 - bounds.x1,
    }
}

/// Offset that moves the span `lo..hi` inside `min..max`. Spans wider
/// than the range are aligned to its start.
fn clamp_delta(lo: f64, hi: f64, min: f64, max: f64) -> f64 {
    if hi - lo > max - min || lo < min {
        min - lo
    } else if hi > max {
        max - hi
    } else {
        0.0
    }
}

fn is_outside(anchor: Rect, boundary: Rect) -> bool {
    anchor.x1 < boundary.x0
        || anchor.x0 > boundary.x1
        || anchor.y1 < boundary.y0
        || anchor.y0 > boundary.y1
}

/// Compute where a panel of `size` goes relative to `reference`, kept
/// inside `boundary`. Returns `None` when the reference has no geometry.
pub fn compute_position(
    reference: &Reference,
    size: Size,
    boundary: Rect,
    config: &FloatingConfig,
) -> Option<Position> {
    let anchor = reference.rect()?;

    let padded = boundary.inset(-config.padding);
    let bounds = if padded.width() >= 0.0 && padded.height() >= 0.0 {
        padded
    } else {
        boundary
    };

    let mut placement = config.placement;
    let mut origin = place(anchor, size, placement, config.offset);

    if config.flip {
        let clipped = overflow(Rect::from_origin_size(origin, size), bounds, placement.side);
        if clipped > 0.0 {
            let flipped = placement.flipped();
            let alternative = place(anchor, size, flipped, config.offset);
            let alternative_clipped =
                overflow(Rect::from_origin_size(alternative, size), bounds, flipped.side);
            if alternative_clipped < clipped {
                trace!(from = %placement, to = %flipped, "Flipping floating panel");
                placement = flipped;
                origin = alternative;
            }
        }
    }

    let mut shift = Vec2::ZERO;
    if config.shift {
        let rect = Rect::from_origin_size(origin, size);
        shift = if placement.side.is_vertical() {
            Vec2::new(clamp_delta(rect.x0, rect.x1, bounds.x0, bounds.x1), 0.0)
        } else {
            Vec2::new(0.0, clamp_delta(rect.y0, rect.y1, bounds.y0, bounds.y1))
        };
        origin += shift;
    }

    Some(Position {
        origin,
        placement,
        shift,
        hidden: config.hide && is_outside(anchor, boundary),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_padding() -> FloatingConfig {
        FloatingConfig {
            padding: 0.0,
            offset: 0.0,
            ..FloatingConfig::default()
        }
    }

    #[test]
    fn test_alignments() {
        let anchor = Reference::Element(Rect::new(100.0, 100.0, 200.0, 120.0));
        let size = Size::new(50.0, 30.0);
        let bounds = Rect::new(0.0, 0.0, 1000.0, 1000.0);

        let mut config = no_padding();
        config.placement = "bottom".parse().unwrap();
        let centered = compute_position(&anchor, size, bounds, &config).unwrap();
        assert_eq!(centered.origin, Point::new(125.0, 120.0));

        config.placement = "top-end".parse().unwrap();
        let end = compute_position(&anchor, size, bounds, &config).unwrap();
        assert_eq!(end.origin, Point::new(150.0, 70.0));

        config.placement = "right-start".parse().unwrap();
        let right = compute_position(&anchor, size, bounds, &config).unwrap();
        assert_eq!(right.origin, Point::new(200.0, 100.0));
    }

    #[test]
    fn test_clamp_delta() {
        assert_eq!(clamp_delta(-5.0, 10.0, 0.0, 100.0), 5.0);
        assert_eq!(clamp_delta(95.0, 110.0, 0.0, 100.0), -10.0);
        assert_eq!(clamp_delta(10.0, 20.0, 0.0, 100.0), 0.0);
        assert_eq!(clamp_delta(10.0, 300.0, 0.0, 100.0), -10.0);
    }
}
