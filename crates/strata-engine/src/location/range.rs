use serde::{Deserialize, Serialize};

use crate::location::{Affinity, Location, Path, Point};
use crate::operation::Operation;

/// An ordered anchor/focus pair. Backward when the anchor sorts after the focus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

/// How a range resolves each endpoint on an ambiguous split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeAffinity {
    Forward,
    Backward,
    /// Collapse toward the interior of the range.
    Inward,
    /// Expand away from the interior of the range.
    Outward,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Range { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Range {
            anchor: point.clone(),
            focus: point,
        }
    }

    /// `(start, end)` in document order.
    pub fn edges(&self) -> (Point, Point) {
        if self.is_backward() {
            (self.focus.clone(), self.anchor.clone())
        } else {
            (self.anchor.clone(), self.focus.clone())
        }
    }

    pub fn start(&self) -> Point {
        self.edges().0
    }

    pub fn end(&self) -> Point {
        self.edges().1
    }

    pub fn is_backward(&self) -> bool {
        self.anchor.is_after(&self.focus)
    }

    pub fn is_forward(&self) -> bool {
        !self.is_backward()
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    /// The anchor and focus, in that order.
    pub fn points(&self) -> [&Point; 2] {
        [&self.anchor, &self.focus]
    }

    pub fn includes_path(&self, path: &Path) -> bool {
        let (start, end) = self.edges();
        path.compare(&start.path).is_ge() && path.compare(&end.path).is_le()
    }

    pub fn includes_point(&self, point: &Point) -> bool {
        let (start, end) = self.edges();
        point.compare(&start).is_ge() && point.compare(&end).is_le()
    }

    /// Whether either endpoint of `other` lies inside this range, or this range
    /// strictly surrounds it.
    pub fn includes_range(&self, other: &Range) -> bool {
        if self.includes_point(&other.anchor) || self.includes_point(&other.focus) {
            return true;
        }
        let (rs, re) = self.edges();
        let (ts, te) = other.edges();
        rs.is_before(&ts) && re.is_after(&te)
    }

    pub fn includes(&self, target: &Location) -> bool {
        match target {
            Location::Path(path) => self.includes_path(path),
            Location::Point(point) => self.includes_point(point),
            Location::Range(range) => self.includes_range(range),
        }
    }

    /// Whether this range contains `other` entirely.
    pub fn surrounds(&self, other: &Range) -> bool {
        let intersection = self.intersection(other);
        intersection.is_some_and(|i| i.start() == other.start() && i.end() == other.end())
    }

    /// The overlap of two ranges, if any.
    pub fn intersection(&self, another: &Range) -> Option<Range> {
        let (s1, e1) = self.edges();
        let (s2, e2) = another.edges();
        let start = if s1.is_before(&s2) { s2 } else { s1 };
        let end = if e1.is_before(&e2) { e1 } else { e2 };
        if end.is_before(&start) {
            None
        } else {
            Some(Range::new(start, end))
        }
    }

    /// Transform both endpoints through `op`, deriving per-endpoint affinity from `stick`.
    pub fn transform(&self, op: &Operation, stick: Option<RangeAffinity>) -> Option<Range> {
        let (anchor_affinity, focus_affinity) = match stick {
            Some(RangeAffinity::Inward) => {
                let collapsed = self.is_collapsed();
                if self.is_forward() {
                    let anchor = Some(Affinity::Forward);
                    (anchor, if collapsed { anchor } else { Some(Affinity::Backward) })
                } else {
                    let anchor = Some(Affinity::Backward);
                    (anchor, if collapsed { anchor } else { Some(Affinity::Forward) })
                }
            }
            Some(RangeAffinity::Outward) => {
                if self.is_forward() {
                    (Some(Affinity::Backward), Some(Affinity::Forward))
                } else {
                    (Some(Affinity::Forward), Some(Affinity::Backward))
                }
            }
            Some(RangeAffinity::Forward) => (Some(Affinity::Forward), Some(Affinity::Forward)),
            Some(RangeAffinity::Backward) => (Some(Affinity::Backward), Some(Affinity::Backward)),
            None => (None, None),
        };

        let anchor = self.anchor.transform(op, anchor_affinity)?;
        let focus = self.focus.transform(op, focus_affinity)?;
        Some(Range { anchor, focus })
    }
}
