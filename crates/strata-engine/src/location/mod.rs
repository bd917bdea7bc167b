//! Pure location values (`Path`, `Point`, `Range`) and their comparison, containment
//! and operation-transform rules.

pub mod path;
pub mod point;
pub mod range;


use std::fmt;

pub use path::Path;
pub use point::Point;
pub use range::{Range, RangeAffinity};

/// Which side of an exact-boundary ambiguity a location sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    #[default]
    Forward,
    Backward,
}

/// Start or end edge of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edge {
    #[default]
    Start,
    End,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Start => write!(f, "start"),
            Edge::End => write!(f, "end"),
        }
    }
}

/// Anything that can address part of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Path(Path),
    Point(Point),
    Range(Range),
}

impl Location {
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Location::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<&Point> {
        match self {
            Location::Point(point) => Some(point),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&Range> {
        match self {
            Location::Range(range) => Some(range),
            _ => None,
        }
    }
}

impl From<Path> for Location {
    fn from(path: Path) -> Self {
        Location::Path(path)
    }
}

impl From<Point> for Location {
    fn from(point: Point) -> Self {
        Location::Point(point)
    }
}

impl From<Range> for Location {
    fn from(range: Range) -> Self {
        Location::Range(range)
    }
}

impl From<&Path> for Location {
    fn from(path: &Path) -> Self {
        Location::Path(path.clone())
    }
}

impl From<&Point> for Location {
    fn from(point: &Point) -> Self {
        Location::Point(point.clone())
    }
}

impl From<&Range> for Location {
    fn from(range: &Range) -> Self {
        Location::Range(range.clone())
    }
}

impl From<&Location> for Location {
    fn from(location: &Location) -> Self {
        location.clone()
    }
}

impl<const N: usize> From<[usize; N]> for Location {
    fn from(indices: [usize; N]) -> Self {
        Location::Path(Path::from(indices))
    }
}

/// A `(from, to)` pair of paths bounding a node traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub from: Path,
    pub to: Path,
}

impl Span {
    pub fn new(from: Path, to: Path) -> Self {
        Span { from, to }
    }
}
