//! Live location handles. Each ref is registered on the editor and moved through every
//! applied operation; a ref whose location disappears is dropped from the registry.

use std::collections::BTreeMap;

use crate::editing::Editor;
use crate::location::{Affinity, Path, Point, Range, RangeAffinity};
use crate::operation::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefId(u64);

/// Handle on a path that follows later operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathRef {
    id: RefId,
}

/// Handle on a point that follows later operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointRef {
    id: RefId,
}

/// Handle on a range that follows later operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeRef {
    id: RefId,
}

#[derive(Debug, Clone)]
struct Tracked<T, A> {
    current: T,
    affinity: Option<A>,
}

#[derive(Debug, Default)]
pub(crate) struct RefRegistry {
    next_id: u64,
    paths: BTreeMap<RefId, Tracked<Path, Affinity>>,
    points: BTreeMap<RefId, Tracked<Point, Affinity>>,
    ranges: BTreeMap<RefId, Tracked<Range, RangeAffinity>>,
}

impl RefRegistry {
    fn allocate(&mut self) -> RefId {
        self.next_id += 1;
        RefId(self.next_id)
    }

    /// Move every live ref through `op`, unregistering those whose location is gone.
    pub(crate) fn transform(&mut self, op: &Operation) {
        self.paths.retain(|_, tracked| {
            match tracked.current.transform(op, tracked.affinity) {
                Some(path) => {
                    tracked.current = path;
                    true
                }
                None => false,
            }
        });
        self.points.retain(|_, tracked| {
            match tracked.current.transform(op, tracked.affinity) {
                Some(point) => {
                    tracked.current = point;
                    true
                }
                None => false,
            }
        });
        self.ranges.retain(|_, tracked| {
            match tracked.current.transform(op, tracked.affinity) {
                Some(range) => {
                    tracked.current = range;
                    true
                }
                None => false,
            }
        });
    }

    pub(crate) fn live(&self) -> usize {
        self.paths.len() + self.points.len() + self.ranges.len()
    }
}

impl PathRef {
    /// The tracked path, or `None` once the node it pointed at was removed.
    pub fn current(&self, editor: &Editor) -> Option<Path> {
        editor.refs.paths.get(&self.id).map(|t| t.current.clone())
    }

    /// Release the ref, returning its final location.
    pub fn unref(self, editor: &mut Editor) -> Option<Path> {
        editor.refs.paths.remove(&self.id).map(|t| t.current)
    }

    /// Re-point a live ref. Returns false when the ref was already dropped.
    pub fn set_current(&self, editor: &mut Editor, path: Path) -> bool {
        match editor.refs.paths.get_mut(&self.id) {
            Some(tracked) => {
                tracked.current = path;
                true
            }
            None => false,
        }
    }
}

impl PointRef {
    pub fn current(&self, editor: &Editor) -> Option<Point> {
        editor.refs.points.get(&self.id).map(|t| t.current.clone())
    }

    pub fn unref(self, editor: &mut Editor) -> Option<Point> {
        editor.refs.points.remove(&self.id).map(|t| t.current)
    }

    pub fn set_current(&self, editor: &mut Editor, point: Point) -> bool {
        match editor.refs.points.get_mut(&self.id) {
            Some(tracked) => {
                tracked.current = point;
                true
            }
            None => false,
        }
    }
}

impl RangeRef {
    pub fn current(&self, editor: &Editor) -> Option<Range> {
        editor.refs.ranges.get(&self.id).map(|t| t.current.clone())
    }

    pub fn unref(self, editor: &mut Editor) -> Option<Range> {
        editor.refs.ranges.remove(&self.id).map(|t| t.current)
    }

    pub fn set_current(&self, editor: &mut Editor, range: Range) -> bool {
        match editor.refs.ranges.get_mut(&self.id) {
            Some(tracked) => {
                tracked.current = range;
                true
            }
            None => false,
        }
    }
}

impl Editor {
    /// Track `path` across later operations. `affinity` only matters for a split exactly
    /// at the path; `None` drops the ref in that case.
    pub fn path_ref(&mut self, path: Path, affinity: Option<Affinity>) -> PathRef {
        let id = self.refs.allocate();
        self.refs.paths.insert(
            id,
            Tracked {
                current: path,
                affinity,
            },
        );
        PathRef { id }
    }

    pub fn point_ref(&mut self, point: Point, affinity: Option<Affinity>) -> PointRef {
        let id = self.refs.allocate();
        self.refs.points.insert(
            id,
            Tracked {
                current: point,
                affinity,
            },
        );
        PointRef { id }
    }

    pub fn range_ref(&mut self, range: Range, affinity: Option<RangeAffinity>) -> RangeRef {
        let id = self.refs.allocate();
        self.refs.ranges.insert(
            id,
            Tracked {
                current: range,
                affinity,
            },
        );
        RangeRef { id }
    }

    /// Number of refs still registered.
    pub fn live_refs(&self) -> usize {
        self.refs.live()
    }
}
