use crate::location::Path;
use crate::node::{Node, NodeEntry};

/// Predicate deciding whether to skip the subtree below an entry.
pub type PassFn<'a> = Box<dyn Fn(&Node, &Path) -> bool + 'a>;

/// Bounds and direction for a depth-first walk.
#[derive(Default)]
pub struct TraverseOptions<'a> {
    /// Where to start descending; entries on the way down are still yielded.
    pub from: Path,
    /// Stop once the walk passes this path.
    pub to: Option<Path>,
    pub reverse: bool,
    /// Entries for which this returns true are yielded but not descended into.
    pub pass: Option<PassFn<'a>>,
}

/// Lazy pre-order walk over a subtree, yielding every node once with its path.
///
/// The walk is restartable from any path because it keeps no visited set: the only state
/// carried between steps is the cursor and whether it just climbed back to a parent.
pub struct NodeEntries<'a, 'p> {
    root: &'a Node,
    node: &'a Node,
    path: Path,
    ascended: bool,
    done: bool,
    options: TraverseOptions<'p>,
}

impl Node {
    pub fn entries<'a, 'p>(&'a self, options: TraverseOptions<'p>) -> NodeEntries<'a, 'p> {
        NodeEntries {
            root: self,
            node: self,
            path: Path::root(),
            ascended: false,
            done: false,
            options,
        }
    }
}

impl NodeEntries<'_, '_> {
    fn passes(&self) -> bool {
        self.options
            .pass
            .as_ref()
            .is_some_and(|pass| pass(self.node, &self.path))
    }

    fn past_end(&self) -> bool {
        match &self.options.to {
            Some(to) if self.options.reverse => self.path.is_before(to),
            Some(to) => self.path.is_after(to),
            None => false,
        }
    }

    fn move_to(&mut self, path: Path, ascended: bool) {
        match self.root.get(&path) {
            Ok(node) => {
                self.node = node;
                self.path = path;
                self.ascended = ascended;
            }
            Err(_) => self.done = true,
        }
    }

    fn advance(&mut self) {
        let children = self.node.children();
        if !self.ascended && !children.is_empty() && !self.passes() {
            let index = if self.path.is_ancestor(&self.options.from) {
                self.options.from[self.path.len()]
            } else if self.options.reverse {
                children.len() - 1
            } else {
                0
            };
            let child = self.path.child(index);
            self.move_to(child, false);
            return;
        }

        if self.path.is_empty() {
            self.done = true;
            return;
        }

        if !self.options.reverse {
            if let Ok(next) = self.path.next() {
                if self.root.has(&next) {
                    self.move_to(next, false);
                    return;
                }
            }
        } else if self.path.has_previous() {
            if let Ok(previous) = self.path.previous() {
                self.move_to(previous, false);
                return;
            }
        }

        match self.path.parent() {
            Ok(parent) => self.move_to(parent, true),
            Err(_) => self.done = true,
        }
    }
}

impl<'a> Iterator for NodeEntries<'a, '_> {
    type Item = NodeEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done || self.past_end() {
                self.done = true;
                return None;
            }
            let entry = (!self.ascended).then(|| (self.node, self.path.clone()));
            self.advance();
            if entry.is_some() {
                return entry;
            }
        }
    }
}
