use std::collections::HashSet;
use std::mem;
use std::rc::Rc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strata_config::EditorConfig;

use crate::editing::change::{Change, ErrorAction};
use crate::editing::refs::RefRegistry;
use crate::editing::schema::{DefaultSchema, Schema};
use crate::error::{EditorError, Result};
use crate::location::{Affinity, Path, Range};
use crate::node::{Element, Node, Properties};
use crate::operation::{self, Operation};

/// Plain JSON form of an editor's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorValue {
    pub children: Vec<Node>,
    #[serde(default)]
    pub selection: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Properties>,
}

/// Insertion-ordered set of paths awaiting normalization.
#[derive(Debug, Default)]
pub(crate) struct DirtyPaths {
    paths: Vec<Path>,
    keys: HashSet<Path>,
}

impl DirtyPaths {
    fn add(&mut self, path: Path) {
        if self.keys.insert(path.clone()) {
            self.paths.push(path);
        }
    }

    /// Carry the existing set through `ops` (those that can move paths) and add `fresh`.
    pub(crate) fn update(&mut self, fresh: Vec<Path>, ops: &[Operation]) {
        let movers: Vec<&Operation> = ops
            .iter()
            .filter(|op| Path::operation_can_transform_path(op))
            .collect();
        if !movers.is_empty() {
            let old = mem::take(&mut self.paths);
            self.keys.clear();
            for path in old {
                let moved = movers
                    .iter()
                    .try_fold(path, |path, op| path.transform(op, Some(Affinity::Forward)));
                if let Some(path) = moved {
                    self.add(path);
                }
            }
        }
        for path in fresh {
            self.add(path);
        }
    }

    pub(crate) fn pop(&mut self) -> Option<Path> {
        let path = self.paths.pop()?;
        self.keys.remove(&path);
        Some(path)
    }

    pub(crate) fn snapshot(&self) -> Vec<Path> {
        self.paths.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }

    pub(crate) fn replace(&mut self, paths: Vec<Path>) {
        self.paths.clear();
        self.keys.clear();
        for path in paths {
            self.add(path);
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct FlushLatch {
    content: bool,
    selection: bool,
    marks: bool,
}

impl FlushLatch {
    fn is_set(&self) -> bool {
        self.content || self.selection || self.marks
    }
}

/// The editing core: a document tree, its selection, and the pipeline every change goes
/// through.
///
/// ## Apply pipeline
///
/// [`Editor::apply`] is the only way the tree or the selection changes. For each
/// operation it:
///
/// 1. collects the paths the operation may invalidate (unless dirty paths are batched),
/// 2. applies the operation to the tree and selection,
/// 3. moves every live [`crate::PathRef`], [`crate::PointRef`] and [`crate::RangeRef`],
/// 4. merges the dirty paths, appends to the operation log and bumps the version,
/// 5. runs one normalization pass,
/// 6. clears pending marks after a selection change.
///
/// A rejected operation returns its error before anything is touched.
///
/// ## Change notification
///
/// Applying sets a flush latch instead of notifying inline. [`Editor::flush`] marks the
/// end of a task: it reports everything applied since the last flush as one [`Change`]
/// and clears the operation log. A transform made of many operations is therefore seen
/// as a single change.
///
/// ```rust
/// # use strata_engine::{DefaultSchema, Editor, Node, Operation, Path};
/// let mut editor = Editor::new(DefaultSchema)
///     .with_children(vec![Node::element("paragraph", vec![Node::text("ab")])]);
///
/// editor.apply(Operation::InsertText {
///     path: Path::from([0, 0]),
///     offset: 1,
///     text: "X".into(),
/// })?;
///
/// assert_eq!(editor.string(Path::root())?, "aXb");
/// let change = editor.flush().expect("one change");
/// assert_eq!(change.operations.len(), 1);
/// # Ok::<(), strata_engine::EditorError>(())
/// ```
pub struct Editor {
    pub(crate) root: Node,
    pub(crate) selection: Option<Range>,
    pub(crate) marks: Option<Properties>,
    pub(crate) operations: Vec<Operation>,
    pub(crate) schema: Rc<dyn Schema>,
    pub(crate) config: EditorConfig,
    pub(crate) normalizing: bool,
    pub(crate) batching_dirty_paths: bool,
    pub(crate) dirty: DirtyPaths,
    pub(crate) refs: RefRegistry,
    latch: FlushLatch,
    version: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Editor::new(DefaultSchema)
    }
}

impl Editor {
    pub fn new(schema: impl Schema + 'static) -> Self {
        Editor::with_config(schema, EditorConfig::default())
    }

    pub fn with_config(schema: impl Schema + 'static, config: EditorConfig) -> Self {
        Editor {
            root: Node::Element(Element::default()),
            selection: None,
            marks: None,
            operations: Vec::new(),
            schema: Rc::new(schema),
            config,
            normalizing: true,
            batching_dirty_paths: false,
            dirty: DirtyPaths::default(),
            refs: RefRegistry::default(),
            latch: FlushLatch::default(),
            version: 0,
        }
    }

    /// Replace the document wholesale, bypassing operations and normalization.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.root = Node::Element(Element::new(children));
        self
    }

    /// Set the selection without an operation; for loading saved state.
    pub fn with_selection(mut self, selection: Option<Range>) -> Self {
        self.selection = selection;
        self
    }

    /// Load an editor from the plain JSON shape `{"children": [...], "selection": ...}`.
    pub fn from_json(schema: impl Schema + 'static, json: &str) -> anyhow::Result<Self> {
        let value: EditorValue = serde_json::from_str(json)?;
        let mut editor = Editor::new(schema)
            .with_children(value.children)
            .with_selection(value.selection);
        editor.marks = value.marks;
        Ok(editor)
    }

    pub fn value(&self) -> EditorValue {
        EditorValue {
            children: self.children().iter().map(|c| c.as_ref().clone()).collect(),
            selection: self.selection.clone(),
            marks: self.marks.clone(),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(&self.value())?)
    }

    /// The root node; its children are the document.
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn children(&self) -> &[std::sync::Arc<Node>] {
        self.root.children()
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    /// Marks waiting to be applied to the next inserted text.
    pub fn pending_marks(&self) -> Option<&Properties> {
        self.marks.as_ref()
    }

    /// Operations applied since the last flush.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub(crate) fn schema(&self) -> Rc<dyn Schema> {
        Rc::clone(&self.schema)
    }

    pub fn is_inline(&self, element: &Element) -> bool {
        self.schema.is_inline(element)
    }

    pub fn is_block(&self, element: &Element) -> bool {
        !self.schema.is_inline(element)
    }

    pub fn is_void(&self, element: &Element) -> bool {
        self.schema.is_void(element)
    }

    pub fn is_selectable(&self, element: &Element) -> bool {
        self.schema.is_selectable(element)
    }

    pub fn is_element_read_only(&self, element: &Element) -> bool {
        self.schema.is_element_read_only(element)
    }

    pub fn markable_void(&self, element: &Element) -> bool {
        self.schema.markable_void(element)
    }

    /// Apply one operation through the full pipeline (see the type docs).
    pub fn apply(&mut self, op: Operation) -> Result<()> {
        let dirty = if self.batching_dirty_paths {
            None
        } else {
            let schema = self.schema();
            Some(schema.dirty_paths(self, &op))
        };

        operation::apply(&mut self.root, &mut self.selection, &op)?;
        self.refs.transform(&op);
        if let Some(dirty) = dirty {
            self.dirty.update(dirty, std::slice::from_ref(&op));
        }

        let is_selection = op.is_selection_operation();
        if is_selection {
            self.latch.selection = true;
        } else {
            self.latch.content = true;
        }
        self.operations.push(op.clone());
        self.version += 1;

        self.normalize_with(false, Some(&op))?;

        if is_selection {
            self.marks = None;
        }
        Ok(())
    }

    /// Apply a run of operations with dirty-path bookkeeping suspended, then carry the
    /// old dirty paths through all of them at once and add `fresh`.
    pub(crate) fn apply_batch(&mut self, ops: Vec<Operation>, fresh: Vec<Path>) -> Result<()> {
        let batching = self.batching_dirty_paths;
        self.batching_dirty_paths = true;
        let mut applied = Vec::with_capacity(ops.len());
        let mut result = Ok(());
        for op in ops {
            if let Err(err) = self.apply(op.clone()) {
                result = Err(err);
                break;
            }
            applied.push(op);
        }
        self.batching_dirty_paths = batching;
        self.dirty.update(fresh, &applied);
        result
    }

    pub(crate) fn set_marks(&mut self, marks: Option<Properties>) {
        self.marks = marks;
        self.latch.marks = true;
    }

    /// End of task: report everything applied since the last flush as one change.
    ///
    /// Returns `None` (and calls no hook) when nothing happened.
    pub fn flush(&mut self) -> Option<Change> {
        if !self.latch.is_set() {
            return None;
        }
        let latch = mem::take(&mut self.latch);
        let change = Change {
            operations: mem::take(&mut self.operations),
            version: self.version,
            content_changed: latch.content,
            selection_changed: latch.selection,
            marks_changed: latch.marks,
        };
        debug!(
            "flushing {} operations at version {}",
            change.operations.len(),
            change.version
        );
        self.schema().on_change(&change);
        Some(change)
    }

    /// Route a recoverable failure through the error hook.
    ///
    /// The recovery value is returned when one exists and either the configuration lists
    /// the error's key or [`Schema::on_error`] asks to recover. Otherwise the error is
    /// raised.
    pub fn report<T>(&self, error: EditorError, recovery: Option<T>) -> Result<T> {
        let Some(value) = recovery else {
            return Err(error);
        };
        let recover = self.config.errors.recovers(error.key())
            || self.schema.on_error(&error) == ErrorAction::Recover;
        if recover {
            warn!("recovered from {}: {}", error.key(), error);
            Ok(value)
        } else {
            Err(error)
        }
    }
}
