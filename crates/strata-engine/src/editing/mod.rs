/*!
 * # Editor Core
 *
 * The [`Editor`] owns the document tree and the selection and is the only place either
 * changes. Everything else in this module hangs off it:
 *
 * - **`editor`**: the apply pipeline, version counter and change flushing
 * - **`normalize`**: the dirty-path normalization pass and the default repairs
 * - **`refs`**: path/point/range handles that follow later operations
 * - **`queries`** and **`positions`**: read-only location resolution and caret stepping
 * - **`matcher`**: the [`Match`] predicate shared by queries and transforms
 * - **`schema`**: the host hooks ([`Schema`]) deciding inline/void rules and overriding
 *   normalization, change and error handling
 * - **`commands`**: selection-driven commands (marks, breaks, deletes) a host binds to keys
 * - **`change`**: what a flush reports
 *
 * ## Usage
 *
 * ```rust
 * use strata_engine::{DefaultSchema, Editor, Node, Path, Point, Range};
 *
 * let mut editor = Editor::new(DefaultSchema)
 *     .with_children(vec![Node::element("paragraph", vec![Node::text("hello")])]);
 *
 * editor.select(Range::collapsed(Point::new([0, 0], 5)))?;
 * editor.insert_text(" world")?;
 *
 * assert_eq!(editor.string(Path::root())?, "hello world");
 * assert!(editor.flush().is_some());
 * # Ok::<(), strata_engine::EditorError>(())
 * ```
 */

pub mod change;
pub mod commands;
pub mod editor;
pub mod matcher;
pub mod normalize;
pub mod positions;
pub mod queries;
pub mod refs;
pub mod schema;

#[cfg(test)]
mod tests;

pub use change::{Change, ErrorAction};
pub use commands::Direction;
pub use editor::{Editor, EditorValue};
pub use matcher::Match;
pub use normalize::{NormalizeNodeOptions, ShouldNormalize};
pub use positions::{BeforeOptions, NextOptions, Positions, PositionsOptions, Unit};
pub use queries::{AboveOptions, LevelsOptions, Mode, Nodes, NodesOptions, PathOptions};
pub use refs::{PathRef, PointRef, RangeRef};
pub use schema::{DefaultSchema, Schema};
