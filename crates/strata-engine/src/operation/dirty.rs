use crate::location::{Affinity, Path};
use crate::node::TraverseOptions;
use crate::operation::Operation;

/// Paths whose subtree may have become invalid once `op` is applied, expressed in the
/// post-operation tree. Duplicates are allowed; the editor dedupes.
pub fn dirty_paths(op: &Operation) -> Vec<Path> {
    match op {
        Operation::InsertText { path, .. }
        | Operation::RemoveText { path, .. }
        | Operation::SetNode { path, .. } => path.levels(),
        Operation::InsertNode { path, node } => {
            let mut paths = path.levels();
            if node.is_element() {
                paths.extend(
                    node.entries(TraverseOptions::default())
                        .map(|(_, relative)| path.join(&relative)),
                );
            }
            paths
        }
        Operation::MergeNode { path, .. } => {
            let mut paths = path.ancestors();
            paths.extend(path.previous().ok());
            paths
        }
        Operation::MoveNode { path, new_path } => {
            if path == new_path {
                return Vec::new();
            }
            let forward = Some(Affinity::Forward);
            let old_ancestors: Vec<Path> = path
                .ancestors()
                .iter()
                .filter_map(|ancestor| ancestor.transform(op, forward))
                .collect();
            let new_ancestors: Vec<Path> = new_path
                .ancestors()
                .iter()
                .filter_map(|ancestor| ancestor.transform(op, forward))
                .collect();
            let moved = match (new_ancestors.last(), new_path.last()) {
                (Some(parent), Some(index)) => Some(parent.child(index)),
                _ => None,
            };
            let mut paths = old_ancestors;
            paths.extend(new_ancestors);
            paths.extend(moved);
            paths
        }
        Operation::RemoveNode { path, .. } => path.ancestors(),
        Operation::SplitNode { path, .. } => {
            let mut paths = path.ancestors();
            paths.push(path.clone());
            paths.extend(path.next().ok());
            paths
        }
        Operation::SetSelection { .. } => Vec::new(),
    }
}
