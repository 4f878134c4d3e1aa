use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Anything that carries an id and an optional parent id.
pub trait Threaded {
    fn id(&self) -> Uuid;
    fn parent_id(&self) -> Option<Uuid>;
}

/// Read-only parent -> children view over one container's comments.
///
/// Built from a snapshot; it does not track later writes. A comment whose
/// declared parent is missing from the snapshot stays grouped under that
/// parent id and is also listed in [`CommentTree::orphans`]. It is never
/// promoted to the top level.
#[derive(Debug)]
pub struct CommentTree<'a, T> {
    top_level: Vec<&'a T>,
    children: HashMap<Uuid, Vec<&'a T>>,
    orphans: Vec<&'a T>,
    len: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadNode<T> {
    #[serde(flatten)]
    pub comment: T,
    pub replies: Vec<ThreadNode<T>>,
}

impl<'a, T: Threaded> CommentTree<'a, T> {
    pub fn build(comments: &'a [T]) -> Self {
        let ids: HashSet<Uuid> = comments.iter().map(Threaded::id).collect();
        let mut top_level = Vec::new();
        let mut children: HashMap<Uuid, Vec<&'a T>> = HashMap::new();
        let mut orphans = Vec::new();

        for comment in comments {
            match comment.parent_id() {
                None => top_level.push(comment),
                Some(parent) => {
                    children.entry(parent).or_default().push(comment);
                    if !ids.contains(&parent) {
                        orphans.push(comment);
                    }
                }
            }
        }

        Self {
            top_level,
            children,
            orphans,
            len: comments.len(),
        }
    }

    pub fn top_level(&self) -> &[&'a T] {
        &self.top_level
    }

    /// Direct replies to `id`, in snapshot order.
    pub fn children_of(&self, id: Uuid) -> &[&'a T] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn orphans(&self) -> &[&'a T] {
        &self.orphans
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ids of `root` and all its descendants, each after every one of its own
    /// descendants. Siblings keep snapshot order.
    pub fn post_order(&self, root: Uuid) -> Vec<Uuid> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            // malformed rows could loop
            if !visited.insert(id) {
                continue;
            }
            stack.push((id, true));
            for child in self.children_of(id).iter().rev() {
                stack.push((child.id(), false));
            }
        }

        order
    }

    /// Owned nested view of the top-level forest. Orphans are not included.
    ///
    /// Built without recursion. Replies deeper than [`MAX_THREAD_DEPTH`] are
    /// flattened into the last level, in thread order.
    pub fn nested<U>(&self, map: impl Fn(&T) -> U) -> Vec<ThreadNode<U>> {
        self.top_level
            .iter()
            .filter_map(|comment| self.node(comment, &map))
            .collect()
    }

    fn node<U>(&self, root: &'a T, map: &impl Fn(&T) -> U) -> Option<ThreadNode<U>> {
        let mut open: Vec<ThreadNode<U>> = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = vec![(root, 0usize)];

        while let Some((comment, depth)) = pending.pop() {
            if !visited.insert(comment.id()) {
                continue;
            }
            let level = depth.min(MAX_THREAD_DEPTH);
            while open.len() > level.max(1) {
                close_last(&mut open);
            }
            open.push(ThreadNode {
                comment: map(comment),
                replies: Vec::new(),
            });
            for child in self.children_of(comment.id()).iter().rev() {
                pending.push((*child, depth + 1));
            }
        }

        while open.len() > 1 {
            close_last(&mut open);
        }
        open.pop()
    }
}

/// Deepest nesting level produced by [`CommentTree::nested`].
pub const MAX_THREAD_DEPTH: usize = 32;

fn close_last<U>(open: &mut Vec<ThreadNode<U>>) {
    if let Some(done) = open.pop() {
        if let Some(parent) = open.last_mut() {
            parent.replies.push(done);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: Uuid,
        parent: Option<Uuid>,
    }

    impl Threaded for Row {
        fn id(&self) -> Uuid {
            self.id
        }

        fn parent_id(&self) -> Option<Uuid> {
            self.parent
        }
    }

    fn row(parent: Option<Uuid>) -> Row {
        Row {
            id: Uuid::new_v4(),
            parent,
        }
    }

    fn ids(rows: &[&Row]) -> Vec<Uuid> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn groups_by_parent_preserving_order() {
        let a = row(None);
        let b = row(Some(a.id));
        let c = row(None);
        let d = row(Some(a.id));
        let e = row(Some(b.id));
        let rows = vec![a.clone(), b.clone(), c.clone(), d.clone(), e.clone()];

        let tree = CommentTree::build(&rows);

        assert_eq!(ids(tree.top_level()), vec![a.id, c.id]);
        assert_eq!(ids(tree.children_of(a.id)), vec![b.id, d.id]);
        assert_eq!(ids(tree.children_of(b.id)), vec![e.id]);
        assert!(tree.children_of(c.id).is_empty());
        assert!(tree.orphans().is_empty());
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn every_comment_lands_in_exactly_one_group() {
        let a = row(None);
        let b = row(Some(a.id));
        let c = row(Some(b.id));
        let stray = row(Some(Uuid::new_v4()));
        let rows = vec![a.clone(), b.clone(), c.clone(), stray.clone()];

        let tree = CommentTree::build(&rows);

        let mut seen: Vec<Uuid> = ids(tree.top_level());
        for r in &rows {
            seen.extend(ids(tree.children_of(r.id)));
        }
        seen.extend(ids(tree.children_of(stray.parent.unwrap())));
        seen.sort();
        let mut expected: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn orphans_are_not_promoted() {
        let a = row(None);
        let missing = Uuid::new_v4();
        let orphan = row(Some(missing));
        let rows = vec![a.clone(), orphan.clone()];

        let tree = CommentTree::build(&rows);

        assert_eq!(ids(tree.top_level()), vec![a.id]);
        assert_eq!(ids(tree.orphans()), vec![orphan.id]);
        assert_eq!(ids(tree.children_of(missing)), vec![orphan.id]);
        assert_eq!(tree.nested(|r| r.id).len(), 1);
    }

    #[test]
    fn post_order_visits_descendants_first() {
        let a = row(None);
        let b = row(Some(a.id));
        let c = row(Some(b.id));
        let d = row(Some(a.id));
        let rows = vec![a.clone(), b.clone(), c.clone(), d.clone()];

        let tree = CommentTree::build(&rows);

        assert_eq!(tree.post_order(a.id), vec![c.id, b.id, d.id, a.id]);
        assert_eq!(tree.post_order(b.id), vec![c.id, b.id]);
        assert_eq!(tree.post_order(d.id), vec![d.id]);
    }

    #[test]
    fn post_order_terminates_on_cyclic_rows() {
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();
        let rows = vec![
            Row { id: x, parent: Some(y) },
            Row { id: y, parent: Some(x) },
        ];

        let tree = CommentTree::build(&rows);

        assert!(tree.top_level().is_empty());
        assert_eq!(tree.post_order(x), vec![y, x]);
    }

    #[test]
    fn nested_mirrors_children_of() {
        let a = row(None);
        let b = row(Some(a.id));
        let c = row(Some(b.id));
        let rows = vec![a.clone(), b.clone(), c.clone()];

        let tree = CommentTree::build(&rows);
        let nested = tree.nested(|r| r.id);

        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].comment, a.id);
        assert_eq!(nested[0].replies[0].comment, b.id);
        assert_eq!(nested[0].replies[0].replies[0].comment, c.id);
        assert!(nested[0].replies[0].replies[0].replies.is_empty());
    }

    #[test]
    fn empty_snapshot() {
        let rows: Vec<Row> = Vec::new();
        let tree = CommentTree::build(&rows);
        assert!(tree.is_empty());
        assert!(tree.top_level().is_empty());
        assert_eq!(tree.post_order(Uuid::new_v4()).len(), 1);
    }

    fn depth_and_count<U>(nodes: &[ThreadNode<U>]) -> (usize, usize) {
        let mut deepest = 0;
        let mut count = 0;
        let mut pending: Vec<(&ThreadNode<U>, usize)> = nodes.iter().map(|n| (n, 1)).collect();
        while let Some((node, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            count += 1;
            pending.extend(node.replies.iter().map(|r| (r, depth + 1)));
        }
        (deepest, count)
    }

    #[test]
    fn very_long_chains_are_capped_not_lost() {
        let mut rows = vec![row(None)];
        for _ in 0..5_000 {
            let parent = rows[rows.len() - 1].id;
            rows.push(row(Some(parent)));
        }

        let tree = CommentTree::build(&rows);
        let nested = tree.nested(|r| serde_json::json!({ "id": r.id }));

        let (deepest, count) = depth_and_count(&nested);
        assert_eq!(count, rows.len());
        assert_eq!(deepest, MAX_THREAD_DEPTH + 1);
        assert!(serde_json::to_string(&nested).is_ok());

        // flattened replies keep thread order
        let mut node = &nested[0];
        for _ in 0..MAX_THREAD_DEPTH - 1 {
            node = &node.replies[0];
        }
        let tail: Vec<Uuid> = node
            .replies
            .iter()
            .map(|r| serde_json::from_value(r.comment["id"].clone()).unwrap())
            .collect();
        let expected: Vec<Uuid> = rows[MAX_THREAD_DEPTH..].iter().map(|r| r.id).collect();
        assert_eq!(tail, expected);
    }
}
