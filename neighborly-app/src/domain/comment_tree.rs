//! Reply tree reconstruction.
//!
//! Comments arrive as a flat list with parent references. The tree indexes
//! them once by parent id so that each render pass is a linear walk.

use super::comment::Comment;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentTree {
    /// Comments reachable from a top-level comment, in stable creation order.
    comments: Vec<Comment>,
    /// Parent id (`None` for top level) to indices into `comments`.
    children: HashMap<Option<Uuid>, Vec<usize>>,
    index: HashMap<Uuid, usize>,
}

impl CommentTree {
    /// Builds the reply forest for one need.
    ///
    /// Comments whose parent is not in `comments` are left out together with
    /// everything below them.
    pub fn build(comments: &[Comment]) -> Self {
        let mut sorted: Vec<&Comment> = comments.iter().collect();
        sorted.sort_by_key(|c| c.created_at);

        let mut by_parent: HashMap<Option<Uuid>, Vec<&Comment>> = HashMap::new();
        for comment in sorted {
            by_parent.entry(comment.parent_id).or_default().push(comment);
        }

        let mut tree = CommentTree {
            comments: Vec::with_capacity(comments.len()),
            children: HashMap::new(),
            index: HashMap::new(),
        };
        let mut seen = HashSet::new();

        // Explicit stack: reply chains can be far deeper than the call stack.
        let mut pending: Vec<(Option<Uuid>, &Comment)> = by_parent
            .get(&None)
            .into_iter()
            .flatten()
            .rev()
            .map(|c| (None, *c))
            .collect();

        while let Some((parent_id, comment)) = pending.pop() {
            if !seen.insert(comment.id) {
                continue;
            }
            let idx = tree.comments.len();
            tree.comments.push(comment.clone());
            tree.index.insert(comment.id, idx);
            tree.children.entry(parent_id).or_default().push(idx);
            if let Some(kids) = by_parent.get(&Some(comment.id)) {
                pending.extend(kids.iter().rev().map(|c| (Some(comment.id), *c)));
            }
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Comment> {
        self.index.get(&id).map(|&i| &self.comments[i])
    }

    pub fn roots(&self) -> impl Iterator<Item = &Comment> {
        self.kids(None)
    }

    /// Direct replies to `id`, oldest first.
    pub fn children(&self, id: Uuid) -> impl Iterator<Item = &Comment> {
        self.kids(Some(id))
    }

    fn kids(&self, parent: Option<Uuid>) -> impl Iterator<Item = &Comment> {
        self.children
            .get(&parent)
            .into_iter()
            .flatten()
            .map(move |&i| &self.comments[i])
    }

    pub fn descendant_count(&self, id: Uuid) -> usize {
        let mut count = 0;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            for child in self.children(next) {
                count += 1;
                pending.push(child.id);
            }
        }
        count
    }

    /// Every comment with its nesting depth, in display order.
    pub fn depth_first(&self) -> Vec<(&Comment, usize)> {
        let mut out = Vec::with_capacity(self.comments.len());
        let mut pending: Vec<(&Comment, usize)> = self.roots().map(|c| (c, 0)).collect();
        pending.reverse();

        while let Some((comment, depth)) = pending.pop() {
            out.push((comment, depth));
            let start = pending.len();
            pending.extend(self.children(comment.id).map(|c| (c, depth + 1)));
            pending[start..].reverse();
        }
        out
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::comment;
    use super::*;

    #[test]
    fn test_three_level_chain() {
        let need = Uuid::new_v4();
        let a = comment(need, None, 0);
        let b = comment(need, Some(a.id), 1);
        let c = comment(need, Some(b.id), 2);

        // Input order must not matter.
        let tree = CommentTree::build(&[c.clone(), a.clone(), b.clone()]);
        let flat: Vec<(Uuid, usize)> = tree.depth_first().into_iter().map(|(c, d)| (c.id, d)).collect();
        assert_eq!(flat, vec![(a.id, 0), (b.id, 1), (c.id, 2)]);
        assert_eq!(tree.descendant_count(a.id), 2);
        assert_eq!(tree.descendant_count(c.id), 0);
    }

    #[test]
    fn test_top_level_and_direct_children() {
        let need = Uuid::new_v4();
        let r1 = comment(need, None, 0);
        let r2 = comment(need, None, 5);
        let r1a = comment(need, Some(r1.id), 2);
        let r1b = comment(need, Some(r1.id), 3);

        let tree = CommentTree::build(&[r2.clone(), r1b.clone(), r1.clone(), r1a.clone()]);
        let roots: Vec<Uuid> = tree.roots().map(|c| c.id).collect();
        assert_eq!(roots, vec![r1.id, r2.id]);

        let kids: Vec<Uuid> = tree.children(r1.id).map(|c| c.id).collect();
        assert_eq!(kids, vec![r1a.id, r1b.id]);
        assert_eq!(tree.children(r2.id).count(), 0);
    }

    #[test]
    fn test_orphans_are_dropped_with_their_subtree() {
        let need = Uuid::new_v4();
        let root = comment(need, None, 0);
        let orphan = comment(need, Some(Uuid::new_v4()), 1);
        let orphan_reply = comment(need, Some(orphan.id), 2);

        let tree = CommentTree::build(&[root.clone(), orphan.clone(), orphan_reply.clone()]);
        assert_eq!(tree.len(), 1);
        assert!(tree.contains(root.id));
        assert!(!tree.contains(orphan.id));
        assert!(!tree.contains(orphan_reply.id));
        assert_eq!(tree.children(orphan.id).count(), 0);
    }

    #[test]
    fn test_cycles_and_self_parents_never_render() {
        let need = Uuid::new_v4();
        let mut x = comment(need, None, 0);
        let mut y = comment(need, None, 1);
        x.parent_id = Some(y.id);
        y.parent_id = Some(x.id);
        let mut selfish = comment(need, None, 2);
        selfish.parent_id = Some(selfish.id);

        let tree = CommentTree::build(&[x, y, selfish]);
        assert!(tree.is_empty());
        assert!(tree.depth_first().is_empty());
    }

    #[test]
    fn test_equal_timestamps_keep_source_order() {
        let need = Uuid::new_v4();
        let first = comment(need, None, 0);
        let second = comment(need, None, 0);

        let tree = CommentTree::build(&[first.clone(), second.clone()]);
        let roots: Vec<Uuid> = tree.roots().map(|c| c.id).collect();
        assert_eq!(roots, vec![first.id, second.id]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let need = Uuid::new_v4();
        let a = comment(need, None, 0);
        let b = comment(need, Some(a.id), 1);
        let c = comment(need, Some(a.id), 2);
        let input = vec![b, a, c];

        assert_eq!(CommentTree::build(&input), CommentTree::build(&input));
    }

    #[test]
    fn test_very_deep_chain_builds_and_walks() {
        let need = Uuid::new_v4();
        let mut chain = vec![comment(need, None, 0)];
        for _ in 1..10_000 {
            let parent = chain.last().map(|c| c.id);
            chain.push(comment(need, parent, 1));
        }
        let root = chain[0].id;
        let leaf = chain[9_999].id;
        chain.reverse();

        let tree = CommentTree::build(&chain);
        assert_eq!(tree.len(), 10_000);
        assert_eq!(tree.descendant_count(root), 9_999);

        let walk = tree.depth_first();
        assert_eq!(walk[0].0.id, root);
        assert_eq!(walk[9_999], (tree.get(leaf).unwrap(), 9_999));
    }
}
