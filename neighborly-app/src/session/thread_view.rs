//! Display state of a comment thread.
//!
//! Collapse state is keyed by comment id, not by position, so a refetch that
//! rebuilds the tree keeps what the user folded.

use super::optimistic::OptimisticVotes;
use crate::domain::{Comment, CommentTree, VoteCounts, VoteTarget, Viewer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Deeper replies still render, just without further indentation.
pub const MAX_THREAD_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentActions {
    pub can_vote: bool,
    pub can_reply: bool,
    pub can_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRow {
    pub comment: Comment,
    pub depth: usize,
    pub indent: usize,
    pub counts: VoteCounts,
    pub reply_count: usize,
    pub collapsed: bool,
    /// Number of descendants hidden by this row being collapsed.
    pub hidden_replies: usize,
    pub actions: CommentActions,
}

impl ThreadRow {
    /// Text shown for the row. A collapsed row shows only its toggle and
    /// the hidden-replies label.
    pub fn body(&self) -> Option<&str> {
        (!self.collapsed).then_some(self.comment.content.as_str())
    }

    pub fn hidden_label(&self) -> Option<String> {
        match self.hidden_replies {
            0 => None,
            1 => Some("1 reply hidden".to_string()),
            n => Some(format!("{} replies hidden", n)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadView {
    collapsed: HashSet<Uuid>,
}

impl ThreadView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, id: Uuid) -> bool {
        self.collapsed.contains(&id)
    }

    pub fn toggle(&mut self, id: Uuid) {
        if !self.collapsed.remove(&id) {
            self.collapsed.insert(id);
        }
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    /// Forgets state for comments that are gone after a refetch.
    pub fn retain(&mut self, tree: &CommentTree) {
        self.collapsed.retain(|id| tree.contains(*id));
    }

    pub fn render(&self, tree: &CommentTree, viewer: &Viewer, votes: &OptimisticVotes) -> Vec<ThreadRow> {
        let mut rows = Vec::with_capacity(tree.len());
        let mut pending: Vec<(&Comment, usize)> = tree.roots().map(|c| (c, 0)).collect();
        pending.reverse();

        while let Some((comment, depth)) = pending.pop() {
            let collapsed = self.is_collapsed(comment.id);
            rows.push(self.row(tree, comment, depth, collapsed, viewer, votes));
            if collapsed {
                continue;
            }
            let start = pending.len();
            pending.extend(tree.children(comment.id).map(|c| (c, depth + 1)));
            pending[start..].reverse();
        }
        rows
    }

    fn row(
        &self,
        tree: &CommentTree,
        comment: &Comment,
        depth: usize,
        collapsed: bool,
        viewer: &Viewer,
        votes: &OptimisticVotes,
    ) -> ThreadRow {
        let target = VoteTarget::Comment(comment.id);
        ThreadRow {
            comment: comment.clone(),
            depth,
            indent: depth.min(MAX_THREAD_DEPTH),
            counts: votes.counts_or(target, comment.counts()),
            reply_count: tree.children(comment.id).count(),
            collapsed,
            hidden_replies: if collapsed { tree.descendant_count(comment.id) } else { 0 },
            actions: CommentActions {
                can_vote: !votes.has_voted(target),
                can_reply: viewer.is_signed_in(),
                can_delete: viewer.is_author_of(comment.user_id) || viewer.can_moderate(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::comment;
    use crate::domain::{Role, User, VoteDirection};

    fn chain() -> (Vec<Comment>, Uuid, Uuid, Uuid) {
        let need = Uuid::new_v4();
        let a = comment(need, None, 0);
        let b = comment(need, Some(a.id), 1);
        let c = comment(need, Some(b.id), 2);
        let ids = (a.id, b.id, c.id);
        (vec![a, b, c], ids.0, ids.1, ids.2)
    }

    fn ids(rows: &[ThreadRow]) -> Vec<Uuid> {
        rows.iter().map(|r| r.comment.id).collect()
    }

    #[test]
    fn test_everything_expanded_initially() {
        let (comments, a, b, c) = chain();
        let tree = CommentTree::build(&comments);
        let rows = ThreadView::new().render(&tree, &Viewer::anonymous(), &OptimisticVotes::new());

        assert_eq!(ids(&rows), vec![a, b, c]);
        assert_eq!(rows.iter().map(|r| r.depth).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(rows.iter().all(|r| !r.collapsed && r.hidden_label().is_none()));
    }

    #[test]
    fn test_collapse_hides_descendants_and_expand_restores() {
        let (comments, a, b, c) = chain();
        let tree = CommentTree::build(&comments);
        let viewer = Viewer::anonymous();
        let votes = OptimisticVotes::new();
        let mut view = ThreadView::new();

        view.toggle(a);
        let rows = view.render(&tree, &viewer, &votes);
        assert_eq!(ids(&rows), vec![a]);
        assert_eq!(rows[0].hidden_replies, 2);
        assert_eq!(rows[0].hidden_label().as_deref(), Some("2 replies hidden"));
        assert_eq!(rows[0].body(), None);

        view.toggle(a);
        let rows = view.render(&tree, &viewer, &votes);
        assert_eq!(ids(&rows), vec![a, b, c]);
        assert_eq!(rows[0].body(), Some("comment at minute 0"));
    }

    #[test]
    fn test_collapse_survives_refetch() {
        let (mut comments, a, b, _) = chain();
        let mut view = ThreadView::new();
        view.toggle(b);

        let reply = comment(comments[0].need_id, Some(a), 3);
        comments.push(reply.clone());
        let tree = CommentTree::build(&comments);
        view.retain(&tree);

        let rows = view.render(&tree, &Viewer::anonymous(), &OptimisticVotes::new());
        assert_eq!(ids(&rows), vec![a, b, reply.id]);
        assert_eq!(rows[1].hidden_label().as_deref(), Some("1 reply hidden"));
    }

    #[test]
    fn test_indent_is_capped_but_content_still_renders() {
        let need = Uuid::new_v4();
        let mut comments = vec![comment(need, None, 0)];
        for minute in 1..8 {
            let parent = comments.last().map(|c| c.id);
            comments.push(comment(need, parent, minute));
        }
        let tree = CommentTree::build(&comments);
        let rows = ThreadView::new().render(&tree, &Viewer::anonymous(), &OptimisticVotes::new());

        assert_eq!(rows.len(), 8);
        assert_eq!(rows[7].depth, 7);
        assert_eq!(rows[7].indent, MAX_THREAD_DEPTH);
        assert_eq!(rows[3].indent, 3);
    }

    #[test]
    fn test_actions_follow_viewer_and_votes() {
        let (mut comments, a, b, _) = chain();
        let me = User::new("Noor".to_string(), None);
        comments[0].user_id = me.id;
        let tree = CommentTree::build(&comments);

        let mut votes = OptimisticVotes::new();
        let pending = votes.begin(VoteTarget::Comment(b), VoteDirection::Up).unwrap();
        votes.settle(pending, Ok(VoteCounts::new(1, 0)));

        let rows = ThreadView::new().render(&tree, &Viewer::signed_in(me), &votes);
        assert_eq!(rows[0].comment.id, a);
        assert!(rows[0].actions.can_delete);
        assert!(rows[0].actions.can_vote);
        assert!(rows[0].actions.can_reply);
        assert!(!rows[1].actions.can_delete);
        assert!(!rows[1].actions.can_vote);
        assert_eq!(rows[1].counts, VoteCounts::new(1, 0));

        let anon = ThreadView::new().render(&tree, &Viewer::anonymous(), &votes);
        assert!(anon.iter().all(|r| !r.actions.can_reply && !r.actions.can_delete));

        let moderator = Viewer::signed_in(User::new("Mod".to_string(), None).with_role(Role::Moderator));
        let rows = ThreadView::new().render(&tree, &moderator, &votes);
        assert!(rows.iter().all(|r| r.actions.can_delete));
    }

    #[test]
    fn test_siblings_render_in_order_below_their_parent() {
        let need = Uuid::new_v4();
        let r1 = comment(need, None, 0);
        let r2 = comment(need, None, 1);
        let r1a = comment(need, Some(r1.id), 2);
        let r1b = comment(need, Some(r1.id), 3);
        let r1a1 = comment(need, Some(r1a.id), 4);
        let expected = vec![r1.id, r1a.id, r1a1.id, r1b.id, r2.id];

        let tree = CommentTree::build(&[r2, r1b, r1a1, r1, r1a]);
        let rows = ThreadView::new().render(&tree, &Viewer::anonymous(), &OptimisticVotes::new());
        assert_eq!(ids(&rows), expected);
        assert_eq!(rows.iter().map(|r| r.depth).collect::<Vec<_>>(), vec![0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_very_deep_chain_renders() {
        let need = Uuid::new_v4();
        let mut comments = vec![comment(need, None, 0)];
        for _ in 1..10_000 {
            let parent = comments.last().map(|c| c.id);
            comments.push(comment(need, parent, 1));
        }
        let tree = CommentTree::build(&comments);
        let mut view = ThreadView::new();

        let rows = view.render(&tree, &Viewer::anonymous(), &OptimisticVotes::new());
        assert_eq!(rows.len(), 10_000);
        assert_eq!(rows[9_999].depth, 9_999);

        view.toggle(comments[0].id);
        let rows = view.render(&tree, &Viewer::anonymous(), &OptimisticVotes::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hidden_replies, 9_999);
    }
}
