// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Comment threading.
//!
//! WordPress stores comments as a flat list where each record only knows its
//! own ID and the ID of the comment it replies to. This module rebuilds the
//! reply forest from that list.
//!
//! Only approved comments are admitted. Dropping a comment drops everything
//! below it, even approved replies, because descendants are only reached
//! through their admitted ancestors.
//!
//! Exports from old or migrated sites are not always consistent, so the
//! builder also copes with replies to comments that no longer exist (they
//! become top-level) and with parent chains that loop back on themselves
//! (the loop is broken at its earliest comment).
//!
//! # Example
//!
//! ```
//! use wp2md::parser::Comment;
//! use wp2md::thread::build_forest;
//!
//! let comments = vec![
//!     Comment { id: 1, ..Default::default() },
//!     Comment { id: 2, parent: Some(1), ..Default::default() },
//! ];
//!
//! let forest = build_forest(&comments);
//! assert_eq!(forest.len(), 1);
//! assert_eq!(forest[0].children[0].comment.id, 2);
//! ```

use crate::parser::Comment;
use std::collections::HashMap;
use tracing::warn;

/// A comment and its replies.
///
/// Threads borrow from the comment list they were built from and keep the
/// replies in the order they appeared in the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThread<'a> {
    /// The comment at this node.
    pub comment: &'a Comment,

    /// Direct replies, in export order.
    pub children: Vec<Self>,
}

impl CommentThread<'_> {
    /// Returns the number of comments in this thread, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(&node.children);
        }
        count
    }

    /// Returns the number of levels in this thread; a lone comment has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((node, level)) = pending.pop() {
            deepest = deepest.max(level);
            pending.extend(node.children.iter().map(|child| (child, level + 1)));
        }
        deepest
    }
}

// Threads can be arbitrarily deep; tear them down without recursing.
impl Drop for CommentThread<'_> {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Builds the reply forest for one item's comments.
///
/// Roots are the approved comments without a parent, in export order,
/// followed by any comments rooted to break a parent cycle. Every approved
/// comment reachable from a root through approved comments appears exactly
/// once.
#[must_use]
pub fn build_forest(comments: &[Comment]) -> Vec<CommentThread<'_>> {
    let index = Index::new(comments);
    let mut placed = vec![false; comments.len()];
    let mut forest = Vec::new();

    for (i, comment) in comments.iter().enumerate() {
        if !comment.approval.is_approved() || placed[i] {
            continue;
        }
        match comment.parent {
            None => {}
            Some(parent) if index.by_id.contains_key(&parent) => continue,
            Some(parent) => {
                warn!(
                    comment = comment.id,
                    parent, "reply to a missing comment, treating it as top-level"
                );
            }
        }
        forest.extend(index.expand(i, &mut placed));
    }

    let mut walks = vec![Walk::Unseen; comments.len()];
    for i in 0..comments.len() {
        if placed[i] || walks[i] != Walk::Unseen || !comments[i].approval.is_approved() {
            continue;
        }
        if let Some(root) = index.cycle_root(i, &placed, &mut walks) {
            warn!(
                comment = comments[root].id,
                "comment is its own ancestor, treating it as top-level"
            );
            forest.extend(index.expand(root, &mut placed));
        }
    }

    forest
}

/// Progress of the parent-chain walk for one comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Unseen,
    OnPath,
    Done,
}

/// Lookup tables over the flat comment list.
struct Index<'a> {
    comments: &'a [Comment],
    /// Comment ID to position; the first occurrence wins.
    by_id: HashMap<u64, usize>,
    /// Parent ID to the positions of its approved replies, in export order.
    replies: HashMap<u64, Vec<usize>>,
}

impl<'a> Index<'a> {
    fn new(comments: &'a [Comment]) -> Self {
        let mut by_id = HashMap::with_capacity(comments.len());
        let mut replies: HashMap<u64, Vec<usize>> = HashMap::new();

        for (i, comment) in comments.iter().enumerate() {
            by_id.entry(comment.id).or_insert(i);
            if let Some(parent) = comment.parent
                && comment.approval.is_approved()
            {
                replies.entry(parent).or_default().push(i);
            }
        }

        Self {
            comments,
            by_id,
            replies,
        }
    }

    fn replies_of(&self, position: usize) -> &[usize] {
        self.replies
            .get(&self.comments[position].id)
            .map_or(&[], Vec::as_slice)
    }

    /// Builds the thread rooted at `root`, depth first with an explicit stack.
    fn expand(&self, root: usize, placed: &mut [bool]) -> Option<CommentThread<'a>> {
        placed[root] = true;
        // (position, next reply to visit, finished children)
        let mut stack: Vec<(usize, usize, Vec<CommentThread<'a>>)> = vec![(root, 0, Vec::new())];
        let mut finished = None;

        while let Some((position, next, _)) = stack.last_mut() {
            if let Some(&reply) = self.replies_of(*position).get(*next) {
                *next += 1;
                if !placed[reply] {
                    placed[reply] = true;
                    stack.push((reply, 0, Vec::new()));
                }
                continue;
            }

            if let Some((position, _, children)) = stack.pop() {
                let node = CommentThread {
                    comment: &self.comments[position],
                    children,
                };
                match stack.last_mut() {
                    Some((_, _, siblings)) => siblings.push(node),
                    None => finished = Some(node),
                }
            }
        }

        finished
    }

    /// Follows the parent chain from `start`.
    ///
    /// Returns the earliest comment (by export position) of the loop the chain
    /// runs into, or `None` if the chain ends at a root, a missing parent, an
    /// unapproved comment, an already placed comment or a comment an earlier
    /// walk has settled. Every comment on the chain is marked done, so each
    /// comment is walked at most once per forest.
    fn cycle_root(&self, start: usize, placed: &[bool], walks: &mut [Walk]) -> Option<usize> {
        let mut path: Vec<usize> = Vec::new();
        let mut current = start;

        let found = loop {
            match walks[current] {
                Walk::OnPath => {
                    let from = path.iter().position(|&seen| seen == current).unwrap_or(0);
                    break path[from..].iter().copied().min();
                }
                Walk::Done => break None,
                Walk::Unseen => {}
            }
            let comment = &self.comments[current];
            if placed[current] || !comment.approval.is_approved() {
                break None;
            }
            walks[current] = Walk::OnPath;
            path.push(current);
            match comment.parent.and_then(|parent| self.by_id.get(&parent)) {
                Some(&next) => current = next,
                None => break None,
            }
        };

        for &position in &path {
            walks[position] = Walk::Done;
        }
        found
    }
}
