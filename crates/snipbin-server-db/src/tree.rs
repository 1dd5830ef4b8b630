// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Comment tree assembly.
//!
//! The store hands back a flat subtree (one recursive CTE, see
//! `CommentRepository::subtree`); this module is the single in-memory
//! construction site that turns the flat rows into the nested reply tree.
//! The flat set is grouped by parent id once, so assembly is linear in the
//! number of comments rather than quadratic.

use std::collections::HashMap;

use snipbin_common_model::{Comment, CommentId};

/// Assemble the reply tree rooted at `root_id` from a flat, pre-scoped
/// collection of comments.
///
/// Returns `None` when the root is absent from the input (a deletion race,
/// not an error). Comments whose parent lies outside the root's subtree are
/// never visited. Children are ordered by ascending creation time.
pub fn build_reply_tree(root_id: CommentId, comments: Vec<Comment>) -> Option<Comment> {
	let mut by_parent: HashMap<CommentId, Vec<Comment>> = HashMap::new();
	let mut root: Option<Comment> = None;

	for comment in comments {
		if comment.id == root_id {
			root = Some(comment);
		} else if let Some(parent_id) = comment.parent_id {
			by_parent.entry(parent_id).or_default().push(comment);
		}
	}

	let mut root = root?;
	attach_replies(&mut root, &mut by_parent);
	Some(root)
}

fn attach_replies(node: &mut Comment, by_parent: &mut HashMap<CommentId, Vec<Comment>>) {
	let Some(mut children) = by_parent.remove(&node.id) else {
		return;
	};
	children.sort_by_key(|c| c.created_at);
	node.replies.clear();
	for mut child in children {
		attach_replies(&mut child, by_parent);
		node.replies.push(child);
	}
}

/// Flatten a tree back into its comments in preorder, with empty `replies`
/// collections. The inverse of [`build_reply_tree`] up to child ordering.
pub fn flatten(root: &Comment) -> Vec<Comment> {
	let mut out = Vec::new();
	flatten_into(root, &mut out);
	out
}

fn flatten_into(node: &Comment, out: &mut Vec<Comment>) {
	let mut bare = node.clone();
	bare.replies = Vec::new();
	out.push(bare);
	for reply in &node.replies {
		flatten_into(reply, out);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use proptest::prelude::*;
	use snipbin_common_model::{SnippetId, UserId};

	fn root() -> Comment {
		Comment::new_root(SnippetId::generate(), UserId::generate(), "root")
	}

	#[test]
	fn missing_root_yields_none() {
		let c = root();
		assert!(build_reply_tree(CommentId::generate(), vec![c]).is_none());
		assert!(build_reply_tree(CommentId::generate(), Vec::new()).is_none());
	}

	#[test]
	fn single_comment_tree() {
		let c = root();
		let tree = build_reply_tree(c.id, vec![c.clone()]).unwrap();
		assert_eq!(tree.id, c.id);
		assert!(tree.replies.is_empty());
	}

	#[test]
	fn three_level_chain_assembles_nested() {
		let a = root();
		let b = Comment::new_reply(&a, UserId::generate(), "b");
		let c = Comment::new_reply(&b, UserId::generate(), "c");

		let tree = build_reply_tree(a.id, vec![c.clone(), a.clone(), b.clone()]).unwrap();
		assert_eq!(tree.id, a.id);
		assert_eq!(tree.replies.len(), 1);
		assert_eq!(tree.replies[0].id, b.id);
		assert_eq!(tree.replies[0].replies.len(), 1);
		assert_eq!(tree.replies[0].replies[0].id, c.id);
	}

	#[test]
	fn children_ordered_by_creation_time() {
		let a = root();
		let mut first = Comment::new_reply(&a, UserId::generate(), "first");
		let mut second = Comment::new_reply(&a, UserId::generate(), "second");
		first.created_at = a.created_at + Duration::seconds(1);
		second.created_at = a.created_at + Duration::seconds(2);

		// Supply out of order.
		let tree = build_reply_tree(a.id, vec![second.clone(), a.clone(), first.clone()]).unwrap();
		assert_eq!(tree.replies[0].id, first.id);
		assert_eq!(tree.replies[1].id, second.id);
	}

	#[test]
	fn comments_outside_subtree_are_ignored() {
		let a = root();
		let stray_parent = root();
		let stray = Comment::new_reply(&stray_parent, UserId::generate(), "stray");

		let tree = build_reply_tree(a.id, vec![a.clone(), stray]).unwrap();
		assert!(tree.replies.is_empty());
	}

	/// Grow a random tree by repeatedly replying to a uniformly chosen
	/// existing node, with strictly increasing creation times.
	fn grow_tree(reply_targets: &[usize]) -> Comment {
		let mut flat = vec![root()];
		for (i, &target) in reply_targets.iter().enumerate() {
			let parent = flat[target % flat.len()].clone();
			let mut reply = Comment::new_reply(&parent, UserId::generate(), format!("r{i}"));
			reply.created_at = parent.created_at + Duration::seconds(i as i64 + 1);
			flat.push(reply);
		}
		let root_id = flat[0].id;
		build_reply_tree(root_id, flat).expect("root is always present")
	}

	fn assert_isomorphic(node: &Comment) {
		for reply in &node.replies {
			assert_eq!(reply.parent_id, Some(node.id));
			assert_eq!(reply.depth, node.depth + 1);
			let mut expected_path = node.path.clone();
			expected_path.push(node.id);
			assert_eq!(reply.path, expected_path);
			assert_isomorphic(reply);
		}
		for pair in node.replies.windows(2) {
			assert!(pair[0].created_at <= pair[1].created_at);
		}
	}

	proptest! {
		#[test]
		fn round_trip_reproduces_the_tree(targets in prop::collection::vec(0usize..50, 0..40)) {
			let tree = grow_tree(&targets);
			let flat = flatten(&tree);
			prop_assert_eq!(flat.len(), targets.len() + 1);

			let rebuilt = build_reply_tree(tree.id, flat).expect("root present");
			let original = flatten(&tree);
			let rebuilt_flat = flatten(&rebuilt);

			prop_assert_eq!(original.len(), rebuilt_flat.len());
			for (a, b) in original.iter().zip(rebuilt_flat.iter()) {
				prop_assert_eq!(a.id, b.id);
				prop_assert_eq!(a.parent_id, b.parent_id);
				prop_assert_eq!(a.depth, b.depth);
			}
			assert_isomorphic(&rebuilt);
		}
	}
}
