// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Comment domain model.
//!
//! Comments form a tree per snippet: a root comment has depth 0 and an empty
//! materialized path; a reply carries depth = parent depth + 1 and a path
//! equal to the parent's path extended by the parent's own id. The `replies`
//! collection is only populated after tree assembly; it is empty on a comment
//! fetched in isolation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CommentId, CommentLikeId, SnippetId, UserId};

/// Moderation status of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
	Visible,
	Pending,
	Deleted,
}

impl CommentStatus {
	/// Integer code as stored in the database.
	pub fn code(self) -> i32 {
		match self {
			CommentStatus::Visible => 0,
			CommentStatus::Pending => 1,
			CommentStatus::Deleted => 2,
		}
	}

	/// Decode a stored integer code. Returns `None` for unknown codes.
	pub fn from_code(code: i32) -> Option<Self> {
		match code {
			0 => Some(CommentStatus::Visible),
			1 => Some(CommentStatus::Pending),
			2 => Some(CommentStatus::Deleted),
			_ => None,
		}
	}
}

/// One node in the discussion attached to a snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
	pub id: CommentId,
	pub snippet_id: SnippetId,
	pub author_id: UserId,
	pub parent_id: Option<CommentId>,
	pub content: String,
	/// Ordered ancestor chain, root first, excluding this comment itself.
	pub path: Vec<CommentId>,
	/// Distance from the root of the tree; root = 0.
	pub depth: i32,
	/// Denormalized cache of the number of `CommentLike` rows.
	pub like_count: i32,
	/// Denormalized cache of the number of direct child comments.
	pub reply_count: i32,
	pub status: CommentStatus,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deleted_at: Option<DateTime<Utc>>,
	/// Direct replies, populated only by tree assembly.
	#[serde(default)]
	pub replies: Vec<Comment>,
}

impl Comment {
	/// Create a new root comment (depth 0, empty path).
	pub fn new_root(snippet_id: SnippetId, author_id: UserId, content: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: CommentId::generate(),
			snippet_id,
			author_id,
			parent_id: None,
			content: content.into(),
			path: Vec::new(),
			depth: 0,
			like_count: 0,
			reply_count: 0,
			status: CommentStatus::Visible,
			created_at: now,
			updated_at: now,
			deleted_at: None,
			replies: Vec::new(),
		}
	}

	/// Create a reply to `parent`, deriving depth and materialized path from
	/// the parent's current values.
	pub fn new_reply(parent: &Comment, author_id: UserId, content: impl Into<String>) -> Self {
		let now = Utc::now();
		let mut path = parent.path.clone();
		path.push(parent.id);
		Self {
			id: CommentId::generate(),
			snippet_id: parent.snippet_id,
			author_id,
			parent_id: Some(parent.id),
			content: content.into(),
			path,
			depth: parent.depth + 1,
			like_count: 0,
			reply_count: 0,
			status: CommentStatus::Visible,
			created_at: now,
			updated_at: now,
			deleted_at: None,
			replies: Vec::new(),
		}
	}

	/// Whether this comment has been soft-deleted.
	pub fn is_deleted(&self) -> bool {
		self.deleted_at.is_some()
	}
}

/// Exactly one (user, comment) like relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentLike {
	pub id: CommentLikeId,
	pub comment_id: CommentId,
	pub user_id: UserId,
	pub created_at: DateTime<Utc>,
}

impl CommentLike {
	pub fn new(comment_id: CommentId, user_id: UserId) -> Self {
		Self {
			id: CommentLikeId::generate(),
			comment_id,
			user_id,
			created_at: Utc::now(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn root_comment_has_depth_zero_and_empty_path() {
		let c = Comment::new_root(SnippetId::generate(), UserId::generate(), "first");
		assert_eq!(c.depth, 0);
		assert!(c.path.is_empty());
		assert!(c.parent_id.is_none());
	}

	#[test]
	fn reply_derives_depth_and_path_from_parent() {
		let root = Comment::new_root(SnippetId::generate(), UserId::generate(), "root");
		let reply = Comment::new_reply(&root, UserId::generate(), "reply");
		assert_eq!(reply.depth, root.depth + 1);
		assert_eq!(reply.path, vec![root.id]);
		assert_eq!(reply.parent_id, Some(root.id));
		assert_eq!(reply.snippet_id, root.snippet_id);

		let nested = Comment::new_reply(&reply, UserId::generate(), "nested");
		assert_eq!(nested.depth, 2);
		assert_eq!(nested.path, vec![root.id, reply.id]);
	}

	#[test]
	fn status_codes_round_trip() {
		for status in [
			CommentStatus::Visible,
			CommentStatus::Pending,
			CommentStatus::Deleted,
		] {
			assert_eq!(CommentStatus::from_code(status.code()), Some(status));
		}
		assert_eq!(CommentStatus::from_code(99), None);
	}
}
