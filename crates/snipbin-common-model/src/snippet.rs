// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Snippet, tag, and snippet-version domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SnippetId, SnippetVersionId, TagId, UserId};

/// A shared code snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
	pub id: SnippetId,
	pub author_id: UserId,
	pub title: String,
	pub description: Option<String>,
	pub language: String,
	pub content: String,
	pub is_public: bool,
	/// Denormalized view counter, incremented atomically in the store.
	pub view_count: i32,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deleted_at: Option<DateTime<Utc>>,
	/// Associated tags, populated by join queries; empty otherwise.
	#[serde(default)]
	pub tags: Vec<Tag>,
}

impl Snippet {
	pub fn new(
		author_id: UserId,
		title: impl Into<String>,
		language: impl Into<String>,
		content: impl Into<String>,
	) -> Self {
		let now = Utc::now();
		Self {
			id: SnippetId::generate(),
			author_id,
			title: title.into(),
			description: None,
			language: language.into(),
			content: content.into(),
			is_public: false,
			view_count: 0,
			created_at: now,
			updated_at: now,
			deleted_at: None,
			tags: Vec::new(),
		}
	}
}

/// A label attachable to any number of snippets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
	pub id: TagId,
	pub name: String,
	pub created_at: DateTime<Utc>,
}

impl Tag {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			id: TagId::generate(),
			name: name.into(),
			created_at: Utc::now(),
		}
	}
}

/// Immutable snapshot of a snippet at a point in time.
///
/// Version numbers are strictly increasing per snippet, starting at 1. A
/// version is never mutated after creation and is only deleted in bulk
/// alongside its owning snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetVersion {
	pub id: SnippetVersionId,
	pub snippet_id: SnippetId,
	pub version: i32,
	pub title: String,
	pub language: String,
	pub content: String,
	pub created_by: UserId,
	pub created_at: DateTime<Utc>,
}

/// Per-tag usage count, produced by the tag statistics query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagUsage {
	pub tag: Tag,
	pub snippet_count: i64,
}
