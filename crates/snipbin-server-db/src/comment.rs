// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Comment repository for database operations.
//!
//! Comments form a per-snippet reply tree stored with parent linkage plus a
//! materialized path and depth. Subtree reads fetch the flat descendant set
//! with one recursive CTE and assemble the nested structure in memory
//! (see [`crate::tree`]); ancestor reads walk parent links upward.
//!
//! Counter policy: creating a reply increments the parent's reply counter in
//! the same logical operation; deleting a comment does not decrement it.
//! `recount_replies`/`recount_likes` expose the true association counts so
//! the denormalized caches can be audited.

use async_trait::async_trait;
use chrono::Utc;
use snipbin_common_model::{
	Comment, CommentId, CommentLike, CommentLikeId, CommentStatus, SnippetId, UserId,
};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::error::DbError;
use crate::filter::{bind_all, FilterClause, Pagination, SqlArg};
use crate::mapper::fold_joined_rows;
use crate::page::Page;
use crate::row::{
	decode_enum, decode_i32, decode_id, decode_opt_id, decode_opt_timestamp, decode_text,
	decode_timestamp, from_sqlite_row, SqlRow,
};
use crate::tree;

const COMMENT_COLUMNS: &str = "id, snippet_id, author_id, parent_id, content, path, depth, \
	 like_count, reply_count, status, created_at, updated_at, deleted_at";

/// Optional filters for comment listings. Absent fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
	pub author_id: Option<UserId>,
	pub status: Option<CommentStatus>,
	/// Substring match over the comment content.
	pub search: Option<String>,
	/// Restrict to root comments (depth 0).
	pub roots_only: bool,
}

impl CommentFilter {
	fn clause(&self, snippet_id: &SnippetId) -> FilterClause {
		let mut clause = FilterClause::new();
		clause.push_static("deleted_at IS NULL");
		clause.push("snippet_id = ?", SqlArg::Text(snippet_id.to_string()));
		if let Some(author_id) = &self.author_id {
			clause.push("author_id = ?", SqlArg::Text(author_id.to_string()));
		}
		if let Some(status) = self.status {
			clause.push("status = ?", SqlArg::Int(i64::from(status.code())));
		}
		if let Some(search) = &self.search {
			clause.push_like("content LIKE ?", search);
		}
		if self.roots_only {
			clause.push_static("parent_id IS NULL");
		}
		clause
	}
}

/// A comment together with its like rows, produced by the likes join.
#[derive(Debug, Clone)]
pub struct CommentWithLikes {
	pub comment: Comment,
	pub likes: Vec<CommentLike>,
}

/// Trait for comment database operations.
#[async_trait]
pub trait CommentStore: Send + Sync {
	async fn create(&self, comment: &Comment) -> Result<Comment, DbError>;

	async fn create_reply(
		&self,
		parent_id: &CommentId,
		author_id: &UserId,
		content: &str,
	) -> Result<Option<Comment>, DbError>;

	async fn get(&self, id: &CommentId) -> Result<Option<Comment>, DbError>;

	async fn update(&self, comment: &Comment) -> Result<Comment, DbError>;

	async fn update_content(&self, id: &CommentId, content: &str) -> Result<bool, DbError>;

	async fn soft_delete(&self, id: &CommentId) -> Result<bool, DbError>;

	async fn delete(&self, id: &CommentId) -> Result<bool, DbError>;

	async fn cleanup_orphans(&self) -> Result<u64, DbError>;

	async fn list_for_snippet(
		&self,
		snippet_id: &SnippetId,
		filter: &CommentFilter,
		page: Pagination,
	) -> Result<Page<Comment>, DbError>;

	async fn subtree(&self, root_id: &CommentId) -> Result<Vec<Comment>, DbError>;

	async fn reply_tree(&self, root_id: &CommentId) -> Result<Option<Comment>, DbError>;

	async fn ancestor_chain(&self, id: &CommentId) -> Result<Vec<Comment>, DbError>;

	async fn like(&self, comment_id: &CommentId, user_id: &UserId) -> Result<bool, DbError>;

	async fn unlike(&self, comment_id: &CommentId, user_id: &UserId) -> Result<bool, DbError>;

	async fn with_likes(&self, snippet_id: &SnippetId) -> Result<Vec<CommentWithLikes>, DbError>;

	async fn recount_replies(&self, id: &CommentId) -> Result<i64, DbError>;

	async fn recount_likes(&self, id: &CommentId) -> Result<i64, DbError>;
}

fn comment_from_row(row: &SqlRow) -> Result<Comment, DbError> {
	let path_json = decode_text("path", row.require("path")?)?;
	let path: Vec<Uuid> = serde_json::from_str(&path_json)?;

	Ok(Comment {
		id: CommentId::new(decode_id("id", row.require("id")?)?),
		snippet_id: SnippetId::new(decode_id("snippet_id", row.require("snippet_id")?)?),
		author_id: UserId::new(decode_id("author_id", row.require("author_id")?)?),
		parent_id: decode_opt_id("parent_id", row.require("parent_id")?)?.map(CommentId::new),
		content: decode_text("content", row.require("content")?)?,
		path: path.into_iter().map(CommentId::new).collect(),
		depth: decode_i32("depth", row.require("depth")?)?,
		like_count: decode_i32("like_count", row.require("like_count")?)?,
		reply_count: decode_i32("reply_count", row.require("reply_count")?)?,
		status: decode_enum("status", row.require("status")?, CommentStatus::from_code)?,
		created_at: decode_timestamp("created_at", row.require("created_at")?)?,
		updated_at: decode_timestamp("updated_at", row.require("updated_at")?)?,
		deleted_at: decode_opt_timestamp("deleted_at", row.require("deleted_at")?)?,
		replies: Vec::new(),
	})
}

fn like_from_row(row: &SqlRow) -> Result<CommentLike, DbError> {
	Ok(CommentLike {
		id: CommentLikeId::new(decode_id("like_id", row.require("like_id")?)?),
		comment_id: CommentId::new(decode_id("id", row.require("id")?)?),
		user_id: UserId::new(decode_id("like_user_id", row.require("like_user_id")?)?),
		created_at: decode_timestamp("like_created_at", row.require("like_created_at")?)?,
	})
}

/// Repository for comment database operations.
#[derive(Clone)]
pub struct CommentRepository {
	pool: SqlitePool,
}

impl CommentRepository {
	/// Create a new repository from an existing pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a comment.
	///
	/// The comment is stored exactly as built by `Comment::new_root` /
	/// `Comment::new_reply`; when it carries a parent reference, the parent's
	/// reply counter is incremented atomically as part of the same logical
	/// operation.
	#[tracing::instrument(skip(self, comment), fields(comment_id = %comment.id))]
	pub async fn create(&self, comment: &Comment) -> Result<Comment, DbError> {
		let path_json = serde_json::to_string(&comment.path)?;

		sqlx::query(
			r#"
			INSERT INTO comments (
				id, snippet_id, author_id, parent_id, content, path, depth,
				like_count, reply_count, status, created_at, updated_at, deleted_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(comment.id.to_string())
		.bind(comment.snippet_id.to_string())
		.bind(comment.author_id.to_string())
		.bind(comment.parent_id.map(|p| p.to_string()))
		.bind(&comment.content)
		.bind(&path_json)
		.bind(comment.depth)
		.bind(comment.like_count)
		.bind(comment.reply_count)
		.bind(comment.status.code())
		.bind(comment.created_at.to_rfc3339())
		.bind(comment.updated_at.to_rfc3339())
		.bind(comment.deleted_at.map(|d| d.to_rfc3339()))
		.execute(&self.pool)
		.await?;

		if let Some(parent_id) = &comment.parent_id {
			sqlx::query("UPDATE comments SET reply_count = reply_count + 1 WHERE id = ?")
				.bind(parent_id.to_string())
				.execute(&self.pool)
				.await?;
		}

		tracing::debug!(comment_id = %comment.id, depth = comment.depth, "comment created");

		self
			.get(&comment.id)
			.await?
			.ok_or_else(|| DbError::Internal("comment not found after insert".to_string()))
	}

	/// Create a reply to an existing comment.
	///
	/// The parent is read first so depth and materialized path derive from
	/// its current values. Returns `None` when the parent does not exist or
	/// has been soft-deleted.
	#[tracing::instrument(skip(self, content), fields(parent_id = %parent_id))]
	pub async fn create_reply(
		&self,
		parent_id: &CommentId,
		author_id: &UserId,
		content: &str,
	) -> Result<Option<Comment>, DbError> {
		let Some(parent) = self.get(parent_id).await? else {
			return Ok(None);
		};
		let reply = Comment::new_reply(&parent, *author_id, content);
		self.create(&reply).await.map(Some)
	}

	/// Get a comment by ID. Soft-deleted comments are not returned.
	pub async fn get(&self, id: &CommentId) -> Result<Option<Comment>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ? AND deleted_at IS NULL"
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| comment_from_row(&from_sqlite_row(&r)?)).transpose()
	}

	async fn get_including_deleted(&self, id: &CommentId) -> Result<Option<Comment>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| comment_from_row(&from_sqlite_row(&r)?)).transpose()
	}

	/// Whole-row update by identifier.
	///
	/// Updating a row that no longer exists is a no-op: the entity is
	/// returned unchanged rather than raising an error.
	#[tracing::instrument(skip(self, comment), fields(comment_id = %comment.id))]
	pub async fn update(&self, comment: &Comment) -> Result<Comment, DbError> {
		let path_json = serde_json::to_string(&comment.path)?;

		sqlx::query(
			r#"
			UPDATE comments SET
				snippet_id = ?,
				author_id = ?,
				parent_id = ?,
				content = ?,
				path = ?,
				depth = ?,
				like_count = ?,
				reply_count = ?,
				status = ?,
				updated_at = ?,
				deleted_at = ?
			WHERE id = ?
			"#,
		)
		.bind(comment.snippet_id.to_string())
		.bind(comment.author_id.to_string())
		.bind(comment.parent_id.map(|p| p.to_string()))
		.bind(&comment.content)
		.bind(&path_json)
		.bind(comment.depth)
		.bind(comment.like_count)
		.bind(comment.reply_count)
		.bind(comment.status.code())
		.bind(comment.updated_at.to_rfc3339())
		.bind(comment.deleted_at.map(|d| d.to_rfc3339()))
		.bind(comment.id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(comment.clone())
	}

	/// Edit a comment's content, stamping `updated_at`.
	#[tracing::instrument(skip(self, content), fields(comment_id = %id))]
	pub async fn update_content(&self, id: &CommentId, content: &str) -> Result<bool, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			"UPDATE comments SET content = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
		)
		.bind(content)
		.bind(&now)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Soft-delete a comment: its likes are removed first, then the comment
	/// is marked deleted, in program order on the same pool.
	///
	/// The parent's reply counter is deliberately left untouched.
	#[tracing::instrument(skip(self), fields(comment_id = %id))]
	pub async fn soft_delete(&self, id: &CommentId) -> Result<bool, DbError> {
		sqlx::query("DELETE FROM comment_likes WHERE comment_id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			UPDATE comments
			SET status = ?, deleted_at = ?, like_count = 0
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(CommentStatus::Deleted.code())
		.bind(&now)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::debug!(comment_id = %id, "comment soft-deleted");
		}
		Ok(deleted)
	}

	/// Hard-delete a comment and its likes.
	#[tracing::instrument(skip(self), fields(comment_id = %id))]
	pub async fn delete(&self, id: &CommentId) -> Result<bool, DbError> {
		sqlx::query("DELETE FROM comment_likes WHERE comment_id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		let result = sqlx::query("DELETE FROM comments WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::debug!(comment_id = %id, "comment hard-deleted");
		}
		Ok(deleted)
	}

	/// Remove comments whose parent row no longer exists, and likes whose
	/// comment no longer exists. Repeats until a pass deletes nothing, so
	/// dangling chains are fully collected.
	#[tracing::instrument(skip(self))]
	pub async fn cleanup_orphans(&self) -> Result<u64, DbError> {
		let mut total = 0u64;
		loop {
			let result = sqlx::query(
				r#"
				DELETE FROM comments
				WHERE parent_id IS NOT NULL
				  AND parent_id NOT IN (SELECT id FROM comments)
				"#,
			)
			.execute(&self.pool)
			.await?;

			if result.rows_affected() == 0 {
				break;
			}
			total += result.rows_affected();
		}

		let likes = sqlx::query(
			"DELETE FROM comment_likes WHERE comment_id NOT IN (SELECT id FROM comments)",
		)
		.execute(&self.pool)
		.await?;
		total += likes.rows_affected();

		if total > 0 {
			tracing::info!(removed = total, "orphaned comment rows cleaned up");
		}
		Ok(total)
	}

	/// Paginated, filtered listing of a snippet's comments. The count query
	/// and the data query share the same WHERE clause and parameter bag.
	#[tracing::instrument(skip(self, filter), fields(snippet_id = %snippet_id))]
	pub async fn list_for_snippet(
		&self,
		snippet_id: &SnippetId,
		filter: &CommentFilter,
		page: Pagination,
	) -> Result<Page<Comment>, DbError> {
		let clause = filter.clause(snippet_id);
		let where_sql = clause.where_sql();

		let count_sql = format!("SELECT COUNT(*) FROM comments WHERE {where_sql}");
		let count_row = bind_all(sqlx::query(&count_sql), clause.args())
			.fetch_one(&self.pool)
			.await?;
		let total: i64 = sqlx::Row::get(&count_row, 0);

		let data_sql = format!(
			"SELECT {COMMENT_COLUMNS} FROM comments WHERE {where_sql} \
			 ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?"
		);
		let rows = bind_all(sqlx::query(&data_sql), clause.args())
			.bind(page.limit())
			.bind(page.offset())
			.fetch_all(&self.pool)
			.await?;

		let mut items = Vec::with_capacity(rows.len());
		for row in rows {
			items.push(comment_from_row(&from_sqlite_row(&row)?)?);
		}

		Ok(Page::new(items, total, page.page(), page.page_size()))
	}

	/// Fetch the flat subtree rooted at `root_id` with one recursive CTE.
	///
	/// The store does the recursive walk; the nested structure is assembled
	/// exactly once, in memory, by [`crate::tree::build_reply_tree`].
	///
	/// Soft-deleted nodes are included as tombstones: excluding them would
	/// sever their live descendants from the tree. Callers render them via
	/// `Comment::is_deleted`.
	#[tracing::instrument(skip(self), fields(root_id = %root_id))]
	pub async fn subtree(&self, root_id: &CommentId) -> Result<Vec<Comment>, DbError> {
		let rows = sqlx::query(&format!(
			r#"
			WITH RECURSIVE subtree(id) AS (
				SELECT id FROM comments WHERE id = ?
				UNION ALL
				SELECT c.id FROM comments c JOIN subtree s ON c.parent_id = s.id
			)
			SELECT {COMMENT_COLUMNS}
			FROM comments
			WHERE id IN (SELECT id FROM subtree)
			ORDER BY created_at ASC, id ASC
			"#
		))
		.bind(root_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let mut comments = Vec::with_capacity(rows.len());
		for row in rows {
			comments.push(comment_from_row(&from_sqlite_row(&row)?)?);
		}
		Ok(comments)
	}

	/// Assemble the full reply tree rooted at `root_id`.
	///
	/// Returns `None` when the root row does not exist (hard-deleted while
	/// the caller held its id). A soft-deleted root comes back as a
	/// tombstone with its surviving replies attached.
	pub async fn reply_tree(&self, root_id: &CommentId) -> Result<Option<Comment>, DbError> {
		let flat = self.subtree(root_id).await?;
		Ok(tree::build_reply_tree(*root_id, flat))
	}

	/// Walk parent links upward from `id`, producing the chain from the
	/// ultimate root down to the given comment, ordered by ascending depth.
	///
	/// A root input yields a chain of length one. A dangling parent
	/// reference ends the walk at the last resolvable node.
	#[tracing::instrument(skip(self), fields(comment_id = %id))]
	pub async fn ancestor_chain(&self, id: &CommentId) -> Result<Vec<Comment>, DbError> {
		let Some(leaf) = self.get_including_deleted(id).await? else {
			return Ok(Vec::new());
		};

		let mut chain = vec![leaf];
		let mut visited = std::collections::HashSet::new();
		visited.insert(*id);

		loop {
			let Some(parent_id) = chain
				.last()
				.and_then(|c| c.parent_id)
				.filter(|p| !visited.contains(p))
			else {
				break;
			};
			match self.get_including_deleted(&parent_id).await? {
				Some(parent) => {
					visited.insert(parent_id);
					chain.push(parent);
				}
				// Dangling parent reference: data-integrity edge, not an error.
				None => break,
			}
		}

		chain.reverse();
		Ok(chain)
	}

	/// Record a like for (comment, user). Returns `false` when the pair has
	/// already been recorded; otherwise inserts the like and increments the
	/// comment's like counter atomically.
	#[tracing::instrument(skip(self), fields(comment_id = %comment_id, user_id = %user_id))]
	pub async fn like(&self, comment_id: &CommentId, user_id: &UserId) -> Result<bool, DbError> {
		let existing = sqlx::query(
			"SELECT 1 FROM comment_likes WHERE comment_id = ? AND user_id = ?",
		)
		.bind(comment_id.to_string())
		.bind(user_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		if existing.is_some() {
			return Ok(false);
		}

		let like = CommentLike::new(*comment_id, *user_id);
		sqlx::query(
			"INSERT INTO comment_likes (id, comment_id, user_id, created_at) VALUES (?, ?, ?, ?)",
		)
		.bind(like.id.to_string())
		.bind(like.comment_id.to_string())
		.bind(like.user_id.to_string())
		.bind(like.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		sqlx::query("UPDATE comments SET like_count = like_count + 1 WHERE id = ?")
			.bind(comment_id.to_string())
			.execute(&self.pool)
			.await?;

		tracing::debug!(comment_id = %comment_id, "comment liked");
		Ok(true)
	}

	/// Remove a like for (comment, user). Returns `false` when no like
	/// existed. The counter never goes below zero.
	#[tracing::instrument(skip(self), fields(comment_id = %comment_id, user_id = %user_id))]
	pub async fn unlike(&self, comment_id: &CommentId, user_id: &UserId) -> Result<bool, DbError> {
		let result = sqlx::query(
			"DELETE FROM comment_likes WHERE comment_id = ? AND user_id = ?",
		)
		.bind(comment_id.to_string())
		.bind(user_id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Ok(false);
		}

		sqlx::query(
			"UPDATE comments SET like_count = like_count - 1 WHERE id = ? AND like_count > 0",
		)
		.bind(comment_id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(true)
	}

	/// Fetch a snippet's comments with their like rows attached, folding the
	/// LEFT JOIN result through [`fold_joined_rows`].
	#[tracing::instrument(skip(self), fields(snippet_id = %snippet_id))]
	pub async fn with_likes(
		&self,
		snippet_id: &SnippetId,
	) -> Result<Vec<CommentWithLikes>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT c.id, c.snippet_id, c.author_id, c.parent_id, c.content, c.path,
			       c.depth, c.like_count, c.reply_count, c.status,
			       c.created_at, c.updated_at, c.deleted_at,
			       l.id AS like_id, l.user_id AS like_user_id, l.created_at AS like_created_at
			FROM comments c
			LEFT JOIN comment_likes l ON l.comment_id = c.id
			WHERE c.snippet_id = ? AND c.deleted_at IS NULL
			ORDER BY c.created_at ASC, c.id ASC
			"#,
		)
		.bind(snippet_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let mut sql_rows = Vec::with_capacity(rows.len());
		for row in &rows {
			sql_rows.push(from_sqlite_row(row)?);
		}

		fold_joined_rows(
			&sql_rows,
			"id",
			"like_id",
			|row| {
				Ok(CommentWithLikes {
					comment: comment_from_row(row)?,
					likes: Vec::new(),
				})
			},
			like_from_row,
			|parent, like| parent.likes.push(like),
		)
	}

	/// True count of direct (non-deleted) children; audits `reply_count`.
	pub async fn recount_replies(&self, id: &CommentId) -> Result<i64, DbError> {
		let count: (i64,) = sqlx::query_as(
			"SELECT COUNT(*) FROM comments WHERE parent_id = ? AND deleted_at IS NULL",
		)
		.bind(id.to_string())
		.fetch_one(&self.pool)
		.await?;
		Ok(count.0)
	}

	/// True count of like rows; audits `like_count`.
	pub async fn recount_likes(&self, id: &CommentId) -> Result<i64, DbError> {
		let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comment_likes WHERE comment_id = ?")
			.bind(id.to_string())
			.fetch_one(&self.pool)
			.await?;
		Ok(count.0)
	}
}

#[async_trait]
impl CommentStore for CommentRepository {
	async fn create(&self, comment: &Comment) -> Result<Comment, DbError> {
		CommentRepository::create(self, comment).await
	}

	async fn create_reply(
		&self,
		parent_id: &CommentId,
		author_id: &UserId,
		content: &str,
	) -> Result<Option<Comment>, DbError> {
		CommentRepository::create_reply(self, parent_id, author_id, content).await
	}

	async fn get(&self, id: &CommentId) -> Result<Option<Comment>, DbError> {
		CommentRepository::get(self, id).await
	}

	async fn update(&self, comment: &Comment) -> Result<Comment, DbError> {
		CommentRepository::update(self, comment).await
	}

	async fn update_content(&self, id: &CommentId, content: &str) -> Result<bool, DbError> {
		CommentRepository::update_content(self, id, content).await
	}

	async fn soft_delete(&self, id: &CommentId) -> Result<bool, DbError> {
		CommentRepository::soft_delete(self, id).await
	}

	async fn delete(&self, id: &CommentId) -> Result<bool, DbError> {
		CommentRepository::delete(self, id).await
	}

	async fn cleanup_orphans(&self) -> Result<u64, DbError> {
		CommentRepository::cleanup_orphans(self).await
	}

	async fn list_for_snippet(
		&self,
		snippet_id: &SnippetId,
		filter: &CommentFilter,
		page: Pagination,
	) -> Result<Page<Comment>, DbError> {
		CommentRepository::list_for_snippet(self, snippet_id, filter, page).await
	}

	async fn subtree(&self, root_id: &CommentId) -> Result<Vec<Comment>, DbError> {
		CommentRepository::subtree(self, root_id).await
	}

	async fn reply_tree(&self, root_id: &CommentId) -> Result<Option<Comment>, DbError> {
		CommentRepository::reply_tree(self, root_id).await
	}

	async fn ancestor_chain(&self, id: &CommentId) -> Result<Vec<Comment>, DbError> {
		CommentRepository::ancestor_chain(self, id).await
	}

	async fn like(&self, comment_id: &CommentId, user_id: &UserId) -> Result<bool, DbError> {
		CommentRepository::like(self, comment_id, user_id).await
	}

	async fn unlike(&self, comment_id: &CommentId, user_id: &UserId) -> Result<bool, DbError> {
		CommentRepository::unlike(self, comment_id, user_id).await
	}

	async fn with_likes(&self, snippet_id: &SnippetId) -> Result<Vec<CommentWithLikes>, DbError> {
		CommentRepository::with_likes(self, snippet_id).await
	}

	async fn recount_replies(&self, id: &CommentId) -> Result<i64, DbError> {
		CommentRepository::recount_replies(self, id).await
	}

	async fn recount_likes(&self, id: &CommentId) -> Result<i64, DbError> {
		CommentRepository::recount_likes(self, id).await
	}
}
