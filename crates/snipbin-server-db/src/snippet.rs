// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Snippet repository for database operations.
//!
//! Single-snippet reads join the tag tables and fold the repeated parent
//! columns through [`fold_joined_rows`]; listings share one WHERE clause
//! between the count query and the windowed data query. Tag replacement is
//! the one multi-statement write that must be all-or-nothing and runs inside
//! a transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snipbin_common_model::{Snippet, SnippetId, Tag, TagId, UserId};
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;
use crate::filter::{bind_all, FilterClause, Pagination, SqlArg};
use crate::mapper::fold_joined_rows;
use crate::page::Page;
use crate::row::{
	decode_bool, decode_i32, decode_id, decode_opt_text, decode_opt_timestamp, decode_text,
	decode_timestamp, from_sqlite_row, SqlRow,
};

const SNIPPET_COLUMNS: &str = "id, author_id, title, description, language, content, \
	 is_public, view_count, created_at, updated_at, deleted_at";

/// Optional filters for snippet listings. Absent fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SnippetFilter {
	/// Substring match over title and description.
	pub search: Option<String>,
	pub language: Option<String>,
	pub author_id: Option<UserId>,
	pub is_public: Option<bool>,
	pub created_after: Option<DateTime<Utc>>,
	pub created_before: Option<DateTime<Utc>>,
}

impl SnippetFilter {
	fn clause(&self) -> FilterClause {
		let mut clause = FilterClause::new();
		clause.push_static("deleted_at IS NULL");
		if let Some(search) = &self.search {
			let needle = format!("%{search}%");
			clause.push_with(
				"(title LIKE ? OR description LIKE ?)",
				[SqlArg::Text(needle.clone()), SqlArg::Text(needle)],
			);
		}
		if let Some(language) = &self.language {
			clause.push("language = ?", SqlArg::Text(language.clone()));
		}
		if let Some(author_id) = &self.author_id {
			clause.push("author_id = ?", SqlArg::Text(author_id.to_string()));
		}
		if let Some(is_public) = self.is_public {
			clause.push("is_public = ?", SqlArg::Bool(is_public));
		}
		if let Some(after) = &self.created_after {
			clause.push("created_at >= ?", SqlArg::Text(after.to_rfc3339()));
		}
		if let Some(before) = &self.created_before {
			clause.push("created_at <= ?", SqlArg::Text(before.to_rfc3339()));
		}
		clause
	}
}

/// Trait for snippet database operations.
#[async_trait]
pub trait SnippetStore: Send + Sync {
	async fn create(&self, snippet: &Snippet) -> Result<Snippet, DbError>;

	async fn get(&self, id: &SnippetId) -> Result<Option<Snippet>, DbError>;

	async fn update(&self, snippet: &Snippet) -> Result<Snippet, DbError>;

	async fn soft_delete(&self, id: &SnippetId) -> Result<bool, DbError>;

	async fn delete(&self, id: &SnippetId) -> Result<bool, DbError>;

	async fn list(&self, filter: &SnippetFilter, page: Pagination) -> Result<Page<Snippet>, DbError>;

	async fn increment_view_count(&self, id: &SnippetId) -> Result<bool, DbError>;

	async fn replace_tags(&self, id: &SnippetId, tag_ids: &[TagId]) -> Result<(), DbError>;
}

fn snippet_from_row(row: &SqlRow) -> Result<Snippet, DbError> {
	Ok(Snippet {
		id: SnippetId::new(decode_id("id", row.require("id")?)?),
		author_id: UserId::new(decode_id("author_id", row.require("author_id")?)?),
		title: decode_text("title", row.require("title")?)?,
		description: decode_opt_text("description", row.require("description")?)?,
		language: decode_text("language", row.require("language")?)?,
		content: decode_text("content", row.require("content")?)?,
		is_public: decode_bool("is_public", row.require("is_public")?)?,
		view_count: decode_i32("view_count", row.require("view_count")?)?,
		created_at: decode_timestamp("created_at", row.require("created_at")?)?,
		updated_at: decode_timestamp("updated_at", row.require("updated_at")?)?,
		deleted_at: decode_opt_timestamp("deleted_at", row.require("deleted_at")?)?,
		tags: Vec::new(),
	})
}

fn joined_tag_from_row(row: &SqlRow) -> Result<Tag, DbError> {
	Ok(Tag {
		id: TagId::new(decode_id("tag_id", row.require("tag_id")?)?),
		name: decode_text("tag_name", row.require("tag_name")?)?,
		created_at: decode_timestamp("tag_created_at", row.require("tag_created_at")?)?,
	})
}

/// Repository for snippet database operations.
#[derive(Clone)]
pub struct SnippetRepository {
	pool: SqlitePool,
}

impl SnippetRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, snippet), fields(snippet_id = %snippet.id))]
	pub async fn create(&self, snippet: &Snippet) -> Result<Snippet, DbError> {
		sqlx::query(&format!(
			"INSERT INTO snippets ({SNIPPET_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
		))
		.bind(snippet.id.to_string())
		.bind(snippet.author_id.to_string())
		.bind(&snippet.title)
		.bind(snippet.description.as_deref())
		.bind(&snippet.language)
		.bind(&snippet.content)
		.bind(snippet.is_public)
		.bind(snippet.view_count)
		.bind(snippet.created_at.to_rfc3339())
		.bind(snippet.updated_at.to_rfc3339())
		.bind(snippet.deleted_at.map(|d| d.to_rfc3339()))
		.execute(&self.pool)
		.await?;

		tracing::debug!(snippet_id = %snippet.id, "snippet created");
		Ok(snippet.clone())
	}

	/// Get a snippet with its tags attached. Soft-deleted snippets are not
	/// returned. The LEFT JOIN repeats the snippet columns per tag row; the
	/// fold collapses them back into one entity.
	#[tracing::instrument(skip(self), fields(snippet_id = %id))]
	pub async fn get(&self, id: &SnippetId) -> Result<Option<Snippet>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT s.id, s.author_id, s.title, s.description, s.language, s.content,
			       s.is_public, s.view_count, s.created_at, s.updated_at, s.deleted_at,
			       t.id AS tag_id, t.name AS tag_name, t.created_at AS tag_created_at
			FROM snippets s
			LEFT JOIN snippet_tags st ON st.snippet_id = s.id
			LEFT JOIN tags t ON t.id = st.tag_id
			WHERE s.id = ? AND s.deleted_at IS NULL
			ORDER BY t.name ASC
			"#,
		)
		.bind(id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let mut sql_rows = Vec::with_capacity(rows.len());
		for row in &rows {
			sql_rows.push(from_sqlite_row(row)?);
		}

		let mut snippets = fold_joined_rows(
			&sql_rows,
			"id",
			"tag_id",
			snippet_from_row,
			joined_tag_from_row,
			|snippet, tag| snippet.tags.push(tag),
		)?;

		Ok(snippets.pop())
	}

	/// Whole-row update by identifier; a no-op when the row is absent. Tag
	/// associations are managed separately via [`Self::replace_tags`].
	#[tracing::instrument(skip(self, snippet), fields(snippet_id = %snippet.id))]
	pub async fn update(&self, snippet: &Snippet) -> Result<Snippet, DbError> {
		sqlx::query(
			r#"
			UPDATE snippets SET
				title = ?,
				description = ?,
				language = ?,
				content = ?,
				is_public = ?,
				updated_at = ?,
				deleted_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&snippet.title)
		.bind(snippet.description.as_deref())
		.bind(&snippet.language)
		.bind(&snippet.content)
		.bind(snippet.is_public)
		.bind(snippet.updated_at.to_rfc3339())
		.bind(snippet.deleted_at.map(|d| d.to_rfc3339()))
		.bind(snippet.id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(snippet.clone())
	}

	#[tracing::instrument(skip(self), fields(snippet_id = %id))]
	pub async fn soft_delete(&self, id: &SnippetId) -> Result<bool, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			"UPDATE snippets SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
		)
		.bind(&now)
		.bind(&now)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::debug!(snippet_id = %id, "snippet soft-deleted");
		}
		Ok(deleted)
	}

	/// Hard-delete a snippet and its tag associations. Version history is
	/// purged separately via `SnippetVersionRepository::delete_for_snippet`.
	#[tracing::instrument(skip(self), fields(snippet_id = %id))]
	pub async fn delete(&self, id: &SnippetId) -> Result<bool, DbError> {
		sqlx::query("DELETE FROM snippet_tags WHERE snippet_id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		let result = sqlx::query("DELETE FROM snippets WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::debug!(snippet_id = %id, "snippet hard-deleted");
		}
		Ok(deleted)
	}

	/// Paginated, filtered listing. Tags are loaded per returned item; the
	/// window is small, so the extra queries stay bounded by the page size.
	#[tracing::instrument(skip(self, filter))]
	pub async fn list(
		&self,
		filter: &SnippetFilter,
		page: Pagination,
	) -> Result<Page<Snippet>, DbError> {
		let clause = filter.clause();
		let where_sql = clause.where_sql();

		let count_sql = format!("SELECT COUNT(*) FROM snippets WHERE {where_sql}");
		let count_row = bind_all(sqlx::query(&count_sql), clause.args())
			.fetch_one(&self.pool)
			.await?;
		let total: i64 = sqlx::Row::get(&count_row, 0);

		let data_sql = format!(
			"SELECT {SNIPPET_COLUMNS} FROM snippets WHERE {where_sql} \
			 ORDER BY created_at DESC, id ASC LIMIT ? OFFSET ?"
		);
		let rows = bind_all(sqlx::query(&data_sql), clause.args())
			.bind(page.limit())
			.bind(page.offset())
			.fetch_all(&self.pool)
			.await?;

		let mut items = Vec::with_capacity(rows.len());
		for row in rows {
			let mut snippet = snippet_from_row(&from_sqlite_row(&row)?)?;
			snippet.tags = self.tags_for(&snippet.id).await?;
			items.push(snippet);
		}

		Ok(Page::new(items, total, page.page(), page.page_size()))
	}

	async fn tags_for(&self, id: &SnippetId) -> Result<Vec<Tag>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT t.id, t.name, t.created_at
			FROM tags t
			JOIN snippet_tags st ON st.tag_id = t.id
			WHERE st.snippet_id = ?
			ORDER BY t.name ASC
			"#,
		)
		.bind(id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let mut tags = Vec::with_capacity(rows.len());
		for row in rows {
			tags.push(crate::tag::tag_from_row(&from_sqlite_row(&row)?)?);
		}
		Ok(tags)
	}

	/// Atomically increment the view counter. Returns `false` when the
	/// snippet does not exist or was soft-deleted.
	pub async fn increment_view_count(&self, id: &SnippetId) -> Result<bool, DbError> {
		let result = sqlx::query(
			"UPDATE snippets SET view_count = view_count + 1 WHERE id = ? AND deleted_at IS NULL",
		)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Replace a snippet's tag set in a single transaction.
	///
	/// Every tag id is verified first; an unknown tag fails with
	/// `DbError::NotFound` and rolls back, leaving the previous associations
	/// intact. On success the old set is fully removed before the new set is
	/// inserted, so no observer sees a partial mix.
	#[tracing::instrument(skip(self, tag_ids), fields(snippet_id = %id, tag_count = tag_ids.len()))]
	pub async fn replace_tags(&self, id: &SnippetId, tag_ids: &[TagId]) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;

		for tag_id in tag_ids {
			let exists = sqlx::query("SELECT 1 FROM tags WHERE id = ?")
				.bind(tag_id.to_string())
				.fetch_optional(&mut *tx)
				.await?;
			if exists.is_none() {
				return Err(DbError::NotFound(format!("tag {tag_id} does not exist")));
			}
		}

		sqlx::query("DELETE FROM snippet_tags WHERE snippet_id = ?")
			.bind(id.to_string())
			.execute(&mut *tx)
			.await?;

		for tag_id in tag_ids {
			sqlx::query("INSERT OR IGNORE INTO snippet_tags (snippet_id, tag_id) VALUES (?, ?)")
				.bind(id.to_string())
				.bind(tag_id.to_string())
				.execute(&mut *tx)
				.await?;
		}

		tx.commit().await?;
		tracing::debug!(snippet_id = %id, tag_count = tag_ids.len(), "snippet tags replaced");
		Ok(())
	}
}

#[async_trait]
impl SnippetStore for SnippetRepository {
	async fn create(&self, snippet: &Snippet) -> Result<Snippet, DbError> {
		SnippetRepository::create(self, snippet).await
	}

	async fn get(&self, id: &SnippetId) -> Result<Option<Snippet>, DbError> {
		SnippetRepository::get(self, id).await
	}

	async fn update(&self, snippet: &Snippet) -> Result<Snippet, DbError> {
		SnippetRepository::update(self, snippet).await
	}

	async fn soft_delete(&self, id: &SnippetId) -> Result<bool, DbError> {
		SnippetRepository::soft_delete(self, id).await
	}

	async fn delete(&self, id: &SnippetId) -> Result<bool, DbError> {
		SnippetRepository::delete(self, id).await
	}

	async fn list(
		&self,
		filter: &SnippetFilter,
		page: Pagination,
	) -> Result<Page<Snippet>, DbError> {
		SnippetRepository::list(self, filter, page).await
	}

	async fn increment_view_count(&self, id: &SnippetId) -> Result<bool, DbError> {
		SnippetRepository::increment_view_count(self, id).await
	}

	async fn replace_tags(&self, id: &SnippetId, tag_ids: &[TagId]) -> Result<(), DbError> {
		SnippetRepository::replace_tags(self, id, tag_ids).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tag::TagRepository;
	use crate::testing::create_snippet_test_pool;

	async fn make_repos() -> (SnippetRepository, TagRepository) {
		let pool = create_snippet_test_pool().await;
		(SnippetRepository::new(pool.clone()), TagRepository::new(pool))
	}

	#[tokio::test]
	async fn test_create_and_get_snippet() {
		let (repo, _) = make_repos().await;
		let snippet = Snippet::new(UserId::generate(), "hello", "rust", "fn main() {}");
		repo.create(&snippet).await.unwrap();

		let fetched = repo.get(&snippet.id).await.unwrap().unwrap();
		assert_eq!(fetched.title, "hello");
		assert_eq!(fetched.language, "rust");
		assert_eq!(fetched.view_count, 0);
		assert!(fetched.tags.is_empty());
	}

	#[tokio::test]
	async fn test_get_folds_tags_into_single_entity() {
		let (repo, tags) = make_repos().await;
		let snippet = Snippet::new(UserId::generate(), "tagged", "rust", "x");
		repo.create(&snippet).await.unwrap();

		let rust = tags.create(&Tag::new("rust")).await.unwrap();
		let asy = tags.create(&Tag::new("async")).await.unwrap();
		repo.replace_tags(&snippet.id, &[rust.id, asy.id]).await.unwrap();

		let fetched = repo.get(&snippet.id).await.unwrap().unwrap();
		assert_eq!(fetched.tags.len(), 2);
		assert_eq!(
			fetched.tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
			vec!["async", "rust"]
		);
	}

	#[tokio::test]
	async fn test_replace_tags_is_atomic_on_unknown_tag() {
		let (repo, tags) = make_repos().await;
		let snippet = Snippet::new(UserId::generate(), "s", "rust", "x");
		repo.create(&snippet).await.unwrap();

		let keep = tags.create(&Tag::new("keep")).await.unwrap();
		repo.replace_tags(&snippet.id, &[keep.id]).await.unwrap();

		// One valid id plus one unknown id: nothing must change.
		let valid = tags.create(&Tag::new("valid")).await.unwrap();
		let err = repo
			.replace_tags(&snippet.id, &[valid.id, TagId::generate()])
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::NotFound(_)));

		let fetched = repo.get(&snippet.id).await.unwrap().unwrap();
		assert_eq!(fetched.tags.len(), 1);
		assert_eq!(fetched.tags[0].id, keep.id);
	}

	#[tokio::test]
	async fn test_replace_tags_with_empty_set_clears() {
		let (repo, tags) = make_repos().await;
		let snippet = Snippet::new(UserId::generate(), "s", "rust", "x");
		repo.create(&snippet).await.unwrap();
		let tag = tags.create(&Tag::new("t")).await.unwrap();
		repo.replace_tags(&snippet.id, &[tag.id]).await.unwrap();

		repo.replace_tags(&snippet.id, &[]).await.unwrap();
		let fetched = repo.get(&snippet.id).await.unwrap().unwrap();
		assert!(fetched.tags.is_empty());
	}

	#[tokio::test]
	async fn test_increment_view_count() {
		let (repo, _) = make_repos().await;
		let snippet = Snippet::new(UserId::generate(), "viewed", "rust", "x");
		repo.create(&snippet).await.unwrap();

		assert!(repo.increment_view_count(&snippet.id).await.unwrap());
		assert!(repo.increment_view_count(&snippet.id).await.unwrap());
		assert_eq!(repo.get(&snippet.id).await.unwrap().unwrap().view_count, 2);

		assert!(!repo.increment_view_count(&SnippetId::generate()).await.unwrap());
	}

	#[tokio::test]
	async fn test_soft_delete_hides_snippet() {
		let (repo, _) = make_repos().await;
		let snippet = Snippet::new(UserId::generate(), "gone", "rust", "x");
		repo.create(&snippet).await.unwrap();

		assert!(repo.soft_delete(&snippet.id).await.unwrap());
		assert!(repo.get(&snippet.id).await.unwrap().is_none());
		assert!(!repo.increment_view_count(&snippet.id).await.unwrap());
	}

	#[tokio::test]
	async fn test_hard_delete_removes_row_and_associations() {
		let (repo, tags) = make_repos().await;
		let snippet = Snippet::new(UserId::generate(), "purged", "rust", "x");
		repo.create(&snippet).await.unwrap();
		let tag = tags.create(&Tag::new("t")).await.unwrap();
		repo.replace_tags(&snippet.id, &[tag.id]).await.unwrap();

		assert!(repo.delete(&snippet.id).await.unwrap());
		assert!(repo.get(&snippet.id).await.unwrap().is_none());
		assert!(!repo.delete(&snippet.id).await.unwrap());

		// The tag itself survives; only the association goes.
		assert!(tags.get(&tag.id).await.unwrap().is_some());
		let remaining: (i64,) =
			sqlx::query_as("SELECT COUNT(*) FROM snippet_tags WHERE snippet_id = ?")
				.bind(snippet.id.to_string())
				.fetch_one(&repo.pool)
				.await
				.unwrap();
		assert_eq!(remaining.0, 0);
	}

	#[tokio::test]
	async fn test_list_with_filters_and_pagination() {
		let (repo, _) = make_repos().await;
		let alice = UserId::generate();
		let bob = UserId::generate();

		let mut pub_rust = Snippet::new(alice, "tokio runtime demo", "rust", "x");
		pub_rust.is_public = true;
		repo.create(&pub_rust).await.unwrap();

		let priv_rust = Snippet::new(alice, "secret helper", "rust", "y");
		repo.create(&priv_rust).await.unwrap();

		let mut pub_go = Snippet::new(bob, "goroutine demo", "go", "z");
		pub_go.is_public = true;
		repo.create(&pub_go).await.unwrap();

		let page = Pagination::new(1, 10).unwrap();

		let by_language = SnippetFilter {
			language: Some("rust".to_string()),
			..Default::default()
		};
		let result = repo.list(&by_language, page).await.unwrap();
		assert_eq!(result.total_count, 2);

		let public_only = SnippetFilter {
			is_public: Some(true),
			..Default::default()
		};
		let result = repo.list(&public_only, page).await.unwrap();
		assert_eq!(result.total_count, 2);

		let by_author = SnippetFilter {
			author_id: Some(bob),
			..Default::default()
		};
		let result = repo.list(&by_author, page).await.unwrap();
		assert_eq!(result.total_count, 1);
		assert_eq!(result.items[0].title, "goroutine demo");

		let by_search = SnippetFilter {
			search: Some("demo".to_string()),
			..Default::default()
		};
		let result = repo.list(&by_search, page).await.unwrap();
		assert_eq!(result.total_count, 2);

		let combined = SnippetFilter {
			search: Some("demo".to_string()),
			language: Some("rust".to_string()),
			..Default::default()
		};
		let result = repo.list(&combined, page).await.unwrap();
		assert_eq!(result.total_count, 1);
		assert_eq!(result.items[0].id, pub_rust.id);
	}

	#[tokio::test]
	async fn test_list_date_range_filter() {
		let (repo, _) = make_repos().await;
		let snippet = Snippet::new(UserId::generate(), "now", "rust", "x");
		repo.create(&snippet).await.unwrap();

		let page = Pagination::new(1, 10).unwrap();

		let future_only = SnippetFilter {
			created_after: Some(Utc::now() + chrono::Duration::hours(1)),
			..Default::default()
		};
		assert_eq!(repo.list(&future_only, page).await.unwrap().total_count, 0);

		let past_window = SnippetFilter {
			created_after: Some(Utc::now() - chrono::Duration::hours(1)),
			created_before: Some(Utc::now() + chrono::Duration::hours(1)),
			..Default::default()
		};
		assert_eq!(repo.list(&past_window, page).await.unwrap().total_count, 1);
	}
}
