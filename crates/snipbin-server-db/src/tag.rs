// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Tag repository for database operations.

use async_trait::async_trait;
use snipbin_common_model::{Tag, TagId, TagUsage};
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;
use crate::row::{decode_i64, decode_id, decode_text, decode_timestamp, from_sqlite_row, SqlRow};

/// Trait for tag database operations.
#[async_trait]
pub trait TagStore: Send + Sync {
	async fn create(&self, tag: &Tag) -> Result<Tag, DbError>;

	async fn get(&self, id: &TagId) -> Result<Option<Tag>, DbError>;

	async fn get_by_name(&self, name: &str) -> Result<Option<Tag>, DbError>;

	async fn list(&self) -> Result<Vec<Tag>, DbError>;

	async fn delete(&self, id: &TagId) -> Result<bool, DbError>;

	async fn usage_statistics(&self) -> Result<Vec<TagUsage>, DbError>;
}

pub(crate) fn tag_from_row(row: &SqlRow) -> Result<Tag, DbError> {
	Ok(Tag {
		id: TagId::new(decode_id("id", row.require("id")?)?),
		name: decode_text("name", row.require("name")?)?,
		created_at: decode_timestamp("created_at", row.require("created_at")?)?,
	})
}

/// Repository for tag database operations.
#[derive(Clone)]
pub struct TagRepository {
	pool: SqlitePool,
}

impl TagRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, tag), fields(tag_id = %tag.id, name = %tag.name))]
	pub async fn create(&self, tag: &Tag) -> Result<Tag, DbError> {
		sqlx::query("INSERT INTO tags (id, name, created_at) VALUES (?, ?, ?)")
			.bind(tag.id.to_string())
			.bind(&tag.name)
			.bind(tag.created_at.to_rfc3339())
			.execute(&self.pool)
			.await?;

		tracing::debug!(tag_id = %tag.id, name = %tag.name, "tag created");
		Ok(tag.clone())
	}

	pub async fn get(&self, id: &TagId) -> Result<Option<Tag>, DbError> {
		let row = sqlx::query("SELECT id, name, created_at FROM tags WHERE id = ?")
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| tag_from_row(&from_sqlite_row(&r)?)).transpose()
	}

	pub async fn get_by_name(&self, name: &str) -> Result<Option<Tag>, DbError> {
		let row = sqlx::query("SELECT id, name, created_at FROM tags WHERE name = ?")
			.bind(name)
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| tag_from_row(&from_sqlite_row(&r)?)).transpose()
	}

	pub async fn list(&self) -> Result<Vec<Tag>, DbError> {
		let rows = sqlx::query("SELECT id, name, created_at FROM tags ORDER BY name ASC")
			.fetch_all(&self.pool)
			.await?;

		let mut tags = Vec::with_capacity(rows.len());
		for row in rows {
			tags.push(tag_from_row(&from_sqlite_row(&row)?)?);
		}
		Ok(tags)
	}

	/// Delete a tag and its snippet associations.
	#[tracing::instrument(skip(self), fields(tag_id = %id))]
	pub async fn delete(&self, id: &TagId) -> Result<bool, DbError> {
		sqlx::query("DELETE FROM snippet_tags WHERE tag_id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		let result = sqlx::query("DELETE FROM tags WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::debug!(tag_id = %id, "tag deleted");
		}
		Ok(deleted)
	}

	/// Per-tag usage counts over live (non-deleted) snippets. Tags with no
	/// usage come back with a zero count.
	#[tracing::instrument(skip(self))]
	pub async fn usage_statistics(&self) -> Result<Vec<TagUsage>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT t.id, t.name, t.created_at, COUNT(s.id) AS snippet_count
			FROM tags t
			LEFT JOIN snippet_tags st ON st.tag_id = t.id
			LEFT JOIN snippets s ON s.id = st.snippet_id AND s.deleted_at IS NULL
			GROUP BY t.id, t.name, t.created_at
			ORDER BY snippet_count DESC, t.name ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		let mut usage = Vec::with_capacity(rows.len());
		for row in rows {
			let sql_row = from_sqlite_row(&row)?;
			usage.push(TagUsage {
				tag: tag_from_row(&sql_row)?,
				snippet_count: decode_i64("snippet_count", sql_row.require("snippet_count")?)?,
			});
		}
		Ok(usage)
	}
}

#[async_trait]
impl TagStore for TagRepository {
	async fn create(&self, tag: &Tag) -> Result<Tag, DbError> {
		TagRepository::create(self, tag).await
	}

	async fn get(&self, id: &TagId) -> Result<Option<Tag>, DbError> {
		TagRepository::get(self, id).await
	}

	async fn get_by_name(&self, name: &str) -> Result<Option<Tag>, DbError> {
		TagRepository::get_by_name(self, name).await
	}

	async fn list(&self) -> Result<Vec<Tag>, DbError> {
		TagRepository::list(self).await
	}

	async fn delete(&self, id: &TagId) -> Result<bool, DbError> {
		TagRepository::delete(self, id).await
	}

	async fn usage_statistics(&self) -> Result<Vec<TagUsage>, DbError> {
		TagRepository::usage_statistics(self).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_snippet_test_pool;
	use snipbin_common_model::{Snippet, UserId};

	async fn make_repo() -> TagRepository {
		TagRepository::new(create_snippet_test_pool().await)
	}

	async fn insert_snippet(pool: &SqlitePool) -> Snippet {
		let snippet = Snippet::new(UserId::generate(), "t", "rust", "fn main() {}");
		sqlx::query(
			r#"
			INSERT INTO snippets (
				id, author_id, title, description, language, content,
				is_public, view_count, created_at, updated_at, deleted_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
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
		.bind(Option::<String>::None)
		.execute(pool)
		.await
		.unwrap();
		snippet
	}

	async fn attach(pool: &SqlitePool, snippet: &Snippet, tag: &Tag) {
		sqlx::query("INSERT INTO snippet_tags (snippet_id, tag_id) VALUES (?, ?)")
			.bind(snippet.id.to_string())
			.bind(tag.id.to_string())
			.execute(pool)
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_create_get_and_list_tags() {
		let repo = make_repo().await;
		let rust = repo.create(&Tag::new("rust")).await.unwrap();
		let asy = repo.create(&Tag::new("async")).await.unwrap();

		let fetched = repo.get(&rust.id).await.unwrap().unwrap();
		assert_eq!(fetched.name, "rust");

		let by_name = repo.get_by_name("async").await.unwrap().unwrap();
		assert_eq!(by_name.id, asy.id);

		let all = repo.list().await.unwrap();
		assert_eq!(
			all.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
			vec!["async", "rust"]
		);
	}

	#[tokio::test]
	async fn test_delete_removes_tag_and_associations() {
		let repo = make_repo().await;
		let tag = repo.create(&Tag::new("doomed")).await.unwrap();
		let snippet = insert_snippet(&repo.pool).await;
		attach(&repo.pool, &snippet, &tag).await;

		assert!(repo.delete(&tag.id).await.unwrap());
		assert!(repo.get(&tag.id).await.unwrap().is_none());
		assert!(!repo.delete(&tag.id).await.unwrap());

		let remaining: (i64,) =
			sqlx::query_as("SELECT COUNT(*) FROM snippet_tags WHERE tag_id = ?")
				.bind(tag.id.to_string())
				.fetch_one(&repo.pool)
				.await
				.unwrap();
		assert_eq!(remaining.0, 0);
	}

	#[tokio::test]
	async fn test_usage_statistics_counts_live_snippets_only() {
		let repo = make_repo().await;
		let popular = repo.create(&Tag::new("popular")).await.unwrap();
		let unused = repo.create(&Tag::new("unused")).await.unwrap();

		let s1 = insert_snippet(&repo.pool).await;
		let s2 = insert_snippet(&repo.pool).await;
		attach(&repo.pool, &s1, &popular).await;
		attach(&repo.pool, &s2, &popular).await;

		// Soft-delete one of the tagged snippets.
		sqlx::query("UPDATE snippets SET deleted_at = ? WHERE id = ?")
			.bind(chrono::Utc::now().to_rfc3339())
			.bind(s2.id.to_string())
			.execute(&repo.pool)
			.await
			.unwrap();

		let stats = repo.usage_statistics().await.unwrap();
		assert_eq!(stats.len(), 2);
		assert_eq!(stats[0].tag.id, popular.id);
		assert_eq!(stats[0].snippet_count, 1);
		assert_eq!(stats[1].tag.id, unused.id);
		assert_eq!(stats[1].snippet_count, 0);
	}
}
