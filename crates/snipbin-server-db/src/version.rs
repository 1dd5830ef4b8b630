// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Snippet version repository.
//!
//! Versions are immutable snapshots. Numbers are assigned by the store as
//! `MAX(version) + 1` per snippet so they stay strictly increasing from 1;
//! the UNIQUE (snippet_id, version) constraint backstops concurrent writers.

use async_trait::async_trait;
use chrono::Utc;
use snipbin_common_model::{Snippet, SnippetId, SnippetVersion, SnippetVersionId, UserId};
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;
use crate::row::{
	decode_i32, decode_id, decode_text, decode_timestamp, from_sqlite_row, SqlRow,
};

const VERSION_COLUMNS: &str =
	"id, snippet_id, version, title, language, content, created_by, created_at";

/// Trait for snippet version database operations.
#[async_trait]
pub trait SnippetVersionStore: Send + Sync {
	async fn snapshot(
		&self,
		snippet: &Snippet,
		created_by: &UserId,
	) -> Result<SnippetVersion, DbError>;

	async fn get(&self, id: &SnippetVersionId) -> Result<Option<SnippetVersion>, DbError>;

	async fn get_by_number(
		&self,
		snippet_id: &SnippetId,
		version: i32,
	) -> Result<Option<SnippetVersion>, DbError>;

	async fn list_for_snippet(
		&self,
		snippet_id: &SnippetId,
	) -> Result<Vec<SnippetVersion>, DbError>;

	async fn delete_for_snippet(&self, snippet_id: &SnippetId) -> Result<u64, DbError>;
}

fn version_from_row(row: &SqlRow) -> Result<SnippetVersion, DbError> {
	Ok(SnippetVersion {
		id: SnippetVersionId::new(decode_id("id", row.require("id")?)?),
		snippet_id: SnippetId::new(decode_id("snippet_id", row.require("snippet_id")?)?),
		version: decode_i32("version", row.require("version")?)?,
		title: decode_text("title", row.require("title")?)?,
		language: decode_text("language", row.require("language")?)?,
		content: decode_text("content", row.require("content")?)?,
		created_by: UserId::new(decode_id("created_by", row.require("created_by")?)?),
		created_at: decode_timestamp("created_at", row.require("created_at")?)?,
	})
}

/// Repository for snippet version database operations.
#[derive(Clone)]
pub struct SnippetVersionRepository {
	pool: SqlitePool,
}

impl SnippetVersionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Snapshot the current state of a snippet as its next version.
	///
	/// The number assignment and the insert run in one transaction so two
	/// concurrent snapshots cannot both claim the same number.
	#[tracing::instrument(skip(self, snippet), fields(snippet_id = %snippet.id))]
	pub async fn snapshot(
		&self,
		snippet: &Snippet,
		created_by: &UserId,
	) -> Result<SnippetVersion, DbError> {
		let mut tx = self.pool.begin().await?;

		let next: (i64,) = sqlx::query_as(
			"SELECT COALESCE(MAX(version), 0) + 1 FROM snippet_versions WHERE snippet_id = ?",
		)
		.bind(snippet.id.to_string())
		.fetch_one(&mut *tx)
		.await?;
		let number = i32::try_from(next.0).map_err(|_| DbError::Overflow {
			column: "version".to_string(),
			value: next.0,
		})?;

		let version = SnippetVersion {
			id: SnippetVersionId::generate(),
			snippet_id: snippet.id,
			version: number,
			title: snippet.title.clone(),
			language: snippet.language.clone(),
			content: snippet.content.clone(),
			created_by: *created_by,
			created_at: Utc::now(),
		};

		sqlx::query(&format!(
			"INSERT INTO snippet_versions ({VERSION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
		))
		.bind(version.id.to_string())
		.bind(version.snippet_id.to_string())
		.bind(version.version)
		.bind(&version.title)
		.bind(&version.language)
		.bind(&version.content)
		.bind(version.created_by.to_string())
		.bind(version.created_at.to_rfc3339())
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;
		tracing::debug!(snippet_id = %snippet.id, version = number, "snippet version created");
		Ok(version)
	}

	pub async fn get(&self, id: &SnippetVersionId) -> Result<Option<SnippetVersion>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {VERSION_COLUMNS} FROM snippet_versions WHERE id = ?"
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| version_from_row(&from_sqlite_row(&r)?)).transpose()
	}

	pub async fn get_by_number(
		&self,
		snippet_id: &SnippetId,
		version: i32,
	) -> Result<Option<SnippetVersion>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {VERSION_COLUMNS} FROM snippet_versions WHERE snippet_id = ? AND version = ?"
		))
		.bind(snippet_id.to_string())
		.bind(version)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| version_from_row(&from_sqlite_row(&r)?)).transpose()
	}

	/// All versions of a snippet, newest first.
	pub async fn list_for_snippet(
		&self,
		snippet_id: &SnippetId,
	) -> Result<Vec<SnippetVersion>, DbError> {
		let rows = sqlx::query(&format!(
			"SELECT {VERSION_COLUMNS} FROM snippet_versions WHERE snippet_id = ? \
			 ORDER BY version DESC"
		))
		.bind(snippet_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let mut versions = Vec::with_capacity(rows.len());
		for row in rows {
			versions.push(version_from_row(&from_sqlite_row(&row)?)?);
		}
		Ok(versions)
	}

	/// Bulk-delete a snippet's version history, e.g. when the snippet itself
	/// is purged.
	#[tracing::instrument(skip(self), fields(snippet_id = %snippet_id))]
	pub async fn delete_for_snippet(&self, snippet_id: &SnippetId) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM snippet_versions WHERE snippet_id = ?")
			.bind(snippet_id.to_string())
			.execute(&self.pool)
			.await?;

		let removed = result.rows_affected();
		if removed > 0 {
			tracing::debug!(snippet_id = %snippet_id, removed, "snippet versions deleted");
		}
		Ok(removed)
	}
}

#[async_trait]
impl SnippetVersionStore for SnippetVersionRepository {
	async fn snapshot(
		&self,
		snippet: &Snippet,
		created_by: &UserId,
	) -> Result<SnippetVersion, DbError> {
		SnippetVersionRepository::snapshot(self, snippet, created_by).await
	}

	async fn get(&self, id: &SnippetVersionId) -> Result<Option<SnippetVersion>, DbError> {
		SnippetVersionRepository::get(self, id).await
	}

	async fn get_by_number(
		&self,
		snippet_id: &SnippetId,
		version: i32,
	) -> Result<Option<SnippetVersion>, DbError> {
		SnippetVersionRepository::get_by_number(self, snippet_id, version).await
	}

	async fn list_for_snippet(
		&self,
		snippet_id: &SnippetId,
	) -> Result<Vec<SnippetVersion>, DbError> {
		SnippetVersionRepository::list_for_snippet(self, snippet_id).await
	}

	async fn delete_for_snippet(&self, snippet_id: &SnippetId) -> Result<u64, DbError> {
		SnippetVersionRepository::delete_for_snippet(self, snippet_id).await
	}
}
