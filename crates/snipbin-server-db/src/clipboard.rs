// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Clipboard history repository.
//!
//! Each user keeps a bounded, newest-first history. Appending past the cap
//! prunes the oldest entries in the same operation, so the stored history
//! never exceeds the cap.

use async_trait::async_trait;
use snipbin_common_model::{ClipboardEntry, ClipboardEntryId, UserId};
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;
use crate::row::{decode_id, decode_text, decode_timestamp, from_sqlite_row, SqlRow};

/// Trait for clipboard history database operations.
#[async_trait]
pub trait ClipboardStore: Send + Sync {
	async fn append(
		&self,
		user_id: &UserId,
		content: &str,
		cap: u32,
	) -> Result<ClipboardEntry, DbError>;

	async fn list_recent(&self, user_id: &UserId, limit: u32) -> Result<Vec<ClipboardEntry>, DbError>;

	async fn clear(&self, user_id: &UserId) -> Result<u64, DbError>;
}

fn entry_from_row(row: &SqlRow) -> Result<ClipboardEntry, DbError> {
	Ok(ClipboardEntry {
		id: ClipboardEntryId::new(decode_id("id", row.require("id")?)?),
		user_id: UserId::new(decode_id("user_id", row.require("user_id")?)?),
		content: decode_text("content", row.require("content")?)?,
		created_at: decode_timestamp("created_at", row.require("created_at")?)?,
	})
}

/// Repository for clipboard history database operations.
#[derive(Clone)]
pub struct ClipboardRepository {
	pool: SqlitePool,
}

impl ClipboardRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Append one entry to a user's history and prune everything beyond the
	/// newest `cap` entries.
	#[tracing::instrument(skip(self, content), fields(user_id = %user_id, cap))]
	pub async fn append(
		&self,
		user_id: &UserId,
		content: &str,
		cap: u32,
	) -> Result<ClipboardEntry, DbError> {
		if cap < 1 {
			return Err(DbError::InvalidFilter(format!(
				"history cap must be >= 1, got {cap}"
			)));
		}

		let entry = ClipboardEntry::new(*user_id, content);
		sqlx::query(
			"INSERT INTO clipboard_history (id, user_id, content, created_at) VALUES (?, ?, ?, ?)",
		)
		.bind(entry.id.to_string())
		.bind(entry.user_id.to_string())
		.bind(&entry.content)
		.bind(entry.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		// Ties on created_at resolve by id, keeping the prune deterministic.
		let pruned = sqlx::query(
			r#"
			DELETE FROM clipboard_history
			WHERE user_id = ?
			  AND id NOT IN (
				SELECT id FROM clipboard_history
				WHERE user_id = ?
				ORDER BY created_at DESC, id DESC
				LIMIT ?
			  )
			"#,
		)
		.bind(user_id.to_string())
		.bind(user_id.to_string())
		.bind(i64::from(cap))
		.execute(&self.pool)
		.await?;

		if pruned.rows_affected() > 0 {
			tracing::debug!(
				user_id = %user_id,
				pruned = pruned.rows_affected(),
				"clipboard history pruned to cap"
			);
		}
		Ok(entry)
	}

	/// The newest `limit` entries for a user, newest first.
	pub async fn list_recent(
		&self,
		user_id: &UserId,
		limit: u32,
	) -> Result<Vec<ClipboardEntry>, DbError> {
		let rows = sqlx::query(
			"SELECT id, user_id, content, created_at FROM clipboard_history \
			 WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
		)
		.bind(user_id.to_string())
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		let mut entries = Vec::with_capacity(rows.len());
		for row in rows {
			entries.push(entry_from_row(&from_sqlite_row(&row)?)?);
		}
		Ok(entries)
	}

	/// Remove a user's entire history.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn clear(&self, user_id: &UserId) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM clipboard_history WHERE user_id = ?")
			.bind(user_id.to_string())
			.execute(&self.pool)
			.await?;

		let removed = result.rows_affected();
		if removed > 0 {
			tracing::debug!(user_id = %user_id, removed, "clipboard history cleared");
		}
		Ok(removed)
	}
}

#[async_trait]
impl ClipboardStore for ClipboardRepository {
	async fn append(
		&self,
		user_id: &UserId,
		content: &str,
		cap: u32,
	) -> Result<ClipboardEntry, DbError> {
		ClipboardRepository::append(self, user_id, content, cap).await
	}

	async fn list_recent(
		&self,
		user_id: &UserId,
		limit: u32,
	) -> Result<Vec<ClipboardEntry>, DbError> {
		ClipboardRepository::list_recent(self, user_id, limit).await
	}

	async fn clear(&self, user_id: &UserId) -> Result<u64, DbError> {
		ClipboardRepository::clear(self, user_id).await
	}
}
