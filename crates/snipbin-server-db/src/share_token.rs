// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Share token repository.
//!
//! `record_access` is the hot path: the usability predicate (active,
//! unexpired, under the access limit) is evaluated inside the UPDATE's WHERE
//! clause, so check-and-increment is one atomic statement and two concurrent
//! uses of a token with one remaining access cannot both succeed.

use async_trait::async_trait;
use chrono::Utc;
use snipbin_common_model::{SharePermission, ShareToken, ShareTokenId, SnippetId, UserId};
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;
use crate::row::{
	decode_bool, decode_enum, decode_i32, decode_id, decode_opt_text, decode_opt_timestamp,
	decode_text, decode_timestamp, from_sqlite_row, SqlRow,
};

const TOKEN_COLUMNS: &str = "st.id, st.token, st.snippet_id, st.created_by, st.expires_at, \
	 st.is_active, st.access_count, st.max_access_count, st.permission, st.password, \
	 st.allow_download, st.allow_copy, st.last_accessed_at, st.created_at, \
	 s.title AS snippet_title, u.display_name AS creator_name";

const TOKEN_JOINS: &str = "FROM share_tokens st \
	 LEFT JOIN snippets s ON s.id = st.snippet_id \
	 LEFT JOIN users u ON u.id = st.created_by";

/// Trait for share token database operations.
#[async_trait]
pub trait ShareTokenStore: Send + Sync {
	async fn create(&self, token: &ShareToken) -> Result<ShareToken, DbError>;

	async fn get_by_token(&self, token: &str) -> Result<Option<ShareToken>, DbError>;

	async fn record_access(&self, token: &str) -> Result<Option<ShareToken>, DbError>;

	async fn deactivate(&self, id: &ShareTokenId) -> Result<bool, DbError>;

	async fn list_active_for_snippet(
		&self,
		snippet_id: &SnippetId,
	) -> Result<Vec<ShareToken>, DbError>;

	async fn list_active_for_creator(&self, creator: &UserId) -> Result<Vec<ShareToken>, DbError>;

	async fn sweep_expired(&self) -> Result<u64, DbError>;

	async fn deactivate_stale(&self, cutoff: chrono::DateTime<Utc>) -> Result<u64, DbError>;
}

fn token_from_row(row: &SqlRow) -> Result<ShareToken, DbError> {
	Ok(ShareToken {
		id: ShareTokenId::new(decode_id("id", row.require("id")?)?),
		token: decode_text("token", row.require("token")?)?,
		snippet_id: SnippetId::new(decode_id("snippet_id", row.require("snippet_id")?)?),
		created_by: UserId::new(decode_id("created_by", row.require("created_by")?)?),
		expires_at: decode_opt_timestamp("expires_at", row.require("expires_at")?)?,
		is_active: decode_bool("is_active", row.require("is_active")?)?,
		access_count: decode_i32("access_count", row.require("access_count")?)?,
		max_access_count: decode_i32("max_access_count", row.require("max_access_count")?)?,
		permission: decode_enum("permission", row.require("permission")?, SharePermission::from_code)?,
		password: decode_opt_text("password", row.require("password")?)?,
		allow_download: decode_bool("allow_download", row.require("allow_download")?)?,
		allow_copy: decode_bool("allow_copy", row.require("allow_copy")?)?,
		last_accessed_at: decode_opt_timestamp("last_accessed_at", row.require("last_accessed_at")?)?,
		created_at: decode_timestamp("created_at", row.require("created_at")?)?,
		snippet_title: decode_opt_text("snippet_title", row.require("snippet_title")?)?,
		creator_name: decode_opt_text("creator_name", row.require("creator_name")?)?,
	})
}

/// Repository for share token database operations.
#[derive(Clone)]
pub struct ShareTokenRepository {
	pool: SqlitePool,
}

impl ShareTokenRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, token), fields(token_id = %token.id, snippet_id = %token.snippet_id))]
	pub async fn create(&self, token: &ShareToken) -> Result<ShareToken, DbError> {
		sqlx::query(
			r#"
			INSERT INTO share_tokens (
				id, token, snippet_id, created_by, expires_at, is_active,
				access_count, max_access_count, permission, password,
				allow_download, allow_copy, last_accessed_at, created_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(token.id.to_string())
		.bind(&token.token)
		.bind(token.snippet_id.to_string())
		.bind(token.created_by.to_string())
		.bind(token.expires_at.map(|e| e.to_rfc3339()))
		.bind(token.is_active)
		.bind(token.access_count)
		.bind(token.max_access_count)
		.bind(token.permission.code())
		.bind(token.password.as_deref())
		.bind(token.allow_download)
		.bind(token.allow_copy)
		.bind(token.last_accessed_at.map(|t| t.to_rfc3339()))
		.bind(token.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(token_id = %token.id, "share token created");
		Ok(token.clone())
	}

	/// Look a token up by its opaque string, with the denormalized display
	/// fields joined in. Returns deactivated and expired tokens too; the
	/// caller decides what unusable means via `ShareToken::is_usable`.
	pub async fn get_by_token(&self, token: &str) -> Result<Option<ShareToken>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {TOKEN_COLUMNS} {TOKEN_JOINS} WHERE st.token = ?"
		))
		.bind(token)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| token_from_row(&from_sqlite_row(&r)?)).transpose()
	}

	/// Record one successful use of a token.
	///
	/// Check and increment are a single statement: the WHERE clause carries
	/// the full usability predicate, so an inactive, expired, or exhausted
	/// token updates zero rows and yields `None`. On success the refreshed
	/// token is returned.
	#[tracing::instrument(skip(self, token))]
	pub async fn record_access(&self, token: &str) -> Result<Option<ShareToken>, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			UPDATE share_tokens
			SET access_count = access_count + 1, last_accessed_at = ?
			WHERE token = ?
			  AND is_active = 1
			  AND (expires_at IS NULL OR expires_at > ?)
			  AND (max_access_count <= 0 OR access_count < max_access_count)
			"#,
		)
		.bind(&now)
		.bind(token)
		.bind(&now)
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Ok(None);
		}

		tracing::debug!("share token access recorded");
		self.get_by_token(token).await
	}

	#[tracing::instrument(skip(self), fields(token_id = %id))]
	pub async fn deactivate(&self, id: &ShareTokenId) -> Result<bool, DbError> {
		let result = sqlx::query(
			"UPDATE share_tokens SET is_active = 0 WHERE id = ? AND is_active = 1",
		)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		let changed = result.rows_affected() > 0;
		if changed {
			tracing::debug!(token_id = %id, "share token deactivated");
		}
		Ok(changed)
	}

	/// Active, unexpired tokens for one snippet, newest first.
	pub async fn list_active_for_snippet(
		&self,
		snippet_id: &SnippetId,
	) -> Result<Vec<ShareToken>, DbError> {
		let now = Utc::now().to_rfc3339();
		let rows = sqlx::query(&format!(
			"SELECT {TOKEN_COLUMNS} {TOKEN_JOINS} \
			 WHERE st.snippet_id = ? AND st.is_active = 1 \
			   AND (st.expires_at IS NULL OR st.expires_at > ?) \
			 ORDER BY st.created_at DESC"
		))
		.bind(snippet_id.to_string())
		.bind(&now)
		.fetch_all(&self.pool)
		.await?;

		let mut tokens = Vec::with_capacity(rows.len());
		for row in rows {
			tokens.push(token_from_row(&from_sqlite_row(&row)?)?);
		}
		Ok(tokens)
	}

	/// Active, unexpired tokens created by one user, newest first.
	pub async fn list_active_for_creator(
		&self,
		creator: &UserId,
	) -> Result<Vec<ShareToken>, DbError> {
		let now = Utc::now().to_rfc3339();
		let rows = sqlx::query(&format!(
			"SELECT {TOKEN_COLUMNS} {TOKEN_JOINS} \
			 WHERE st.created_by = ? AND st.is_active = 1 \
			   AND (st.expires_at IS NULL OR st.expires_at > ?) \
			 ORDER BY st.created_at DESC"
		))
		.bind(creator.to_string())
		.bind(&now)
		.fetch_all(&self.pool)
		.await?;

		let mut tokens = Vec::with_capacity(rows.len());
		for row in rows {
			tokens.push(token_from_row(&from_sqlite_row(&row)?)?);
		}
		Ok(tokens)
	}

	/// Delete tokens whose expiry lies in the past. Intended for a periodic
	/// maintenance sweep.
	#[tracing::instrument(skip(self))]
	pub async fn sweep_expired(&self) -> Result<u64, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			"DELETE FROM share_tokens WHERE expires_at IS NOT NULL AND expires_at <= ?",
		)
		.bind(&now)
		.execute(&self.pool)
		.await?;

		let removed = result.rows_affected();
		if removed > 0 {
			tracing::info!(removed, "expired share tokens swept");
		}
		Ok(removed)
	}

	/// Deactivate active tokens not used since `cutoff`. Tokens never used
	/// fall back to their creation time.
	#[tracing::instrument(skip(self))]
	pub async fn deactivate_stale(&self, cutoff: chrono::DateTime<Utc>) -> Result<u64, DbError> {
		let result = sqlx::query(
			r#"
			UPDATE share_tokens
			SET is_active = 0
			WHERE is_active = 1
			  AND COALESCE(last_accessed_at, created_at) < ?
			"#,
		)
		.bind(cutoff.to_rfc3339())
		.execute(&self.pool)
		.await?;

		let deactivated = result.rows_affected();
		if deactivated > 0 {
			tracing::info!(deactivated, "stale share tokens deactivated");
		}
		Ok(deactivated)
	}
}

#[async_trait]
impl ShareTokenStore for ShareTokenRepository {
	async fn create(&self, token: &ShareToken) -> Result<ShareToken, DbError> {
		ShareTokenRepository::create(self, token).await
	}

	async fn get_by_token(&self, token: &str) -> Result<Option<ShareToken>, DbError> {
		ShareTokenRepository::get_by_token(self, token).await
	}

	async fn record_access(&self, token: &str) -> Result<Option<ShareToken>, DbError> {
		ShareTokenRepository::record_access(self, token).await
	}

	async fn deactivate(&self, id: &ShareTokenId) -> Result<bool, DbError> {
		ShareTokenRepository::deactivate(self, id).await
	}

	async fn list_active_for_snippet(
		&self,
		snippet_id: &SnippetId,
	) -> Result<Vec<ShareToken>, DbError> {
		ShareTokenRepository::list_active_for_snippet(self, snippet_id).await
	}

	async fn list_active_for_creator(&self, creator: &UserId) -> Result<Vec<ShareToken>, DbError> {
		ShareTokenRepository::list_active_for_creator(self, creator).await
	}

	async fn sweep_expired(&self) -> Result<u64, DbError> {
		ShareTokenRepository::sweep_expired(self).await
	}

	async fn deactivate_stale(&self, cutoff: chrono::DateTime<Utc>) -> Result<u64, DbError> {
		ShareTokenRepository::deactivate_stale(self, cutoff).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_share_token_test_pool;
	use chrono::Duration;
	use snipbin_common_model::{Snippet, User, UserId};

	async fn make_repo() -> ShareTokenRepository {
		ShareTokenRepository::new(create_share_token_test_pool().await)
	}

	fn token(name: &str) -> ShareToken {
		ShareToken::new(
			name,
			SnippetId::generate(),
			UserId::generate(),
			SharePermission::ReadOnly,
		)
	}

	#[tokio::test]
	async fn test_create_and_get_by_token() {
		let repo = make_repo().await;
		let t = token("tok-1");
		repo.create(&t).await.unwrap();

		let fetched = repo.get_by_token("tok-1").await.unwrap().unwrap();
		assert_eq!(fetched.id, t.id);
		assert_eq!(fetched.permission, SharePermission::ReadOnly);
		assert!(fetched.is_active);
		assert_eq!(fetched.access_count, 0);
		// Unjoined display fields come back as NULL.
		assert!(fetched.snippet_title.is_none());
		assert!(fetched.creator_name.is_none());

		assert!(repo.get_by_token("missing").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_get_by_token_joins_display_fields() {
		let repo = make_repo().await;
		let user = User::new("erin", "Erin");
		sqlx::query(
			"INSERT INTO users (id, username, display_name, created_at, updated_at) \
			 VALUES (?, ?, ?, ?, ?)",
		)
		.bind(user.id.to_string())
		.bind(&user.username)
		.bind(&user.display_name)
		.bind(user.created_at.to_rfc3339())
		.bind(user.updated_at.to_rfc3339())
		.execute(&repo.pool)
		.await
		.unwrap();

		let snippet = Snippet::new(user.id, "shared snippet", "rust", "x");
		sqlx::query(
			"INSERT INTO snippets (id, author_id, title, language, content, is_public, \
			 view_count, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
		)
		.bind(snippet.id.to_string())
		.bind(snippet.author_id.to_string())
		.bind(&snippet.title)
		.bind(&snippet.language)
		.bind(&snippet.content)
		.bind(snippet.is_public)
		.bind(snippet.view_count)
		.bind(snippet.created_at.to_rfc3339())
		.bind(snippet.updated_at.to_rfc3339())
		.execute(&repo.pool)
		.await
		.unwrap();

		let t = ShareToken::new("tok-joined", snippet.id, user.id, SharePermission::Edit);
		repo.create(&t).await.unwrap();

		let fetched = repo.get_by_token("tok-joined").await.unwrap().unwrap();
		assert_eq!(fetched.snippet_title.as_deref(), Some("shared snippet"));
		assert_eq!(fetched.creator_name.as_deref(), Some("Erin"));
	}

	#[tokio::test]
	async fn test_record_access_increments_and_stamps() {
		let repo = make_repo().await;
		repo.create(&token("tok-use")).await.unwrap();

		let used = repo.record_access("tok-use").await.unwrap().unwrap();
		assert_eq!(used.access_count, 1);
		assert!(used.last_accessed_at.is_some());

		let used = repo.record_access("tok-use").await.unwrap().unwrap();
		assert_eq!(used.access_count, 2);
	}

	#[tokio::test]
	async fn test_record_access_enforces_limit_exactly() {
		let repo = make_repo().await;
		let mut t = token("tok-limited");
		t.max_access_count = 2;
		repo.create(&t).await.unwrap();

		assert!(repo.record_access("tok-limited").await.unwrap().is_some());
		assert!(repo.record_access("tok-limited").await.unwrap().is_some());
		// Third use: the counter has reached the limit.
		assert!(repo.record_access("tok-limited").await.unwrap().is_none());

		let stored = repo.get_by_token("tok-limited").await.unwrap().unwrap();
		assert_eq!(stored.access_count, 2);
	}

	#[tokio::test]
	async fn test_record_access_rejects_expired_and_inactive() {
		let repo = make_repo().await;

		let mut expired = token("tok-expired");
		expired.expires_at = Some(Utc::now() - Duration::hours(1));
		repo.create(&expired).await.unwrap();
		assert!(repo.record_access("tok-expired").await.unwrap().is_none());

		let inactive = token("tok-inactive");
		repo.create(&inactive).await.unwrap();
		assert!(repo.deactivate(&inactive.id).await.unwrap());
		assert!(!repo.deactivate(&inactive.id).await.unwrap());
		assert!(repo.record_access("tok-inactive").await.unwrap().is_none());

		// The unusable tokens are still visible to direct lookup.
		assert!(repo.get_by_token("tok-expired").await.unwrap().is_some());
	}

	#[tokio::test]
	async fn test_list_active_excludes_inactive_and_expired() {
		let repo = make_repo().await;
		let snippet_id = SnippetId::generate();

		let mut live = token("tok-live");
		live.snippet_id = snippet_id;
		live.expires_at = Some(Utc::now() + Duration::hours(1));
		repo.create(&live).await.unwrap();

		let mut dead = token("tok-dead");
		dead.snippet_id = snippet_id;
		dead.is_active = false;
		repo.create(&dead).await.unwrap();

		let mut stale = token("tok-stale");
		stale.snippet_id = snippet_id;
		stale.expires_at = Some(Utc::now() - Duration::hours(1));
		repo.create(&stale).await.unwrap();

		let active = repo.list_active_for_snippet(&snippet_id).await.unwrap();
		assert_eq!(active.len(), 1);
		assert_eq!(active[0].id, live.id);
	}

	#[tokio::test]
	async fn test_list_active_for_creator() {
		let repo = make_repo().await;
		let alice = UserId::generate();
		let bob = UserId::generate();

		let mut mine = token("tok-mine");
		mine.created_by = alice;
		repo.create(&mine).await.unwrap();

		let mut revoked = token("tok-revoked");
		revoked.created_by = alice;
		revoked.is_active = false;
		repo.create(&revoked).await.unwrap();

		let mut theirs = token("tok-theirs");
		theirs.created_by = bob;
		repo.create(&theirs).await.unwrap();

		let tokens = repo.list_active_for_creator(&alice).await.unwrap();
		assert_eq!(tokens.len(), 1);
		assert_eq!(tokens[0].id, mine.id);
	}

	#[tokio::test]
	async fn test_deactivate_stale_uses_last_access_or_creation() {
		let repo = make_repo().await;

		// Created long ago, never used.
		let mut old = token("tok-old");
		old.created_at = Utc::now() - Duration::days(90);
		repo.create(&old).await.unwrap();

		// Created long ago, used just now.
		let mut revived = token("tok-revived");
		revived.created_at = Utc::now() - Duration::days(90);
		repo.create(&revived).await.unwrap();
		repo.record_access("tok-revived").await.unwrap().unwrap();

		// Freshly created.
		repo.create(&token("tok-fresh")).await.unwrap();

		let cutoff = Utc::now() - Duration::days(30);
		assert_eq!(repo.deactivate_stale(cutoff).await.unwrap(), 1);

		assert!(!repo.get_by_token("tok-old").await.unwrap().unwrap().is_active);
		assert!(repo.get_by_token("tok-revived").await.unwrap().unwrap().is_active);
		assert!(repo.get_by_token("tok-fresh").await.unwrap().unwrap().is_active);
	}

	#[tokio::test]
	async fn test_sweep_expired_deletes_only_past_expiry() {
		let repo = make_repo().await;

		let mut stale = token("tok-stale");
		stale.expires_at = Some(Utc::now() - Duration::minutes(5));
		repo.create(&stale).await.unwrap();

		let mut live = token("tok-live");
		live.expires_at = Some(Utc::now() + Duration::hours(1));
		repo.create(&live).await.unwrap();

		repo.create(&token("tok-forever")).await.unwrap();

		assert_eq!(repo.sweep_expired().await.unwrap(), 1);
		assert!(repo.get_by_token("tok-stale").await.unwrap().is_none());
		assert!(repo.get_by_token("tok-live").await.unwrap().is_some());
		assert!(repo.get_by_token("tok-forever").await.unwrap().is_some());
	}
}
