// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! User repository for database operations.

use async_trait::async_trait;
use chrono::Utc;
use snipbin_common_model::{User, UserId};
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;
use crate::row::{
	decode_id, decode_opt_text, decode_opt_timestamp, decode_text, decode_timestamp,
	from_sqlite_row, SqlRow,
};

const USER_COLUMNS: &str =
	"id, username, display_name, email, avatar_url, created_at, updated_at, deleted_at";

/// Trait for user database operations.
#[async_trait]
pub trait UserStore: Send + Sync {
	async fn create(&self, user: &User) -> Result<User, DbError>;

	async fn get(&self, id: &UserId) -> Result<Option<User>, DbError>;

	async fn get_by_username(&self, username: &str) -> Result<Option<User>, DbError>;

	async fn update(&self, user: &User) -> Result<User, DbError>;

	async fn soft_delete(&self, id: &UserId) -> Result<bool, DbError>;
}

fn user_from_row(row: &SqlRow) -> Result<User, DbError> {
	Ok(User {
		id: UserId::new(decode_id("id", row.require("id")?)?),
		username: decode_text("username", row.require("username")?)?,
		display_name: decode_text("display_name", row.require("display_name")?)?,
		email: decode_opt_text("email", row.require("email")?)?,
		avatar_url: decode_opt_text("avatar_url", row.require("avatar_url")?)?,
		created_at: decode_timestamp("created_at", row.require("created_at")?)?,
		updated_at: decode_timestamp("updated_at", row.require("updated_at")?)?,
		deleted_at: decode_opt_timestamp("deleted_at", row.require("deleted_at")?)?,
	})
}

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
	pub async fn create(&self, user: &User) -> Result<User, DbError> {
		sqlx::query(&format!(
			"INSERT INTO users ({USER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
		))
		.bind(user.id.to_string())
		.bind(&user.username)
		.bind(&user.display_name)
		.bind(user.email.as_deref())
		.bind(user.avatar_url.as_deref())
		.bind(user.created_at.to_rfc3339())
		.bind(user.updated_at.to_rfc3339())
		.bind(user.deleted_at.map(|d| d.to_rfc3339()))
		.execute(&self.pool)
		.await?;

		tracing::debug!(user_id = %user.id, username = %user.username, "user created");
		Ok(user.clone())
	}

	/// Get a user by ID. Soft-deleted users are not returned.
	pub async fn get(&self, id: &UserId) -> Result<Option<User>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted_at IS NULL"
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| user_from_row(&from_sqlite_row(&r)?)).transpose()
	}

	/// Get a user by username. Soft-deleted users are not returned.
	pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {USER_COLUMNS} FROM users WHERE username = ? AND deleted_at IS NULL"
		))
		.bind(username)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| user_from_row(&from_sqlite_row(&r)?)).transpose()
	}

	/// Whole-row update by identifier; a no-op when the row is absent.
	#[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
	pub async fn update(&self, user: &User) -> Result<User, DbError> {
		sqlx::query(
			r#"
			UPDATE users SET
				username = ?,
				display_name = ?,
				email = ?,
				avatar_url = ?,
				updated_at = ?,
				deleted_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&user.username)
		.bind(&user.display_name)
		.bind(user.email.as_deref())
		.bind(user.avatar_url.as_deref())
		.bind(user.updated_at.to_rfc3339())
		.bind(user.deleted_at.map(|d| d.to_rfc3339()))
		.bind(user.id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(user.clone())
	}

	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn soft_delete(&self, id: &UserId) -> Result<bool, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			"UPDATE users SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
		)
		.bind(&now)
		.bind(&now)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::debug!(user_id = %id, "user soft-deleted");
		}
		Ok(deleted)
	}
}

#[async_trait]
impl UserStore for UserRepository {
	async fn create(&self, user: &User) -> Result<User, DbError> {
		UserRepository::create(self, user).await
	}

	async fn get(&self, id: &UserId) -> Result<Option<User>, DbError> {
		UserRepository::get(self, id).await
	}

	async fn get_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
		UserRepository::get_by_username(self, username).await
	}

	async fn update(&self, user: &User) -> Result<User, DbError> {
		UserRepository::update(self, user).await
	}

	async fn soft_delete(&self, id: &UserId) -> Result<bool, DbError> {
		UserRepository::soft_delete(self, id).await
	}
}
