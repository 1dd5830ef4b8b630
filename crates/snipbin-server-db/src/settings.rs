// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! System settings repository.
//!
//! The settings table is a singleton (one row, id fixed to 1) with one
//! serialized JSON column per sub-section, so saving one section never
//! rewrites the others. Every attempted sub-section mutation appends exactly
//! one history record: `Applied` on success, `Failed` (best effort) when the
//! new value does not validate or the write fails.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use snipbin_common_model::{
	ChangeOutcome, EmailSettings, FeatureSettings, SecuritySettings, SettingsCategory,
	SettingsChangeStats, SettingsHistory, SettingsHistoryId, SiteSettings, SystemSettings, UserId,
};
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;
use crate::filter::{bind_all, FilterClause, Pagination, SqlArg};
use crate::page::Page;
use crate::row::{
	decode_enum, decode_i64, decode_id, decode_opt_id, decode_opt_timestamp, decode_text,
	decode_timestamp, from_sqlite_row, SqlRow,
};

/// Optional filters for the settings history listing.
#[derive(Debug, Clone, Default)]
pub struct SettingsHistoryFilter {
	pub category: Option<SettingsCategory>,
	pub changed_by: Option<UserId>,
	pub outcome: Option<ChangeOutcome>,
}

impl SettingsHistoryFilter {
	fn clause(&self) -> FilterClause {
		let mut clause = FilterClause::new();
		if let Some(category) = self.category {
			clause.push("category = ?", SqlArg::Int(i64::from(category.code())));
		}
		if let Some(changed_by) = &self.changed_by {
			clause.push("changed_by = ?", SqlArg::Text(changed_by.to_string()));
		}
		if let Some(outcome) = self.outcome {
			clause.push("outcome = ?", SqlArg::Int(i64::from(outcome.code())));
		}
		clause
	}
}

/// Trait for system settings database operations.
#[async_trait]
pub trait SettingsStore: Send + Sync {
	async fn load(&self) -> Result<SystemSettings, DbError>;

	async fn save_site(
		&self,
		value: &SiteSettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError>;

	async fn save_security(
		&self,
		value: &SecuritySettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError>;

	async fn save_feature(
		&self,
		value: &FeatureSettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError>;

	async fn save_email(
		&self,
		value: &EmailSettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError>;

	async fn save_section(
		&self,
		category: SettingsCategory,
		new_value: &str,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError>;

	async fn history(
		&self,
		filter: &SettingsHistoryFilter,
		page: Pagination,
	) -> Result<Page<SettingsHistory>, DbError>;

	async fn change_statistics(&self) -> Result<Vec<SettingsChangeStats>, DbError>;
}

fn history_from_row(row: &SqlRow) -> Result<SettingsHistory, DbError> {
	Ok(SettingsHistory {
		id: SettingsHistoryId::new(decode_id("id", row.require("id")?)?),
		category: decode_enum("category", row.require("category")?, SettingsCategory::from_code)?,
		old_value: decode_text("old_value", row.require("old_value")?)?,
		new_value: decode_text("new_value", row.require("new_value")?)?,
		changed_by: decode_opt_id("changed_by", row.require("changed_by")?)?.map(UserId::new),
		outcome: decode_enum("outcome", row.require("outcome")?, ChangeOutcome::from_code)?,
		created_at: decode_timestamp("created_at", row.require("created_at")?)?,
	})
}

fn parse_section<T: DeserializeOwned>(column: &str, json: &str) -> Result<T, DbError> {
	serde_json::from_str(json).map_err(|e| DbError::Format {
		column: column.to_string(),
		message: format!("invalid settings document: {e}"),
	})
}

/// Repository for system settings database operations.
#[derive(Clone)]
pub struct SettingsRepository {
	pool: SqlitePool,
}

impl SettingsRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Seed the singleton row with defaults if it does not exist yet.
	/// `INSERT OR IGNORE` makes concurrent first loads converge on one row.
	async fn ensure_row(&self) -> Result<(), DbError> {
		let defaults = SystemSettings::default();
		sqlx::query(
			"INSERT OR IGNORE INTO system_settings (id, site, security, feature, email) \
			 VALUES (1, ?, ?, ?, ?)",
		)
		.bind(serde_json::to_string(&defaults.site)?)
		.bind(serde_json::to_string(&defaults.security)?)
		.bind(serde_json::to_string(&defaults.feature)?)
		.bind(serde_json::to_string(&defaults.email)?)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	/// Load the system settings, creating the defaults row on first use.
	///
	/// Sections are stored as independent JSON documents; fields absent from
	/// a stored document fall back to their defaults when deserialized, so
	/// old rows keep loading after the settings schema grows.
	#[tracing::instrument(skip(self))]
	pub async fn load(&self) -> Result<SystemSettings, DbError> {
		self.ensure_row().await?;

		let row = sqlx::query(
			"SELECT site, security, feature, email, updated_at, updated_by \
			 FROM system_settings WHERE id = 1",
		)
		.fetch_one(&self.pool)
		.await?;
		let row = from_sqlite_row(&row)?;

		Ok(SystemSettings {
			site: parse_section("site", &decode_text("site", row.require("site")?)?)?,
			security: parse_section("security", &decode_text("security", row.require("security")?)?)?,
			feature: parse_section("feature", &decode_text("feature", row.require("feature")?)?)?,
			email: parse_section("email", &decode_text("email", row.require("email")?)?)?,
			updated_at: decode_opt_timestamp("updated_at", row.require("updated_at")?)?,
			updated_by: decode_opt_id("updated_by", row.require("updated_by")?)?.map(UserId::new),
		})
	}

	async fn save_typed<T: Serialize>(
		&self,
		category: SettingsCategory,
		value: &T,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError> {
		let json = serde_json::to_string(value)?;
		self.save_section(category, &json, changed_by).await
	}

	pub async fn save_site(
		&self,
		value: &SiteSettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError> {
		self.save_typed(SettingsCategory::Site, value, changed_by).await
	}

	pub async fn save_security(
		&self,
		value: &SecuritySettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError> {
		self.save_typed(SettingsCategory::Security, value, changed_by).await
	}

	pub async fn save_feature(
		&self,
		value: &FeatureSettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError> {
		self.save_typed(SettingsCategory::Feature, value, changed_by).await
	}

	pub async fn save_email(
		&self,
		value: &EmailSettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError> {
		self.save_typed(SettingsCategory::Email, value, changed_by).await
	}

	/// Save one sub-section from its serialized JSON form.
	///
	/// The document is validated against the section's schema before the
	/// write. A rejected document or a failed write still appends a `Failed`
	/// history record (best effort) before the error propagates; a
	/// successful write appends exactly one `Applied` record.
	#[tracing::instrument(skip(self, new_value), fields(category = category.as_str()))]
	pub async fn save_section(
		&self,
		category: SettingsCategory,
		new_value: &str,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError> {
		self.ensure_row().await?;

		let column = category.as_str();
		let row = sqlx::query(&format!(
			"SELECT {column} AS old_value FROM system_settings WHERE id = 1"
		))
		.fetch_one(&self.pool)
		.await?;
		let old_value = decode_text("old_value", from_sqlite_row(&row)?.require("old_value")?)?;

		if let Err(err) = self.validate_section(category, new_value) {
			self
				.append_history(category, &old_value, new_value, changed_by, ChangeOutcome::Failed)
				.await
				.ok();
			return Err(err);
		}

		let now = Utc::now().to_rfc3339();
		let write = sqlx::query(&format!(
			"UPDATE system_settings SET {column} = ?, updated_at = ?, updated_by = ? WHERE id = 1"
		))
		.bind(new_value)
		.bind(&now)
		.bind(changed_by.map(|u| u.to_string()))
		.execute(&self.pool)
		.await;

		if let Err(err) = write {
			self
				.append_history(category, &old_value, new_value, changed_by, ChangeOutcome::Failed)
				.await
				.ok();
			return Err(err.into());
		}

		self
			.append_history(category, &old_value, new_value, changed_by, ChangeOutcome::Applied)
			.await?;

		tracing::info!(category = category.as_str(), "settings section saved");
		Ok(())
	}

	fn validate_section(&self, category: SettingsCategory, json: &str) -> Result<(), DbError> {
		let column = category.as_str();
		match category {
			SettingsCategory::Site => parse_section::<SiteSettings>(column, json).map(|_| ()),
			SettingsCategory::Security => parse_section::<SecuritySettings>(column, json).map(|_| ()),
			SettingsCategory::Feature => parse_section::<FeatureSettings>(column, json).map(|_| ()),
			SettingsCategory::Email => parse_section::<EmailSettings>(column, json).map(|_| ()),
		}
	}

	async fn append_history(
		&self,
		category: SettingsCategory,
		old_value: &str,
		new_value: &str,
		changed_by: Option<&UserId>,
		outcome: ChangeOutcome,
	) -> Result<(), DbError> {
		sqlx::query(
			"INSERT INTO settings_history (id, category, old_value, new_value, changed_by, \
			 outcome, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
		)
		.bind(SettingsHistoryId::generate().to_string())
		.bind(category.code())
		.bind(old_value)
		.bind(new_value)
		.bind(changed_by.map(|u| u.to_string()))
		.bind(outcome.code())
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	/// Paginated history listing, newest first.
	#[tracing::instrument(skip(self, filter))]
	pub async fn history(
		&self,
		filter: &SettingsHistoryFilter,
		page: Pagination,
	) -> Result<Page<SettingsHistory>, DbError> {
		let clause = filter.clause();
		let where_sql = clause.where_sql();

		let count_sql = format!("SELECT COUNT(*) FROM settings_history WHERE {where_sql}");
		let count_row = bind_all(sqlx::query(&count_sql), clause.args())
			.fetch_one(&self.pool)
			.await?;
		let total: i64 = sqlx::Row::get(&count_row, 0);

		let data_sql = format!(
			"SELECT id, category, old_value, new_value, changed_by, outcome, created_at \
			 FROM settings_history WHERE {where_sql} \
			 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
		);
		let rows = bind_all(sqlx::query(&data_sql), clause.args())
			.bind(page.limit())
			.bind(page.offset())
			.fetch_all(&self.pool)
			.await?;

		let mut items = Vec::with_capacity(rows.len());
		for row in rows {
			items.push(history_from_row(&from_sqlite_row(&row)?)?);
		}

		Ok(Page::new(items, total, page.page(), page.page_size()))
	}

	/// Aggregate change counts per category over the full history.
	#[tracing::instrument(skip(self))]
	pub async fn change_statistics(&self) -> Result<Vec<SettingsChangeStats>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT category,
			       COUNT(*) AS total_changes,
			       SUM(CASE WHEN outcome = 1 THEN 1 ELSE 0 END) AS failed_changes,
			       MAX(created_at) AS last_changed_at
			FROM settings_history
			GROUP BY category
			ORDER BY category ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		let mut stats = Vec::with_capacity(rows.len());
		for row in rows {
			let row = from_sqlite_row(&row)?;
			stats.push(SettingsChangeStats {
				category: decode_enum("category", row.require("category")?, SettingsCategory::from_code)?,
				total_changes: decode_i64("total_changes", row.require("total_changes")?)?,
				failed_changes: decode_i64("failed_changes", row.require("failed_changes")?)?,
				last_changed_at: decode_opt_timestamp(
					"last_changed_at",
					row.require("last_changed_at")?,
				)?,
			});
		}
		Ok(stats)
	}
}

#[async_trait]
impl SettingsStore for SettingsRepository {
	async fn load(&self) -> Result<SystemSettings, DbError> {
		SettingsRepository::load(self).await
	}

	async fn save_site(
		&self,
		value: &SiteSettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError> {
		SettingsRepository::save_site(self, value, changed_by).await
	}

	async fn save_security(
		&self,
		value: &SecuritySettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError> {
		SettingsRepository::save_security(self, value, changed_by).await
	}

	async fn save_feature(
		&self,
		value: &FeatureSettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError> {
		SettingsRepository::save_feature(self, value, changed_by).await
	}

	async fn save_email(
		&self,
		value: &EmailSettings,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError> {
		SettingsRepository::save_email(self, value, changed_by).await
	}

	async fn save_section(
		&self,
		category: SettingsCategory,
		new_value: &str,
		changed_by: Option<&UserId>,
	) -> Result<(), DbError> {
		SettingsRepository::save_section(self, category, new_value, changed_by).await
	}

	async fn history(
		&self,
		filter: &SettingsHistoryFilter,
		page: Pagination,
	) -> Result<Page<SettingsHistory>, DbError> {
		SettingsRepository::history(self, filter, page).await
	}

	async fn change_statistics(&self) -> Result<Vec<SettingsChangeStats>, DbError> {
		SettingsRepository::change_statistics(self).await
	}
}
