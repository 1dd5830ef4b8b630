// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! System settings and change-history model.
//!
//! `SystemSettings` is a singleton: the backing table holds zero or one rows,
//! and each of the four sub-sections is serialized independently so a save of
//! one section never rewrites the others. Every sub-section mutation appends
//! exactly one `SettingsHistory` record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SettingsHistoryId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
	pub site_name: String,
	pub site_description: String,
	pub default_language: String,
	pub snippets_per_page: u32,
}

impl Default for SiteSettings {
	fn default() -> Self {
		Self {
			site_name: "snipbin".to_string(),
			site_description: "Share code snippets".to_string(),
			default_language: "plaintext".to_string(),
			snippets_per_page: 20,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
	pub allow_registration: bool,
	pub require_email_verification: bool,
	pub max_login_attempts: u32,
	pub session_timeout_minutes: u32,
}

impl Default for SecuritySettings {
	fn default() -> Self {
		Self {
			allow_registration: true,
			require_email_verification: false,
			max_login_attempts: 5,
			session_timeout_minutes: 60,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
	pub enable_comments: bool,
	pub enable_sharing: bool,
	pub enable_clipboard_history: bool,
	pub max_snippet_size_bytes: u32,
}

impl Default for FeatureSettings {
	fn default() -> Self {
		Self {
			enable_comments: true,
			enable_sharing: true,
			enable_clipboard_history: true,
			max_snippet_size_bytes: 1_048_576,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
	pub smtp_host: String,
	pub smtp_port: u16,
	pub from_address: String,
	pub enabled: bool,
}

/// The singleton system settings record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemSettings {
	pub site: SiteSettings,
	pub security: SecuritySettings,
	pub feature: FeatureSettings,
	pub email: EmailSettings,
	pub updated_at: Option<DateTime<Utc>>,
	pub updated_by: Option<UserId>,
}

/// Which sub-section a history record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsCategory {
	Site,
	Security,
	Feature,
	Email,
}

impl SettingsCategory {
	pub fn code(self) -> i32 {
		match self {
			SettingsCategory::Site => 0,
			SettingsCategory::Security => 1,
			SettingsCategory::Feature => 2,
			SettingsCategory::Email => 3,
		}
	}

	pub fn from_code(code: i32) -> Option<Self> {
		match code {
			0 => Some(SettingsCategory::Site),
			1 => Some(SettingsCategory::Security),
			2 => Some(SettingsCategory::Feature),
			3 => Some(SettingsCategory::Email),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			SettingsCategory::Site => "site",
			SettingsCategory::Security => "security",
			SettingsCategory::Feature => "feature",
			SettingsCategory::Email => "email",
		}
	}
}

/// Outcome of an attempted settings change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOutcome {
	Applied,
	Failed,
}

impl ChangeOutcome {
	pub fn code(self) -> i32 {
		match self {
			ChangeOutcome::Applied => 0,
			ChangeOutcome::Failed => 1,
		}
	}

	pub fn from_code(code: i32) -> Option<Self> {
		match code {
			0 => Some(ChangeOutcome::Applied),
			1 => Some(ChangeOutcome::Failed),
			_ => None,
		}
	}
}

/// Append-only audit record of one settings mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsHistory {
	pub id: SettingsHistoryId,
	pub category: SettingsCategory,
	/// Serialized sub-section value before the change.
	pub old_value: String,
	/// Serialized sub-section value after the change.
	pub new_value: String,
	pub changed_by: Option<UserId>,
	pub outcome: ChangeOutcome,
	pub created_at: DateTime<Utc>,
}

/// Aggregate counts over the settings history, grouped by category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsChangeStats {
	pub category: SettingsCategory,
	pub total_changes: i64,
	pub failed_changes: i64,
	pub last_changed_at: Option<DateTime<Utc>>,
}
