// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Share token domain model.
//!
//! A share token is an opaque capability string granting time- and
//! use-limited access to one snippet without requiring authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ShareTokenId, SnippetId, UserId};

/// What the holder of a token is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
	ReadOnly,
	Edit,
	Full,
}

impl SharePermission {
	/// Integer code as stored in the database.
	pub fn code(self) -> i32 {
		match self {
			SharePermission::ReadOnly => 0,
			SharePermission::Edit => 1,
			SharePermission::Full => 2,
		}
	}

	/// Decode a stored integer code. Returns `None` for unknown codes.
	pub fn from_code(code: i32) -> Option<Self> {
		match code {
			0 => Some(SharePermission::ReadOnly),
			1 => Some(SharePermission::Edit),
			2 => Some(SharePermission::Full),
			_ => None,
		}
	}
}

/// A capability granting access to one snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareToken {
	pub id: ShareTokenId,
	/// Opaque lookup key, supplied by the caller.
	pub token: String,
	pub snippet_id: SnippetId,
	pub created_by: UserId,
	pub expires_at: Option<DateTime<Utc>>,
	pub is_active: bool,
	/// Monotonically non-decreasing, incremented once per successful use.
	pub access_count: i32,
	/// Zero or negative means unlimited.
	pub max_access_count: i32,
	pub permission: SharePermission,
	pub password: Option<String>,
	pub allow_download: bool,
	pub allow_copy: bool,
	pub last_accessed_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	/// Denormalized display fields, populated by join queries.
	pub snippet_title: Option<String>,
	pub creator_name: Option<String>,
}

impl ShareToken {
	pub fn new(
		token: impl Into<String>,
		snippet_id: SnippetId,
		created_by: UserId,
		permission: SharePermission,
	) -> Self {
		Self {
			id: ShareTokenId::generate(),
			token: token.into(),
			snippet_id,
			created_by,
			expires_at: None,
			is_active: true,
			access_count: 0,
			max_access_count: 0,
			permission,
			password: None,
			allow_download: true,
			allow_copy: true,
			last_accessed_at: None,
			created_at: Utc::now(),
			snippet_title: None,
			creator_name: None,
		}
	}

	/// A token is usable iff it is active, unexpired, and under its access
	/// limit (a limit of zero or below means unlimited).
	pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
		self.is_active
			&& self.expires_at.map(|e| e > now).unwrap_or(true)
			&& (self.max_access_count <= 0 || self.access_count < self.max_access_count)
	}
}
