// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ClipboardEntryId, UserId};

/// One entry in a user's clipboard history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipboardEntry {
	pub id: ClipboardEntryId,
	pub user_id: UserId,
	pub content: String,
	pub created_at: DateTime<Utc>,
}

impl ClipboardEntry {
	pub fn new(user_id: UserId, content: impl Into<String>) -> Self {
		Self {
			id: ClipboardEntryId::generate(),
			user_id,
			content: content.into(),
			created_at: Utc::now(),
		}
	}
}
