// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// A registered user. Authentication material lives outside this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
	pub id: UserId,
	pub username: String,
	pub display_name: String,
	pub email: Option<String>,
	pub avatar_url: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
	pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: UserId::generate(),
			username: username.into(),
			display_name: display_name.into(),
			email: None,
			avatar_url: None,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		}
	}
}
