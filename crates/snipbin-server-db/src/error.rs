// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Format error in column {column}: {message}")]
	Format { column: String, message: String },

	#[error("Integer overflow in column {column}: {value} does not fit in i32")]
	Overflow { column: String, value: i64 },

	#[error("Unknown enum code in column {column}: {value}")]
	UnknownEnum { column: String, value: i32 },

	#[error("Mapping error: {0}")]
	Mapping(String),

	#[error("Invalid filter: {0}")]
	InvalidFilter(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;
