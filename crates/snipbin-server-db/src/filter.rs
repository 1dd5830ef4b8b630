// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Filter-clause construction for listing queries.
//!
//! A [`FilterClause`] collects only the filter fields that are present,
//! joined by `AND` over an always-true default, together with the positional
//! parameter bag to bind. The same clause and bag are reused for the count
//! query and the windowed data query of a paginated listing, so the two can
//! never drift apart.

use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;

use crate::error::DbError;

/// One bindable parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
	Text(String),
	Int(i64),
	Bool(bool),
}

/// A parameterized WHERE fragment plus its parameter bag.
#[derive(Debug, Clone, Default)]
pub struct FilterClause {
	conditions: Vec<String>,
	args: Vec<SqlArg>,
}

impl FilterClause {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a condition with one `?` placeholder and its value.
	pub fn push(&mut self, condition: impl Into<String>, arg: SqlArg) {
		self.conditions.push(condition.into());
		self.args.push(arg);
	}

	/// Add a condition carrying several `?` placeholders, e.g. a grouped
	/// `(title LIKE ? OR description LIKE ?)`.
	pub fn push_with(
		&mut self,
		condition: impl Into<String>,
		args: impl IntoIterator<Item = SqlArg>,
	) {
		self.conditions.push(condition.into());
		self.args.extend(args);
	}

	/// Add a condition that carries no placeholder (e.g. `deleted_at IS NULL`).
	pub fn push_static(&mut self, condition: impl Into<String>) {
		self.conditions.push(condition.into());
	}

	/// Add a substring-match condition; the needle is wrapped in `%…%`.
	pub fn push_like(&mut self, condition: impl Into<String>, needle: &str) {
		self.conditions.push(condition.into());
		self.args.push(SqlArg::Text(format!("%{needle}%")));
	}

	/// The boolean expression combining the present fields, `1=1` when none.
	pub fn where_sql(&self) -> String {
		if self.conditions.is_empty() {
			"1=1".to_string()
		} else {
			self.conditions.join(" AND ")
		}
	}

	pub fn args(&self) -> &[SqlArg] {
		&self.args
	}
}

/// Bind a parameter bag to a query in positional order.
pub fn bind_all<'q>(
	mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
	args: &[SqlArg],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
	for arg in args {
		query = match arg {
			SqlArg::Text(s) => query.bind(s.clone()),
			SqlArg::Int(i) => query.bind(*i),
			SqlArg::Bool(b) => query.bind(*b),
		};
	}
	query
}

/// A validated pagination window. `page` is 1-based.
///
/// Out-of-range input is rejected rather than clamped so caller bugs stay
/// visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
	page: u32,
	page_size: u32,
}

impl Pagination {
	pub fn new(page: u32, page_size: u32) -> Result<Self, DbError> {
		if page < 1 {
			return Err(DbError::InvalidFilter(format!("page must be >= 1, got {page}")));
		}
		if page_size < 1 {
			return Err(DbError::InvalidFilter(format!(
				"page_size must be >= 1, got {page_size}"
			)));
		}
		Ok(Self { page, page_size })
	}

	pub fn page(&self) -> u32 {
		self.page
	}

	pub fn page_size(&self) -> u32 {
		self.page_size
	}

	pub fn limit(&self) -> i64 {
		i64::from(self.page_size)
	}

	pub fn offset(&self) -> i64 {
		i64::from(self.page - 1) * i64::from(self.page_size)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_filter_is_always_true() {
		let clause = FilterClause::new();
		assert_eq!(clause.where_sql(), "1=1");
		assert!(clause.args().is_empty());
	}

	#[test]
	fn conditions_join_with_and_in_push_order() {
		let mut clause = FilterClause::new();
		clause.push_static("deleted_at IS NULL");
		clause.push("language = ?", SqlArg::Text("rust".to_string()));
		clause.push_like("title LIKE ?", "tokio");

		assert_eq!(
			clause.where_sql(),
			"deleted_at IS NULL AND language = ? AND title LIKE ?"
		);
		assert_eq!(
			clause.args(),
			&[
				SqlArg::Text("rust".to_string()),
				SqlArg::Text("%tokio%".to_string()),
			]
		);
	}

	#[test]
	fn grouped_condition_binds_all_its_placeholders() {
		let mut clause = FilterClause::new();
		clause.push_with(
			"(title LIKE ? OR description LIKE ?)",
			[
				SqlArg::Text("%a%".to_string()),
				SqlArg::Text("%a%".to_string()),
			],
		);
		assert_eq!(clause.where_sql(), "(title LIKE ? OR description LIKE ?)");
		assert_eq!(clause.args().len(), 2);
	}

	#[test]
	fn pagination_rejects_out_of_range_input() {
		assert!(matches!(
			Pagination::new(0, 10),
			Err(DbError::InvalidFilter(_))
		));
		assert!(matches!(
			Pagination::new(1, 0),
			Err(DbError::InvalidFilter(_))
		));
	}

	#[test]
	fn pagination_window_arithmetic() {
		let p = Pagination::new(3, 25).unwrap();
		assert_eq!(p.limit(), 25);
		assert_eq!(p.offset(), 50);

		let first = Pagination::new(1, 10).unwrap();
		assert_eq!(first.offset(), 0);
	}
}
