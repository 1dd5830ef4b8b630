// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Folding joined result rows into parent entities with child collections.
//!
//! A one-to-many join (snippet ↔ tags, comment ↔ likes) repeats the parent
//! columns across every child row. [`fold_joined_rows`] collapses such a
//! result set into one parent per distinct parent key, in first-seen order,
//! attaching each distinct child exactly once. Re-running the fold over a row
//! set where the same (parent, child) pair appears multiple times yields the
//! same result.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::DbError;
use crate::row::{decode_id, SqlRow};

/// Fold an ordered sequence of joined rows into deduplicated parents.
///
/// `parent_key` and `child_key` name the id columns of the two sides; the
/// child side of an unmatched LEFT JOIN row is NULL and attaches nothing.
/// A row missing the parent key column entirely fails with
/// `DbError::Mapping`.
pub fn fold_joined_rows<P, C>(
	rows: &[SqlRow],
	parent_key: &str,
	child_key: &str,
	mut parent_of: impl FnMut(&SqlRow) -> Result<P, DbError>,
	mut child_of: impl FnMut(&SqlRow) -> Result<C, DbError>,
	mut attach: impl FnMut(&mut P, C),
) -> Result<Vec<P>, DbError> {
	let mut order: Vec<Uuid> = Vec::new();
	let mut parents: HashMap<Uuid, P> = HashMap::new();
	let mut attached: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();

	for row in rows {
		let parent_id = decode_id(parent_key, row.require(parent_key)?)?;

		if !parents.contains_key(&parent_id) {
			parents.insert(parent_id, parent_of(row)?);
			order.push(parent_id);
		}

		let child_value = match row.get(child_key) {
			Some(value) if !value.is_null() => value,
			_ => continue,
		};
		let child_id = decode_id(child_key, child_value)?;

		if attached.entry(parent_id).or_default().insert(child_id) {
			let child = child_of(row)?;
			let parent = parents
				.get_mut(&parent_id)
				.ok_or_else(|| DbError::Internal("parent vanished during fold".to_string()))?;
			attach(parent, child);
		}
	}

	let mut result = Vec::with_capacity(order.len());
	for id in order {
		let parent = parents
			.remove(&id)
			.ok_or_else(|| DbError::Internal("parent vanished during fold".to_string()))?;
		result.push(parent);
	}
	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::row::SqlValue;

	#[derive(Debug, PartialEq)]
	struct Parent {
		id: Uuid,
		children: Vec<Uuid>,
	}

	fn join_row(parent: Uuid, child: Option<Uuid>) -> SqlRow {
		SqlRow::new(vec![
			("p_id".to_string(), SqlValue::Text(parent.to_string())),
			(
				"c_id".to_string(),
				child
					.map(|c| SqlValue::Text(c.to_string()))
					.unwrap_or(SqlValue::Null),
			),
		])
	}

	fn fold(rows: &[SqlRow]) -> Result<Vec<Parent>, DbError> {
		fold_joined_rows(
			rows,
			"p_id",
			"c_id",
			|row| {
				Ok(Parent {
					id: decode_id("p_id", row.require("p_id")?)?,
					children: Vec::new(),
				})
			},
			|row| decode_id("c_id", row.require("c_id")?),
			|parent, child| parent.children.push(child),
		)
	}

	#[test]
	fn repeated_parent_rows_fold_to_one_parent_with_distinct_children() {
		let p = Uuid::new_v4();
		let c1 = Uuid::new_v4();
		let c2 = Uuid::new_v4();

		// Same parent over 5 child-join rows, with duplicates.
		let rows = vec![
			join_row(p, Some(c1)),
			join_row(p, Some(c2)),
			join_row(p, Some(c1)),
			join_row(p, Some(c2)),
			join_row(p, Some(c1)),
		];

		let parents = fold(&rows).unwrap();
		assert_eq!(parents.len(), 1);
		assert_eq!(parents[0].id, p);
		assert_eq!(parents[0].children, vec![c1, c2]);

		// Row order must not affect the dedup, only first-seen ordering.
		let mut reversed = rows;
		reversed.reverse();
		let parents = fold(&reversed).unwrap();
		assert_eq!(parents.len(), 1);
		assert_eq!(parents[0].children, vec![c2, c1]);
	}

	#[test]
	fn parents_come_back_in_first_seen_order() {
		let p1 = Uuid::new_v4();
		let p2 = Uuid::new_v4();
		let c = Uuid::new_v4();

		let rows = vec![
			join_row(p2, None),
			join_row(p1, Some(c)),
			join_row(p2, Some(c)),
		];

		let parents = fold(&rows).unwrap();
		assert_eq!(parents.len(), 2);
		assert_eq!(parents[0].id, p2);
		assert_eq!(parents[1].id, p1);
		assert_eq!(parents[0].children, vec![c]);
	}

	#[test]
	fn unmatched_left_join_rows_attach_no_children() {
		let p = Uuid::new_v4();
		let parents = fold(&[join_row(p, None)]).unwrap();
		assert_eq!(parents.len(), 1);
		assert!(parents[0].children.is_empty());
	}

	#[test]
	fn missing_parent_column_is_a_mapping_error() {
		let row = SqlRow::new(vec![("c_id".to_string(), SqlValue::Null)]);
		let err = fold(&[row]).unwrap_err();
		assert!(matches!(err, DbError::Mapping(_)));
	}
}
