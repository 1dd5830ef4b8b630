// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde::Serialize;

/// One page of a filtered listing plus the filter's total match count.
///
/// The count query and the data query run back to back without a shared
/// transaction, so `total_count` may reflect a slightly newer state than
/// `items` under concurrent writes.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub total_count: i64,
	pub page: u32,
	pub page_size: u32,
}

impl<T> Page<T> {
	pub fn new(items: Vec<T>, total_count: i64, page: u32, page_size: u32) -> Self {
		Self {
			items,
			total_count,
			page,
			page_size,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}
