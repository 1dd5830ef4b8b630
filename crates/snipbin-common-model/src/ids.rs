// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! ID newtypes for every snipbin entity family.
//!
//! Type-safe wrappers around UUIDs ([`UserId`], [`SnippetId`], [`CommentId`],
//! etc.) preventing accidental mixing of identifiers across entities. All ID
//! types serialize transparently as UUID strings and convert to/from
//! [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(SnippetId, "Unique identifier for a code snippet.");
define_id_type!(SnippetVersionId, "Unique identifier for a snippet version snapshot.");
define_id_type!(TagId, "Unique identifier for a tag.");
define_id_type!(CommentId, "Unique identifier for a comment.");
define_id_type!(CommentLikeId, "Unique identifier for a comment like.");
define_id_type!(ShareTokenId, "Unique identifier for a share token.");
define_id_type!(ClipboardEntryId, "Unique identifier for a clipboard history entry.");
define_id_type!(SettingsHistoryId, "Unique identifier for a settings history record.");

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn generated_ids_are_unique() {
		let mut seen = HashSet::new();
		for _ in 0..100 {
			assert!(seen.insert(CommentId::generate().to_string()));
		}
	}

	#[test]
	fn ids_round_trip_through_uuid() {
		let id = SnippetId::generate();
		let uuid: Uuid = id.into();
		assert_eq!(SnippetId::from(uuid), id);
	}
}
