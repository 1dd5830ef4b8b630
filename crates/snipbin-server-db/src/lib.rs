// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Database layer for the snipbin server.
//!
//! One repository per entity family, each owning a `SqlitePool` and exposing
//! an async store trait. Rows are captured into a dialect-neutral
//! representation ([`row::SqlRow`]) and decoded through [`row`]'s tolerant
//! scalar decoders; listing queries share one WHERE clause between their
//! count and data queries ([`filter`]); one-to-many joins are folded through
//! [`mapper`]; comment subtrees are assembled in memory by [`tree`].

pub mod clipboard;
pub mod comment;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod page;
pub mod pool;
pub mod row;
pub mod settings;
pub mod share_token;
pub mod snippet;
pub mod tag;
pub mod testing;
pub mod tree;
pub mod user;
pub mod version;

pub use clipboard::{ClipboardRepository, ClipboardStore};
pub use comment::{CommentFilter, CommentRepository, CommentStore, CommentWithLikes};
pub use error::{DbError, Result};
pub use filter::{FilterClause, Pagination, SqlArg};
pub use page::Page;
pub use pool::create_pool;
pub use settings::{SettingsHistoryFilter, SettingsRepository, SettingsStore};
pub use share_token::{ShareTokenRepository, ShareTokenStore};
pub use snippet::{SnippetFilter, SnippetRepository, SnippetStore};
pub use tag::{TagRepository, TagStore};
pub use tree::{build_reply_tree, flatten};
pub use user::{UserRepository, UserStore};
pub use version::{SnippetVersionRepository, SnippetVersionStore};
