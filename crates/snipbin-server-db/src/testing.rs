// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared schema helpers for in-memory test pools.

use sqlx::sqlite::SqlitePool;

pub async fn create_test_pool() -> SqlitePool {
	SqlitePool::connect(":memory:").await.unwrap()
}

pub async fn create_users_table(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS users (
			id TEXT PRIMARY KEY,
			username TEXT UNIQUE NOT NULL,
			display_name TEXT NOT NULL,
			email TEXT,
			avatar_url TEXT,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			deleted_at TEXT
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();
}

pub async fn create_snippets_table(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS snippets (
			id TEXT PRIMARY KEY,
			author_id TEXT NOT NULL,
			title TEXT NOT NULL,
			description TEXT,
			language TEXT NOT NULL,
			content TEXT NOT NULL,
			is_public INTEGER NOT NULL DEFAULT 0,
			view_count INTEGER NOT NULL DEFAULT 0,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			deleted_at TEXT
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();
}

pub async fn create_tags_tables(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS tags (
			id TEXT PRIMARY KEY,
			name TEXT UNIQUE NOT NULL,
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS snippet_tags (
			snippet_id TEXT NOT NULL,
			tag_id TEXT NOT NULL,
			PRIMARY KEY (snippet_id, tag_id)
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();
}

pub async fn create_snippet_versions_table(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS snippet_versions (
			id TEXT PRIMARY KEY,
			snippet_id TEXT NOT NULL,
			version INTEGER NOT NULL,
			title TEXT NOT NULL,
			language TEXT NOT NULL,
			content TEXT NOT NULL,
			created_by TEXT NOT NULL,
			created_at TEXT NOT NULL,
			UNIQUE (snippet_id, version)
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();
}

pub async fn create_comments_tables(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS comments (
			id TEXT PRIMARY KEY,
			snippet_id TEXT NOT NULL,
			author_id TEXT NOT NULL,
			parent_id TEXT,
			content TEXT NOT NULL,
			path TEXT NOT NULL DEFAULT '[]',
			depth INTEGER NOT NULL DEFAULT 0,
			like_count INTEGER NOT NULL DEFAULT 0,
			reply_count INTEGER NOT NULL DEFAULT 0,
			status INTEGER NOT NULL DEFAULT 0,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			deleted_at TEXT
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS comment_likes (
			id TEXT PRIMARY KEY,
			comment_id TEXT NOT NULL,
			user_id TEXT NOT NULL,
			created_at TEXT NOT NULL,
			UNIQUE (comment_id, user_id)
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();
}

pub async fn create_share_tokens_table(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS share_tokens (
			id TEXT PRIMARY KEY,
			token TEXT UNIQUE NOT NULL,
			snippet_id TEXT NOT NULL,
			created_by TEXT NOT NULL,
			expires_at TEXT,
			is_active INTEGER NOT NULL DEFAULT 1,
			access_count INTEGER NOT NULL DEFAULT 0,
			max_access_count INTEGER NOT NULL DEFAULT 0,
			permission INTEGER NOT NULL DEFAULT 0,
			password TEXT,
			allow_download INTEGER NOT NULL DEFAULT 1,
			allow_copy INTEGER NOT NULL DEFAULT 1,
			last_accessed_at TEXT,
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();
}

pub async fn create_clipboard_history_table(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS clipboard_history (
			id TEXT PRIMARY KEY,
			user_id TEXT NOT NULL,
			content TEXT NOT NULL,
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();
}

pub async fn create_settings_tables(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS system_settings (
			id INTEGER PRIMARY KEY CHECK (id = 1),
			site TEXT NOT NULL,
			security TEXT NOT NULL,
			feature TEXT NOT NULL,
			email TEXT NOT NULL,
			updated_at TEXT,
			updated_by TEXT
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS settings_history (
			id TEXT PRIMARY KEY,
			category INTEGER NOT NULL,
			old_value TEXT NOT NULL,
			new_value TEXT NOT NULL,
			changed_by TEXT,
			outcome INTEGER NOT NULL,
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();
}

pub async fn create_comment_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	create_users_table(&pool).await;
	create_snippets_table(&pool).await;
	create_comments_tables(&pool).await;
	pool
}

pub async fn create_snippet_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	create_users_table(&pool).await;
	create_snippets_table(&pool).await;
	create_tags_tables(&pool).await;
	create_snippet_versions_table(&pool).await;
	pool
}

pub async fn create_share_token_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	create_users_table(&pool).await;
	create_snippets_table(&pool).await;
	create_share_tokens_table(&pool).await;
	pool
}

pub async fn create_settings_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	create_settings_tables(&pool).await;
	pool
}

pub async fn create_clipboard_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	create_users_table(&pool).await;
	create_clipboard_history_table(&pool).await;
	pool
}
