// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

pub mod clipboard;
pub mod comment;
pub mod ids;
pub mod settings;
pub mod share;
pub mod snippet;
pub mod user;

pub use clipboard::*;
pub use comment::*;
pub use ids::*;
pub use settings::*;
pub use share::*;
pub use snippet::*;
pub use user::*;
