// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for MCDR catalog integration tests.
//!
//! Provides fake upstream services and in-memory adapters for fast,
//! deterministic, CI-runnable tests without network access.
//!
//! # Components
//!
//! - [`FakeCatalogue`] - wiremock server standing in for the catalogue API, the CDN, and the release pages
//! - [`MockIndex`] - in-memory plugin index with injectable failures

pub mod harness;
pub mod mock_index;

pub use harness::{FIXED_NOW, FakeCatalogue, FakeCatalogueBuilder, release_page};
pub use mock_index::MockIndex;
