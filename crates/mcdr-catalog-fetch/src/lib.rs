// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-limited fetcher shared by every source adapter.
//!
//! The [`Fetcher`] owns the only shared mutable state of a catalog run: a
//! fixed pool of request slots. Clients are configured explicitly through
//! [`ClientConfig`] rather than process-wide session state.

pub mod client;
pub mod fetcher;

pub use client::ClientConfig;
pub use fetcher::{FetchStats, Fetcher};
