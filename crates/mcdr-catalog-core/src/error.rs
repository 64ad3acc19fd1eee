// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the catalog aggregator.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type shared by the fetcher, the source adapters, and the store.
///
/// Source adapters never let these escape a plugin task: every variant except
/// `FatalConfig` and `Store` is converted into an absent fragment at the
/// adapter boundary.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Timeout, connection failure, or 5xx/429 response that survived every retry.
    #[error("transient fetch failure for {url} after {attempts} attempt(s): {message}")]
    TransientFetch {
        url: String,
        attempts: u32,
        message: String,
    },

    /// Non-retryable HTTP status (404, 403, ...).
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Malformed JSON or HTML from a source. Never retried.
    #[error("failed to parse {context}: {message}")]
    Parse { context: String, message: String },

    /// The index descriptor carries `disable: true`.
    #[error("plugin {id} is disabled in the catalogue index")]
    HardSkip { id: String },

    /// Missing credential or unreachable top-level listing. Aborts the run.
    #[error("fatal configuration error: {0}")]
    FatalConfig(String),

    /// Reading the prior catalog or committing the new one failed.
    #[error("store error at {}: {source}", path.display())]
    Store {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The run was cancelled before the catalog was committed.
    #[error("run cancelled before commit")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// Builds a `Parse` error from any displayable cause.
    pub fn parse(context: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        CatalogError::Parse {
            context: context.into(),
            message: cause.to_string(),
        }
    }

    /// Returns true for failures the fetcher is allowed to retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, CatalogError::TransientFetch { .. })
    }
}
