// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent catalog store abstraction.

use async_trait::async_trait;

use crate::error::CatalogError;
use crate::types::CatalogRecord;

/// Reads the previous catalog and atomically replaces it with the new one.
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    /// Loads the previously persisted catalog. A store that has never been
    /// written returns an empty catalog.
    async fn load(&self) -> Result<Vec<CatalogRecord>, CatalogError>;

    /// Replaces the persisted catalog. Either the whole catalog is committed
    /// or the previous one is left untouched.
    async fn commit(&self, records: &[CatalogRecord]) -> Result<(), CatalogError>;
}
