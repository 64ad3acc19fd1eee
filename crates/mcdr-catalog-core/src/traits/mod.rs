// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seams between the pipeline and its collaborators.

pub mod index;
pub mod store;

pub use index::PluginIndex;
pub use store::CatalogStore;
