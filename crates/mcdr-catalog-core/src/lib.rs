// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the MCDR plugin catalog aggregator.
//!
//! This crate provides the data model shared by every stage of the pipeline
//! (index descriptors, source fragments, release info, merged catalog records),
//! the error taxonomy, the tolerant normalizers for inconsistent upstream
//! metadata, and the traits behind which the index and store live.

pub mod error;
pub mod normalize;
pub mod time;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CatalogError;
pub use traits::{CatalogStore, PluginIndex};
pub use types::{
    Author, CatalogRecord, Description, LocalizedText, PluginDescriptor, ReleaseInfo,
    RepositoryStats, SourceFragment, DEFAULT_VERSION,
};
