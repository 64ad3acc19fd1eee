// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source adapters for the catalog aggregator.
//!
//! Each adapter turns raw responses from one unreliable source into a partial
//! fragment. Failures are contained here: adapters log and return `None`
//! rather than propagating errors into the plugin task.
//!
//! - [`RemoteIndex`] / [`LocalIndex`]: catalogue listing and per-plugin descriptors
//! - [`RepositoryAdapter`]: the plugin's `mcdreforged.plugin.json` and repository statistics
//! - [`ReleaseAdapter`]: latest version and update time from the rendered plugin page

pub mod endpoints;
pub mod index;
pub mod release;
pub mod repository;

use std::sync::Arc;

use mcdr_catalog_fetch::Fetcher;

pub use endpoints::{RepoRef, SourceEndpoints};
pub use index::{LocalIndex, RemoteIndex};
pub use release::{extract_release_info, version_from_tag, ReleaseAdapter};
pub use repository::{parse_metadata, RepositoryAdapter};

/// The per-plugin adapters, sharing one fetcher.
pub struct Sources {
    pub repository: RepositoryAdapter,
    pub release: ReleaseAdapter,
}

impl Sources {
    pub fn new(fetcher: Fetcher, endpoints: Arc<SourceEndpoints>) -> Self {
        Self {
            repository: RepositoryAdapter::new(fetcher.clone(), Arc::clone(&endpoints)),
            release: ReleaseAdapter::new(fetcher, endpoints),
        }
    }
}
