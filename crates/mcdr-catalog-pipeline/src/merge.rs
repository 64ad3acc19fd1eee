// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merge engine: folds the per-source fragments and the prior record into one
//! catalog record.
//!
//! Every field is resolved independently. Live values win when present and
//! non-empty; otherwise the prior record's value is carried forward so that a
//! transient failure never erases what an earlier run learned.

use std::collections::BTreeMap;

use mcdr_catalog_core::types::tree_url;
use mcdr_catalog_core::{
    Author, CatalogRecord, Description, ReleaseInfo, SourceFragment, DEFAULT_VERSION,
};

/// Inputs for one plugin. Any source may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeInputs<'a> {
    /// Folder name in the catalogue index.
    pub slug: &'a str,
    pub index: Option<&'a SourceFragment>,
    pub repository: Option<&'a SourceFragment>,
    pub release: Option<&'a ReleaseInfo>,
    pub prior: Option<&'a CatalogRecord>,
}

/// Merges the inputs into a record stamped with `now`.
///
/// Pure and deterministic: the same inputs and timestamp always give the same record.
pub fn merge(inputs: MergeInputs<'_>, now: &str) -> CatalogRecord {
    let MergeInputs {
        slug,
        index,
        repository,
        release,
        prior,
    } = inputs;

    let id = index
        .and_then(|f| non_empty(f.id.as_deref()))
        .map(str::to_string)
        .unwrap_or_else(|| slug.to_string());

    let name = first_text([
        index.and_then(|f| f.name.as_deref()),
        repository.and_then(|f| f.name.as_deref()),
        prior.and_then(|p| p.name.as_deref()),
    ]);

    let description = Description {
        en_us: first_text([
            index.and_then(|f| f.description.en_us.as_deref()),
            repository.and_then(|f| f.description.en_us.as_deref()),
            prior.map(|p| p.description.en_us.as_str()),
        ])
        .unwrap_or_default(),
        zh_cn: first_text([
            index.and_then(|f| f.description.zh_cn.as_deref()),
            repository.and_then(|f| f.description.zh_cn.as_deref()),
            prior.map(|p| p.description.zh_cn.as_str()),
        ])
        .unwrap_or_default(),
    };

    let dependencies = first_map([
        index.and_then(|f| f.dependencies.as_ref()),
        repository.and_then(|f| f.dependencies.as_ref()),
        prior.map(|p| &p.dependencies),
    ]);

    let labels = first_list([
        index.and_then(|f| f.labels.as_deref()),
        repository.and_then(|f| f.labels.as_deref()),
        prior.map(|p| p.labels.as_slice()),
    ]);

    let authors: Vec<Author> = first_list([
        index.and_then(|f| f.authors.as_deref()),
        repository.and_then(|f| f.authors.as_deref()),
        prior.map(|p| p.authors.as_slice()),
    ]);

    let version = first_text([
        repository.and_then(|f| f.version.as_deref()),
        prior.map(|p| p.version.as_str()),
    ])
    .unwrap_or_else(|| DEFAULT_VERSION.to_string());

    let latest_version = first_text([
        release.and_then(|r| r.latest_version.as_deref()),
        prior.and_then(|p| p.latest_version.as_deref()),
    ]);
    let last_update_time = first_text([
        release.and_then(|r| r.last_update_time.as_deref()),
        prior.and_then(|p| p.last_update_time.as_deref()),
    ]);

    let stats = repository.map(|f| &f.stats);
    let live_downloads = stats.and_then(|s| s.downloads).unwrap_or(0);
    let downloads = live_downloads.max(prior.map_or(0, |p| p.downloads));

    let license = first_text([
        stats.and_then(|s| s.license.as_deref()),
        prior.and_then(|p| p.license.as_deref()),
    ]);
    let license_url = first_text([
        stats.and_then(|s| s.license_url.as_deref()),
        prior.and_then(|p| p.license_url.as_deref()),
    ]);
    let readme_url = first_text([
        stats.and_then(|s| s.readme_url.as_deref()),
        prior.and_then(|p| p.readme_url.as_deref()),
    ]);

    let live_repository_url = index.and_then(|f| {
        tree_url(
            f.repository.as_deref()?,
            f.branch.as_deref(),
            f.related_path.as_deref(),
        )
    });
    let repository_url = live_repository_url
        .or_else(|| first_text([prior.and_then(|p| p.repository_url.as_deref())]));

    CatalogRecord {
        id,
        name,
        version,
        description,
        dependencies,
        labels,
        authors,
        repository_url,
        downloads,
        license,
        license_url,
        readme_url,
        latest_version,
        last_update_time,
        update_time: now.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn first_text<const N: usize>(candidates: [Option<&str>; N]) -> Option<String> {
    candidates
        .into_iter()
        .find_map(non_empty)
        .map(str::to_string)
}

fn first_list<T: Clone, const N: usize>(candidates: [Option<&[T]>; N]) -> Vec<T> {
    candidates
        .into_iter()
        .flatten()
        .find(|list| !list.is_empty())
        .map(<[T]>::to_vec)
        .unwrap_or_default()
}

fn first_map<const N: usize>(
    candidates: [Option<&BTreeMap<String, String>>; N],
) -> BTreeMap<String, String> {
    candidates
        .into_iter()
        .flatten()
        .find(|map| !map.is_empty())
        .cloned()
        .unwrap_or_default()
}
