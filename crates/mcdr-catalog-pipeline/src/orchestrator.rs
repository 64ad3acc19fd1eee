// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-plugin task fan-out and the all-or-nothing commit.
//!
//! One task is spawned per listed plugin. Tasks share nothing mutable except
//! the fetcher's slot pool; each yields a [`PluginOutcome`] that is folded
//! into the catalog by a single reconcile pass once every task has finished.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mcdr_catalog_core::time::now_catalog_time;
use mcdr_catalog_core::{CatalogError, CatalogRecord, CatalogStore, PluginDescriptor, PluginIndex};
use mcdr_catalog_sources::Sources;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::merge::{MergeInputs, merge};
use crate::reconcile::reconcile;

/// Produces the `update_time` stamp for each merged record.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

/// Result of processing one plugin. A plugin task never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginOutcome {
    /// A merged record. `degraded` is set when the descriptor or the
    /// repository metadata could not be read and prior data filled the gaps.
    Fresh { record: CatalogRecord, degraded: bool },
    /// The descriptor carries `disable: true`.
    Skipped { slug: String, id: String },
    /// The descriptor could not be read and no prior record is keyed by the
    /// slug, so the declared id is unknown. Nothing is emitted; prior records
    /// under other ids are retained by reconciliation.
    Unresolved { slug: String },
}

/// Counters for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub listed: usize,
    pub fresh: usize,
    pub degraded: usize,
    pub skipped: usize,
    /// Plugins whose descriptor was unreadable with nothing prior to fall back on.
    pub unresolved: usize,
    /// Prior records kept without a fresh counterpart.
    pub retained: usize,
    pub written: usize,
}

/// Drives the index, the source adapters, the merge, and the store.
pub struct Orchestrator {
    index: Arc<dyn PluginIndex>,
    sources: Arc<Sources>,
    store: Arc<dyn CatalogStore>,
    clock: Clock,
}

impl Orchestrator {
    pub fn new(index: Arc<dyn PluginIndex>, sources: Arc<Sources>, store: Arc<dyn CatalogStore>) -> Self {
        Self {
            index,
            sources,
            store,
            clock: Arc::new(now_catalog_time),
        }
    }

    /// Replaces the wall clock, for deterministic timestamps.
    pub fn with_clock(mut self, clock: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Runs the whole pipeline and commits the reconciled catalog.
    ///
    /// A store read failure or a listing failure aborts before any plugin is
    /// processed. Cancellation abandons in-flight tasks and skips the commit.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunSummary, CatalogError> {
        let prior = self.store.load().await?;
        let slugs = tokio::select! {
            listed = self.index.list() => listed?,
            _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
        };
        info!(index = self.index.name(), plugins = slugs.len(), prior = prior.len(), "run started");

        let prior_by_id: Arc<HashMap<String, CatalogRecord>> = Arc::new(
            prior
                .iter()
                .map(|record| (record.id.clone(), record.clone()))
                .collect(),
        );

        let mut tasks: JoinSet<(usize, PluginOutcome)> = JoinSet::new();
        for (position, slug) in slugs.iter().cloned().enumerate() {
            let index = Arc::clone(&self.index);
            let sources = Arc::clone(&self.sources);
            let prior_by_id = Arc::clone(&prior_by_id);
            let clock = Arc::clone(&self.clock);
            tasks.spawn(async move {
                let outcome = process_plugin(&slug, index.as_ref(), &sources, &prior_by_id, &clock).await;
                (position, outcome)
            });
        }

        let mut outcomes: Vec<Option<PluginOutcome>> = vec![None; slugs.len()];
        loop {
            let joined = tokio::select! {
                joined = tasks.join_next() => joined,
                _ = cancel.cancelled() => {
                    warn!(pending = tasks.len(), "run cancelled, abandoning in-flight plugins");
                    tasks.abort_all();
                    return Err(CatalogError::Cancelled);
                }
            };
            match joined {
                Some(Ok((position, outcome))) => outcomes[position] = Some(outcome),
                Some(Err(join_error)) => {
                    error!(error = %join_error, "plugin task failed, prior record retained");
                }
                None => break,
            }
        }

        let mut summary = RunSummary {
            listed: slugs.len(),
            ..RunSummary::default()
        };
        let mut fresh = Vec::with_capacity(slugs.len());
        let mut hard_skipped = HashSet::new();
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                PluginOutcome::Fresh { record, degraded } => {
                    summary.fresh += 1;
                    if degraded {
                        summary.degraded += 1;
                    }
                    fresh.push(record);
                }
                PluginOutcome::Skipped { slug, id } => {
                    summary.skipped += 1;
                    hard_skipped.insert(slug);
                    hard_skipped.insert(id);
                }
                PluginOutcome::Unresolved { .. } => summary.unresolved += 1,
            }
        }

        let fresh_ids: HashSet<&str> = fresh.iter().map(|r| r.id.as_str()).collect();
        summary.retained = prior
            .iter()
            .filter(|r| !fresh_ids.contains(r.id.as_str()) && !hard_skipped.contains(&r.id))
            .count();

        let catalog = reconcile(prior, fresh, &hard_skipped);

        if cancel.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }
        self.store.commit(&catalog).await?;
        summary.written = catalog.len();
        info!(
            records = summary.written,
            fresh = summary.fresh,
            degraded = summary.degraded,
            skipped = summary.skipped,
            unresolved = summary.unresolved,
            retained = summary.retained,
            "catalog written"
        );
        Ok(summary)
    }
}

/// Processes one plugin end to end. Every source failure degrades to an
/// absent fragment; the result is always an outcome.
///
/// Without a descriptor the slug is the only identifier, so a record is only
/// built when a prior record is keyed by that slug.
pub async fn process_plugin(
    slug: &str,
    index: &dyn PluginIndex,
    sources: &Sources,
    prior_by_id: &HashMap<String, CatalogRecord>,
    clock: &Clock,
) -> PluginOutcome {
    let descriptor = match index.descriptor(slug).await {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            warn!(plugin = slug, error = %e, "descriptor unavailable, using prior data");
            None
        }
    };

    if let Some(descriptor) = &descriptor
        && let Err(CatalogError::HardSkip { id }) = check_enabled(slug, descriptor)
    {
        info!(plugin = %id, "plugin disabled, excluded from catalog");
        return PluginOutcome::Skipped {
            slug: slug.to_string(),
            id,
        };
    }

    if descriptor.is_none() && !prior_by_id.contains_key(slug) {
        warn!(plugin = slug, "declared id unknown and no prior record, nothing emitted");
        return PluginOutcome::Unresolved {
            slug: slug.to_string(),
        };
    }

    let index_fragment = descriptor.as_ref().map(PluginDescriptor::to_fragment);
    let id = index_fragment
        .as_ref()
        .and_then(|f| f.id.clone())
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| slug.to_string());

    let repository = async {
        match &descriptor {
            Some(descriptor) => sources.repository.fragment(&id, descriptor).await,
            None => None,
        }
    };
    let (repository, release) = tokio::join!(repository, sources.release.release_info(&id));

    let prior = prior_by_id.get(&id).or_else(|| prior_by_id.get(slug));
    let degraded = index_fragment.is_none() || repository.is_none();
    let record = merge(
        MergeInputs {
            slug,
            index: index_fragment.as_ref(),
            repository: repository.as_ref(),
            release: release.as_ref(),
            prior,
        },
        &clock(),
    );

    if degraded {
        warn!(plugin = %record.id, has_prior = prior.is_some(), "plugin processed with degraded sources");
    } else {
        info!(plugin = %record.id, version = %record.version, "plugin processed");
    }
    PluginOutcome::Fresh { record, degraded }
}

fn check_enabled(slug: &str, descriptor: &PluginDescriptor) -> Result<(), CatalogError> {
    if descriptor.is_disabled() {
        let id = descriptor
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| slug.to_string());
        return Err(CatalogError::HardSkip { id });
    }
    Ok(())
}
