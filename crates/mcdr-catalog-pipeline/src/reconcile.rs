// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Folds freshly merged records into the previously persisted catalog.

use std::collections::{HashMap, HashSet};

use mcdr_catalog_core::CatalogRecord;
use tracing::{debug, warn};

/// Replaces prior records by identifier, appends new ones, and drops
/// hard-skipped identifiers.
///
/// Prior records with no fresh counterpart are kept in place: only an explicit
/// `disable` removes a plugin. Record identifiers in the output are unique and
/// non-empty; unaffected records keep their prior order.
pub fn reconcile(
    prior: Vec<CatalogRecord>,
    fresh: Vec<CatalogRecord>,
    hard_skipped: &HashSet<String>,
) -> Vec<CatalogRecord> {
    let mut catalog: Vec<CatalogRecord> = Vec::with_capacity(prior.len().max(fresh.len()));
    let mut position: HashMap<String, usize> = HashMap::new();

    for record in prior {
        if record.id.trim().is_empty() {
            warn!("dropping prior record without identifier");
            continue;
        }
        if hard_skipped.contains(&record.id) {
            debug!(plugin = %record.id, "removing disabled plugin from catalog");
            continue;
        }
        if position.contains_key(&record.id) {
            warn!(plugin = %record.id, "duplicate prior record ignored");
            continue;
        }
        position.insert(record.id.clone(), catalog.len());
        catalog.push(record);
    }

    for record in fresh {
        if record.id.trim().is_empty() || hard_skipped.contains(&record.id) {
            continue;
        }
        match position.get(&record.id) {
            Some(&at) => catalog[at] = record,
            None => {
                position.insert(record.id.clone(), catalog.len());
                catalog.push(record);
            }
        }
    }

    catalog
}
