// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The catalog pipeline: per-plugin fan-out, merge, reconcile, commit.
//!
//! - [`merge`]: pure per-field precedence over index, repository, release, and prior data
//! - [`reconcile`]: folds fresh records into the prior catalog by identifier
//! - [`Orchestrator`]: one task per plugin, all-or-nothing commit
//! - [`JsonFileStore`]: `plugins.json` read and atomic replace

pub mod merge;
pub mod orchestrator;
pub mod reconcile;
pub mod shutdown;
pub mod store;

pub use merge::{MergeInputs, merge};
pub use orchestrator::{Clock, Orchestrator, PluginOutcome, RunSummary, process_plugin};
pub use reconcile::reconcile;
pub use shutdown::install_signal_handler;
pub use store::JsonFileStore;
