use serde::Serialize;

use crate::config::ReconConfig;
use crate::consolidate::consolidate;
use crate::diff::{diff_tables, CrossDiff};
use crate::error::ReconError;
use crate::ingest::{load_manual, load_payments, load_roster, load_system};
use crate::model::{ConsolidatedUser, SourceTable};
use crate::profile::{profile_table, SourceProfile};
use crate::summary::{compute_summary, ConsolidationSummary};

/// Decoded contents of the three exports.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub system: String,
    pub manual: String,
    pub payments: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LedgerStats {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub users: usize,
    pub payment_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceStats {
    pub system: SourceProfile,
    pub manual: SourceProfile,
    pub payments: LedgerStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ConsolidationSummary,
    pub sources: SourceStats,
    pub users: Vec<ConsolidatedUser>,
}

fn meta(config: &ReconConfig) -> ReconMeta {
    ReconMeta {
        config_name: config.name.clone(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        run_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Ingest, consolidate and summarize. Fails before consolidating if any source fails.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    config.validate()?;

    let system = load_system(&input.system, config)?;
    let manual = load_manual(&input.manual, config)?;
    let ledger = load_payments(&input.payments, config)?;

    let users = consolidate(&system, &manual, &ledger.latest, &config.status);
    let summary = compute_summary(&users);

    let sources = SourceStats {
        system: profile_table(&system),
        manual: profile_table(&manual),
        payments: LedgerStats {
            rows_read: ledger.rows_read,
            rows_skipped: ledger.rows_skipped,
            users: ledger.latest.len(),
            payment_rows: ledger.payment_rows(),
        },
    };

    Ok(ReconResult {
        meta: meta(config),
        summary,
        sources,
        users,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffResult {
    pub meta: ReconMeta,
    #[serde(skip)]
    pub left: SourceTable,
    #[serde(skip)]
    pub right: SourceTable,
    pub diff: CrossDiff,
}

/// Compare two user lists of unknown layout. Each side is `(label, csv)`.
pub fn run_diff(config: &ReconConfig, left: (&str, &str), right: (&str, &str)) -> Result<DiffResult, ReconError> {
    config.validate()?;

    let left = load_roster(left.0, left.1, config)?;
    let right = load_roster(right.0, right.1, config)?;
    let diff = diff_tables(&left, &right);

    log::info!(
        "diff {} vs {}: {} only left, {} only right, {} in both, {} with differences",
        left.label,
        right.label,
        diff.summary.left_only,
        diff.summary.right_only,
        diff.summary.in_both,
        diff.summary.with_differences,
    );

    Ok(DiffResult {
        meta: meta(config),
        left,
        right,
        diff,
    })
}
