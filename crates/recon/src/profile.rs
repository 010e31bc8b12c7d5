use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Field, SourceTable};
use crate::summary::{count_values, rank_counts, Count, TOP_REFERRERS};

/// Fill rates and distributions for a single ingested file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceProfile {
    pub label: String,
    pub total: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub with_name: usize,
    pub with_phone: usize,
    pub with_referral: usize,
    pub with_notes: usize,
    pub with_plan: usize,
    pub with_status: usize,
    pub plans: Vec<Count>,
    pub top_referrers: Vec<Count>,
    pub duplicates: BTreeMap<String, Vec<usize>>,
}

pub fn profile_table(table: &SourceTable) -> SourceProfile {
    let filled = |field: Field| {
        table
            .records
            .values()
            .filter(|r| !r.get(field).is_empty())
            .count()
    };
    let values = |field: Field| count_values(table.records.values().map(move |r| r.get(field)));

    let mut top_referrers = rank_counts(values(Field::Referral));
    top_referrers.truncate(TOP_REFERRERS);

    SourceProfile {
        label: table.label.clone(),
        total: table.len(),
        rows_read: table.rows_read,
        rows_skipped: table.rows_skipped,
        with_name: filled(Field::Name),
        with_phone: filled(Field::Phone),
        with_referral: filled(Field::Referral),
        with_notes: filled(Field::Notes),
        with_plan: filled(Field::Plan),
        with_status: filled(Field::Status),
        plans: rank_counts(values(Field::Plan)),
        top_referrers,
        duplicates: table.duplicates.clone(),
    }
}

/// Share of `part` in `total` as a percentage; 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}
