// Cross-file comparison of two user lists keyed by email.
// Pure functions: two tables in, set differences and field mismatches out.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{Field, SourceTable};

/// Fields compared for users present in both lists.
pub const COMPARED_FIELDS: [Field; 3] = [Field::Name, Field::Phone, Field::Referral];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMismatch {
    pub email: String,
    pub field: Field,
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiffSummary {
    pub left_label: String,
    pub right_label: String,
    pub left_only: usize,
    pub right_only: usize,
    pub in_both: usize,
    pub with_differences: usize,
    pub total_unique: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CrossDiff {
    pub left_only: BTreeSet<String>,
    pub right_only: BTreeSet<String>,
    pub in_both: BTreeSet<String>,
    /// Ordered by email, then by `COMPARED_FIELDS` order.
    pub mismatches: Vec<FieldMismatch>,
    pub summary: DiffSummary,
}

impl CrossDiff {
    /// Mismatches grouped per email, for reports and the differences file.
    pub fn mismatches_by_email(&self) -> Vec<(&str, Vec<&FieldMismatch>)> {
        let mut out: Vec<(&str, Vec<&FieldMismatch>)> = Vec::new();
        for m in &self.mismatches {
            let same_email = out.last().is_some_and(|(email, _)| *email == m.email);
            if same_email {
                if let Some((_, group)) = out.last_mut() {
                    group.push(m);
                }
            } else {
                out.push((m.email.as_str(), vec![m]));
            }
        }
        out
    }
}

/// Trimmed, case-insensitive inequality. Empty on either side is not a mismatch.
pub fn values_differ(left: &str, right: &str) -> bool {
    let (l, r) = (left.trim(), right.trim());
    !l.is_empty() && !r.is_empty() && l.to_lowercase() != r.to_lowercase()
}

pub fn diff_tables(left: &SourceTable, right: &SourceTable) -> CrossDiff {
    let left_keys: BTreeSet<String> = left.records.keys().cloned().collect();
    let right_keys: BTreeSet<String> = right.records.keys().cloned().collect();

    let left_only: BTreeSet<String> = left_keys.difference(&right_keys).cloned().collect();
    let right_only: BTreeSet<String> = right_keys.difference(&left_keys).cloned().collect();
    let in_both: BTreeSet<String> = left_keys.intersection(&right_keys).cloned().collect();

    let mut mismatches = Vec::new();
    for email in &in_both {
        let (Some(l), Some(r)) = (left.get(email), right.get(email)) else {
            continue;
        };
        for field in COMPARED_FIELDS {
            if values_differ(l.get(field), r.get(field)) {
                mismatches.push(FieldMismatch {
                    email: email.clone(),
                    field,
                    left: l.get(field).to_string(),
                    right: r.get(field).to_string(),
                });
            }
        }
    }

    let with_differences = mismatches
        .iter()
        .map(|m| m.email.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let summary = DiffSummary {
        left_label: left.label.clone(),
        right_label: right.label.clone(),
        left_only: left_only.len(),
        right_only: right_only.len(),
        in_both: in_both.len(),
        with_differences,
        total_unique: left_keys.union(&right_keys).count(),
    };

    CrossDiff {
        left_only,
        right_only,
        in_both,
        mismatches,
        summary,
    }
}
