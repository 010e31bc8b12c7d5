use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{AlertTag, ConsolidatedUser, SourceKind};

/// How many referrers the summaries list.
pub const TOP_REFERRERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub key: String,
    pub count: usize,
}

/// Count descending, then key ascending.
pub fn rank_counts(counts: BTreeMap<String, usize>) -> Vec<Count> {
    let mut ranked: Vec<Count> = counts
        .into_iter()
        .map(|(key, count)| Count { key, count })
        .collect();
    // stable: BTreeMap order breaks ties
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

pub fn count_values<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for v in values.filter(|v| !v.is_empty()) {
        *counts.entry(v.to_string()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsolidationSummary {
    pub total: usize,
    pub with_payments: usize,
    pub without_payments: usize,
    pub with_referral: usize,
    pub without_referral: usize,
    pub with_alerts: usize,
    pub by_source: Vec<Count>,
    pub plans: Vec<Count>,
    pub top_referrers: Vec<Count>,
    pub tags: Vec<Count>,
    /// In the system with no recorded payment.
    pub critical_users: Vec<String>,
    pub status_divergences: Vec<String>,
}

pub fn compute_summary(users: &[ConsolidatedUser]) -> ConsolidationSummary {
    let total = users.len();
    let with_payments = users.iter().filter(|u| u.has_payments).count();
    let with_referral = users.iter().filter(|u| !u.referral.is_empty()).count();

    let by_source = count_values(users.iter().flat_map(|u| u.sources.iter().map(|s| s.tag())));
    let tags = count_values(users.iter().flat_map(|u| u.tags.iter().map(|t| t.as_str())));

    let mut top_referrers = rank_counts(count_values(users.iter().map(|u| u.referral.as_str())));
    top_referrers.truncate(TOP_REFERRERS);

    ConsolidationSummary {
        total,
        with_payments,
        without_payments: total - with_payments,
        with_referral,
        without_referral: total - with_referral,
        with_alerts: users.iter().filter(|u| u.needs_review()).count(),
        by_source: rank_counts(by_source),
        plans: rank_counts(count_values(users.iter().map(|u| u.plan.as_str()))),
        top_referrers,
        tags: rank_counts(tags),
        critical_users: users
            .iter()
            .filter(|u| !u.has_payments && u.in_source(SourceKind::System))
            .map(|u| u.email.clone())
            .collect(),
        status_divergences: users
            .iter()
            .filter(|u| u.has_tag(AlertTag::StatusDivergence))
            .map(|u| u.email.clone())
            .collect(),
    }
}
