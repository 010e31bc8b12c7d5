//! Human-readable reports. Everything goes to stderr so stdout stays free for `--json`.

use roster_recon::diff::CrossDiff;
use roster_recon::export::describe_mismatches;
use roster_recon::profile::{percent, SourceProfile};
use roster_recon::summary::{ConsolidationSummary, Count};
use roster_recon::ReconResult;

/// How many emails a list section shows before truncating.
const LIST_LIMIT: usize = 20;

fn counts(title: &str, counts: &[Count]) {
    if counts.is_empty() {
        return;
    }
    eprintln!("{title}:");
    for c in counts {
        eprintln!("  {:<28} {:>6}", c.key, c.count);
    }
}

fn email_list(title: &str, emails: &[&str]) {
    if emails.is_empty() {
        return;
    }
    eprintln!("{title} ({}):", emails.len());
    for email in emails.iter().take(LIST_LIMIT) {
        eprintln!("  {email}");
    }
    if emails.len() > LIST_LIMIT {
        eprintln!("  ... and {} more", emails.len() - LIST_LIMIT);
    }
}

fn ratio(label: &str, part: usize, total: usize) {
    eprintln!("  {label:<28} {part:>6} ({:.1}%)", percent(part, total));
}

pub fn print_consolidation(result: &ReconResult) {
    let s: &ConsolidationSummary = &result.summary;
    let src = &result.sources;

    eprintln!("{}: {} unique users", result.meta.config_name, s.total);
    eprintln!(
        "sources: system {} ({} skipped), manual {} ({} skipped), payments {} users / {} rows ({} skipped)",
        src.system.total,
        src.system.rows_skipped,
        src.manual.total,
        src.manual.rows_skipped,
        src.payments.users,
        src.payments.payment_rows,
        src.payments.rows_skipped,
    );
    ratio("with payments", s.with_payments, s.total);
    ratio("without payments", s.without_payments, s.total);
    ratio("with referral", s.with_referral, s.total);
    ratio("without referral", s.without_referral, s.total);
    ratio("needing review", s.with_alerts, s.total);

    counts("by source", &s.by_source);
    counts("plans", &s.plans);
    counts("top referrers", &s.top_referrers);
    counts("alerts", &s.tags);

    let critical: Vec<&str> = s.critical_users.iter().map(String::as_str).collect();
    email_list("in the system without payments", &critical);
    let divergent: Vec<&str> = s.status_divergences.iter().map(String::as_str).collect();
    email_list("status divergences", &divergent);
}

pub fn print_diff(diff: &CrossDiff) {
    let s = &diff.summary;
    eprintln!("{} vs {}: {} unique users", s.left_label, s.right_label, s.total_unique);
    eprintln!("  {:<28} {:>6}", format!("only in {}", s.left_label), s.left_only);
    eprintln!("  {:<28} {:>6}", format!("only in {}", s.right_label), s.right_only);
    eprintln!("  {:<28} {:>6}", "in both", s.in_both);
    eprintln!("  {:<28} {:>6}", "with differences", s.with_differences);

    let left: Vec<&str> = diff.left_only.iter().map(String::as_str).collect();
    email_list(&format!("only in {}", s.left_label), &left);
    let right: Vec<&str> = diff.right_only.iter().map(String::as_str).collect();
    email_list(&format!("only in {}", s.right_label), &right);

    let mismatches = describe_mismatches(diff);
    if !mismatches.is_empty() {
        eprintln!("differences ({}):", mismatches.len());
        for (email, text) in mismatches.iter().take(LIST_LIMIT) {
            eprintln!("  {email}: {text}");
        }
        if mismatches.len() > LIST_LIMIT {
            eprintln!("  ... and {} more", mismatches.len() - LIST_LIMIT);
        }
    }
}

pub fn print_profile(p: &SourceProfile) {
    eprintln!("{}: {} unique users", p.label, p.total);
    eprintln!("  rows read {}, skipped (no email) {}", p.rows_read, p.rows_skipped);
    ratio("with name", p.with_name, p.total);
    ratio("with phone", p.with_phone, p.total);
    ratio("with referral", p.with_referral, p.total);
    ratio("with notes", p.with_notes, p.total);
    ratio("with plan", p.with_plan, p.total);
    ratio("with status", p.with_status, p.total);
    counts("plans", &p.plans);
    counts("top referrers", &p.top_referrers);

    if !p.duplicates.is_empty() {
        eprintln!("duplicate emails ({}, last row wins):", p.duplicates.len());
        for (email, rows) in p.duplicates.iter().take(LIST_LIMIT) {
            let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
            eprintln!("  {email} (rows {})", rows.join(", "));
        }
    }
}
