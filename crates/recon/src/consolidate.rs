//! Field-priority merge of the three sources into one record per email.

use std::collections::{BTreeMap, BTreeSet};

use crate::alerts::{derive_alerts, Presence};
use crate::config::StatusConfig;
use crate::model::{ConsolidatedUser, Field, LatestPaymentStatus, SourceKind, SourceRecord, SourceTable};

// ---------------------------------------------------------------------------
// Priority table
// ---------------------------------------------------------------------------

/// Merged output fields that are resolved from source values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Name,
    Phone,
    Referral,
    Plan,
    SystemStatus,
    Company,
    Role,
    Verified,
    CreatedAt,
    LastActivity,
    PaymentStatus,
    LastPaymentDate,
    DueDate,
    TotalCycles,
    Notes,
}

/// Ordered candidates for one output field. The first non-empty value wins.
#[derive(Debug, Clone, Copy)]
pub struct MergeRule {
    pub target: Target,
    pub candidates: &'static [(SourceKind, Field)],
}

const fn rule(target: Target, candidates: &'static [(SourceKind, Field)]) -> MergeRule {
    MergeRule { target, candidates }
}

use Field as F;
use SourceKind::{Manual, Payments, System};

pub const MERGE_RULES: [MergeRule; 15] = [
    rule(Target::Name, &[(Manual, F::Name), (System, F::Name), (Payments, F::Name)]),
    rule(Target::Phone, &[(Manual, F::Phone), (System, F::Phone), (Payments, F::Phone)]),
    rule(Target::Referral, &[(Manual, F::Referral), (Payments, F::Referral)]),
    rule(Target::Plan, &[(System, F::Plan)]),
    rule(Target::SystemStatus, &[(System, F::Status)]),
    rule(Target::Company, &[(System, F::Company)]),
    rule(Target::Role, &[(System, F::Role)]),
    rule(Target::Verified, &[(System, F::Verified)]),
    rule(Target::CreatedAt, &[(System, F::CreatedAt)]),
    rule(Target::LastActivity, &[(System, F::LastActivity)]),
    rule(Target::PaymentStatus, &[(Payments, F::FinalStatus)]),
    rule(Target::LastPaymentDate, &[(Payments, F::PaymentDate)]),
    rule(Target::DueDate, &[(Payments, F::DueDate)]),
    rule(Target::TotalCycles, &[(Payments, F::TotalCycles)]),
    rule(Target::Notes, &[(Manual, F::Notes), (Payments, F::Notes)]),
];

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// The records one email has in each source.
struct SourceView<'a> {
    system: Option<&'a SourceRecord>,
    manual: Option<&'a SourceRecord>,
    ledger: Option<&'a LatestPaymentStatus>,
}

impl SourceView<'_> {
    fn value(&self, source: SourceKind, field: Field) -> &str {
        match source {
            SourceKind::System => self.system.map(|r| r.get(field)).unwrap_or(""),
            SourceKind::Manual => self.manual.map(|r| r.get(field)).unwrap_or(""),
            SourceKind::Payments => self.ledger.map(|s| ledger_value(s, field)).unwrap_or(""),
        }
    }

    fn resolve(&self, rule: &MergeRule) -> String {
        rule.candidates
            .iter()
            .map(|&(source, field)| self.value(source, field))
            .find(|v| !v.is_empty())
            .unwrap_or("")
            .to_string()
    }

    fn presence(&self) -> Presence {
        Presence {
            system: self.system.is_some(),
            manual: self.manual.is_some(),
            payments: self.ledger.is_some(),
        }
    }
}

fn ledger_value(status: &LatestPaymentStatus, field: Field) -> &str {
    match field {
        Field::Name => &status.name,
        Field::Phone => &status.phone,
        Field::Referral => &status.referral,
        Field::Notes => &status.notes,
        Field::FinalStatus => &status.final_status,
        Field::PaymentDate => &status.last_payment_date,
        Field::DueDate => &status.due_date,
        Field::TotalCycles => &status.total_cycles,
        _ => "",
    }
}

/// Merge the three sources. One user per email in the union of keys, in email order.
pub fn consolidate(
    system: &SourceTable,
    manual: &SourceTable,
    latest: &BTreeMap<String, LatestPaymentStatus>,
    status: &StatusConfig,
) -> Vec<ConsolidatedUser> {
    let emails: BTreeSet<&String> = system
        .records
        .keys()
        .chain(manual.records.keys())
        .chain(latest.keys())
        .collect();

    let users: Vec<ConsolidatedUser> = emails
        .into_iter()
        .map(|email| {
            let view = SourceView {
                system: system.get(email),
                manual: manual.get(email),
                ledger: latest.get(email),
            };
            merge_user(email, &view, status)
        })
        .collect();

    log::info!(
        "consolidated {} users ({} system, {} manual, {} with payments)",
        users.len(),
        system.len(),
        manual.len(),
        latest.len(),
    );

    users
}

fn merge_user(email: &str, view: &SourceView<'_>, status: &StatusConfig) -> ConsolidatedUser {
    let presence = view.presence();
    let mut user = ConsolidatedUser {
        email: email.to_string(),
        ..ConsolidatedUser::default()
    };

    for rule in &MERGE_RULES {
        let value = view.resolve(rule);
        let slot = match rule.target {
            Target::Name => &mut user.name,
            Target::Phone => &mut user.phone,
            Target::Referral => &mut user.referral,
            Target::Plan => &mut user.plan,
            Target::SystemStatus => &mut user.system_status,
            Target::Company => &mut user.company,
            Target::Role => &mut user.role,
            Target::Verified => &mut user.verified,
            Target::CreatedAt => &mut user.created_at,
            Target::LastActivity => &mut user.last_activity,
            Target::PaymentStatus => &mut user.payment_status,
            Target::LastPaymentDate => &mut user.last_payment_date,
            Target::DueDate => &mut user.due_date,
            Target::TotalCycles => &mut user.total_cycles,
            Target::Notes => &mut user.notes,
        };
        *slot = value;
    }

    match view.ledger {
        Some(ledger) => {
            user.has_payments = true;
            user.total_payments = ledger.total_payments;
        }
        None => user.total_cycles = "0".into(),
    }

    user.sources = SourceKind::ALL
        .into_iter()
        .filter(|s| match s {
            SourceKind::System => presence.system,
            SourceKind::Manual => presence.manual,
            SourceKind::Payments => presence.payments,
        })
        .collect();

    user.tags = derive_alerts(presence, &user, status);
    user.alerts = user.tags.iter().map(|t| t.message().to_string()).collect();
    user
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AlertTag;

    fn table(rows: &[(&str, &[(Field, &str)])]) -> SourceTable {
        let mut t = SourceTable::default();
        for (i, (email, fields)) in rows.iter().enumerate() {
            let mut record = SourceRecord {
                row: i + 1,
                ..SourceRecord::default()
            };
            record.fields.insert(Field::Email, email.to_string());
            for (f, v) in fields.iter() {
                record.fields.insert(*f, v.to_string());
            }
            t.records.insert(email.to_string(), record);
        }
        t
    }

    fn latest(rows: &[(&str, LatestPaymentStatus)]) -> BTreeMap<String, LatestPaymentStatus> {
        rows.iter().map(|(e, s)| (e.to_string(), s.clone())).collect()
    }

    fn run(system: &SourceTable, manual: &SourceTable, pay: &BTreeMap<String, LatestPaymentStatus>) -> Vec<ConsolidatedUser> {
        consolidate(system, manual, pay, &StatusConfig::default())
    }

    #[test]
    fn manual_name_and_referral_win() {
        let system = table(&[("a@x.com", &[(Field::Name, "Ana")])]);
        let manual = table(&[(
            "a@x.com",
            &[(Field::Name, "Ana Maria"), (Field::Referral, "João")],
        )]);
        let users = run(&system, &manual, &BTreeMap::new());
        assert_eq!(users.len(), 1);
        let u = &users[0];
        assert_eq!(u.name, "Ana Maria");
        assert_eq!(u.referral, "João");
        assert_eq!(u.sources, vec![SourceKind::System, SourceKind::Manual]);
        assert!(!u.has_payments);
        assert_eq!(u.total_cycles, "0");
    }

    #[test]
    fn empty_manual_name_falls_back_to_system() {
        let system = table(&[("c@x.com", &[(Field::Name, "Carlos")])]);
        let manual = table(&[("c@x.com", &[(Field::Name, ""), (Field::Phone, "")])]);
        let users = run(&system, &manual, &BTreeMap::new());
        assert_eq!(users[0].name, "Carlos");
    }

    #[test]
    fn payment_ledger_is_last_resort_for_contact_fields() {
        let pay = latest(&[(
            "p@x.com",
            LatestPaymentStatus {
                name: "Paula".into(),
                phone: "555".into(),
                referral: "Rita".into(),
                notes: "from ledger".into(),
                final_status: "Active".into(),
                last_payment_date: "2025-03-01".into(),
                due_date: "2025-04-01".into(),
                total_cycles: "4".into(),
                total_payments: 4,
            },
        )]);
        let users = run(&SourceTable::default(), &SourceTable::default(), &pay);
        let u = &users[0];
        assert_eq!(u.name, "Paula");
        assert_eq!(u.phone, "555");
        assert_eq!(u.referral, "Rita");
        assert_eq!(u.notes, "from ledger");
        assert_eq!(u.payment_status, "Active");
        assert_eq!(u.last_payment_date, "2025-03-01");
        assert_eq!(u.due_date, "2025-04-01");
        assert_eq!(u.total_cycles, "4");
        assert_eq!(u.total_payments, 4);
        assert!(u.has_payments);
        assert_eq!(u.sources, vec![SourceKind::Payments]);
        // ledger-only users raise no presence alerts
        assert!(u.tags.is_empty());
    }

    #[test]
    fn system_never_supplies_referral_or_notes() {
        let system = table(&[(
            "s@x.com",
            &[(Field::Referral, "Ghost"), (Field::Notes, "ignored"), (Field::Plan, "Pro")],
        )]);
        let users = run(&system, &SourceTable::default(), &BTreeMap::new());
        let u = &users[0];
        assert_eq!(u.referral, "");
        assert_eq!(u.notes, "");
        assert_eq!(u.plan, "Pro");
        assert!(u.has_tag(AlertTag::NoReferral));
    }

    #[test]
    fn system_only_fields_ignore_other_sources() {
        let manual = table(&[("m@x.com", &[(Field::Plan, "Gold"), (Field::Status, "Active")])]);
        let users = run(&SourceTable::default(), &manual, &BTreeMap::new());
        assert_eq!(users[0].plan, "");
        assert_eq!(users[0].system_status, "");
        assert_eq!(users[0].tags, vec![AlertTag::OutsideSystem]);
    }

    #[test]
    fn manual_notes_beat_ledger_notes() {
        let manual = table(&[("n@x.com", &[(Field::Notes, "call back")])]);
        let pay = latest(&[(
            "n@x.com",
            LatestPaymentStatus {
                notes: "ledger note".into(),
                total_payments: 1,
                ..LatestPaymentStatus::default()
            },
        )]);
        let users = run(&SourceTable::default(), &manual, &pay);
        assert_eq!(users[0].notes, "call back");
    }

    #[test]
    fn ledger_referral_fills_empty_manual_referral() {
        let system = table(&[("ana@x.com", &[(Field::Status, "Active")])]);
        let manual = table(&[("ana@x.com", &[(Field::Referral, "")])]);
        let pay = latest(&[(
            "ana@x.com",
            LatestPaymentStatus {
                referral: "Rita".into(),
                final_status: "Active".into(),
                total_payments: 1,
                ..LatestPaymentStatus::default()
            },
        )]);
        let users = run(&system, &manual, &pay);
        let u = &users[0];
        assert_eq!(u.referral, "Rita");
        assert!(!u.has_tag(AlertTag::NoReferral));
        assert!(u.tags.is_empty(), "unexpected tags: {:?}", u.tags);
    }

    #[test]
    fn divergence_scenario() {
        let system = table(&[("d@x.com", &[(Field::Status, "Active")])]);
        let manual = table(&[("d@x.com", &[(Field::Referral, "João")])]);
        let pay = latest(&[(
            "d@x.com",
            LatestPaymentStatus {
                final_status: "Historical".into(),
                total_payments: 2,
                ..LatestPaymentStatus::default()
            },
        )]);
        let users = run(&system, &manual, &pay);
        let u = &users[0];
        assert_eq!(u.tags, vec![AlertTag::Inactive, AlertTag::StatusDivergence]);
        assert_eq!(u.alerts.len(), 2);
        assert!(u.alerts[1].starts_with("STATUS DIVERGENCE"));
    }

    #[test]
    fn union_of_keys_in_sorted_order() {
        let system = table(&[("b@x.com", &[]), ("a@x.com", &[])]);
        let manual = table(&[("c@x.com", &[]), ("a@x.com", &[])]);
        let pay = latest(&[("d@x.com", LatestPaymentStatus::default())]);
        let users = run(&system, &manual, &pay);
        let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com", "c@x.com", "d@x.com"]);
    }

    #[test]
    fn every_rule_target_is_distinct() {
        for (i, a) in MERGE_RULES.iter().enumerate() {
            for b in &MERGE_RULES[i + 1..] {
                assert_ne!(a.target, b.target);
            }
        }
    }
}
