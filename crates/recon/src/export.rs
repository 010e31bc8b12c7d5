//! Output writers. Everything is written in input order with no timestamps,
//! so identical inputs produce byte-identical files.

use std::io::Write;

use crate::diff::CrossDiff;
use crate::error::ReconError;
use crate::model::{ConsolidatedUser, Field, SourceTable};

/// Column order expected by the downstream import tooling.
pub const CONSOLIDATED_COLUMNS: [&str; 21] = [
    "email",
    "nome",
    "telefone",
    "indicador",
    "plano",
    "status_sistema",
    "empresa",
    "funcao",
    "verificado",
    "tem_pagamentos",
    "total_pagamentos",
    "total_ciclos",
    "ultimo_pagamento",
    "data_vencimento",
    "status_pagamento",
    "data_criacao",
    "ultima_atividade",
    "obs",
    "alertas_str",
    "tags_str",
    "fontes_str",
];

pub const REVIEW_COLUMNS: [&str; 8] = [
    "email",
    "nome",
    "plano",
    "tem_pagamentos",
    "indicador",
    "alertas_str",
    "tags_str",
    "obs",
];

pub const ROSTER_COLUMNS: [&str; 7] = ["EMAIL", "NOME", "TELEFONE", "INDICADOR", "PLANO", "STATUS", "OBS"];

pub const DIFFERENCES_COLUMNS: [&str; 2] = ["EMAIL", "DIFERENCAS"];

pub const CONSOLIDATED_FILE: &str = "base_consolidada.csv";
pub const INSTRUCTIONS_FILE: &str = "script_importacao.sql";
pub const REVIEW_FILE: &str = "usuarios_para_revisar.csv";

pub const LEFT_ONLY_FILE: &str = "somente_esquerda.csv";
pub const RIGHT_ONLY_FILE: &str = "somente_direita.csv";
pub const IN_BOTH_FILE: &str = "em_ambos.csv";
pub const DIFFERENCES_FILE: &str = "diferencas.csv";

fn io_err(e: impl std::fmt::Display) -> ReconError {
    ReconError::Io(e.to_string())
}

fn csv_writer<W: Write>(sink: W, delimiter: u8) -> csv::Writer<W> {
    csv::WriterBuilder::new().delimiter(delimiter).from_writer(sink)
}

// ---------------------------------------------------------------------------
// Joined columns
// ---------------------------------------------------------------------------

pub fn has_payments_label(user: &ConsolidatedUser) -> &'static str {
    if user.has_payments {
        "SIM"
    } else {
        "NÃO"
    }
}

pub fn alerts_joined(user: &ConsolidatedUser) -> String {
    user.alerts.join(" | ")
}

pub fn tags_joined(user: &ConsolidatedUser) -> String {
    user.tags.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
}

pub fn sources_joined(user: &ConsolidatedUser) -> String {
    user.sources.iter().map(|s| s.tag()).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// Consolidation outputs
// ---------------------------------------------------------------------------

pub fn write_consolidated_csv<W: Write>(
    sink: W,
    users: &[ConsolidatedUser],
    delimiter: u8,
) -> Result<(), ReconError> {
    let mut writer = csv_writer(sink, delimiter);
    writer.write_record(CONSOLIDATED_COLUMNS).map_err(io_err)?;

    for u in users {
        let total_payments = u.total_payments.to_string();
        let (alerts, tags, sources) = (alerts_joined(u), tags_joined(u), sources_joined(u));
        writer
            .write_record([
                u.email.as_str(),
                &u.name,
                &u.phone,
                &u.referral,
                &u.plan,
                &u.system_status,
                &u.company,
                &u.role,
                &u.verified,
                has_payments_label(u),
                &total_payments,
                &u.total_cycles,
                &u.last_payment_date,
                &u.due_date,
                &u.payment_status,
                &u.created_at,
                &u.last_activity,
                &u.notes,
                &alerts,
                &tags,
                &sources,
            ])
            .map_err(io_err)?;
    }

    writer.flush().map_err(io_err)
}

/// Only users with at least one alert. Returns how many rows were written.
pub fn write_review_csv<W: Write>(
    sink: W,
    users: &[ConsolidatedUser],
    delimiter: u8,
) -> Result<usize, ReconError> {
    let mut writer = csv_writer(sink, delimiter);
    writer.write_record(REVIEW_COLUMNS).map_err(io_err)?;

    let mut written = 0;
    for u in users.iter().filter(|u| u.needs_review()) {
        let (alerts, tags) = (alerts_joined(u), tags_joined(u));
        writer
            .write_record([
                u.email.as_str(),
                &u.name,
                &u.plan,
                has_payments_label(u),
                &u.referral,
                &alerts,
                &tags,
                &u.notes,
            ])
            .map_err(io_err)?;
        written += 1;
    }

    writer.flush().map_err(io_err)?;
    Ok(written)
}

/// SQL-comment instructions for importing the consolidated file.
pub fn write_import_instructions<W: Write>(
    mut sink: W,
    users: &[ConsolidatedUser],
    consolidated_file: &str,
    delimiter: u8,
) -> Result<(), ReconError> {
    let mut plans = std::collections::BTreeMap::new();
    for u in users {
        let plan = if u.plan.is_empty() { "SEM_PLANO" } else { u.plan.as_str() };
        *plans.entry(plan.to_string()).or_insert(0usize) += 1;
    }
    let plans = crate::summary::rank_counts(plans);

    let total = users.len();
    let delimiter = delimiter as char;
    let mut lines = vec![
        "-- Import script for the user database".to_string(),
        format!("-- Total users: {total}"),
        String::new(),
        "-- STEP 1: BACK UP THE CURRENT DATABASE".into(),
        "-- Take a full backup before running anything below!".into(),
        String::new(),
        "-- STEP 2: CLEANUP (OPTIONAL - USE WITH CARE)".into(),
        "-- DELETE FROM usuarios WHERE TRUE;".into(),
        "-- DELETE FROM pagamentos WHERE TRUE;".into(),
        String::new(),
        "-- STEP 3: IMPORT CONSOLIDATED USERS".into(),
        format!("-- Import {consolidated_file} through one of:"),
        "-- 1. The system's web import screen".into(),
        "-- 2. The SQL COPY command (PostgreSQL)".into(),
        "-- 3. A TypeScript/Prisma import script".into(),
        String::new(),
        "-- PostgreSQL example:".into(),
        format!("-- \\COPY usuarios FROM '{consolidated_file}' WITH CSV HEADER DELIMITER '{delimiter}';"),
        String::new(),
        "-- IMPORT STATISTICS:".into(),
        format!("-- Total users: {total}"),
    ];
    lines.extend(plans.iter().map(|c| format!("--   {}: {}", c.key, c.count)));

    for line in lines {
        writeln!(sink, "{line}").map_err(io_err)?;
    }
    sink.flush().map_err(io_err)
}

// ---------------------------------------------------------------------------
// Diff outputs
// ---------------------------------------------------------------------------

/// One row per email, taken from `table`. Emails missing from `table` are skipped.
pub fn write_roster_csv<'a, W: Write>(
    sink: W,
    table: &SourceTable,
    emails: impl IntoIterator<Item = &'a String>,
    delimiter: u8,
) -> Result<usize, ReconError> {
    let mut writer = csv_writer(sink, delimiter);
    writer.write_record(ROSTER_COLUMNS).map_err(io_err)?;

    let mut written = 0;
    for email in emails {
        let Some(r) = table.get(email) else { continue };
        writer
            .write_record([
                r.email(),
                r.get(Field::Name),
                r.get(Field::Phone),
                r.get(Field::Referral),
                r.get(Field::Plan),
                r.get(Field::Status),
                r.get(Field::Notes),
            ])
            .map_err(io_err)?;
        written += 1;
    }

    writer.flush().map_err(io_err)?;
    Ok(written)
}

/// Human-readable mismatch list for one email, e.g. `name: 'Bruno' vs 'Bruna'`.
pub fn describe_mismatches(diff: &CrossDiff) -> Vec<(String, String)> {
    diff.mismatches_by_email()
        .into_iter()
        .map(|(email, group)| {
            let text = group
                .iter()
                .map(|m| format!("{}: '{}' vs '{}'", m.field, m.left, m.right))
                .collect::<Vec<_>>()
                .join(" | ");
            (email.to_string(), text)
        })
        .collect()
}

pub fn write_differences_csv<W: Write>(sink: W, diff: &CrossDiff, delimiter: u8) -> Result<usize, ReconError> {
    let mut writer = csv_writer(sink, delimiter);
    writer.write_record(DIFFERENCES_COLUMNS).map_err(io_err)?;

    let rows = describe_mismatches(diff);
    for (email, text) in &rows {
        writer.write_record([email, text]).map_err(io_err)?;
    }

    writer.flush().map_err(io_err)?;
    Ok(rows.len())
}

/// One sink per diff file.
#[derive(Debug, Default)]
pub struct DiffSinks<W> {
    pub left_only: W,
    pub right_only: W,
    pub in_both: W,
    pub differences: W,
}

impl<W> DiffSinks<W> {
    /// Sinks paired with their conventional file names.
    pub fn into_named(self) -> [(&'static str, W); 4] {
        [
            (LEFT_ONLY_FILE, self.left_only),
            (RIGHT_ONLY_FILE, self.right_only),
            (IN_BOTH_FILE, self.in_both),
            (DIFFERENCES_FILE, self.differences),
        ]
    }
}

/// Row counts of the four diff files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffFileCounts {
    pub left_only: usize,
    pub right_only: usize,
    pub in_both: usize,
    pub differences: usize,
}

/// Write the four diff files. Users present in both lists are written from the left record.
pub fn write_diff_csvs<W: Write>(
    sinks: &mut DiffSinks<W>,
    left: &SourceTable,
    right: &SourceTable,
    diff: &CrossDiff,
    delimiter: u8,
) -> Result<DiffFileCounts, ReconError> {
    Ok(DiffFileCounts {
        left_only: write_roster_csv(&mut sinks.left_only, left, &diff.left_only, delimiter)?,
        right_only: write_roster_csv(&mut sinks.right_only, right, &diff.right_only, delimiter)?,
        in_both: write_roster_csv(&mut sinks.in_both, left, &diff.in_both, delimiter)?,
        differences: write_differences_csv(&mut sinks.differences, diff, delimiter)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertTag, SourceKind};

    fn users() -> Vec<ConsolidatedUser> {
        vec![
            ConsolidatedUser {
                email: "a@x.com".into(),
                name: "Ana; Maria".into(),
                plan: "Pro".into(),
                has_payments: true,
                total_payments: 3,
                total_cycles: "3".into(),
                sources: vec![SourceKind::System, SourceKind::Manual, SourceKind::Payments],
                ..ConsolidatedUser::default()
            },
            ConsolidatedUser {
                email: "b@x.com".into(),
                name: "Bruno".into(),
                total_cycles: "0".into(),
                sources: vec![SourceKind::System],
                tags: vec![AlertTag::ReviewManually, AlertTag::NoPayment],
                alerts: vec![
                    AlertTag::ReviewManually.message().into(),
                    AlertTag::NoPayment.message().into(),
                ],
                ..ConsolidatedUser::default()
            },
        ]
    }

    #[test]
    fn consolidated_csv_layout() {
        let mut out = Vec::new();
        write_consolidated_csv(&mut out, &users(), b',').unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CONSOLIDATED_COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "a@x.com,Ana; Maria,,,Pro,,,,,SIM,3,3,,,,,,,,,\"SISTEMA, PLANILHA, PAGAMENTOS\""
        );
        assert_eq!(
            lines[2],
            "b@x.com,Bruno,,,,,,,,NÃO,0,0,,,,,,,Not in the manual sheet | NO PAYMENTS RECORDED,\"REVIEW_MANUALLY, NO_PAYMENT\",SISTEMA"
        );
    }

    #[test]
    fn semicolon_output_quotes_fields() {
        let mut out = Vec::new();
        write_consolidated_csv(&mut out, &users(), b';').unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("a@x.com;\"Ana; Maria\";"));
    }

    #[test]
    fn review_csv_only_alerted() {
        let mut out = Vec::new();
        let n = write_review_csv(&mut out, &users(), b',').unwrap();
        assert_eq!(n, 1);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "email,nome,plano,tem_pagamentos,indicador,alertas_str,tags_str,obs");
        assert!(lines[1].starts_with("b@x.com,Bruno,,NÃO,,"));
    }

    #[test]
    fn instructions_list_plans() {
        let mut out = Vec::new();
        write_import_instructions(&mut out, &users(), CONSOLIDATED_FILE, b',').unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("-- Import script for the user database\n-- Total users: 2\n"));
        assert!(text.contains("\\COPY usuarios FROM 'base_consolidada.csv' WITH CSV HEADER DELIMITER ',';"));
        assert!(text.contains("--   Pro: 1\n"));
        assert!(text.ends_with("--   SEM_PLANO: 1\n"));
    }

    #[test]
    fn diff_files() {
        use crate::config::ReconConfig;
        use crate::diff::diff_tables;
        use crate::ingest::load_roster;

        let config = ReconConfig::default();
        let left = load_roster(
            "a.csv",
            "EMAIL;NOME;TELEFONE\nx@a.com;Xavier;1\ny@a.com;Yara;2\n",
            &config,
        )
        .unwrap();
        let right = load_roster(
            "b.csv",
            "E-mail;Nome;Telefone\ny@a.com;Iara;2\nz@a.com;Zeca;3\n",
            &config,
        )
        .unwrap();
        let diff = diff_tables(&left, &right);

        let mut sinks: DiffSinks<Vec<u8>> = DiffSinks::default();
        let counts = write_diff_csvs(&mut sinks, &left, &right, &diff, b',').unwrap();
        assert_eq!(
            counts,
            DiffFileCounts {
                left_only: 1,
                right_only: 1,
                in_both: 1,
                differences: 1
            }
        );

        let named = sinks.into_named();
        assert_eq!(named[0].0, LEFT_ONLY_FILE);
        assert_eq!(
            String::from_utf8(named[0].1.clone()).unwrap(),
            "EMAIL,NOME,TELEFONE,INDICADOR,PLANO,STATUS,OBS\nx@a.com,Xavier,1,,,,\n"
        );
        assert_eq!(
            String::from_utf8(named[1].1.clone()).unwrap(),
            "EMAIL,NOME,TELEFONE,INDICADOR,PLANO,STATUS,OBS\nz@a.com,Zeca,3,,,,\n"
        );

        let mut both = Vec::new();
        write_roster_csv(&mut both, &left, &diff.in_both, b',').unwrap();
        assert_eq!(
            String::from_utf8(both).unwrap(),
            "EMAIL,NOME,TELEFONE,INDICADOR,PLANO,STATUS,OBS\ny@a.com,Yara,2,,,,\n"
        );

        let mut differences = Vec::new();
        write_differences_csv(&mut differences, &diff, b',').unwrap();
        assert_eq!(
            String::from_utf8(differences).unwrap(),
            "EMAIL,DIFERENCAS\ny@a.com,name: 'Yara' vs 'Iara'\n"
        );
    }
}
