//! Ingestion adapters: CSV text in, email-keyed source tables out.
//!
//! Column lookup goes through alias tables resolved once against the header row.
//! Rows without a usable email are skipped and counted, never reported as errors.

use std::collections::BTreeMap;

use csv::StringRecord;

use crate::config::{AliasTable, ReconConfig};
use crate::error::ReconError;
use crate::model::{Field, LatestPaymentStatus, PaymentLedger, SourceKind, SourceRecord, SourceTable};

/// Trim + lower-case. Empty values and configured sentinels yield `None`.
pub fn normalize_email(raw: &str, config: &ReconConfig) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || config.is_email_sentinel(&email) {
        None
    } else {
        Some(email)
    }
}

pub fn load_system(csv_data: &str, config: &ReconConfig) -> Result<SourceTable, ReconError> {
    let aliases = config.alias_table(SourceKind::System)?;
    load_table(&SourceKind::System.to_string(), csv_data, &aliases, config)
}

pub fn load_manual(csv_data: &str, config: &ReconConfig) -> Result<SourceTable, ReconError> {
    let aliases = config.alias_table(SourceKind::Manual)?;
    load_table(&SourceKind::Manual.to_string(), csv_data, &aliases, config)
}

/// Two passes: build the per-user history and fold the latest status, then count payments.
pub fn load_payments(csv_data: &str, config: &ReconConfig) -> Result<PaymentLedger, ReconError> {
    let label = SourceKind::Payments.to_string();
    let aliases = config.alias_table(SourceKind::Payments)?;
    let sheet = Sheet::parse(&label, csv_data, config.input_delimiter()?)?;
    let columns = ColumnResolver::resolve(&label, &sheet.headers, &aliases)?;

    let mut ledger = PaymentLedger {
        rows_read: sheet.rows.len(),
        ..PaymentLedger::default()
    };

    for (i, row) in sheet.rows.iter().enumerate() {
        let Some(record) = columns.build(i + 1, row, config) else {
            ledger.rows_skipped += 1;
            continue;
        };
        let email = record.email().to_string();

        // A dated row replaces the summary; an undated one only fills a gap.
        if !ledger.latest.contains_key(&email) || !record.get(Field::PaymentDate).is_empty() {
            ledger
                .latest
                .insert(email.clone(), LatestPaymentStatus::from_record(&record));
        }
        ledger.history.entry(email).or_default().push(record);
    }

    for (email, status) in ledger.latest.iter_mut() {
        status.total_payments = ledger.history.get(email).map(|h| h.len()).unwrap_or(0);
    }

    log::debug!(
        "{label}: {} rows read, {} skipped, {} users, {} payment rows",
        ledger.rows_read,
        ledger.rows_skipped,
        ledger.latest.len(),
        ledger.payment_rows(),
    );

    Ok(ledger)
}

/// Load a user list of unknown origin. The email column is the first header
/// containing `EMAIL` / `E-MAIL`; other fields use the union of all alias tables.
pub fn load_roster(label: &str, csv_data: &str, config: &ReconConfig) -> Result<SourceTable, ReconError> {
    let delimiter = config.input_delimiter()?;
    let headers = Sheet::parse(label, csv_data, delimiter)?.headers;

    let email_header = headers
        .iter()
        .find(|h| {
            let upper = h.to_uppercase();
            upper.contains("EMAIL") || upper.contains("E-MAIL")
        })
        .ok_or_else(|| ReconError::MissingColumn {
            source: label.into(),
            column: "EMAIL".into(),
        })?;

    let mut aliases = config.roster_aliases()?;
    aliases.set(Field::Email, vec![email_header.clone()]);

    load_table(label, csv_data, &aliases, config)
}

fn load_table(
    label: &str,
    csv_data: &str,
    aliases: &AliasTable,
    config: &ReconConfig,
) -> Result<SourceTable, ReconError> {
    let sheet = Sheet::parse(label, csv_data, config.input_delimiter()?)?;
    let columns = ColumnResolver::resolve(label, &sheet.headers, aliases)?;

    let mut table = SourceTable {
        label: label.into(),
        rows_read: sheet.rows.len(),
        ..SourceTable::default()
    };
    let mut seen: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for (i, row) in sheet.rows.iter().enumerate() {
        let Some(record) = columns.build(i + 1, row, config) else {
            table.rows_skipped += 1;
            continue;
        };
        let email = record.email().to_string();
        seen.entry(email.clone()).or_default().push(record.row);
        table.records.insert(email, record);
    }

    table.duplicates = seen.into_iter().filter(|(_, rows)| rows.len() > 1).collect();

    log::debug!(
        "{label}: {} rows read, {} skipped, {} unique emails, {} duplicated",
        table.rows_read,
        table.rows_skipped,
        table.records.len(),
        table.duplicates.len(),
    );

    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV + column resolution
// ---------------------------------------------------------------------------

struct Sheet {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl Sheet {
    fn parse(label: &str, csv_data: &str, delimiter: u8) -> Result<Self, ReconError> {
        let csv_err = |e: csv::Error| ReconError::Csv {
            source: label.into(),
            message: e.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let headers = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(csv_err)?;

        Ok(Self { headers, rows })
    }
}

/// Header indices per canonical field, in alias priority order.
struct ColumnResolver {
    columns: Vec<(Field, Vec<usize>)>,
}

impl ColumnResolver {
    fn resolve(label: &str, headers: &[String], aliases: &AliasTable) -> Result<Self, ReconError> {
        let mut columns = Vec::new();
        for (field, names) in aliases.iter() {
            let indices: Vec<usize> = names
                .iter()
                .filter_map(|name| headers.iter().position(|h| h == name))
                .collect();
            if indices.is_empty() {
                if field == Field::Email {
                    return Err(ReconError::MissingColumn {
                        source: label.into(),
                        column: names.first().cloned().unwrap_or_else(|| "email".into()),
                    });
                }
                continue;
            }
            columns.push((field, indices));
        }
        Ok(Self { columns })
    }

    /// First non-empty value among the field's present columns.
    fn value(&self, indices: &[usize], field: Field, row: &StringRecord) -> String {
        indices
            .iter()
            .map(|&i| row.get(i).unwrap_or("").trim())
            .find(|v| !v.is_empty() && !(field == Field::Phone && v.eq_ignore_ascii_case("n/a")))
            .unwrap_or("")
            .to_string()
    }

    /// `None` when the row has no usable email.
    fn build(&self, row_number: usize, row: &StringRecord, config: &ReconConfig) -> Option<SourceRecord> {
        let mut fields = BTreeMap::new();
        for (field, indices) in &self.columns {
            let value = self.value(indices, *field, row);
            if *field == Field::Email {
                fields.insert(Field::Email, normalize_email(&value, config)?);
            } else {
                fields.insert(*field, value);
            }
        }
        Some(SourceRecord {
            row: row_number,
            fields,
        })
    }
}
