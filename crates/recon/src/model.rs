use std::collections::BTreeMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Sources + fields
// ---------------------------------------------------------------------------

/// The three sources a user can be found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    System,
    Manual,
    Payments,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [Self::System, Self::Manual, Self::Payments];

    /// Tag written to the `fontes_str` column.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::System => "SISTEMA",
            Self::Manual => "PLANILHA",
            Self::Payments => "PAGAMENTOS",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Manual => write!(f, "manual"),
            Self::Payments => write!(f, "payments"),
        }
    }
}

/// Canonical field names. Source headers are mapped onto these via alias tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Name,
    Phone,
    Referral,
    Notes,
    Plan,
    Status,
    Company,
    Role,
    Verified,
    CreatedAt,
    LastActivity,
    PaymentDate,
    DueDate,
    FinalStatus,
    TotalCycles,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Self::Email,
        Self::Name,
        Self::Phone,
        Self::Referral,
        Self::Notes,
        Self::Plan,
        Self::Status,
        Self::Company,
        Self::Role,
        Self::Verified,
        Self::CreatedAt,
        Self::LastActivity,
        Self::PaymentDate,
        Self::DueDate,
        Self::FinalStatus,
        Self::TotalCycles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Referral => "referral",
            Self::Notes => "notes",
            Self::Plan => "plan",
            Self::Status => "status",
            Self::Company => "company",
            Self::Role => "role",
            Self::Verified => "verified",
            Self::CreatedAt => "created_at",
            Self::LastActivity => "last_activity",
            Self::PaymentDate => "payment_date",
            Self::DueDate => "due_date",
            Self::FinalStatus => "final_status",
            Self::TotalCycles => "total_cycles",
        }
    }

    pub fn parse(name: &str) -> Option<Field> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Ingested records
// ---------------------------------------------------------------------------

/// One source row, reduced to canonical fields. Values are trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub fields: BTreeMap<Field, String>,
}

impl SourceRecord {
    /// Field value, or `""` when the source has no such column.
    pub fn get(&self, field: Field) -> &str {
        self.fields.get(&field).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn email(&self) -> &str {
        self.get(Field::Email)
    }
}

/// Single-record-per-user source: system extract, manual sheet, or a generic roster.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceTable {
    pub label: String,
    pub records: BTreeMap<String, SourceRecord>,
    pub rows_read: usize,
    pub rows_skipped: usize,
    /// Emails seen on more than one row, with every row number. Last row wins in `records`.
    pub duplicates: BTreeMap<String, Vec<usize>>,
}

impl SourceTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, email: &str) -> bool {
        self.records.contains_key(email)
    }

    pub fn get(&self, email: &str) -> Option<&SourceRecord> {
        self.records.get(email)
    }
}

/// Summary of the most recent ledger row for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LatestPaymentStatus {
    pub name: String,
    pub phone: String,
    pub referral: String,
    pub notes: String,
    pub final_status: String,
    pub last_payment_date: String,
    pub due_date: String,
    pub total_cycles: String,
    /// Number of ledger rows for this email. Set after the whole history is read.
    pub total_payments: usize,
}

impl LatestPaymentStatus {
    pub fn from_record(record: &SourceRecord) -> Self {
        Self {
            name: record.get(Field::Name).to_string(),
            phone: record.get(Field::Phone).to_string(),
            referral: record.get(Field::Referral).to_string(),
            notes: record.get(Field::Notes).to_string(),
            final_status: record.get(Field::FinalStatus).to_string(),
            last_payment_date: record.get(Field::PaymentDate).to_string(),
            due_date: record.get(Field::DueDate).to_string(),
            total_cycles: record.get(Field::TotalCycles).to_string(),
            total_payments: 0,
        }
    }
}

/// Payment ledger: full per-user history in file order, plus the folded latest status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentLedger {
    pub history: BTreeMap<String, Vec<SourceRecord>>,
    pub latest: BTreeMap<String, LatestPaymentStatus>,
    pub rows_read: usize,
    pub rows_skipped: usize,
}

impl PaymentLedger {
    pub fn payment_rows(&self) -> usize {
        self.history.values().map(|h| h.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Consolidated output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertTag {
    ReviewManually,
    NoPayment,
    OutsideSystem,
    NoReferral,
    Inactive,
    StatusDivergence,
}

impl AlertTag {
    pub const ALL: [AlertTag; 6] = [
        Self::ReviewManually,
        Self::NoPayment,
        Self::OutsideSystem,
        Self::NoReferral,
        Self::Inactive,
        Self::StatusDivergence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReviewManually => "REVIEW_MANUALLY",
            Self::NoPayment => "NO_PAYMENT",
            Self::OutsideSystem => "OUTSIDE_SYSTEM",
            Self::NoReferral => "NO_REFERRAL",
            Self::Inactive => "INACTIVE",
            Self::StatusDivergence => "STATUS_DIVERGENCE",
        }
    }

    /// Human-readable alert line for exports.
    pub fn message(&self) -> &'static str {
        match self {
            Self::ReviewManually => "Not in the manual sheet",
            Self::NoPayment => "NO PAYMENTS RECORDED",
            Self::OutsideSystem => "In the manual sheet but not in the system",
            Self::NoReferral => "No referral set",
            Self::Inactive => "Payments inactive",
            Self::StatusDivergence => {
                "STATUS DIVERGENCE: active in the system but inactive in payments"
            }
        }
    }
}

impl std::fmt::Display for AlertTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One merged user. Built once per unique email; never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsolidatedUser {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub referral: String,
    pub plan: String,
    pub system_status: String,
    pub company: String,
    pub role: String,
    pub verified: String,
    pub created_at: String,
    pub last_activity: String,
    pub has_payments: bool,
    pub total_payments: usize,
    pub total_cycles: String,
    pub last_payment_date: String,
    pub due_date: String,
    pub payment_status: String,
    pub notes: String,
    /// Sources the email was found in, in `SourceKind::ALL` order.
    pub sources: Vec<SourceKind>,
    /// Alert tags in evaluation order.
    pub tags: Vec<AlertTag>,
    /// One message per tag, same order.
    pub alerts: Vec<String>,
}

impl ConsolidatedUser {
    pub fn has_tag(&self, tag: AlertTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn in_source(&self, source: SourceKind) -> bool {
        self.sources.contains(&source)
    }

    pub fn needs_review(&self) -> bool {
        !self.alerts.is_empty()
    }
}
