use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::{Field, SourceKind};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Reconciliation settings. Every key is optional; `ReconConfig::default()`
/// matches the built-in column layout of the three exports.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Input field delimiter (single ASCII character).
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Delimiter for generated CSV files.
    #[serde(default = "default_output_delimiter")]
    pub output_delimiter: String,
    /// Email cell values that mean "no email yet". Compared case-insensitively.
    #[serde(default = "default_email_sentinels")]
    pub email_sentinels: Vec<String>,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
}

fn default_name() -> String {
    "user reconciliation".into()
}

fn default_delimiter() -> String {
    ";".into()
}

fn default_output_delimiter() -> String {
    ",".into()
}

fn default_email_sentinels() -> Vec<String> {
    vec!["n/a".into(), "aguardando".into()]
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            delimiter: default_delimiter(),
            output_delimiter: default_output_delimiter(),
            email_sentinels: default_email_sentinels(),
            status: StatusConfig::default(),
            columns: ColumnsConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Status vocabularies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StatusConfig {
    /// System statuses that mean the account is active.
    #[serde(default = "default_active")]
    pub active: Vec<String>,
    /// Payment statuses that mean the user stopped paying.
    #[serde(default = "default_inactive")]
    pub inactive: Vec<String>,
}

fn default_active() -> Vec<String> {
    vec!["Active".into(), "Ativo".into()]
}

fn default_inactive() -> Vec<String> {
    vec![
        "Inactive".into(),
        "Historical".into(),
        "Inativo".into(),
        "Histórico".into(),
    ]
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            active: default_active(),
            inactive: default_inactive(),
        }
    }
}

impl StatusConfig {
    pub fn is_active(&self, system_status: &str) -> bool {
        self.active.iter().any(|s| s == system_status)
    }

    pub fn is_inactive(&self, payment_status: &str) -> bool {
        self.inactive.iter().any(|s| s == payment_status)
    }
}

// ---------------------------------------------------------------------------
// Column aliases
// ---------------------------------------------------------------------------

/// Per-source alias overrides, keyed by canonical field name.
/// Each listed field replaces the built-in alias list for that field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnsConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub system: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub manual: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub payments: BTreeMap<String, Vec<String>>,
}

impl ColumnsConfig {
    fn for_source(&self, source: SourceKind) -> &BTreeMap<String, Vec<String>> {
        match source {
            SourceKind::System => &self.system,
            SourceKind::Manual => &self.manual,
            SourceKind::Payments => &self.payments,
        }
    }
}

/// Canonical field → ordered list of accepted header names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: BTreeMap<Field, Vec<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, aliases: &[&str]) -> Self {
        self.entries
            .insert(field, aliases.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn set(&mut self, field: Field, aliases: Vec<String>) {
        self.entries.insert(field, aliases);
    }

    pub fn aliases(&self, field: Field) -> &[String] {
        self.entries.get(&field).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, field: Field) -> bool {
        self.entries.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &[String])> {
        self.entries.iter().map(|(f, a)| (*f, a.as_slice()))
    }

    /// Append aliases from `other` that this table does not list yet.
    pub fn extend_from(&mut self, other: &AliasTable) {
        for (field, aliases) in other.iter() {
            let entry = self.entries.entry(field).or_default();
            for alias in aliases {
                if !entry.contains(alias) {
                    entry.push(alias.clone());
                }
            }
        }
    }

    fn to_string_map(&self) -> BTreeMap<String, Vec<String>> {
        self.entries
            .iter()
            .map(|(f, a)| (f.as_str().to_string(), a.clone()))
            .collect()
    }
}

const NAME_ALIASES: [&str; 4] = ["NOME_COMPLETO", "Nome", "NOME", "NAME"];
const PHONE_ALIASES: [&str; 4] = ["TELEFONE", "Telefone", "PHONE", "Celular"];
const REFERRAL_ALIASES: [&str; 3] = ["INDICADOR", "Indicador", "INDICATOR"];
const NOTES_ALIASES: [&str; 2] = ["OBS", "OBSERVACAO"];

/// Built-in alias table for a source. The first alias is the export's own column name.
pub fn default_aliases(source: SourceKind) -> AliasTable {
    match source {
        SourceKind::System => AliasTable::new()
            .with(Field::Email, &["Email", "EMAIL", "EMAIL_LOGIN"])
            .with(Field::Name, &["Nome", "NOME_COMPLETO", "NOME", "NAME"])
            .with(Field::Phone, &["Telefone", "TELEFONE", "PHONE", "Celular"])
            .with(Field::Company, &["Empresa"])
            .with(Field::Role, &["Função"])
            .with(Field::Status, &["Status", "STATUS"])
            .with(Field::CreatedAt, &["Data de Criação"])
            .with(Field::LastActivity, &["Última Atividade"])
            .with(Field::Plan, &["Plano de Assinatura", "PLANO"])
            .with(Field::Verified, &["Verificado"]),
        SourceKind::Manual => AliasTable::new()
            .with(Field::Email, &["EMAIL_LOGIN", "Email", "EMAIL"])
            .with(Field::Name, &NAME_ALIASES)
            .with(Field::Phone, &PHONE_ALIASES)
            .with(Field::Referral, &REFERRAL_ALIASES)
            .with(Field::Notes, &NOTES_ALIASES),
        SourceKind::Payments => AliasTable::new()
            .with(Field::Email, &["EMAIL_LOGIN", "Email", "EMAIL"])
            .with(Field::Name, &NAME_ALIASES)
            .with(Field::Phone, &PHONE_ALIASES)
            .with(Field::Referral, &REFERRAL_ALIASES)
            .with(Field::PaymentDate, &["DATA_PAGTO"])
            .with(Field::DueDate, &["DATA_VENC"])
            .with(Field::FinalStatus, &["STATUS_FINAL"])
            .with(Field::Notes, &NOTES_ALIASES)
            .with(Field::TotalCycles, &["TOTAL_CICLOS_USUARIO"]),
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string_pretty(self).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        parse_delimiter("delimiter", &self.delimiter)?;
        parse_delimiter("output_delimiter", &self.output_delimiter)?;

        if self.status.active.is_empty() {
            return Err(ReconError::ConfigValidation(
                "status.active must list at least one value".into(),
            ));
        }
        if self.status.inactive.is_empty() {
            return Err(ReconError::ConfigValidation(
                "status.inactive must list at least one value".into(),
            ));
        }

        for source in SourceKind::ALL {
            self.alias_table(source)?;
        }

        Ok(())
    }

    pub fn input_delimiter(&self) -> Result<u8, ReconError> {
        parse_delimiter("delimiter", &self.delimiter)
    }

    pub fn output_delimiter_byte(&self) -> Result<u8, ReconError> {
        parse_delimiter("output_delimiter", &self.output_delimiter)
    }

    /// Whether a normalized (trimmed, lower-cased) email is a placeholder.
    pub fn is_email_sentinel(&self, email: &str) -> bool {
        self.email_sentinels
            .iter()
            .any(|s| s.trim().to_lowercase() == email)
    }

    /// Built-in aliases for `source`, with this config's overrides applied field by field.
    pub fn alias_table(&self, source: SourceKind) -> Result<AliasTable, ReconError> {
        let mut table = default_aliases(source);

        for (key, aliases) in self.columns.for_source(source) {
            let field = Field::parse(key).ok_or_else(|| {
                ReconError::ConfigValidation(format!("columns.{source}: unknown field '{key}'"))
            })?;
            if aliases.is_empty() || aliases.iter().any(|a| a.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!(
                    "columns.{source}.{key}: alias list must be non-empty and contain no blank names"
                )));
            }
            table.set(field, aliases.clone());
        }

        if !table.contains(Field::Email) {
            return Err(ReconError::ConfigValidation(format!(
                "columns.{source}: no email aliases"
            )));
        }

        Ok(table)
    }

    /// Union of all three source tables, used for files of unknown origin.
    pub fn roster_aliases(&self) -> Result<AliasTable, ReconError> {
        let mut table = AliasTable::new();
        for source in [SourceKind::Manual, SourceKind::System, SourceKind::Payments] {
            table.extend_from(&self.alias_table(source)?);
        }
        Ok(table)
    }

    /// Copy of this config with every alias table written out in full.
    pub fn expanded(&self) -> Result<Self, ReconError> {
        let mut out = self.clone();
        out.columns = ColumnsConfig {
            system: self.alias_table(SourceKind::System)?.to_string_map(),
            manual: self.alias_table(SourceKind::Manual)?.to_string_map(),
            payments: self.alias_table(SourceKind::Payments)?.to_string_map(),
        };
        Ok(out)
    }
}

fn parse_delimiter(key: &str, value: &str) -> Result<u8, ReconError> {
    let bytes = value.as_bytes();
    if bytes.len() != 1 || !bytes[0].is_ascii() {
        return Err(ReconError::ConfigValidation(format!(
            "{key} must be a single ASCII character, got {value:?}"
        )));
    }
    match bytes[0] {
        b'"' | b'\n' | b'\r' => Err(ReconError::ConfigValidation(format!(
            "{key} cannot be a quote or line break"
        ))),
        b => Ok(b),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config, ReconConfig::default());
        assert_eq!(config.input_delimiter().unwrap(), b';');
        assert_eq!(config.output_delimiter_byte().unwrap(), b',');
    }

    #[test]
    fn parse_overrides() {
        let input = r#"
name = "October cleanup"
delimiter = ","
email_sentinels = ["pending"]

[status]
active = ["Enabled"]

[columns.manual]
email = ["E-mail"]
referral = ["Referred by", "INDICADOR"]
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.name, "October cleanup");
        assert_eq!(config.input_delimiter().unwrap(), b',');
        assert!(config.is_email_sentinel("pending"));
        assert!(!config.is_email_sentinel("n/a"));
        assert!(config.status.is_active("Enabled"));
        assert!(!config.status.is_active("Active"));
        // inactive keeps its default when only `active` is given
        assert!(config.status.is_inactive("Historical"));

        let manual = config.alias_table(SourceKind::Manual).unwrap();
        assert_eq!(manual.aliases(Field::Email), ["E-mail"]);
        assert_eq!(manual.aliases(Field::Referral), ["Referred by", "INDICADOR"]);
        // untouched field keeps built-in aliases
        assert_eq!(manual.aliases(Field::Name)[0], "NOME_COMPLETO");
    }

    #[test]
    fn reject_unknown_field_name() {
        let input = r#"
[columns.system]
favourite_colour = ["Cor"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("unknown field 'favourite_colour'"));
    }

    #[test]
    fn reject_empty_alias_list() {
        let input = r#"
[columns.payments]
name = []
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("columns.payments.name"));
    }

    #[test]
    fn reject_bad_delimiter() {
        let err = ReconConfig::from_toml("delimiter = \";;\"").unwrap_err();
        assert!(err.to_string().contains("single ASCII character"));

        let err = ReconConfig::from_toml("output_delimiter = '\"'").unwrap_err();
        assert!(err.to_string().contains("quote"));
    }

    #[test]
    fn reject_unknown_top_level_key() {
        let err = ReconConfig::from_toml("delimeter = \";\"").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_status_vocabulary() {
        let err = ReconConfig::from_toml("[status]\ninactive = []").unwrap_err();
        assert!(err.to_string().contains("status.inactive"));
    }

    #[test]
    fn expanded_config_round_trips() {
        let expanded = ReconConfig::default().expanded().unwrap();
        let text = expanded.to_toml().unwrap();
        let parsed = ReconConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, expanded);
        assert_eq!(
            parsed.alias_table(SourceKind::Payments).unwrap(),
            default_aliases(SourceKind::Payments)
        );
    }

    #[test]
    fn roster_aliases_union_prefers_manual_order() {
        let table = ReconConfig::default().roster_aliases().unwrap();
        assert_eq!(table.aliases(Field::Name)[0], "NOME_COMPLETO");
        assert!(table.aliases(Field::Name).contains(&"Nome".to_string()));
        assert!(table.aliases(Field::Plan).contains(&"Plano de Assinatura".to_string()));
        assert_eq!(table.aliases(Field::Email)[0], "EMAIL_LOGIN");
    }
}
