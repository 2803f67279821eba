//! Field keys and values shared by every draft flavor.

use std::fmt::Debug;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::wizard::{WizardError, WizardResult};

/// A typed key naming one field of a draft.
///
/// `name()` is the wire name used by the front-end and the REST payloads
/// (e.g. `documentId`, `parentA_firstName`).
pub trait FieldKey: Copy + Ord + Debug + Send + Sync + 'static {
    /// Every field of this draft flavor.
    const ALL: &'static [Self];

    /// Wire name of the field.
    fn name(self) -> &'static str;

    /// Look a field up by its wire name.
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// A value travelling through the uniform `(field, value)` mutation seam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    /// Field cleared / never filled
    Unset,
    /// Free text, dates, times and enumerated choices
    Text(String),
    /// Checkbox-style flags
    Flag(bool),
    /// Counts (e.g. number of recurring occurrences)
    Number(u32),
    /// Weekday selection, 0 = Sunday
    Days(Vec<u8>),
}

impl FieldValue {
    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Unset => "unset",
            FieldValue::Text(_) => "text",
            FieldValue::Flag(_) => "flag",
            FieldValue::Number(_) => "number",
            FieldValue::Days(_) => "days",
        }
    }

    fn mismatch(&self, field: &'static str, expected: &'static str) -> WizardError {
        WizardError::FieldType {
            field,
            expected,
            found: self.kind(),
        }
    }

    /// Text payload; `Unset` clears the field.
    pub fn into_text(self, field: &'static str) -> WizardResult<Option<String>> {
        match self {
            FieldValue::Unset => Ok(None),
            FieldValue::Text(s) => Ok(Some(s)),
            other => Err(other.mismatch(field, "text")),
        }
    }

    /// Flag payload; `Unset` reads as `false`.
    pub fn into_flag(self, field: &'static str) -> WizardResult<bool> {
        match self {
            FieldValue::Unset => Ok(false),
            FieldValue::Flag(b) => Ok(b),
            other => Err(other.mismatch(field, "flag")),
        }
    }

    /// Number payload; accepts numeric text as sent by number inputs.
    pub fn into_number(self, field: &'static str) -> WizardResult<Option<u32>> {
        match self {
            FieldValue::Unset => Ok(None),
            FieldValue::Number(n) => Ok(Some(n)),
            FieldValue::Text(s) if s.trim().is_empty() => Ok(None),
            FieldValue::Text(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| WizardError::InvalidValue { field, value: s }),
            other => Err(other.mismatch(field, "number")),
        }
    }

    /// Weekday payload; every entry must be in `0..=6`.
    pub fn into_days(self, field: &'static str) -> WizardResult<Option<Vec<u8>>> {
        match self {
            FieldValue::Unset => Ok(None),
            FieldValue::Days(days) => {
                if let Some(bad) = days.iter().find(|d| **d > 6) {
                    return Err(WizardError::InvalidValue {
                        field,
                        value: bad.to_string(),
                    });
                }
                Ok(Some(days))
            }
            other => Err(other.mismatch(field, "days")),
        }
    }

    /// Parse an enumerated choice from its wire string. An empty string
    /// (the "please select" option) clears the choice.
    pub fn into_choice<T: FromStr>(self, field: &'static str) -> WizardResult<Option<T>> {
        match self.into_text(field)? {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| WizardError::InvalidValue { field, value: s }),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Days(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Unset)
    }
}

/// A sparse, partially-filled entity edited field by field.
pub trait Draft: Clone + Default + PartialEq + Debug + Serialize + Send + 'static {
    type Field: FieldKey;

    /// Current value of a field.
    fn get(&self, field: Self::Field) -> FieldValue;

    /// Overwrite a field. Leaves the draft untouched on error.
    fn set(&mut self, field: Self::Field, value: FieldValue) -> WizardResult<()>;
}

/// True when an optional text field holds something other than whitespace.
pub(crate) fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Text view of an optional enumerated choice.
pub(crate) fn choice_value<T: AsRef<str>>(value: &Option<T>) -> FieldValue {
    match value {
        Some(v) => FieldValue::Text(v.as_ref().to_string()),
        None => FieldValue::Unset,
    }
}

/// Trimmed value of a field the rules already required.
pub(crate) fn required_text(value: &Option<String>, field: &'static str) -> WizardResult<String> {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(WizardError::MissingField(field)),
    }
}

/// Trimmed value of an optional field; blank collapses to `None`.
pub(crate) fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a `YYYY-MM-DD` date input.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Parse an `HH:MM` time input.
pub(crate) fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}
