//! Appointment draft and the completed appointment form.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::field::{
    choice_value, optional_text, parse_date, parse_time, required_text, Draft, FieldKey,
    FieldValue,
};
use crate::wizard::{WizardError, WizardResult};

/// Single visit or a repeating series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentType {
    #[default]
    Single,
    Recurring,
}

impl AsRef<str> for AppointmentType {
    fn as_ref(&self) -> &str {
        match self {
            AppointmentType::Single => "single",
            AppointmentType::Recurring => "recurring",
        }
    }
}

impl FromStr for AppointmentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(AppointmentType::Single),
            "recurring" => Ok(AppointmentType::Recurring),
            _ => Err(()),
        }
    }
}

/// Who pays for the session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    #[default]
    Private,
    Insurance,
}

impl AsRef<str> for PaymentType {
    fn as_ref(&self) -> &str {
        match self {
            PaymentType::Private => "private",
            PaymentType::Insurance => "insurance",
        }
    }
}

impl FromStr for PaymentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(PaymentType::Private),
            "insurance" => Ok(PaymentType::Insurance),
            _ => Err(()),
        }
    }
}

/// Repetition rule of a recurring appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Weekly,
    Biweekly,
    Monthly,
}

impl RecurrencePattern {
    pub const ALL: [RecurrencePattern; 3] = [
        RecurrencePattern::Weekly,
        RecurrencePattern::Biweekly,
        RecurrencePattern::Monthly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RecurrencePattern::Weekly => "Weekly (every week)",
            RecurrencePattern::Biweekly => "Biweekly (every 2 weeks)",
            RecurrencePattern::Monthly => "Monthly (every month)",
        }
    }
}

impl AsRef<str> for RecurrencePattern {
    fn as_ref(&self) -> &str {
        match self {
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Biweekly => "biweekly",
            RecurrencePattern::Monthly => "monthly",
        }
    }
}

impl FromStr for RecurrencePattern {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|p| p.as_ref() == s).ok_or(())
    }
}

/// Weekday names indexed by the draft's `0 = Sunday` convention.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Fields of [`AppointmentDraft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AppointmentField {
    PatientId,
    Date,
    StartTime,
    EndTime,
    Observations,
    Type,
    RecurrencePattern,
    DaysOfWeek,
    RecurrenceEndDate,
    RecurrenceOccurrences,
    PaymentType,
    Price,
    InsuranceName,
}

impl FieldKey for AppointmentField {
    const ALL: &'static [Self] = &[
        AppointmentField::PatientId,
        AppointmentField::Date,
        AppointmentField::StartTime,
        AppointmentField::EndTime,
        AppointmentField::Observations,
        AppointmentField::Type,
        AppointmentField::RecurrencePattern,
        AppointmentField::DaysOfWeek,
        AppointmentField::RecurrenceEndDate,
        AppointmentField::RecurrenceOccurrences,
        AppointmentField::PaymentType,
        AppointmentField::Price,
        AppointmentField::InsuranceName,
    ];

    fn name(self) -> &'static str {
        match self {
            AppointmentField::PatientId => "patientId",
            AppointmentField::Date => "date",
            AppointmentField::StartTime => "startTime",
            AppointmentField::EndTime => "endTime",
            AppointmentField::Observations => "observations",
            AppointmentField::Type => "type",
            AppointmentField::RecurrencePattern => "recurrencePattern",
            AppointmentField::DaysOfWeek => "daysOfWeek",
            AppointmentField::RecurrenceEndDate => "recurrenceEndDate",
            AppointmentField::RecurrenceOccurrences => "recurrenceOccurrences",
            AppointmentField::PaymentType => "paymentType",
            AppointmentField::Price => "price",
            AppointmentField::InsuranceName => "insuranceName",
        }
    }
}

/// In-progress appointment accumulated across the appointment wizard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentDraft {
    pub patient_id: Option<String>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// `HH:MM`
    pub start_time: Option<String>,
    /// `HH:MM`
    pub end_time: Option<String>,
    pub observations: Option<String>,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// 0 = Sunday
    pub days_of_week: Option<Vec<u8>>,
    pub recurrence_end_date: Option<String>,
    pub recurrence_occurrences: Option<u32>,
    pub payment_type: PaymentType,
    /// Decimal text as typed
    pub price: Option<String>,
    pub insurance_name: Option<String>,
}

impl Default for AppointmentDraft {
    fn default() -> Self {
        Self {
            patient_id: None,
            date: None,
            start_time: None,
            end_time: None,
            observations: None,
            kind: AppointmentType::Single,
            recurrence_pattern: None,
            days_of_week: None,
            recurrence_end_date: None,
            recurrence_occurrences: None,
            payment_type: PaymentType::Private,
            price: Some(String::new()),
            insurance_name: None,
        }
    }
}

impl AppointmentDraft {
    pub fn is_recurring(&self) -> bool {
        self.kind == AppointmentType::Recurring
    }

    /// Minutes between start and end, when both parse and end is later.
    pub fn duration_minutes(&self) -> Option<i64> {
        let start = parse_time(self.start_time.as_deref()?)?;
        let end = parse_time(self.end_time.as_deref()?)?;
        let minutes = (end - start).num_minutes();
        (minutes > 0).then_some(minutes)
    }

    /// Session price, when the typed text is a non-negative number.
    pub fn price_value(&self) -> Option<f64> {
        self.price
            .as_deref()
            .and_then(|p| p.trim().parse::<f64>().ok())
            .filter(|p| p.is_finite() && *p >= 0.0)
    }

    /// Price times occurrences for a recurring series with a known count.
    pub fn estimated_total(&self) -> Option<f64> {
        if !self.is_recurring() {
            return None;
        }
        let occurrences = self.recurrence_occurrences.filter(|n| *n > 0)?;
        Some(self.price_value()? * f64::from(occurrences))
    }

    /// Human-readable list of the selected weekdays.
    pub fn weekday_summary(&self) -> Option<String> {
        let days = self.days_of_week.as_ref().filter(|d| !d.is_empty())?;
        let names: Vec<&str> = days
            .iter()
            .filter_map(|d| WEEKDAY_NAMES.get(*d as usize).copied())
            .collect();
        Some(names.join(", "))
    }

    fn text_ref(&self, field: AppointmentField) -> Option<&Option<String>> {
        match field {
            AppointmentField::PatientId => Some(&self.patient_id),
            AppointmentField::Date => Some(&self.date),
            AppointmentField::StartTime => Some(&self.start_time),
            AppointmentField::EndTime => Some(&self.end_time),
            AppointmentField::Observations => Some(&self.observations),
            AppointmentField::RecurrenceEndDate => Some(&self.recurrence_end_date),
            AppointmentField::Price => Some(&self.price),
            AppointmentField::InsuranceName => Some(&self.insurance_name),
            _ => None,
        }
    }

    fn text_slot(&mut self, field: AppointmentField) -> Option<&mut Option<String>> {
        match field {
            AppointmentField::PatientId => Some(&mut self.patient_id),
            AppointmentField::Date => Some(&mut self.date),
            AppointmentField::StartTime => Some(&mut self.start_time),
            AppointmentField::EndTime => Some(&mut self.end_time),
            AppointmentField::Observations => Some(&mut self.observations),
            AppointmentField::RecurrenceEndDate => Some(&mut self.recurrence_end_date),
            AppointmentField::Price => Some(&mut self.price),
            AppointmentField::InsuranceName => Some(&mut self.insurance_name),
            _ => None,
        }
    }
}

/// Format a minute count the way the date/time step shows it.
pub fn format_duration(minutes: i64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours > 0 {
        format!("{hours}h {rest}min")
    } else {
        format!("{rest}min")
    }
}

impl Draft for AppointmentDraft {
    type Field = AppointmentField;

    fn get(&self, field: AppointmentField) -> FieldValue {
        match field {
            AppointmentField::Type => FieldValue::Text(self.kind.as_ref().into()),
            AppointmentField::PaymentType => FieldValue::Text(self.payment_type.as_ref().into()),
            AppointmentField::RecurrencePattern => choice_value(&self.recurrence_pattern),
            AppointmentField::DaysOfWeek => self.days_of_week.clone().into(),
            AppointmentField::RecurrenceOccurrences => self.recurrence_occurrences.into(),
            _ => self.text_ref(field).cloned().flatten().into(),
        }
    }

    fn set(&mut self, field: AppointmentField, value: FieldValue) -> WizardResult<()> {
        let name = field.name();
        match field {
            AppointmentField::Type => self.kind = value.into_choice(name)?.unwrap_or_default(),
            AppointmentField::PaymentType => {
                self.payment_type = value.into_choice(name)?.unwrap_or_default()
            }
            AppointmentField::RecurrencePattern => {
                self.recurrence_pattern = value.into_choice(name)?
            }
            AppointmentField::DaysOfWeek => {
                self.days_of_week = value.into_days(name)?.map(|mut days| {
                    days.sort_unstable();
                    days.dedup();
                    days
                })
            }
            AppointmentField::RecurrenceOccurrences => {
                self.recurrence_occurrences = value.into_number(name)?
            }
            _ => {
                if let Some(slot) = self.text_slot(field) {
                    *slot = value.into_text(name)?;
                }
            }
        }
        Ok(())
    }
}

/// Repetition settings of a recurring appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub pattern: RecurrencePattern,
    pub days_of_week: Vec<u8>,
    pub end_date: Option<NaiveDate>,
    pub occurrences: Option<u32>,
}

/// A validated appointment, handed to the wizard's success callback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentForm {
    pub patient_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
    pub observations: Option<String>,
    /// Present iff the appointment repeats
    pub recurrence: Option<Recurrence>,
    pub payment_type: PaymentType,
    pub price: f64,
    pub insurance_name: Option<String>,
}

fn required_date(value: &Option<String>, field: &'static str) -> WizardResult<NaiveDate> {
    let raw = required_text(value, field)?;
    parse_date(&raw).ok_or(WizardError::InvalidValue { field, value: raw })
}

fn required_time(value: &Option<String>, field: &'static str) -> WizardResult<NaiveTime> {
    let raw = required_text(value, field)?;
    parse_time(&raw).ok_or(WizardError::InvalidValue { field, value: raw })
}

impl TryFrom<&AppointmentDraft> for AppointmentForm {
    type Error = WizardError;

    fn try_from(d: &AppointmentDraft) -> Result<Self, Self::Error> {
        let start_time = required_time(&d.start_time, "startTime")?;
        let end_time = required_time(&d.end_time, "endTime")?;
        let duration_minutes = d.duration_minutes().ok_or(WizardError::InvalidValue {
            field: "endTime",
            value: end_time.format("%H:%M").to_string(),
        })?;

        let recurrence = if d.is_recurring() {
            let end_date = match optional_text(&d.recurrence_end_date) {
                Some(raw) => Some(parse_date(&raw).ok_or(WizardError::InvalidValue {
                    field: "recurrenceEndDate",
                    value: raw,
                })?),
                None => None,
            };
            let occurrences = d.recurrence_occurrences.filter(|n| *n > 0);
            if end_date.is_none() && occurrences.is_none() {
                return Err(WizardError::MissingField("recurrenceEndDate"));
            }
            Some(Recurrence {
                pattern: d
                    .recurrence_pattern
                    .ok_or(WizardError::MissingField("recurrencePattern"))?,
                days_of_week: d
                    .days_of_week
                    .clone()
                    .filter(|days| !days.is_empty())
                    .ok_or(WizardError::MissingField("daysOfWeek"))?,
                end_date,
                occurrences,
            })
        } else {
            None
        };

        let insurance_name = match d.payment_type {
            PaymentType::Insurance => Some(required_text(&d.insurance_name, "insuranceName")?),
            PaymentType::Private => None,
        };

        Ok(Self {
            patient_id: required_text(&d.patient_id, "patientId")?,
            date: required_date(&d.date, "date")?,
            start_time,
            end_time,
            duration_minutes,
            observations: optional_text(&d.observations),
            recurrence,
            payment_type: d.payment_type,
            price: d.price_value().ok_or(WizardError::MissingField("price"))?,
            insurance_name,
        })
    }
}
