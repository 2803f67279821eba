//! Appointment scheduling wizard: steps, rules and layouts.

use serde::{Deserialize, Serialize};

use super::{
    ChoiceOption, FieldSpec, InputKind, StepLayout, ValidationErrors, WizardFlavor, WizardResult,
};
use crate::models::{
    format_duration, is_filled, parse_date, parse_time, AppointmentDraft, AppointmentField,
    AppointmentForm, PaymentType, RecurrencePattern, WizardMode, WizardStep,
};

/// Steps of the appointment wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppointmentStep {
    PatientSelection,
    DateTime,
    Recurrence,
    Payment,
}

/// The appointment creation flow.
pub struct AppointmentWizard;

const SELECTION_FIELDS: &[AppointmentField] = &[AppointmentField::PatientId];

const DATE_TIME_FIELDS: &[AppointmentField] = &[
    AppointmentField::Date,
    AppointmentField::StartTime,
    AppointmentField::EndTime,
    AppointmentField::Observations,
];

const RECURRENCE_FIELDS: &[AppointmentField] = &[
    AppointmentField::Type,
    AppointmentField::RecurrencePattern,
    AppointmentField::DaysOfWeek,
    AppointmentField::RecurrenceEndDate,
    AppointmentField::RecurrenceOccurrences,
];

const PAYMENT_FIELDS: &[AppointmentField] = &[
    AppointmentField::PaymentType,
    AppointmentField::Price,
    AppointmentField::InsuranceName,
];

fn check_date(
    errors: &mut ValidationErrors<AppointmentField>,
    field: AppointmentField,
    value: &Option<String>,
) {
    if let Some(raw) = value.as_deref().filter(|s| !s.trim().is_empty()) {
        if parse_date(raw).is_none() {
            errors.insert(field, "Enter a valid date (YYYY-MM-DD)");
        }
    }
}

fn check_time(
    errors: &mut ValidationErrors<AppointmentField>,
    field: AppointmentField,
    value: &Option<String>,
) {
    if let Some(raw) = value.as_deref().filter(|s| !s.trim().is_empty()) {
        if parse_time(raw).is_none() {
            errors.insert(field, "Enter a valid time (HH:MM)");
        }
    }
}

impl WizardFlavor for AppointmentWizard {
    type Step = AppointmentStep;
    type Draft = AppointmentDraft;
    type Entity = AppointmentForm;

    const KIND: &'static str = "appointment";

    fn default_steps() -> Vec<WizardStep<AppointmentStep>> {
        vec![
            WizardStep::new(
                1,
                "Patient",
                "Select the patient for the appointment",
                AppointmentStep::PatientSelection,
            ),
            WizardStep::new(
                2,
                "Date and Time",
                "Set the date, start and end time",
                AppointmentStep::DateTime,
            ),
            WizardStep::new(
                3,
                "Recurrence",
                "Choose a single or recurring appointment",
                AppointmentStep::Recurrence,
            ),
            WizardStep::new(
                4,
                "Payment",
                "Payment details and price",
                AppointmentStep::Payment,
            ),
        ]
    }

    fn validate(step: AppointmentStep, d: &AppointmentDraft) -> ValidationErrors<AppointmentField> {
        use AppointmentField as A;

        let mut errors = ValidationErrors::new();
        match step {
            AppointmentStep::PatientSelection => {
                errors.require_text(A::PatientId, &d.patient_id, "Select a patient");
            }
            AppointmentStep::DateTime => {
                errors.require_text(A::Date, &d.date, "Date is required");
                errors.require_text(A::StartTime, &d.start_time, "Start time is required");
                errors.require_text(A::EndTime, &d.end_time, "End time is required");
                check_date(&mut errors, A::Date, &d.date);
                check_time(&mut errors, A::StartTime, &d.start_time);
                check_time(&mut errors, A::EndTime, &d.end_time);
                let times_ok = !errors.contains(A::StartTime) && !errors.contains(A::EndTime);
                if times_ok && d.duration_minutes().is_none() {
                    errors.insert(A::EndTime, "End time must be after start time");
                }
            }
            AppointmentStep::Recurrence => {
                if d.is_recurring() {
                    errors.require(
                        A::RecurrencePattern,
                        &d.recurrence_pattern,
                        "Choose how often the appointment repeats",
                    );
                    if d.days_of_week.as_ref().map_or(true, Vec::is_empty) {
                        errors.insert(A::DaysOfWeek, "Select at least one day");
                    }
                    let has_end_date = is_filled(&d.recurrence_end_date);
                    let has_count = d.recurrence_occurrences.is_some_and(|n| n > 0);
                    if !has_end_date && !has_count {
                        errors.insert(
                            A::RecurrenceEndDate,
                            "Set an end date or a number of sessions",
                        );
                    }
                    check_date(&mut errors, A::RecurrenceEndDate, &d.recurrence_end_date);
                }
            }
            AppointmentStep::Payment => {
                if !is_filled(&d.price) {
                    errors.insert(A::Price, "Price is required");
                } else if d.price_value().is_none() {
                    errors.insert(A::Price, "Price must be a non-negative number");
                }
                if d.payment_type == PaymentType::Insurance {
                    errors.require_text(
                        A::InsuranceName,
                        &d.insurance_name,
                        "Insurance name is required",
                    );
                }
            }
        }
        errors
    }

    fn owned_fields(step: AppointmentStep) -> &'static [AppointmentField] {
        match step {
            AppointmentStep::PatientSelection => SELECTION_FIELDS,
            AppointmentStep::DateTime => DATE_TIME_FIELDS,
            AppointmentStep::Recurrence => RECURRENCE_FIELDS,
            AppointmentStep::Payment => PAYMENT_FIELDS,
        }
    }

    fn layout(step: AppointmentStep, d: &AppointmentDraft) -> StepLayout<AppointmentField> {
        use AppointmentField as A;

        let mut layout = StepLayout::new();
        match step {
            AppointmentStep::PatientSelection => {
                layout.push(FieldSpec::text(A::PatientId, "Patient").required());
            }
            AppointmentStep::DateTime => {
                layout.push(FieldSpec::new(A::Date, "Date", InputKind::Date).required());
                layout.push(FieldSpec::new(A::StartTime, "Start time", InputKind::Time).required());
                layout.push(FieldSpec::new(A::EndTime, "End time", InputKind::Time).required());
                layout.push(
                    FieldSpec::new(A::Observations, "Observations", InputKind::TextArea)
                        .placeholder("Notes about the appointment"),
                );
                if let Some(minutes) = d.duration_minutes() {
                    layout.note(format!("Duration: {}", format_duration(minutes)));
                }
            }
            AppointmentStep::Recurrence => {
                layout.push(
                    FieldSpec::new(
                        A::Type,
                        "Appointment type",
                        InputKind::Radio {
                            options: vec![
                                ChoiceOption::new("single", "Single appointment"),
                                ChoiceOption::new("recurring", "Recurring appointment"),
                            ],
                        },
                    )
                    .required(),
                );
                if d.is_recurring() {
                    layout.push(
                        FieldSpec::new(
                            A::RecurrencePattern,
                            "Frequency",
                            InputKind::Select {
                                options: RecurrencePattern::ALL
                                    .into_iter()
                                    .map(|p| ChoiceOption::new(p.as_ref(), p.label()))
                                    .collect(),
                            },
                        )
                        .required(),
                    );
                    layout.push(
                        FieldSpec::new(A::DaysOfWeek, "Days of the week", InputKind::Weekdays)
                            .required(),
                    );
                    layout.push(FieldSpec::new(A::RecurrenceEndDate, "End date", InputKind::Date));
                    layout.push(
                        FieldSpec::new(
                            A::RecurrenceOccurrences,
                            "or number of sessions",
                            InputKind::Number,
                        )
                        .placeholder("e.g. 10"),
                    );
                    if let Some(days) = d.weekday_summary() {
                        layout.note(format!("Selected: {days}"));
                    }
                    layout.note("Fill in the end date OR the number of sessions");
                }
            }
            AppointmentStep::Payment => {
                layout.push(
                    FieldSpec::new(
                        A::PaymentType,
                        "Payment type",
                        InputKind::Radio {
                            options: vec![
                                ChoiceOption::new("private", "Private"),
                                ChoiceOption::new("insurance", "Health insurance"),
                            ],
                        },
                    )
                    .required(),
                );
                if d.payment_type == PaymentType::Insurance {
                    layout.push(
                        FieldSpec::text(A::InsuranceName, "Insurance name")
                            .required()
                            .placeholder("e.g. OSDE, Swiss Medical, IOMA"),
                    );
                }
                layout.push(
                    FieldSpec::new(A::Price, "Session price", InputKind::Money)
                        .required()
                        .placeholder("0.00"),
                );
                if let Some(price) = d.price_value().filter(|p| *p > 0.0) {
                    layout.note(format!("Price per session: ${price:.2}"));
                    let count = d.recurrence_occurrences;
                    if let (Some(total), Some(count)) = (d.estimated_total(), count) {
                        layout.note(format!("Estimated total ({count} sessions): ${total:.2}"));
                    }
                }
            }
        }
        layout
    }

    fn finalize(draft: &AppointmentDraft) -> WizardResult<AppointmentForm> {
        AppointmentForm::try_from(draft)
    }

    fn title(mode: WizardMode) -> &'static str {
        match mode {
            WizardMode::Create => "New Appointment",
            WizardMode::Edit => "Edit Appointment",
        }
    }

    fn submit_label(mode: WizardMode) -> &'static str {
        match mode {
            WizardMode::Create => "Create Appointment",
            WizardMode::Edit => "Save Changes",
        }
    }
}
