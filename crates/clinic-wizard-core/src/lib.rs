//! Clinic Wizard Core Library
//!
//! Multi-step wizard engine behind the clinic dashboard's patient
//! registration and appointment scheduling flows.
//!
//! # Architecture
//!
//! ```text
//!   Draft model ──► Step rules ──► Step renderers
//!        │               │               │
//!        └───────────────┴──────┬────────┘
//!                               ▼
//!                      WizardController
//!         (step index, draft, errors, gated navigation)
//!                               │
//!              ┌────────────────┼────────────────┐
//!              ▼                ▼                ▼
//!          ShellView      on_success(entity)   on_close()
//! ```
//!
//! # Core Principle
//!
//! **The user never advances past a step with outstanding errors.** Going
//! back is always allowed; submission re-checks every step.
//!
//! # Modules
//!
//! - [`models`]: Drafts, field keys and completed forms
//! - [`wizard`]: Controller, flavors, validation, renderers and shell
//! - [`directory`]: Patient lookup for appointment scheduling
//! - [`fingerprint`]: Draft change detection

pub mod directory;
pub mod fingerprint;
pub mod models;
pub mod wizard;

// Re-export commonly used types
pub use directory::{PatientDirectory, PatientMatch, PatientOption};
pub use models::{
    AppointmentDraft, AppointmentField, AppointmentForm, Draft, FieldKey, FieldValue,
    PatientDraft, PatientField, PatientForm, WizardMode, WizardStep,
};
pub use wizard::{
    AppointmentStep, AppointmentWizard, CapturedCallbacks, FormRenderer, PatientStep,
    PatientWizard, ShellView, SubmitOutcome, ValidationErrors, WizardCallbacks,
    WizardController, WizardError, WizardFlavor, WizardResult,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use serde::Serialize;
use wizard::{FieldOf, PrimaryAction, StepStatus};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicWizardError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<WizardError> for ClinicWizardError {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::EmptySteps | WizardError::StepOutOfRange { .. } => {
                ClinicWizardError::InvalidState(e.to_string())
            }
            _ => ClinicWizardError::InvalidInput(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClinicWizardError {
    fn from(e: serde_json::Error) -> Self {
        ClinicWizardError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicWizardError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicWizardError::InvalidState(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open a patient wizard, optionally seeded with a draft in JSON form.
#[uniffi::export]
pub fn new_patient_wizard(
    mode: FfiWizardMode,
    initial_draft_json: Option<String>,
) -> Result<Arc<PatientWizardHandle>, ClinicWizardError> {
    let initial = parse_draft::<PatientDraft>(initial_draft_json)?;
    Ok(Arc::new(PatientWizardHandle {
        inner: Mutex::new(WizardController::with_default_steps(
            mode.into(),
            initial,
            CapturedCallbacks::new(),
        )),
    }))
}

/// Open an appointment wizard over the patients the user may pick from.
#[uniffi::export]
pub fn new_appointment_wizard(
    initial_draft_json: Option<String>,
    patients: Vec<FfiPatientOption>,
) -> Result<Arc<AppointmentWizardHandle>, ClinicWizardError> {
    let initial = parse_draft::<AppointmentDraft>(initial_draft_json)?;
    Ok(Arc::new(AppointmentWizardHandle {
        inner: Mutex::new(WizardController::with_default_steps(
            WizardMode::Create,
            initial,
            CapturedCallbacks::new(),
        )),
        directory: PatientDirectory::new(patients.into_iter().map(Into::into).collect()),
    }))
}

fn parse_draft<D: Draft + serde::de::DeserializeOwned>(
    json: Option<String>,
) -> Result<Option<D>, ClinicWizardError> {
    Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
}

// =========================================================================
// Main API Objects
// =========================================================================

type Captured<F> = WizardController<F, CapturedCallbacks<<F as WizardFlavor>::Entity>>;

/// Thread-safe patient wizard for FFI.
#[derive(uniffi::Object)]
pub struct PatientWizardHandle {
    inner: Mutex<Captured<PatientWizard>>,
}

#[uniffi::export]
impl PatientWizardHandle {
    pub fn steps(&self) -> Result<Vec<FfiStepInfo>, ClinicWizardError> {
        Ok(steps_of(&*self.inner.lock()?))
    }

    pub fn current_step(&self) -> Result<u32, ClinicWizardError> {
        Ok(self.inner.lock()?.current_step() as u32)
    }

    pub fn is_valid(&self) -> Result<bool, ClinicWizardError> {
        Ok(self.inner.lock()?.is_valid())
    }

    pub fn is_dirty(&self) -> Result<bool, ClinicWizardError> {
        Ok(self.inner.lock()?.is_dirty())
    }

    pub fn get_field(&self, name: String) -> Result<FfiFieldValue, ClinicWizardError> {
        get_field(&*self.inner.lock()?, &name)
    }

    pub fn update_field(
        &self,
        name: String,
        value: FfiFieldValue,
    ) -> Result<(), ClinicWizardError> {
        Ok(self.inner.lock()?.update_field_by_name(&name, value.into())?)
    }

    pub fn errors(&self) -> Result<Vec<FfiFieldError>, ClinicWizardError> {
        Ok(errors_of(self.inner.lock()?.errors()))
    }

    /// Advance if the active step validates.
    pub fn next(&self) -> Result<bool, ClinicWizardError> {
        Ok(self.inner.lock()?.next())
    }

    pub fn prev(&self) -> Result<bool, ClinicWizardError> {
        Ok(self.inner.lock()?.prev())
    }

    /// Validate everything and, when clean, return the patient as JSON.
    pub fn submit(&self) -> Result<FfiSubmitResult, ClinicWizardError> {
        submit(&mut *self.inner.lock()?)
    }

    pub fn close(&self) -> Result<(), ClinicWizardError> {
        self.inner.lock()?.close();
        Ok(())
    }

    pub fn shell(&self) -> Result<FfiShell, ClinicWizardError> {
        Ok(self.inner.lock()?.shell().into())
    }

    /// Active step as a JSON view model.
    pub fn render_step_json(&self) -> Result<String, ClinicWizardError> {
        render_json(&mut *self.inner.lock()?)
    }

    pub fn draft_json(&self) -> Result<String, ClinicWizardError> {
        Ok(serde_json::to_string(self.inner.lock()?.draft())?)
    }
}

/// Thread-safe appointment wizard for FFI.
#[derive(uniffi::Object)]
pub struct AppointmentWizardHandle {
    inner: Mutex<Captured<AppointmentWizard>>,
    directory: PatientDirectory,
}

#[uniffi::export]
impl AppointmentWizardHandle {
    pub fn steps(&self) -> Result<Vec<FfiStepInfo>, ClinicWizardError> {
        Ok(steps_of(&*self.inner.lock()?))
    }

    pub fn current_step(&self) -> Result<u32, ClinicWizardError> {
        Ok(self.inner.lock()?.current_step() as u32)
    }

    pub fn is_valid(&self) -> Result<bool, ClinicWizardError> {
        Ok(self.inner.lock()?.is_valid())
    }

    pub fn get_field(&self, name: String) -> Result<FfiFieldValue, ClinicWizardError> {
        get_field(&*self.inner.lock()?, &name)
    }

    pub fn update_field(
        &self,
        name: String,
        value: FfiFieldValue,
    ) -> Result<(), ClinicWizardError> {
        Ok(self.inner.lock()?.update_field_by_name(&name, value.into())?)
    }

    pub fn errors(&self) -> Result<Vec<FfiFieldError>, ClinicWizardError> {
        Ok(errors_of(self.inner.lock()?.errors()))
    }

    pub fn next(&self) -> Result<bool, ClinicWizardError> {
        Ok(self.inner.lock()?.next())
    }

    pub fn prev(&self) -> Result<bool, ClinicWizardError> {
        Ok(self.inner.lock()?.prev())
    }

    /// Validate everything and, when clean, return the appointment as JSON.
    pub fn submit(&self) -> Result<FfiSubmitResult, ClinicWizardError> {
        submit(&mut *self.inner.lock()?)
    }

    pub fn close(&self) -> Result<(), ClinicWizardError> {
        self.inner.lock()?.close();
        Ok(())
    }

    pub fn shell(&self) -> Result<FfiShell, ClinicWizardError> {
        Ok(self.inner.lock()?.shell().into())
    }

    pub fn render_step_json(&self) -> Result<String, ClinicWizardError> {
        render_json(&mut *self.inner.lock()?)
    }

    pub fn draft_json(&self) -> Result<String, ClinicWizardError> {
        Ok(serde_json::to_string(self.inner.lock()?.draft())?)
    }

    // =========================================================================
    // Patient Selection
    // =========================================================================

    /// Search the selectable patients by name.
    pub fn search_patients(&self, query: String, limit: u32) -> Vec<FfiPatientOption> {
        self.directory
            .search(&query, limit as usize)
            .into_iter()
            .map(|m| m.option.into())
            .collect()
    }

    /// Pick a patient; unknown ids are rejected.
    pub fn select_patient(&self, id: String) -> Result<(), ClinicWizardError> {
        if self.directory.get(&id).is_none() {
            return Err(ClinicWizardError::InvalidInput(format!("Unknown patient: {}", id)));
        }
        Ok(self
            .inner
            .lock()?
            .update_field(AppointmentField::PatientId, FieldValue::Text(id))?)
    }

    /// "Last, First" of the selected patient, if any.
    pub fn selected_patient_label(&self) -> Result<Option<String>, ClinicWizardError> {
        let wizard = self.inner.lock()?;
        Ok(wizard
            .draft()
            .patient_id
            .as_deref()
            .and_then(|id| self.directory.get(id))
            .map(PatientOption::label))
    }
}

// -- shared handle plumbing --

fn steps_of<F: WizardFlavor>(wizard: &Captured<F>) -> Vec<FfiStepInfo> {
    wizard
        .steps()
        .iter()
        .map(|s| FfiStepInfo {
            id: s.id,
            title: s.title.clone(),
            description: s.description.clone(),
        })
        .collect()
}

fn get_field<F: WizardFlavor>(
    wizard: &Captured<F>,
    name: &str,
) -> Result<FfiFieldValue, ClinicWizardError> {
    let field = <FieldOf<F> as FieldKey>::from_name(name)
        .ok_or_else(|| WizardError::UnknownField(name.to_string()))?;
    Ok(wizard.draft().get(field).into())
}

fn errors_of<K: FieldKey>(errors: &ValidationErrors<K>) -> Vec<FfiFieldError> {
    errors
        .iter()
        .map(|(field, message)| FfiFieldError {
            field: field.name().to_string(),
            message: message.to_string(),
        })
        .collect()
}

fn submit<F>(wizard: &mut Captured<F>) -> Result<FfiSubmitResult, ClinicWizardError>
where
    F: WizardFlavor,
    F::Entity: Serialize,
{
    match wizard.submit()? {
        SubmitOutcome::Submitted => {
            let entity_json = wizard
                .callbacks_mut()
                .submissions
                .pop()
                .map(|(entity, _)| serde_json::to_string(&entity))
                .transpose()?;
            Ok(FfiSubmitResult {
                submitted: true,
                failing_step: None,
                entity_json,
            })
        }
        SubmitOutcome::Invalid { step } => Ok(FfiSubmitResult {
            submitted: false,
            failing_step: Some(step as u32),
            entity_json: None,
        }),
    }
}

fn render_json<F: WizardFlavor>(wizard: &mut Captured<F>) -> Result<String, ClinicWizardError> {
    let rendered = wizard.render_active(&FormRenderer::<F>::new())?;
    Ok(serde_json::to_string(&rendered)?)
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe wizard mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiWizardMode {
    Create,
    Edit,
}

impl From<FfiWizardMode> for WizardMode {
    fn from(mode: FfiWizardMode) -> Self {
        match mode {
            FfiWizardMode::Create => WizardMode::Create,
            FfiWizardMode::Edit => WizardMode::Edit,
        }
    }
}

/// FFI-safe field value.
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum FfiFieldValue {
    Unset,
    Text { value: String },
    Flag { value: bool },
    Number { value: u32 },
    Days { value: Vec<u8> },
}

impl From<FfiFieldValue> for FieldValue {
    fn from(value: FfiFieldValue) -> Self {
        match value {
            FfiFieldValue::Unset => FieldValue::Unset,
            FfiFieldValue::Text { value } => FieldValue::Text(value),
            FfiFieldValue::Flag { value } => FieldValue::Flag(value),
            FfiFieldValue::Number { value } => FieldValue::Number(value),
            FfiFieldValue::Days { value } => FieldValue::Days(value),
        }
    }
}

impl From<FieldValue> for FfiFieldValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Unset => FfiFieldValue::Unset,
            FieldValue::Text(value) => FfiFieldValue::Text { value },
            FieldValue::Flag(value) => FfiFieldValue::Flag { value },
            FieldValue::Number(value) => FfiFieldValue::Number { value },
            FieldValue::Days(value) => FfiFieldValue::Days { value },
        }
    }
}

/// FFI-safe step descriptor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStepInfo {
    pub id: u32,
    pub title: String,
    pub description: String,
}

/// FFI-safe validation message.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldError {
    pub field: String,
    pub message: String,
}

/// FFI-safe submission result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSubmitResult {
    pub submitted: bool,
    pub failing_step: Option<u32>,
    /// The completed entity, present iff `submitted`
    pub entity_json: Option<String>,
}

/// FFI-safe progress marker.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProgressMarker {
    pub id: u32,
    pub title: String,
    /// "completed", "current" or "upcoming"
    pub status: String,
}

/// FFI-safe wizard frame.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiShell {
    pub title: String,
    pub progress_label: String,
    pub markers: Vec<FfiProgressMarker>,
    pub step_title: String,
    pub step_description: String,
    pub back_enabled: bool,
    pub primary_label: String,
    pub primary_is_submit: bool,
    pub primary_enabled: bool,
    pub cancel_enabled: bool,
}

impl From<ShellView> for FfiShell {
    fn from(shell: ShellView) -> Self {
        let (primary_label, primary_is_submit) = match shell.primary {
            PrimaryAction::Next => ("Next".to_string(), false),
            PrimaryAction::Submit(label) => (label, true),
        };
        Self {
            title: shell.title,
            progress_label: shell.progress_label,
            markers: shell
                .markers
                .into_iter()
                .map(|m| FfiProgressMarker {
                    id: m.id,
                    title: m.title,
                    status: match m.status {
                        StepStatus::Completed => "completed",
                        StepStatus::Current => "current",
                        StepStatus::Upcoming => "upcoming",
                    }
                    .to_string(),
                })
                .collect(),
            step_title: shell.step_title,
            step_description: shell.step_description,
            back_enabled: shell.back_enabled,
            primary_label,
            primary_is_submit,
            primary_enabled: shell.primary_enabled,
            cancel_enabled: shell.cancel_enabled,
        }
    }
}

/// FFI-safe selectable patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientOption {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<FfiPatientOption> for PatientOption {
    fn from(option: FfiPatientOption) -> Self {
        PatientOption {
            id: option.id,
            first_name: option.first_name,
            last_name: option.last_name,
        }
    }
}

impl From<PatientOption> for FfiPatientOption {
    fn from(option: PatientOption) -> Self {
        Self {
            id: option.id,
            first_name: option.first_name,
            last_name: option.last_name,
        }
    }
}
